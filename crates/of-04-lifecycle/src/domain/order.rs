//! The per-order record held by the choreography layer.

use shared_types::{OrderId, OrderState, UserClaims};

/// One tracked order. Persisted nowhere; the document store of record is a
/// separate collaborator and this table only carries what choreography
/// decisions need.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: OrderId,
    pub owner: UserClaims,
    pub amount: u64,
    pub state: OrderState,
}

impl OrderRecord {
    pub fn new(id: OrderId, owner: UserClaims, amount: u64) -> Self {
        Self {
            id,
            owner,
            amount,
            state: OrderState::Created,
        }
    }
}
