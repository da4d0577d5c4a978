//! Verified identity claims attached to envelopes.

use serde::{Deserialize, Serialize};

/// Minimal verified identity written onto an envelope by the identity
/// extractor after credential verification.
///
/// Downstream handlers authorize against these fields and never against the
/// raw credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// Stable user identifier.
    pub id: String,
    /// Display/login name.
    pub username: String,
    /// Coarse role used for authorization decisions.
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_round_trip_as_json() {
        let claims = UserClaims {
            id: "u-1".into(),
            username: "alice".into(),
            role: "customer".into(),
        };
        let json = serde_json::to_string(&claims).unwrap();
        let parsed: UserClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, claims);
    }
}
