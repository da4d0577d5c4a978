//! # OF-04: Order Lifecycle Choreography
//!
//! The composition layer over the primitives: identity extraction in front
//! of every command, one-time codes for payment confirmation, and deadline
//! keys whose expiration drives the timeout transition.
//!
//! All logic here is event-to-transition dispatch; correctness leans
//! entirely on the primitives honoring their contracts. Event handling is
//! idempotent: a duplicate or stale `order.timeout` against an order that
//! already left `awaiting_payment` is a no-op, not an error.

#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod domain;
pub mod ipc;
pub mod ports;
pub mod service;

pub use adapters::deadline::CacheDeadlineStore;
pub use domain::transitions::{OrderEvent, TransitionError};
pub use ipc::handlers::LifecycleServer;
pub use ports::DeadlineStore;
pub use service::LifecycleService;
