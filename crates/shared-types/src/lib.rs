//! # Shared Types Crate
//!
//! This crate contains the order domain entities, cross-service IPC payloads,
//! the fault taxonomy, and the `Envelope<T>` message wrapper used on every
//! service boundary.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-service types are defined here.
//! - **Envelope Integrity**: `Envelope<T>` is the sole wrapper for all bus
//!   traffic; the verified `user` slot is the only identity handlers may read.
//! - **Fault Boundary**: Services convert every lower-level error into a
//!   [`Fault`](faults::Fault) before it crosses a component edge.

pub mod entities;
pub mod envelope;
pub mod faults;
pub mod identity;
pub mod ipc;

pub use entities::*;
pub use envelope::{current_timestamp, Envelope, ReplyTo};
pub use faults::*;
pub use identity::UserClaims;
pub use ipc::*;
