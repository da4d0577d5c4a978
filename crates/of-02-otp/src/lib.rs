//! # OF-02: One-Time Codes
//!
//! In-memory store for short-lived numeric verification codes, plus the
//! service that issues them over an external delivery channel and verifies
//! them during payment confirmation.
//!
//! The store is deliberately reason-less toward callers: a failed
//! verification never says whether the code was wrong, expired, or locked
//! out. That keeps an attacker from probing the record's state.

#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod ports;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ports::CodeDelivery;
pub use service::OtpService;
pub use store::{OtpStore, CODE_TTL_SECS, MAX_ATTEMPTS};
