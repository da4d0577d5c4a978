//! # OrderFlow Test Suite
//!
//! Unified test crate for cross-service choreography:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── e2e_choreography.rs  # Full order lifecycle over the bus
//!     └── timeout_properties.rs # Deadline, watchdog, and call() deadlines
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p orderflow-tests
//!
//! # By category
//! cargo test -p orderflow-tests integration::
//! ```

#![allow(dead_code)]

pub mod integration;
