pub mod e2e_choreography;
pub mod harness;
pub mod timeout_properties;
