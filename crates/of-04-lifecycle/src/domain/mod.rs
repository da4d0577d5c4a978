pub mod order;
pub mod transitions;
