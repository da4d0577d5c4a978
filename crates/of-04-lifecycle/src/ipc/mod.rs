pub mod handlers;

pub use handlers::LifecycleServer;
