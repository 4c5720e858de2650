pub mod config;
pub mod dispatcher;
pub mod metrics;
pub mod mock;
pub mod router;
pub mod server;
pub mod store;
