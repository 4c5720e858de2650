pub mod configuration;
pub mod dispatch;
pub mod error;
pub mod event;

pub use configuration::*;
pub use dispatch::*;
pub use error::*;
pub use event::*;
