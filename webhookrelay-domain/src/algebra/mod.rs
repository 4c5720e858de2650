mod normalize;
mod string;
mod template;

pub use normalize::*;
pub use string::*;
pub use template::*;
