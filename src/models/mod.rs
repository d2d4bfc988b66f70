pub mod config;
pub mod post;
pub mod publishers;
pub mod template;

pub use config::*;
pub use post::*;
pub use publishers::*;
pub use template::*;
