//! Request handlers.

pub mod health;
pub mod jobs;
pub mod results;
pub mod upload;

pub use health::*;
pub use jobs::*;
pub use results::*;
pub use upload::*;
