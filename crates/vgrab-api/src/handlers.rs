//! Request handlers.

pub mod download;
pub mod health;
pub mod index;
pub mod info;

pub use download::*;
pub use health::*;
pub use index::*;
pub use info::*;
