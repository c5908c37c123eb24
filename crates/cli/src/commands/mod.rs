//! Command implementations for dfprove
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod cache;
mod params;
mod prove;

pub use cache::CacheCommand;
pub use params::Params;
pub use prove::Prove;
