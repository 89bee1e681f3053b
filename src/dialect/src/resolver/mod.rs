//! Dialect resolution
//!
//! - **ResolutionEngine**: depth-first merge with path tracking for cycle
//!   detection
//! - **ResolutionCache**: DashMap-backed memoization with insert-if-absent
//!   writes

pub mod cache;
pub mod engine;

#[cfg(test)]
mod tests;

pub use cache::{CacheStats, ResolutionCache};
pub use engine::ResolutionEngine;
