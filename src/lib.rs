//! Navstack: navigation session controller for hybrid view stacks
//!
//! This library decides, for every navigation inside a native stack of web-backed
//! views, whether to fully load content or perform an in-page transition, and
//! keeps the single shared renderer bound to the right view.

pub mod error;
pub mod config;

pub mod renderer;
pub mod session;

// Re-exports
pub use error::{Error, Result, VisitFailure};

/// Navstack library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
