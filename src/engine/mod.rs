// src/engine/mod.rs

//! Evaluation engine.
//!
//! - [`state`] holds every mutable table in one [`EngineState`].
//! - [`handlers`] implements the operations as functions over that state.
//! - [`completion`] derives expression status after each result.
//! - [`core`] wraps the state in a mutex and exposes the public API.

pub mod completion;
pub mod core;
pub mod handlers;
pub mod state;

pub use completion::check_completion;
pub use core::Engine;
pub use state::{EngineState, ExpressionEntry};
