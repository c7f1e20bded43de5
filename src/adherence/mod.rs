//! Adherence intelligence: window aggregation, dose statistics,
//! adaptive reminder timing, alert evaluation, trend classification.
//!
//! Pure computations live in their own submodules; `AdherenceEngine`
//! binds them to an `AdherenceStore` and a reference clock.

pub mod adaptive;
pub mod alerts;
pub mod engine;
pub mod messages;
pub mod stats;
pub mod trend;
pub mod types;
pub mod window;

pub use engine::AdherenceEngine;
pub use types::*;
pub use window::AdherenceWindow;
