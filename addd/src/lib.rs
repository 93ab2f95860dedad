//! Quantum-circuit simulation engine on complex-weighted EVBDDs: state
//! and gate constructors (C7) and measurement (C8), built on top of
//! `addd-manager`'s tables/runtime and `addd-rules-evbdd`'s recursive
//! algebra, configured by [`config::EngineConfig`] and exposed through
//! [`engine::Engine`].

pub mod config;
pub mod constructors;
pub mod engine;
pub mod error;
pub mod measurement;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
