//! Manager-agnostic traits shared by every `addd` backend crate.
//!
//! This crate defines the seams the spec calls out explicitly: the edge /
//! node / manager vocabulary, the `DiagramRules` contract that a concrete
//! rule set (e.g. `addd-rules-evbdd`) implements, the operation-cache
//! contract, and the error type every fallible operation returns.

pub mod apply_cache;
pub mod countable;
pub mod diagram_rules;
pub mod edge;
pub mod error;
pub mod manager;
pub mod node;

pub use apply_cache::{ApplyCache, HasApplyCache};
pub use countable::Countable;
pub use diagram_rules::{DiagramRules, ReducedOrNew};
pub use edge::{Edge, WeightHandle};
pub use error::{AdddError, AdddResult};
pub use manager::{LevelNo, Manager};
pub use node::{InnerNode, Node, NodeHandle};
