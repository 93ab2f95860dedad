//! Complex-weighted EVBDD reduction rules and recursive algebraic
//! operations (C3, C6): edge-weight normalization, the `make_edge`
//! canonicity primitive, and `plus`/`matvec`/`matmat`/`inner_product`/
//! `tensor`.
//!
//! The single-threaded/multi-threaded split the teacher keeps as two
//! parallel modules (`apply_rec_st`/`apply_rec_mt`) lives one layer down
//! instead, in `addd_manager::scheduler`'s `multi-threading` feature
//! gate: every operation here is written once against `scheduler::join`/
//! `fork_join_n` and gets both behaviors for free.

pub mod make_edge;
pub mod normalize;
pub mod ops;

pub use make_edge::make_edge;
pub use normalize::NormStrategy;
pub use ops::{inner_product, matmat, matvec, plus, tensor, EvbddOp};
