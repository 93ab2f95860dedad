/// Types that enumerate densely from `0` to `MAX_VALUE`, used for operator
/// IDs and edge-tag-like small enums that need to be packed into cache
/// keys or stat-counter arrays.
///
/// Mirrors the teacher's `oxidd_derive::Countable` trait; `addd-derive`
/// provides the matching `#[derive(Countable)]` macro.
pub trait Countable: Copy {
    /// Largest value this type can take, as a dense index.
    const MAX_VALUE: usize;

    /// This value's dense index.
    fn as_usize(self) -> usize;

    /// Reconstruct a value from a dense index. `idx` is guaranteed by
    /// callers to be `<= MAX_VALUE`.
    fn from_usize(idx: usize) -> Self;
}
