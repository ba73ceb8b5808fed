//! Stack headroom for deep recursion.
//!
//! Evaluator recursion tracks grammar nesting times input length in the
//! worst case, which can exceed a native thread stack long before it
//! exceeds memory. Each recursive entry checks the remaining headroom and
//! grows the stack in segments when it runs low.

/// Remaining headroom below which a new segment is allocated.
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 128 * 1024;

/// Size of each additional stack segment.
#[cfg(not(target_arch = "wasm32"))]
const SEGMENT: usize = 2 * 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

/// WASM manages its own stack; call through.
#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
