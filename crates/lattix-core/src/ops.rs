//! Tensor operations: element-wise arithmetic and device kernel dispatch.
//!
//! Operations return new tensors; in-place variants are suffixed with `_`
//! (e.g. `add_`).

pub mod dispatch;
pub mod elementwise;
