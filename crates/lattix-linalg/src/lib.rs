//! # lattix-linalg
//!
//! Dense linear-algebra kernels and tensor-level wrappers for lattix.
//!
//! The kernel layer (`gemm`, `getrf`, `getri`, `gesv`, `gels`) operates on
//! raw slices with explicit leading dimensions and a [`Layout`] flag,
//! decoupled from the tensor container. Kernels mutate their arguments in
//! place where the contract says so; callers who need the original must
//! copy first. The wrapper layer ([`matmul`], [`solve`], [`inv`],
//! [`lstsq`]) feeds tensors through those kernels and surfaces the
//! singular-matrix info code as an error.

pub mod gemm;
pub mod lstsq;
pub mod lu;
pub mod ops;

pub use gemm::{gemm, Transpose};
pub use lstsq::gels;
pub use lu::{gesv, getrf, getri};
pub use ops::{inv, lstsq, lu, matmul, matmul_static, solve};

use lattix_core::Layout;

/// Flat index of matrix element `(i, j)` for a leading dimension and order.
#[inline]
pub(crate) fn mat_index(layout: Layout, lda: usize, i: usize, j: usize) -> usize {
    match layout {
        Layout::RowMajor => i * lda + j,
        Layout::ColMajor => j * lda + i,
    }
}
