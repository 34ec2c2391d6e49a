//! General matrix multiply.

use lattix_core::{Layout, Scalar};

use crate::mat_index;

/// Per-operand transpose selector.
///
/// Conjugate transpose behaves as a plain transpose for the real element
/// types this crate accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transpose {
    None,
    Trans,
    ConjTrans,
}

impl Transpose {
    pub fn is_trans(self) -> bool {
        !matches!(self, Transpose::None)
    }
}

/// `C = alpha * op(A) * op(B) + beta * C`, where `op` is identity or
/// transpose per flag.
///
/// `op(A)` is `m × k`, `op(B)` is `k × n`, `C` is `m × n`. Caller-supplied
/// leading dimensions let this run directly over sub-views without copying.
/// Triple nested loop, `O(m·n·k)`, no pivoting.
#[allow(clippy::too_many_arguments)]
pub fn gemm<T: Scalar>(
    layout: Layout,
    trans_a: Transpose,
    trans_b: Transpose,
    m: usize,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &[T],
    ldb: usize,
    beta: T,
    c: &mut [T],
    ldc: usize,
) {
    let row_major = layout == Layout::RowMajor;
    let ta = trans_a.is_trans();
    let tb = trans_b.is_trans();

    for i in 0..m {
        for j in 0..n {
            let mut sum = T::zero();
            for l in 0..k {
                let a_idx = if ta {
                    if row_major {
                        l * lda + i
                    } else {
                        i * lda + l
                    }
                } else if row_major {
                    i * lda + l
                } else {
                    l * lda + i
                };
                let b_idx = if tb {
                    if row_major {
                        j * ldb + l
                    } else {
                        l * ldb + j
                    }
                } else if row_major {
                    l * ldb + j
                } else {
                    j * ldb + l
                };
                sum += a[a_idx] * b[b_idx];
            }
            let c_idx = mat_index(layout, ldc, i, j);
            c[c_idx] = alpha * sum + beta * c[c_idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemm_row_major() {
        // [[1,2],[3,4]] * [[5,6],[7,8]] = [[19,22],[43,50]]
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [0.0; 4];
        gemm(
            Layout::RowMajor,
            Transpose::None,
            Transpose::None,
            2,
            2,
            2,
            1.0,
            &a,
            2,
            &b,
            2,
            0.0,
            &mut c,
            2,
        );
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_gemm_col_major() {
        // same matrices stored column-major
        let a = [1.0, 3.0, 2.0, 4.0];
        let b = [5.0, 7.0, 6.0, 8.0];
        let mut c = [0.0; 4];
        gemm(
            Layout::ColMajor,
            Transpose::None,
            Transpose::None,
            2,
            2,
            2,
            1.0,
            &a,
            2,
            &b,
            2,
            0.0,
            &mut c,
            2,
        );
        // column-major [[19,22],[43,50]]
        assert_eq!(c, [19.0, 43.0, 22.0, 50.0]);
    }

    #[test]
    fn test_gemm_transpose_a() {
        // A^T * B with A = [[1,3],[2,4]] row-major, so op(A) = [[1,2],[3,4]]
        let a = [1.0, 3.0, 2.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [0.0; 4];
        gemm(
            Layout::RowMajor,
            Transpose::Trans,
            Transpose::None,
            2,
            2,
            2,
            1.0,
            &a,
            2,
            &b,
            2,
            0.0,
            &mut c,
            2,
        );
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_gemm_conj_trans_is_trans() {
        let a = [1.0, 3.0, 2.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c1 = [0.0; 4];
        let mut c2 = [0.0; 4];
        gemm(
            Layout::RowMajor,
            Transpose::Trans,
            Transpose::None,
            2,
            2,
            2,
            1.0,
            &a,
            2,
            &b,
            2,
            0.0,
            &mut c1,
            2,
        );
        gemm(
            Layout::RowMajor,
            Transpose::ConjTrans,
            Transpose::None,
            2,
            2,
            2,
            1.0,
            &a,
            2,
            &b,
            2,
            0.0,
            &mut c2,
            2,
        );
        assert_eq!(c1, c2);
    }

    #[test]
    fn test_gemm_alpha_beta() {
        let a = [1.0, 0.0, 0.0, 1.0];
        let b = [1.0, 2.0, 3.0, 4.0];
        let mut c = [10.0, 10.0, 10.0, 10.0];
        gemm(
            Layout::RowMajor,
            Transpose::None,
            Transpose::None,
            2,
            2,
            2,
            2.0,
            &a,
            2,
            &b,
            2,
            0.5,
            &mut c,
            2,
        );
        // 2 * I * B + 0.5 * C
        assert_eq!(c, [7.0, 9.0, 11.0, 13.0]);
    }

    #[test]
    fn test_gemm_rectangular() {
        // [2x3] * [3x1], row-major
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [1.0, 1.0, 1.0];
        let mut c = [0.0; 2];
        gemm(
            Layout::RowMajor,
            Transpose::None,
            Transpose::None,
            2,
            1,
            3,
            1.0,
            &a,
            3,
            &b,
            1,
            0.0,
            &mut c,
            1,
        );
        assert_eq!(c, [6.0, 15.0]);
    }

    #[test]
    fn test_gemm_leading_dimension_subview() {
        // multiply the top-left 2x2 block of a 3x3 row-major matrix by I,
        // writing into a 2x2 destination, using lda = 3
        let a = [1.0, 2.0, 9.0, 3.0, 4.0, 9.0, 9.0, 9.0, 9.0];
        let eye = [1.0, 0.0, 0.0, 1.0];
        let mut c = [0.0; 4];
        gemm(
            Layout::RowMajor,
            Transpose::None,
            Transpose::None,
            2,
            2,
            2,
            1.0,
            &a,
            3,
            &eye,
            2,
            0.0,
            &mut c,
            2,
        );
        assert_eq!(c, [1.0, 2.0, 3.0, 4.0]);
    }
}
