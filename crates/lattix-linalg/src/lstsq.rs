//! Least-squares solve via normal equations.

use lattix_core::{Layout, Scalar};

use crate::gemm::Transpose;

/// Least-squares solve of `op(A)·X = B` for a possibly rectangular system.
///
/// `op(A)` is `m × n` after accounting for `trans`. Overdetermined or
/// square systems (`m ≥ n`) form the normal equations `AᵀA·x = Aᵀb` and
/// solve them by Gaussian elimination with partial pivoting.
/// Underdetermined systems (`m < n`) solve `AAᵀ·y = b` and recover the
/// minimum-norm solution `x = Aᵀy`.
///
/// `B` must provide `max(m, n)` rows per `ldb`; its first `n` rows are
/// overwritten with the solution. `A` is left untouched.
///
/// Normal equations square the condition number, trading numerical
/// robustness for simplicity. That is this routine's contract; callers
/// needing a stable solver for ill-conditioned systems should use an
/// orthogonal factorization instead.
#[allow(clippy::too_many_arguments)]
pub fn gels<T: Scalar>(
    layout: Layout,
    trans: Transpose,
    m: usize,
    n: usize,
    nrhs: usize,
    a: &[T],
    lda: usize,
    b: &mut [T],
    ldb: usize,
) {
    let row_major = layout == Layout::RowMajor;
    let transposed = trans.is_trans();
    let (mut m, mut n) = (m, n);
    if transposed {
        std::mem::swap(&mut m, &mut n);
    }

    let max_mn = m.max(n);

    // row-major working copies of op(A) and B
    let mut a_copy = vec![T::zero(); m * n];
    let mut b_copy = vec![T::zero(); max_mn * nrhs];

    for i in 0..m {
        for j in 0..n {
            let src = if transposed {
                if row_major {
                    a[j * lda + i]
                } else {
                    a[i * lda + j]
                }
            } else if row_major {
                a[i * lda + j]
            } else {
                a[j * lda + i]
            };
            a_copy[i * n + j] = src;
        }
        for j in 0..nrhs {
            b_copy[i * nrhs + j] = if row_major {
                b[i * ldb + j]
            } else {
                b[j * ldb + i]
            };
        }
    }

    if m >= n {
        // normal equations: (AᵀA) x = Aᵀb
        let mut ata = vec![T::zero(); n * n];
        let mut atb = vec![T::zero(); n * nrhs];

        for i in 0..n {
            for j in 0..n {
                for k in 0..m {
                    ata[i * n + j] += a_copy[k * n + i] * a_copy[k * n + j];
                }
            }
            for j in 0..nrhs {
                for k in 0..m {
                    atb[i * nrhs + j] += a_copy[k * n + i] * b_copy[k * nrhs + j];
                }
            }
        }

        eliminate(&mut ata, &mut atb, n, nrhs);

        for j in 0..nrhs {
            for i in (0..n).rev() {
                let mut sum = atb[i * nrhs + j];
                for k in i + 1..n {
                    sum = sum - ata[i * n + k] * b_copy[k * nrhs + j];
                }
                b_copy[i * nrhs + j] = sum / ata[i * n + i];
            }
        }
    } else {
        // minimum-norm: solve (AAᵀ) y = b, then x = Aᵀy
        let mut aat = vec![T::zero(); m * m];
        for i in 0..m {
            for j in 0..m {
                for k in 0..n {
                    aat[i * m + j] += a_copy[i * n + k] * a_copy[j * n + k];
                }
            }
        }

        let mut y = b_copy.clone();
        eliminate(&mut aat, &mut y, m, nrhs);

        for j in 0..nrhs {
            for i in (0..m).rev() {
                let mut sum = y[i * nrhs + j];
                for k in i + 1..m {
                    sum = sum - aat[i * m + k] * y[k * nrhs + j];
                }
                y[i * nrhs + j] = sum / aat[i * m + i];
            }
        }

        for i in 0..n {
            for j in 0..nrhs {
                let mut acc = T::zero();
                for k in 0..m {
                    acc += a_copy[k * n + i] * y[k * nrhs + j];
                }
                b_copy[i * nrhs + j] = acc;
            }
        }
    }

    for i in 0..max_mn {
        for j in 0..nrhs {
            if row_major {
                b[i * ldb + j] = b_copy[i * nrhs + j];
            } else {
                b[j * ldb + i] = b_copy[i * nrhs + j];
            }
        }
    }
}

/// Forward phase of Gaussian elimination with partial pivoting over the
/// augmented system `(lhs | rhs)`, both row-major, `lhs` square of order
/// `order`.
fn eliminate<T: Scalar>(lhs: &mut [T], rhs: &mut [T], order: usize, nrhs: usize) {
    for k in 0..order {
        let mut pivot = k;
        let mut max_val = lhs[k * order + k].abs_val();
        for i in k + 1..order {
            let val = lhs[i * order + k].abs_val();
            if val > max_val {
                max_val = val;
                pivot = i;
            }
        }

        if pivot != k {
            for j in k..order {
                lhs.swap(k * order + j, pivot * order + j);
            }
            for j in 0..nrhs {
                rhs.swap(k * nrhs + j, pivot * nrhs + j);
            }
        }

        for i in k + 1..order {
            let factor = lhs[i * order + k] / lhs[k * order + k];
            for j in k + 1..order {
                let delta = factor * lhs[k * order + j];
                lhs[i * order + j] -= delta;
            }
            for j in 0..nrhs {
                let delta = factor * rhs[k * nrhs + j];
                rhs[i * nrhs + j] -= delta;
            }
            lhs[i * order + k] = T::zero();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overdetermined_slope_fit() {
        // fit y = s*x through (1,2), (2,3.9), (3,6.1):
        // s = (A^T b) / (A^T A) = 28.1 / 14
        let a = [1.0, 2.0, 3.0];
        let mut b: [f64; 3] = [2.0, 3.9, 6.1];
        gels(Layout::ColMajor, Transpose::None, 3, 1, 1, &a, 3, &mut b, 3);
        assert!((b[0] - 28.1 / 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_square_system_exact() {
        // square systems reduce to the exact solution
        let a = [2.0, 1.0, 1.0, 3.0]; // row-major [[2,1],[1,3]]
        let mut b: [f64; 2] = [3.0, 5.0];
        gels(Layout::RowMajor, Transpose::None, 2, 2, 1, &a, 2, &mut b, 2);
        assert!((b[0] - 0.8).abs() < 1e-9);
        assert!((b[1] - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_underdetermined_minimum_norm() {
        // x1 + x2 = 2 has infinitely many solutions; the minimum-norm one
        // is [1, 1]
        let a = [1.0, 1.0]; // 1x2
        let mut b: [f64; 2] = [2.0, 0.0]; // padded to max(m, n) rows
        gels(Layout::RowMajor, Transpose::None, 1, 2, 1, &a, 2, &mut b, 1);
        assert!((b[0] - 1.0).abs() < 1e-9);
        assert!((b[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_transposed_overdetermined() {
        // A stored 1x3; op(A) = A^T is 3x1, same fit as the slope test
        let a = [1.0, 2.0, 3.0]; // row-major 1x3, lda = 3
        let mut b: [f64; 3] = [2.0, 3.9, 6.1];
        gels(Layout::RowMajor, Transpose::Trans, 1, 3, 1, &a, 3, &mut b, 1);
        assert!((b[0] - 28.1 / 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_right_hand_sides() {
        // intercept-and-slope design matrix [[1,1],[1,2],[1,3]] with two
        // right-hand sides: an exact line and a constant
        let a = [1.0, 1.0, 1.0, 2.0, 1.0, 3.0]; // row-major 3x2
        // rhs columns: [2,4,6] (y = 2x) and [5,5,5] (y = 5)
        let mut b: [f64; 6] = [2.0, 5.0, 4.0, 5.0, 6.0, 5.0]; // row-major 3x2
        gels(Layout::RowMajor, Transpose::None, 3, 2, 2, &a, 2, &mut b, 2);
        // first column: intercept 0, slope 2
        assert!((b[0] - 0.0).abs() < 1e-9);
        assert!((b[2] - 2.0).abs() < 1e-9);
        // second column: intercept 5, slope 0
        assert!((b[1] - 5.0).abs() < 1e-9);
        assert!((b[3] - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_a_left_untouched() {
        let a = [1.0, 2.0, 3.0];
        let mut b = [2.0, 3.9, 6.1];
        gels(Layout::ColMajor, Transpose::None, 3, 1, 1, &a, 3, &mut b, 3);
        assert_eq!(a, [1.0, 2.0, 3.0]);
    }
}
