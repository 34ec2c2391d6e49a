//! Tensor-level wrappers over the raw kernels.
//!
//! Wrappers copy their operands into column-major working buffers, hand
//! those to the kernel layer, and wrap the result back up, so caller
//! tensors are never mutated and may use either storage order (or be
//! non-contiguous views). The singular-matrix info code from the kernels
//! surfaces here as [`LattixError::SingularMatrix`].

use lattix_core::{Layout, LattixError, Rank2, Result, Scalar, StaticTensor, Tensor};

use crate::gemm::{gemm, Transpose};
use crate::lstsq::gels;
use crate::lu::{gesv, getrf, getri};

/// Rows, right-hand-side count, and 1-D-ness of a right-hand-side tensor.
fn rhs_dims<T: Scalar>(b: &Tensor<T>) -> Result<(usize, usize, bool)> {
    match b.rank() {
        1 => Ok((b.shape().dims()[0], 1, true)),
        2 => {
            let (r, c) = b.matrix_dims()?;
            Ok((r, c, false))
        }
        r => Err(LattixError::InvalidArgument(format!(
            "right-hand side must be 1-D or 2-D, got rank {r}"
        ))),
    }
}

/// Matrix product of 2-D tensors, or matrix-vector product when `b` is
/// 1-D.
pub fn matmul<T: Scalar>(a: &Tensor<T>, b: &Tensor<T>) -> Result<Tensor<T>> {
    let (m, k1) = a.matrix_dims()?;
    let (k2, n, vector) = rhs_dims(b)?;
    if k1 != k2 {
        return Err(LattixError::MatmulDimMismatch { m, k1, k2, n });
    }

    let av = a.to_vec(Layout::ColMajor);
    let bv = b.to_vec(Layout::ColMajor);
    let mut c = vec![T::zero(); m * n];
    gemm(
        Layout::ColMajor,
        Transpose::None,
        Transpose::None,
        m,
        n,
        k1,
        T::one(),
        &av,
        m.max(1),
        &bv,
        k1.max(1),
        T::zero(),
        &mut c,
        m.max(1),
    );

    if vector {
        Tensor::from_vec(&[m], c, Layout::ColMajor)
    } else {
        Tensor::from_vec(&[m, n], c, Layout::ColMajor)
    }
}

/// Typed matrix product: inner-dimension agreement is enforced by the type
/// system, so the multiply itself cannot fail.
pub fn matmul_static<T: Scalar, const M: usize, const K: usize, const N: usize>(
    a: &StaticTensor<T, Rank2<M, K>>,
    b: &StaticTensor<T, Rank2<K, N>>,
) -> StaticTensor<T, Rank2<M, N>> {
    let product = matmul(a.as_dyn(), b.as_dyn()).expect("typed inner dimensions agree");
    StaticTensor::from_dyn(product).expect("kernel output matches the typed shape")
}

/// LU factorization of a 2-D tensor.
///
/// Returns the packed factors (`L` below the unit diagonal, `U` on and
/// above), the 1-based pivot array, and the raw [`getrf`] info code:
/// `0` for success, or the 1-based column of a zero pivot detected at the
/// last eliminated column. The info code is a signal, not an error: the
/// partial factorization is returned either way.
pub fn lu<T: Scalar>(a: &Tensor<T>) -> Result<(Tensor<T>, Vec<usize>, usize)> {
    let (m, n) = a.matrix_dims()?;
    let mut data = a.to_vec(Layout::ColMajor);
    let mut ipiv = vec![0usize; m.min(n)];
    let info = getrf(Layout::ColMajor, m, n, &mut data, m.max(1), &mut ipiv);
    let factors = Tensor::from_vec(&[m, n], data, Layout::ColMajor)?;
    Ok((factors, ipiv, info))
}

/// Solve `A·X = B` for square `A`; `B` may be a vector or a matrix of
/// right-hand sides. Neither operand is mutated.
pub fn solve<T: Scalar>(a: &Tensor<T>, b: &Tensor<T>) -> Result<Tensor<T>> {
    let (m, n) = a.matrix_dims()?;
    if m != n {
        return Err(LattixError::InvalidArgument(format!(
            "solve needs a square matrix, got {m}x{n}"
        )));
    }
    let (rows, nrhs, vector) = rhs_dims(b)?;
    if rows != n {
        return Err(LattixError::ShapeMismatch {
            expected: vec![n],
            got: vec![rows],
        });
    }

    let mut a_data = a.to_vec(Layout::ColMajor);
    let mut b_data = b.to_vec(Layout::ColMajor);
    let mut ipiv = vec![0usize; n];
    let info = gesv(
        Layout::ColMajor,
        n,
        nrhs,
        &mut a_data,
        n.max(1),
        &mut ipiv,
        &mut b_data,
        n.max(1),
    );
    if info != 0 {
        return Err(LattixError::SingularMatrix { column: info });
    }

    if vector {
        Tensor::from_vec(&[n], b_data, Layout::ColMajor)
    } else {
        Tensor::from_vec(&[n, nrhs], b_data, Layout::ColMajor)
    }
}

/// Inverse of a square 2-D tensor.
pub fn inv<T: Scalar>(a: &Tensor<T>) -> Result<Tensor<T>> {
    let (m, n) = a.matrix_dims()?;
    if m != n {
        return Err(LattixError::InvalidArgument(format!(
            "inv needs a square matrix, got {m}x{n}"
        )));
    }

    let mut data = a.to_vec(Layout::ColMajor);
    let mut ipiv = vec![0usize; n];
    let info = getrf(Layout::ColMajor, n, n, &mut data, n.max(1), &mut ipiv);
    if info != 0 {
        return Err(LattixError::SingularMatrix { column: info });
    }
    getri(Layout::ColMajor, n, &mut data, n.max(1), &ipiv);
    Tensor::from_vec(&[n, n], data, Layout::ColMajor)
}

/// Least-squares solution of `A·X = B`: the residual minimizer when the
/// system is overdetermined, the minimum-norm solution when it is
/// underdetermined. Neither operand is mutated.
pub fn lstsq<T: Scalar>(a: &Tensor<T>, b: &Tensor<T>) -> Result<Tensor<T>> {
    let (m, n) = a.matrix_dims()?;
    let (rows, nrhs, vector) = rhs_dims(b)?;
    if rows != m {
        return Err(LattixError::ShapeMismatch {
            expected: vec![m],
            got: vec![rows],
        });
    }

    let a_data = a.to_vec(Layout::ColMajor);
    let max_mn = m.max(n);

    // the kernel wants max(m, n) rows per right-hand side
    let b_vals = b.to_vec(Layout::ColMajor);
    let mut b_data = vec![T::zero(); max_mn * nrhs];
    for j in 0..nrhs {
        for i in 0..m {
            b_data[j * max_mn + i] = b_vals[j * m + i];
        }
    }

    gels(
        Layout::ColMajor,
        Transpose::None,
        m,
        n,
        nrhs,
        &a_data,
        m.max(1),
        &mut b_data,
        max_mn.max(1),
    );

    let mut x = vec![T::zero(); n * nrhs];
    for j in 0..nrhs {
        for i in 0..n {
            x[j * n + i] = b_data[j * max_mn + i];
        }
    }

    if vector {
        Tensor::from_vec(&[n], x, Layout::ColMajor)
    } else {
        Tensor::from_vec(&[n, nrhs], x, Layout::ColMajor)
    }
}
