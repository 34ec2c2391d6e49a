use thiserror::Error;

/// Errors raised by tensor construction, access, and shape operations.
///
/// Singularity during factorization is deliberately *not* represented here at
/// the kernel level: `getrf`/`gesv` return an info code instead, and only the
/// tensor-level wrappers promote a non-zero code to [`LattixError::SingularMatrix`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LattixError {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    #[error("index {indices:?} out of range for shape {shape:?}")]
    OutOfRange { indices: Vec<usize>, shape: Vec<usize> },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("matmul dimension mismatch: [{m}, {k1}] x [{k2}, {n}]")]
    MatmulDimMismatch {
        m: usize,
        k1: usize,
        k2: usize,
        n: usize,
    },

    #[error("matrix is singular: zero pivot reported for column {column}")]
    SingularMatrix { column: usize },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("device error: {0}")]
    DeviceError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = LattixError::ShapeMismatch {
            expected: vec![2, 3],
            got: vec![3, 2],
        };
        assert!(e.to_string().contains("[2, 3]"));

        let e = LattixError::SingularMatrix { column: 2 };
        assert!(e.to_string().contains("column 2"));
    }
}
