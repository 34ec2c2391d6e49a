use std::fmt;

use smallvec::SmallVec;

/// Storage order for tensor buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    /// First axis fastest: `strides[0] == 1`. The default order.
    #[default]
    ColMajor,
    /// Last axis fastest: `strides[rank-1] == 1`.
    RowMajor,
}

impl Layout {
    /// The mirrored order.
    pub fn opposite(&self) -> Layout {
        match self {
            Layout::ColMajor => Layout::RowMajor,
            Layout::RowMajor => Layout::ColMajor,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::ColMajor => write!(f, "col-major"),
            Layout::RowMajor => write!(f, "row-major"),
        }
    }
}

/// Compute contiguous strides for `dims` in the given order.
///
/// Column-major: `s[0] = 1`, each stride is the running product of prior
/// extents. Row-major is the mirror. Always succeeds; an empty `dims`
/// (scalar) yields empty strides.
pub fn contiguous_strides(dims: &[usize], layout: Layout) -> SmallVec<[usize; 4]> {
    let rank = dims.len();
    if rank == 0 {
        return SmallVec::new();
    }
    let mut strides = SmallVec::from_elem(0usize, rank);
    match layout {
        Layout::ColMajor => {
            strides[0] = 1;
            for i in 1..rank {
                strides[i] = strides[i - 1] * dims[i - 1];
            }
        }
        Layout::RowMajor => {
            strides[rank - 1] = 1;
            for i in (0..rank - 1).rev() {
                strides[i] = strides[i + 1] * dims[i + 1];
            }
        }
    }
    strides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_major_strides() {
        let s = contiguous_strides(&[2, 3, 4], Layout::ColMajor);
        assert_eq!(s.as_slice(), &[1, 2, 6]);
    }

    #[test]
    fn test_row_major_strides() {
        let s = contiguous_strides(&[2, 3, 4], Layout::RowMajor);
        assert_eq!(s.as_slice(), &[12, 4, 1]);
    }

    #[test]
    fn test_scalar_strides() {
        assert!(contiguous_strides(&[], Layout::ColMajor).is_empty());
        assert!(contiguous_strides(&[], Layout::RowMajor).is_empty());
    }

    #[test]
    fn test_rank_one() {
        assert_eq!(
            contiguous_strides(&[7], Layout::ColMajor).as_slice(),
            contiguous_strides(&[7], Layout::RowMajor).as_slice(),
        );
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Layout::ColMajor.opposite(), Layout::RowMajor);
        assert_eq!(format!("{}", Layout::RowMajor), "row-major");
    }
}
