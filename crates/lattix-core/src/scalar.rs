use std::fmt;
use std::ops::Neg;

use num_traits::{Num, NumAssignOps, NumCast};

/// Element contract for tensor storage.
///
/// Any type with ring arithmetic, ordering, and numeric-literal conversion
/// qualifies: the built-in floats and signed integers, or a physical-quantity
/// wrapper whose operators carry dimension information. The tensor core is
/// otherwise agnostic to what the element represents.
pub trait Scalar:
    Copy
    + Default
    + PartialOrd
    + fmt::Debug
    + Num
    + NumAssignOps
    + Neg<Output = Self>
    + NumCast
    + Send
    + Sync
    + 'static
{
    /// Magnitude without assuming IEEE semantics; used by pivot selection.
    fn abs_val(self) -> Self {
        if self < Self::zero() {
            -self
        } else {
            self
        }
    }
}

impl<T> Scalar for T where
    T: Copy
        + Default
        + PartialOrd
        + fmt::Debug
        + Num
        + NumAssignOps
        + Neg<Output = Self>
        + NumCast
        + Send
        + Sync
        + 'static
{
}
