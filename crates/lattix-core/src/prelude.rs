//! Convenience re-exports for common lattix-core types.
//!
//! ```rust
//! use lattix_core::prelude::*;
//! ```

pub use crate::Device;
pub use crate::LattixError;
pub use crate::Layout;
pub use crate::Result;
pub use crate::Scalar;
pub use crate::Shape;
pub use crate::Tensor;
pub use crate::{ConstShape, Rank1, Rank2, Rank3, StaticTensor};
