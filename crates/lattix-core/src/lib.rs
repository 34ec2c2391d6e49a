//! # lattix-core
//!
//! Core tensor engine for the lattix linear-algebra workspace.
//!
//! Provides the foundational [`Tensor`] type with:
//! - Generic element types through the [`Scalar`] contract (plain floats,
//!   integers, or any quantity-like type with ring arithmetic)
//! - Column-major and row-major layouts with explicit stride control
//! - Zero-copy views (reshape, transpose, permute, subview, flatten)
//! - Compile-time shapes via [`StaticTensor`] and [`ConstShape`] descriptors
//! - Host and CUDA device storage
//! - Build-time switchable bounds checking (the `checked` feature)

pub mod device;
pub mod error;
pub mod fixed;
pub mod iter;
pub mod layout;
pub mod ops;
pub mod prelude;
pub mod scalar;
pub mod shape;
pub mod storage;
pub mod tensor;

pub use device::Device;
pub use error::LattixError;
pub use fixed::{ConstShape, Rank1, Rank2, Rank3, StaticTensor};
pub use layout::Layout;
pub use scalar::Scalar;
pub use shape::Shape;
pub use storage::Storage;
pub use tensor::Tensor;

pub type Result<T> = std::result::Result<T, LattixError>;
