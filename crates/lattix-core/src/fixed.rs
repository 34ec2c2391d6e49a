//! Compile-time shapes.
//!
//! A [`ConstShape`] descriptor carries a tensor's extents in its type, so
//! element counts and inner dimensions are validated before the program
//! runs: construction from nested arrays fixes the count in the type system,
//! [`StaticTensor::reshape`] asserts count preservation in a `const` block,
//! and the typed matrix product in `lattix-linalg` makes inner-dimension
//! agreement a type error. Storage and stride bookkeeping delegate to
//! [`Tensor`], so static and dynamic tensors share one engine.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use rand::distributions::uniform::SampleUniform;

use crate::error::LattixError;
use crate::layout::Layout;
use crate::scalar::Scalar;
use crate::shape::Shape;
use crate::tensor::Tensor;
use crate::Result;

/// Shape descriptor known at compile time.
pub trait ConstShape: Copy + Default + 'static {
    /// Per-axis extents.
    const DIMS: &'static [usize];

    /// The runtime shape these extents describe.
    fn shape() -> Shape {
        Shape::new(Self::DIMS)
    }
}

/// Element count of a dims list, usable in const contexts.
pub const fn const_numel(dims: &[usize]) -> usize {
    let mut product = 1;
    let mut i = 0;
    while i < dims.len() {
        product *= dims[i];
        i += 1;
    }
    product
}

/// 1-D shape descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rank1<const D0: usize>;

/// 2-D shape descriptor: `Rank2<ROWS, COLS>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rank2<const R: usize, const C: usize>;

/// 3-D shape descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rank3<const A: usize, const B: usize, const C: usize>;

impl<const D0: usize> ConstShape for Rank1<D0> {
    const DIMS: &'static [usize] = &[D0];
}

impl<const R: usize, const C: usize> ConstShape for Rank2<R, C> {
    const DIMS: &'static [usize] = &[R, C];
}

impl<const A: usize, const B: usize, const C: usize> ConstShape for Rank3<A, B, C> {
    const DIMS: &'static [usize] = &[A, B, C];
}

/// Tensor whose shape is part of its type.
///
/// Dereferences to [`Tensor`] for everything shape-agnostic (element access,
/// iteration, views), while typed constructors and shape operations move the
/// validation the dynamic tensor does at run time to compile time.
#[derive(Clone)]
pub struct StaticTensor<T, S: ConstShape> {
    inner: Tensor<T>,
    _shape: PhantomData<S>,
}

impl<T: Scalar, S: ConstShape> StaticTensor<T, S> {
    pub(crate) fn wrap(inner: Tensor<T>) -> Self {
        Self {
            inner,
            _shape: PhantomData,
        }
    }

    /// Adopt a dynamic tensor after verifying its shape matches `S`.
    pub fn from_dyn(inner: Tensor<T>) -> Result<Self> {
        if inner.shape().dims() != S::DIMS {
            return Err(LattixError::ShapeMismatch {
                expected: S::DIMS.to_vec(),
                got: inner.shape().dims().to_vec(),
            });
        }
        Ok(Self::wrap(inner))
    }

    /// Tensor filled with `value`.
    pub fn filled(value: T) -> Self {
        Self::wrap(Tensor::from_elem(S::DIMS, value, Layout::ColMajor))
    }

    /// Zero-filled tensor.
    pub fn zeros() -> Self {
        Self::filled(T::zero())
    }

    /// One-filled tensor.
    pub fn ones() -> Self {
        Self::filled(T::one())
    }

    /// Uniform random draws from `[min, max)`.
    pub fn random(min: T, max: T) -> Self
    where
        T: SampleUniform,
    {
        Self::wrap(Tensor::random(min, max, S::DIMS))
    }

    /// Borrow as a dynamic tensor.
    pub fn as_dyn(&self) -> &Tensor<T> {
        &self.inner
    }

    /// Unwrap into a dynamic tensor.
    pub fn into_dyn(self) -> Tensor<T> {
        self.inner
    }

    /// View with a new static shape over the same elements.
    ///
    /// Element-count preservation is a compile-time assertion; reshaping a
    /// non-contiguous view (e.g. a transpose) still fails at run time.
    pub fn reshape<S2: ConstShape>(&self) -> Result<StaticTensor<T, S2>> {
        const {
            assert!(
                const_numel(S::DIMS) == const_numel(S2::DIMS),
                "reshape must preserve the element count"
            )
        };
        Ok(StaticTensor::wrap(
            self.inner.reshaped(S2::DIMS, Layout::ColMajor)?,
        ))
    }
}

impl<T: Scalar, const D0: usize> StaticTensor<T, Rank1<D0>> {
    /// Build from a fixed-size array; the length is the shape.
    pub fn from_array(elements: [T; D0]) -> Self {
        Self::wrap(
            Tensor::from_vec(&[D0], elements.to_vec(), Layout::ColMajor)
                .expect("array length equals the static element count"),
        )
    }
}

impl<T: Scalar, const R: usize, const C: usize> StaticTensor<T, Rank2<R, C>> {
    /// Build from rows; extents and element count are fixed by the array
    /// type.
    pub fn from_rows(rows: [[T; C]; R]) -> Self {
        let mut data = Vec::with_capacity(R * C);
        for c in 0..C {
            for row in &rows {
                data.push(row[c]);
            }
        }
        Self::wrap(
            Tensor::from_vec(&[R, C], data, Layout::ColMajor)
                .expect("array extents equal the static shape"),
        )
    }

    /// Identity-patterned matrix.
    pub fn eye() -> Self {
        Self::wrap(Tensor::eye(&[R, C]).expect("Rank2 shapes are 2-D"))
    }

    /// Transposed view.
    pub fn transpose(&self) -> StaticTensor<T, Rank2<C, R>> {
        StaticTensor::wrap(
            self.inner
                .permute(&[1, 0])
                .expect("an axis swap on a rank-2 tensor is always valid"),
        )
    }

    /// Typed `SR × SC` subview starting at `(r0, c0)`.
    ///
    /// The sub-extents are bounded by the parent's at compile time; the
    /// start offsets are validated at run time.
    pub fn subview<const SR: usize, const SC: usize>(
        &self,
        r0: usize,
        c0: usize,
    ) -> Result<StaticTensor<T, Rank2<SR, SC>>> {
        const {
            assert!(
                SR <= R && SC <= C,
                "a subview cannot exceed the parent shape"
            )
        };
        Ok(StaticTensor::wrap(self.inner.subview(&[SR, SC], &[r0, c0])?))
    }
}

impl<T: Scalar, const A: usize, const B: usize, const C: usize> StaticTensor<T, Rank3<A, B, C>> {
    /// Build from nested arrays indexed `[a][b][c]`.
    pub fn from_array(blocks: [[[T; C]; B]; A]) -> Self {
        let mut data = Vec::with_capacity(A * B * C);
        for c in 0..C {
            for b in 0..B {
                for block in &blocks {
                    data.push(block[b][c]);
                }
            }
        }
        Self::wrap(
            Tensor::from_vec(&[A, B, C], data, Layout::ColMajor)
                .expect("array extents equal the static shape"),
        )
    }
}

impl<T: Scalar, S: ConstShape> Deref for StaticTensor<T, S> {
    type Target = Tensor<T>;

    fn deref(&self) -> &Tensor<T> {
        &self.inner
    }
}

impl<T: Scalar, S: ConstShape> PartialEq for StaticTensor<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Scalar, S: ConstShape> fmt::Debug for StaticTensor<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

// Identical static shapes make element-wise compatibility hold by
// construction, so the operators cannot fail at run time.

impl<T: Scalar, S: ConstShape> std::ops::Add for &StaticTensor<T, S> {
    type Output = StaticTensor<T, S>;
    fn add(self, rhs: &StaticTensor<T, S>) -> StaticTensor<T, S> {
        StaticTensor::wrap(self.inner.add(&rhs.inner).expect("static shapes are equal"))
    }
}

impl<T: Scalar, S: ConstShape> std::ops::Sub for &StaticTensor<T, S> {
    type Output = StaticTensor<T, S>;
    fn sub(self, rhs: &StaticTensor<T, S>) -> StaticTensor<T, S> {
        StaticTensor::wrap(self.inner.sub(&rhs.inner).expect("static shapes are equal"))
    }
}

impl<T: Scalar, S: ConstShape> std::ops::Neg for &StaticTensor<T, S> {
    type Output = StaticTensor<T, S>;
    fn neg(self) -> StaticTensor<T, S> {
        StaticTensor::wrap(self.inner.neg().expect("negation of a host tensor"))
    }
}

impl<T: Scalar, S: ConstShape> std::ops::AddAssign<&StaticTensor<T, S>> for StaticTensor<T, S> {
    fn add_assign(&mut self, rhs: &StaticTensor<T, S>) {
        self.inner
            .add_(&rhs.inner)
            .expect("static shapes are equal");
    }
}

impl<T: Scalar, S: ConstShape> std::ops::SubAssign<&StaticTensor<T, S>> for StaticTensor<T, S> {
    fn sub_assign(&mut self, rhs: &StaticTensor<T, S>) {
        self.inner
            .sub_(&rhs.inner)
            .expect("static shapes are equal");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let m = StaticTensor::<f64, Rank2<2, 3>>::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(m.shape().dims(), &[2, 3]);
        assert_eq!(m.get(&[0, 1]).unwrap(), 2.0);
        assert_eq!(m.get(&[1, 2]).unwrap(), 6.0);
        assert!(m.is_contiguous());
    }

    #[test]
    fn test_from_array_rank1() {
        let v = StaticTensor::<f64, Rank1<3>>::from_array([1.0, 2.0, 3.0]);
        assert_eq!(v.numel(), 3);
        assert_eq!(v.get(&[2]).unwrap(), 3.0);
    }

    #[test]
    fn test_from_array_rank3() {
        let t = StaticTensor::<f64, Rank3<2, 2, 2>>::from_array([
            [[1.0, 2.0], [3.0, 4.0]],
            [[5.0, 6.0], [7.0, 8.0]],
        ]);
        assert_eq!(t.get(&[0, 0, 0]).unwrap(), 1.0);
        assert_eq!(t.get(&[1, 0, 1]).unwrap(), 6.0);
        assert_eq!(t.get(&[0, 1, 0]).unwrap(), 3.0);
    }

    #[test]
    fn test_transpose_typed() {
        let m = StaticTensor::<f64, Rank2<2, 3>>::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let t: StaticTensor<f64, Rank2<3, 2>> = m.transpose();
        assert_eq!(t.get(&[2, 1]).unwrap(), 6.0);
        let back = t.transpose();
        assert_eq!(back, m);
    }

    #[test]
    fn test_reshape_typed() {
        let m = StaticTensor::<f64, Rank2<2, 3>>::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let v: StaticTensor<f64, Rank1<6>> = m.reshape().unwrap();
        assert_eq!(v.numel(), 6);
        let back: StaticTensor<f64, Rank2<2, 3>> = v.reshape().unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_subview_typed() {
        let m = StaticTensor::<f64, Rank2<3, 3>>::from_rows([
            [1.0, 2.0, 3.0],
            [4.0, 5.0, 6.0],
            [7.0, 8.0, 9.0],
        ]);
        let s: StaticTensor<f64, Rank2<2, 2>> = m.subview(1, 1).unwrap();
        assert_eq!(s.get(&[0, 0]).unwrap(), 5.0);
        assert_eq!(s.get(&[1, 1]).unwrap(), 9.0);
    }

    #[test]
    fn test_eye() {
        let i = StaticTensor::<f64, Rank2<3, 3>>::eye();
        assert_eq!(i.get(&[1, 1]).unwrap(), 1.0);
        assert_eq!(i.get(&[1, 2]).unwrap(), 0.0);
    }

    #[test]
    fn test_operators() {
        let a = StaticTensor::<f64, Rank2<2, 2>>::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        let b = StaticTensor::<f64, Rank2<2, 2>>::ones();
        let c = &a + &b;
        assert_eq!(c.get(&[1, 1]).unwrap(), 5.0);
        let d = &c - &b;
        assert_eq!(d, a);
        let n = -&a;
        assert_eq!(n.get(&[0, 0]).unwrap(), -1.0);

        let mut e = a.clone();
        e += &b;
        assert_eq!(e, c);
        e -= &b;
        assert_eq!(e, a);
    }

    #[test]
    fn test_from_dyn() {
        let t = Tensor::<f64>::zeros(&[2, 2]);
        assert!(StaticTensor::<f64, Rank2<2, 2>>::from_dyn(t.clone()).is_ok());
        assert!(StaticTensor::<f64, Rank2<2, 3>>::from_dyn(t).is_err());
    }

    #[test]
    fn test_zeros_ones_random() {
        let z = StaticTensor::<f64, Rank2<2, 2>>::zeros();
        assert!(z.iter().all(|&v| v == 0.0));
        let o = StaticTensor::<f64, Rank1<4>>::ones();
        assert!(o.iter().all(|&v| v == 1.0));
        let r = StaticTensor::<f64, Rank1<32>>::random(0.0, 1.0);
        assert!(r.iter().all(|&v| (0.0..1.0).contains(&v)));
    }
}
