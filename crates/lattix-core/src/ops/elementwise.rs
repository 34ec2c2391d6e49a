//! Element-wise arithmetic on tensors.
//!
//! Binary operations require identical shapes (there is no broadcasting) and
//! fail with a shape mismatch before any element is written. Host tensors
//! take a flat-iterator pass; device tensors route through the dispatch
//! contract in [`super::dispatch`].

use crate::error::LattixError;
use crate::layout::Layout;
use crate::ops::dispatch;
use crate::scalar::Scalar;
use crate::tensor::Tensor;
use crate::Result;

/// Validate that two operands are element-wise compatible.
///
/// Compiled out entirely without the `checked` feature.
#[cfg(feature = "checked")]
fn element_wise_compatible<T: Scalar>(a: &Tensor<T>, b: &Tensor<T>) -> Result<()> {
    if a.shape().dims() != b.shape().dims() {
        return Err(LattixError::ShapeMismatch {
            expected: a.shape().dims().to_vec(),
            got: b.shape().dims().to_vec(),
        });
    }
    Ok(())
}

#[cfg(not(feature = "checked"))]
#[inline(always)]
fn element_wise_compatible<T: Scalar>(_a: &Tensor<T>, _b: &Tensor<T>) -> Result<()> {
    Ok(())
}

fn binary_op<T: Scalar>(
    a: &Tensor<T>,
    b: &Tensor<T>,
    op: &'static str,
    f: impl Fn(T, T) -> T,
) -> Result<Tensor<T>> {
    element_wise_compatible(a, b)?;
    if !a.device().is_host() || !b.device().is_host() {
        return dispatch::launch_binary(a, b, op);
    }
    let data: Vec<T> = a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect();
    Tensor::from_vec(a.shape().dims(), data, Layout::ColMajor)
}

impl<T: Scalar> Tensor<T> {
    /// Element-wise sum: `self + other`.
    pub fn add(&self, other: &Tensor<T>) -> Result<Tensor<T>> {
        binary_op(self, other, "add", |x, y| x + y)
    }

    /// Element-wise difference: `self - other`.
    pub fn sub(&self, other: &Tensor<T>) -> Result<Tensor<T>> {
        binary_op(self, other, "sub", |x, y| x - y)
    }

    /// Negation into a new owner tensor. Copies first; the operand is never
    /// mutated.
    pub fn neg(&self) -> Result<Tensor<T>> {
        if !self.device().is_host() {
            return dispatch::launch_unary(self, "neg");
        }
        let mut result = self.to_layout(self.layout().unwrap_or(Layout::ColMajor));
        for v in result.storage_mut().as_slice_mut() {
            *v = -*v;
        }
        Ok(result)
    }

    /// In-place element-wise addition: `self += other`.
    pub fn add_(&mut self, other: &Tensor<T>) -> Result<()> {
        self.compound_op(other, "add", |x, y| x + y)
    }

    /// In-place element-wise subtraction: `self -= other`.
    pub fn sub_(&mut self, other: &Tensor<T>) -> Result<()> {
        self.compound_op(other, "sub", |x, y| x - y)
    }

    fn compound_op(
        &mut self,
        other: &Tensor<T>,
        op: &'static str,
        f: impl Fn(T, T) -> T,
    ) -> Result<()> {
        element_wise_compatible(self, other)?;
        if !self.device().is_host() || !other.device().is_host() {
            *self = dispatch::launch_binary(self, other, op)?;
            return Ok(());
        }
        // read the right-hand side up front: it may alias our storage
        let rhs: Vec<T> = other.iter().copied().collect();
        let offsets = self.physical_offsets();
        let data = self.storage_mut().as_slice_mut();
        for (&p, y) in offsets.iter().zip(rhs) {
            data[p] = f(data[p], y);
        }
        Ok(())
    }

    /// New tensor with every element multiplied by `s`.
    pub fn mul_scalar(&self, s: T) -> Result<Tensor<T>> {
        let mut result = self.to_layout(self.layout().unwrap_or(Layout::ColMajor));
        result.mul_scalar_(s)?;
        Ok(result)
    }

    /// New tensor with every element divided by `s`.
    pub fn div_scalar(&self, s: T) -> Result<Tensor<T>> {
        let mut result = self.to_layout(self.layout().unwrap_or(Layout::ColMajor));
        result.div_scalar_(s)?;
        Ok(result)
    }

    /// In-place scalar multiplication: `self *= s`.
    pub fn mul_scalar_(&mut self, s: T) -> Result<()> {
        self.scalar_op(move |x| x * s)
    }

    /// In-place scalar division: `self /= s`.
    pub fn div_scalar_(&mut self, s: T) -> Result<()> {
        self.scalar_op(move |x| x / s)
    }

    fn scalar_op(&mut self, f: impl Fn(T) -> T) -> Result<()> {
        if !self.device().is_host() {
            return Err(LattixError::Unsupported(
                "scalar operations on device tensors are not implemented".into(),
            ));
        }
        let offsets = self.physical_offsets();
        let data = self.storage_mut().as_slice_mut();
        for &p in &offsets {
            data[p] = f(data[p]);
        }
        Ok(())
    }
}

// Operator sugar. Like every checked method above, the underlying operation
// validates shape compatibility; the operators surface a violation as a
// panic because `std::ops` traits cannot return a `Result`.

impl<T: Scalar> std::ops::Add for &Tensor<T> {
    type Output = Tensor<T>;
    fn add(self, rhs: &Tensor<T>) -> Tensor<T> {
        Tensor::add(self, rhs).expect("tensor addition failed")
    }
}

impl<T: Scalar> std::ops::Sub for &Tensor<T> {
    type Output = Tensor<T>;
    fn sub(self, rhs: &Tensor<T>) -> Tensor<T> {
        Tensor::sub(self, rhs).expect("tensor subtraction failed")
    }
}

impl<T: Scalar> std::ops::Neg for &Tensor<T> {
    type Output = Tensor<T>;
    fn neg(self) -> Tensor<T> {
        Tensor::neg(self).expect("tensor negation failed")
    }
}

impl<T: Scalar> std::ops::AddAssign<&Tensor<T>> for Tensor<T> {
    fn add_assign(&mut self, rhs: &Tensor<T>) {
        self.add_(rhs).expect("tensor += failed");
    }
}

impl<T: Scalar> std::ops::SubAssign<&Tensor<T>> for Tensor<T> {
    fn sub_assign(&mut self, rhs: &Tensor<T>) {
        self.sub_(rhs).expect("tensor -= failed");
    }
}

impl<T: Scalar> std::ops::MulAssign<T> for Tensor<T> {
    fn mul_assign(&mut self, rhs: T) {
        self.mul_scalar_(rhs).expect("tensor *= scalar failed");
    }
}

impl<T: Scalar> std::ops::DivAssign<T> for Tensor<T> {
    fn div_assign(&mut self, rhs: T) {
        self.div_scalar_(rhs).expect("tensor /= scalar failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(vals: &[f64]) -> Tensor<f64> {
        Tensor::from_vec(&[vals.len()], vals.to_vec(), Layout::ColMajor).unwrap()
    }

    #[test]
    fn test_add_sub() {
        let a = t(&[1.0, 2.0, 3.0]);
        let b = t(&[4.0, 5.0, 6.0]);
        assert_eq!(a.add(&b).unwrap(), t(&[5.0, 7.0, 9.0]));
        assert_eq!(b.sub(&a).unwrap(), t(&[3.0, 3.0, 3.0]));
    }

    #[test]
    fn test_add_mixed_layout() {
        let a = Tensor::from_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0], Layout::ColMajor).unwrap();
        let b = Tensor::from_vec(&[2, 2], vec![1.0, 3.0, 2.0, 4.0], Layout::RowMajor).unwrap();
        // same logical values in both layouts
        let c = a.add(&b).unwrap();
        assert_eq!(c.get(&[0, 0]).unwrap(), 2.0);
        assert_eq!(c.get(&[1, 1]).unwrap(), 8.0);
    }

    #[cfg(feature = "checked")]
    #[test]
    fn test_shape_mismatch_leaves_operands_untouched() {
        let mut a = t(&[1.0, 2.0, 3.0]);
        let b = t(&[1.0, 2.0]);
        assert!(matches!(
            a.add(&b),
            Err(LattixError::ShapeMismatch { .. })
        ));
        assert!(a.add_(&b).is_err());
        assert_eq!(a, t(&[1.0, 2.0, 3.0]));
        assert_eq!(b, t(&[1.0, 2.0]));
    }

    #[test]
    fn test_neg_copies() {
        let a = t(&[1.0, -2.0]);
        let n = a.neg().unwrap();
        assert_eq!(n, t(&[-1.0, 2.0]));
        assert_eq!(a, t(&[1.0, -2.0]));
    }

    #[test]
    fn test_compound_assign() {
        let mut a = t(&[1.0, 2.0]);
        a.add_(&t(&[10.0, 20.0])).unwrap();
        assert_eq!(a, t(&[11.0, 22.0]));
        a.sub_(&t(&[1.0, 2.0])).unwrap();
        assert_eq!(a, t(&[10.0, 20.0]));
    }

    #[test]
    fn test_compound_assign_aliasing() {
        // t += view of t: the right-hand side is snapshotted first
        let mut a = t(&[1.0, 2.0]);
        let v = a.view();
        a.add_(&v).unwrap();
        assert_eq!(a, t(&[2.0, 4.0]));
    }

    #[test]
    fn test_add_on_views() {
        let m = Tensor::arange(0.0, 1.0, &[2, 2]);
        let tr = m.transpose().unwrap();
        // (r, c) of tr is (c, r) of m
        let s = m.add(&tr).unwrap();
        assert_eq!(s.get(&[0, 1]).unwrap(), s.get(&[1, 0]).unwrap());
    }

    #[test]
    fn test_scalar_ops() {
        let mut a = t(&[1.0, 2.0]);
        a.mul_scalar_(3.0).unwrap();
        assert_eq!(a, t(&[3.0, 6.0]));
        a.div_scalar_(2.0).unwrap();
        assert_eq!(a, t(&[1.5, 3.0]));

        let b = t(&[2.0, 4.0]).mul_scalar(0.5).unwrap();
        assert_eq!(b, t(&[1.0, 2.0]));
    }

    #[test]
    fn test_operator_sugar() {
        let a = t(&[1.0, 2.0]);
        let b = t(&[3.0, 4.0]);
        assert_eq!(&a + &b, t(&[4.0, 6.0]));
        assert_eq!(&b - &a, t(&[2.0, 2.0]));
        assert_eq!(-&a, t(&[-1.0, -2.0]));

        let mut c = a.clone();
        c += &b;
        assert_eq!(c, t(&[4.0, 6.0]));
        c -= &b;
        assert_eq!(c, a);
        c *= 4.0;
        assert_eq!(c, t(&[4.0, 8.0]));
        c /= 2.0;
        assert_eq!(c, t(&[2.0, 4.0]));
    }

    #[test]
    fn test_integer_elements() {
        let a = Tensor::from_vec(&[3], vec![1i64, 2, 3], Layout::ColMajor).unwrap();
        let b = Tensor::from_vec(&[3], vec![10i64, 20, 30], Layout::ColMajor).unwrap();
        assert_eq!(
            a.add(&b).unwrap().to_vec(Layout::ColMajor),
            vec![11, 22, 33]
        );
    }
}
