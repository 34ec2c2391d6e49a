//! Flat and subview iteration.
//!
//! The canonical logical order everywhere in this crate is column-major
//! (first axis fastest), matching the default storage order. Iterators walk
//! that order through whatever strides the tensor carries, so transposed and
//! strided views iterate correctly without copying.

use smallvec::{smallvec, SmallVec};

use crate::layout::Layout;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Visit every multi-index of `dims` in the logical order of `layout`.
///
/// Calls `f` exactly once per index; a shape containing a zero extent visits
/// nothing, a scalar shape visits the empty index once.
pub(crate) fn for_each_index_in(dims: &[usize], layout: Layout, mut f: impl FnMut(&[usize])) {
    if dims.iter().any(|&d| d == 0) {
        return;
    }
    let rank = dims.len();
    let mut idx: SmallVec<[usize; 4]> = smallvec![0; rank];
    loop {
        f(&idx);
        let mut done = true;
        match layout {
            Layout::ColMajor => {
                for d in 0..rank {
                    idx[d] += 1;
                    if idx[d] < dims[d] {
                        done = false;
                        break;
                    }
                    idx[d] = 0;
                }
            }
            Layout::RowMajor => {
                for d in (0..rank).rev() {
                    idx[d] += 1;
                    if idx[d] < dims[d] {
                        done = false;
                        break;
                    }
                    idx[d] = 0;
                }
            }
        }
        if done {
            break;
        }
    }
}

/// Forward iterator over every element in canonical (column-major) logical
/// order.
///
/// Finite and restartable: obtain a fresh one with [`Tensor::iter`].
pub struct FlatIter<'a, T> {
    data: &'a [T],
    dims: &'a [usize],
    strides: &'a [usize],
    index: SmallVec<[usize; 4]>,
    phys: usize,
    remaining: usize,
}

impl<'a, T: Scalar> FlatIter<'a, T> {
    pub(crate) fn new(tensor: &'a Tensor<T>) -> Self {
        let rank = tensor.rank();
        Self {
            data: tensor.host_data(),
            dims: tensor.shape().dims(),
            strides: tensor.strides(),
            index: smallvec![0; rank],
            phys: tensor.offset(),
            remaining: tensor.numel(),
        }
    }
}

impl<'a, T: Scalar> Iterator for FlatIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let item = &self.data[self.phys];
        self.remaining -= 1;
        if self.remaining > 0 {
            for d in 0..self.dims.len() {
                self.index[d] += 1;
                self.phys += self.strides[d];
                if self.index[d] < self.dims[d] {
                    break;
                }
                self.phys -= self.strides[d] * self.dims[d];
                self.index[d] = 0;
            }
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Scalar> ExactSizeIterator for FlatIter<'_, T> {}

/// Iterator over fixed-shape subviews tiling a parent tensor.
///
/// Tiles advance in canonical (column-major) grid order. Each item is a view
/// sharing the parent's storage.
pub struct SubviewIter<'a, T> {
    parent: &'a Tensor<T>,
    tile: SmallVec<[usize; 4]>,
    grid: SmallVec<[usize; 4]>,
    cursor: SmallVec<[usize; 4]>,
    remaining: usize,
}

impl<'a, T: Scalar> SubviewIter<'a, T> {
    pub(crate) fn new(parent: &'a Tensor<T>, tile: &[usize]) -> Self {
        let grid: SmallVec<[usize; 4]> = parent
            .shape()
            .dims()
            .iter()
            .zip(tile.iter())
            .map(|(&d, &t)| if t == 0 { 0 } else { d / t })
            .collect();
        let remaining = grid.iter().product();
        let rank = grid.len();
        Self {
            parent,
            tile: SmallVec::from_slice(tile),
            grid,
            cursor: smallvec![0; rank],
            remaining,
        }
    }
}

impl<'a, T: Scalar> Iterator for SubviewIter<'a, T> {
    type Item = Tensor<T>;

    fn next(&mut self) -> Option<Tensor<T>> {
        if self.remaining == 0 {
            return None;
        }
        let start: SmallVec<[usize; 4]> = self
            .cursor
            .iter()
            .zip(self.tile.iter())
            .map(|(&c, &t)| c * t)
            .collect();
        let view = self.parent.tile_view(&self.tile, &start);
        self.remaining -= 1;
        if self.remaining > 0 {
            for d in 0..self.grid.len() {
                self.cursor[d] += 1;
                if self.cursor[d] < self.grid[d] {
                    break;
                }
                self.cursor[d] = 0;
            }
        }
        Some(view)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Scalar> ExactSizeIterator for SubviewIter<'_, T> {}

impl<'a, T: Scalar> IntoIterator for &'a Tensor<T> {
    type Item = &'a T;
    type IntoIter = FlatIter<'a, T>;

    fn into_iter(self) -> FlatIter<'a, T> {
        self.iter()
    }
}
