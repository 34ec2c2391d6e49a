use std::fmt;

use rand::distributions::uniform::SampleUniform;
use rand::Rng;
use smallvec::{smallvec, SmallVec};

use crate::device::Device;
use crate::error::LattixError;
use crate::iter::{for_each_index_in, FlatIter, SubviewIter};
use crate::layout::Layout;
use crate::scalar::Scalar;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::Result;

/// A multi-dimensional array over any [`Scalar`] element type.
///
/// Tensors support:
/// - Column-major (default) and row-major storage, plus arbitrary strides
/// - Zero-copy views: reshape, transpose, permute, subview, flatten, and
///   the diagonal, all sharing storage with their source
/// - Host and CUDA device buffers
/// - Bounds and shape validation compiled in by the `checked` feature and
///   absent otherwise
///
/// `Clone` is shallow: the backing storage is reference-counted and writes
/// go through copy-on-write. A view therefore can never dangle, but writing
/// through a tensor whose storage is shared detaches it from the other
/// holders first.
///
/// # Examples
///
/// ```
/// use lattix_core::{Layout, Tensor};
///
/// let t = Tensor::from_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0], Layout::ColMajor).unwrap();
/// assert_eq!(t.get(&[1, 0]).unwrap(), 2.0);
///
/// let tr = t.transpose().unwrap();
/// assert_eq!(tr.get(&[0, 1]).unwrap(), 2.0);
/// ```
#[derive(Clone)]
pub struct Tensor<T> {
    storage: Storage<T>,
    shape: Shape,
    strides: SmallVec<[usize; 4]>,
    offset: usize,
}

impl<T: Scalar> Tensor<T> {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a tensor from elements laid out in `layout` order.
    ///
    /// The element count must equal the shape's product.
    pub fn from_vec(shape: &[usize], elements: Vec<T>, layout: Layout) -> Result<Self> {
        let s = Shape::new(shape);
        if elements.len() != s.numel() {
            return Err(LattixError::ShapeMismatch {
                expected: vec![s.numel()],
                got: vec![elements.len()],
            });
        }
        let strides = s.strides_for(layout);
        Ok(Self {
            storage: Storage::from_vec(elements),
            shape: s,
            strides,
            offset: 0,
        })
    }

    /// Create a tensor over a caller-provided buffer with explicit strides.
    ///
    /// This is the escape hatch for wrapping externally laid-out data
    /// (padded rows, interleaved channels). The buffer must be large enough
    /// to hold the farthest addressed element.
    pub fn from_vec_strided(shape: &[usize], strides: &[usize], elements: Vec<T>) -> Result<Self> {
        let s = Shape::new(shape);
        if strides.len() != s.rank() {
            return Err(LattixError::InvalidArgument(format!(
                "strides length {} does not match rank {}",
                strides.len(),
                s.rank()
            )));
        }
        if s.numel() > 0 {
            let span: usize = shape
                .iter()
                .zip(strides.iter())
                .map(|(&d, &st)| (d - 1) * st)
                .sum();
            if span >= elements.len() {
                return Err(LattixError::InvalidArgument(format!(
                    "buffer of {} elements is too small for shape {:?} with strides {:?}",
                    elements.len(),
                    shape,
                    strides
                )));
            }
        }
        Ok(Self {
            storage: Storage::from_vec(elements),
            shape: s,
            strides: SmallVec::from_slice(strides),
            offset: 0,
        })
    }

    /// Create a tensor filled with `value`.
    pub fn from_elem(shape: &[usize], value: T, layout: Layout) -> Self {
        let s = Shape::new(shape);
        let strides = s.strides_for(layout);
        Self {
            storage: Storage::filled(value, s.numel()),
            shape: s,
            strides,
            offset: 0,
        }
    }

    /// Create a 0-dimensional tensor holding a single value.
    pub fn scalar(value: T) -> Self {
        Self {
            storage: Storage::from_vec(vec![value]),
            shape: Shape::scalar(),
            strides: SmallVec::new(),
            offset: 0,
        }
    }

    /// Concatenate tensors along the leading axis.
    ///
    /// All parts must agree on rank and on every trailing extent; the
    /// leading extents sum. The result is a new column-major owner.
    pub fn concat(parts: &[Tensor<T>]) -> Result<Self> {
        let first = parts
            .first()
            .ok_or_else(|| LattixError::InvalidArgument("concat: empty tensor list".into()))?;
        let rank = first.rank();
        if rank == 0 {
            return Err(LattixError::InvalidArgument(
                "concat: cannot concatenate scalars".into(),
            ));
        }
        for t in &parts[1..] {
            if t.rank() != rank || t.shape.dims()[1..] != first.shape.dims()[1..] {
                return Err(LattixError::ShapeMismatch {
                    expected: first.shape.dims().to_vec(),
                    got: t.shape.dims().to_vec(),
                });
            }
        }

        let mut out_dims = first.shape.dims().to_vec();
        out_dims[0] = parts.iter().map(|t| t.shape.dims()[0]).sum();
        let mut out = Tensor::zeros(&out_dims);
        let out_strides = out.strides.clone();
        let data = out.storage.as_slice_mut();

        let mut base = 0usize;
        for t in parts {
            let src = t.host_data();
            for_each_index_in(t.shape.dims(), Layout::ColMajor, |idx| {
                let mut src_phys = t.offset;
                let mut dst_phys = 0usize;
                for (d, &i) in idx.iter().enumerate() {
                    src_phys += i * t.strides[d];
                    let j = if d == 0 { i + base } else { i };
                    dst_phys += j * out_strides[d];
                }
                data[dst_phys] = src[src_phys];
            });
            base += t.shape.dims()[0];
        }
        Ok(out)
    }

    // =========================================================================
    // Factories
    // =========================================================================

    /// Zero-filled tensor (column-major).
    pub fn zeros(shape: &[usize]) -> Self {
        Self::from_elem(shape, T::zero(), Layout::ColMajor)
    }

    /// One-filled tensor (column-major).
    pub fn ones(shape: &[usize]) -> Self {
        Self::from_elem(shape, T::one(), Layout::ColMajor)
    }

    /// Tensor filled with `value` (column-major).
    pub fn full(shape: &[usize], value: T) -> Self {
        Self::from_elem(shape, value, Layout::ColMajor)
    }

    /// Identity-patterned matrix: ones on the main diagonal.
    ///
    /// The shape may be rectangular but must be 2-D.
    pub fn eye(shape: &[usize]) -> Result<Self> {
        Self::diag(shape, T::one())
    }

    /// Matrix with `value` on the main diagonal and zeros elsewhere (2-D).
    pub fn diag(shape: &[usize], value: T) -> Result<Self> {
        if shape.len() != 2 {
            return Err(LattixError::InvalidArgument(format!(
                "diagonal factories need a 2-D shape, got {shape:?}"
            )));
        }
        let mut t = Self::zeros(shape);
        let n = shape[0].min(shape[1]);
        let strides = t.strides.clone();
        let data = t.storage.as_slice_mut();
        for i in 0..n {
            data[i * strides[0] + i * strides[1]] = value;
        }
        Ok(t)
    }

    /// Tensor counting from `start` by `step` in canonical (column-major)
    /// order.
    pub fn arange(start: T, step: T, shape: &[usize]) -> Self {
        let s = Shape::new(shape);
        let numel = s.numel();
        let mut data = Vec::with_capacity(numel);
        let mut v = start;
        for _ in 0..numel {
            data.push(v);
            v = v + step;
        }
        let strides = s.strides_for(Layout::ColMajor);
        Self {
            storage: Storage::from_vec(data),
            shape: s,
            strides,
            offset: 0,
        }
    }

    /// Tensor of uniform random draws from `[min, max)`.
    pub fn random(min: T, max: T, shape: &[usize]) -> Self
    where
        T: SampleUniform,
    {
        let s = Shape::new(shape);
        let numel = s.numel();
        let mut rng = rand::thread_rng();
        let data: Vec<T> = (0..numel).map(|_| rng.gen_range(min..max)).collect();
        let strides = s.strides_for(Layout::ColMajor);
        Self {
            storage: Storage::from_vec(data),
            shape: s,
            strides,
            offset: 0,
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Shape of the tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Strides in elements, one per axis.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Offset of the first element within the backing storage.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Memory space of the backing storage.
    pub fn device(&self) -> Device {
        self.storage.device()
    }

    /// Reference to the backing storage (for kernel dispatch).
    pub fn storage_ref(&self) -> &Storage<T> {
        &self.storage
    }

    /// Whether the tensor starts at offset zero with contiguous strides in
    /// either storage order.
    pub fn is_contiguous(&self) -> bool {
        self.offset == 0
            && (self.strides == self.shape.strides_for(Layout::ColMajor)
                || self.strides == self.shape.strides_for(Layout::RowMajor))
    }

    /// The storage order the strides correspond to, if contiguous in one.
    ///
    /// Rank ≤ 1 tensors report column-major (the two orders coincide).
    pub fn layout(&self) -> Option<Layout> {
        if self.strides == self.shape.strides_for(Layout::ColMajor) {
            Some(Layout::ColMajor)
        } else if self.strides == self.shape.strides_for(Layout::RowMajor) {
            Some(Layout::RowMajor)
        } else {
            None
        }
    }

    // =========================================================================
    // Element access
    // =========================================================================

    /// Flat offset of a multi-index within the backing storage.
    fn physical_index(&self, indices: &[usize]) -> usize {
        self.offset
            + indices
                .iter()
                .zip(self.strides.iter())
                .map(|(&i, &s)| i * s)
                .sum::<usize>()
    }

    /// Validate a multi-index against the shape.
    ///
    /// Compiled out entirely without the `checked` feature.
    #[cfg(feature = "checked")]
    fn check_bounds(&self, indices: &[usize]) -> Result<()> {
        let dims = self.shape.dims();
        if indices.len() != dims.len() || indices.iter().zip(dims).any(|(&i, &d)| i >= d) {
            return Err(LattixError::OutOfRange {
                indices: indices.to_vec(),
                shape: dims.to_vec(),
            });
        }
        Ok(())
    }

    #[cfg(not(feature = "checked"))]
    #[inline(always)]
    fn check_bounds(&self, _indices: &[usize]) -> Result<()> {
        Ok(())
    }

    /// Read an element by multi-index.
    pub fn get(&self, indices: &[usize]) -> Result<T> {
        self.check_bounds(indices)?;
        Ok(self.host_data()[self.physical_index(indices)])
    }

    /// Mutable reference to an element by multi-index (copy-on-write).
    pub fn get_mut(&mut self, indices: &[usize]) -> Result<&mut T> {
        self.check_bounds(indices)?;
        let phys = self.physical_index(indices);
        Ok(&mut self.storage.as_slice_mut()[phys])
    }

    /// Read an element by canonical (column-major) linear index.
    pub fn get_flat(&self, index: usize) -> Result<T> {
        #[cfg(feature = "checked")]
        if index >= self.numel() {
            return Err(LattixError::OutOfRange {
                indices: vec![index],
                shape: self.shape.dims().to_vec(),
            });
        }
        Ok(self.host_data()[self.flat_to_physical(index)])
    }

    /// Map a canonical linear index to a storage offset through the strides.
    fn flat_to_physical(&self, flat: usize) -> usize {
        let mut rem = flat;
        let mut phys = self.offset;
        for (d, &dim) in self.shape.dims().iter().enumerate() {
            let i = rem % dim;
            rem /= dim;
            phys += i * self.strides[d];
        }
        phys
    }

    /// Read-only host buffer (the whole backing allocation).
    ///
    /// Panics for device-resident tensors, as storage does.
    pub(crate) fn host_data(&self) -> &[T] {
        self.storage.as_slice()
    }

    pub(crate) fn storage_mut(&mut self) -> &mut Storage<T> {
        &mut self.storage
    }

    /// Storage offsets of every element in canonical order.
    pub(crate) fn physical_offsets(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.numel());
        for_each_index_in(self.shape.dims(), Layout::ColMajor, |idx| {
            out.push(self.physical_index(idx));
        });
        out
    }

    // =========================================================================
    // Views and shape operations
    // =========================================================================

    /// Assemble a tensor from pre-built parts (used by kernel dispatch).
    pub(crate) fn from_storage(
        storage: Storage<T>,
        shape: Shape,
        strides: SmallVec<[usize; 4]>,
        offset: usize,
    ) -> Self {
        Tensor {
            storage,
            shape,
            strides,
            offset,
        }
    }

    pub(crate) fn make_view(
        &self,
        shape: Shape,
        strides: SmallVec<[usize; 4]>,
        offset: usize,
    ) -> Tensor<T> {
        Tensor::from_storage(self.storage.clone(), shape, strides, offset)
    }

    /// A view of the whole tensor (shared storage, same metadata).
    pub fn view(&self) -> Tensor<T> {
        self.clone()
    }

    /// Subview tile at `start`, used by the subview iterator. Validation is
    /// the caller's job.
    pub(crate) fn tile_view(&self, tile: &[usize], start: &[usize]) -> Tensor<T> {
        let offset = self.physical_index(start);
        self.make_view(Shape::new(tile), self.strides.clone(), offset)
    }

    #[cfg(feature = "checked")]
    fn check_subview(&self, sub_shape: &[usize], start: &[usize], steps: &[usize]) -> Result<()> {
        let dims = self.shape.dims();
        if sub_shape.len() != dims.len() || start.len() != dims.len() || steps.len() != dims.len()
        {
            return Err(LattixError::OutOfRange {
                indices: start.to_vec(),
                shape: dims.to_vec(),
            });
        }
        for d in 0..dims.len() {
            // farthest index reached along this axis, accounting for the step
            let span = match sub_shape[d] {
                0 => 0,
                s => start[d] + (s - 1) * steps[d] + 1,
            };
            if span > dims[d] {
                return Err(LattixError::OutOfRange {
                    indices: start.to_vec(),
                    shape: dims.to_vec(),
                });
            }
        }
        Ok(())
    }

    #[cfg(not(feature = "checked"))]
    #[inline(always)]
    fn check_subview(&self, _s: &[usize], _o: &[usize], _t: &[usize]) -> Result<()> {
        Ok(())
    }

    /// View of a rectangular sub-region starting at `start`.
    pub fn subview(&self, sub_shape: &[usize], start: &[usize]) -> Result<Tensor<T>> {
        let steps: SmallVec<[usize; 4]> = smallvec![1; self.rank()];
        self.subview_strided(sub_shape, start, &steps)
    }

    /// Strided subview: element `i` along axis `d` maps to parent index
    /// `start[d] + i * steps[d]`.
    pub fn subview_strided(
        &self,
        sub_shape: &[usize],
        start: &[usize],
        steps: &[usize],
    ) -> Result<Tensor<T>> {
        self.check_subview(sub_shape, start, steps)?;
        let offset = self.physical_index(start);
        let strides: SmallVec<[usize; 4]> = self
            .strides
            .iter()
            .zip(steps.iter())
            .map(|(&s, &k)| s * k)
            .collect();
        Ok(self.make_view(Shape::new(sub_shape), strides, offset))
    }

    /// 1-D contiguous view over the same buffer.
    pub fn flatten(&self) -> Result<Tensor<T>> {
        #[cfg(feature = "checked")]
        if !self.is_contiguous() {
            return Err(LattixError::InvalidArgument(
                "flatten requires a contiguous tensor".into(),
            ));
        }
        Ok(self.make_view(
            Shape::new(&[self.numel()]),
            smallvec![1],
            self.offset,
        ))
    }

    /// View of the main diagonal of a 2-D tensor.
    pub fn diag_view(&self) -> Result<Tensor<T>> {
        let dims = self.shape.dims();
        if dims.len() != 2 {
            return Err(LattixError::InvalidArgument(format!(
                "diag_view needs a 2-D tensor, got rank {}",
                dims.len()
            )));
        }
        let n = dims[0].min(dims[1]);
        Ok(self.make_view(
            Shape::new(&[n]),
            smallvec![self.strides[0] + self.strides[1]],
            self.offset,
        ))
    }

    #[cfg(feature = "checked")]
    fn check_permutation(&self, perm: &[usize]) -> Result<()> {
        let rank = self.rank();
        if perm.len() < rank {
            return Err(LattixError::InvalidArgument(format!(
                "permutation of length {} cannot cover rank {}",
                perm.len(),
                rank
            )));
        }
        for (i, &p) in perm.iter().enumerate() {
            if p >= perm.len() {
                return Err(LattixError::InvalidArgument(format!(
                    "permutation entry {p} out of range for length {}",
                    perm.len()
                )));
            }
            if perm[..i].contains(&p) {
                return Err(LattixError::InvalidArgument(format!(
                    "permutation references axis {p} more than once"
                )));
            }
        }
        Ok(())
    }

    #[cfg(not(feature = "checked"))]
    #[inline(always)]
    fn check_permutation(&self, _perm: &[usize]) -> Result<()> {
        Ok(())
    }

    /// View with axes reordered: source axis `i` lands at position
    /// `perm[i]`.
    ///
    /// The permutation may be longer than the rank; result axes past the
    /// source rank get extent 1 and the source's last stride, which
    /// generalizes transposition to lower-rank tensors.
    pub fn permute(&self, perm: &[usize]) -> Result<Tensor<T>> {
        self.check_permutation(perm)?;
        let rank = self.rank();
        if rank == 0 {
            return Ok(self.view());
        }
        let last_stride = self.strides[rank - 1];
        let mut dims: SmallVec<[usize; 4]> = smallvec![1; perm.len()];
        let mut strides: SmallVec<[usize; 4]> = smallvec![last_stride; perm.len()];
        for (i, &p) in perm.iter().take(rank).enumerate() {
            dims[p] = self.shape.dims()[i];
            strides[p] = self.strides[i];
        }
        Ok(self.make_view(Shape::from(dims.to_vec()), strides, self.offset))
    }

    /// Axis-reversing view for 1-D and 2-D tensors.
    ///
    /// Higher ranks have no canonical transpose; pass an explicit
    /// permutation to [`Tensor::permute`] instead.
    pub fn transpose(&self) -> Result<Tensor<T>> {
        match self.rank() {
            1 | 2 => self.permute(&[1, 0]),
            r => Err(LattixError::InvalidArgument(format!(
                "transpose of a rank-{r} tensor needs an explicit permutation"
            ))),
        }
    }

    /// Re-shape this tensor in place, recomputing strides for `layout`.
    ///
    /// The element count must be preserved and the tensor must be
    /// contiguous; both conditions are validated under the `checked`
    /// feature and assumed otherwise.
    pub fn reshape(&mut self, new_shape: &[usize], layout: Layout) -> Result<()> {
        #[cfg(feature = "checked")]
        {
            let new_numel: usize = new_shape.iter().product();
            if new_numel != self.numel() {
                return Err(LattixError::ShapeMismatch {
                    expected: self.shape.dims().to_vec(),
                    got: new_shape.to_vec(),
                });
            }
            if !self.is_contiguous() {
                return Err(LattixError::InvalidArgument(
                    "reshape requires a contiguous tensor".into(),
                ));
            }
        }
        self.shape = Shape::new(new_shape);
        self.strides = self.shape.strides_for(layout);
        Ok(())
    }

    /// Reshaped view sharing this tensor's buffer (same validation as
    /// [`Tensor::reshape`]).
    pub fn reshaped(&self, new_shape: &[usize], layout: Layout) -> Result<Tensor<T>> {
        let mut view = self.view();
        view.reshape(new_shape, layout)?;
        Ok(view)
    }

    // =========================================================================
    // Copies and layout conversion
    // =========================================================================

    /// Owner copy of this tensor's values in `layout` order.
    ///
    /// Cheap (shared storage) when the tensor is already a full contiguous
    /// buffer in that order.
    pub fn to_layout(&self, layout: Layout) -> Tensor<T> {
        if self.layout() == Some(layout)
            && self.offset == 0
            && self.storage.numel() == self.numel()
        {
            return self.clone();
        }
        let data = self.to_vec(layout);
        let strides = self.shape.strides_for(layout);
        Tensor {
            storage: Storage::from_vec(data),
            shape: self.shape.clone(),
            strides,
            offset: 0,
        }
    }

    /// A contiguous tensor with these values: `self` if already contiguous,
    /// otherwise a column-major copy.
    pub fn contiguous(&self) -> Tensor<T> {
        if self.is_contiguous() && self.storage.numel() == self.numel() {
            self.clone()
        } else {
            self.to_layout(Layout::ColMajor)
        }
    }

    /// Collect every element into a `Vec` in `layout` order.
    pub fn to_vec(&self, layout: Layout) -> Vec<T> {
        if self.layout() == Some(layout)
            && self.offset == 0
            && self.storage.numel() == self.numel()
        {
            return self.host_data().to_vec();
        }
        let data = self.host_data();
        let mut out = Vec::with_capacity(self.numel());
        for_each_index_in(self.shape.dims(), layout, |idx| {
            out.push(data[self.physical_index(idx)]);
        });
        out
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Iterate every element in canonical (column-major) logical order.
    pub fn iter(&self) -> FlatIter<'_, T> {
        FlatIter::new(self)
    }

    /// Iterate subviews of shape `tile` that tile this tensor.
    ///
    /// Under the `checked` feature every extent must divide evenly by the
    /// tile's.
    pub fn subviews(&self, tile: &[usize]) -> Result<SubviewIter<'_, T>> {
        #[cfg(feature = "checked")]
        {
            let dims = self.shape.dims();
            if tile.len() != dims.len() {
                return Err(LattixError::InvalidArgument(format!(
                    "tile rank {} does not match tensor rank {}",
                    tile.len(),
                    dims.len()
                )));
            }
            for (d, (&extent, &t)) in dims.iter().zip(tile.iter()).enumerate() {
                if t == 0 || extent % t != 0 {
                    return Err(LattixError::InvalidArgument(format!(
                        "tile extent {t} does not divide axis {d} of extent {extent}"
                    )));
                }
            }
        }
        Ok(SubviewIter::new(self, tile))
    }

    /// Iterate the rows of a 2-D tensor as `[1, n]` views.
    pub fn rows(&self) -> Result<SubviewIter<'_, T>> {
        let (_, n) = self.matrix_dims()?;
        self.subviews(&[1, n])
    }

    /// Iterate the columns of a 2-D tensor as `[m, 1]` views.
    pub fn cols(&self) -> Result<SubviewIter<'_, T>> {
        let (m, _) = self.matrix_dims()?;
        self.subviews(&[m, 1])
    }

    /// View of row `i` of a 2-D tensor.
    pub fn row(&self, i: usize) -> Result<Tensor<T>> {
        let (_, n) = self.matrix_dims()?;
        self.subview(&[1, n], &[i, 0])
    }

    /// View of column `j` of a 2-D tensor.
    pub fn col(&self, j: usize) -> Result<Tensor<T>> {
        let (m, _) = self.matrix_dims()?;
        self.subview(&[m, 1], &[0, j])
    }

    /// The `(rows, cols)` of a 2-D tensor.
    pub fn matrix_dims(&self) -> Result<(usize, usize)> {
        let dims = self.shape.dims();
        if dims.len() != 2 {
            return Err(LattixError::InvalidArgument(format!(
                "expected a 2-D tensor, got rank {}",
                dims.len()
            )));
        }
        Ok((dims[0], dims[1]))
    }
}

/// Shape equality plus element-wise equality in canonical order. NaN
/// semantics come from the element type, so a tensor containing NaN is not
/// equal to itself.
impl<T: Scalar> PartialEq for Tensor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape.dims() == other.shape.dims()
            && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Scalar> fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(shape={}, device={}, contiguous={})",
            self.shape,
            self.device(),
            self.is_contiguous(),
        )
    }
}

impl<T: Scalar> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.device().is_host() {
            return write!(f, "tensor(shape={}, device={})", self.shape, self.device());
        }
        let vals: Vec<T> = self.iter().copied().collect();
        if vals.len() <= 20 {
            write!(f, "tensor({:?}, shape={})", vals, self.shape)
        } else {
            write!(
                f,
                "tensor([{:?}, {:?}, ..., {:?}], shape={})",
                vals[0],
                vals[1],
                vals[vals.len() - 1],
                self.shape
            )
        }
    }
}

#[cfg(feature = "cuda")]
mod cuda_transfer {
    use super::*;
    use cudarc::driver::{DeviceRepr, ValidAsZeroBits};

    impl<T: Scalar + DeviceRepr + ValidAsZeroBits + Unpin> Tensor<T> {
        /// Move this tensor to the given memory space. No-op if already
        /// there; device transfers go through a contiguous copy.
        pub fn to_device(&self, device: Device) -> Result<Tensor<T>> {
            match device {
                Device::Host => {
                    let storage = self.storage.to_host()?;
                    Ok(Tensor {
                        storage,
                        shape: self.shape.clone(),
                        strides: self.strides.clone(),
                        offset: self.offset,
                    })
                }
                Device::Cuda(idx) => {
                    if self.device() == Device::Cuda(idx) {
                        return Ok(self.clone());
                    }
                    let cont = self.contiguous();
                    let storage = cont.storage.to_cuda(idx)?;
                    Ok(Tensor {
                        storage,
                        shape: cont.shape.clone(),
                        strides: cont.strides.clone(),
                        offset: 0,
                    })
                }
            }
        }
    }
}
