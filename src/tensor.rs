//! # The tensor module
//!
//! This module provides the core data structure for representing
//! multi-dimensional arrays, and the checked versions of every operation the
//! fixture generators apply to them.
//!
//! Operations never mutate: each one validates its arguments, hands the work
//! to the [`SelectedBackend`] and wraps the result in a new [`Tensor`].

use core::fmt;

use ndarray::{ArrayD, ScalarOperand};
use num_traits::Float;

use crate::{
    backend::{Backend, SelectedBackend},
    error::{PatternError, TensorError},
    pattern::AxisPattern,
};

/// Creates a `Tensor` from nested arrays or vectors with a `vec!`-like syntax.
/// The data type of the tensor's elements is inferred from the literals.
///
/// # Examples
///
/// ```
/// use tensorref::tensor;
///
/// // A 1D Tensor
/// let v = tensor![1.0, 2.0, 3.0];
///
/// // A 2D Tensor
/// let m = tensor![[1.0, 2.0], [3.0, 4.0]];
///
/// // The macro also works with other numeric types like integers.
/// let i = tensor![1, 2, 3];
/// ```
#[macro_export]
macro_rules! tensor {
    ($($data:tt)+) => {
        $crate::tensor::Tensor::from(ndarray::array!($($data)+).into_dyn())
    };
}

/// Element types value tensors can hold.
///
/// Implemented for every floating point type the backend supports, which in
/// practice means `f32` and `f64`.
pub trait Element: Float + ScalarOperand + fmt::Debug + 'static {}

impl<T> Element for T where T: Float + ScalarOperand + fmt::Debug + 'static {}

/// A generic, multi-dimensional array holding elements of type `T`.
///
/// A `Tensor` represents a grid of elements with a specific shape. Unlike
/// statically-sized arrays, the number of dimensions (or rank) of a `Tensor`
/// is determined at runtime.
///
/// Value tensors hold an [`Element`]; index tensors hold `i64` and masks
/// hold `bool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tensor<T> {
    inner: ArrayD<T>,
}

/// Provides interoperability with the `ndarray` crate.
///
/// Enables a direct and efficient conversion from `ndarray`'s
/// dynamically-dimensioned array type into a `Tensor`.
impl<T> From<ArrayD<T>> for Tensor<T> {
    #[inline]
    fn from(value: ArrayD<T>) -> Self {
        Self { inner: value }
    }
}

impl<T> Tensor<T> {
    /// Borrows the underlying array.
    #[inline]
    #[must_use]
    pub const fn as_array(&self) -> &ArrayD<T> {
        &self.inner
    }

    /// Consumes the tensor, returning the underlying array.
    #[inline]
    #[must_use]
    pub fn into_array(self) -> ArrayD<T> {
        self.inner
    }

    /// Returns the number of dimensions.
    #[inline]
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.inner.ndim()
    }

    /// Returns the shape as a slice of axis lengths.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.inner.shape()
    }

    /// Returns the total number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the tensor holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> Tensor<T>
where
    T: Element,
{
    /// Creates a tensor from a flat row-major buffer.
    ///
    /// # Errors
    ///
    /// Fails when `data` does not hold exactly as many elements as `shape`.
    pub fn from_vec(
        data: Vec<T>,
        shape: &[usize],
    ) -> Result<Self, TensorError> {
        let expected = element_count(shape)?;
        if data.len() != expected {
            return Err(TensorError::ElementCount {
                shape: shape.to_vec(),
                expected,
                actual: data.len(),
            });
        }

        // SAFETY: The element count was checked against the shape above.
        Ok(Self::from(unsafe { SelectedBackend::<T>::from_vec(data, shape) }))
    }

    /// Creates a tensor of ones.
    ///
    /// # Errors
    ///
    /// Fails when the number of elements overflows `isize`.
    pub fn ones(shape: &[usize]) -> Result<Self, TensorError> {
        let _ = element_count(shape)?;

        // SAFETY: The shape was checked for overflow above.
        Ok(Self::from(unsafe { SelectedBackend::<T>::ones(shape) }))
    }

    /// Creates a tensor of zeros.
    ///
    /// # Errors
    ///
    /// Fails when the number of elements overflows `isize`.
    pub fn zeros(shape: &[usize]) -> Result<Self, TensorError> {
        let _ = element_count(shape)?;

        // SAFETY: The shape was checked for overflow above.
        Ok(Self::from(unsafe { SelectedBackend::<T>::zeros(shape) }))
    }

    /// Creates a tensor of zeros with the shape of `self`.
    #[must_use]
    pub fn zeros_like(&self) -> Self {
        // SAFETY: An existing tensor already has a valid shape.
        Self::from(unsafe { SelectedBackend::<T>::zeros(self.shape()) })
    }

    /// Elementwise absolute value.
    #[inline]
    #[must_use]
    pub fn abs(&self) -> Self {
        Self::from(SelectedBackend::<T>::abs(&self.inner))
    }

    /// Elementwise square root. Negative elements become NaN.
    #[inline]
    #[must_use]
    pub fn sqrt(&self) -> Self {
        Self::from(SelectedBackend::<T>::sqrt(&self.inner))
    }

    /// Indices of the first maximum along `axis`.
    ///
    /// # Errors
    ///
    /// Fails when `axis` is out of bounds or has length zero.
    pub fn argmax(
        &self,
        axis: usize,
        keepdim: bool,
    ) -> Result<Tensor<i64>, TensorError> {
        self.check_reduction_axis("argmax", axis)?;

        // SAFETY: The axis is in bounds and non-empty.
        Ok(Tensor::from(unsafe {
            SelectedBackend::<T>::argmax(&self.inner, axis, keepdim)
        }))
    }

    /// Maximal values along `axis` and their indices, with `axis` removed.
    ///
    /// # Errors
    ///
    /// Fails when `axis` is out of bounds or has length zero.
    pub fn max(&self, axis: usize) -> Result<(Self, Tensor<i64>), TensorError> {
        self.check_reduction_axis("max", axis)?;

        // SAFETY: The axis is in bounds and non-empty.
        let (values, indices) =
            unsafe { SelectedBackend::<T>::max(&self.inner, axis) };
        Ok((Self::from(values), Tensor::from(indices)))
    }

    /// Ascending sort along `axis`, returning values and source positions.
    ///
    /// # Errors
    ///
    /// Fails when `axis` is out of bounds.
    pub fn sort(
        &self,
        axis: usize,
    ) -> Result<(Self, Tensor<i64>), TensorError> {
        self.check_axis("sort", axis)?;

        // SAFETY: The axis is in bounds.
        let (values, indices) =
            unsafe { SelectedBackend::<T>::sort(&self.inner, axis) };
        Ok((Self::from(values), Tensor::from(indices)))
    }

    /// Gathers values along `axis` at the positions held by `index`.
    ///
    /// # Errors
    ///
    /// Fails when the ranks differ, `axis` is out of bounds, `index` is larger
    /// than `self` along another axis, or an index value is out of range.
    pub fn gather(
        &self,
        axis: usize,
        index: &Tensor<i64>,
    ) -> Result<Self, TensorError> {
        self.check_index("gather", axis, index)?;

        // SAFETY: Ranks, shapes and index values were validated above.
        Ok(Self::from(unsafe {
            SelectedBackend::<T>::gather(&self.inner, axis, &index.inner)
        }))
    }

    /// Returns a copy of `self` with `source` written along `axis` at the
    /// positions held by `index`.
    ///
    /// # Errors
    ///
    /// Fails for the same reasons as [`Tensor::gather`], and when `index`
    /// and `source` differ in shape.
    pub fn scatter(
        &self,
        axis: usize,
        index: &Tensor<i64>,
        source: &Self,
    ) -> Result<Self, TensorError> {
        self.check_index("scatter", axis, index)?;
        if index.shape() != source.shape() {
            return Err(TensorError::ShapeMismatch {
                expected: index.shape().to_vec(),
                actual: source.shape().to_vec(),
            });
        }

        // SAFETY: Ranks, shapes and index values were validated above.
        Ok(Self::from(unsafe {
            SelectedBackend::<T>::scatter(
                &self.inner,
                axis,
                &index.inner,
                &source.inner,
            )
        }))
    }

    /// Reshapes in row-major order. A single `-1` entry is inferred from the
    /// remaining lengths.
    ///
    /// # Errors
    ///
    /// Fails when the target holds a different number of elements, has more
    /// than one `-1`, or holds any other negative length.
    pub fn reshape(&self, shape: &[isize]) -> Result<Self, TensorError> {
        let resolved = self.resolve_shape(shape)?;

        // SAFETY: The resolved shape holds exactly `self.len()` elements.
        Ok(Self::from(unsafe {
            SelectedBackend::<T>::reshape(&self.inner, &resolved)
        }))
    }

    /// Swaps two axes.
    ///
    /// # Errors
    ///
    /// Fails when either axis is out of bounds.
    pub fn transpose(
        &self,
        first: usize,
        second: usize,
    ) -> Result<Self, TensorError> {
        self.check_axis("transpose", first)?;
        self.check_axis("transpose", second)?;

        let mut axes: Vec<usize> = (0..self.ndim()).collect();
        axes.swap(first, second);

        // SAFETY: Swapping two in-bounds entries keeps `axes` a permutation.
        Ok(Self::from(unsafe {
            SelectedBackend::<T>::permute(&self.inner, &axes)
        }))
    }

    /// Removes `axis` when its length is one. Squeezing an axis of any other
    /// length returns an unchanged copy.
    ///
    /// # Errors
    ///
    /// Fails when `axis` is out of bounds.
    pub fn squeeze(&self, axis: usize) -> Result<Self, TensorError> {
        self.check_axis("squeeze", axis)?;

        if self.shape()[axis] != 1 {
            return Ok(self.clone());
        }

        // SAFETY: The axis is in bounds and has length one.
        Ok(Self::from(unsafe {
            SelectedBackend::<T>::remove_axis(&self.inner, axis)
        }))
    }

    /// Inserts an axis of length one before position `axis`; `axis` may
    /// equal the rank to append.
    ///
    /// # Errors
    ///
    /// Fails when `axis` is greater than the rank.
    pub fn unsqueeze(&self, axis: usize) -> Result<Self, TensorError> {
        if axis > self.ndim() {
            return Err(TensorError::AxisOutOfBounds {
                axis,
                ndim: self.ndim() + 1,
            });
        }

        // SAFETY: The axis is at most the rank.
        Ok(Self::from(unsafe {
            SelectedBackend::<T>::insert_axis(&self.inner, axis)
        }))
    }

    /// Inserts a new axis at `axis` and repeats the tensor `size` times
    /// along it.
    ///
    /// # Errors
    ///
    /// Fails when `axis` is greater than the rank.
    pub fn expand(
        &self,
        axis: usize,
        size: usize,
    ) -> Result<Self, TensorError> {
        let unsqueezed = self.unsqueeze(axis)?;
        let mut target = unsqueezed.shape().to_vec();
        target[axis] = size;

        SelectedBackend::<T>::broadcast(&unsqueezed.inner, &target)
            .map(Self::from)
            .ok_or_else(|| TensorError::ShapeMismatch {
                expected: target,
                actual: unsqueezed.shape().to_vec(),
            })
    }

    /// Keeps `start..end` along `axis`.
    ///
    /// # Errors
    ///
    /// Fails when `axis` is out of bounds or the range does not fit in it.
    pub fn slice_axis(
        &self,
        axis: usize,
        start: usize,
        end: usize,
    ) -> Result<Self, TensorError> {
        self.check_axis("slice", axis)?;

        let len = self.shape()[axis];
        if start > end || end > len {
            return Err(TensorError::IndexOutOfBounds {
                index: i64::try_from(end).unwrap_or(i64::MAX),
                axis,
                len,
            });
        }

        // SAFETY: The axis is in bounds and the range fits inside it.
        Ok(Self::from(unsafe {
            SelectedBackend::<T>::slice_axis(&self.inner, axis, start, end)
        }))
    }

    /// Mask of the elements strictly greater than `threshold`.
    #[inline]
    #[must_use]
    pub fn greater_than(&self, threshold: T) -> Tensor<bool> {
        Tensor::from(SelectedBackend::<T>::greater_than(&self.inner, threshold))
    }

    /// Picks `on_true` where `mask` is set and `on_false` elsewhere.
    ///
    /// # Errors
    ///
    /// Fails when the three shapes differ.
    pub fn select(
        mask: &Tensor<bool>,
        on_true: &Self,
        on_false: &Self,
    ) -> Result<Self, TensorError> {
        for operand in [on_true.shape(), on_false.shape()] {
            if operand != mask.shape() {
                return Err(TensorError::ShapeMismatch {
                    expected: mask.shape().to_vec(),
                    actual: operand.to_vec(),
                });
            }
        }

        // SAFETY: All three shapes are equal.
        Ok(Self::from(unsafe {
            SelectedBackend::<T>::select(
                &mask.inner,
                &on_true.inner,
                &on_false.inner,
            )
        }))
    }

    /// Named-axis contraction of several operands, e.g.
    /// `"batch fields dim, batch dim -> batch fields"`.
    ///
    /// # Errors
    ///
    /// Fails when the pattern groups output axes or does not match the
    /// operands.
    pub fn einsum(
        pattern: &AxisPattern,
        operands: &[&Self],
    ) -> Result<Self, TensorError> {
        if pattern.has_groups() {
            let pattern = pattern.as_str().to_owned();
            return Err(PatternError::UnsupportedGroup(pattern).into());
        }

        let shapes: Vec<&[usize]> =
            operands.iter().map(|tensor| tensor.shape()).collect();
        let contraction = pattern.bind(&shapes)?;
        let arrays: Vec<&ArrayD<T>> =
            operands.iter().map(|tensor| &tensor.inner).collect();

        // SAFETY: The contraction was bound to exactly these operands.
        Ok(Self::from(unsafe {
            SelectedBackend::<T>::contract(&arrays, &contraction)
        }))
    }

    /// Sums over every input axis the pattern leaves out of its output, e.g.
    /// `"batch field dim -> batch field"`.
    ///
    /// # Errors
    ///
    /// Fails when the pattern has more than one operand, groups output axes,
    /// or does not match the tensor.
    pub fn reduce_sum(
        &self,
        pattern: &AxisPattern,
    ) -> Result<Self, TensorError> {
        Self::einsum(pattern, &[self])
    }

    /// Permutes axes and merges output groups, e.g.
    /// `"batch mems flag -> mems (batch flag)"`.
    ///
    /// # Errors
    ///
    /// Fails when the pattern drops an axis, has more than one operand, or
    /// does not match the tensor.
    pub fn rearrange(
        &self,
        pattern: &AxisPattern,
    ) -> Result<Self, TensorError> {
        if let Some(&dropped) = pattern.summed_axes().first() {
            return Err(PatternError::DroppedAxis(dropped.to_owned()).into());
        }

        let contraction = pattern.bind(&[self.shape()])?;
        let labels = &contraction.operands[0];
        let axes: Vec<usize> = contraction
            .output
            .iter()
            .filter_map(|label| labels.iter().position(|own| own == label))
            .collect();

        // SAFETY: Every input label appears exactly once in the output, so
        // `axes` is a permutation of the input axes.
        let permuted =
            unsafe { SelectedBackend::<T>::permute(&self.inner, &axes) };
        // SAFETY: Merging adjacent axes preserves the element count.
        Ok(Self::from(unsafe {
            SelectedBackend::<T>::reshape(
                &permuted,
                &contraction.grouped_shape(),
            )
        }))
    }

    fn check_axis(
        &self,
        operation: &'static str,
        axis: usize,
    ) -> Result<(), TensorError> {
        if self.ndim() == 0 {
            return Err(TensorError::EmptyShape { operation });
        }
        if axis >= self.ndim() {
            return Err(TensorError::AxisOutOfBounds {
                axis,
                ndim: self.ndim(),
            });
        }
        Ok(())
    }

    fn check_reduction_axis(
        &self,
        operation: &'static str,
        axis: usize,
    ) -> Result<(), TensorError> {
        self.check_axis(operation, axis)?;
        if self.shape()[axis] == 0 {
            return Err(TensorError::ZeroLengthAxis {
                axis,
                shape: self.shape().to_vec(),
            });
        }
        Ok(())
    }

    fn check_index(
        &self,
        operation: &'static str,
        axis: usize,
        index: &Tensor<i64>,
    ) -> Result<(), TensorError> {
        self.check_axis(operation, axis)?;

        let fits = index.ndim() == self.ndim()
            && index
                .shape()
                .iter()
                .zip(self.shape())
                .enumerate()
                .all(|(k, (&wanted, &have))| k == axis || wanted <= have);
        if !fits {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape().to_vec(),
                actual: index.shape().to_vec(),
            });
        }

        let len = self.shape()[axis];
        if let Some(&bad) = index
            .inner
            .iter()
            .find(|&&at| usize::try_from(at).map_or(true, |at| at >= len))
        {
            return Err(TensorError::IndexOutOfBounds {
                index: bad,
                axis,
                len,
            });
        }
        Ok(())
    }

    fn resolve_shape(
        &self,
        shape: &[isize],
    ) -> Result<Vec<usize>, TensorError> {
        let incompatible = || TensorError::IncompatibleReshape {
            from: self.shape().to_vec(),
            to: shape.to_vec(),
        };

        let mut inferred = None;
        let mut resolved = Vec::with_capacity(shape.len());
        for (axis, &len) in shape.iter().enumerate() {
            match usize::try_from(len) {
                Ok(len) => resolved.push(len),
                Err(_) if len == -1 && inferred.is_none() => {
                    inferred = Some(axis);
                    resolved.push(1);
                }
                Err(_) => return Err(incompatible()),
            }
        }

        let known = element_count(&resolved)?;
        if let Some(axis) = inferred {
            if known == 0 || self.len() % known != 0 {
                return Err(incompatible());
            }
            resolved[axis] = self.len() / known;
        } else if known != self.len() {
            return Err(incompatible());
        }

        Ok(resolved)
    }
}

/// Number of elements of `shape`, rejecting shapes larger than `isize::MAX`.
pub(crate) fn element_count(shape: &[usize]) -> Result<usize, TensorError> {
    shape
        .iter()
        .try_fold(1_usize, |acc, &len| acc.checked_mul(len))
        .filter(|&count| isize::try_from(count).is_ok())
        .ok_or_else(|| TensorError::ShapeOverflow {
            shape: shape.to_vec(),
        })
}

#[cfg(test)]
mod tests {
    use crate::{
        error::{PatternError, TensorError},
        pattern::AxisPattern,
        tensor::Tensor,
    };

    #[test]
    fn test_tensor_macro_1d() {
        let tensor = tensor![1.0, 2.0];
        let expected = Tensor::from(ndarray::arr1(&[1.0, 2.0]).into_dyn());

        assert_eq!(tensor, expected)
    }

    #[test]
    fn test_tensor_macro_2d() {
        let tensor = tensor![[1.0, 2.0], [3.0, 4.0]];
        let expected =
            Tensor::from(ndarray::arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn());

        assert_eq!(tensor, expected)
    }

    #[test]
    fn test_tensor_macro_3d() {
        let tensor =
            tensor![[[1.0, 2.0], [3.0, 4.0]], [[5.0, 6.0], [7.0, 8.0]]];
        let expected = Tensor::from(
            ndarray::arr3(&[
                [[1.0, 2.0], [3.0, 4.0]],
                [[5.0, 6.0], [7.0, 8.0]],
            ])
            .into_dyn(),
        );

        assert_eq!(tensor, expected)
    }

    #[test]
    fn from_vec_rejects_wrong_element_count() {
        let result = Tensor::<f32>::from_vec(vec![1.0, 2.0, 3.0], &[2, 2]);

        assert_eq!(
            result,
            Err(TensorError::ElementCount {
                shape: vec![2, 2],
                expected: 4,
                actual: 3,
            })
        );
    }

    #[test]
    fn ones_fills_every_element() {
        let ones = Tensor::<f32>::ones(&[2, 3]).unwrap();

        assert_eq!(ones.shape(), &[2, 3]);
        assert!(ones.as_array().iter().all(|&value| value == 1.0));
    }

    #[test]
    fn zeros_rejects_overflowing_shape() {
        let result = Tensor::<f32>::zeros(&[usize::MAX, 2]);

        assert!(matches!(result, Err(TensorError::ShapeOverflow { .. })));
    }

    #[test]
    fn argmax_keepdim_keeps_axis() {
        let x: Tensor<f32> = tensor![[1.0, 5.0], [9.0, 3.0]];

        let reduced = x.argmax(1, false).unwrap();
        let kept = x.argmax(1, true).unwrap();

        assert_eq!(reduced, tensor![1_i64, 0]);
        assert_eq!(kept, tensor![[1_i64], [0]]);
    }

    #[test]
    fn argmax_rejects_scalar() {
        let x = Tensor::from(ndarray::arr0(1.0_f32).into_dyn());

        assert_eq!(
            x.argmax(0, false),
            Err(TensorError::EmptyShape { operation: "argmax" })
        );
    }

    #[test]
    fn argmax_rejects_axis_out_of_bounds() {
        let x: Tensor<f32> = tensor![[1.0, 5.0], [9.0, 3.0]];

        assert_eq!(
            x.argmax(2, true),
            Err(TensorError::AxisOutOfBounds { axis: 2, ndim: 2 })
        );
    }

    #[test]
    fn gather_rejects_out_of_range_index() {
        let x: Tensor<f32> = tensor![[1.0, 5.0], [9.0, 3.0]];
        let index = tensor![[2_i64], [0]];

        assert_eq!(
            x.gather(1, &index),
            Err(TensorError::IndexOutOfBounds {
                index: 2,
                axis: 1,
                len: 2,
            })
        );
    }

    #[test]
    fn gather_rejects_negative_index() {
        let x: Tensor<f32> = tensor![[1.0, 5.0], [9.0, 3.0]];
        let index = tensor![[-1_i64], [0]];

        assert!(matches!(
            x.gather(1, &index),
            Err(TensorError::IndexOutOfBounds { index: -1, .. })
        ));
    }

    #[test]
    fn scatter_places_values_at_indices() {
        let x: Tensor<f32> = tensor![[1.0, 5.0], [9.0, 3.0]];
        let index = x.argmax(1, true).unwrap();
        let gathered = x.gather(1, &index).unwrap();

        let scattered = x.zeros_like().scatter(1, &index, &gathered).unwrap();

        assert_eq!(scattered, tensor![[0.0, 5.0], [9.0, 0.0]]);
    }

    #[test]
    fn reshape_infers_one_axis() {
        let x = Tensor::<f32>::zeros(&[3, 8, 10]).unwrap();

        let reshaped = x.reshape(&[3, 1, -1]).unwrap();

        assert_eq!(reshaped.shape(), &[3, 1, 80]);
    }

    #[test]
    fn reshape_rejects_two_inferred_axes() {
        let x = Tensor::<f32>::zeros(&[4, 6]).unwrap();

        assert!(matches!(
            x.reshape(&[-1, -1]),
            Err(TensorError::IncompatibleReshape { .. })
        ));
    }

    #[test]
    fn reshape_rejects_wrong_element_count() {
        let x = Tensor::<f32>::zeros(&[4, 6]).unwrap();

        assert!(matches!(
            x.reshape(&[5, 5]),
            Err(TensorError::IncompatibleReshape { .. })
        ));
        assert!(matches!(
            x.reshape(&[5, -1]),
            Err(TensorError::IncompatibleReshape { .. })
        ));
    }

    #[test]
    fn transpose_swaps_axes() {
        let x: Tensor<f32> = tensor![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];

        let transposed = x.transpose(0, 1).unwrap();

        assert_eq!(transposed, tensor![[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]]);
    }

    #[test]
    fn squeeze_removes_unit_axis_only() {
        let x = Tensor::<f32>::zeros(&[1, 3]).unwrap();

        assert_eq!(x.squeeze(0).unwrap().shape(), &[3]);
        assert_eq!(x.squeeze(1).unwrap().shape(), &[1, 3]);
    }

    #[test]
    fn unsqueeze_accepts_rank_as_position() {
        let x = Tensor::<f32>::zeros(&[2, 3]).unwrap();

        assert_eq!(x.unsqueeze(2).unwrap().shape(), &[2, 3, 1]);
        assert_eq!(
            x.unsqueeze(3),
            Err(TensorError::AxisOutOfBounds { axis: 3, ndim: 3 })
        );
    }

    #[test]
    fn expand_repeats_along_new_axis() {
        let x: Tensor<f32> = tensor![1.0, 2.0];

        let expanded = x.expand(1, 3).unwrap();

        assert_eq!(expanded, tensor![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]);
    }

    #[test]
    fn slice_axis_rejects_range_past_end() {
        let x = Tensor::<f32>::zeros(&[2, 3]).unwrap();

        assert!(x.slice_axis(1, 0, 3).is_ok());
        assert!(matches!(
            x.slice_axis(1, 2, 4),
            Err(TensorError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn select_rejects_mismatched_shapes() {
        let x = Tensor::<f32>::zeros(&[2, 3]).unwrap();
        let y = Tensor::<f32>::zeros(&[3, 2]).unwrap();
        let mask = x.greater_than(0.5);

        assert!(matches!(
            Tensor::select(&mask, &x, &y),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn einsum_rejects_grouped_output() {
        let x = Tensor::<f32>::zeros(&[2, 3]).unwrap();
        let pattern: AxisPattern = "a b -> (a b)".parse().unwrap();

        assert!(matches!(
            Tensor::einsum(&pattern, &[&x]),
            Err(TensorError::Pattern(PatternError::UnsupportedGroup(_)))
        ));
    }

    #[test]
    fn rearrange_merges_groups() {
        let x = Tensor::<f32>::from_vec(
            (0..24).map(|value| value as f32).collect(),
            &[2, 3, 4],
        )
        .unwrap();
        let pattern: AxisPattern =
            "batch mems flag -> mems (batch flag)".parse().unwrap();

        let rearranged = x.rearrange(&pattern).unwrap();

        assert_eq!(rearranged.shape(), &[3, 8]);
        // mems = 1, batch = 1, flag = 2 lands at column 1 * 4 + 2.
        assert_eq!(rearranged.as_array()[[1, 6]], x.as_array()[[1, 1, 2]]);
    }

    #[test]
    fn rearrange_rejects_dropped_axis() {
        let x = Tensor::<f32>::zeros(&[2, 3, 4]).unwrap();
        let pattern: AxisPattern =
            "batch mems flag -> mems flag".parse().unwrap();

        assert_eq!(
            x.rearrange(&pattern),
            Err(TensorError::Pattern(PatternError::DroppedAxis(
                "batch".to_owned()
            )))
        );
    }
}
