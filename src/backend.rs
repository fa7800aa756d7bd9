//! The generic computational backend.
//!
//! This module provides the [`Backend`] trait which defines the complete
//! contract of the numerical library the fixtures are computed with: tensor
//! creation, elementwise math, axis reductions, indexing, shape manipulation
//! and named-axis contractions.
//!
//! The default backend is [`ndarray`] and can be swapped out using crate
//! feature flags.

pub mod ndarray;

use crate::pattern::Contraction;

/// A trait that defines the contract for tensor operations that every
/// backend must fulfill.
///
/// The fixture generators never compute anything themselves: every value
/// written to disk is produced by one of the functions below. All functions
/// are pure and return new tensors.
///
/// Some methods in this trait are marked `unsafe` because they do not perform
/// any invariant checks (e.g., for axis bounds or shape compatibility) and
/// may panic or produce meaningless output when misused. The caller
/// (typically the [`Tensor`](crate::tensor::Tensor) wrapper) is responsible
/// for ensuring all preconditions are met before calling these functions.
pub trait Backend {
    /// The scalar type stored in value tensors.
    type Primitive;
    /// The concrete tensor representation provided by the backend.
    type Tensor;
    /// Tensor of `i64` positions, as produced by argmax, max and sort.
    type Indices;
    /// Tensor of booleans, as produced by comparisons.
    type Mask;

    /// Returns the absolute value of every element.
    fn abs(tensor: &Self::Tensor) -> Self::Tensor;

    /// Returns the indices of the first maximal element along `axis`.
    ///
    /// With `keepdim` the reduced axis is kept with length one, otherwise it
    /// is removed.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `axis` is in bounds and that the axis has
    /// a non-zero length.
    unsafe fn argmax(
        tensor: &Self::Tensor,
        axis: usize,
        keepdim: bool,
    ) -> Self::Indices;

    /// Broadcasts the tensor to `shape`, returning `None` when the shapes are
    /// not broadcast-compatible.
    fn broadcast(
        tensor: &Self::Tensor,
        shape: &[usize],
    ) -> Option<Self::Tensor>;

    /// Evaluates a named-axis contraction: every output element is the sum,
    /// over all summed labels, of the product of the operands.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `contraction` was bound to the shapes of
    /// exactly these operands, in this order.
    unsafe fn contract(
        operands: &[&Self::Tensor],
        contraction: &Contraction,
    ) -> Self::Tensor;

    /// Creates a tensor from a flat row-major buffer.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the length of `data` equals the product
    /// of `shape`.
    unsafe fn from_vec(
        data: Vec<Self::Primitive>,
        shape: &[usize],
    ) -> Self::Tensor;

    /// Gathers values along `axis`: the output has the shape of `index` and
    /// takes, at every position, the input element whose coordinate along
    /// `axis` is replaced by the index value.
    ///
    /// # Safety
    ///
    /// The caller must ensure that both tensors have the same rank, that
    /// `axis` is in bounds, that `index` is no larger than `tensor` along
    /// every other axis, and that every index value is a valid position
    /// along `axis`.
    unsafe fn gather(
        tensor: &Self::Tensor,
        axis: usize,
        index: &Self::Indices,
    ) -> Self::Tensor;

    /// Returns a mask that is `true` where the element is strictly greater
    /// than `threshold`.
    fn greater_than(
        tensor: &Self::Tensor,
        threshold: Self::Primitive,
    ) -> Self::Mask;

    /// Inserts a new axis of length one at `axis`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `axis` is not greater than the rank.
    unsafe fn insert_axis(tensor: &Self::Tensor, axis: usize) -> Self::Tensor;

    /// Returns the maximal values along `axis` together with their indices.
    /// The reduced axis is removed.
    ///
    /// # Safety
    ///
    /// See the safety notes for [`Backend::argmax()`].
    unsafe fn max(
        tensor: &Self::Tensor,
        axis: usize,
    ) -> (Self::Tensor, Self::Indices);

    /// Creates a tensor with all elements set to one, with the given shape.
    ///
    /// # Safety
    ///
    /// See the safety notes for [`Backend::zeros()`].
    unsafe fn ones(shape: &[usize]) -> Self::Tensor;

    /// Reorders the axes so that output axis `i` is input axis `axes[i]`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `axes` is a permutation of `0..rank`.
    unsafe fn permute(tensor: &Self::Tensor, axes: &[usize]) -> Self::Tensor;

    /// Removes `axis`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `axis` is in bounds and has length one.
    unsafe fn remove_axis(tensor: &Self::Tensor, axis: usize) -> Self::Tensor;

    /// Reinterprets the elements, in row-major order, with a new shape.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `shape` holds the same number of elements
    /// as the tensor.
    unsafe fn reshape(tensor: &Self::Tensor, shape: &[usize]) -> Self::Tensor;

    /// Writes `source` into a copy of `tensor` along `axis`: the element of
    /// `source` at a position goes to that position with its coordinate
    /// along `axis` replaced by the index value.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `index` and `source` have the same shape
    /// and, together with `tensor` and `axis`, meet the preconditions of
    /// [`Backend::gather()`].
    unsafe fn scatter(
        tensor: &Self::Tensor,
        axis: usize,
        index: &Self::Indices,
        source: &Self::Tensor,
    ) -> Self::Tensor;

    /// Picks `on_true` where the mask is set and `on_false` elsewhere.
    ///
    /// # Safety
    ///
    /// The caller must ensure that all three tensors have the same shape.
    unsafe fn select(
        mask: &Self::Mask,
        on_true: &Self::Tensor,
        on_false: &Self::Tensor,
    ) -> Self::Tensor;

    /// Keeps the half-open range `start..end` of `axis` and every element of
    /// the other axes.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `axis` is in bounds and that
    /// `start <= end <= len(axis)`.
    unsafe fn slice_axis(
        tensor: &Self::Tensor,
        axis: usize,
        start: usize,
        end: usize,
    ) -> Self::Tensor;

    /// Sorts every lane along `axis` in ascending order, returning the sorted
    /// values and the original position of every value. Equal elements keep
    /// their relative order and NaNs sort last.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `axis` is in bounds.
    unsafe fn sort(
        tensor: &Self::Tensor,
        axis: usize,
    ) -> (Self::Tensor, Self::Indices);

    /// Returns the square root of every element.
    fn sqrt(tensor: &Self::Tensor) -> Self::Tensor;

    /// Creates a tensor with all elements set to zero, with the given shape.
    ///
    /// # Safety
    ///
    /// The caller must ensure that no dimensions overflow `isize`, and the
    /// product of axis lengths does not overflow [`isize::MAX`].
    unsafe fn zeros(shape: &[usize]) -> Self::Tensor;
}

cfg_if::cfg_if! {
    if #[cfg(feature = "ndarray-backend")] {
        /// Dynamically configured type alias for the selected backend, based
        /// on crate feature flags.
        pub type SelectedBackend<T> = ndarray::NdarrayBackend<T>;
    } else {
        compile_error!(
            "A backend feature must be enabled. Available: `ndarray-backend`"
        );
    }
}
