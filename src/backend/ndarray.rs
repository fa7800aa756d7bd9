//! [`ndarray`] crate backend.

use core::{cmp::Ordering, marker::PhantomData};

use ndarray::{
    ArrayD, ArrayView1, Axis, Dimension as _, IxDyn, ScalarOperand, Slice, Zip,
};
use num_traits::Float;

use crate::{backend::Backend, pattern::Contraction};

/// Marker type for the [`ndarray`] backend.
#[derive(Debug)]
pub struct NdarrayBackend<T>
where
    T: Clone,
{
    _marker: PhantomData<T>,
}

impl<T> Backend for NdarrayBackend<T>
where
    T: Float + ScalarOperand,
{
    type Primitive = T;
    type Tensor = ArrayD<T>;
    type Indices = ArrayD<i64>;
    type Mask = ArrayD<bool>;

    #[inline]
    fn abs(tensor: &Self::Tensor) -> Self::Tensor {
        tensor.mapv(T::abs)
    }

    #[inline]
    unsafe fn argmax(
        tensor: &Self::Tensor,
        axis: usize,
        keepdim: bool,
    ) -> Self::Indices {
        let reduced =
            tensor.map_axis(Axis(axis), |lane| to_index(lane_max(lane).0));

        if keepdim {
            reduced.insert_axis(Axis(axis))
        } else {
            reduced
        }
    }

    #[inline]
    fn broadcast(
        tensor: &Self::Tensor,
        shape: &[usize],
    ) -> Option<Self::Tensor> {
        tensor.broadcast(IxDyn(shape)).map(|view| view.to_owned())
    }

    unsafe fn contract(
        operands: &[&Self::Tensor],
        contraction: &Contraction,
    ) -> Self::Tensor {
        let summed = contraction.summed_labels();
        let summed_shape: Vec<usize> = summed
            .iter()
            .map(|&label| contraction.sizes[label])
            .collect();

        let mut assignment = vec![0; contraction.sizes.len()];
        let mut coords: Vec<Vec<usize>> = contraction
            .operands
            .iter()
            .map(|labels| vec![0; labels.len()])
            .collect();

        ArrayD::from_shape_fn(IxDyn(&contraction.output_shape()), |position| {
            for (axis, &label) in contraction.output.iter().enumerate() {
                assignment[label] = position[axis];
            }

            let mut acc = T::zero();
            for inner in ndarray::indices(IxDyn(&summed_shape)) {
                for (axis, &label) in summed.iter().enumerate() {
                    assignment[label] = inner[axis];
                }

                let mut product = T::one();
                for ((operand, labels), coord) in operands
                    .iter()
                    .zip(&contraction.operands)
                    .zip(coords.iter_mut())
                {
                    for (slot, &label) in coord.iter_mut().zip(labels) {
                        *slot = assignment[label];
                    }
                    product = product * operand[coord.as_slice()];
                }
                acc = acc + product;
            }
            acc
        })
    }

    #[inline]
    unsafe fn from_vec(
        data: Vec<Self::Primitive>,
        shape: &[usize],
    ) -> Self::Tensor {
        // SAFETY: The caller has already guaranteed that the shape is valid
        // and the element count in `data` matches the shape's requirements.
        unsafe { ArrayD::from_shape_vec_unchecked(IxDyn(shape), data) }
    }

    unsafe fn gather(
        tensor: &Self::Tensor,
        axis: usize,
        index: &Self::Indices,
    ) -> Self::Tensor {
        let mut output: ArrayD<T> = ArrayD::zeros(index.raw_dim());
        let mut source = vec![0; tensor.ndim()];

        for (position, &at) in index.indexed_iter() {
            source.copy_from_slice(position.slice());
            source[axis] = from_index(at);
            output[position.slice()] = tensor[source.as_slice()];
        }

        output
    }

    #[inline]
    fn greater_than(
        tensor: &Self::Tensor,
        threshold: Self::Primitive,
    ) -> Self::Mask {
        tensor.mapv(|value| value > threshold)
    }

    #[inline]
    unsafe fn insert_axis(tensor: &Self::Tensor, axis: usize) -> Self::Tensor {
        tensor.view().insert_axis(Axis(axis)).to_owned()
    }

    unsafe fn max(
        tensor: &Self::Tensor,
        axis: usize,
    ) -> (Self::Tensor, Self::Indices) {
        let values = tensor.map_axis(Axis(axis), |lane| lane_max(lane).1);
        let indices =
            tensor.map_axis(Axis(axis), |lane| to_index(lane_max(lane).0));

        (values, indices)
    }

    #[inline]
    unsafe fn ones(shape: &[usize]) -> Self::Tensor {
        ArrayD::ones(IxDyn(shape))
    }

    #[inline]
    unsafe fn permute(tensor: &Self::Tensor, axes: &[usize]) -> Self::Tensor {
        tensor
            .view()
            .permuted_axes(IxDyn(axes))
            .as_standard_layout()
            .into_owned()
    }

    #[inline]
    unsafe fn remove_axis(tensor: &Self::Tensor, axis: usize) -> Self::Tensor {
        tensor.view().remove_axis(Axis(axis)).to_owned()
    }

    #[inline]
    unsafe fn reshape(tensor: &Self::Tensor, shape: &[usize]) -> Self::Tensor {
        let data = tensor.iter().copied().collect();

        // SAFETY: The caller guarantees that `shape` holds as many elements
        // as the tensor, and `iter` visits them in row-major order.
        unsafe { ArrayD::from_shape_vec_unchecked(IxDyn(shape), data) }
    }

    unsafe fn scatter(
        tensor: &Self::Tensor,
        axis: usize,
        index: &Self::Indices,
        source: &Self::Tensor,
    ) -> Self::Tensor {
        let mut output = tensor.as_standard_layout().into_owned();
        let mut target = vec![0; tensor.ndim()];

        for (position, &at) in index.indexed_iter() {
            target.copy_from_slice(position.slice());
            target[axis] = from_index(at);
            output[target.as_slice()] = source[position.slice()];
        }

        output
    }

    #[inline]
    unsafe fn select(
        mask: &Self::Mask,
        on_true: &Self::Tensor,
        on_false: &Self::Tensor,
    ) -> Self::Tensor {
        Zip::from(mask)
            .and(on_true)
            .and(on_false)
            .map_collect(|&keep, &yes, &no| if keep { yes } else { no })
    }

    #[inline]
    unsafe fn slice_axis(
        tensor: &Self::Tensor,
        axis: usize,
        start: usize,
        end: usize,
    ) -> Self::Tensor {
        tensor
            .slice_axis(Axis(axis), Slice::from(start..end))
            .to_owned()
    }

    unsafe fn sort(
        tensor: &Self::Tensor,
        axis: usize,
    ) -> (Self::Tensor, Self::Indices) {
        let mut values: ArrayD<T> = ArrayD::zeros(tensor.raw_dim());
        let mut indices: ArrayD<i64> = ArrayD::zeros(tensor.raw_dim());
        let mut order: Vec<usize> =
            Vec::with_capacity(tensor.len_of(Axis(axis)));

        Zip::from(tensor.lanes(Axis(axis)))
            .and(values.lanes_mut(Axis(axis)))
            .and(indices.lanes_mut(Axis(axis)))
            .for_each(|lane, mut sorted, mut positions| {
                order.clear();
                order.extend(0..lane.len());
                order.sort_by(|&a, &b| ascending(lane[a], lane[b]));

                for (slot, &from) in order.iter().enumerate() {
                    sorted[slot] = lane[from];
                    positions[slot] = to_index(from);
                }
            });

        (values, indices)
    }

    #[inline]
    fn sqrt(tensor: &Self::Tensor) -> Self::Tensor {
        tensor.mapv(T::sqrt)
    }

    #[inline]
    unsafe fn zeros(shape: &[usize]) -> Self::Tensor {
        ArrayD::zeros(IxDyn(shape))
    }
}

/// Position and value of the first maximum of a lane. A NaN wins over any
/// number, matching the propagation rules of the reference library.
fn lane_max<T: Float>(lane: ArrayView1<'_, T>) -> (usize, T) {
    let mut best = (0, lane[0]);
    for (position, &value) in lane.iter().enumerate().skip(1) {
        if best.1.is_nan() {
            break;
        }
        if value > best.1 || value.is_nan() {
            best = (position, value);
        }
    }
    best
}

fn ascending<T: Float>(a: T, b: T) -> Ordering {
    a.partial_cmp(&b)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

#[allow(clippy::cast_possible_wrap, reason = "axis lengths fit in isize")]
const fn to_index(position: usize) -> i64 {
    position as i64
}

#[allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    reason = "index values are validated by the tensor wrapper"
)]
const fn from_index(index: i64) -> usize {
    index as usize
}

#[cfg(test)]
mod tests {
    use ndarray::{ArrayD, IxDyn, arr2};

    use crate::{
        backend::{Backend, ndarray::NdarrayBackend},
        pattern::AxisPattern,
    };

    fn matrix(rows: [[f32; 3]; 2]) -> ArrayD<f32> {
        arr2(&rows).into_dyn()
    }

    #[test]
    fn ndarray_zeros_has_correct_shape() {
        let shape = &[2, 3];
        let array = unsafe { NdarrayBackend::<f32>::zeros(shape) };

        assert_eq!(array.shape(), shape);
    }

    #[test]
    fn ndarray_zeros_has_correct_values() {
        let array = unsafe { NdarrayBackend::<f32>::zeros(&[2, 3]) };

        assert!(array.iter().all(|&value| value == 0.0));
    }

    #[test]
    fn ndarray_ones_has_correct_values() {
        let array = unsafe { NdarrayBackend::<f32>::ones(&[2, 3]) };

        assert_eq!(array.shape(), &[2, 3]);
        assert!(array.iter().all(|&value| value == 1.0));
    }

    #[test]
    fn ndarray_from_vec_is_correct() {
        let shape = &[2, 3];
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let data_clone = data.clone();
        let array = unsafe { NdarrayBackend::<f32>::from_vec(data, shape) };

        assert_eq!(array.shape(), shape);
        assert_eq!(array.into_raw_vec_and_offset().0, data_clone);
    }

    #[test]
    fn ndarray_abs_and_sqrt_are_elementwise() {
        let array = matrix([[-1.0, 4.0, -9.0], [0.0, -0.25, 16.0]]);

        let absolute = NdarrayBackend::abs(&array);
        let roots = NdarrayBackend::sqrt(&absolute);

        assert_eq!(absolute, matrix([[1.0, 4.0, 9.0], [0.0, 0.25, 16.0]]));
        assert_eq!(roots, matrix([[1.0, 2.0, 3.0], [0.0, 0.5, 4.0]]));
    }

    #[test]
    fn ndarray_argmax_picks_first_maximum() {
        let array = matrix([[1.0, 7.0, 7.0], [9.0, 2.0, 9.0]]);

        let rows = unsafe { NdarrayBackend::argmax(&array, 1, false) };
        let kept = unsafe { NdarrayBackend::argmax(&array, 1, true) };
        let columns = unsafe { NdarrayBackend::argmax(&array, 0, false) };

        assert_eq!(rows, ndarray::arr1(&[1_i64, 0]).into_dyn());
        assert_eq!(kept, arr2(&[[1_i64], [0]]).into_dyn());
        assert_eq!(columns, ndarray::arr1(&[1_i64, 0, 1]).into_dyn());
    }

    #[test]
    fn ndarray_argmax_prefers_nan() {
        let array = matrix([[1.0, f32::NAN, 3.0], [0.0, 0.0, 0.0]]);

        let rows = unsafe { NdarrayBackend::argmax(&array, 1, false) };

        assert_eq!(rows, ndarray::arr1(&[1_i64, 0]).into_dyn());
    }

    #[test]
    fn ndarray_max_returns_values_and_indices() {
        let array = matrix([[0.5, 0.1, 0.9], [0.3, 0.8, 0.2]]);

        let (values, indices) = unsafe { NdarrayBackend::max(&array, 0) };

        assert_eq!(values, ndarray::arr1(&[0.5_f32, 0.8, 0.9]).into_dyn());
        assert_eq!(indices, ndarray::arr1(&[0_i64, 1, 0]).into_dyn());
    }

    #[test]
    fn ndarray_sort_orders_each_lane() {
        let array = matrix([[0.5, 0.1, 0.9], [0.3, 0.8, 0.2]]);

        let (values, indices) = unsafe { NdarrayBackend::sort(&array, 1) };

        assert_eq!(values, matrix([[0.1, 0.5, 0.9], [0.2, 0.3, 0.8]]));
        assert_eq!(indices, arr2(&[[1_i64, 0, 2], [2, 0, 1]]).into_dyn());
    }

    #[test]
    fn ndarray_sort_along_first_axis() {
        let array = matrix([[0.5, 0.1, 0.9], [0.3, 0.8, 0.2]]);

        let (values, indices) = unsafe { NdarrayBackend::sort(&array, 0) };

        assert_eq!(values, matrix([[0.3, 0.1, 0.2], [0.5, 0.8, 0.9]]));
        assert_eq!(indices, arr2(&[[1_i64, 0, 1], [0, 1, 0]]).into_dyn());
    }

    #[test]
    fn ndarray_gather_then_scatter_restores_positions() {
        let array = arr2(&[[1.0_f32, 5.0], [9.0, 3.0]]).into_dyn();
        let index = arr2(&[[1_i64], [0]]).into_dyn();

        let gathered = unsafe { NdarrayBackend::gather(&array, 1, &index) };
        let blank = unsafe { NdarrayBackend::<f32>::zeros(&[2, 2]) };
        let scattered =
            unsafe { NdarrayBackend::scatter(&blank, 1, &index, &gathered) };

        assert_eq!(gathered, arr2(&[[5.0_f32], [9.0]]).into_dyn());
        assert_eq!(scattered, arr2(&[[0.0_f32, 5.0], [9.0, 0.0]]).into_dyn());
    }

    #[test]
    fn ndarray_gather_and_scatter_along_middle_axis() {
        let array = ArrayD::from_shape_vec(
            IxDyn(&[2, 3, 2]),
            (0..12).map(|value| value as f32).collect(),
        )
        .unwrap();
        let index =
            ArrayD::from_shape_vec(IxDyn(&[2, 1, 2]), vec![2_i64, 0, 1, 2])
                .unwrap();

        let gathered = unsafe { NdarrayBackend::gather(&array, 1, &index) };
        let blank = unsafe { NdarrayBackend::<f32>::zeros(&[2, 3, 2]) };
        let scattered =
            unsafe { NdarrayBackend::scatter(&blank, 1, &index, &gathered) };

        assert_eq!(
            gathered,
            ArrayD::from_shape_vec(
                IxDyn(&[2, 1, 2]),
                vec![4.0_f32, 1.0, 8.0, 11.0],
            )
            .unwrap()
        );
        assert_eq!(scattered[[0, 2, 0]], 4.0);
        assert_eq!(scattered[[0, 0, 1]], 1.0);
        assert_eq!(scattered[[1, 1, 0]], 8.0);
        assert_eq!(scattered[[1, 2, 1]], 11.0);
        assert_eq!(scattered.iter().filter(|&&value| value != 0.0).count(), 4);
    }

    #[test]
    fn ndarray_reshape_keeps_row_major_order() {
        let array = matrix([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let transposed = unsafe { NdarrayBackend::permute(&array, &[1, 0]) };

        let reshaped = unsafe { NdarrayBackend::reshape(&transposed, &[6]) };

        assert_eq!(
            reshaped,
            ndarray::arr1(&[1.0_f32, 4.0, 2.0, 5.0, 3.0, 6.0]).into_dyn()
        );
    }

    #[test]
    fn ndarray_axis_insertion_and_removal() {
        let array = matrix([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);

        let inserted = unsafe { NdarrayBackend::insert_axis(&array, 1) };
        let removed = unsafe { NdarrayBackend::remove_axis(&inserted, 1) };

        assert_eq!(inserted.shape(), &[2, 1, 3]);
        assert_eq!(removed, array);
    }

    #[test]
    fn ndarray_broadcast_rejects_incompatible_shapes() {
        let array = matrix([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let inserted = unsafe { NdarrayBackend::insert_axis(&array, 0) };

        let expanded = NdarrayBackend::broadcast(&inserted, &[4, 2, 3]);
        let rejected = NdarrayBackend::broadcast(&array, &[4, 3, 3]);

        assert_eq!(
            expanded.map(|tensor| tensor.shape().to_vec()),
            Some(vec![4, 2, 3])
        );
        assert!(rejected.is_none());
    }

    #[test]
    fn ndarray_slice_axis_keeps_range() {
        let array = matrix([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);

        let sliced = unsafe { NdarrayBackend::slice_axis(&array, 1, 2, 3) };

        assert_eq!(sliced, arr2(&[[3.0_f32], [6.0]]).into_dyn());
    }

    #[test]
    fn ndarray_greater_than_and_select() {
        let array = arr2(&[[0.1_f32, 0.6], [0.9, 0.2]]).into_dyn();
        let zeros = unsafe { NdarrayBackend::<f32>::zeros(&[2, 2]) };

        let mask = NdarrayBackend::greater_than(&array, 0.5);
        let selected = unsafe { NdarrayBackend::select(&mask, &array, &zeros) };

        assert_eq!(mask, arr2(&[[false, true], [true, false]]).into_dyn());
        assert_eq!(selected, arr2(&[[0.0_f32, 0.6], [0.9, 0.0]]).into_dyn());
    }

    #[test]
    fn ndarray_contract_matches_matrix_product() {
        let lhs = matrix([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let rhs = arr2(&[[1.0_f32, 0.0], [0.0, 1.0], [1.0, 1.0]]).into_dyn();
        let pattern: AxisPattern = "i k, k j -> i j".parse().unwrap();
        let contraction = pattern.bind(&[lhs.shape(), rhs.shape()]).unwrap();

        let product =
            unsafe { NdarrayBackend::contract(&[&lhs, &rhs], &contraction) };

        assert_eq!(product, arr2(&[[4.0_f32, 5.0], [10.0, 11.0]]).into_dyn());
    }

    #[test]
    fn ndarray_contract_sums_a_single_operand() {
        let array = ArrayD::from_shape_vec(
            IxDyn(&[2, 2, 2]),
            vec![1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        )
        .unwrap();
        let pattern: AxisPattern =
            "batch nodes mems -> nodes mems".parse().unwrap();
        let contraction = pattern.bind(&[array.shape()]).unwrap();

        let reduced =
            unsafe { NdarrayBackend::contract(&[&array], &contraction) };

        assert_eq!(reduced, arr2(&[[6.0_f32, 8.0], [10.0, 12.0]]).into_dyn());
    }
}
