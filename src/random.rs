//! Random input tensors.
//!
//! Generators draw their inputs from one of two distributions. A seeded
//! [`TensorRng`] makes a whole batch reproducible.

use rand::{Rng, SeedableRng, distributions::Standard, rngs::StdRng};
use rand_distr::StandardNormal;

use crate::{
    error::TensorError,
    tensor::{Element, Tensor, element_count},
};

/// The distribution random inputs are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Distribution {
    /// Uniform on `[0, 1)`.
    Uniform,
    /// Normal with mean zero and unit variance.
    StandardNormal,
}

/// Elements that can be sampled from every [`Distribution`].
pub trait Sample: Element {
    /// Draws one value uniformly from `[0, 1)`.
    fn uniform<R: Rng + ?Sized>(rng: &mut R) -> Self;

    /// Draws one value from the standard normal distribution.
    fn normal<R: Rng + ?Sized>(rng: &mut R) -> Self;
}

macro_rules! impl_sample {
    ($($ty:ty),+) => {
        $(
            impl Sample for $ty {
                #[inline]
                fn uniform<R: Rng + ?Sized>(rng: &mut R) -> Self {
                    rng.sample(Standard)
                }

                #[inline]
                fn normal<R: Rng + ?Sized>(rng: &mut R) -> Self {
                    rng.sample(StandardNormal)
                }
            }
        )+
    };
}

impl_sample!(f32, f64);

/// Source of random input tensors.
#[derive(Debug, Clone)]
pub struct TensorRng {
    rng: StdRng,
}

impl TensorRng {
    /// Creates a generator seeded with `seed`, or from system entropy when
    /// no seed is given.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(value) => StdRng::seed_from_u64(value),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Samples a tensor of the given shape.
    ///
    /// # Errors
    ///
    /// Fails when the number of elements overflows `isize`. Nothing is drawn
    /// in that case.
    pub fn sample<T: Sample>(
        &mut self,
        shape: &[usize],
        distribution: Distribution,
    ) -> Result<Tensor<T>, TensorError> {
        let count = element_count(shape)?;

        let rng = &mut self.rng;
        let data: Vec<T> = match distribution {
            Distribution::Uniform => {
                (0..count).map(|_| T::uniform(&mut *rng)).collect()
            }
            Distribution::StandardNormal => {
                (0..count).map(|_| T::normal(&mut *rng)).collect()
            }
        };

        Tensor::from_vec(data, shape)
    }
}
