//! Reference fixture generators.
//!
//! Every operation is described once by an [`OperationEntry`]: how many inputs
//! it takes, where they come from, which axes it iterates over and how many
//! fixtures that yields. [`Operation::apply`] computes the fixtures of one
//! invocation from explicit inputs, and [`Generator`] samples the inputs,
//! applies the operation and writes the results.
//!
//! ```
//! use tensorref::{generator::Operation, tensor, tensor::Tensor};
//!
//! let x: Tensor<f32> = tensor![[1.0, 5.0], [9.0, 3.0]];
//! let fixtures = Operation::Gather.apply("gather2d", &[x]).unwrap();
//!
//! let names: Vec<&str> = fixtures.iter().map(|f| f.name.as_str()).collect();
//! assert_eq!(
//!     names,
//!     ["gather2d_gather_x", "gather2d_gather_indices", "gather2d_gather_y"]
//! );
//! ```

use core::fmt;
use std::path::PathBuf;

use log::info;
use ndarray_npy::WritableElement;
use num_traits::NumCast;

use crate::{
    config::{Dtype, GeneratorConfig},
    error::{FixtureError, TensorError},
    fixture::Fixture,
    pattern::AxisPattern,
    random::{Distribution, Sample, TensorRng},
    tensor::{Element, Tensor},
};

/// A hard-coded named-axis pattern together with the tag used in fixture
/// names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedPattern {
    pub tag: &'static str,
    pub pattern: &'static str,
}

pub const EINSUM_BFMD_BFD: NamedPattern = NamedPattern {
    tag: "bfmd_bfd",
    pattern: "batch fields memories dim, batch fields dim \
              -> batch fields memories",
};
pub const EINSUM_BHCHMC_BHCC: NamedPattern = NamedPattern {
    tag: "bhchmc_bhcc",
    pattern: "batch hidden children h_mems c_mems, \
              batch hidden children c_mems -> batch hidden h_mems",
};
pub const EINSUM_BPCP_BPCPC: NamedPattern = NamedPattern {
    tag: "bpcp_bpcpc",
    pattern: "batch parents children pdim, batch parents children pdim cdim \
              -> batch parents children cdim",
};
pub const EINSUM_NCMD_BNM: NamedPattern = NamedPattern {
    tag: "ncmd_bnm",
    pattern: "nodes children_per_node memories dim, batch nodes memories \
              -> batch nodes children_per_node dim",
};
pub const EINSUM_BNCD_BNM: NamedPattern = NamedPattern {
    tag: "bncd_bnm",
    pattern: "batch nodes children_per_node dim, batch nodes memories \
              -> nodes children_per_node memories dim",
};

pub const REDUCE_BNM_NM: NamedPattern = NamedPattern {
    tag: "bnm_nm_reduce_sum",
    pattern: "batch nodes mems -> nodes mems",
};
pub const REDUCE_BFMD_BFM: NamedPattern = NamedPattern {
    tag: "bfmd_bfm",
    pattern: "batch fields memories dim -> batch fields memories",
};
pub const REDUCE_BFD_BF: NamedPattern = NamedPattern {
    tag: "bfd_bf",
    pattern: "batch field dim -> batch field",
};
pub const REDUCE_BHCCM_BH: NamedPattern = NamedPattern {
    tag: "bhccm_bh",
    pattern: "batch hidden children c_mems -> batch hidden",
};

pub const REARRANGE_PATTERN: &str = "batch mems flag -> mems (batch flag)";

/// Threshold of the default `where` job.
pub const WHERE_THRESHOLD: f64 = 0.5;

/// Length the default `expand` job broadcasts the new axis to.
pub const EXPAND_SIZE: usize = 4;

/// Which axes an operation is applied along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisPolicy {
    /// Applied once to the whole input.
    Once,
    /// Once per axis, `0..rank`.
    EachAxis,
    /// Once per pair of neighbouring axes, `(0, 1)..(rank - 2, rank - 1)`.
    EachAdjacentPair,
    /// Once per insertion point, `0..=rank`.
    EachInsertionPoint,
}

impl AxisPolicy {
    /// Number of iterations for an input of rank `rank`.
    #[inline]
    #[must_use]
    pub const fn steps(self, rank: usize) -> usize {
        match self {
            Self::Once => 0,
            Self::EachAxis => rank,
            Self::EachAdjacentPair => rank.saturating_sub(1),
            Self::EachInsertionPoint => rank + 1,
        }
    }
}

/// Static description of an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationEntry {
    /// Operation name used in log lines.
    pub name: &'static str,
    /// Number of input tensors.
    pub arity: usize,
    /// Distribution of the random inputs. `None` means the input only
    /// provides a shape and is never written.
    pub distribution: Option<Distribution>,
    /// Smallest input rank the operation accepts.
    pub min_rank: usize,
    pub policy: AxisPolicy,
    /// Fixtures written once per invocation.
    pub fixed: usize,
    /// Fixtures written per iteration of `policy`.
    pub per_step: usize,
}

impl OperationEntry {
    /// Fixtures one invocation on an input of rank `rank` yields.
    #[inline]
    #[must_use]
    pub const fn fixture_count(&self, rank: usize) -> usize {
        self.fixed + self.per_step * self.policy.steps(rank)
    }

    fn check_rank(&self, rank: usize) -> Result<(), TensorError> {
        if rank >= self.min_rank {
            Ok(())
        } else if self.min_rank == 1 {
            Err(TensorError::EmptyShape {
                operation: self.name,
            })
        } else {
            Err(TensorError::RankTooLow {
                operation: self.name,
                required: self.min_rank,
                ndim: rank,
            })
        }
    }
}

/// One fixture generator, with its fixed parameters.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Operation {
    Abs,
    Sqrt,
    Ones,
    ZerosLike,
    Argmax,
    Max,
    Sort,
    Gather,
    Scatter,
    Reshape { shape: Vec<isize> },
    Transpose,
    Squeeze,
    Unsqueeze,
    Expand { size: usize },
    Where { threshold: f64 },
    /// `x[:, :, -1:]`
    SliceLast,
    /// `x[:, :len - 1]`
    SlicePrefix,
    Einsum(NamedPattern),
    Reduce(NamedPattern),
    Rearrange { pattern: &'static str },
}

impl Operation {
    /// The table entry of this operation.
    #[must_use]
    pub const fn entry(&self) -> OperationEntry {
        use AxisPolicy::{
            EachAdjacentPair as Pairs, EachAxis as Axes,
            EachInsertionPoint as Gaps, Once,
        };
        use Distribution::{StandardNormal as Normal, Uniform};

        let (name, arity, distribution, min_rank, policy, fixed, per_step) =
            match self {
                Self::Abs => ("abs", 1, Some(Normal), 0, Once, 2, 0),
                Self::Sqrt => ("sqrt", 1, Some(Uniform), 0, Once, 2, 0),
                Self::Ones => ("ones", 1, None, 0, Once, 1, 0),
                Self::ZerosLike => {
                    ("zeros_like", 1, Some(Uniform), 0, Once, 2, 0)
                }
                Self::Argmax => ("argmax", 1, Some(Uniform), 1, Axes, 1, 2),
                Self::Max => ("max", 1, Some(Uniform), 1, Axes, 1, 2),
                Self::Sort => ("sort", 1, Some(Uniform), 1, Axes, 1, 2),
                Self::Gather => ("gather", 1, Some(Normal), 1, Once, 3, 0),
                Self::Scatter => ("scatter", 1, Some(Normal), 1, Once, 5, 0),
                Self::Reshape { .. } => {
                    ("reshape", 1, Some(Uniform), 0, Once, 2, 0)
                }
                Self::Transpose => {
                    ("transpose", 1, Some(Uniform), 1, Pairs, 1, 1)
                }
                Self::Squeeze => ("squeeze", 1, Some(Normal), 1, Axes, 1, 1),
                Self::Unsqueeze => {
                    ("unsqueeze", 1, Some(Normal), 1, Gaps, 1, 1)
                }
                Self::Expand { .. } => {
                    ("expand", 1, Some(Normal), 1, Gaps, 1, 1)
                }
                Self::Where { .. } => {
                    ("where", 1, Some(Uniform), 0, Once, 3, 0)
                }
                Self::SliceLast => {
                    ("slice_last", 1, Some(Uniform), 3, Once, 2, 0)
                }
                Self::SlicePrefix => {
                    ("slice_prefix", 1, Some(Uniform), 2, Once, 2, 0)
                }
                Self::Einsum(_) => ("einsum", 2, Some(Uniform), 0, Once, 3, 0),
                Self::Reduce(_) => ("reduce", 1, Some(Uniform), 0, Once, 2, 0),
                Self::Rearrange { .. } => {
                    ("rearrange", 1, Some(Uniform), 0, Once, 2, 0)
                }
            };

        OperationEntry {
            name,
            arity,
            distribution,
            min_rank,
            policy,
            fixed,
            per_step,
        }
    }

    /// Computes every fixture one invocation named `name` produces for
    /// `inputs`, in the order they are written.
    ///
    /// # Errors
    ///
    /// Fails when the number of inputs does not match the operation, an
    /// input has too few axes, or the underlying tensor operation rejects
    /// its arguments.
    pub fn apply<T>(
        &self,
        name: &str,
        inputs: &[Tensor<T>],
    ) -> Result<Vec<Fixture<T>>, TensorError>
    where
        T: Element,
    {
        let entry = self.entry();
        if inputs.len() != entry.arity {
            return Err(TensorError::InputCount {
                operation: entry.name,
                expected: entry.arity,
                actual: inputs.len(),
            });
        }

        let x = &inputs[0];
        let rank = x.ndim();
        entry.check_rank(rank)?;

        let steps = 0..entry.policy.steps(rank);
        let mut out = Vec::with_capacity(entry.fixture_count(rank));

        match self {
            Self::Abs => {
                out.push(Fixture::values(format!("{name}_abs_x"), x.clone()));
                out.push(Fixture::values(format!("{name}_abs_y"), x.abs()));
            }
            Self::Sqrt => {
                out.push(Fixture::values(format!("{name}_sqrt_x"), x.clone()));
                out.push(Fixture::values(format!("{name}_sqrt_y"), x.sqrt()));
            }
            Self::Ones => {
                out.push(Fixture::values(name, Tensor::ones(x.shape())?));
            }
            Self::ZerosLike => {
                out.push(Fixture::values(
                    format!("{name}_zeros_like"),
                    x.zeros_like(),
                ));
                out.push(Fixture::values(
                    format!("{name}_zeros_like_x"),
                    x.clone(),
                ));
            }
            Self::Argmax => {
                out.push(Fixture::values(
                    format!("{name}_argmax_x"),
                    x.clone(),
                ));
                for dim in steps {
                    out.push(Fixture::indices(
                        format!("{name}argmax_dim{dim}_nokeepdim"),
                        x.argmax(dim, false)?,
                    ));
                    out.push(Fixture::indices(
                        format!("{name}argmax_dim{dim}_yeskeepdim"),
                        x.argmax(dim, true)?,
                    ));
                }
            }
            Self::Max => {
                out.push(Fixture::values(format!("{name}_max_x"), x.clone()));
                for dim in steps {
                    let (values, indices) = x.max(dim)?;
                    out.push(Fixture::values(
                        format!("{name}_max_v_dim{dim}"),
                        values,
                    ));
                    out.push(Fixture::indices(
                        format!("{name}_max_i_dim{dim}"),
                        indices,
                    ));
                }
            }
            Self::Sort => {
                out.push(Fixture::values(format!("{name}_sort_x"), x.clone()));
                for dim in steps {
                    let (values, indices) = x.sort(dim)?;
                    out.push(Fixture::values(
                        format!("{name}_sorted_v_dim{dim}"),
                        values,
                    ));
                    out.push(Fixture::indices(
                        format!("{name}_sorted_i_dim{dim}"),
                        indices,
                    ));
                }
            }
            Self::Gather => {
                let last = rank - 1;
                let indices = x.argmax(last, true)?;
                let gathered = x.gather(last, &indices)?;

                out.push(Fixture::values(
                    format!("{name}_gather_x"),
                    x.clone(),
                ));
                out.push(Fixture::indices(
                    format!("{name}_gather_indices"),
                    indices,
                ));
                out.push(Fixture::values(format!("{name}_gather_y"), gathered));
            }
            Self::Scatter => {
                let last = rank - 1;
                let indices = x.argmax(last, true)?;
                let gathered = x.gather(last, &indices)?;
                let blank = x.zeros_like();
                let scattered = blank.scatter(last, &indices, &gathered)?;

                out.push(Fixture::values(
                    format!("{name}_scatter_x"),
                    x.clone(),
                ));
                out.push(Fixture::indices(
                    format!("{name}_scatter_indices"),
                    indices,
                ));
                out.push(Fixture::values(
                    format!("{name}_scatter_gathered"),
                    gathered,
                ));
                out.push(Fixture::values(
                    format!("{name}_scatter_blank"),
                    blank,
                ));
                out.push(Fixture::values(
                    format!("{name}_scatter_scattered"),
                    scattered,
                ));
            }
            Self::Reshape { shape } => {
                let reshaped = x.reshape(shape)?;
                out.push(Fixture::values(
                    format!("{name}_reshape_original"),
                    x.clone(),
                ));
                out.push(Fixture::values(
                    format!("{name}_reshape_reshaped"),
                    reshaped,
                ));
            }
            Self::Transpose => {
                out.push(Fixture::values(
                    format!("{name}_transpose_x"),
                    x.clone(),
                ));
                for dim in steps {
                    let next = dim + 1;
                    out.push(Fixture::values(
                        format!("{name}_transpose_{dim}_{next}"),
                        x.transpose(dim, next)?,
                    ));
                }
            }
            Self::Squeeze => {
                out.push(Fixture::values(
                    format!("{name}_squeeze_x"),
                    x.clone(),
                ));
                for dim in steps {
                    out.push(Fixture::values(
                        format!("{name}_squeeze_y_dim{dim}"),
                        x.squeeze(dim)?,
                    ));
                }
            }
            Self::Unsqueeze => {
                out.push(Fixture::values(
                    format!("{name}_unsqueeze_x"),
                    x.clone(),
                ));
                for dim in steps {
                    out.push(Fixture::values(
                        format!("{name}_unsqueeze_y_dim{dim}"),
                        x.unsqueeze(dim)?,
                    ));
                }
            }
            Self::Expand { size } => {
                out.push(Fixture::values(
                    format!("{name}_original_expand_dim"),
                    x.clone(),
                ));
                for dim in steps {
                    out.push(Fixture::values(
                        format!("{name}_expand_dim_{dim}"),
                        x.expand(dim, *size)?,
                    ));
                }
            }
            Self::Where { threshold } => {
                let condition = x.greater_than(scalar(*threshold));
                let result = Tensor::select(&condition, x, &x.zeros_like())?;

                out.push(Fixture::values(format!("{name}_where_x"), x.clone()));
                out.push(Fixture::mask(format!("{name}_condition"), condition));
                out.push(Fixture::values(format!("{name}_result"), result));
            }
            Self::SliceLast => {
                let last = rank - 1;
                let len = x.shape()[last];
                let Some(start) = len.checked_sub(1) else {
                    return Err(TensorError::ZeroLengthAxis {
                        axis: last,
                        shape: x.shape().to_vec(),
                    });
                };
                let sliced = x.slice_axis(last, start, len)?;

                out.push(Fixture::values(
                    format!("{name}_sliced[:, :, -1:]_x"),
                    x.clone(),
                ));
                out.push(Fixture::values(
                    format!("{name}_sliced[:, :, -1:]_y"),
                    sliced,
                ));
            }
            Self::SlicePrefix => {
                let keep = x.shape()[1].saturating_sub(1);
                let sliced = x.slice_axis(1, 0, keep)?;

                out.push(Fixture::values(
                    format!("{name}_sliced[:, :batch_size]_x"),
                    x.clone(),
                ));
                out.push(Fixture::values(
                    format!("{name}_{keep}_sliced[:, :batch_size]_y"),
                    sliced,
                ));
            }
            Self::Einsum(variant) => {
                let pattern: AxisPattern = variant.pattern.parse()?;
                let y = &inputs[1];
                let z = Tensor::einsum(&pattern, &[x, y])?;
                let tag = variant.tag;

                out.push(Fixture::values(
                    format!("{name}_einsum_{tag}_x"),
                    x.clone(),
                ));
                out.push(Fixture::values(
                    format!("{name}_einsum_{tag}_y"),
                    y.clone(),
                ));
                out.push(Fixture::values(format!("{name}_einsum_{tag}_z"), z));
            }
            Self::Reduce(variant) => {
                let pattern: AxisPattern = variant.pattern.parse()?;
                let reduced = x.reduce_sum(&pattern)?;
                let tag = variant.tag;

                out.push(Fixture::values(
                    format!("{name}_reduce_{tag}_x"),
                    x.clone(),
                ));
                out.push(Fixture::values(
                    format!("{name}_reduce_{tag}_y"),
                    reduced,
                ));
            }
            Self::Rearrange { pattern } => {
                let pattern: AxisPattern = pattern.parse()?;
                let result = x.rearrange(&pattern)?;

                out.push(Fixture::values(
                    format!("{name}_rearrange_original"),
                    x.clone(),
                ));
                out.push(Fixture::values(
                    format!("{name}_rearrange_result"),
                    result,
                ));
            }
        }

        Ok(out)
    }
}

impl fmt::Display for Operation {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry().name)
    }
}

/// Converts a threshold into the element type. Float-to-float casts saturate
/// instead of failing, so the fallback is never taken for `f32` or `f64`.
fn scalar<T: Element>(value: f64) -> T {
    <T as NumCast>::from(value).unwrap_or_else(T::nan)
}

/// One generator invocation: an operation, the shapes of its inputs and the
/// base name of its fixtures.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub operation: Operation,
    pub shapes: Vec<Vec<usize>>,
    pub name: String,
}

impl Job {
    #[inline]
    pub fn unary(
        operation: Operation,
        shape: &[usize],
        name: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            shapes: vec![shape.to_vec()],
            name: name.into(),
        }
    }

    #[inline]
    pub fn binary(
        operation: Operation,
        lhs: &[usize],
        rhs: &[usize],
        name: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            shapes: vec![lhs.to_vec(), rhs.to_vec()],
            name: name.into(),
        }
    }
}

/// An ordered list of jobs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureSet {
    jobs: Vec<Job>,
}

impl FixtureSet {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    #[inline]
    pub fn push(&mut self, job: Job) {
        self.jobs.push(job);
    }

    #[inline]
    #[must_use]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// The complete fixture set consumed by the downstream test suite,
    /// including the small rank-3 sort its last-axis sort test reads.
    #[must_use]
    pub fn default_batch() -> Self {
        let rank2: &[usize] = &[10, 11];
        let rank3: &[usize] = &[10, 11, 12];
        let rank6: Vec<usize> = (6..12).collect();
        let rank7: Vec<usize> = (6..13).collect();

        let mut set = Self::new();

        set.push(Job::unary(Operation::Abs, rank2, "abs2d"));
        set.push(Job::unary(Operation::Abs, rank3, "abs3d"));
        set.push(Job::unary(Operation::Sqrt, rank2, "sqrt2d"));
        set.push(Job::unary(Operation::Sqrt, rank3, "sqrt3d"));
        set.push(Job::unary(Operation::Ones, &[2, 3], "ones"));
        set.push(Job::unary(Operation::ZerosLike, &rank7, "zeros_like"));

        set.push(Job::unary(Operation::Argmax, &rank6, "argmax"));
        set.push(Job::unary(Operation::Max, &rank7, "max"));
        set.push(Job::unary(Operation::Sort, &rank7, "sort"));
        set.push(Job::unary(Operation::Sort, &[2, 3, 4], "sortsmall"));

        for rank in 2..=7 {
            let shape: Vec<usize> = (10..10 + rank).collect();
            let name = format!("gather{rank}d");
            set.push(Job::unary(Operation::Gather, &shape, name));
        }
        for rank in 2..=7 {
            let shape: Vec<usize> = (10..10 + rank).collect();
            let name = format!("scatter{rank}d");
            set.push(Job::unary(Operation::Scatter, &shape, name));
        }

        set.push(Job::unary(
            Operation::Reshape { shape: vec![8, -1] },
            &[8, 3, 10],
            "reshape2d",
        ));
        set.push(Job::unary(
            Operation::Reshape {
                shape: vec![3, 1, -1],
            },
            &[3, 8, 10],
            "reshape3d",
        ));
        set.push(Job::unary(
            Operation::Reshape {
                shape: vec![3, 4, 2, 10],
            },
            &[3, 8, 10],
            "reshape4d",
        ));
        set.push(Job::unary(Operation::Transpose, &[11, 12, 13], "transpose"));

        set.push(Job::unary(Operation::Squeeze, rank2, "squeeze2d"));
        set.push(Job::unary(Operation::Squeeze, rank3, "squeeze3d"));
        set.push(Job::unary(Operation::Unsqueeze, rank2, "unsqueeze2d"));
        set.push(Job::unary(Operation::Unsqueeze, rank3, "unsqueeze3d"));
        let expand = Operation::Expand { size: EXPAND_SIZE };
        set.push(Job::unary(expand.clone(), rank2, "expand2d"));
        set.push(Job::unary(expand, rank3, "expand3d"));

        set.push(Job::unary(
            Operation::Where {
                threshold: WHERE_THRESHOLD,
            },
            &[11, 12],
            "where",
        ));
        set.push(Job::unary(Operation::SliceLast, &[2, 3, 4], "sliced"));
        set.push(Job::unary(Operation::SlicePrefix, &[2, 4, 5], "sliced"));

        for (variant, lhs, rhs, name) in [
            (
                EINSUM_BFMD_BFD,
                &[2, 3, 4, 5][..],
                &[2, 3, 5][..],
                "einsum_batch_fields_memories",
            ),
            (
                EINSUM_BHCHMC_BHCC,
                &[2, 3, 4, 5, 6][..],
                &[2, 3, 4, 6][..],
                "einsum_batch_hidden_children_mems",
            ),
            (
                EINSUM_BPCP_BPCPC,
                &[2, 3, 4, 5][..],
                &[2, 3, 4, 5, 6][..],
                "einsum_batch_parents_children_pdim_cdim",
            ),
            (
                EINSUM_NCMD_BNM,
                &[2, 3, 4, 5][..],
                &[6, 2, 4][..],
                "einsum_nodes_children_memories_dim",
            ),
            (
                EINSUM_BNCD_BNM,
                &[2, 3, 4, 5][..],
                &[2, 3, 6][..],
                "einsum_batch_nodes_children_dim_memories",
            ),
        ] {
            set.push(Job::binary(Operation::Einsum(variant), lhs, rhs, name));
        }

        for (variant, shape, name) in [
            (REDUCE_BNM_NM, &[2, 3, 4][..], "reduced"),
            (
                REDUCE_BFMD_BFM,
                &[2, 3, 4, 5][..],
                "reduced_batch_fields_memories",
            ),
            (REDUCE_BFD_BF, &[2, 3, 4][..], "reduced_batch_field"),
            (REDUCE_BHCCM_BH, &[2, 3, 5, 6][..], "reduced_batch_hidden"),
        ] {
            set.push(Job::unary(Operation::Reduce(variant), shape, name));
        }

        set.push(Job::unary(
            Operation::Rearrange {
                pattern: REARRANGE_PATTERN,
            },
            &[2, 3, 4],
            "rearranged",
        ));

        set
    }
}

impl<'a> IntoIterator for &'a FixtureSet {
    type Item = &'a Job;
    type IntoIter = core::slice::Iter<'a, Job>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.jobs.iter()
    }
}

/// Samples inputs, applies operations and writes the fixtures.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    rng: TensorRng,
}

impl Generator {
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = TensorRng::new(config.seed);
        Self { config, rng }
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Runs one job with element type `T` and returns the paths written.
    ///
    /// # Errors
    ///
    /// Fails when the job does not fit its operation or a fixture cannot be
    /// written. Fixtures written before the failure stay on disk.
    pub fn run<T>(&mut self, job: &Job) -> Result<Vec<PathBuf>, FixtureError>
    where
        T: Sample + WritableElement,
    {
        let entry = job.operation.entry();
        if job.shapes.len() != entry.arity {
            return Err(TensorError::InputCount {
                operation: entry.name,
                expected: entry.arity,
                actual: job.shapes.len(),
            }
            .into());
        }

        info!("{} ({}) {:?}", job.name, entry.name, job.shapes);

        let inputs = job
            .shapes
            .iter()
            .map(|shape| match entry.distribution {
                Some(distribution) => self.rng.sample::<T>(shape, distribution),
                None => Tensor::zeros(shape),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fixtures = job.operation.apply(&job.name, &inputs)?;
        fixtures
            .iter()
            .map(|fixture| fixture.save(&self.config.output_directory))
            .collect()
    }

    /// Runs every job of `set` in order with element type `T`, stopping at
    /// the first failure. Returns the number of fixtures written.
    ///
    /// # Errors
    ///
    /// Returns the first error of [`Generator::run`].
    pub fn run_batch<T>(
        &mut self,
        set: &FixtureSet,
    ) -> Result<usize, FixtureError>
    where
        T: Sample + WritableElement,
    {
        let mut written = 0;
        for job in set {
            written += self.run::<T>(job)?.len();
        }

        info!(
            "wrote {written} fixtures for {} jobs to {}",
            set.len(),
            self.config.output_directory.display()
        );
        Ok(written)
    }

    /// [`Generator::run_batch`] with the configured element type.
    ///
    /// # Errors
    ///
    /// Returns the first error of [`Generator::run`].
    pub fn run_configured(
        &mut self,
        set: &FixtureSet,
    ) -> Result<usize, FixtureError> {
        match self.config.default_dtype {
            Dtype::Float32 => self.run_batch::<f32>(set),
            Dtype::Float64 => self.run_batch::<f64>(set),
        }
    }
}
