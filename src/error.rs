//! Error types.
//!
//! Every fallible operation in the crate reports one of the enums below.
//! Nothing is caught internally: a failing generator propagates the error to
//! its caller, and fixtures written before the failure stay on disk.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Precondition failures of the checked [`Tensor`](crate::tensor::Tensor)
/// operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TensorError {
    /// The operation needs at least one axis but the tensor is a scalar.
    #[error("`{operation}` requires a tensor with at least one axis")]
    EmptyShape { operation: &'static str },
    /// The operation needs more axes than the tensor has.
    #[error("`{operation}` requires at least {required} axes, got {ndim}")]
    RankTooLow {
        operation: &'static str,
        required: usize,
        ndim: usize,
    },
    /// An axis index is not valid for a tensor of the given rank.
    #[error("axis {axis} is out of bounds for a tensor with {ndim} axes")]
    AxisOutOfBounds { axis: usize, ndim: usize },
    /// A shape contains a zero-length axis where one is not allowed.
    #[error("axis {axis} has length zero in shape {shape:?}")]
    ZeroLengthAxis { axis: usize, shape: Vec<usize> },
    /// Two operands disagree on their shapes.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    /// The number of elements of a shape overflows `isize`.
    #[error("shape {shape:?} holds more than isize::MAX elements")]
    ShapeOverflow { shape: Vec<usize> },
    /// A flat buffer does not hold as many elements as its shape.
    #[error("shape {shape:?} needs {expected} elements, got {actual}")]
    ElementCount {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },
    /// A reshape target does not hold the same number of elements.
    #[error("cannot reshape {from:?} into {to:?}")]
    IncompatibleReshape { from: Vec<usize>, to: Vec<isize> },
    /// An index tensor refers outside of the indexed axis.
    #[error("index {index} is out of bounds for axis {axis} with length {len}")]
    IndexOutOfBounds { index: i64, axis: usize, len: usize },
    /// An operation received the wrong number of input tensors.
    #[error("`{operation}` takes {expected} input tensors, got {actual}")]
    InputCount {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A named-axis pattern could not be parsed or bound.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Problems with named-axis patterns such as
/// `"batch fields dim -> batch fields"`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PatternError {
    #[error("pattern `{0}` is missing the `->` separator")]
    MissingArrow(String),
    #[error("pattern has {expected} operands but {actual} tensors were given")]
    OperandCount { expected: usize, actual: usize },
    #[error("operand {operand} has {ndim} axes but its pattern names {named}")]
    RankMismatch {
        operand: usize,
        ndim: usize,
        named: usize,
    },
    #[error("axis `{0}` appears more than once in one operand")]
    DuplicateAxis(String),
    #[error("output axis `{0}` does not appear in any input")]
    UnknownOutputAxis(String),
    #[error("axis `{axis}` is bound to both {first} and {second}")]
    ConflictingLength {
        axis: String,
        first: usize,
        second: usize,
    },
    #[error("invalid axis name `{0}`")]
    InvalidAxisName(String),
    #[error("unbalanced parentheses in `{0}`")]
    UnbalancedGroup(String),
    #[error("axis groups are only supported in the output of `{0}`")]
    UnsupportedGroup(String),
    #[error("input axis `{0}` is missing from the output of a rearrangement")]
    DroppedAxis(String),
}

/// Invalid generator configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("unsupported dtype `{0}`")]
    UnsupportedDtype(String),
}

/// Failures while writing or reading fixture files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FixtureError {
    #[error("failed to create fixture directory `{path}`")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write fixture `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: ndarray_npy::WriteNpyError,
    },
    #[error("failed to read fixture `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

impl From<PatternError> for FixtureError {
    #[inline]
    fn from(value: PatternError) -> Self {
        Self::Tensor(TensorError::Pattern(value))
    }
}
