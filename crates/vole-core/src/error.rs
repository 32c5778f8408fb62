use crate::device::Device;
use crate::dtype::DType;
use crate::kernel::KernelKey;
use crate::op::OpKind;
use crate::shape::Shape;

/// All errors that can occur within vole.
///
/// Every stage of the pipeline (normalize, infer, dispatch, backward) fails
/// fast with the first violated contract. None of these are transient: they
/// describe bad input or a missing registration, so nothing is retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Axis attribute resolved outside `[0, rank)`.
    #[error("invalid axis {axis} for tensor with {rank} dimensions")]
    InvalidAxis { axis: i64, rank: usize },

    /// No axis was given and no dimension has length 3.
    #[error("no axis of length 3 in shape {shape}; pass an explicit axis")]
    NoSizeThreeAxis { shape: Shape },

    /// Two operands disagree on shape (or rank).
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// The operation axis has the wrong length (cross needs exactly 3).
    #[error("axis {axis} must have length {expected}, got {got}")]
    AxisLength {
        axis: usize,
        expected: usize,
        got: usize,
    },

    /// Operands have different element types.
    #[error("dtype mismatch: expected {expected}, got {got}")]
    DtypeMismatch { expected: DType, got: DType },

    /// Operands live on different devices.
    #[error("device placement error: expected {expected}, got {got}")]
    DevicePlacement { expected: Device, got: Device },

    /// No kernel registered for this (operator, device, dtype) triple.
    #[error("unsupported kernel: no {} kernel for {} on {}", .0.op, .0.dtype, .0.device)]
    UnsupportedKernel(KernelKey),

    /// A kernel or gradient rule was registered twice under the same key.
    #[error("duplicate registration: {0}")]
    DuplicateRegistration(String),

    /// backward() was asked for an operator without a gradient rule.
    #[error("no gradient registered for operator {0}")]
    NoGradientRegistered(OpKind),

    /// Wrong number of operands for an operator.
    #[error("{op} expects {expected} inputs, got {got}")]
    Arity {
        op: OpKind,
        expected: String,
        got: usize,
    },

    /// Slice bounds outside the axis after negative-index resolution.
    #[error("slice out of bounds: axis {axis}, start {start}, end {end}, axis length {len}")]
    SliceOutOfBounds {
        axis: usize,
        start: i64,
        end: i64,
        len: usize,
    },

    /// Element count mismatch when creating a tensor from a slice.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// A required attribute is absent.
    #[error("{op} requires attribute '{name}'")]
    MissingAttribute { op: OpKind, name: String },

    /// An attribute exists but holds a value of the wrong kind.
    #[error("attribute '{name}' must be {expected}")]
    AttributeType { name: String, expected: &'static str },

    /// The executor was not given data for a declared graph input.
    #[error("missing feed for graph input '{0}'")]
    MissingFeed(String),

    /// A value handle that does not belong to the graph.
    #[error("unknown value handle {0}")]
    UnknownValue(usize),

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }
}

/// Convenience Result type used throughout vole.
pub type Result<T> = std::result::Result<T, Error>;

/// Early return with a formatted error message.
/// Usage: `bail!("kernel produced {} outputs", n)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
