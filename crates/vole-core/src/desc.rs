use std::fmt;

use crate::device::Device;
use crate::dtype::DType;
use crate::shape::Shape;

/// Static metadata of a tensor: shape, element type and placement.
///
/// Inference produces descriptors without touching any data. Eager results
/// and graph values both carry one, and the two must agree for the same
/// call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorDesc {
    shape: Shape,
    dtype: DType,
    device: Device,
}

impl TensorDesc {
    pub fn new(shape: impl Into<Shape>, dtype: DType, device: Device) -> Self {
        Self {
            shape: shape.into(),
            dtype,
            device,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Same descriptor with a different shape.
    pub fn with_shape(&self, shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            ..self.clone()
        }
    }

    /// Same descriptor placed on another device.
    pub fn on(&self, device: Device) -> Self {
        Self {
            device,
            ..self.clone()
        }
    }
}

impl fmt::Display for TensorDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.shape, self.dtype, self.device)
    }
}
