use std::sync::Arc;

use num_complex::Complex64;

use crate::desc::TensorDesc;
use crate::device::Device;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::shape::Shape;
use crate::storage::Storage;

// Tensor — Concrete data plus its descriptor
//
// Tensors are what eager mode returns and what the graph executor feeds to
// kernels. They are immutable: a kernel reads its inputs and builds a new
// storage for every output. The storage sits behind an Arc so handing the
// same tensor to several calls (saved forward inputs, feeds) is O(1).
//
// Data always lives in host memory here. A tensor tagged with a GPU place
// keeps its host buffer, and whether anything can run on it is decided by
// the kernel registry, not by the tensor.

/// An n-dimensional array with a shape, dtype and device placement.
#[derive(Clone)]
pub struct Tensor {
    desc: TensorDesc,
    storage: Arc<Storage>,
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tensor({})", self.desc)
    }
}

impl Tensor {
    /// Wrap a storage, checking that it matches the descriptor.
    pub fn from_storage(storage: Storage, desc: TensorDesc) -> Result<Self> {
        if storage.dtype() != desc.dtype() {
            return Err(Error::DtypeMismatch {
                expected: desc.dtype(),
                got: storage.dtype(),
            });
        }
        if storage.len() != desc.elem_count() {
            return Err(Error::ElementCountMismatch {
                shape: desc.shape().clone(),
                expected: desc.elem_count(),
                got: storage.len(),
            });
        }
        Ok(Self {
            desc,
            storage: Arc::new(storage),
        })
    }

    /// Create a tensor from f64 data, converting to `dtype`.
    pub fn from_f64_slice(
        data: &[f64],
        shape: impl Into<Shape>,
        dtype: DType,
        device: Device,
    ) -> Result<Self> {
        let desc = TensorDesc::new(shape, dtype, device);
        Self::from_storage(Storage::from_f64(data, dtype), desc)
    }

    /// Create a tensor from complex data. Real dtypes keep the real parts.
    pub fn from_complex_slice(
        data: &[Complex64],
        shape: impl Into<Shape>,
        dtype: DType,
        device: Device,
    ) -> Result<Self> {
        let desc = TensorDesc::new(shape, dtype, device);
        Self::from_storage(Storage::from_complex(data, dtype), desc)
    }

    pub fn full(desc: TensorDesc, value: f64) -> Self {
        let storage = Storage::full(desc.dtype(), desc.elem_count(), Complex64::new(value, 0.0));
        Self {
            desc,
            storage: Arc::new(storage),
        }
    }

    pub fn zeros(desc: TensorDesc) -> Self {
        Self::full(desc, 0.0)
    }

    pub fn desc(&self) -> &TensorDesc {
        &self.desc
    }

    pub fn shape(&self) -> &Shape {
        self.desc.shape()
    }

    pub fn dims(&self) -> &[usize] {
        self.desc.dims()
    }

    pub fn rank(&self) -> usize {
        self.desc.rank()
    }

    pub fn elem_count(&self) -> usize {
        self.desc.elem_count()
    }

    pub fn dtype(&self) -> DType {
        self.desc.dtype()
    }

    pub fn device(&self) -> Device {
        self.desc.device()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The same data tagged with another placement.
    pub fn to_device(&self, device: Device) -> Self {
        Self {
            desc: self.desc.on(device),
            storage: Arc::clone(&self.storage),
        }
    }

    /// Values as f64. Fails for complex tensors; use [`to_complex_vec`](Self::to_complex_vec).
    pub fn to_f64_vec(&self) -> Result<Vec<f64>> {
        if self.dtype().is_complex() {
            return Err(Error::DtypeMismatch {
                expected: DType::F64,
                got: self.dtype(),
            });
        }
        Ok(self.storage.to_complex_vec().iter().map(|v| v.re).collect())
    }

    pub fn to_complex_vec(&self) -> Vec<Complex64> {
        self.storage.to_complex_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64_slice() {
        let t = Tensor::from_f64_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (2, 3), DType::F32, Device::Cpu)
            .unwrap();
        assert_eq!(t.dims(), &[2, 3]);
        assert_eq!(t.dtype(), DType::F32);
        assert_eq!(t.to_f64_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_element_count_checked() {
        let err = Tensor::from_f64_slice(&[1.0, 2.0], (2, 3), DType::F64, Device::Cpu).unwrap_err();
        assert!(matches!(err, Error::ElementCountMismatch { expected: 6, got: 2, .. }));
    }

    #[test]
    fn test_complex_refuses_f64_view() {
        let data = [Complex64::new(1.0, 2.0)];
        let t = Tensor::from_complex_slice(&data, 1usize, DType::C64, Device::Cpu).unwrap();
        assert!(t.to_f64_vec().is_err());
        assert_eq!(t.to_complex_vec(), vec![Complex64::new(1.0, 2.0)]);
    }

    #[test]
    fn test_to_device_shares_storage() {
        let t = Tensor::zeros(TensorDesc::new((3,), DType::F64, Device::Cpu));
        let g = t.to_device(Device::Cuda(0));
        assert_eq!(g.device(), Device::Cuda(0));
        assert!(Arc::ptr_eq(&t.storage, &g.storage));
    }
}
