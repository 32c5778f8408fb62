use half::{bf16, f16};
use num_complex::{Complex32, Complex64};

use crate::dtype::{DType, Element};

/// A host buffer holding elements of one dtype.
///
/// Kernels receive storages and produce new ones; nothing mutates a storage
/// after it is wrapped in a [`Tensor`](crate::Tensor).
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    F16(Vec<f16>),
    BF16(Vec<bf16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    C64(Vec<Complex32>),
    C128(Vec<Complex64>),
}

/// Run `$body` with `$v` bound to the typed vector inside a storage.
#[macro_export]
macro_rules! map_storage {
    ($storage:expr, $v:ident => $body:expr) => {
        match $storage {
            $crate::Storage::F16($v) => $body,
            $crate::Storage::BF16($v) => $body,
            $crate::Storage::F32($v) => $body,
            $crate::Storage::F64($v) => $body,
            $crate::Storage::C64($v) => $body,
            $crate::Storage::C128($v) => $body,
        }
    };
}

impl Storage {
    pub fn dtype(&self) -> DType {
        match self {
            Storage::F16(_) => DType::F16,
            Storage::BF16(_) => DType::BF16,
            Storage::F32(_) => DType::F32,
            Storage::F64(_) => DType::F64,
            Storage::C64(_) => DType::C64,
            Storage::C128(_) => DType::C128,
        }
    }

    pub fn len(&self) -> usize {
        map_storage!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A buffer of `len` copies of `value`, converted to `dtype`.
    pub fn full(dtype: DType, len: usize, value: Complex64) -> Self {
        fn fill<T: Element>(len: usize, value: Complex64) -> Storage {
            T::into_storage(vec![T::from_complex(value); len])
        }
        match dtype {
            DType::F16 => fill::<f16>(len, value),
            DType::BF16 => fill::<bf16>(len, value),
            DType::F32 => fill::<f32>(len, value),
            DType::F64 => fill::<f64>(len, value),
            DType::C64 => fill::<Complex32>(len, value),
            DType::C128 => fill::<Complex64>(len, value),
        }
    }

    pub fn zeros(dtype: DType, len: usize) -> Self {
        Self::full(dtype, len, Complex64::new(0.0, 0.0))
    }

    /// Convert complex128 values into a buffer of `dtype`.
    /// Real dtypes keep the real parts.
    pub fn from_complex(data: &[Complex64], dtype: DType) -> Self {
        fn convert<T: Element>(data: &[Complex64]) -> Storage {
            T::into_storage(data.iter().map(|&v| T::from_complex(v)).collect())
        }
        match dtype {
            DType::F16 => convert::<f16>(data),
            DType::BF16 => convert::<bf16>(data),
            DType::F32 => convert::<f32>(data),
            DType::F64 => convert::<f64>(data),
            DType::C64 => convert::<Complex32>(data),
            DType::C128 => convert::<Complex64>(data),
        }
    }

    pub fn from_f64(data: &[f64], dtype: DType) -> Self {
        let widened: Vec<Complex64> = data.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        Self::from_complex(&widened, dtype)
    }

    /// Every element widened to complex128.
    pub fn to_complex_vec(&self) -> Vec<Complex64> {
        map_storage!(self, v => v.iter().map(|&x| x.to_complex()).collect())
    }

    /// Typed view of the buffer, `None` if `T` is not this storage's dtype.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(self)
    }
}
