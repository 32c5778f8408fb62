use std::fmt;
use std::ops::{Mul, Sub};

use half::{bf16, f16};
use num_complex::{Complex, Complex64};

use crate::storage::Storage;

// DType — Element types understood by the dispatcher
//
// The dtype is one third of every kernel key, so this enum is the closed set
// of element types a kernel can be registered for:
//
//   F16  — 16-bit IEEE half float
//   BF16 — 16-bit brain float
//   F32  — 32-bit float
//   F64  — 64-bit float
//   C64  — complex with f32 real and imaginary parts
//   C128 — complex with f64 real and imaginary parts

/// Enum of all supported element data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DType {
    F16,
    BF16,
    F32,
    F64,
    C64,
    C128,
}

impl DType {
    /// Every dtype, in declaration order.
    pub const ALL: [DType; 6] = [
        DType::F16,
        DType::BF16,
        DType::F32,
        DType::F64,
        DType::C64,
        DType::C128,
    ];

    /// Size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F16 | DType::BF16 => 2,
            DType::F32 => 4,
            DType::F64 | DType::C64 => 8,
            DType::C128 => 16,
        }
    }

    /// Whether this dtype is a real floating-point type.
    pub fn is_float(&self) -> bool {
        matches!(self, DType::F16 | DType::BF16 | DType::F32 | DType::F64)
    }

    /// Whether this is a half-precision type (F16 or BF16).
    pub fn is_half(&self) -> bool {
        matches!(self, DType::F16 | DType::BF16)
    }

    /// Whether this is a complex type (C64 or C128).
    pub fn is_complex(&self) -> bool {
        matches!(self, DType::C64 | DType::C128)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::F16 => "float16",
            DType::BF16 => "bfloat16",
            DType::F32 => "float32",
            DType::F64 => "float64",
            DType::C64 => "complex64",
            DType::C128 => "complex128",
        };
        write!(f, "{}", s)
    }
}

// Element — Trait that connects Rust types to the DType enum
//
// Kernels are written once, generically over `T: Element`, and registered
// for each concrete type. `Acc` is the type arithmetic happens in: half
// types widen to f32 so `a*b - c*d` rounds once instead of three times.

/// Arithmetic needed by the bilinear kernels.
pub trait Arith: Copy + Send + Sync + Mul<Output = Self> + Sub<Output = Self> {}

impl<T> Arith for T where T: Copy + Send + Sync + Mul<Output = T> + Sub<Output = T> {}

/// Trait implemented by Rust types that can be stored in a tensor.
pub trait Element: Copy + Send + Sync + 'static + num_traits::Zero + fmt::Debug {
    /// The corresponding DType enum variant.
    const DTYPE: DType;

    /// Accumulator type used by arithmetic kernels.
    type Acc: Arith;

    fn to_acc(self) -> Self::Acc;
    fn from_acc(acc: Self::Acc) -> Self;

    /// Widen to complex128 (real types get a zero imaginary part).
    fn to_complex(self) -> Complex64;

    /// Narrow from complex128. Real types keep only the real part.
    fn from_complex(v: Complex64) -> Self;

    /// Complex conjugate; the identity for real types.
    fn conj(self) -> Self;

    /// Borrow the typed buffer out of a storage of the matching dtype.
    fn slice(storage: &Storage) -> Option<&[Self]>;

    /// Wrap a typed buffer into a storage.
    fn into_storage(data: Vec<Self>) -> Storage;

    fn from_f64(v: f64) -> Self {
        Self::from_complex(Complex64::new(v, 0.0))
    }
}

macro_rules! real_element {
    ($ty:ty, $variant:ident, $acc:ty, $to:expr, $from:expr) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$variant;
            type Acc = $acc;

            fn to_acc(self) -> $acc {
                $to(self)
            }

            fn from_acc(acc: $acc) -> Self {
                $from(acc)
            }

            fn to_complex(self) -> Complex64 {
                Complex64::new($to(self) as f64, 0.0)
            }

            fn from_complex(v: Complex64) -> Self {
                $from(v.re as $acc)
            }

            fn conj(self) -> Self {
                self
            }

            fn slice(storage: &Storage) -> Option<&[Self]> {
                match storage {
                    Storage::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_storage(data: Vec<Self>) -> Storage {
                Storage::$variant(data)
            }
        }
    };
}

real_element!(f16, F16, f32, |v: f16| v.to_f32(), f16::from_f32);
real_element!(bf16, BF16, f32, |v: bf16| v.to_f32(), bf16::from_f32);
real_element!(f32, F32, f32, |v: f32| v, |v: f32| v);
real_element!(f64, F64, f64, |v: f64| v, |v: f64| v);

macro_rules! complex_element {
    ($part:ty, $variant:ident) => {
        impl Element for Complex<$part> {
            const DTYPE: DType = DType::$variant;
            type Acc = Complex<$part>;

            fn to_acc(self) -> Self {
                self
            }

            fn from_acc(acc: Self) -> Self {
                acc
            }

            fn to_complex(self) -> Complex64 {
                Complex64::new(self.re as f64, self.im as f64)
            }

            fn from_complex(v: Complex64) -> Self {
                Complex::new(v.re as $part, v.im as $part)
            }

            fn conj(self) -> Self {
                Complex::conj(&self)
            }

            fn slice(storage: &Storage) -> Option<&[Self]> {
                match storage {
                    Storage::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_storage(data: Vec<Self>) -> Storage {
                Storage::$variant(data)
            }
        }
    };
}

complex_element!(f32, C64);
complex_element!(f64, C128);
