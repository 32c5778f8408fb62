//! # vole-core
//!
//! Descriptors, attribute normalization, shape/dtype inference and kernel
//! dispatch for vole operators.
//!
//! This crate provides:
//! - [`TensorDesc`] — shape, dtype and placement of a tensor, without data
//! - [`DType`] / [`Device`] — element types (F16, BF16, F32, F64, C64, C128) and places
//! - [`normalize`](normalize::normalize) — canonical, bounds-checked attributes
//! - [`infer`](infer::infer) — output descriptors for an operator call
//! - [`OpCall`] — the normalize → infer front half shared by every execution mode
//! - [`KernelRegistry`] — (operator, device, dtype) → compute routine
//! - [`Tensor`] — immutable host data plus its descriptor
//! - [`Attributes`] — typed attribute maps with an optional output name
//! - [`Error`] — one error enum for every stage

pub mod attrs;
pub mod desc;
pub mod device;
pub mod dtype;
pub mod error;
pub mod infer;
pub mod kernel;
pub mod normalize;
pub mod op;
pub mod shape;
pub mod storage;
pub mod tensor;

pub use attrs::{AttrValue, Attributes};
pub use desc::TensorDesc;
pub use device::{Device, DeviceKind};
pub use dtype::{Arith, DType, Element};
pub use error::{Error, Result};
pub use kernel::{Kernel, KernelKey, KernelRegistry};
pub use op::{OpCall, OpKind};
pub use shape::Shape;
pub use storage::Storage;
pub use tensor::Tensor;
