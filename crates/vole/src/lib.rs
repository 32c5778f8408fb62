//! # Vole
//!
//! Operator dispatch for n-dimensional arrays, with the 3-vector cross
//! product as its exemplar operator.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust
//! use vole::prelude::*;
//!
//! # fn main() -> vole::Result<()> {
//! let rt = Runtime::new(RuntimeConfig::default())?;
//! let x = Tensor::from_f64_slice(&[1.0, 0.0, 0.0], 3usize, DType::F32, Device::Cpu)?;
//! let y = Tensor::from_f64_slice(&[0.0, 1.0, 0.0], 3usize, DType::F32, Device::Cpu)?;
//! let z = ops::cross(&rt, &mut Eager, &x, &y, None)?;
//! assert_eq!(z.to_f64_vec()?, vec![0.0, 0.0, 1.0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `vole-core` | Descriptors, DType, Shape, normalizer, inference, kernel registry |
//! | `vole-cpu` | CPU kernels for every operator and dtype, rayon parallelism |
//! | `vole` | Runtime, eager and graph modes, executor, gradient rules |
//!
//! ## Modules
//!
//! - [`runtime`] — RuntimeConfig, RuntimeBuilder, Runtime::apply / backward
//! - [`mode`] — the ExecutionMode trait and the Eager mode
//! - [`graph`] — deferred mode: values and operator nodes in an arena
//! - [`exec`] — Executor that runs a Graph on concrete tensors
//! - [`grad`] — gradient rule registry and built-in rules
//! - [`ops`] — cross, concat, slice, conj

/// Re-export core types.
pub use vole_core::{
    normalize::resolve_axis, AttrValue, Attributes, DType, Device, DeviceKind, Element, Error,
    Kernel, KernelKey, KernelRegistry, OpCall, OpKind, Result, Shape, Tensor, TensorDesc,
};

/// Re-export the CPU kernel registration.
pub use vole_cpu::{register_kernels as register_cpu_kernels, CpuConfig};

pub mod exec;
pub mod grad;
pub mod graph;
pub mod mode;
pub mod ops;
pub mod runtime;

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::exec::{ExecResult, Executor};
    pub use crate::grad::{GradRegistry, GradientRule};
    pub use crate::graph::{Graph, ValueId};
    pub use crate::mode::{Eager, ExecutionMode};
    pub use crate::ops;
    pub use crate::runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
    pub use crate::{Attributes, DType, Device, Error, OpKind, Result, Shape, Tensor, TensorDesc};
}
