//! # vole-cpu
//!
//! CPU kernels for the vole operator set.
//!
//! [`register_kernels`] installs one kernel per (operator, dtype) pair for
//! every operator in [`OpKind`] and every dtype in [`DType::ALL`]. Each
//! kernel is the same generic routine from [`kernels`] instantiated for a
//! concrete element type.

pub mod kernels;

use std::sync::Arc;

use half::{bf16, f16};
use num_complex::{Complex32, Complex64};
use vole_core::{
    Attributes, DeviceKind, Element, Error, KernelKey, KernelRegistry, OpKind, Result, Tensor,
    TensorDesc,
};

/// Tuning knobs for the CPU kernels.
#[derive(Debug, Clone)]
pub struct CpuConfig {
    /// Element count from which cross products are split across threads.
    pub parallel_threshold: usize,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 1 << 15,
        }
    }
}

/// Register every CPU kernel into `registry`.
pub fn register_kernels(registry: &mut KernelRegistry, config: &CpuConfig) -> Result<()> {
    register_typed::<f16>(registry, config)?;
    register_typed::<bf16>(registry, config)?;
    register_typed::<f32>(registry, config)?;
    register_typed::<f64>(registry, config)?;
    register_typed::<Complex32>(registry, config)?;
    register_typed::<Complex64>(registry, config)?;
    log::debug!("cpu kernels ready ({} total)", registry.len());
    Ok(())
}

fn register_typed<T: Element>(registry: &mut KernelRegistry, config: &CpuConfig) -> Result<()> {
    let key = |op| KernelKey::new(op, DeviceKind::Cpu, T::DTYPE);
    let threshold = config.parallel_threshold;

    registry.register(
        key(OpKind::Cross),
        Arc::new(
            move |inputs: &[&Tensor], attrs: &Attributes, outputs: &[TensorDesc]| -> Result<Vec<Tensor>> {
                let (x, y) = (input(inputs, 0)?, input(inputs, 1)?);
                let axis = index_attr(attrs, "axis")?;
                let data = kernels::cross(typed::<T>(x)?, typed::<T>(y)?, x.shape(), axis, threshold);
                single_output::<T>(data, outputs)
            },
        ),
    )?;

    registry.register(
        key(OpKind::Concat),
        Arc::new(
            |inputs: &[&Tensor], attrs: &Attributes, outputs: &[TensorDesc]| -> Result<Vec<Tensor>> {
                let axis = index_attr(attrs, "axis")?;
                let out = output(outputs)?;
                let parts = inputs
                    .iter()
                    .map(|t| typed::<T>(t).map(|data| (data, t.shape())))
                    .collect::<Result<Vec<_>>>()?;
                single_output::<T>(kernels::concat(&parts, axis, out.shape()), outputs)
            },
        ),
    )?;

    registry.register(
        key(OpKind::Slice),
        Arc::new(
            |inputs: &[&Tensor], attrs: &Attributes, outputs: &[TensorDesc]| -> Result<Vec<Tensor>> {
                let x = input(inputs, 0)?;
                let axis = index_attr(attrs, "axis")?;
                let start = index_attr(attrs, "start")?;
                let end = index_attr(attrs, "end")?;
                let data = kernels::slice(typed::<T>(x)?, x.shape(), axis, start, end);
                single_output::<T>(data, outputs)
            },
        ),
    )?;

    registry.register(
        key(OpKind::Conj),
        Arc::new(
            |inputs: &[&Tensor], _attrs: &Attributes, outputs: &[TensorDesc]| -> Result<Vec<Tensor>> {
                let x = input(inputs, 0)?;
                single_output::<T>(kernels::conj(typed::<T>(x)?), outputs)
            },
        ),
    )?;

    Ok(())
}

fn input<'a>(inputs: &[&'a Tensor], i: usize) -> Result<&'a Tensor> {
    inputs
        .get(i)
        .copied()
        .ok_or_else(|| Error::msg(format!("kernel expected input #{i}, got {}", inputs.len())))
}

fn output(outputs: &[TensorDesc]) -> Result<&TensorDesc> {
    outputs
        .first()
        .ok_or_else(|| Error::msg("kernel called without an output descriptor"))
}

fn typed<T: Element>(t: &Tensor) -> Result<&[T]> {
    t.storage().as_slice::<T>().ok_or(Error::DtypeMismatch {
        expected: T::DTYPE,
        got: t.dtype(),
    })
}

fn index_attr(attrs: &Attributes, name: &str) -> Result<usize> {
    match attrs.get_int(name)? {
        Some(v) if v >= 0 => Ok(v as usize),
        _ => Err(Error::AttributeType {
            name: name.to_string(),
            expected: "a normalized non-negative integer",
        }),
    }
}

fn single_output<T: Element>(data: Vec<T>, outputs: &[TensorDesc]) -> Result<Vec<Tensor>> {
    let desc = output(outputs)?.clone();
    Ok(vec![Tensor::from_storage(T::into_storage(data), desc)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use vole_core::DType;

    #[test]
    fn test_every_op_and_dtype_registered() {
        let mut reg = KernelRegistry::new();
        register_kernels(&mut reg, &CpuConfig::default()).unwrap();
        for op in [OpKind::Cross, OpKind::Concat, OpKind::Slice, OpKind::Conj] {
            for dtype in DType::ALL {
                assert!(reg.contains(&KernelKey::new(op, DeviceKind::Cpu, dtype)));
                assert!(!reg.contains(&KernelKey::new(op, DeviceKind::Cuda, dtype)));
            }
        }
        assert_eq!(reg.len(), 4 * DType::ALL.len());
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut reg = KernelRegistry::new();
        register_kernels(&mut reg, &CpuConfig::default()).unwrap();
        let err = register_kernels(&mut reg, &CpuConfig::default()).unwrap_err();
        assert!(matches!(err, Error::DuplicateRegistration(_)));
    }
}
