// Runtime — The registries every call is resolved against
//
// A Runtime owns the kernel registry and the gradient rule registry. It is
// built once, through RuntimeBuilder, and is read-only afterwards: there is
// no `&mut self` method on Runtime, so registration cannot interleave with
// dispatch. Share it by reference (or Arc) with every thread that runs ops.
//
// USAGE:
//   let rt = Runtime::new(RuntimeConfig::default())?;
//   let mut eager = Eager;
//   let z = ops::cross(&rt, &mut eager, &x, &y, Some(1))?;

use std::sync::Arc;

use vole_core::{
    Attributes, DType, Device, Kernel, KernelKey, KernelRegistry, OpCall, OpKind, Result, Shape,
    TensorDesc,
};
use vole_cpu::CpuConfig;

use crate::grad::{GradRegistry, GradientRule};
use crate::mode::ExecutionMode;

/// Runtime configuration: defaults for new descriptors and executor checks.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Element type used by [`RuntimeConfig::desc`] (default: F32).
    pub default_dtype: DType,
    /// Placement used by [`RuntimeConfig::desc`] (default: CPU).
    pub default_device: Device,
    /// Whether the executor checks feeds against declared graph inputs.
    pub validate_feeds: bool,
    /// Element count from which CPU cross kernels run in parallel.
    pub parallel_threshold: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_dtype: DType::F32,
            default_device: Device::Cpu,
            validate_feeds: true,
            parallel_threshold: CpuConfig::default().parallel_threshold,
        }
    }
}

impl RuntimeConfig {
    /// Set default dtype.
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.default_dtype = dtype;
        self
    }

    /// Set default device.
    pub fn with_device(mut self, device: Device) -> Self {
        self.default_device = device;
        self
    }

    pub fn with_feed_validation(mut self, validate: bool) -> Self {
        self.validate_feeds = validate;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Descriptor with the default dtype and device.
    pub fn desc(&self, shape: impl Into<Shape>) -> TensorDesc {
        TensorDesc::new(shape, self.default_dtype, self.default_device)
    }
}

/// Collects registrations, then freezes them into a [`Runtime`].
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    kernels: KernelRegistry,
    grads: GradRegistry,
}

impl RuntimeBuilder {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            kernels: KernelRegistry::new(),
            grads: GradRegistry::new(),
        }
    }

    /// Install the CPU kernels for every operator and dtype.
    pub fn with_cpu_kernels(mut self) -> Result<Self> {
        let cpu = CpuConfig {
            parallel_threshold: self.config.parallel_threshold,
        };
        vole_cpu::register_kernels(&mut self.kernels, &cpu)?;
        Ok(self)
    }

    /// Install the gradient rules of the built-in operators.
    pub fn with_builtin_gradients(mut self) -> Result<Self> {
        self.grads.register_builtin()?;
        Ok(self)
    }

    pub fn register_kernel(mut self, key: KernelKey, kernel: Arc<dyn Kernel>) -> Result<Self> {
        self.kernels.register(key, kernel)?;
        Ok(self)
    }

    pub fn register_gradient(mut self, op: OpKind, rule: GradientRule) -> Result<Self> {
        self.grads.register(op, rule)?;
        Ok(self)
    }

    pub fn build(self) -> Runtime {
        log::debug!(
            "runtime ready: {} kernels, {} gradient rules",
            self.kernels.len(),
            self.grads.len()
        );
        Runtime {
            config: self.config,
            kernels: self.kernels,
            grads: self.grads,
        }
    }
}

/// Frozen kernel and gradient tables plus configuration.
#[derive(Debug)]
pub struct Runtime {
    config: RuntimeConfig,
    kernels: KernelRegistry,
    grads: GradRegistry,
}

impl Runtime {
    /// A runtime with CPU kernels and built-in gradient rules.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        Ok(RuntimeBuilder::new(config)
            .with_cpu_kernels()?
            .with_builtin_gradients()?
            .build())
    }

    pub fn builder(config: RuntimeConfig) -> RuntimeBuilder {
        RuntimeBuilder::new(config)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn kernels(&self) -> &KernelRegistry {
        &self.kernels
    }

    pub fn gradients(&self) -> &GradRegistry {
        &self.grads
    }

    /// Run `op` through the pipeline: describe → normalize → infer → mode.
    ///
    /// Every error before the mode is reached is an input error and nothing
    /// has been executed or recorded when it is returned.
    pub fn apply<M: ExecutionMode>(
        &self,
        mode: &mut M,
        op: OpKind,
        inputs: &[M::Value],
        attrs: Attributes,
    ) -> Result<Vec<M::Value>> {
        let descs = inputs
            .iter()
            .map(|v| mode.describe(v))
            .collect::<Result<Vec<_>>>()?;
        let call = OpCall::prepare(op, descs, attrs)?;
        mode.run(self, call, inputs)
    }

    /// Input gradients of one `op` call from its upstream gradient.
    ///
    /// `saved` are the forward inputs, `attrs` the forward attributes (raw
    /// or normalized). The rule re-enters [`Runtime::apply`] in the same
    /// mode, so in graph mode the gradient is recorded as further nodes.
    pub fn backward<M: ExecutionMode>(
        &self,
        mode: &mut M,
        op: OpKind,
        saved: &[M::Value],
        grad: &M::Value,
        attrs: &Attributes,
    ) -> Result<Vec<M::Value>> {
        let rule = self.grads.get(op)?;
        log::trace!("backward {} attrs={}", op, attrs);
        (M::gradient_fn(rule))(self, mode, saved, grad, attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vole_core::DeviceKind;

    #[test]
    fn test_default_runtime_tables() {
        let rt = Runtime::new(RuntimeConfig::default()).unwrap();
        assert!(rt
            .kernels()
            .contains(&KernelKey::new(OpKind::Cross, DeviceKind::Cpu, DType::BF16)));
        assert!(rt.gradients().contains(OpKind::Cross));
        assert!(rt.gradients().contains(OpKind::Slice));
    }

    #[test]
    fn test_empty_builder() {
        let rt = Runtime::builder(RuntimeConfig::default()).build();
        assert!(rt.kernels().is_empty());
        assert!(rt.gradients().is_empty());
    }

    #[test]
    fn test_config_builder() {
        let cfg = RuntimeConfig::default()
            .with_dtype(DType::F64)
            .with_device(Device::Cuda(1))
            .with_feed_validation(false)
            .with_parallel_threshold(8);
        assert_eq!(cfg.desc((2, 3)), TensorDesc::new((2, 3), DType::F64, Device::Cuda(1)));
        assert!(!cfg.validate_feeds);
        assert_eq!(cfg.parallel_threshold, 8);
    }
}
