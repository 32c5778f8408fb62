// Kernel — Registry of compute routines and the dispatcher over it
//
// A kernel is registered under a KernelKey (operator, device kind, dtype)
// and must satisfy its operator's contract: given inputs that passed
// inference and the normalized attributes, produce tensors matching the
// inferred output descriptors.
//
// LIFECYCLE:
//
//   1. At start-up the registry is built with `&mut` access and filled.
//   2. It is then frozen inside a runtime and only ever read through `&`.
//
// Because the table is never mutated after step 1, concurrent dispatch
// needs no lock; `Kernel: Send + Sync` is all that is required for the
// registry to be shared between threads.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::attrs::Attributes;
use crate::desc::TensorDesc;
use crate::device::{Device, DeviceKind};
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::op::{OpCall, OpKind};
use crate::tensor::Tensor;

/// Lookup key of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelKey {
    pub op: OpKind,
    pub device: DeviceKind,
    pub dtype: DType,
}

impl KernelKey {
    pub fn new(op: OpKind, device: DeviceKind, dtype: DType) -> Self {
        Self { op, device, dtype }
    }
}

impl fmt::Display for KernelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.op, self.device, self.dtype)
    }
}

/// A device- and dtype-specific compute routine.
///
/// `outputs` are the inferred output descriptors; a kernel allocates one
/// tensor per descriptor. Attributes are already canonical, so a kernel
/// reads `axis` as a non-negative index and never re-derives it.
pub trait Kernel: Send + Sync {
    fn launch(
        &self,
        inputs: &[&Tensor],
        attrs: &Attributes,
        outputs: &[TensorDesc],
    ) -> Result<Vec<Tensor>>;
}

impl<F> Kernel for F
where
    F: Fn(&[&Tensor], &Attributes, &[TensorDesc]) -> Result<Vec<Tensor>> + Send + Sync,
{
    fn launch(
        &self,
        inputs: &[&Tensor],
        attrs: &Attributes,
        outputs: &[TensorDesc],
    ) -> Result<Vec<Tensor>> {
        self(inputs, attrs, outputs)
    }
}

/// Map from kernel key to routine.
#[derive(Default, Clone)]
pub struct KernelRegistry {
    kernels: HashMap<KernelKey, Arc<dyn Kernel>>,
}

impl fmt::Debug for KernelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelRegistry")
            .field("kernels", &self.keys())
            .finish()
    }
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a kernel. Fails if the key is already taken.
    pub fn register(&mut self, key: KernelKey, kernel: Arc<dyn Kernel>) -> Result<()> {
        if self.kernels.contains_key(&key) {
            return Err(Error::DuplicateRegistration(format!("kernel {}", key)));
        }
        log::debug!("registered kernel {}", key);
        self.kernels.insert(key, kernel);
        Ok(())
    }

    /// Register one routine for several dtypes at once.
    pub fn register_for(
        &mut self,
        op: OpKind,
        device: DeviceKind,
        dtypes: &[DType],
        kernel: Arc<dyn Kernel>,
    ) -> Result<()> {
        for &dtype in dtypes {
            self.register(KernelKey::new(op, device, dtype), Arc::clone(&kernel))?;
        }
        Ok(())
    }

    pub fn contains(&self, key: &KernelKey) -> bool {
        self.kernels.contains_key(key)
    }

    pub fn get(&self, key: &KernelKey) -> Result<&dyn Kernel> {
        self.kernels
            .get(key)
            .map(|k| k.as_ref())
            .ok_or(Error::UnsupportedKernel(*key))
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<KernelKey> {
        let mut keys: Vec<KernelKey> = self.kernels.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Look up the exact key and run it.
    ///
    /// No validation happens here; `inputs` must have passed inference.
    pub fn dispatch(
        &self,
        op: OpKind,
        device: Device,
        dtype: DType,
        inputs: &[&Tensor],
        attrs: &Attributes,
        outputs: &[TensorDesc],
    ) -> Result<Vec<Tensor>> {
        let key = KernelKey::new(op, device.kind(), dtype);
        let kernel = self.get(&key)?;
        log::trace!("dispatch {} on {} attrs={}", key, device, attrs);
        kernel.launch(inputs, attrs, outputs)
    }

    /// Dispatch a prepared call.
    pub fn dispatch_call(&self, call: &OpCall, inputs: &[&Tensor]) -> Result<Vec<Tensor>> {
        self.dispatch(
            call.op,
            call.device(),
            call.dtype(),
            inputs,
            &call.attrs,
            &call.outputs,
        )
    }
}
