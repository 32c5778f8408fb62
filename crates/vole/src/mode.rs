// Mode — The two drivers behind Runtime::apply
//
// Runtime::apply does the shared part of a call (describe the inputs,
// normalize, infer) and hands the resulting OpCall to an ExecutionMode:
//
//   Eager — dispatches the kernel now and returns tensors
//   Graph — records an operator node and returns value handles
//
// Gradient rules are written once, generically over the mode, and stored
// as one function pointer per mode (see GradientRule). `gradient_fn` picks
// the pointer that matches the mode a backward call runs in.

use vole_core::{OpCall, Result, Tensor, TensorDesc};

use crate::grad::{GradFn, GradientRule};
use crate::runtime::Runtime;

/// A way of carrying out prepared operator calls.
pub trait ExecutionMode: Sized {
    /// What a call produces: a tensor, or a handle to a future tensor.
    type Value: Clone;

    /// Descriptor of a value of this mode.
    fn describe(&self, value: &Self::Value) -> Result<TensorDesc>;

    /// Carry out a call that already passed normalization and inference.
    fn run(&mut self, runtime: &Runtime, call: OpCall, inputs: &[Self::Value])
        -> Result<Vec<Self::Value>>;

    /// A zero-filled value, used by gradient rules that pad.
    fn zeros(&mut self, desc: TensorDesc) -> Result<Self::Value>;

    /// The gradient function of `rule` for this mode.
    fn gradient_fn(rule: &GradientRule) -> GradFn<Self>;
}

/// Execute-now mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eager;

impl ExecutionMode for Eager {
    type Value = Tensor;

    fn describe(&self, value: &Tensor) -> Result<TensorDesc> {
        Ok(value.desc().clone())
    }

    fn run(&mut self, runtime: &Runtime, call: OpCall, inputs: &[Tensor]) -> Result<Vec<Tensor>> {
        let refs: Vec<&Tensor> = inputs.iter().collect();
        runtime.kernels().dispatch_call(&call, &refs)
    }

    fn zeros(&mut self, desc: TensorDesc) -> Result<Tensor> {
        Ok(Tensor::zeros(desc))
    }

    fn gradient_fn(rule: &GradientRule) -> GradFn<Self> {
        rule.eager
    }
}
