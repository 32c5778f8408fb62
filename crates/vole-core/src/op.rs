// Op — Operator identity and the shared front half of every call
//
// Whether a call runs now (eager) or is recorded for later (graph), it goes
// through the same two pure stages before anything else happens:
//
//   raw attrs ──normalize──▶ canonical attrs ──infer──▶ output descriptors
//
// The result is an OpCall. Eager mode hands it straight to the kernel
// dispatcher; graph mode stores it in an operator node. Because both modes
// build the OpCall with the same function, their output descriptors agree
// by construction.

use std::fmt;

use crate::attrs::Attributes;
use crate::desc::TensorDesc;
use crate::device::Device;
use crate::dtype::DType;
use crate::error::Result;
use crate::{infer, normalize};

/// The operators known to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    /// 3-vector cross product along one axis.
    Cross,
    /// Join tensors along an existing axis.
    Concat,
    /// Contiguous range `[start, end)` of one axis.
    Slice,
    /// Complex conjugate (identity on real dtypes).
    Conj,
}

impl OpKind {
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Cross => "cross",
            OpKind::Concat => "concat",
            OpKind::Slice => "slice",
            OpKind::Conj => "conj",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated operator call: canonical attributes and inferred outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct OpCall {
    pub op: OpKind,
    pub inputs: Vec<TensorDesc>,
    pub attrs: Attributes,
    pub outputs: Vec<TensorDesc>,
}

impl OpCall {
    /// Normalize then infer. Nothing is executed.
    pub fn prepare(op: OpKind, inputs: Vec<TensorDesc>, attrs: Attributes) -> Result<Self> {
        let attrs = normalize::normalize(op, &inputs, attrs)?;
        let outputs = infer::infer(op, &inputs, &attrs)?;
        Ok(Self {
            op,
            inputs,
            attrs,
            outputs,
        })
    }

    /// Device the kernel runs on: the common input device.
    pub fn device(&self) -> Device {
        self.inputs
            .first()
            .or_else(|| self.outputs.first())
            .map(|d| d.device())
            .unwrap_or_default()
    }

    /// Element type that selects the kernel: the common input dtype.
    pub fn dtype(&self) -> DType {
        self.inputs
            .first()
            .or_else(|| self.outputs.first())
            .map(|d| d.dtype())
            .unwrap_or(DType::F32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_resolves_axis() {
        let x = TensorDesc::new((3, 3), DType::F32, Device::Cpu);
        let call = OpCall::prepare(
            OpKind::Cross,
            vec![x.clone(), x.clone()],
            Attributes::new().int("axis", -2),
        )
        .unwrap();
        assert_eq!(call.attrs.get_int("axis").unwrap(), Some(0));
        assert_eq!(call.outputs, vec![x]);
        assert_eq!(call.device(), Device::Cpu);
        assert_eq!(call.dtype(), DType::F32);
    }

    #[test]
    fn test_names() {
        assert_eq!(OpKind::Cross.to_string(), "cross");
        assert_eq!(OpKind::Concat.name(), "concat");
    }
}
