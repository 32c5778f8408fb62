// Infer — Output descriptors from input descriptors, without data
//
// Inference is the only place operands are validated. Kernels trust what
// reaches them, so every shape, dtype and placement rule an operator has is
// enforced here, and in graph mode that means malformed graphs are rejected
// while they are being built.
//
// Attributes must already be normalized (see `normalize`).

use crate::attrs::Attributes;
use crate::desc::TensorDesc;
use crate::error::{Error, Result};
use crate::op::OpKind;

/// Compute the output descriptors of `op` applied to `inputs`.
pub fn infer(op: OpKind, inputs: &[TensorDesc], attrs: &Attributes) -> Result<Vec<TensorDesc>> {
    match op {
        OpKind::Cross => infer_cross(inputs, attrs),
        OpKind::Concat => infer_concat(inputs, attrs),
        OpKind::Slice => infer_slice(inputs, attrs),
        OpKind::Conj => {
            expect_arity(op, inputs, 1)?;
            Ok(vec![inputs[0].clone()])
        }
    }
}

fn infer_cross(inputs: &[TensorDesc], attrs: &Attributes) -> Result<Vec<TensorDesc>> {
    expect_arity(OpKind::Cross, inputs, 2)?;
    let (x, y) = (&inputs[0], &inputs[1]);
    let axis = canonical_axis(OpKind::Cross, attrs, x.rank())?;

    if x.shape() != y.shape() {
        return Err(Error::ShapeMismatch {
            expected: x.shape().clone(),
            got: y.shape().clone(),
        });
    }
    // x and y share a shape past this point, so checking x covers both.
    if x.dims()[axis] != 3 {
        return Err(Error::AxisLength {
            axis,
            expected: 3,
            got: x.dims()[axis],
        });
    }
    same_dtype_and_device(x, y)?;
    Ok(vec![x.clone()])
}

fn infer_concat(inputs: &[TensorDesc], attrs: &Attributes) -> Result<Vec<TensorDesc>> {
    if inputs.is_empty() {
        return Err(Error::Arity {
            op: OpKind::Concat,
            expected: "at least 1".to_string(),
            got: 0,
        });
    }
    let first = &inputs[0];
    let axis = canonical_axis(OpKind::Concat, attrs, first.rank())?;

    let mut total = 0usize;
    for t in inputs {
        if t.rank() != first.rank()
            || t
                .dims()
                .iter()
                .zip(first.dims())
                .enumerate()
                .any(|(d, (a, b))| d != axis && a != b)
        {
            return Err(Error::ShapeMismatch {
                expected: first.shape().with_dim(axis, t.dims().get(axis).copied().unwrap_or(0)),
                got: t.shape().clone(),
            });
        }
        same_dtype_and_device(first, t)?;
        total += t.dims()[axis];
    }
    Ok(vec![first.with_shape(first.shape().with_dim(axis, total))])
}

fn infer_slice(inputs: &[TensorDesc], attrs: &Attributes) -> Result<Vec<TensorDesc>> {
    expect_arity(OpKind::Slice, inputs, 1)?;
    let x = &inputs[0];
    let axis = canonical_axis(OpKind::Slice, attrs, x.rank())?;
    let start = required_int(OpKind::Slice, attrs, "start")?;
    let end = required_int(OpKind::Slice, attrs, "end")?;
    let len = x.dims()[axis];
    if start < 0 || end < start || end > len as i64 {
        return Err(Error::SliceOutOfBounds {
            axis,
            start,
            end,
            len,
        });
    }
    Ok(vec![x.with_shape(x.shape().with_dim(axis, (end - start) as usize))])
}

fn expect_arity(op: OpKind, inputs: &[TensorDesc], n: usize) -> Result<()> {
    if inputs.len() != n {
        return Err(Error::Arity {
            op,
            expected: n.to_string(),
            got: inputs.len(),
        });
    }
    Ok(())
}

fn same_dtype_and_device(expected: &TensorDesc, got: &TensorDesc) -> Result<()> {
    if expected.dtype() != got.dtype() {
        return Err(Error::DtypeMismatch {
            expected: expected.dtype(),
            got: got.dtype(),
        });
    }
    if expected.device() != got.device() {
        return Err(Error::DevicePlacement {
            expected: expected.device(),
            got: got.device(),
        });
    }
    Ok(())
}

fn required_int(op: OpKind, attrs: &Attributes, name: &str) -> Result<i64> {
    attrs.get_int(name)?.ok_or_else(|| Error::MissingAttribute {
        op,
        name: name.to_string(),
    })
}

/// The normalized axis. Negative values here mean normalization was skipped.
fn canonical_axis(op: OpKind, attrs: &Attributes, rank: usize) -> Result<usize> {
    let axis = required_int(op, attrs, "axis")?;
    if axis < 0 || axis as usize >= rank {
        return Err(Error::InvalidAxis { axis, rank });
    }
    Ok(axis as usize)
}
