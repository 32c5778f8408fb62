// Normalize — Turn user attributes into canonical, bounds-checked form
//
// Users may write `axis=-1`, omit the axis, or give slice bounds counted
// from the end. Every downstream stage (inference, kernels, gradient rules)
// only ever sees the canonical form:
//
//   - axes are non-negative and < rank
//   - cross always carries an explicit axis
//   - slice always carries non-negative start <= end <= axis length
//
// Normalizing a canonical attribute set is a no-op, which is what lets
// gradient rules forward already-normalized attributes into new calls.

use crate::attrs::{AttrValue, Attributes};
use crate::desc::TensorDesc;
use crate::error::{Error, Result};
use crate::op::OpKind;

/// Resolve a possibly negative axis against `rank`.
///
/// `axis' = axis + rank` when `axis < 0`; the result must lie in `[0, rank)`.
pub fn resolve_axis(axis: i64, rank: usize) -> Result<usize> {
    let resolved = if axis < 0 { axis + rank as i64 } else { axis };
    if resolved < 0 || resolved >= rank as i64 {
        return Err(Error::InvalidAxis { axis, rank });
    }
    Ok(resolved as usize)
}

/// Canonicalize `attrs` for a call of `op` on `inputs`.
pub fn normalize(op: OpKind, inputs: &[TensorDesc], mut attrs: Attributes) -> Result<Attributes> {
    match op {
        OpKind::Cross => {
            let x = first_input(op, inputs)?;
            let axis = match attrs.get_int("axis")? {
                Some(axis) => resolve_axis(axis, x.rank())?,
                None => x
                    .shape()
                    .first_axis_of_len(3)
                    .ok_or_else(|| Error::NoSizeThreeAxis {
                        shape: x.shape().clone(),
                    })?,
            };
            attrs.set("axis", AttrValue::Int(axis as i64));
        }
        OpKind::Concat => {
            let x = first_input(op, inputs)?;
            let axis = resolve_axis(attrs.get_int("axis")?.unwrap_or(0), x.rank())?;
            attrs.set("axis", AttrValue::Int(axis as i64));
        }
        OpKind::Slice => {
            let x = first_input(op, inputs)?;
            let raw_axis = attrs.get_int("axis")?.ok_or_else(|| Error::MissingAttribute {
                op,
                name: "axis".to_string(),
            })?;
            let axis = resolve_axis(raw_axis, x.rank())?;
            let len = x.dims()[axis];
            let raw_start = attrs.get_int("start")?.unwrap_or(0);
            let raw_end = attrs.get_int("end")?.unwrap_or(len as i64);
            let start = resolve_bound(raw_start, len);
            let end = resolve_bound(raw_end, len);
            if start < 0 || end < start || end > len as i64 {
                return Err(Error::SliceOutOfBounds {
                    axis,
                    start: raw_start,
                    end: raw_end,
                    len,
                });
            }
            attrs.set("axis", AttrValue::Int(axis as i64));
            attrs.set("start", AttrValue::Int(start));
            attrs.set("end", AttrValue::Int(end));
        }
        OpKind::Conj => {}
    }
    Ok(attrs)
}

fn resolve_bound(bound: i64, len: usize) -> i64 {
    if bound < 0 {
        bound + len as i64
    } else {
        bound
    }
}

fn first_input(op: OpKind, inputs: &[TensorDesc]) -> Result<&TensorDesc> {
    inputs.first().ok_or_else(|| Error::Arity {
        op,
        expected: "at least 1".to_string(),
        got: 0,
    })
}
