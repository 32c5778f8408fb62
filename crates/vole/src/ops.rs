// Ops — Functional wrappers over Runtime::apply
//
// Each wrapper builds the attribute set of one operator and returns its
// single output. They are generic over the execution mode, so the same call
// runs a kernel in Eager mode and records a node in Graph mode:
//
//   let z = ops::cross(&rt, &mut Eager, &x, &y, None)?;     // Tensor
//   let z = ops::cross(&rt, &mut graph, &xv, &yv, None)?;   // ValueId
//
// Gradient rules are written with these same wrappers.

use vole_core::{Attributes, Error, OpKind, Result};

use crate::mode::ExecutionMode;
use crate::runtime::Runtime;

/// Cross product of 3-vectors along `axis`.
///
/// With `axis = None` the first axis of length 3 is used. Negative axes
/// count from the end.
pub fn cross<M: ExecutionMode>(
    rt: &Runtime,
    mode: &mut M,
    x: &M::Value,
    y: &M::Value,
    axis: Option<i64>,
) -> Result<M::Value> {
    let mut attrs = Attributes::new();
    if let Some(axis) = axis {
        attrs = attrs.int("axis", axis);
    }
    cross_with(rt, mode, x, y, attrs)
}

/// [`cross`] with a full attribute set (e.g. a named output).
pub fn cross_with<M: ExecutionMode>(
    rt: &Runtime,
    mode: &mut M,
    x: &M::Value,
    y: &M::Value,
    attrs: Attributes,
) -> Result<M::Value> {
    single(
        OpKind::Cross,
        rt.apply(mode, OpKind::Cross, &[x.clone(), y.clone()], attrs)?,
    )
}

/// Join `xs` along `axis`.
pub fn concat<M: ExecutionMode>(
    rt: &Runtime,
    mode: &mut M,
    xs: &[M::Value],
    axis: i64,
) -> Result<M::Value> {
    single(
        OpKind::Concat,
        rt.apply(mode, OpKind::Concat, xs, Attributes::new().int("axis", axis))?,
    )
}

/// Elements `[start, end)` of `axis`. Missing bounds mean the whole axis.
pub fn slice<M: ExecutionMode>(
    rt: &Runtime,
    mode: &mut M,
    x: &M::Value,
    axis: i64,
    start: Option<i64>,
    end: Option<i64>,
) -> Result<M::Value> {
    let mut attrs = Attributes::new().int("axis", axis);
    if let Some(start) = start {
        attrs = attrs.int("start", start);
    }
    if let Some(end) = end {
        attrs = attrs.int("end", end);
    }
    single(
        OpKind::Slice,
        rt.apply(mode, OpKind::Slice, std::slice::from_ref(x), attrs)?,
    )
}

pub fn conj<M: ExecutionMode>(rt: &Runtime, mode: &mut M, x: &M::Value) -> Result<M::Value> {
    single(
        OpKind::Conj,
        rt.apply(mode, OpKind::Conj, std::slice::from_ref(x), Attributes::new())?,
    )
}

fn single<V>(op: OpKind, outputs: Vec<V>) -> Result<V> {
    let n = outputs.len();
    let mut it = outputs.into_iter();
    match (it.next(), it.next()) {
        (Some(v), None) => Ok(v),
        _ => Err(Error::msg(format!("{} produced {} outputs, expected 1", op, n))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Eager;
    use crate::runtime::RuntimeConfig;
    use vole_core::{DType, Device, Tensor};

    fn t(dims: (usize, usize), data: &[f64]) -> Tensor {
        Tensor::from_f64_slice(data, dims, DType::F64, Device::Cpu).unwrap()
    }

    #[test]
    fn test_cross_default_and_explicit_axis() {
        let rt = Runtime::new(RuntimeConfig::default()).unwrap();
        let x = t((3, 3), &[1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
        let y = t((3, 3), &[1.0; 9]);

        let z = cross(&rt, &mut Eager, &x, &y, None).unwrap();
        assert_eq!(
            z.to_f64_vec().unwrap(),
            vec![-1.0, -1.0, -1.0, 2.0, 2.0, 2.0, -1.0, -1.0, -1.0]
        );

        let z = cross(&rt, &mut Eager, &x, &y, Some(1)).unwrap();
        assert_eq!(z.to_f64_vec().unwrap(), vec![0.0; 9]);
    }

    #[test]
    fn test_concat_slice_roundtrip() {
        let rt = Runtime::new(RuntimeConfig::default()).unwrap();
        let a = t((2, 2), &[1.0, 2.0, 3.0, 4.0]);
        let b = t((2, 1), &[5.0, 6.0]);
        let c = concat(&rt, &mut Eager, &[a.clone(), b], -1).unwrap();
        assert_eq!(c.dims(), &[2, 3]);
        let back = slice(&rt, &mut Eager, &c, 1, None, Some(-1)).unwrap();
        assert_eq!(back.to_f64_vec().unwrap(), a.to_f64_vec().unwrap());
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let rt = Runtime::new(RuntimeConfig::default()).unwrap();
        let a = t((2, 2), &[1.0, 2.0, 3.0, 4.0]);
        let err = slice(&rt, &mut Eager, &a, 0, Some(1), Some(5)).unwrap_err();
        assert!(matches!(err, Error::SliceOutOfBounds { .. }));
    }
}
