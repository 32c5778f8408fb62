// Kernels — Typed CPU routines behind the registered kernels
//
// Every routine works on contiguous row-major buffers and views its shape
// as (outer, axis, inner) around the operation axis (see Shape::split_at_axis).
// Shapes and bounds were checked by inference, so these functions only
// index.

use rayon::prelude::*;
use vole_core::{Element, Shape};

/// Cross product of 3-vectors laid out along `axis`.
///
/// For each position, with `a = x[.., 0..3, ..]` and `b = y[.., 0..3, ..]`:
///
///   out0 = a1*b2 - a2*b1
///   out1 = a2*b0 - a0*b2
///   out2 = a0*b1 - a1*b0
///
/// The products are taken in `T::Acc`, so complex inputs use complex
/// multiplication and half inputs are computed in f32 and rounded once.
/// Outer blocks are split across rayon once the tensor holds at least
/// `parallel_threshold` elements.
pub fn cross<T: Element>(
    x: &[T],
    y: &[T],
    shape: &Shape,
    axis: usize,
    parallel_threshold: usize,
) -> Vec<T> {
    let mut out = vec![T::zero(); x.len()];
    if out.is_empty() {
        return out;
    }
    let (_, _, inner) = shape.split_at_axis(axis);
    let block = 3 * inner;

    let compute = |(o, chunk): (usize, &mut [T])| {
        let base = o * block;
        for i in 0..inner {
            let at = |v: &[T], k: usize| v[base + k * inner + i].to_acc();
            let (a0, a1, a2) = (at(x, 0), at(x, 1), at(x, 2));
            let (b0, b1, b2) = (at(y, 0), at(y, 1), at(y, 2));
            chunk[i] = T::from_acc(a1 * b2 - a2 * b1);
            chunk[inner + i] = T::from_acc(a2 * b0 - a0 * b2);
            chunk[2 * inner + i] = T::from_acc(a0 * b1 - a1 * b0);
        }
    };

    if x.len() >= parallel_threshold {
        out.par_chunks_mut(block).enumerate().for_each(compute);
    } else {
        out.chunks_mut(block).enumerate().for_each(compute);
    }
    out
}

/// Concatenate buffers along `axis`. `out_shape` is the inferred output shape.
pub fn concat<T: Element>(parts: &[(&[T], &Shape)], axis: usize, out_shape: &Shape) -> Vec<T> {
    let (outer, _, inner) = out_shape.split_at_axis(axis);
    let mut out = Vec::with_capacity(out_shape.elem_count());
    for o in 0..outer {
        for (data, shape) in parts {
            let block = shape.dims()[axis] * inner;
            out.extend_from_slice(&data[o * block..(o + 1) * block]);
        }
    }
    out
}

/// Elements `[start, end)` along `axis`.
pub fn slice<T: Element>(x: &[T], shape: &Shape, axis: usize, start: usize, end: usize) -> Vec<T> {
    let (outer, len, inner) = shape.split_at_axis(axis);
    let mut out = Vec::with_capacity(outer * (end - start) * inner);
    for o in 0..outer {
        let base = o * len * inner;
        out.extend_from_slice(&x[base + start * inner..base + end * inner]);
    }
    out
}

pub fn conj<T: Element>(x: &[T]) -> Vec<T> {
    x.iter().map(|v| v.conj()).collect()
}
