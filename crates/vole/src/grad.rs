// Grad — Gradient rule registry and the built-in rules
//
// A gradient rule maps (saved forward inputs, upstream gradient, forward
// attributes) to one gradient per forward input. Rules never touch data:
// they are written as forward calls through Runtime::apply, so the same
// rule computes tensors in Eager mode and records gradient nodes in Graph
// mode.
//
// Each rule is one generic function `fn rule<M: ExecutionMode>(..)`. The
// registry stores it instantiated once per mode (`rule::<Eager>`,
// `rule::<Graph>`), and ExecutionMode::gradient_fn picks the matching
// pointer at call time.
//
// GRADIENT RULES:
//
//   cross   z = x × y      dx = cross(conj(y), dz)   dy = cross(dz, conj(x))
//   concat  z = [x0|x1|…]  dxi = slice(dz, axis, offset_i, offset_i + len_i)
//   slice   z = x[s:e]     dx = concat([zeros(s), dz, zeros(len - e)], axis)
//   conj    z = conj(x)    dx = conj(dz)
//
// For real dtypes conj is the identity and is skipped, so the cross rule
// is the textbook pair dx = y × dz, dy = dz × x.

use std::collections::HashMap;
use std::fmt;

use vole_core::infer::infer;
use vole_core::normalize::normalize;
use vole_core::{Attributes, Error, OpKind, Result, TensorDesc};

use crate::graph::Graph;
use crate::mode::{Eager, ExecutionMode};
use crate::ops;
use crate::runtime::Runtime;

/// Gradient function of one operator in mode `M`.
pub type GradFn<M> = fn(
    &Runtime,
    &mut M,
    &[<M as ExecutionMode>::Value],
    &<M as ExecutionMode>::Value,
    &Attributes,
) -> Result<Vec<<M as ExecutionMode>::Value>>;

/// One operator's gradient, instantiated for both execution modes.
#[derive(Clone, Copy)]
pub struct GradientRule {
    pub eager: GradFn<Eager>,
    pub graph: GradFn<Graph>,
}

impl GradientRule {
    pub fn new(eager: GradFn<Eager>, graph: GradFn<Graph>) -> Self {
        Self { eager, graph }
    }
}

impl fmt::Debug for GradientRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GradientRule")
    }
}

/// Build a [`GradientRule`] from a function generic over the mode.
///
/// `gradient_rule!(my_grad)` expands to
/// `GradientRule::new(my_grad::<Eager>, my_grad::<Graph>)`.
#[macro_export]
macro_rules! gradient_rule {
    ($f:ident) => {
        $crate::grad::GradientRule::new($f::<$crate::mode::Eager>, $f::<$crate::graph::Graph>)
    };
}

/// Operator → gradient rule. At most one rule per operator.
#[derive(Default)]
pub struct GradRegistry {
    rules: HashMap<OpKind, GradientRule>,
}

impl GradRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, op: OpKind, rule: GradientRule) -> Result<()> {
        if self.rules.contains_key(&op) {
            return Err(Error::DuplicateRegistration(format!("gradient rule for {}", op)));
        }
        log::debug!("register gradient rule for {}", op);
        self.rules.insert(op, rule);
        Ok(())
    }

    /// Register the rules of every built-in operator.
    pub fn register_builtin(&mut self) -> Result<()> {
        self.register(OpKind::Cross, gradient_rule!(cross_grad))?;
        self.register(OpKind::Concat, gradient_rule!(concat_grad))?;
        self.register(OpKind::Slice, gradient_rule!(slice_grad))?;
        self.register(OpKind::Conj, gradient_rule!(conj_grad))?;
        Ok(())
    }

    pub fn get(&self, op: OpKind) -> Result<&GradientRule> {
        self.rules.get(&op).ok_or(Error::NoGradientRegistered(op))
    }

    pub fn contains(&self, op: OpKind) -> bool {
        self.rules.contains_key(&op)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for GradRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ops: Vec<_> = self.rules.keys().collect();
        ops.sort();
        f.debug_struct("GradRegistry").field("ops", &ops).finish()
    }
}

// ---------------------------------------------------------------------------
// Built-in rules
// ---------------------------------------------------------------------------

pub fn cross_grad<M: ExecutionMode>(
    rt: &Runtime,
    mode: &mut M,
    saved: &[M::Value],
    grad: &M::Value,
    attrs: &Attributes,
) -> Result<Vec<M::Value>> {
    let (x, y) = match saved {
        [x, y] => (x, y),
        _ => return Err(arity(OpKind::Cross, "2", saved.len())),
    };
    let descs = [mode.describe(x)?, mode.describe(y)?];
    let attrs = normalize(OpKind::Cross, &descs, attrs.without_name())?;

    let (x, y) = if descs[0].dtype().is_complex() {
        (ops::conj(rt, mode, x)?, ops::conj(rt, mode, y)?)
    } else {
        (x.clone(), y.clone())
    };
    let dx = ops::cross_with(rt, mode, &y, grad, attrs.clone())?;
    let dy = ops::cross_with(rt, mode, grad, &x, attrs)?;
    Ok(vec![dx, dy])
}

pub fn concat_grad<M: ExecutionMode>(
    rt: &Runtime,
    mode: &mut M,
    saved: &[M::Value],
    grad: &M::Value,
    attrs: &Attributes,
) -> Result<Vec<M::Value>> {
    let descs = saved
        .iter()
        .map(|v| mode.describe(v))
        .collect::<Result<Vec<_>>>()?;
    let attrs = normalize(OpKind::Concat, &descs, attrs.without_name())?;
    let forward = infer(OpKind::Concat, &descs, &attrs)?;
    check_upstream(&forward, &mode.describe(grad)?)?;
    let axis = canonical(OpKind::Concat, &attrs, "axis")?;

    let mut offset = 0i64;
    let mut grads = Vec::with_capacity(saved.len());
    for desc in &descs {
        let len = desc.dims()[axis] as i64;
        grads.push(ops::slice(
            rt,
            mode,
            grad,
            axis as i64,
            Some(offset),
            Some(offset + len),
        )?);
        offset += len;
    }
    Ok(grads)
}

pub fn slice_grad<M: ExecutionMode>(
    rt: &Runtime,
    mode: &mut M,
    saved: &[M::Value],
    grad: &M::Value,
    attrs: &Attributes,
) -> Result<Vec<M::Value>> {
    let x = match saved {
        [x] => x,
        _ => return Err(arity(OpKind::Slice, "1", saved.len())),
    };
    let xd = mode.describe(x)?;
    let attrs = normalize(OpKind::Slice, std::slice::from_ref(&xd), attrs.without_name())?;
    let axis = canonical(OpKind::Slice, &attrs, "axis")?;
    let start = canonical(OpKind::Slice, &attrs, "start")?;
    let end = canonical(OpKind::Slice, &attrs, "end")?;
    let forward = infer(OpKind::Slice, std::slice::from_ref(&xd), &attrs)?;
    let gd = mode.describe(grad)?;
    check_upstream(&forward, &gd)?;
    let len = xd.dims()[axis];

    if start == 0 && end == len {
        return Ok(vec![grad.clone()]);
    }
    let mut parts = Vec::with_capacity(3);
    if start > 0 {
        parts.push(mode.zeros(gd.with_shape(gd.shape().with_dim(axis, start)))?);
    }
    parts.push(grad.clone());
    if end < len {
        parts.push(mode.zeros(gd.with_shape(gd.shape().with_dim(axis, len - end)))?);
    }
    Ok(vec![ops::concat(rt, mode, &parts, axis as i64)?])
}

pub fn conj_grad<M: ExecutionMode>(
    rt: &Runtime,
    mode: &mut M,
    saved: &[M::Value],
    grad: &M::Value,
    _attrs: &Attributes,
) -> Result<Vec<M::Value>> {
    if saved.len() != 1 {
        return Err(arity(OpKind::Conj, "1", saved.len()));
    }
    Ok(vec![ops::conj(rt, mode, grad)?])
}

// The upstream gradient must have the shape the forward call produced.
fn check_upstream(forward: &[TensorDesc], grad: &TensorDesc) -> Result<()> {
    match forward.first() {
        Some(out) if out.shape() != grad.shape() => Err(Error::ShapeMismatch {
            expected: out.shape().clone(),
            got: grad.shape().clone(),
        }),
        _ => Ok(()),
    }
}

fn arity(op: OpKind, expected: &str, got: usize) -> Error {
    Error::Arity {
        op,
        expected: expected.to_string(),
        got,
    }
}

fn canonical(op: OpKind, attrs: &Attributes, name: &str) -> Result<usize> {
    match attrs.get_int(name)? {
        Some(v) if v >= 0 => Ok(v as usize),
        _ => Err(Error::MissingAttribute {
            op,
            name: name.to_string(),
        }),
    }
}
