// Graph — Deferred execution mode
//
// In graph mode a call is validated exactly like an eager call, but instead
// of running a kernel it appends an OperatorNode to an arena and returns
// handles (ValueId) to the node's not-yet-computed outputs.
//
// STORAGE:
//
//   values: Vec<ValueInfo>      — every value: feeds, constants, node outputs
//   nodes:  Vec<OperatorNode>   — in insertion order
//
// Nodes refer to values, and values to their producing node, by index only.
// Nothing in the arena owns anything else, so gradient nodes that point
// back at forward values never form reference cycles; dropping the Graph
// drops everything at once.
//
// A node's inputs must exist before it is appended, so insertion order is
// already a topological order and the executor can walk `nodes` front to
// back.

use std::collections::HashMap;
use std::fmt;

use vole_core::{Attributes, Error, OpCall, OpKind, Result, TensorDesc};

use crate::grad::{GradFn, GradientRule};
use crate::mode::ExecutionMode;
use crate::runtime::Runtime;

/// Handle to a value in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub(crate) usize);

impl ValueId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Handle to an operator node in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Where a value's data comes from at execution time.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSource {
    /// Supplied by the caller, looked up by the value's name.
    Feed,
    /// Constant tensor filled with one value.
    Fill(f64),
    /// Output `index` of a node.
    Node { node: NodeId, index: usize },
}

/// One entry of the value table.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueInfo {
    pub name: String,
    pub desc: TensorDesc,
    pub source: ValueSource,
}

/// A recorded operator call.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorNode {
    pub op: OpKind,
    pub inputs: Vec<ValueId>,
    /// Normalized attributes.
    pub attrs: Attributes,
    pub outputs: Vec<ValueId>,
}

/// Arena of values and operator nodes.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    values: Vec<ValueInfo>,
    nodes: Vec<OperatorNode>,
    feeds: Vec<ValueId>,
    names: HashMap<String, ValueId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a value the caller will feed at execution time.
    pub fn input(&mut self, name: &str, desc: TensorDesc) -> Result<ValueId> {
        if self.names.contains_key(name) {
            return Err(Error::DuplicateRegistration(format!("graph value '{}'", name)));
        }
        let id = self.push_value(name.to_string(), desc, ValueSource::Feed);
        self.feeds.push(id);
        Ok(id)
    }

    /// Declare a constant filled with `value`.
    pub fn fill(&mut self, desc: TensorDesc, value: f64) -> ValueId {
        let name = self.unique_name(format!("fill_{}", self.values.len()));
        self.push_value(name, desc, ValueSource::Fill(value))
    }

    pub fn value(&self, id: ValueId) -> Result<&ValueInfo> {
        self.values.get(id.0).ok_or(Error::UnknownValue(id.0))
    }

    pub fn desc(&self, id: ValueId) -> Result<&TensorDesc> {
        Ok(&self.value(id)?.desc)
    }

    pub fn lookup(&self, name: &str) -> Option<ValueId> {
        self.names.get(name).copied()
    }

    /// The node that produces `id`, if any.
    pub fn producer(&self, id: ValueId) -> Result<Option<&OperatorNode>> {
        Ok(match self.value(id)?.source {
            ValueSource::Node { node, .. } => self.nodes.get(node.0),
            _ => None,
        })
    }

    pub fn node(&self, id: NodeId) -> Option<&OperatorNode> {
        self.nodes.get(id.0)
    }

    /// Nodes in insertion (topological) order.
    pub fn nodes(&self) -> &[OperatorNode] {
        &self.nodes
    }

    pub fn values(&self) -> &[ValueInfo] {
        &self.values
    }

    pub fn feeds(&self) -> &[ValueId] {
        &self.feeds
    }

    fn push_value(&mut self, name: String, desc: TensorDesc, source: ValueSource) -> ValueId {
        let id = ValueId(self.values.len());
        self.names.insert(name.clone(), id);
        self.values.push(ValueInfo { name, desc, source });
        id
    }

    fn unique_name(&self, base: String) -> String {
        if !self.names.contains_key(&base) {
            return base;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl ExecutionMode for Graph {
    type Value = ValueId;

    fn describe(&self, value: &ValueId) -> Result<TensorDesc> {
        self.desc(*value).cloned()
    }

    fn run(&mut self, _runtime: &Runtime, call: OpCall, inputs: &[ValueId]) -> Result<Vec<ValueId>> {
        let node = NodeId(self.nodes.len());
        let base = match call.attrs.name() {
            Some(name) => name.to_string(),
            None => format!("{}_{}", call.op, node.0),
        };
        let outputs: Vec<ValueId> = call
            .outputs
            .iter()
            .enumerate()
            .map(|(index, desc)| {
                let name = self.unique_name(format!("{}.tmp_{}", base, index));
                self.push_value(name, desc.clone(), ValueSource::Node { node, index })
            })
            .collect();
        log::trace!(
            "record node {} {} {:?} -> {:?}",
            node.0,
            call.op,
            inputs,
            outputs
        );
        self.nodes.push(OperatorNode {
            op: call.op,
            inputs: inputs.to_vec(),
            attrs: call.attrs,
            outputs: outputs.clone(),
        });
        Ok(outputs)
    }

    fn zeros(&mut self, desc: TensorDesc) -> Result<ValueId> {
        Ok(self.fill(desc, 0.0))
    }

    fn gradient_fn(rule: &GradientRule) -> GradFn<Self> {
        rule.graph
    }
}
