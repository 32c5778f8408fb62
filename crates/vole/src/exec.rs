// Exec — Run a recorded Graph on concrete tensors
//
// The executor walks the graph's nodes in insertion order (which is a
// topological order) and dispatches each one through the kernel registry:
//
//   1. Feeds: every declared input must be present in the feed map. With
//      validate_feeds on, its shape and dtype must match the declaration.
//   2. Placement: with validate_feeds on, all feeds must share one device
//      (DevicePlacement otherwise) and constants are materialized on it, so
//      no node can meet mixed placements once execution starts.
//   3. Nodes: the call is re-prepared from the materialized input
//      descriptors (attributes are already canonical, so normalization is a
//      no-op) and dispatched on the inputs' device and dtype.
//
// Dispatch keys are taken from the data actually fed, not from the
// descriptors declared at construction. A graph built for the CPU and fed
// with tensors placed elsewhere looks up kernels for that other device and
// fails with UnsupportedKernel if there are none.

use std::collections::HashMap;

use vole_core::{bail, Device, Error, OpCall, Result, Tensor};

use crate::graph::{Graph, OperatorNode, ValueId, ValueSource};
use crate::runtime::Runtime;

/// Tensors produced by one [`Executor::run`], addressable by handle or name.
#[derive(Debug)]
pub struct ExecResult {
    values: Vec<Option<Tensor>>,
    names: HashMap<String, ValueId>,
}

impl ExecResult {
    pub fn get(&self, id: ValueId) -> Option<&Tensor> {
        self.values.get(id.index()).and_then(|v| v.as_ref())
    }

    /// Look a value up by its graph name (e.g. `result.tmp_0`).
    pub fn get_by_name(&self, name: &str) -> Option<&Tensor> {
        self.names.get(name).and_then(|id| self.get(*id))
    }

    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Executes [`Graph`]s against a [`Runtime`]'s kernel table.
pub struct Executor<'r> {
    runtime: &'r Runtime,
}

impl<'r> Executor<'r> {
    pub fn new(runtime: &'r Runtime) -> Self {
        Self { runtime }
    }

    /// Execute every node of `graph`, feeding declared inputs by name.
    pub fn run(&self, graph: &Graph, feeds: &HashMap<String, Tensor>) -> Result<ExecResult> {
        let mut values: Vec<Option<Tensor>> = vec![None; graph.values().len()];
        let mut names = HashMap::with_capacity(graph.values().len());

        let validate = self.runtime.config().validate_feeds;
        for (i, info) in graph.values().iter().enumerate() {
            names.insert(info.name.clone(), ValueId(i));
            if info.source == ValueSource::Feed {
                let tensor = feeds
                    .get(&info.name)
                    .ok_or_else(|| Error::MissingFeed(info.name.clone()))?;
                if validate {
                    check_feed(&info.desc, tensor)?;
                }
                values[i] = Some(tensor.clone());
            }
        }

        // All feeds must share one placement; constants follow it.
        let placement = if validate {
            common_device(graph.feeds().iter().filter_map(|id| values[id.index()].as_ref()))?
        } else {
            None
        };

        for (i, info) in graph.values().iter().enumerate() {
            if let ValueSource::Fill(v) = info.source {
                let desc = match placement {
                    Some(device) => info.desc.on(device),
                    None => info.desc.clone(),
                };
                values[i] = Some(Tensor::full(desc, v));
            }
        }

        for node in graph.nodes() {
            let outputs = self.run_node(graph, node, &values)?;
            for (id, tensor) in node.outputs.iter().zip(outputs) {
                values[id.index()] = Some(tensor);
            }
        }

        log::debug!("executed {} nodes", graph.nodes().len());
        Ok(ExecResult { values, names })
    }

    fn run_node(
        &self,
        graph: &Graph,
        node: &OperatorNode,
        values: &[Option<Tensor>],
    ) -> Result<Vec<Tensor>> {
        let inputs = node
            .inputs
            .iter()
            .map(|id| {
                values
                    .get(id.index())
                    .and_then(|v| v.as_ref())
                    .ok_or(Error::UnknownValue(id.index()))
            })
            .collect::<Result<Vec<&Tensor>>>()?;

        let descs = inputs.iter().map(|t| t.desc().clone()).collect();
        let call = OpCall::prepare(node.op, descs, node.attrs.clone())?;

        for (id, desc) in node.outputs.iter().zip(&call.outputs) {
            let declared = graph.desc(*id)?;
            if declared.device() != desc.device() {
                log::warn!(
                    "{} node retargeted from {} to {}",
                    node.op,
                    declared.device(),
                    desc.device()
                );
                break;
            }
        }

        let outputs = self.runtime.kernels().dispatch_call(&call, &inputs)?;
        if outputs.len() != node.outputs.len() {
            bail!(
                "{} kernel produced {} outputs, node declares {}",
                node.op,
                outputs.len(),
                node.outputs.len()
            );
        }
        Ok(outputs)
    }
}

fn common_device<'a>(mut feeds: impl Iterator<Item = &'a Tensor>) -> Result<Option<Device>> {
    let first = match feeds.next() {
        Some(t) => t.device(),
        None => return Ok(None),
    };
    for t in feeds {
        if t.device() != first {
            return Err(Error::DevicePlacement {
                expected: first,
                got: t.device(),
            });
        }
    }
    Ok(Some(first))
}

fn check_feed(declared: &vole_core::TensorDesc, tensor: &Tensor) -> Result<()> {
    if declared.shape() != tensor.shape() {
        return Err(Error::ShapeMismatch {
            expected: declared.shape().clone(),
            got: tensor.shape().clone(),
        });
    }
    if declared.dtype() != tensor.dtype() {
        return Err(Error::DtypeMismatch {
            expected: declared.dtype(),
            got: tensor.dtype(),
        });
    }
    Ok(())
}
