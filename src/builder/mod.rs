//! Graph builder
//!
//! Fluent construction of a [`Graph`] from tensor names, resolving each
//! node's since-version through an [`OpSchemaLookup`]. This is the inbound
//! seam a model reader uses once it has decoded a model file; tests and
//! benches use it directly.
//!
//! # Example
//!
//! ```ignore
//! use furiosa_rewriter::builder::GraphBuilder;
//!
//! let mut b = GraphBuilder::new(13);
//! b.input("X", &[1, 3, 32, 32]);
//! b.initializer_i64("pads", &[8], &[0, 0, 1, 1, 0, 0, 1, 1]);
//! b.initializer_f32("W", &[8, 3, 3, 3], &weights);
//! b.node("Pad", &["X", "pads"], &["padded"]).attr("mode", "constant");
//! b.node("Conv", &["padded", "W"], &["Y"]).attr("pads", vec![0i64, 0, 0, 0]);
//! b.output("Y");
//!
//! let graph = b.build()?;
//! ```
//!
//! Steps are replayed in call order, so inputs must be declared before the
//! nodes reading them.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::error::RewriteResult;
use crate::graph::{AttributeValue, Graph, OpIdentity, ONNX_DOMAIN};
use crate::opset::{normalize_domain, OpSchemaLookup, SinceVersionTable};
use crate::tensor::{DataType, TensorData};

/// Pending node declaration
#[derive(Debug, Clone)]
pub struct NodeSpec {
    op_type: String,
    domain: String,
    since_version: Option<i64>,
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    attributes: IndexMap<String, AttributeValue>,
}

impl NodeSpec {
    /// Override the generated node name
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = name.to_string();
        self
    }

    /// Place the operator in a custom domain
    pub fn domain(&mut self, domain: &str) -> &mut Self {
        self.domain = domain.to_string();
        self
    }

    /// Pin the since-version instead of resolving it
    pub fn version(&mut self, since_version: i64) -> &mut Self {
        self.since_version = Some(since_version);
        self
    }

    /// Set an attribute
    pub fn attr(&mut self, name: &str, value: impl Into<AttributeValue>) -> &mut Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }
}

#[derive(Debug)]
enum Step {
    Input {
        name: String,
        dtype: DataType,
        shape: Vec<i64>,
    },
    Initializer {
        name: String,
        data: TensorData,
    },
    Node(usize),
    ValueInfo {
        name: String,
        dtype: Option<DataType>,
        shape: Vec<i64>,
    },
    Output(String),
}

/// Fluent graph builder
pub struct GraphBuilder {
    opset_imports: IndexMap<String, i64>,
    lookup: Box<dyn OpSchemaLookup>,
    steps: Vec<Step>,
    nodes: Vec<NodeSpec>,
    name_counters: FxHashMap<String, usize>,
}

impl GraphBuilder {
    /// Builder importing `opset` for the default domain
    pub fn new(opset: i64) -> Self {
        let mut opset_imports = IndexMap::new();
        opset_imports.insert(ONNX_DOMAIN.to_string(), opset);
        Self {
            opset_imports,
            lookup: Box::new(SinceVersionTable::standard()),
            steps: Vec::new(),
            nodes: Vec::new(),
            name_counters: FxHashMap::default(),
        }
    }

    /// Use a custom schema lookup
    pub fn with_lookup(mut self, lookup: impl OpSchemaLookup + 'static) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    /// Import an opset for another domain
    pub fn opset_import(&mut self, domain: &str, version: i64) -> &mut Self {
        self.opset_imports
            .insert(normalize_domain(domain).to_string(), version);
        self
    }

    /// Declare a float graph input
    pub fn input(&mut self, name: &str, shape: &[i64]) -> &mut Self {
        self.input_typed(name, DataType::Float, shape)
    }

    /// Declare a typed graph input
    pub fn input_typed(&mut self, name: &str, dtype: DataType, shape: &[i64]) -> &mut Self {
        self.steps.push(Step::Input {
            name: name.to_string(),
            dtype,
            shape: shape.to_vec(),
        });
        self
    }

    /// Add an initializer from a prepared payload
    pub fn initializer(&mut self, name: &str, data: TensorData) -> &mut Self {
        self.steps.push(Step::Initializer {
            name: name.to_string(),
            data,
        });
        self
    }

    /// Add an `int64` initializer
    pub fn initializer_i64(&mut self, name: &str, dims: &[i64], values: &[i64]) -> &mut Self {
        self.initializer(name, TensorData::from_i64(dims.to_vec(), values))
    }

    /// Add a `float` initializer
    pub fn initializer_f32(&mut self, name: &str, dims: &[i64], values: &[f32]) -> &mut Self {
        self.initializer(name, TensorData::from_f32(dims.to_vec(), values))
    }

    /// Declare a node; returns its [`NodeSpec`] for further configuration
    pub fn node(&mut self, op_type: &str, inputs: &[&str], outputs: &[&str]) -> &mut NodeSpec {
        let counter = self.name_counters.entry(op_type.to_string()).or_insert(0);
        let name = format!("{}_{}", op_type, counter);
        *counter += 1;

        self.nodes.push(NodeSpec {
            op_type: op_type.to_string(),
            domain: ONNX_DOMAIN.to_string(),
            since_version: None,
            name,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            attributes: IndexMap::new(),
        });
        let index = self.nodes.len() - 1;
        self.steps.push(Step::Node(index));
        &mut self.nodes[index]
    }

    /// Record static type/shape for an intermediate value
    pub fn value_info(&mut self, name: &str, dtype: Option<DataType>, shape: &[i64]) -> &mut Self {
        self.steps.push(Step::ValueInfo {
            name: name.to_string(),
            dtype,
            shape: shape.to_vec(),
        });
        self
    }

    /// Pin a value as a graph output
    pub fn output(&mut self, name: &str) -> &mut Self {
        self.steps.push(Step::Output(name.to_string()));
        self
    }

    /// Replay all steps into a new graph
    pub fn build(self) -> RewriteResult<Graph> {
        let mut graph = Graph::new();
        for (domain, &version) in &self.opset_imports {
            graph.set_opset_import(domain.clone(), version);
        }

        for step in &self.steps {
            match step {
                Step::Input { name, dtype, shape } => {
                    graph.add_graph_input(name, Some(*dtype), Some(shape.clone()))?;
                }
                Step::Initializer { name, data } => {
                    graph.add_initializer(name, data.clone())?;
                }
                Step::Node(index) => {
                    let spec = &self.nodes[*index];
                    let op = self.resolve(spec);
                    let inputs: Vec<&str> = spec.inputs.iter().map(|s| s.as_str()).collect();
                    let outputs: Vec<&str> = spec.outputs.iter().map(|s| s.as_str()).collect();
                    graph.add_node(&spec.name, op, &inputs, &outputs, spec.attributes.clone())?;
                }
                Step::ValueInfo { name, dtype, shape } => {
                    let id = graph.tensor(name)?.id();
                    graph.set_value_shape(id, Some(shape.clone()))?;
                    if dtype.is_some() {
                        graph.set_value_type(id, *dtype)?;
                    }
                }
                Step::Output(name) => {
                    let id = graph.tensor(name)?.id();
                    graph.mark_graph_output(id)?;
                }
            }
        }

        Ok(graph)
    }

    /// Since-version from the [`NodeSpec`], the lookup, or the domain's opset
    fn resolve(&self, spec: &NodeSpec) -> OpIdentity {
        let domain = normalize_domain(&spec.domain);
        let opset = self.opset_imports.get(domain).copied().unwrap_or(1);
        let since_version = spec
            .since_version
            .or_else(|| self.lookup.since_version(&spec.op_type, domain, opset))
            .unwrap_or(opset);
        OpIdentity::with_domain(spec.op_type.clone(), domain, since_version)
    }
}
