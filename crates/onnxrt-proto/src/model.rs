use std::collections::HashSet;

use bytes::Bytes;
use onnxrt_core::{DType, Dim, SerializeModel, SessionError};
use prost::Message;

use crate::dtype::{from_onnx, to_onnx};
use crate::protos::{
    tensor_shape_proto::{dimension, Dimension},
    type_proto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, StringStringEntryProto,
    TensorShapeProto, TypeProto, ValueInfoProto,
};
use crate::{Error, Result};

/// IR version written into every serialized model.
pub const IR_VERSION: i64 = 8;
/// Default operator set for the standard `ai.onnx` domain.
pub const DEFAULT_OPSET: i64 = 18;

/// An in-memory model that serializes to the ONNX protobuf wire format.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub producer_name: String,
    pub producer_version: String,
    pub domain: String,
    pub model_version: i64,
    pub doc_string: String,
    /// `(domain, version)` pairs. Empty domain is `ai.onnx`.
    pub opsets: Vec<(String, i64)>,
    pub metadata: Vec<(String, String)>,
    pub graph: Graph,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    pub name: String,
    pub doc_string: String,
    pub inputs: Vec<ValueInfo>,
    pub outputs: Vec<ValueInfo>,
    pub nodes: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValueInfo {
    pub name: String,
    pub dtype: DType,
    pub dims: Vec<Dim>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub name: String,
    pub op_type: String,
    pub domain: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub doc_string: String,
}

impl Model {
    pub fn new(graph: Graph) -> Self {
        Self {
            producer_name: String::new(),
            producer_version: String::new(),
            domain: String::new(),
            model_version: 0,
            doc_string: String::new(),
            opsets: vec![(String::new(), DEFAULT_OPSET)],
            metadata: Vec::new(),
            graph,
        }
    }

    pub fn with_producer(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.producer_name = name.into();
        self.producer_version = version.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_model_version(mut self, version: i64) -> Self {
        self.model_version = version;
        self
    }

    pub fn with_doc_string(mut self, doc: impl Into<String>) -> Self {
        self.doc_string = doc.into();
        self
    }

    /// Sets the version for `domain`, replacing any earlier entry.
    pub fn with_opset(mut self, domain: impl Into<String>, version: i64) -> Self {
        let domain = domain.into();
        self.opsets.retain(|(d, _)| *d != domain);
        self.opsets.push((domain, version));
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Checks the structural rules a runtime would reject the model for
    /// anyway, but with a clearer message.
    pub fn validate(&self) -> Result<()> {
        if self.graph.outputs.is_empty() {
            return Err(Error::Validation(format!(
                "graph `{}` declares no outputs",
                self.graph.name
            )));
        }

        let mut seen = HashSet::new();
        for info in self.graph.inputs.iter().chain(&self.graph.outputs) {
            if info.name.is_empty() {
                return Err(Error::Validation("graph value with an empty name".into()));
            }
            if !seen.insert(info.name.as_str()) {
                return Err(Error::Validation(format!(
                    "graph value `{}` is declared twice",
                    info.name
                )));
            }
        }

        let mut keys = HashSet::new();
        for (key, _) in &self.metadata {
            if !keys.insert(key.as_str()) {
                return Err(Error::Validation(format!("duplicate metadata key `{key}`")));
            }
        }
        Ok(())
    }

    pub fn to_proto(&self) -> Result<ModelProto> {
        self.validate()?;

        Ok(ModelProto {
            ir_version: IR_VERSION,
            opset_import: self
                .opsets
                .iter()
                .map(|(domain, version)| OperatorSetIdProto {
                    domain: domain.clone(),
                    version: *version,
                })
                .collect(),
            producer_name: self.producer_name.clone(),
            producer_version: self.producer_version.clone(),
            domain: self.domain.clone(),
            model_version: self.model_version,
            doc_string: self.doc_string.clone(),
            graph: Some(self.graph.to_proto()?),
            metadata_props: self
                .metadata
                .iter()
                .map(|(key, value)| StringStringEntryProto {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        })
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(self.to_proto()?.encode_to_vec()))
    }

    pub fn from_proto(proto: ModelProto) -> Result<Self> {
        let graph = proto
            .graph
            .ok_or_else(|| Error::Validation("model has no graph".into()))?;

        Ok(Self {
            producer_name: proto.producer_name,
            producer_version: proto.producer_version,
            domain: proto.domain,
            model_version: proto.model_version,
            doc_string: proto.doc_string,
            opsets: proto
                .opset_import
                .into_iter()
                .map(|op| (op.domain, op.version))
                .collect(),
            metadata: proto
                .metadata_props
                .into_iter()
                .map(|entry| (entry.key, entry.value))
                .collect(),
            graph: Graph::from_proto(graph)?,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_proto(ModelProto::decode(bytes)?)
    }
}

impl SerializeModel for Model {
    fn to_model_bytes(&self) -> onnxrt_core::Result<Bytes> {
        self.to_bytes()
            .map_err(|e| SessionError::InvalidArgument(e.to_string()))
    }
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn input(mut self, info: ValueInfo) -> Self {
        self.inputs.push(info);
        self
    }

    pub fn output(mut self, info: ValueInfo) -> Self {
        self.outputs.push(info);
        self
    }

    pub fn node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    fn to_proto(&self) -> Result<GraphProto> {
        Ok(GraphProto {
            node: self.nodes.iter().map(Node::to_proto).collect(),
            name: self.name.clone(),
            doc_string: self.doc_string.clone(),
            input: self
                .inputs
                .iter()
                .map(ValueInfo::to_proto)
                .collect::<Result<_>>()?,
            output: self
                .outputs
                .iter()
                .map(ValueInfo::to_proto)
                .collect::<Result<_>>()?,
        })
    }

    fn from_proto(proto: GraphProto) -> Result<Self> {
        Ok(Self {
            name: proto.name,
            doc_string: proto.doc_string,
            inputs: proto
                .input
                .into_iter()
                .map(ValueInfo::from_proto)
                .collect::<Result<_>>()?,
            outputs: proto
                .output
                .into_iter()
                .map(ValueInfo::from_proto)
                .collect::<Result<_>>()?,
            nodes: proto.node.into_iter().map(Node::from_proto).collect(),
        })
    }
}

impl ValueInfo {
    pub fn tensor(
        name: impl Into<String>,
        dtype: DType,
        dims: impl IntoIterator<Item = Dim>,
    ) -> Self {
        Self {
            name: name.into(),
            dtype,
            dims: dims.into_iter().collect(),
        }
    }

    fn to_proto(&self) -> Result<ValueInfoProto> {
        let dim = self
            .dims
            .iter()
            .map(|d| -> Result<Dimension> {
                let value = match d {
                    Dim::Fixed(n) => Some(dimension::Value::DimValue(i64::try_from(*n).map_err(
                        |_| Error::Validation(format!("dimension {n} of `{}` overflows", self.name)),
                    )?)),
                    Dim::Symbolic(param) => Some(dimension::Value::DimParam(param.clone())),
                    Dim::Unknown => None,
                };
                Ok(Dimension {
                    denotation: String::new(),
                    value,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ValueInfoProto {
            name: self.name.clone(),
            r#type: Some(TypeProto {
                denotation: String::new(),
                value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                    elem_type: to_onnx(self.dtype),
                    shape: Some(TensorShapeProto { dim }),
                })),
            }),
            doc_string: String::new(),
        })
    }

    fn from_proto(proto: ValueInfoProto) -> Result<Self> {
        let Some(TypeProto {
            value: Some(type_proto::Value::TensorType(tensor)),
            ..
        }) = proto.r#type
        else {
            return Err(Error::Validation(format!(
                "graph value `{}` is not a tensor",
                proto.name
            )));
        };

        let dims = tensor
            .shape
            .map(|shape| shape.dim)
            .unwrap_or_default()
            .into_iter()
            .map(|d| match d.value {
                Some(dimension::Value::DimValue(n)) => usize::try_from(n)
                    .map(Dim::Fixed)
                    .map_err(|_| {
                        Error::Validation(format!("negative dimension {n} on `{}`", proto.name))
                    }),
                Some(dimension::Value::DimParam(param)) if !param.is_empty() => {
                    Ok(Dim::Symbolic(param))
                }
                _ => Ok(Dim::Unknown),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            dtype: from_onnx(tensor.elem_type)?,
            name: proto.name,
            dims,
        })
    }
}

impl Node {
    pub fn new<I, O>(op_type: impl Into<String>, inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            op_type: op_type.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn to_proto(&self) -> NodeProto {
        NodeProto {
            input: self.inputs.clone(),
            output: self.outputs.clone(),
            name: self.name.clone(),
            op_type: self.op_type.clone(),
            domain: self.domain.clone(),
            doc_string: self.doc_string.clone(),
        }
    }

    fn from_proto(proto: NodeProto) -> Self {
        Self {
            name: proto.name,
            op_type: proto.op_type,
            domain: proto.domain,
            inputs: proto.input,
            outputs: proto.output,
            doc_string: proto.doc_string,
        }
    }
}
