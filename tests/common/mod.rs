//! Tiny ONNX classifiers written on the fly for loader and bootstrap tests.
//!
//! The graph averages each colour channel of the input and multiplies the
//! result by a `[1, 3]` weight initializer, so it scores three classes:
//! red, green, blue.

#![allow(dead_code)]

use std::path::Path;

use prost::Message;
use tract_onnx::pb::tensor_proto::{DataLocation, DataType};
use tract_onnx::pb::{
    type_proto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, StringStringEntryProto,
    TensorProto, TypeProto, ValueInfoProto,
};

pub const COLOUR_LABELS: [&str; 3] = ["red", "green", "blue"];
pub const WEIGHTS: [f32; 3] = [1.0, 1.0, 1.0];

pub enum Weights {
    Inline,
    /// Stored next to the model in a file with this name.
    External(&'static str),
}

fn node(op_type: &str, inputs: &[&str], output: &str) -> NodeProto {
    NodeProto {
        name: output.to_string(),
        op_type: op_type.to_string(),
        input: inputs.iter().map(|i| i.to_string()).collect(),
        output: vec![output.to_string()],
        ..Default::default()
    }
}

fn float_value(name: &str) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: DataType::Float as i32,
                shape: None,
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn weight_bytes() -> Vec<u8> {
    WEIGHTS.iter().flat_map(|w| w.to_le_bytes()).collect()
}

pub fn colour_classifier(weights: Weights) -> ModelProto {
    let mut initializer = TensorProto {
        name: "weights".to_string(),
        dims: vec![1, 3],
        data_type: DataType::Float as i32,
        ..Default::default()
    };
    match weights {
        Weights::Inline => initializer.raw_data = weight_bytes(),
        Weights::External(location) => {
            initializer.data_location = Some(DataLocation::External as i32);
            initializer.external_data = vec![StringStringEntryProto {
                key: "location".to_string(),
                value: location.to_string(),
            }];
        }
    }

    let graph = GraphProto {
        name: "colour_classifier".to_string(),
        node: vec![
            node("GlobalAveragePool", &["image"], "pooled"),
            node("Flatten", &["pooled"], "flat"),
            node("Mul", &["flat", "weights"], "scores"),
        ],
        initializer: vec![initializer],
        input: vec![float_value("image")],
        output: vec![float_value("scores")],
        ..Default::default()
    };

    ModelProto {
        ir_version: 8,
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 13,
        }],
        producer_name: "faceserve-tests".to_string(),
        graph: Some(graph),
        ..Default::default()
    }
}

pub fn encode(proto: &ModelProto) -> Vec<u8> {
    proto.encode_to_vec()
}

pub fn write_model(dir: &Path, file: &str, proto: &ModelProto) {
    std::fs::write(dir.join(file), encode(proto)).unwrap();
}
