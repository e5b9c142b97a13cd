use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use log::{debug, error, info};
use tract_onnx::pb::ModelProto;
use tract_onnx::prelude::*;

use crate::error::{InferenceError, LoadError};
use crate::model::imaging::{preprocess, InputSpec};
use crate::model::labels::{ClassLabels, Prediction};
use crate::model::traits::model_trait::Predictor;

pub const MAX_IR_VERSION: i64 = 9;
pub const MAX_OPSET: i64 = 18;

const STANDARD_DOMAINS: [&str; 3] = ["", "ai.onnx", "ai.onnx.ml"];
const ACCELERATOR_DOMAINS: [&str; 3] = ["com.microsoft", "com.nvidia", "org.pytorch.aten"];

type Plan = TypedRunnableModel<TypedModel>;

/// What an artifact asks of the runtime, read from its protobuf header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeProfile {
    pub ir_version: i64,
    pub opsets: Vec<(String, i64)>,
}

impl RuntimeProfile {
    pub fn of(proto: &ModelProto) -> Self {
        Self {
            ir_version: proto.ir_version,
            opsets: proto
                .opset_import
                .iter()
                .map(|o| (o.domain.clone(), o.version))
                .collect(),
        }
    }

    pub fn check(&self) -> Result<(), LoadError> {
        let incompatible = |reason: String| LoadError::IncompatibleRuntime {
            reason,
            max_ir: MAX_IR_VERSION,
            max_opset: MAX_OPSET,
        };

        if self.ir_version > MAX_IR_VERSION {
            return Err(incompatible(format!(
                "ONNX IR version {} is newer than this runtime supports",
                self.ir_version
            )));
        }
        for (domain, version) in &self.opsets {
            if ACCELERATOR_DOMAINS.contains(&domain.as_str()) {
                return Err(incompatible(format!(
                    "model uses accelerator-only operators from `{domain}`"
                )));
            }
            if !STANDARD_DOMAINS.contains(&domain.as_str()) {
                return Err(incompatible(format!(
                    "model imports unknown operator domain `{domain}`"
                )));
            }
            if domain != "ai.onnx.ml" && *version > MAX_OPSET {
                return Err(incompatible(format!(
                    "opset {version} is newer than this runtime supports"
                )));
            }
        }
        Ok(())
    }
}

/// Image classifier backed by an optimized tract plan.
pub struct TractClassifier {
    plan: Arc<Plan>,
    input: InputSpec,
    labels: ClassLabels,
}

impl TractClassifier {
    /// Deserialize `dir/file_name` into a runnable classifier.
    pub fn load(
        dir: &Path,
        file_name: &str,
        input: InputSpec,
        labels: ClassLabels,
    ) -> Result<Self, LoadError> {
        let path = dir.join(file_name);
        let generic = |e: TractError| LoadError::Generic(format!("{}: {e:#}", path.display()));

        let onnx = tract_onnx::onnx();
        let proto = onnx.proto_model_for_path(&path).map_err(|e| {
            LoadError::Generic(format!(
                "{}: {e:#} (does `model.url` point at an ONNX export?)",
                path.display()
            ))
        })?;

        let profile = RuntimeProfile::of(&proto);
        if let Err(e) = profile.check() {
            error!("{e}");
            return Err(e);
        }

        // External tensor data is resolved relative to the artifact's directory.
        let parsed = onnx.parse(&proto, dir.to_str()).map_err(generic)?;
        if !parsed.unresolved_inputs.is_empty() {
            return Err(LoadError::Generic(format!(
                "{}: unresolved graph inputs {:?}",
                path.display(),
                parsed.unresolved_inputs
            )));
        }

        let [n, c, h, w] = input.shape();
        let model = parsed
            .model
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(n, c, h, w)))
            .and_then(|m| m.into_optimized())
            .map_err(generic)?;

        let classes = model
            .output_fact(0)
            .map_err(generic)?
            .shape
            .as_concrete()
            .and_then(|s| s.last().copied());
        if classes != Some(labels.len()) {
            return Err(LoadError::Generic(format!(
                "{} emits {:?} classes but {} labels are configured",
                path.display(),
                classes,
                labels.len()
            )));
        }

        let plan = model.into_runnable().map_err(generic)?;
        info!(
            "Loaded {} (IR {}, {} classes)",
            path.display(),
            profile.ir_version,
            labels.len()
        );

        Ok(Self {
            plan: Arc::new(plan),
            input,
            labels,
        })
    }
}

fn run_plan(plan: &Plan, image: &DynamicImage, input: &InputSpec) -> TractResult<Vec<f32>> {
    let array = preprocess(image, input);
    let data: Vec<f32> = array.iter().copied().collect();
    let tensor = Tensor::from_shape(&input.shape(), &data)?;
    let outputs = plan.run(tvec!(tensor.into()))?;
    let scores = outputs[0].to_array_view::<f32>()?;
    Ok(scores.iter().copied().collect())
}

#[async_trait]
impl Predictor for TractClassifier {
    async fn predict(&self, image: DynamicImage) -> Result<Prediction, InferenceError> {
        let plan = Arc::clone(&self.plan);
        let input = self.input.clone();

        let scores = tokio::task::spawn_blocking(move || run_plan(&plan, &image, &input))
            .await
            .map_err(|e| InferenceError(e.to_string()))?
            .map_err(|e| InferenceError(format!("{e:#}")))?;

        let prediction = self.labels.decide(&scores)?;
        debug!(
            "Predicted {} ({:.3})",
            prediction.label, prediction.confidence
        );
        Ok(prediction)
    }

    fn labels(&self) -> &ClassLabels {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(ir_version: i64, opsets: &[(&str, i64)]) -> RuntimeProfile {
        RuntimeProfile {
            ir_version,
            opsets: opsets.iter().map(|(d, v)| (d.to_string(), *v)).collect(),
        }
    }

    fn spec() -> InputSpec {
        InputSpec {
            size: 8,
            mean: [0.0; 3],
            std: [1.0; 3],
        }
    }

    #[test]
    fn standard_profile_is_compatible() {
        assert!(profile(7, &[("", 13)]).check().is_ok());
        assert!(profile(8, &[("ai.onnx", 17), ("ai.onnx.ml", 3)]).check().is_ok());
    }

    #[test]
    fn newer_ir_version_is_incompatible() {
        let err = profile(MAX_IR_VERSION + 1, &[("", 13)]).check().unwrap_err();
        assert!(matches!(err, LoadError::IncompatibleRuntime { .. }));
    }

    #[test]
    fn newer_opset_is_incompatible() {
        let err = profile(8, &[("", MAX_OPSET + 1)]).check().unwrap_err();
        assert!(matches!(err, LoadError::IncompatibleRuntime { .. }));
    }

    #[test]
    fn accelerator_domain_is_incompatible() {
        let err = profile(8, &[("", 13), ("com.microsoft", 1)]).check().unwrap_err();
        match err {
            LoadError::IncompatibleRuntime { reason, .. } => {
                assert!(reason.contains("accelerator-only"))
            }
            other => panic!("expected IncompatibleRuntime, got {other:?}"),
        }
    }

    #[test]
    fn unknown_domain_is_incompatible() {
        let err = profile(8, &[("", 13), ("org.example.custom", 1)])
            .check()
            .unwrap_err();
        assert!(matches!(err, LoadError::IncompatibleRuntime { .. }));
    }

    #[test]
    fn missing_artifact_is_a_generic_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TractClassifier::load(dir.path(), "absent.onnx", spec(), ClassLabels::new(["a"]));
        assert!(matches!(result, Err(LoadError::Generic(_))));
    }

    #[test]
    fn garbage_artifact_is_a_generic_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.onnx"), b"<html>quota exceeded</html>").unwrap();
        let result = TractClassifier::load(dir.path(), "model.onnx", spec(), ClassLabels::new(["a"]));
        match result {
            Err(LoadError::Generic(message)) => assert!(message.contains("model.url")),
            Err(other) => panic!("expected Generic, got {other:?}"),
            Ok(_) => panic!("garbage artifact loaded"),
        }
    }
}
