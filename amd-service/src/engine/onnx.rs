//! ONNX Runtime backend
//!
//! Runs an exported sequence classifier (e.g. wav2vec2) with input
//! `input_values` `[1, T]` f32, optional `attention_mask` `[1, T]` i64 and
//! logits `[1, 2]` as the first output.

use super::{Classifier, Device};
use crate::error::{EngineLoadError, InferenceError};
use crate::features::ModelInput;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

const INPUT_VALUES: &str = "input_values";
const ATTENTION_MASK: &str = "attention_mask";

/// Whether the CUDA execution provider can be registered on this host
#[cfg(feature = "cuda")]
pub fn cuda_available() -> bool {
    use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
    CUDAExecutionProvider::default().is_available().unwrap_or(false)
}

pub struct OnnxClassifier {
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    feed_mask: bool,
}

impl OnnxClassifier {
    pub fn load(
        path: &Path,
        device: Device,
        use_attention_mask: bool,
    ) -> Result<Self, EngineLoadError> {
        std::fs::metadata(path).map_err(|source| EngineLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let runtime = |e: ort::Error| EngineLoadError::Runtime(e.to_string());

        #[allow(unused_mut)]
        let mut builder = Session::builder()
            .map_err(runtime)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(runtime)?;

        #[cfg(feature = "cuda")]
        {
            use ort::execution_providers::CUDAExecutionProvider;
            if device == Device::Cuda {
                builder = builder
                    .with_execution_providers([CUDAExecutionProvider::default().build()])
                    .map_err(runtime)?;
                info!("CUDA execution provider registered");
            }
        }

        let session = builder.commit_from_file(path).map_err(runtime)?;

        let has_values = session.inputs.iter().any(|i| i.name == INPUT_VALUES);
        if !has_values {
            return Err(EngineLoadError::Invalid(format!(
                "{} has no '{}' input",
                path.display(),
                INPUT_VALUES
            )));
        }
        let accepts_mask = session.inputs.iter().any(|i| i.name == ATTENTION_MASK);
        let feed_mask = use_attention_mask && accepts_mask;

        info!(
            "Loaded ONNX model from {} on {} (attention_mask={})",
            path.display(),
            device,
            feed_mask
        );

        Ok(Self {
            session: Mutex::new(session),
            feed_mask,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn forward(&self, input: &ModelInput) -> Result<[f32; 2], InferenceError> {
        let runtime = |e: ort::Error| InferenceError::Runtime(e.to_string());
        let t = input.len();

        let values = Tensor::from_array(([1usize, t], input.values.clone())).map_err(runtime)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::Runtime("session lock poisoned".to_string()))?;

        let outputs = if self.feed_mask {
            let mask: Vec<i64> = input.mask.iter().map(|&m| i64::from(m)).collect();
            let mask = Tensor::from_array(([1usize, t], mask)).map_err(runtime)?;
            session
                .run(ort::inputs![INPUT_VALUES => values, ATTENTION_MASK => mask])
                .map_err(runtime)?
        } else {
            session
                .run(ort::inputs![INPUT_VALUES => values])
                .map_err(runtime)?
        };

        let (shape, logits) = outputs[0].try_extract_tensor::<f32>().map_err(runtime)?;
        debug!("ONNX logits shape {:?}", shape);

        match logits {
            [voicemail, human] => Ok([*voicemail, *human]),
            other => Err(InferenceError::Shape(format!(
                "expected logits [1, 2], got {} values",
                other.len()
            ))),
        }
    }
}
