use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Failures acquiring the model artifact. Fatal at startup, never retried.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("IO error writing artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures turning an artifact into a predictor.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{reason}\n\nThis model was exported for a runtime this service cannot execute.\n\nRe-export the model as a CPU-compatible ONNX graph (IR version <= {max_ir}, default opset <= {max_opset}, standard operator domains only) and deploy it again.")]
    IncompatibleRuntime {
        reason: String,
        max_ir: i64,
        max_opset: i64,
    },

    #[error("Model loading error: {0}")]
    Generic(String),
}

/// Configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Anything that stops the process before it starts serving.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
#[error("inference failed: {0}")]
pub struct InferenceError(pub String);

/// Per-request failures of `POST /analyze`. Each one is isolated to its request.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("request has no `file` field")]
    MissingFile,

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("upload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl ResponseError for AnalyzeError {
    fn status_code(&self) -> StatusCode {
        match self {
            AnalyzeError::MissingFile | AnalyzeError::Multipart(_) | AnalyzeError::Decode(_) => {
                StatusCode::BAD_REQUEST
            }
            AnalyzeError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AnalyzeError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
    }
}
