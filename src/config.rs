//! Deployment configuration.
//!
//! Every field has a default that reproduces the original deployment, so the
//! service runs without any config file. A TOML file given with `--config`
//! may override any subset of fields.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Where the original deployment hosted its model. That export predates the
/// ONNX runtime used here, so a real deployment must set `model.url` to an
/// ONNX export of the classifier; loading the default fails at startup.
pub const DEFAULT_MODEL_URL: &str =
    "https://drive.google.com/uc?export=download&id=1gwn76dTvyyFueduCEhtGsnmFIuSSgFFn";
pub const DEFAULT_MODEL_FILE: &str = "model_face.onnx";

pub const DEFAULT_LABELS: [&str; 20] = [
    "angelina_jolie",
    "barack_obama",
    "billie_eilish",
    "chris_hemsworth",
    "donald_trump",
    "dwayne_johnson",
    "gabrielle_union",
    "jennifer_lawrence",
    "jordan_michael",
    "kawhi_leonard",
    "keanu_reeves",
    "keyli_jenner",
    "lil_peep",
    "naomi_scott",
    "rafael_nadal",
    "roger_federer",
    "scarlett_johansson",
    "selena_gomez",
    "taylor_swift",
    "Xi_Jinping",
];

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ModelConfig {
    #[serde(default = "default_model_url")]
    pub url: String,
    #[serde(default = "default_model_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_model_file")]
    pub file: String,
    /// Side length of the square input the graph was exported with.
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default = "default_mean")]
    pub mean: [f32; 3],
    #[serde(default = "default_std")]
    pub std: [f32; 3],
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    #[serde(default = "default_view_dir")]
    pub view_dir: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default)]
    pub quotes: Vec<String>,
}

impl Config {
    /// Load from `path` if given, otherwise use the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml(&raw)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn model_path(&self) -> PathBuf {
        self.model.dir.join(&self.model.file)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            url: default_model_url(),
            dir: default_model_dir(),
            file: default_model_file(),
            input_size: default_input_size(),
            mean: default_mean(),
            std: default_std(),
            labels: default_labels(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            view_dir: default_view_dir(),
            static_dir: default_static_dir(),
            quotes: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_model_url() -> String {
    DEFAULT_MODEL_URL.to_string()
}
fn default_model_dir() -> PathBuf {
    PathBuf::from("app")
}
fn default_model_file() -> String {
    DEFAULT_MODEL_FILE.to_string()
}
fn default_input_size() -> u32 {
    224
}
// ImageNet statistics, the normalisation the model was trained with.
fn default_mean() -> [f32; 3] {
    [0.485, 0.456, 0.406]
}
fn default_std() -> [f32; 3] {
    [0.229, 0.224, 0.225]
}
fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|s| s.to_string()).collect()
}
fn default_view_dir() -> PathBuf {
    PathBuf::from("app/view")
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("app/static")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.model_path(), PathBuf::from("app/model_face.onnx"));
        assert_eq!(config.model.labels.len(), 20);
        assert_eq!(config.model.labels[19], "Xi_Jinping");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 8080

            [model]
            labels = ["cat", "dog"]
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.model.labels, vec!["cat", "dog"]);
        assert_eq!(config.model.input_size, 224);
        assert_eq!(config.app.view_dir, PathBuf::from("app/view"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load(Some(Path::new("/nonexistent/faceserve.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = Config::from_toml("[server\nport = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
