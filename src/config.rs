use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::core::auth::MatchPolicy;
use crate::error::{GateError, Result};
use crate::paths;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub faces: FacesConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub recognizer: RecognizerConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            log_level: default_log_level(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

fn default_bind_addr() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5000 }
fn default_log_level() -> String { "info".to_string() }
fn default_max_upload_mb() -> usize { 10 }

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FacesConfig {
    #[serde(default = "default_authorized_dir")]
    pub authorized_dir: PathBuf,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    #[serde(default)]
    pub match_policy: MatchPolicy,
}

impl Default for FacesConfig {
    fn default() -> Self {
        Self {
            authorized_dir: default_authorized_dir(),
            similarity_threshold: default_similarity_threshold(),
            match_policy: MatchPolicy::default(),
        }
    }
}

fn default_authorized_dir() -> PathBuf { PathBuf::from("authorized_faces") }
fn default_similarity_threshold() -> f32 { 0.40 }

/// Parameters of the upload normalization pass. `unsharp_percent` and
/// `unsharp_threshold` follow the usual unsharp-mask conventions: the
/// difference against the blurred image is scaled by `percent / 100` and only
/// applied where it is at least `threshold` levels.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PreprocessConfig {
    #[serde(default = "default_target_size")]
    pub target_size: u32,
    #[serde(default = "default_true")]
    pub mirror: bool,
    #[serde(default = "default_unsharp_radius")]
    pub unsharp_radius: f32,
    #[serde(default = "default_unsharp_percent")]
    pub unsharp_percent: i32,
    #[serde(default = "default_unsharp_threshold")]
    pub unsharp_threshold: i32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            mirror: default_true(),
            unsharp_radius: default_unsharp_radius(),
            unsharp_percent: default_unsharp_percent(),
            unsharp_threshold: default_unsharp_threshold(),
        }
    }
}

fn default_target_size() -> u32 { 160 }
fn default_true() -> bool { true }
fn default_unsharp_radius() -> f32 { 2.0 }
fn default_unsharp_percent() -> i32 { 150 }
fn default_unsharp_threshold() -> i32 { 3 }

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecognizerConfig {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default = "default_normalization")]
    pub normalization_mean: f32,
    #[serde(default = "default_normalization")]
    pub normalization_std: f32,
    #[serde(default = "default_optimization_level")]
    pub optimization_level: u32,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            input_size: default_input_size(),
            normalization_mean: default_normalization(),
            normalization_std: default_normalization(),
            optimization_level: default_optimization_level(),
        }
    }
}

fn default_model_path() -> PathBuf { PathBuf::from("models/vgg_face.onnx") }
fn default_input_size() -> u32 { 224 }
fn default_normalization() -> f32 { 127.5 }
fn default_optimization_level() -> u32 { 3 }

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            idle_timeout_minutes: default_idle_timeout(),
        }
    }
}

fn default_cookie_name() -> String { "liftgate_session".to_string() }
fn default_idle_timeout() -> u64 { 30 }

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl Config {
    /// Loads the configuration, applies environment overrides and validates.
    ///
    /// An explicit `path` must exist. Without one, the first existing default
    /// location is used and plain defaults apply when none exists. Runs before
    /// logging is set up, so the caller reports the returned source.
    pub fn load(path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(GateError::Config(format!(
                        "Config file not found: {}", path.display()
                    )));
                }
                Self::finish(Self::load_from_path(path)?, ConfigSource::File(path.to_path_buf()))
            }
            None => Self::load_first_existing(paths::default_config_candidates()),
        }
    }

    fn load_first_existing(candidates: Vec<PathBuf>) -> Result<(Self, ConfigSource)> {
        match candidates.into_iter().find(|p| p.exists()) {
            Some(found) => {
                let config = Self::load_from_path(&found)?;
                Self::finish(config, ConfigSource::File(found))
            }
            None => Self::finish(Self::default(), ConfigSource::Defaults),
        }
    }

    fn finish(mut config: Self, source: ConfigSource) -> Result<(Self, ConfigSource)> {
        config.apply_env_overrides()?;
        config.validate()?;
        Ok((config, source))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GateError::Config(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| GateError::Config(format!("Config parse error: {}", e)))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var("LIFTGATE_FACES_DIR") {
            self.faces.authorized_dir = PathBuf::from(dir);
        }
        if let Ok(port) = std::env::var("LIFTGATE_PORT") {
            self.server.port = port.parse().map_err(|_| {
                GateError::Config(format!("LIFTGATE_PORT is not a valid port: {}", port))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(GateError::Config("Server port must be non-zero".into()));
        }
        if self.server.max_upload_mb == 0 || self.server.max_upload_mb > 100 {
            return Err(GateError::Config(format!(
                "Max upload size must be between 1 and 100 MB, got {}", self.server.max_upload_mb
            )));
        }

        let threshold = self.faces.similarity_threshold;
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(GateError::Config(format!(
                "Similarity threshold must be between -1.0 and 1.0, got {}", threshold
            )));
        }

        if self.preprocess.target_size == 0 || self.preprocess.target_size > 1024 {
            return Err(GateError::Config(format!(
                "Preprocess target size must be between 1 and 1024, got {}",
                self.preprocess.target_size
            )));
        }
        let radius = self.preprocess.unsharp_radius;
        if radius.is_nan() || radius <= 0.0 {
            return Err(GateError::Config(format!(
                "Unsharp radius must be positive, got {}", radius
            )));
        }
        if self.preprocess.unsharp_percent < 0 || self.preprocess.unsharp_threshold < 0 {
            return Err(GateError::Config(
                "Unsharp percent and threshold must not be negative".into(),
            ));
        }

        if self.recognizer.input_size == 0 || self.recognizer.input_size > 1024 {
            return Err(GateError::Config(format!(
                "Recognizer input size must be between 1 and 1024, got {}",
                self.recognizer.input_size
            )));
        }
        if self.recognizer.normalization_std == 0.0 {
            return Err(GateError::Config("Normalization std must be non-zero".into()));
        }

        if self.session.cookie_name.is_empty()
            || !self.session.cookie_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(GateError::Config(format!(
                "Invalid session cookie name: {:?}", self.session.cookie_name
            )));
        }

        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.preprocess.target_size, 160);
        assert!((config.faces.similarity_threshold - 0.40).abs() < f32::EPSILON);
        assert_eq!(config.faces.match_policy, MatchPolicy::FirstAboveThreshold);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::from_toml(
            r#"
            [faces]
            authorized_dir = "/srv/faces"
            match_policy = "best_match"

            [preprocess]
            mirror = false
            "#,
        )
        .unwrap();

        assert_eq!(config.faces.authorized_dir, PathBuf::from("/srv/faces"));
        assert_eq!(config.faces.match_policy, MatchPolicy::BestMatch);
        assert!(!config.preprocess.mirror);
        assert_eq!(config.preprocess.unsharp_percent, 150);
        assert_eq!(config.session.cookie_name, "liftgate_session");
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut config = Config::default();
        config.faces.similarity_threshold = 1.5;
        assert!(matches!(config.validate(), Err(GateError::Config(_))));
    }

    #[test]
    fn zero_radius_is_rejected() {
        let mut config = Config::default();
        config.preprocess.unsharp_radius = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn no_candidate_falls_back_to_defaults() {
        let (config, source) = Config::load_first_existing(vec![
            PathBuf::from("/nonexistent/a/liftgate.toml"),
            PathBuf::from("/nonexistent/b/liftgate.toml"),
        ])
        .unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn first_existing_candidate_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let second = dir.path().join("second.toml");
        std::fs::write(&second, "[server]\nlog_level = \"debug\"\n").unwrap();

        let (config, source) = Config::load_first_existing(vec![
            dir.path().join("missing.toml"),
            second.clone(),
        ])
        .unwrap();
        assert_eq!(source, ConfigSource::File(second));
        assert_eq!(config.server.log_level, "debug");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/liftgate.toml")));
        assert!(matches!(result, Err(GateError::Config(_))));
    }
}
