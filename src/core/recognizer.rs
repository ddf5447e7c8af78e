use crate::config::RecognizerConfig;
use crate::error::{GateError, Result};
use image::{DynamicImage, imageops::FilterType};
use ndarray::{Array4, CowArray};
use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

pub type Embedding = Vec<f32>;

/// Turns a face image into a fixed-length identity vector.
///
/// Implementations are treated as opaque: the service only relies on two
/// embeddings of the same person pointing in a similar direction.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, image: &DynamicImage) -> Result<Embedding>;

    fn embed_path(&self, path: &Path) -> Result<Embedding> {
        let image = image::open(path)?;
        self.embed(&image)
    }
}

/// Embedding provider backed by an ONNX face-embedding model.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    _environment: Arc<Environment>,
    config: RecognizerConfig,
}

impl OnnxEmbedder {
    pub fn new(config: &RecognizerConfig) -> Result<Self> {
        Self::new_with_model_path(config, &config.model_path)
    }

    pub fn new_with_model_path(config: &RecognizerConfig, model_path: &Path) -> Result<Self> {
        let environment = Arc::new(
            Environment::builder()
                .with_name("liftgate_embedder")
                .build()
                .map_err(|e| GateError::Model(format!("Failed to create environment: {}", e)))?
        );

        if !model_path.exists() {
            return Err(GateError::Model(
                format!("Embedding model not found at: {:?}", model_path)
            ));
        }

        let opt_level = match config.optimization_level {
            0 => GraphOptimizationLevel::Disable,
            1 => GraphOptimizationLevel::Level1,
            2 => GraphOptimizationLevel::Level2,
            _ => GraphOptimizationLevel::Level3,
        };
        let session = SessionBuilder::new(&environment)?
            .with_optimization_level(opt_level)?
            .with_model_from_file(model_path)?;

        tracing::info!("Loaded embedding model from {}", model_path.display());

        Ok(Self {
            session: Mutex::new(session),
            _environment: environment,
            config: config.clone(),
        })
    }

    fn to_tensor(&self, image: &DynamicImage) -> Array4<f32> {
        let size = self.config.input_size;
        let rgb = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
        let size = size as usize;
        let mean = self.config.normalization_mean;
        let std = self.config.normalization_std;

        let mut array = Array4::<f32>::zeros((1, 3, size, size));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for c in 0..3 {
                array[[0, c, y as usize, x as usize]] = (pixel[c] as f32 - mean) / std;
            }
        }
        array
    }
}

impl EmbeddingProvider for OnnxEmbedder {
    fn embed(&self, image: &DynamicImage) -> Result<Embedding> {
        let input_array = self.to_tensor(image);
        let cow_array = CowArray::from(input_array.into_dyn());

        let session = self.session.lock();
        let input_tensor = Value::from_array(session.allocator(), &cow_array)?;
        let outputs = session.run(vec![input_tensor])?;
        let output = outputs
            .first()
            .ok_or_else(|| GateError::Embedding("Model produced no output".into()))?;
        let embedding = output.try_extract::<f32>()?.view().to_owned().into_raw_vec();

        if embedding.is_empty() || embedding.iter().all(|v| *v == 0.0) {
            return Err(GateError::NoFaceDetected);
        }
        Ok(embedding)
    }
}

/// Cosine of the angle between `a` and `b`, in `[-1, 1]`.
///
/// Vectors of different length or with zero magnitude score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
