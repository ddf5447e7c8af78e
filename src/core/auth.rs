use crate::{
    config::Config,
    core::{
        preprocess::preprocess,
        recognizer::{cosine_similarity, EmbeddingProvider},
        registry::AuthorizedRegistry,
    },
    dev_mode::DevMode,
    error::Result,
};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How an upload is matched against the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Accept the first entry, in registry order, that clears the threshold.
    #[default]
    FirstAboveThreshold,
    /// Accept the highest-scoring entry that clears the threshold.
    BestMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceMatch {
    pub identifier: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Matched(FaceMatch),
    /// Nobody cleared the threshold. `best` is the closest entry, if any.
    NoMatch { best: Option<FaceMatch> },
}

/// Scores `probe` against every registry entry and applies `policy`.
///
/// A score must be strictly greater than `threshold` to count.
pub fn find_match(
    registry: &AuthorizedRegistry,
    probe: &[f32],
    threshold: f32,
    policy: MatchPolicy,
) -> AuthOutcome {
    let mut best: Option<FaceMatch> = None;

    for face in registry.iter() {
        let similarity = cosine_similarity(probe, &face.embedding);
        tracing::debug!("Comparing with {}: similarity = {:.4}", face.identifier, similarity);

        if policy == MatchPolicy::FirstAboveThreshold && similarity > threshold {
            return AuthOutcome::Matched(FaceMatch {
                identifier: face.identifier.clone(),
                similarity,
            });
        }

        if best.as_ref().map_or(true, |b| similarity > b.similarity) {
            best = Some(FaceMatch { identifier: face.identifier.clone(), similarity });
        }
    }

    match best {
        Some(m) if m.similarity > threshold => AuthOutcome::Matched(m),
        best => AuthOutcome::NoMatch { best },
    }
}

/// Upload-to-identity pipeline: decode, preprocess, embed, match.
pub struct Authenticator {
    registry: Arc<AuthorizedRegistry>,
    provider: Arc<dyn EmbeddingProvider>,
    config: Config,
    dev_mode: DevMode,
}

impl Authenticator {
    pub fn new(
        config: &Config,
        registry: Arc<AuthorizedRegistry>,
        provider: Arc<dyn EmbeddingProvider>,
        dev_mode: DevMode,
    ) -> Self {
        Self {
            registry,
            provider,
            config: config.clone(),
            dev_mode,
        }
    }

    pub fn registry(&self) -> &AuthorizedRegistry {
        &self.registry
    }

    /// Runs the full pipeline on raw upload bytes. Blocking; call it from a
    /// blocking-capable thread.
    pub fn authenticate(&self, upload: &[u8]) -> Result<AuthOutcome> {
        let image = image::load_from_memory(upload)?;
        self.authenticate_image(&image)
    }

    pub fn authenticate_image(&self, image: &DynamicImage) -> Result<AuthOutcome> {
        self.dev_mode.save_capture("upload", image);

        let prepared = preprocess(image, &self.config.preprocess);
        self.dev_mode.save_capture("preprocessed", &prepared);

        let embedding = self.provider.embed(&prepared)?;
        let outcome = find_match(
            &self.registry,
            &embedding,
            self.config.faces.similarity_threshold,
            self.config.faces.match_policy,
        );

        match &outcome {
            AuthOutcome::Matched(m) => {
                tracing::info!("Face matched {} (similarity {:.3})", m.identifier, m.similarity);
            }
            AuthOutcome::NoMatch { best: Some(b) } => {
                tracing::info!("Face not recognized (closest {} at {:.3})", b.identifier, b.similarity);
            }
            AuthOutcome::NoMatch { best: None } => {
                tracing::info!("Face not recognized (registry is empty)");
            }
        }
        Ok(outcome)
    }
}
