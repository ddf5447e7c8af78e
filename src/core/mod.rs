pub mod auth;
pub mod level;
pub mod preprocess;
pub mod recognizer;
pub mod registry;

pub use auth::{find_match, AuthOutcome, Authenticator, FaceMatch, MatchPolicy};
pub use level::{Level, LevelError, LevelState};
pub use preprocess::preprocess;
pub use recognizer::{cosine_similarity, Embedding, EmbeddingProvider, OnnxEmbedder};
pub use registry::{AuthorizedFace, AuthorizedRegistry};
