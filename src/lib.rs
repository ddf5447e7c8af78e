pub mod config;
pub mod core;
pub mod dev_mode;
pub mod error;
pub mod paths;
pub mod server;
pub mod session;

pub use config::Config;
pub use crate::core::{
    cosine_similarity, AuthOutcome, Authenticator, AuthorizedRegistry, Embedding,
    EmbeddingProvider, Level, LevelState, MatchPolicy, OnnxEmbedder,
};
pub use dev_mode::DevMode;
pub use error::{GateError, Result};
pub use server::{build_router, start_server, AppState};
pub use session::{Session, SessionStore};
