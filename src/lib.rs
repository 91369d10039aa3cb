pub mod clients;
pub mod condenser;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod priority;
pub mod reconciler;
pub mod schemas;
pub mod services;
pub mod session;

pub use error::{CrewDigestError, FailureClass, Result};
pub use pipeline::{InvocationContext, ResultPipeline, normalize_and_extract};
pub use schemas::{CanonicalResult, ExportDocument, RecommendationItem};
pub use services::ServiceId;

// Load env with the standard resolution:
// 1) CREW_ENV_FILE if set
// 2) ./.env, silently ignored if missing
pub fn load_env() {
    if let Ok(env_path) = std::env::var("CREW_ENV_FILE") {
        let _ = dotenvy::from_path(env_path);
    } else {
        let _ = dotenvy::dotenv();
    }
}
