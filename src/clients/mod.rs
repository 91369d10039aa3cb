pub mod groq;
pub mod traits;

pub use groq::GroqClient;
pub use traits::{ChatBackend, ChatCompletion, ChatError, ChatMessage, ChatRequest};
