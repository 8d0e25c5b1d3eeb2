pub mod ai_client;
pub mod file_store;
pub mod gemini;

pub use ai_client::{AiRoute, GeminiClient};
pub use file_store::FileStore;
pub use gemini::GeminiHttp;
