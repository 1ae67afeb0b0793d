pub mod gemini;
pub mod store;
pub mod wire;

pub use gemini::GeminiClient;
pub use store::RestStore;
