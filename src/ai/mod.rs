mod gemini;
mod generator;

pub use gemini::{GeminiClient, TextModel, UnconfiguredModel};
pub use generator::ContentGenerator;
