//! Answer provider lanes for streamlens.
//!
//! Two lanes implement `AnswerProvider`: Gemini (flattened prompt, internal
//! model-candidate fallback) and OpenAI (role-tagged messages, one fixed
//! model). `AnswerGateway` chains the enabled lanes in precedence order.

pub mod fallback;
pub mod gemini;
pub mod openai;

pub use fallback::{AnswerGateway, build_from_config};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
