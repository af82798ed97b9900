//! Core domain types and traits for streamlens.
//!
//! Everything that flows through a request lives here: chat messages and
//! their ordering, the session window, the prompt segments handed to answer
//! providers, and the trait seams the infrastructure crates implement
//! (`ChatLogStore`, `SessionResolver`, `AnswerProvider`).

pub mod chat;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod store;

pub use chat::{ChatMessage, MessageLimits, QueryRequest};
pub use error::{Error, ProviderError, Result, SessionError, StoreError};
pub use prompt::{PromptSegment, Role};
pub use provider::AnswerProvider;
pub use session::{SessionResolver, SessionWindow};
pub use store::{ChatLogStore, ScanCursor, ScanFilter, ScanPage, ScanRequest, StoredMessage};
