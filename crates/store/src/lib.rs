//! Chat log store access for streamlens.
//!
//! `DynamoClient` speaks the DynamoDB JSON protocol directly over reqwest
//! with SigV4 request signing; `scanner` layers the session-scoped,
//! cap-bounded pagination policy on top of the `ChatLogStore` trait.

pub mod dynamodb;
pub mod scanner;
pub mod sigv4;

pub use dynamodb::DynamoClient;
pub use scanner::collect_session_messages;
pub use sigv4::Credentials;
