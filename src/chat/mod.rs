pub mod client;
pub mod markdown;
pub mod service;

pub use client::{ChatClient, ChatReply, API_KEY_ENV};
pub use markdown::render_markdown;
pub use service::{build_query, ChatService, ConversationContext};
