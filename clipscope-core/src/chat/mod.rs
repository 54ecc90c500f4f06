//! Chat over a project's records
//!
//! - [`prompt`] builds the system prompt and message list
//! - [`stream`] decodes streamed responses
//! - [`client`] talks to an OpenAI-compatible completions endpoint
//!
//! A [`ChatClient`] is built once from [`ChatConfig`](crate::config::ChatConfig)
//! and passed to whatever needs it; nothing here holds global state.

pub mod client;
pub mod prompt;
pub mod stream;

pub use client::{ChatBackend, ChatClient};
pub use prompt::{build_messages, build_system_prompt, ChatMessage, ChatRole};
pub use stream::{ChatStream, SseDecoder};

use crate::error::Result;
use crate::types::{RawProjectDocument, VideoRecord};

/// Ask a question about a project's records.
///
/// Builds the system prompt from `document` and `records`, appends
/// `history` and `question`, and starts a streamed completion.
pub async fn ask_project(
    backend: &dyn ChatBackend,
    document: &RawProjectDocument,
    records: &[VideoRecord],
    max_records: usize,
    history: &[ChatMessage],
    question: &str,
) -> Result<ChatStream> {
    let system = build_system_prompt(
        &document.id,
        document.name.as_deref(),
        records,
        max_records,
    );
    let messages = build_messages(system, history, question);
    backend.stream_chat(messages).await
}
