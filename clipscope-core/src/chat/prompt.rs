//! System prompt construction for project insight chats.
//!
//! The prompt carries the project identity, its own play/danmaku totals
//! over every record, and up to `max_records` records serialized one per
//! line. Records arrive in normalizer order (most played first), so the
//! truncation keeps the most-played entries.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::VideoRecord;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in a chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Build the system prompt for a project.
pub fn build_system_prompt(
    project_id: &str,
    project_name: Option<&str>,
    records: &[VideoRecord],
    max_records: usize,
) -> String {
    let total_plays: u64 = records
        .iter()
        .fold(0u64, |acc, r| acc.saturating_add(r.play_count));
    let total_danmaku: u64 = records
        .iter()
        .fold(0u64, |acc, r| acc.saturating_add(r.danmaku_count));
    let shown = records.len().min(max_records);

    let mut prompt = String::new();
    prompt.push_str(
        "You are a video analytics assistant. Answer questions about the crawled \
         video data below. Base every claim on the data; say so when the data \
         cannot answer a question.\n\n",
    );
    prompt.push_str(&format!("Project ID: {}\n", project_id));
    if let Some(name) = project_name.filter(|n| !n.trim().is_empty()) {
        prompt.push_str(&format!("Project name: {}\n", name));
    }
    prompt.push_str(&format!("Total videos: {}\n", records.len()));
    prompt.push_str(&format!("Total plays: {}\n", total_plays));
    prompt.push_str(&format!("Total danmaku: {}\n", total_danmaku));
    prompt.push_str(&format!(
        "\nVideos ({} of {}, most played first, one JSON object per line):\n",
        shown,
        records.len()
    ));

    for record in records.iter().take(max_records) {
        let line = json!({
            "title": record.title,
            "uploader": record.uploader,
            "playCount": record.play_count,
            "danmakuCount": record.danmaku_count,
            "duration": record.duration,
            "publishTime": record.publish_time,
        });
        prompt.push_str(&line.to_string());
        prompt.push('\n');
    }

    prompt
}

/// Assemble the full message list: system prompt, prior turns, new question.
pub fn build_messages(
    system_prompt: String,
    history: &[ChatMessage],
    question: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    // A caller-supplied system turn would shadow the project prompt
    messages.extend(
        history
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .cloned(),
    );
    messages.push(ChatMessage::user(question));
    messages
}
