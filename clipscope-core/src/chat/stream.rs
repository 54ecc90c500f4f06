//! Streaming chat responses.
//!
//! Chat completions arrive as server-sent events:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"美食"}}]}
//!
//! data: [DONE]
//! ```
//!
//! [`SseDecoder`] turns raw body chunks into text fragments and
//! [`ChatStream`] exposes them as a lazy, finite [`Stream`]. A stream is
//! consumed once; dropping it drops the response body and cancels the
//! request.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::{self, Stream, StreamExt};
use serde_json::Value;

use crate::error::{Error, Result};

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

/// Incremental server-sent-event decoder.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the end-of-stream marker has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a body chunk, returning any fragments it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<String>> {
        if self.done {
            return vec![];
        }
        self.buffer.extend_from_slice(chunk);

        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.decode_line(&line, &mut out);
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        out
    }

    /// Flush a trailing line that had no newline.
    pub fn finish(&mut self) -> Vec<Result<String>> {
        let mut out = Vec::new();
        if !self.done && !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.decode_line(&line, &mut out);
        }
        self.done = true;
        out
    }

    fn decode_line(&mut self, raw: &[u8], out: &mut Vec<Result<String>>) {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches(['\r', '\n']);

        // Comments, event names and ids carry no content
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return;
        };
        let payload = payload.trim();
        if payload.is_empty() {
            return;
        }
        if payload == DONE_MARKER {
            self.done = true;
            return;
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(event) => {
                if let Some(message) = event
                    .get("error")
                    .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
                {
                    out.push(Err(Error::Chat(message.to_string())));
                    return;
                }
                if let Some(text) = event
                    .pointer("/choices/0/delta/content")
                    .and_then(Value::as_str)
                    .filter(|t| !t.is_empty())
                {
                    out.push(Ok(text.to_string()));
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed chat event");
            }
        }
    }
}

/// A lazy, finite stream of response text fragments.
pub struct ChatStream {
    inner: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
}

impl ChatStream {
    /// Wrap an existing fragment stream.
    pub fn new<S>(inner: S) -> Self
    where
        S: Stream<Item = Result<String>> + Send + 'static,
    {
        Self {
            inner: Box::pin(inner),
        }
    }

    /// Decode a server-sent-event body into fragments.
    ///
    /// The body is not read past the end-of-stream marker. A transport
    /// error is yielded once and ends the stream.
    pub fn from_sse<S, B, E>(body: S) -> Self
    where
        S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        let state = SseState {
            body: Box::pin(body),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        };

        Self::new(stream::unfold(state, |mut state| async move {
            loop {
                if let Some(item) = state.pending.pop_front() {
                    return Some((item, state));
                }
                if state.finished {
                    return None;
                }
                match state.body.next().await {
                    Some(Ok(chunk)) => {
                        let fragments = state.decoder.push(chunk.as_ref());
                        state.pending.extend(fragments);
                        state.finished = state.decoder.is_done();
                    }
                    Some(Err(e)) => {
                        state.finished = true;
                        state
                            .pending
                            .push_back(Err(Error::Chat(format!("Response stream failed: {}", e))));
                    }
                    None => {
                        let fragments = state.decoder.finish();
                        state.pending.extend(fragments);
                        state.finished = true;
                    }
                }
            }
        }))
    }

    /// Drain the stream, concatenating every fragment.
    pub async fn collect_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl Stream for ChatStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream").finish_non_exhaustive()
    }
}

struct SseState<B, E> {
    body: Pin<Box<dyn Stream<Item = std::result::Result<B, E>> + Send>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": text}}]})
        )
    }

    fn body(chunks: Vec<String>) -> impl Stream<Item = std::result::Result<Vec<u8>, std::io::Error>> {
        stream::iter(chunks.into_iter().map(|c| Ok(c.into_bytes())))
    }

    #[test]
    fn test_decoder_lines_and_done() {
        let mut decoder = SseDecoder::new();
        let input = format!(
            ": keep-alive\nevent: message\n{}{}data: [DONE]\n\n{}",
            event("美食"),
            event("教程"),
            event("ignored")
        );
        let out: Vec<String> = decoder
            .push(input.as_bytes())
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(out, vec!["美食", "教程"]);
        assert!(decoder.is_done());
        assert!(decoder.push(event("late").as_bytes()).is_empty());
    }

    #[test]
    fn test_decoder_split_multibyte() {
        let mut decoder = SseDecoder::new();
        let line = event("美食");
        let bytes = line.as_bytes();
        // Split inside the first ideograph
        let split = line.find('美').unwrap() + 1;
        assert!(decoder.push(&bytes[..split]).is_empty());
        let out = decoder.push(&bytes[split..]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap(), "美食");
    }

    #[test]
    fn test_decoder_skips_empty_and_malformed() {
        let mut decoder = SseDecoder::new();
        let input = "data: {not json}\ndata: {\"choices\":[{\"delta\":{}}]}\ndata: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n";
        assert!(decoder.push(input.as_bytes()).is_empty());
        assert!(!decoder.is_done());
    }

    #[test]
    fn test_decoder_error_event() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(b"data: {\"error\":{\"message\":\"rate limited\"}}\n");
        assert!(matches!(&out[0], Err(Error::Chat(m)) if m == "rate limited"));
    }

    #[test]
    fn test_decoder_finish_flushes_trailing_line() {
        let mut decoder = SseDecoder::new();
        let line = event("tail");
        let trimmed = line.trim_end();
        assert!(decoder.push(trimmed.as_bytes()).is_empty());
        let out = decoder.finish();
        assert_eq!(out[0].as_ref().unwrap(), "tail");
        assert!(decoder.is_done());
    }

    #[tokio::test]
    async fn test_stream_collect_text() {
        let stream = ChatStream::from_sse(body(vec![
            event("Top "),
            event("video: "),
            "data: {\"choices\":[{\"delta\":{\"content\":\"美".to_string(),
            "食\"}}]}\n\n".to_string(),
            "data: [DONE]\n\n".to_string(),
        ]));
        assert_eq!(stream.collect_text().await.unwrap(), "Top video: 美食");
    }

    #[tokio::test]
    async fn test_stream_stops_at_done() {
        let stream = ChatStream::from_sse(body(vec![
            event("a"),
            "data: [DONE]\n\n".to_string(),
            event("b"),
        ]));
        let fragments: Vec<_> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(fragments, vec!["a"]);
    }

    #[tokio::test]
    async fn test_stream_transport_error_ends_stream() {
        let chunks: Vec<std::result::Result<Vec<u8>, std::io::Error>> = vec![
            Ok(event("partial").into_bytes()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(event("never").into_bytes()),
        ];
        let mut stream = ChatStream::from_sse(stream::iter(chunks));

        assert_eq!(stream.next().await.unwrap().unwrap(), "partial");
        assert!(matches!(stream.next().await, Some(Err(Error::Chat(_)))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_collect_text_propagates_error() {
        let stream = ChatStream::new(stream::iter(vec![
            Ok("a".to_string()),
            Err(Error::Chat("boom".to_string())),
        ]));
        assert!(stream.collect_text().await.is_err());
    }
}
