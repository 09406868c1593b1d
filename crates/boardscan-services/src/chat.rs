//! Streamed chat with the electronics assistant.
//!
//! The gateway speaks the OpenAI chat-completions dialect and streams
//! server-sent events: `data: {json}` lines carrying
//! `choices[0].delta.content`, terminated by `data: [DONE]`.

use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::ChatError;

pub const DEFAULT_CHAT_MODEL: &str = "google/gemini-2.5-flash";

pub const ASSISTANT_SYSTEM_PROMPT: &str = "You are Circuit Vision AI, an expert electronics \
assistant specializing in circuit board components and electronic systems. You identify and \
explain electronic components (resistors, capacitors, inductors, transistors, ICs, diodes), read \
component values from markings and color codes, explain how components work and where they are \
applied, help users understand board layouts, troubleshoot common circuit problems and give \
safety tips for working with electronics. Be helpful and educational, and keep responses concise \
but informative.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Body of one streamed completion request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// The system prompt followed by the conversation so far.
    pub fn for_conversation(history: &[ChatMessage]) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::new(ChatRole::System, ASSISTANT_SYSTEM_PROMPT));
        messages.extend_from_slice(history);
        Self {
            model: DEFAULT_CHAT_MODEL.to_string(),
            messages,
            stream: true,
        }
    }
}

/// Remote chat endpoint returning the raw event stream in arbitrary chunks.
pub trait ChatService {
    type Chunks: Iterator<Item = Result<Vec<u8>, ChatError>>;

    /// Non-success statuses should be reported via [`ChatError::from_status`].
    fn stream_chat(&mut self, request: &ChatCompletionRequest) -> Result<Self::Chunks, ChatError>;
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Incremental decoder for the event stream.
///
/// Bytes are buffered until a full line is available, so chunks may split
/// lines (and multi-byte characters) anywhere.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once the `[DONE]` sentinel has been seen; further input is
    /// ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one chunk and collect the content tokens of every completed line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);
        let mut tokens = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.decode_line(&line, &mut tokens);
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        tokens
    }

    /// Flush a trailing line that was never newline-terminated.
    pub fn finish(&mut self) -> Vec<String> {
        let mut tokens = Vec::new();
        if !self.done && !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.decode_line(&line, &mut tokens);
        }
        self.buffer.clear();
        tokens
    }

    fn decode_line(&mut self, raw: &[u8], tokens: &mut Vec<String>) {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches(['\n', '\r']);
        // blank separators, comments and non-data fields
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.trim_start();
        if data == "[DONE]" {
            self.done = true;
            return;
        }
        match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => {
                if let Some(content) = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                    .filter(|c| !c.is_empty())
                {
                    tokens.push(content);
                }
            }
            Err(err) => log::warn!("skipping malformed stream event: {err}"),
        }
    }
}

/// Conversation state: user turns plus assistant replies growing token by
/// token.
#[derive(Debug, Default)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    loading: bool,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Append a user turn and stream the reply into one assistant message,
    /// calling `on_token` for every token as it arrives.
    ///
    /// Blank input is ignored. On failure the user turn and any partial
    /// reply stay in the transcript.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn send<S, F>(
        &mut self,
        service: &mut S,
        text: &str,
        mut on_token: F,
    ) -> Result<(), ChatError>
    where
        S: ChatService + ?Sized,
        F: FnMut(&str),
    {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        self.messages.push(ChatMessage::user(text));
        self.loading = true;
        let result = self.stream_reply(service, &mut on_token);
        self.loading = false;
        if let Err(err) = &result {
            log::error!("chat failed: {err}");
        }
        result
    }

    fn stream_reply<S, F>(&mut self, service: &mut S, on_token: &mut F) -> Result<(), ChatError>
    where
        S: ChatService + ?Sized,
        F: FnMut(&str),
    {
        let request = ChatCompletionRequest::for_conversation(&self.messages);
        let chunks = service.stream_chat(&request)?;
        let mut decoder = SseDecoder::new();
        for chunk in chunks {
            for token in decoder.push(&chunk?) {
                self.append_assistant(&token);
                on_token(&token);
            }
            if decoder.is_done() {
                break;
            }
        }
        for token in decoder.finish() {
            self.append_assistant(&token);
            on_token(&token);
        }
        Ok(())
    }

    fn append_assistant(&mut self, token: &str) {
        match self.messages.last_mut() {
            Some(last) if last.role == ChatRole::Assistant => last.content.push_str(token),
            _ => self.messages.push(ChatMessage::assistant(token)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({ "choices": [{ "delta": { "content": content } }] })
        )
    }

    #[test]
    fn decodes_tokens_across_split_chunks() {
        let stream = format!(
            "{}{}: keep-alive\n\ndata: [DONE]\n\n",
            event("Ohm's "),
            event("law ✓")
        );
        let bytes = stream.as_bytes();
        let mut decoder = SseDecoder::new();
        let mut tokens = Vec::new();
        // three-byte chunks split the check mark's UTF-8 encoding
        for chunk in bytes.chunks(3) {
            tokens.extend(decoder.push(chunk));
        }
        assert_eq!(tokens, ["Ohm's ", "law ✓"]);
        assert!(decoder.is_done());
    }

    #[test]
    fn crlf_and_role_only_deltas() {
        let mut decoder = SseDecoder::new();
        let tokens = decoder.push(
            concat!(
                "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\r\n\r\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\r\n",
            )
            .as_bytes(),
        );
        assert_eq!(tokens, ["Hi"]);
    }

    #[test]
    fn malformed_events_are_skipped() {
        let mut decoder = SseDecoder::new();
        let mut tokens = decoder.push(b"data: {not json}\n");
        tokens.extend(decoder.push(event("ok").as_bytes()));
        assert_eq!(tokens, ["ok"]);
    }

    #[test]
    fn unterminated_last_line_is_flushed() {
        let mut decoder = SseDecoder::new();
        let stream = event("tail");
        let trimmed = stream.trim_end();
        assert!(decoder.push(trimmed.as_bytes()).is_empty());
        assert_eq!(decoder.finish(), ["tail"]);
    }

    #[test]
    fn input_after_done_is_ignored() {
        let mut decoder = SseDecoder::new();
        let mut input = b"data: [DONE]\n".to_vec();
        input.extend_from_slice(event("late").as_bytes());
        assert!(decoder.push(&input).is_empty());
        assert!(decoder.finish().is_empty());
    }

    struct Scripted {
        chunks: Vec<Result<Vec<u8>, ChatError>>,
        status: Option<u16>,
        seen: Vec<ChatCompletionRequest>,
    }

    impl ChatService for Scripted {
        type Chunks = std::vec::IntoIter<Result<Vec<u8>, ChatError>>;

        fn stream_chat(
            &mut self,
            request: &ChatCompletionRequest,
        ) -> Result<Self::Chunks, ChatError> {
            self.seen.push(request.clone());
            if let Some(status) = self.status {
                return Err(ChatError::from_status(status));
            }
            Ok(std::mem::take(&mut self.chunks).into_iter())
        }
    }

    fn scripted(parts: &[&str]) -> Scripted {
        let mut chunks: Vec<_> = parts.iter().map(|p| Ok(event(p).into_bytes())).collect();
        chunks.push(Ok(b"data: [DONE]\n\n".to_vec()));
        Scripted {
            chunks,
            status: None,
            seen: Vec::new(),
        }
    }

    #[test]
    fn transcript_streams_into_one_assistant_message() {
        let mut service = scripted(&["A capacitor ", "stores ", "charge."]);
        let mut transcript = ChatTranscript::new();
        let mut streamed = String::new();
        transcript
            .send(&mut service, "  What is a capacitor? ", |t| streamed.push_str(t))
            .expect("send");

        assert_eq!(
            transcript.messages(),
            [
                ChatMessage::user("What is a capacitor?"),
                ChatMessage::assistant("A capacitor stores charge."),
            ]
        );
        assert_eq!(streamed, "A capacitor stores charge.");
        assert!(!transcript.is_loading());

        let req = &service.seen[0];
        assert!(req.stream);
        assert_eq!(req.messages[0].role, ChatRole::System);
        assert_eq!(req.messages[1], ChatMessage::user("What is a capacitor?"));
    }

    #[test]
    fn second_turn_sends_full_history() {
        let mut transcript = ChatTranscript::new();
        transcript
            .send(&mut scripted(&["Hi."]), "Hello", |_| {})
            .expect("first");
        let mut service = scripted(&["Sure."]);
        transcript.send(&mut service, "Explain transistors", |_| {}).expect("second");
        assert_eq!(transcript.messages().len(), 4);
        assert_eq!(service.seen[0].messages.len(), 4);
    }

    #[test]
    fn gateway_limits_surface_as_errors() {
        let mut service = scripted(&[]);
        service.status = Some(402);
        let mut transcript = ChatTranscript::new();
        let err = transcript.send(&mut service, "hi", |_| {}).unwrap_err();
        assert!(matches!(err, ChatError::CreditsExhausted));
        assert_eq!(transcript.messages(), [ChatMessage::user("hi")]);
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut service = scripted(&["unused"]);
        let mut transcript = ChatTranscript::new();
        transcript.send(&mut service, "   ", |_| {}).expect("noop");
        assert!(transcript.messages().is_empty());
        assert!(service.seen.is_empty());
    }

    #[test]
    fn broken_stream_keeps_partial_reply() {
        let mut service = scripted(&["Partial"]);
        service.chunks.insert(1, Err(ChatError::Stream("connection reset".into())));
        let mut transcript = ChatTranscript::new();
        assert!(transcript.send(&mut service, "hi", |_| {}).is_err());
        assert_eq!(transcript.messages()[1], ChatMessage::assistant("Partial"));
        transcript.clear();
        assert!(transcript.messages().is_empty());
    }
}
