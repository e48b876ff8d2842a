//! Streaming Bridge — one upstream call in, one normalized SSE channel out.
//!
//! Flow: `open()` performs the provider call and fails fast (502) on anything that
//! goes wrong before streaming starts. The resulting [`Upstream`] is handed to a
//! producer task that writes [`StreamEvent`]s into a bounded channel; the SSE
//! response body is the consumer. Dropping the response body (client abort) cancels
//! the token the producer selects on, which drops the upstream reader.
//!
//! Channel invariants:
//! - events are ordered `generating → progress* → exactly one of done | error`
//! - nothing is emitted after an abort
//! - closing the sink twice, or emitting after the consumer left, is a no-op

use std::convert::Infallible;
use std::fmt::Display;

use axum::http::{header, HeaderValue};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::errors::AppError;
use crate::llm_client::classify::classify;
use crate::llm_client::provider::{Provider, ProviderFamily, ProviderRequest};
use crate::models::cv::CvData;

/// A progress event is emitted after every this many streamed fragments.
pub const PROGRESS_EVERY: usize = 10;
const CHANNEL_CAPACITY: usize = 32;

// ────────────────────────────────────────────────────────────────────────────
// Wire protocol
// ────────────────────────────────────────────────────────────────────────────

/// The single event protocol every provider path emits, tagged on `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StreamEvent {
    Generating,
    Progress {
        chunks: usize,
    },
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(rename = "cvData", default, skip_serializing_if = "Option::is_none")]
        cv_data: Option<Box<CvData>>,
    },
    Error {
        error: String,
        #[serde(rename = "rawContent", default, skip_serializing_if = "Option::is_none")]
        raw_content: Option<String>,
    },
}

impl StreamEvent {
    pub fn done_content(content: String) -> Self {
        StreamEvent::Done {
            content: Some(content),
            cv_data: None,
        }
    }

    pub fn done_cv(cv: CvData) -> Self {
        StreamEvent::Done {
            content: None,
            cv_data: Some(Box::new(cv)),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            error: message.into(),
            raw_content: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }

    /// `data: <json>` framing.
    fn to_sse(&self) -> Event {
        let data = serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"status":"error","error":"Failed to encode stream event"}"#.to_string()
        });
        Event::default().data(data)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output sink
// ────────────────────────────────────────────────────────────────────────────

/// Producer half of the event channel.
pub struct EventSink {
    tx: Option<mpsc::Sender<StreamEvent>>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (Self { tx: Some(tx) }, rx)
    }

    /// Sends an event. Returns `false`, and closes the sink, once the consumer is gone.
    /// A terminal event closes the sink after it is delivered.
    pub async fn emit(&mut self, event: StreamEvent) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        let terminal = event.is_terminal();
        if tx.send(event).await.is_err() {
            debug!("Event consumer went away; closing sink");
            self.tx = None;
            return false;
        }
        if terminal {
            self.close();
        }
        true
    }

    /// Idempotent.
    pub fn close(&mut self) {
        self.tx = None;
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.tx.is_some()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Upstream call
// ────────────────────────────────────────────────────────────────────────────

/// An established upstream response, ready to be re-emitted as events.
pub enum Upstream {
    /// Single-shot families: the whole assistant text is already known.
    Complete { provider: Provider, content: String },
    /// Local streaming provider: an NDJSON byte stream still to be read.
    Streaming {
        provider: Provider,
        body: BoxStream<'static, Result<Bytes, reqwest::Error>>,
    },
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

impl ChatCompletionResponse {
    fn text(self) -> Option<String> {
        self.choices.into_iter().next()?.message?.content
    }
}

impl AnthropicResponse {
    /// Extracts the text content from the first text block.
    fn text(self) -> Option<String> {
        self.content
            .into_iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text)
    }
}

/// Performs the single upstream call for a request.
///
/// Any failure here happens before a channel exists and becomes `AppError::Upstream`.
pub async fn open(client: &Client, request: ProviderRequest) -> Result<Upstream, AppError> {
    let provider = request.provider;
    let family = request.family();
    info!("Calling {provider} at {}", request.url);

    let response = client
        .post(&request.url)
        .headers(request.headers)
        .json(&request.body)
        .send()
        .await
        .map_err(|e| upstream_error(provider, 0, format!("Could not reach {provider}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("{provider} returned {status}: {}", truncate(&body, 500));
        return Err(upstream_error(
            provider,
            status.as_u16(),
            classify(status.as_u16(), &body, provider.display_name()),
        ));
    }

    let empty = |what: &str| {
        upstream_error(
            provider,
            status.as_u16(),
            format!("{provider} returned {what}."),
        )
    };

    match family {
        ProviderFamily::LocalStreaming => {
            if response.content_length() == Some(0) {
                return Err(empty("an empty response body"));
            }
            Ok(Upstream::Streaming {
                provider,
                body: response.bytes_stream().boxed(),
            })
        }
        ProviderFamily::OpenAiCompatible => {
            let parsed: ChatCompletionResponse =
                response.json().await.map_err(|_| empty("an unreadable response"))?;
            let content = parsed.text().ok_or_else(|| empty("no content"))?;
            Ok(Upstream::Complete { provider, content })
        }
        ProviderFamily::Anthropic => {
            let parsed: AnthropicResponse =
                response.json().await.map_err(|_| empty("an unreadable response"))?;
            let content = parsed.text().ok_or_else(|| empty("no content"))?;
            Ok(Upstream::Complete { provider, content })
        }
    }
}

fn upstream_error(provider: Provider, status: u16, message: String) -> AppError {
    AppError::Upstream {
        message,
        status,
        provider: provider.display_name().to_string(),
    }
}

/// Cuts `text` to at most `max_chars` characters on a char boundary.
pub fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Producer
// ────────────────────────────────────────────────────────────────────────────

/// Spawns the producer task for an established upstream and returns the consumer end.
///
/// `finish` turns the complete assistant text into the terminal event.
pub fn spawn_producer<F>(
    upstream: Upstream,
    cancel: CancellationToken,
    finish: F,
) -> mpsc::Receiver<StreamEvent>
where
    F: FnOnce(String) -> StreamEvent + Send + 'static,
{
    let (mut sink, rx) = EventSink::channel();

    let task = async move {
        match upstream {
            Upstream::Complete { provider, content } => {
                debug!("{provider} answered in one shot ({} chars)", content.len());
                emit_single_shot(&mut sink, &cancel, content, finish).await;
            }
            Upstream::Streaming { provider, body } => {
                debug!("Reading {provider} NDJSON stream");
                pump_ndjson(body, &mut sink, &cancel, finish).await;
            }
        }
    };
    tokio::spawn(task.instrument(tracing::Span::current()));

    rx
}

async fn emit_single_shot<F>(
    sink: &mut EventSink,
    cancel: &CancellationToken,
    content: String,
    finish: F,
) where
    F: FnOnce(String) -> StreamEvent,
{
    if sink.emit(StreamEvent::Generating).await && !cancel.is_cancelled() {
        sink.emit(finish(content)).await;
    }
    sink.close();
}

enum Step<T> {
    Aborted,
    Next(Option<T>),
}

/// Reads an NDJSON byte stream to completion, abort, or fault.
pub async fn pump_ndjson<S, E, F>(
    mut body: S,
    sink: &mut EventSink,
    cancel: &CancellationToken,
    finish: F,
) where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
    F: FnOnce(String) -> StreamEvent,
{
    if !sink.emit(StreamEvent::Generating).await {
        return;
    }

    let mut lines = NdjsonAccumulator::default();
    loop {
        let step = tokio::select! {
            biased;
            _ = cancel.cancelled() => Step::Aborted,
            next = body.next() => Step::Next(next),
        };

        match step {
            Step::Aborted => {
                debug!("Client aborted; cancelling upstream reader");
                drop(body);
                sink.close();
                return;
            }
            Step::Next(Some(Ok(chunk))) => {
                for chunks in lines.push(&chunk) {
                    if !sink.emit(StreamEvent::Progress { chunks }).await {
                        return;
                    }
                }
                if lines.is_done() || lines.fault().is_some() {
                    break;
                }
            }
            Step::Next(Some(Err(e))) => {
                warn!("Upstream stream failed: {e}");
                sink.emit(StreamEvent::error(e.to_string())).await;
                sink.close();
                return;
            }
            Step::Next(None) => {
                if let Some(chunks) = lines.finish() {
                    if !sink.emit(StreamEvent::Progress { chunks }).await {
                        return;
                    }
                }
                if !lines.is_done() {
                    debug!("Upstream ended without a done record; delivering accumulated text");
                }
                break;
            }
        }
    }
    drop(body);

    if cancel.is_cancelled() {
        sink.close();
        return;
    }

    let terminal = match lines.fault() {
        Some(fault) => StreamEvent::error(fault.to_string()),
        None => {
            info!(
                "Stream complete: {} fragments, {} chars",
                lines.fragments(),
                lines.content().len()
            );
            finish(lines.into_content())
        }
    };
    sink.emit(terminal).await;
    sink.close();
}

// ────────────────────────────────────────────────────────────────────────────
// NDJSON assembly
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LocalStreamRecord {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Reassembles newline-delimited JSON records split arbitrarily across chunks and
/// accumulates their `response` fragments. Malformed lines are skipped.
#[derive(Debug, Default)]
pub struct NdjsonAccumulator {
    pending: Vec<u8>,
    content: String,
    fragments: usize,
    done: bool,
    fault: Option<String>,
}

impl NdjsonAccumulator {
    /// Feeds a chunk and returns the fragment counts at which a progress event is due.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<usize> {
        let mut milestones = Vec::new();
        if self.is_finished() {
            return milestones;
        }
        self.pending.extend_from_slice(chunk);

        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            milestones.extend(self.consume_line(&line));
            if self.is_finished() {
                self.pending.clear();
                break;
            }
        }
        milestones
    }

    /// Parses whatever is left once the upstream closes without a trailing newline.
    pub fn finish(&mut self) -> Option<usize> {
        if self.is_finished() || self.pending.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        self.consume_line(&line)
    }

    fn consume_line(&mut self, line: &[u8]) -> Option<usize> {
        let text = String::from_utf8_lossy(line);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let record: LocalStreamRecord = match serde_json::from_str(text) {
            Ok(r) => r,
            Err(_) => {
                debug!("Skipping malformed NDJSON line ({} bytes)", line.len());
                return None;
            }
        };

        if let Some(error) = record.error.filter(|e| !e.trim().is_empty()) {
            self.fault = Some(error);
            return None;
        }
        if record.done {
            self.done = true;
        }

        let fragment = record.response?;
        self.content.push_str(&fragment);
        self.fragments += 1;
        (self.fragments % PROGRESS_EVERY == 0).then_some(self.fragments)
    }

    fn is_finished(&self) -> bool {
        self.done || self.fault.is_some()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// An `{"error": ..}` record reported by the local server mid-stream.
    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SSE response
// ────────────────────────────────────────────────────────────────────────────

/// Wraps the consumer end in an SSE response. Dropping the response body cancels
/// `cancel`, which is how a client abort reaches the producer.
pub fn sse_response(rx: mpsc::Receiver<StreamEvent>, cancel: CancellationToken) -> Response {
    let abort_on_drop = cancel.drop_guard();
    let events = ReceiverStream::new(rx).map(move |event| {
        let _held = &abort_on_drop;
        Ok::<_, Infallible>(event.to_sse())
    });

    let mut response = Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

/// Opens the upstream and, on success, returns the SSE response carrying its events.
pub async fn stream_to_sse<F>(
    client: &Client,
    request: ProviderRequest,
    finish: F,
) -> Result<Response, AppError>
where
    F: FnOnce(String) -> StreamEvent + Send + 'static,
{
    let upstream = open(client, request).await?;
    let cancel = CancellationToken::new();
    let rx = spawn_producer(upstream, cancel.clone(), finish);
    Ok(sse_response(rx, cancel))
}
