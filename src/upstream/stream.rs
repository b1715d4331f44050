//! Decoding of the upstream SSE stream into text fragments
//!
//! The provider sends `data: {chunk}` events terminated by `data: [DONE]`.
//! Each chunk's first-choice delta text becomes one fragment. Role-only and
//! finish chunks produce nothing.

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, future};

use super::types::{ChatCompletionChunk, DONE_SENTINEL};
use crate::error::{AppError, AppResult};

/// Turn a raw byte stream of SSE events into a stream of text fragments
///
/// The stream ends cleanly at `[DONE]` or when the bytes run out. A transport
/// error, a malformed chunk, or an in-band `error` object yields
/// [`AppError::UpstreamStream`].
pub fn text_fragments<S, B, E>(bytes: S) -> impl Stream<Item = AppResult<String>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    bytes
        .eventsource()
        .take_while(|event| {
            future::ready(!matches!(event, Ok(event) if event.data.trim() == DONE_SENTINEL))
        })
        .filter_map(|event| {
            future::ready(match event {
                Ok(event) => decode_chunk(&event.data).transpose(),
                Err(e) => Some(Err(AppError::UpstreamStream(e.to_string()))),
            })
        })
}

/// Decode one `data:` payload into its text fragment, if it has one
pub fn decode_chunk(data: &str) -> AppResult<Option<String>> {
    if data.trim().is_empty() {
        return Ok(None);
    }

    let chunk: ChatCompletionChunk = serde_json::from_str(data)
        .map_err(|e| AppError::UpstreamStream(format!("malformed completion chunk: {}", e)))?;

    if let Some(error) = chunk.error {
        return Err(AppError::UpstreamStream(
            error
                .message
                .unwrap_or_else(|| "provider reported an error".to_string()),
        ));
    }

    Ok(chunk.text().map(str::to_string))
}
