//! Body capture for logging.
//!
//! # Responsibilities
//! - Buffer a request or response body so it can be logged
//! - Hand back a body that yields the same frames to its consumer
//! - Decode captured bytes into a [`Payload`]
//!
//! # Design Decisions
//! - Bodies with a known length are replayed as a full body; streamed
//!   bodies are replayed as a stream so framing stays the same
//! - Trailers are kept
//! - Capture stops past the byte limit: the prefix and the untouched
//!   remainder are chained, and the payload is logged as a marker. A body
//!   that declared its length keeps declaring it
//! - A read error is replayed after the prefix, never swallowed

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::HeaderMap;
use bytes::{Bytes, BytesMut};
use futures_util::future::ready;
use futures_util::stream::{self, StreamExt};
use http_body::{Body as _, Frame, SizeHint};
use http_body_util::{BodyExt, BodyStream, StreamBody};

use crate::observability::Payload;

/// What was observed while buffering a body.
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    /// The whole body was read.
    Complete(Bytes),
    /// The body grew past the limit; only a prefix was read.
    Exceeded { limit: usize },
    /// The body stream failed before its end.
    Failed(String),
}

impl Capture {
    /// Payload to log for this capture; `None` when nothing usable was read.
    pub fn payload(&self) -> Option<Payload> {
        match self {
            Capture::Complete(bytes) => decode(bytes),
            Capture::Exceeded { limit } => Some(Payload::Text(format!(
                "<body larger than {limit} bytes not captured>"
            ))),
            Capture::Failed(_) => None,
        }
    }
}

/// A buffered body together with its replacement.
#[derive(Debug)]
pub struct Captured {
    /// Body to forward in place of the consumed one.
    pub body: Body,
    pub capture: Capture,
}

/// Decode bytes as JSON, falling back to (lossy) text. Empty input is `None`.
pub fn decode(bytes: &[u8]) -> Option<Payload> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(Payload::Json(value)),
        Err(_) => Some(Payload::Text(String::from_utf8_lossy(bytes).into_owned())),
    }
}

/// Read `body` up to `limit` bytes and return a body that replays it.
pub async fn capture(mut body: Body, limit: usize) -> Captured {
    let length = body.size_hint().exact();
    let mut data = BytesMut::new();
    let mut trailers: Option<HeaderMap> = None;

    while let Some(frame) = body.frame().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                let capture = Capture::Failed(e.to_string());
                let frames = stream::iter([Ok(Frame::data(data.freeze())), Err(e)]);
                return Captured {
                    body: Body::new(StreamBody::new(frames)),
                    capture,
                };
            }
        };

        match frame.into_data() {
            Ok(chunk) => {
                data.extend_from_slice(&chunk);
                if data.len() > limit {
                    let head = stream::once(ready(Ok(Frame::data(data.freeze()))));
                    let rest = Body::new(StreamBody::new(head.chain(BodyStream::new(body))));
                    let body = match length {
                        Some(remaining) => Body::new(KnownLength { inner: rest, remaining }),
                        None => rest,
                    };
                    return Captured {
                        body,
                        capture: Capture::Exceeded { limit },
                    };
                }
            }
            Err(frame) => {
                if let Ok(map) = frame.into_trailers() {
                    trailers.get_or_insert_with(HeaderMap::new).extend(map);
                }
            }
        }
    }

    let bytes = data.freeze();
    let body = if length.is_none() || trailers.is_some() {
        replay(bytes.clone(), trailers)
    } else {
        Body::from(bytes.clone())
    };
    Captured {
        body,
        capture: Capture::Complete(bytes),
    }
}

fn replay(data: Bytes, trailers: Option<HeaderMap>) -> Body {
    let mut frames = vec![Ok::<_, axum::Error>(Frame::data(data))];
    if let Some(map) = trailers {
        frames.push(Ok(Frame::trailers(map)));
    }
    Body::new(StreamBody::new(stream::iter(frames)))
}

/// Body that reports an exact remaining length on behalf of `inner`.
struct KnownLength {
    inner: Body,
    remaining: u64,
}

impl http_body::Body for KnownLength {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, axum::Error>>> {
        let polled = Pin::new(&mut self.inner).poll_frame(cx);
        if let Poll::Ready(Some(Ok(frame))) = &polled {
            if let Some(data) = frame.data_ref() {
                self.remaining = self.remaining.saturating_sub(data.len() as u64);
            }
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining)
    }
}
