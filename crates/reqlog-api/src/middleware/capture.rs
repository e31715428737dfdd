//! Response interception: observes the body sent to the client without
//! changing the bytes, size hint, or end-of-stream the client sees.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::{Bytes, BytesMut};
use http_body::{Frame, SizeHint};
use pin_project_lite::pin_project;
use serde_json::{Map, Value};

/// Stored in place of redacted header values.
pub const REDACTED: &str = "[REDACTED]";

/// A body as recorded in a log record.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedBody {
    /// Nothing was sent.
    Empty,
    /// A JSON payload that parsed.
    Json(Value),
    /// Any other payload, decoded as (lossy) UTF-8.
    Raw(String),
    /// Larger than the capture limit; only the length is kept.
    Truncated {
        /// Total body length in bytes.
        len: usize,
    },
}

impl CapturedBody {
    /// Classify a buffered body.
    ///
    /// `is_json` reflects the sender's content type: JSON emissions are
    /// parsed, everything else is kept as text.
    pub fn from_bytes(bytes: &[u8], is_json: bool, limit: usize) -> Self {
        Self::from_parts(bytes, bytes.len(), is_json, limit)
    }

    fn from_parts(buffer: &[u8], len: usize, is_json: bool, limit: usize) -> Self {
        if len == 0 {
            return Self::Empty;
        }
        if len > limit {
            return Self::Truncated { len };
        }
        if is_json {
            if let Ok(value) = serde_json::from_slice(buffer) {
                return Self::Json(value);
            }
        }
        Self::Raw(String::from_utf8_lossy(buffer).into_owned())
    }

    /// The value stored in the log record.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Empty => None,
            Self::Json(value) => Some(value),
            Self::Raw(text) => Some(Value::String(text)),
            Self::Truncated { len } => Some(Value::String(format!("[{len} bytes]"))),
        }
    }
}

/// What the interceptor observed once the response finished.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    /// Status sent to the client.
    pub status: StatusCode,
    /// Headers sent to the client.
    pub headers: HeaderMap,
    /// Body sent to the client.
    pub body: CapturedBody,
}

type BodyCallback = Box<dyn FnOnce(CapturedResponse) + Send>;

/// Decorates a response so its body is captured as it is sent.
///
/// Registered callbacks run exactly once per response: when the body
/// reaches end-of-stream, or when it is dropped before that.
pub struct ResponseInterceptor {
    callbacks: Vec<BodyCallback>,
    max_body_bytes: usize,
    force_json_content_type: bool,
}

impl fmt::Debug for ResponseInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseInterceptor")
            .field("callbacks", &self.callbacks.len())
            .field("max_body_bytes", &self.max_body_bytes)
            .field("force_json_content_type", &self.force_json_content_type)
            .finish()
    }
}

impl ResponseInterceptor {
    /// Create an interceptor keeping at most `max_body_bytes` of body.
    pub fn new(max_body_bytes: usize) -> Self {
        Self {
            callbacks: Vec::new(),
            max_body_bytes,
            force_json_content_type: true,
        }
    }

    /// Whether to rewrite `Content-Type` to `application/json` (default on).
    pub fn force_json_content_type(mut self, force: bool) -> Self {
        self.force_json_content_type = force;
        self
    }

    /// Register a callback receiving the captured response.
    pub fn on_body_captured<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(CapturedResponse) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
        self
    }

    /// Install the interceptor on a response.
    pub fn intercept(self, response: Response) -> Response {
        let (mut parts, body) = response.into_parts();
        let is_json = is_json_content(&parts.headers);

        if self.force_json_content_type {
            parts
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let capture = Capture {
            status: parts.status,
            headers: parts.headers.clone(),
            buffer: BytesMut::new(),
            len: 0,
            limit: self.max_body_bytes,
            is_json,
            callbacks: self.callbacks,
        };

        Response::from_parts(parts, Body::new(CaptureBody::new(body, capture)))
    }
}

struct Capture {
    status: StatusCode,
    headers: HeaderMap,
    buffer: BytesMut,
    len: usize,
    limit: usize,
    is_json: bool,
    callbacks: Vec<BodyCallback>,
}

impl Capture {
    fn observe(&mut self, data: &[u8]) {
        self.len += data.len();
        if self.len <= self.limit {
            self.buffer.extend_from_slice(data);
        } else if !self.buffer.is_empty() {
            self.buffer = BytesMut::new();
        }
    }

    fn finish(self) {
        let captured = CapturedResponse {
            status: self.status,
            headers: self.headers,
            body: CapturedBody::from_parts(&self.buffer, self.len, self.is_json, self.limit),
        };
        for callback in self.callbacks {
            callback(captured.clone());
        }
    }
}

pin_project! {
    /// Body wrapper that tees data frames into a [`Capture`].
    struct CaptureBody<B> {
        #[pin]
        inner: B,
        capture: Option<Capture>,
    }

    impl<B> PinnedDrop for CaptureBody<B> {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            if let Some(capture) = this.capture.take() {
                capture.finish();
            }
        }
    }
}

impl<B> CaptureBody<B> {
    fn new(inner: B, capture: Capture) -> Self {
        Self {
            inner,
            capture: Some(capture),
        }
    }
}

impl<B> http_body::Body for CaptureBody<B>
where
    B: http_body::Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let frame = ready!(this.inner.poll_frame(cx));

        match &frame {
            Some(Ok(frame)) => {
                if let (Some(data), Some(capture)) = (frame.data_ref(), this.capture.as_mut()) {
                    capture.observe(data);
                }
            }
            Some(Err(_)) => {}
            None => {
                if let Some(capture) = this.capture.take() {
                    capture.finish();
                }
            }
        }

        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Whether the headers declare a JSON payload.
pub fn is_json_content(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            let essence = ct.split(';').next().unwrap_or_default().trim();
            essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Convert headers to a JSON object.
///
/// Repeated headers become arrays. Names in `redact` (case-insensitive)
/// are stored as [`REDACTED`].
pub fn headers_to_json(headers: &HeaderMap, redact: &[String]) -> Value {
    let mut object = Map::new();

    for name in headers.keys() {
        let key = name.as_str();
        if redact.iter().any(|r| r.eq_ignore_ascii_case(key)) {
            object.insert(key.to_string(), Value::String(REDACTED.to_string()));
            continue;
        }

        let mut values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();

        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        object.insert(key.to_string(), value);
    }

    Value::Object(object)
}
