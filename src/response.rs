use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use http_body_util::Full;
use std::fmt;

use crate::error::Error;

pub type HttpBody = Full<Bytes>;
pub type HttpResponse<T = HttpBody> = http::Response<T>;
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The buffered outgoing response of one request.
///
/// Status and headers should be final before the body is written; writing
/// twice is last-write-wins.
#[derive(Default)]
pub struct Response {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Bytes,
    // Set once any body bytes have been sent.
    written: bool,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP status for the response.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = Some(status);
        self
    }

    /// The last status written, `None` if no handler has set one.
    #[inline]
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets multiple headers at once. Accepts:
    /// - A single tuple: `res.set(("Content-Type", "text/plain"))?`
    /// - An array of tuples: `res.set([("Content-Type", "text/plain"), ("ETag", "123")])?`
    /// - A Vec of tuples: `res.set(vec![...])?`
    #[inline]
    pub fn set<H>(&mut self, headers: H) -> Result<&mut Self, Error>
    where
        H: SetIntoHeaders,
    {
        headers.into_headers(&mut self.headers)?;
        Ok(self)
    }

    #[inline]
    pub fn content_type(&mut self, value: HeaderValue) -> &mut Self {
        self.headers.insert(header::CONTENT_TYPE, value);
        self
    }

    #[inline]
    pub fn send(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = body.into();
        self.written = true;
        self
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Whether body bytes have already been sent for this request.
    #[inline]
    pub fn is_written(&self) -> bool {
        self.written
    }

    pub(crate) fn into_http(self) -> HttpResponse {
        let mut res = HttpResponse::new(Full::new(self.body));
        *res.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *res.headers_mut() = self.headers;
        res
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status_code", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish()
    }
}

pub trait SetIntoHeaders {
    fn into_headers(self, map: &mut HeaderMap) -> Result<(), Error>;
}

impl<K, V> SetIntoHeaders for (K, V)
where
    K: TryInto<HeaderName>,
    V: TryInto<HeaderValue>,
    Error: From<K::Error> + From<V::Error>,
{
    fn into_headers(self, map: &mut HeaderMap) -> Result<(), Error> {
        let k = self.0.try_into()?;
        let v = self.1.try_into()?;
        map.insert(k, v);
        Ok(())
    }
}

impl<K, V, const N: usize> SetIntoHeaders for [(K, V); N]
where
    K: TryInto<HeaderName>,
    V: TryInto<HeaderValue>,
    Error: From<K::Error> + From<V::Error>,
{
    fn into_headers(self, map: &mut HeaderMap) -> Result<(), Error> {
        for pair in self {
            pair.into_headers(map)?;
        }
        Ok(())
    }
}

impl<K, V> SetIntoHeaders for Vec<(K, V)>
where
    K: TryInto<HeaderName>,
    V: TryInto<HeaderValue>,
    Error: From<K::Error> + From<V::Error>,
{
    fn into_headers(self, map: &mut HeaderMap) -> Result<(), Error> {
        for pair in self {
            pair.into_headers(map)?;
        }
        Ok(())
    }
}
