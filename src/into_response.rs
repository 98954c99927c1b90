use std::borrow::Cow;

use bytes::Bytes;
use http::StatusCode;

use crate::ctx::Ctx;

/// Values a handler may return instead of writing through the context.
///
/// Text values are sent as `text/plain`, byte values as
/// `application/octet-stream`; `()` leaves the response untouched.
pub trait IntoResponse {
    fn into_response(self, c: &mut Ctx);
}

impl IntoResponse for () {
    fn into_response(self, _: &mut Ctx) {}
}

impl<T> IntoResponse for Option<T>
where
    T: IntoResponse,
{
    fn into_response(self, c: &mut Ctx) {
        if let Some(value) = self {
            value.into_response(c)
        }
    }
}

impl<T> IntoResponse for (StatusCode, T)
where
    T: IntoResponse,
{
    fn into_response(self, c: &mut Ctx) {
        c.status(self.0);
        self.1.into_response(c);
    }
}

fn send_text(c: &mut Ctx, body: impl Into<Bytes>) {
    let code = c.res.status_code().unwrap_or(StatusCode::OK);
    c.data(code, mime_guess::mime::TEXT_PLAIN.as_ref(), body);
}

fn send_bytes(c: &mut Ctx, body: impl Into<Bytes>) {
    let code = c.res.status_code().unwrap_or(StatusCode::OK);
    c.data(
        code,
        mime_guess::mime::APPLICATION_OCTET_STREAM.as_ref(),
        body,
    );
}

impl IntoResponse for String {
    fn into_response(self, c: &mut Ctx) {
        send_text(c, self);
    }
}

impl IntoResponse for &'static str {
    fn into_response(self, c: &mut Ctx) {
        send_text(c, self);
    }
}

impl IntoResponse for Cow<'static, str> {
    fn into_response(self, c: &mut Ctx) {
        match self {
            Cow::Borrowed(s) => send_text(c, s),
            Cow::Owned(s) => send_text(c, s),
        }
    }
}

impl IntoResponse for Vec<u8> {
    fn into_response(self, c: &mut Ctx) {
        send_bytes(c, self);
    }
}

impl IntoResponse for Bytes {
    fn into_response(self, c: &mut Ctx) {
        send_bytes(c, self);
    }
}

impl IntoResponse for &'static [u8] {
    fn into_response(self, c: &mut Ctx) {
        send_bytes(c, self);
    }
}
