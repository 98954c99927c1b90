use std::{
    path::Path,
    sync::{Arc, Weak},
};

use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method, StatusCode, header};
use serde::Serialize;

use crate::{
    app::App,
    chain::{Chain, ChainState},
    error::Error,
    handler::Handlers,
    keys::Keys,
    request::Request,
    response::{BoxError, HttpResponse, Response},
};

/// Per-request state shared by every handler of a chain.
///
/// One `Ctx` is created per inbound request. Handlers receive it as
/// `&mut Ctx`, may run the rest of the chain with [`next`](Ctx::next), stop
/// it with [`abort`](Ctx::abort), and share data through the key store.
/// Background tasks must be given a [`copy`](Ctx::copy), never the original.
pub struct Ctx {
    pub req: Request,
    pub res: Response,
    app: Weak<App>,
    chain: Chain,
    keys: Keys,
    errors: Vec<BoxError>,
}

impl Ctx {
    pub fn new(app: &Arc<App>, req: Request, handlers: Handlers) -> Self {
        Self {
            req,
            res: Response::new(),
            app: Arc::downgrade(app),
            chain: Chain::new(handlers.into_shared()),
            keys: Keys::new(),
            errors: Vec::new(),
        }
    }

    /// The engine this request is served by, if it is still alive.
    #[inline]
    pub fn app(&self) -> Option<Arc<App>> {
        self.app.upgrade()
    }

    #[inline]
    pub fn path(&self) -> &str {
        self.req.path()
    }

    #[inline]
    pub fn method(&self) -> &Method {
        self.req.method()
    }
}

impl Ctx {
    /// Runs the remaining handlers in order.
    ///
    /// Each handler either calls `next` itself, regaining control once every
    /// handler after it has finished, or returns and lets this loop move on.
    /// Calling `next` on an exhausted or aborted chain does nothing.
    pub async fn next(&mut self) {
        while let Some(handler) = self.chain.advance() {
            handler.run(self).await;
        }
    }

    /// Prevents any further handler from running.
    ///
    /// The calling handler is not interrupted; it should return right after.
    #[inline]
    pub fn abort(&mut self) {
        self.chain.state.abort();
    }

    pub fn abort_with_status(&mut self, code: StatusCode) {
        self.status(code);
        self.abort();
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.chain.state.is_aborted()
    }

    #[inline]
    pub fn chain_state(&self) -> ChainState {
        self.chain.state
    }

    #[inline]
    pub fn handler_count(&self) -> usize {
        self.chain.handlers.len()
    }

    #[inline]
    pub fn current_handler_index(&self) -> Option<usize> {
        self.chain.state.index()
    }

    /// Name of the terminal handler of the chain.
    pub fn handler_name(&self) -> Option<&'static str> {
        self.chain.handlers.last().map(|h| h.name())
    }

    /// Returns a context that is safe to move into a background task.
    ///
    /// The copy sees the same request and a snapshot of the keys taken now.
    /// Its chain is already finished, its response is fresh and it carries no
    /// recorded errors.
    pub fn copy(&self) -> Ctx {
        Ctx {
            req: self.req.clone(),
            res: Response::new(),
            app: self.app.clone(),
            chain: Chain::exhausted(),
            keys: self.keys.snapshot(),
            errors: Vec::new(),
        }
    }
}

impl Ctx {
    #[inline]
    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    #[inline]
    pub fn set<T: Clone + Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.keys.set(key, value);
    }

    #[inline]
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.keys.get(key)
    }

    /// Panics with `Key "<key>" does not exist!` if `key` is absent.
    #[inline]
    pub fn must_get<T: Clone + 'static>(&self, key: &str) -> T {
        self.keys.must_get(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }
}

impl Ctx {
    /// Records a non-fatal error; the chain keeps running.
    pub fn error(&mut self, err: impl Into<BoxError>) {
        self.errors.push(err.into());
    }

    #[inline]
    pub fn errors(&self) -> &[BoxError] {
        &self.errors
    }
}

impl Ctx {
    /// IP of the client: the configured proxy header if present, the peer
    /// address otherwise.
    pub fn remote_ip(&self) -> String {
        let proxied = self.app().and_then(|app| {
            let name = app.config.proxy_header.as_deref()?;
            self.req.header(name).map(|v| v.trim().to_owned())
        });
        proxied.unwrap_or_else(|| self.req.peer_addr().ip().to_string())
    }
}

impl Ctx {
    #[inline]
    pub fn status(&mut self, code: StatusCode) {
        self.res.status(code);
    }

    pub fn set_header<K, V>(&mut self, key: K, value: V) -> Result<(), Error>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
        Error: From<K::Error> + From<V::Error>,
    {
        self.res.set((key, value))?;
        Ok(())
    }

    pub fn string(&mut self, code: StatusCode, body: impl Into<String>) {
        self.res.content_type(HeaderValue::from_static("text/plain"));
        self.res.status(code).send(body.into());
    }

    /// Panics with [`Error::Json`] if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(&mut self, code: StatusCode, value: &T) {
        let mut body = match serde_json::to_vec(value) {
            Ok(body) => body,
            Err(e) => std::panic::panic_any(Error::Json(e)),
        };
        body.push(b'\n');
        self.res.content_type(HeaderValue::from_static("application/json"));
        self.res.status(code).send(body);
    }

    /// Renders `template` from the app's registry.
    ///
    /// Panics with [`Error::Template`] when the template is unknown or fails
    /// to render.
    pub fn html<T: Serialize>(&mut self, code: StatusCode, template: &str, data: &T) {
        let Some(app) = self.app() else {
            std::panic::panic_any(Error::EngineGone);
        };
        let rendered = match app.render(template, data) {
            Ok(rendered) => rendered,
            Err(e) => std::panic::panic_any(Error::Template(e)),
        };
        self.res.content_type(HeaderValue::from_static("text/html"));
        self.res.status(code).send(rendered);
    }

    pub fn data(&mut self, code: StatusCode, content_type: &str, body: impl Into<Bytes>) {
        match HeaderValue::try_from(content_type) {
            Ok(value) => {
                self.res.content_type(value);
            }
            Err(e) => tracing::warn!("invalid content type {content_type:?}: {e}"),
        }
        self.res.status(code).send(body);
    }

    /// Sends the file at `path` with a content type guessed from its
    /// extension.
    pub async fn file(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        match tokio::fs::read(path).await {
            Ok(contents) => {
                let mime = mime_guess::from_path(path).first_or_octet_stream();
                self.data(StatusCode::OK, mime.as_ref(), contents);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.string(StatusCode::NOT_FOUND, "404 page not found");
            }
            Err(e) => {
                tracing::warn!("failed to read {}: {e}", path.display());
                self.error(e);
                self.string(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            }
        }
    }

    /// Permanent redirect to `location`.
    ///
    /// A location that is not a valid header value is recorded as an error
    /// and leaves the response untouched.
    pub fn redirect(&mut self, location: &str) {
        let value = match HeaderValue::try_from(location) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("invalid redirect location {location:?}: {e}");
                self.error(e);
                return;
            }
        };
        self.res.headers_mut().insert(header::LOCATION, value);
        self.status(StatusCode::MOVED_PERMANENTLY);
        if self.method() == Method::GET || self.method() == Method::HEAD {
            let body = format!(
                "<a href=\"{}\">Moved Permanently</a>.\n",
                html_escape(location)
            );
            self.res.content_type(HeaderValue::from_static("text/html; charset=utf-8"));
            self.res.send(body);
        }
    }

    pub(crate) fn into_response(self) -> HttpResponse {
        self.res.into_http()
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

impl std::fmt::Debug for Ctx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ctx")
            .field("method", self.method())
            .field("path", &self.path())
            .field("chain", &self.chain.state)
            .field("keys", &self.keys)
            .field("errors", &self.errors.len())
            .finish()
    }
}
