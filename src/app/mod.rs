use std::{net::SocketAddr, path::Path, sync::Arc};

use bytes::Bytes;
use http::Method;
use http_body_util::Full;
use minijinja::Environment;
use serde::Serialize;

pub(crate) mod config;

use crate::{
    ctx::Ctx,
    error::Error,
    handler::Handlers,
    request::{Params, Request},
    response::HttpResponse,
};

/// Shared state of every request: configuration and the template registry.
///
/// Contexts only hold a weak reference to the app; it must outlive the
/// requests it serves. Nothing here is mutated while requests run.
pub struct App {
    pub(crate) config: config::Config,
    templates: Environment<'static>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        App {
            config: config::Config::default(),
            templates: Environment::new(),
        }
    }

    pub fn config(mut self, config: config::Config) -> Self {
        self.config = config;
        self
    }

    /// Loads templates on demand from `path`.
    pub fn views(mut self, path: impl AsRef<Path>) -> Self {
        self.templates.set_loader(minijinja::path_loader(path.as_ref().to_path_buf()));
        self
    }

    /// Registers a template from source.
    pub fn template(
        mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, Error> {
        self.templates.add_template_owned(name.into(), source.into())?;
        Ok(self)
    }

    /// Direct access to the template environment, e.g. to add filters.
    pub fn with_templates(mut self, f: impl FnOnce(&mut Environment<'static>)) -> Self {
        f(&mut self.templates);
        self
    }

    pub(crate) fn render<T: Serialize>(
        &self,
        name: &str,
        data: &T,
    ) -> Result<String, minijinja::Error> {
        self.templates.get_template(name)?.render(data)
    }
}

impl App {
    /// Runs `handlers` for one request that the router has already matched.
    ///
    /// The chain is started once; whatever the handlers wrote is returned.
    /// A handler that panics without a [`Recovery`](crate::middlewares::recovery::Recovery)
    /// in front of it takes the calling task down with it.
    pub async fn dispatch(
        self: &Arc<Self>,
        request: http::Request<Bytes>,
        params: Params,
        peer_addr: SocketAddr,
        handlers: Handlers,
    ) -> HttpResponse {
        let req = Request::new(request, params, peer_addr);
        let mut c = Ctx::new(self, req, handlers);
        c.next().await;

        if c.is_aborted() {
            tracing::debug!("chain aborted: {} {}", c.method(), c.path());
        }

        let is_head = c.method() == Method::HEAD;
        let mut res = c.into_response();
        if is_head && !self.config.keep_head_body {
            *res.body_mut() = Full::default();
        }
        res
    }
}
