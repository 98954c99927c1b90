#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use strata::{
    App, Ctx, Handler, Handlers, Params, Request,
    bytes::Bytes,
    http::{self, HeaderMap, Method, StatusCode},
    http_body_util::BodyExt,
};

pub fn peer() -> SocketAddr {
    "127.0.0.1:5000".parse().unwrap()
}

pub fn request(method: Method, uri: &str) -> http::Request<Bytes> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

pub fn ctx(app: &Arc<App>, req: http::Request<Bytes>, handlers: Handlers) -> Ctx {
    Ctx::new(app, Request::new(req, Params::new(), peer()), handlers)
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub async fn dispatch(app: &Arc<App>, req: http::Request<Bytes>, handlers: Handlers) -> Reply {
    let res = app.dispatch(req, Params::new(), peer(), handlers).await;
    let (parts, body) = res.into_parts();
    let body = body.collect().await.unwrap().to_bytes();
    Reply {
        status: parts.status,
        headers: parts.headers,
        body: String::from_utf8(body.to_vec()).unwrap(),
    }
}

pub async fn get(app: &Arc<App>, handlers: Handlers) -> Reply {
    dispatch(app, request(Method::GET, "/"), handlers).await
}

/// Shared record of what the handlers of a chain did, in order.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn step(&self, name: &'static str, kind: Kind) -> Step {
        Step {
            log: self.clone(),
            name,
            kind,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Kind {
    /// Returns without calling `next`.
    Plain,
    /// Calls `next` and logs again once it returns.
    Wrap,
    /// Calls `abort`, then keeps running.
    Abort,
    /// Calls `abort_with_status`, then `next`.
    AbortWithStatus(StatusCode),
    /// Calls `next` twice.
    NextTwice,
    Panic,
}

pub struct Step {
    log: Log,
    name: &'static str,
    kind: Kind,
}

impl Handler<&mut Ctx> for Step {
    type Output = ();

    async fn call(&self, c: &mut Ctx) -> Self::Output {
        self.log.push(format!("{}:in", self.name));
        match self.kind {
            Kind::Plain => {}
            Kind::Wrap => {
                c.next().await;
                self.log.push(format!("{}:out", self.name));
            }
            Kind::Abort => {
                c.abort();
                self.log.push(format!("{}:after-abort", self.name));
            }
            Kind::AbortWithStatus(code) => {
                c.abort_with_status(code);
                c.next().await;
            }
            Kind::NextTwice => {
                c.next().await;
                c.next().await;
            }
            Kind::Panic => panic!("boom"),
        }
    }
}
