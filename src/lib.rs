pub use bytes;
pub use http;
pub use http_body_util;
pub use minijinja;

mod any_map;
mod app;
mod chain;
pub mod cookie;
mod ctx;
mod error;
mod handler;
mod into_response;
mod keys;
pub mod middlewares;
mod request;
mod response;

pub mod prelude {
    pub use crate::app::App;
    pub use crate::ctx::Ctx;
    pub use crate::error::Error as StrataError;
    pub use crate::handler::{Handler, Handlers};
    pub use crate::middlewares::recovery::Recovery;
    pub use http::StatusCode;
    pub use http::method::Method;
}

pub use crate::app::App;
pub use crate::app::config::Config;
pub use crate::chain::ChainState;
pub use crate::cookie::CookieOptions;
pub use crate::ctx::Ctx;
pub use crate::error::Error;
pub use crate::handler::{Handler, Handlers};
pub use crate::into_response::IntoResponse;
pub use crate::keys::Keys;
pub use crate::request::{ParamError, Params, QueryError, Request};
pub use crate::response::{BoxError, HttpBody, HttpResponse, Response};
