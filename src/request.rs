use std::{net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Uri, Version, header::AsHeaderName};
use mime_guess::{Mime, mime};
use serde::de::DeserializeOwned;
use smol_str::SmolStr;

/// Route parameters bound by the router, in the order they appear in the
/// route pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(Vec<(SmolStr, SmolStr)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<SmolStr>,
    V: Into<SmolStr>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The incoming request as handed over by the dispatcher.
///
/// The head is shared, so detached copies of a context see the same request
/// without cloning headers.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) head: Arc<http::request::Parts>,
    pub(crate) body: Bytes,
    pub params: Params,
    pub(crate) peer_addr: SocketAddr,
}

impl Request {
    pub fn new(request: http::Request<Bytes>, params: Params, peer_addr: SocketAddr) -> Self {
        let (parts, body) = request.into_parts();
        Request {
            head: Arc::new(parts),
            body,
            params,
            peer_addr,
        }
    }

    /// Get a path parameter and deserialize it into type `T`.
    ///
    /// Works with any type implementing `DeserializeOwned`: primitives,
    /// `String`, enums, newtypes, etc.
    ///
    /// For borrowing as `&str` without allocation, use [`param_str`](Self::param_str).
    #[inline]
    pub fn param<T>(&self, key: &str) -> Result<T, ParamError>
    where
        T: DeserializeOwned,
    {
        let value = self
            .params
            .get(key)
            .ok_or_else(|| ParamError::Missing(key.into()))?;
        serde_plain::from_str(value).map_err(|e| ParamError::Invalid {
            key: key.into(),
            value: value.into(),
            source: e,
        })
    }

    /// Get param as &str.
    ///
    /// Returns empty string if not found.
    #[inline]
    pub fn param_str(&self, key: &str) -> &str {
        self.params.get(key).unwrap_or_default()
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    #[inline]
    pub fn path(&self) -> &str {
        self.head.uri.path()
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.head.version
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap<HeaderValue> {
        &self.head.headers
    }

    /// Returns the specified Header value as a &str.
    #[inline]
    pub fn header<K>(&self, key: K) -> Option<&str>
    where
        K: AsHeaderName,
    {
        self.headers().get(key).and_then(|v| v.to_str().ok())
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    #[inline]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Get content type.
    #[inline]
    pub fn content_type(&self) -> Option<Mime> {
        self.header(http::header::CONTENT_TYPE)
            .and_then(|v| v.parse().ok())
    }

    #[inline]
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, QueryError> {
        let qs = self.head.uri.query().unwrap_or("");
        Ok(serde_urlencoded::from_str(qs)?)
    }

    /// First value of `key` in the query string.
    pub fn query_value(&self, key: &str) -> Option<String> {
        let qs = self.head.uri.query()?;
        first_value(serde_urlencoded::from_str(qs).ok()?, key)
    }

    /// First value of `key` in an `application/x-www-form-urlencoded` body,
    /// falling back to the query string.
    pub fn form_value(&self, key: &str) -> Option<String> {
        let is_form = self.content_type().is_some_and(|m| {
            m.type_() == mime::APPLICATION && m.subtype() == mime::WWW_FORM_URLENCODED
        });
        if is_form {
            let from_body = serde_urlencoded::from_bytes(&self.body)
                .ok()
                .and_then(|pairs| first_value(pairs, key));
            if from_body.is_some() {
                return from_body;
            }
        }
        self.query_value(key)
    }
}

fn first_value(pairs: Vec<(String, String)>, key: &str) -> Option<String> {
    pairs.into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    #[error("Missing path parameter: {0}")]
    Missing(SmolStr),

    #[error("Invalid value for path parameter: {key}")]
    Invalid {
        key: SmolStr,
        value: SmolStr,
        #[source]
        source: serde_plain::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Failed to parse query string")]
    Parse(#[from] serde_urlencoded::de::Error),
}
