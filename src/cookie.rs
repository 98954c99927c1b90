use ::cookie::Cookie;
pub use ::cookie::{SameSite, time::Duration};
use http::{HeaderValue, header};

use crate::ctx::Ctx;

/// Attributes of a cookie written with [`Ctx::set_cookie`].
#[derive(Default, Clone, Debug)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<Duration>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Ctx {
    /// Value of the request cookie `name`, percent-decoded.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.req
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(Cookie::split_parse_encoded)
            .filter_map(Result::ok)
            .find(|c| c.name() == name)
            .map(|c| c.value().to_owned())
    }

    /// Appends a `Set-Cookie` header. The value is percent-encoded.
    pub fn set_cookie(&mut self, name: &str, value: &str, options: CookieOptions) {
        let mut builder = Cookie::build((name.to_owned(), value.to_owned()))
            .secure(options.secure)
            .http_only(options.http_only);
        if let Some(path) = options.path {
            builder = builder.path(path);
        }
        if let Some(domain) = options.domain {
            builder = builder.domain(domain);
        }
        if let Some(max_age) = options.max_age {
            builder = builder.max_age(max_age);
        }
        if let Some(same_site) = options.same_site {
            builder = builder.same_site(same_site);
        }

        let cookie = builder.build();
        match HeaderValue::try_from(cookie.encoded().to_string()) {
            Ok(value) => {
                self.res.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => {
                tracing::error!("failed to encode cookie {name}: {e}");
                self.error(e);
            }
        }
    }
}
