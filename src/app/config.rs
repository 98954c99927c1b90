#[derive(Clone, Debug, Default)]
pub struct Config {
    /// ProxyHeader will enable c.remote_ip() to return the value of the given header key
    /// By default c.remote_ip() will return the Remote IP from the TCP connection
    /// This property can be useful if you are behind a load balancer: X-Forwarded-*
    /// NOTE: headers are easily spoofed and the detected IP addresses are unreliable.
    ///
    /// Default: None
    pub(crate) proxy_header: Option<String>,

    /// Keep handler-written bodies on responses to HEAD requests.
    ///
    /// Default: false
    pub(crate) keep_head_body: bool,
}

impl Config {
    /// Create a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Header to read the client IP from, e.g. `X-Forwarded-For`.
    ///
    /// NOTE: headers are easily spoofed and the detected IP addresses are unreliable.
    pub fn proxy_header(mut self, header: impl Into<String>) -> Self {
        self.proxy_header = Some(header.into());
        self
    }

    pub fn keep_head_body(mut self, keep: bool) -> Self {
        self.keep_head_body = keep;
        self
    }
}
