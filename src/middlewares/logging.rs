use std::time::{Duration, Instant};

use crate::{ctx::Ctx, handler::Handler};

/// Logs one line per request once the rest of the chain has run, followed by
/// every error the handlers recorded.
#[derive(Clone, Debug, Default)]
pub struct Logger {
    _p: (),
}

impl Logger {
    pub fn new() -> Self {
        Self { _p: () }
    }
}

struct FormattedDuration(Duration);

impl std::fmt::Display for FormattedDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nanos = self.0.as_nanos() as u64;
        if nanos >= 1_000_000_000 {
            let ms = nanos / 1_000_000;
            write!(f, "{}.{:03}s", ms / 1000, ms % 1000)
        } else if nanos >= 1_000_000 {
            let us = nanos / 1_000;
            write!(f, "{}.{:03}ms", us / 1000, us % 1000)
        } else {
            write!(f, "{}.{:03}µs", nanos / 1000, nanos % 1000)
        }
    }
}

impl Handler<&mut Ctx> for Logger {
    type Output = ();

    async fn call(&self, c: &mut Ctx) -> Self::Output {
        let time = Instant::now();

        c.next().await;

        let status = c.res.status_code().map_or(200, |s| s.as_u16());
        tracing::info!(
            "{} | {:^10} | {} | {:^7} | {}",
            status,
            FormattedDuration(time.elapsed()),
            c.remote_ip(),
            c.method().as_str(),
            c.path(),
        );

        for err in c.errors() {
            tracing::warn!(path = c.path(), "{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations() {
        assert_eq!(
            FormattedDuration(Duration::from_micros(1500)).to_string(),
            "1.500ms"
        );
        assert_eq!(
            FormattedDuration(Duration::from_millis(2250)).to_string(),
            "2.250s"
        );
        assert_eq!(FormattedDuration(Duration::from_nanos(42)).to_string(), "0.042µs");
    }
}
