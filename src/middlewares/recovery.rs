use std::{
    any::Any,
    borrow::Cow,
    future::Future,
    panic::{AssertUnwindSafe, catch_unwind},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use http::StatusCode;
use pin_project_lite::pin_project;

use super::trace::{self, CaptureScope, Traceback};
use crate::{ctx::Ctx, error::Error, handler::Handler, response::BoxError};

type Reporter = Arc<dyn Fn(&str) + Send + Sync>;

/// Turns a panic anywhere further down the chain into a `500 Internal Server
/// Error`.
///
/// Install it first so it surrounds every other handler. On a panic it
/// reports the panic message followed by a traceback of the panic site, then
/// aborts the chain; the request itself completes normally. Nothing about the
/// failure is sent to the client.
///
/// While the rest of the chain runs, panics on that thread bypass any
/// previously installed panic hook. A panic a handler catches on its own with
/// `catch_unwind` is therefore not printed anywhere.
#[derive(Clone)]
pub struct Recovery {
    reporter: Option<Reporter>,
}

impl Default for Recovery {
    fn default() -> Self {
        Self::new()
    }
}

impl Recovery {
    /// Reports recovered panics through `tracing` at error level.
    pub fn new() -> Self {
        trace::install_hook();
        Self { reporter: None }
    }

    /// Delivers each rendered report to `f` instead of the log.
    pub fn with_reporter(f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        trace::install_hook();
        Self {
            reporter: Some(Arc::new(f)),
        }
    }

    fn report(&self, report: &str) {
        match &self.reporter {
            Some(reporter) => reporter(report),
            None => tracing::error!("{report}"),
        }
    }
}

impl Handler<&mut Ctx> for Recovery {
    type Output = ();

    async fn call(&self, c: &mut Ctx) -> Self::Output {
        let Err(failure) = CatchUnwind::new(AssertUnwindSafe(c.next())).await else {
            return;
        };

        self.report(&render_report(
            &describe(&*failure.payload),
            failure.trace.as_ref(),
        ));

        if c.res.is_written() {
            c.status(StatusCode::INTERNAL_SERVER_ERROR);
        } else {
            c.string(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
        c.abort();
    }
}

fn render_report(message: &str, trace: Option<&Traceback>) -> String {
    match trace {
        Some(trace) => format!("{message}\nTraceback:\n{trace}"),
        None => format!("{message}\nTraceback:\n"),
    }
}

/// Human-readable description of a panic payload.
fn describe(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<Cow<'static, str>>() {
        s.to_string()
    } else if let Some(e) = payload.downcast_ref::<Error>() {
        e.to_string()
    } else if let Some(e) = payload.downcast_ref::<BoxError>() {
        e.to_string()
    } else if let Some(e) = payload.downcast_ref::<Box<dyn std::error::Error + Send>>() {
        e.to_string()
    } else if let Some(e) = payload.downcast_ref::<std::io::Error>() {
        e.to_string()
    } else {
        // `dyn Any` has no useful `Debug`; the value cannot be shown.
        String::from("unknown panic payload")
    }
}

struct Failure {
    payload: Box<dyn Any + Send>,
    trace: Option<Traceback>,
}

pin_project! {
    struct CatchUnwind<F> {
        #[pin]
        inner: F,
    }
}

impl<F> CatchUnwind<F> {
    fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: Future> Future for CatchUnwind<F> {
    type Output = Result<F::Output, Failure>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let inner = self.project().inner;
        let _scope = CaptureScope::enter();
        match catch_unwind(AssertUnwindSafe(|| inner.poll(cx))) {
            Ok(poll) => poll.map(Ok),
            Err(payload) => Poll::Ready(Err(Failure {
                payload,
                trace: trace::take(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_payloads() {
        assert_eq!(describe(&"boom"), "boom");
        assert_eq!(describe(&String::from("boom")), "boom");
        assert_eq!(describe(&Error::EngineGone), Error::EngineGone.to_string());
        assert_eq!(describe(&Cow::<'static, str>::Borrowed("cow")), "cow");
        let boxed: BoxError = "boxed failure".into();
        assert_eq!(describe(&boxed), "boxed failure");
        let io = std::io::Error::other("disk full");
        assert_eq!(describe(&io), "disk full");
        assert_eq!(describe(&42u8), "unknown panic payload");
    }

    #[test]
    fn report_layout() {
        let report = render_report("boom", Some(&Traceback::default()));
        assert_eq!(report, "boom\nTraceback:\n");
    }
}
