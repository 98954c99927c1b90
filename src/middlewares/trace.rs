//! Traceback capture for panics raised while a [`CaptureScope`] is active.
//!
//! By the time a panic is caught, the stack that raised it is gone, so the
//! trace is taken from a process-wide panic hook and parked in a thread-local
//! slot until the catching side picks it up. Panics outside any scope go to
//! whatever hook was installed before.

use std::{
    cell::{Cell, RefCell},
    fmt,
    panic::{self, Location},
    sync::Once,
};

const MAX_FRAMES: usize = 32;

thread_local! {
    static SCOPES: Cell<usize> = const { Cell::new(0) };
    static LAST: RefCell<Option<Traceback>> = const { RefCell::new(None) };
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub file: String,
    pub line: u32,
}

/// Call sites of a panic, innermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Traceback {
    frames: Vec<Frame>,
}

impl Traceback {
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    fn capture(location: Option<&Location<'_>>) -> Self {
        let backtrace = backtrace::Backtrace::new();
        let resolved: Vec<(Option<String>, Frame)> = backtrace
            .frames()
            .iter()
            .flat_map(|frame| frame.symbols())
            .filter_map(|symbol| {
                let frame = Frame {
                    file: symbol.filename()?.display().to_string(),
                    line: symbol.lineno()?,
                };
                Some((symbol.name().map(|n| format!("{n:#}")), frame))
            })
            .collect();

        let origin = location.map(|loc| Frame {
            file: loc.file().to_owned(),
            line: loc.line(),
        });
        let start = origin.as_ref().and_then(|origin| {
            resolved
                .iter()
                .position(|(_, f)| f.line == origin.line && f.file.ends_with(&origin.file))
        });

        let frames = match (start, origin) {
            (Some(start), _) => resolved
                .into_iter()
                .skip(start)
                .map(|(_, f)| f)
                .take(MAX_FRAMES)
                .collect(),
            // No debug info for the panic site itself: report its location and
            // whatever resolved above the panic machinery.
            (None, origin) => origin
                .into_iter()
                .chain(
                    resolved
                        .into_iter()
                        .skip_while(|(name, _)| name.as_deref().is_none_or(is_machinery))
                        .map(|(_, f)| f),
                )
                .take(MAX_FRAMES)
                .collect(),
        };
        Traceback { frames }
    }
}

fn is_machinery(symbol: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "backtrace::",
        "std::panic",
        "std::sys",
        "std::rt",
        "core::panic",
        "core::option::",
        "core::result::",
        "rust_begin_unwind",
        "__rust",
        concat!(module_path!(), "::"),
    ];
    PREFIXES.iter().any(|p| symbol.starts_with(p))
        || symbol.starts_with(concat!("<", module_path!()))
}

impl fmt::Display for Traceback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            writeln!(f, "\t{}: {}", frame.file, frame.line)?;
        }
        Ok(())
    }
}

/// Installs the capturing panic hook, chaining to the current one.
pub(crate) fn install_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if SCOPES.get() > 0 {
                LAST.set(Some(Traceback::capture(info.location())));
            } else {
                previous(info);
            }
        }));
    });
}

/// Marks the current thread as running code whose panics will be caught and
/// reported, for as long as the guard lives.
pub(crate) struct CaptureScope(());

impl CaptureScope {
    pub(crate) fn enter() -> Self {
        SCOPES.set(SCOPES.get() + 1);
        CaptureScope(())
    }
}

impl Drop for CaptureScope {
    fn drop(&mut self) {
        let remaining = SCOPES.get().saturating_sub(1);
        SCOPES.set(remaining);
        // Panics caught by the code itself leave a trace nobody collects.
        if remaining == 0 {
            LAST.take();
        }
    }
}

/// Takes the traceback of the last panic captured on this thread.
pub(crate) fn take() -> Option<Traceback> {
    LAST.take()
}
