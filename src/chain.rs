use std::sync::Arc;

use crate::handler::BoxedHandler;

/// Position of a context within its handler chain.
///
/// The index only moves forward; `Aborted` and `Completed` are terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChainState {
    #[default]
    NotStarted,
    Running(usize),
    Aborted,
    Completed,
}

impl ChainState {
    /// Moves to the next handler of a chain of `len` handlers and returns its
    /// index, or `None` once the chain is exhausted or aborted.
    pub fn advance(&mut self, len: usize) -> Option<usize> {
        let next = match *self {
            ChainState::NotStarted => 0,
            ChainState::Running(i) => i + 1,
            ChainState::Aborted | ChainState::Completed => return None,
        };
        if next < len {
            *self = ChainState::Running(next);
            Some(next)
        } else {
            *self = ChainState::Completed;
            None
        }
    }

    pub fn abort(&mut self) {
        *self = ChainState::Aborted;
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, ChainState::Aborted)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, ChainState::Aborted | ChainState::Completed)
    }

    /// Index of the handler currently executing, if any.
    pub fn index(&self) -> Option<usize> {
        match *self {
            ChainState::Running(i) => Some(i),
            _ => None,
        }
    }
}

/// The fixed, ordered handler list of one request plus its cursor.
#[derive(Clone)]
pub(crate) struct Chain {
    pub(crate) handlers: Arc<[BoxedHandler]>,
    pub(crate) state: ChainState,
}

impl Chain {
    pub(crate) fn new(handlers: Arc<[BoxedHandler]>) -> Self {
        Self {
            handlers,
            state: ChainState::NotStarted,
        }
    }

    /// A chain with nothing left to run, as handed to detached copies.
    pub(crate) fn exhausted() -> Self {
        Self {
            handlers: Arc::new([]),
            state: ChainState::Completed,
        }
    }

    pub(crate) fn advance(&mut self) -> Option<BoxedHandler> {
        let index = self.state.advance(self.handlers.len())?;
        self.handlers.get(index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_every_index_once() {
        let mut state = ChainState::default();
        let visited: Vec<_> = std::iter::from_fn(|| state.advance(3)).collect();
        assert_eq!(visited, [0, 1, 2]);
        assert_eq!(state, ChainState::Completed);
        assert_eq!(state.advance(3), None);
    }

    #[test]
    fn empty_chain_completes_immediately() {
        let mut state = ChainState::NotStarted;
        assert_eq!(state.advance(0), None);
        assert_eq!(state, ChainState::Completed);
    }

    #[test]
    fn abort_is_terminal() {
        let mut state = ChainState::NotStarted;
        assert_eq!(state.advance(5), Some(0));
        state.abort();
        assert!(state.is_aborted());
        assert_eq!(state.advance(5), None);
        assert_eq!(state, ChainState::Aborted);
        assert_eq!(state.index(), None);
    }
}
