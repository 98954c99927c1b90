// Thanks to https://github.com/steffahn/async_fn_traits

use std::{fmt::Debug, future::Future, marker::PhantomData, sync::Arc};

use futures_util::future::BoxFuture;

use crate::{ctx::Ctx, into_response::IntoResponse};

/// An async unit of request processing.
///
/// Implemented for every `async fn(&mut Ctx) -> R` and can be implemented by
/// hand for middleware that carries configuration, e.g.
/// [`Recovery`](crate::middlewares::recovery::Recovery).
pub trait Handler<C> {
    type Output;

    fn call(&self, c: C) -> impl Future<Output = Self::Output> + Send;
}

impl<F: ?Sized, Fut, C> Handler<C> for F
where
    F: Fn(C) -> Fut,
    Fut: Future + Send,
{
    type Output = Fut::Output;

    fn call(&self, c: C) -> impl Future<Output = Self::Output> + Send {
        (self)(c)
    }
}

pub(crate) trait DynHandler: Send + Sync + Debug {
    fn run<'a>(&'a self, c: &'a mut Ctx) -> BoxFuture<'a, ()>;

    fn name(&self) -> &'static str;
}

pub(crate) type BoxedHandler = Arc<dyn DynHandler>;

struct HandlerWrapper<F, R> {
    f: F,
    name: &'static str,
    _output: PhantomData<fn() -> R>,
}

impl<F, R> HandlerWrapper<F, R> {
    fn new(f: F) -> Self {
        Self {
            f,
            name: std::any::type_name::<F>(),
            _output: PhantomData,
        }
    }
}

impl<F, R> Debug for HandlerWrapper<F, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl<F, R> DynHandler for HandlerWrapper<F, R>
where
    F: for<'a> Handler<&'a mut Ctx, Output = R> + Send + Sync,
    R: IntoResponse + Send,
{
    fn run<'a>(&'a self, c: &'a mut Ctx) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let output = self.f.call(&mut *c).await;
            output.into_response(c);
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// An ordered list of handlers: middleware first, the route handler last.
///
/// ```ignore
/// let handlers = Handlers::new()
///     .with(Recovery::new())
///     .with(auth)
///     .with(async |c: &mut Ctx| "hello");
/// ```
#[derive(Clone, Default, Debug)]
pub struct Handlers {
    list: Vec<BoxedHandler>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler to the end of the chain.
    pub fn with<F, R>(mut self, f: F) -> Self
    where
        F: for<'a> Handler<&'a mut Ctx, Output = R> + Send + Sync + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.list.push(Arc::new(HandlerWrapper::new(f)));
        self
    }

    /// Appends every handler of `other`, e.g. a shared middleware group.
    pub fn extend(mut self, other: Handlers) -> Self {
        self.list.extend(other.list);
        self
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub(crate) fn into_shared(self) -> Arc<[BoxedHandler]> {
        self.list.into()
    }
}
