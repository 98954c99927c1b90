mod common;

use std::sync::Arc;

use common::{Kind, Log, ctx, get, request};
use strata::{App, ChainState, Handlers, http::Method, prelude::*};

#[tokio::test]
async fn runs_every_handler_once_in_order() {
    let app = Arc::new(App::new());
    let log = Log::default();
    let handlers = Handlers::new()
        .with(log.step("a", Kind::Plain))
        .with(log.step("b", Kind::Plain))
        .with(log.step("c", Kind::Plain));

    get(&app, handlers).await;

    assert_eq!(log.entries(), ["a:in", "b:in", "c:in"]);
}

#[tokio::test]
async fn trailing_work_runs_in_reverse_order() {
    let app = Arc::new(App::new());
    let log = Log::default();
    let handlers = Handlers::new()
        .with(log.step("outer", Kind::Wrap))
        .with(log.step("middle", Kind::Wrap))
        .with(log.step("inner", Kind::Plain));

    get(&app, handlers).await;

    assert_eq!(
        log.entries(),
        [
            "outer:in",
            "middle:in",
            "inner:in",
            "middle:out",
            "outer:out"
        ]
    );
}

#[tokio::test]
async fn mixing_wrapping_and_plain_handlers() {
    let app = Arc::new(App::new());
    let log = Log::default();
    let handlers = Handlers::new()
        .with(log.step("a", Kind::Plain))
        .with(log.step("b", Kind::Wrap))
        .with(log.step("c", Kind::Plain))
        .with(log.step("d", Kind::Plain));

    get(&app, handlers).await;

    assert_eq!(log.entries(), ["a:in", "b:in", "c:in", "d:in", "b:out"]);
}

#[tokio::test]
async fn abort_skips_later_handlers_but_not_the_caller() {
    let app = Arc::new(App::new());
    let log = Log::default();
    let handlers = Handlers::new()
        .with(log.step("logger", Kind::Wrap))
        .with(log.step("auth", Kind::Abort))
        .with(log.step("route", Kind::Plain));

    get(&app, handlers).await;

    assert_eq!(
        log.entries(),
        ["logger:in", "auth:in", "auth:after-abort", "logger:out"]
    );
}

#[tokio::test]
async fn abort_with_status_then_next_runs_nothing() {
    let app = Arc::new(App::new());
    let log = Log::default();
    let handlers = Handlers::new()
        .with(log.step("guard", Kind::AbortWithStatus(StatusCode::NOT_FOUND)))
        .with(log.step("route", Kind::Plain));

    let reply = get(&app, handlers).await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(log.entries(), ["guard:in"]);
}

#[tokio::test]
async fn next_past_the_end_is_a_no_op() {
    let app = Arc::new(App::new());
    let log = Log::default();
    let handlers = Handlers::new()
        .with(log.step("a", Kind::NextTwice))
        .with(log.step("last", Kind::Wrap));

    get(&app, handlers).await;

    assert_eq!(log.entries(), ["a:in", "last:in", "last:out"]);
}

#[tokio::test]
async fn empty_chain_leaves_status_unset() {
    let app = Arc::new(App::new());
    let mut c = ctx(&app, request(Method::GET, "/"), Handlers::new());

    c.next().await;

    assert_eq!(c.chain_state(), ChainState::Completed);
    assert_eq!(c.res.status_code(), None);
    assert_eq!(c.handler_name(), None);
}

async fn show_user(c: &mut Ctx) {
    c.string(StatusCode::OK, "user");
}

#[tokio::test]
async fn handler_name_is_the_terminal_handler() {
    let app = Arc::new(App::new());
    let log = Log::default();
    let c = ctx(
        &app,
        request(Method::GET, "/"),
        Handlers::new()
            .with(log.step("mw", Kind::Plain))
            .with(show_user),
    );

    assert_eq!(c.handler_count(), 2);
    assert!(c.handler_name().unwrap().ends_with("show_user"));
}

#[tokio::test]
async fn copy_cannot_rerun_the_chain() {
    let app = Arc::new(App::new());
    let log = Log::default();
    let c = ctx(
        &app,
        request(Method::GET, "/"),
        Handlers::new().with(log.step("a", Kind::Plain)),
    );

    let mut copy = c.copy();
    copy.next().await;

    assert!(log.entries().is_empty());
    assert_eq!(copy.handler_count(), 0);
    assert_eq!(copy.chain_state(), ChainState::Completed);
    assert_eq!(c.chain_state(), ChainState::NotStarted);
}

#[tokio::test]
async fn groups_can_be_extended() {
    let app = Arc::new(App::new());
    let log = Log::default();
    let group = Handlers::new()
        .with(log.step("a", Kind::Plain))
        .with(log.step("b", Kind::Plain));
    let handlers = Handlers::new()
        .extend(group)
        .with(log.step("c", Kind::Plain));
    assert_eq!(handlers.len(), 3);

    get(&app, handlers).await;

    assert_eq!(log.entries(), ["a:in", "b:in", "c:in"]);
}
