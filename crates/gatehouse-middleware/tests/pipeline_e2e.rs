//! End-to-end chain tests.
//!
//! These build pipelines the way the router does:
//!
//! 1. Request validation
//! 2. User middleware, in declaration order
//! 3. Response validation
//! 4. Handler

use std::sync::{Arc, Mutex};

use gatehouse_core::{Event, ObjectSchema, RequestContext, RouteError, ValueSchema};
use gatehouse_middleware::{
    from_fn, handler_fn, BoxedMiddleware, Middleware, Pipeline, Reply, ValidationConfig,
};
use http::{Method, StatusCode};
use serde_json::{json, Value};

type Journal = Arc<Mutex<Vec<String>>>;

fn recorder(name: &'static str, journal: &Journal) -> BoxedMiddleware {
    let journal = Arc::clone(journal);
    Arc::new(from_fn(name, move |ctx, next| {
        let journal = Arc::clone(&journal);
        Box::pin(async move {
            journal.lock().unwrap().push(format!(
                "{name}:before valid.req={}",
                ctx.valid_request().is_some()
            ));
            let result = next.run(ctx).await;
            journal.lock().unwrap().push(format!(
                "{name}:after valid.res={}",
                ctx.valid_response().is_some()
            ));
            result
        })
    }))
}

fn build(config: &ValidationConfig, user: Vec<BoxedMiddleware>, journal: &Journal) -> Pipeline {
    let mut builder = Pipeline::builder().stage(config.request_stage()).stages(user);
    if let Some(stage) = config.response_stage() {
        builder = builder.stage(stage);
    }
    let journal = Arc::clone(journal);
    builder.handler(handler_fn(move |ctx| {
        let journal = Arc::clone(&journal);
        Box::pin(async move {
            journal.lock().unwrap().push("handler".to_string());
            let body = ctx.valid_request().and_then(|v| v.body.clone()).unwrap_or(Value::Null);
            Reply::json(&json!({ "id": "p-1", "echo": body }))
        })
    }))
}

fn config() -> ValidationConfig {
    ValidationConfig::new()
        .body(ObjectSchema::new().field("name", ValueSchema::string().min_length(1)))
        .response_body(
            ObjectSchema::new()
                .field("id", ValueSchema::string())
                .field("echo", ValueSchema::any()),
        )
}

fn post(body: Value) -> RequestContext {
    RequestContext::from_event(Event::new(Method::POST, "/things").with_json(body))
}

#[tokio::test]
async fn test_full_order_on_success() {
    let journal = Journal::default();
    let pipeline = build(
        &config(),
        vec![recorder("outer", &journal), recorder("inner", &journal)],
        &journal,
    );
    assert_eq!(
        pipeline.stage_names(),
        vec!["request_validation", "outer", "inner", "response_validation"]
    );

    let mut ctx = post(json!({"name": "widget"}));
    pipeline.run(&mut ctx).await.unwrap();

    assert_eq!(
        *journal.lock().unwrap(),
        vec![
            "outer:before valid.req=true",
            "inner:before valid.req=true",
            "handler",
            "inner:after valid.res=true",
            "outer:after valid.res=true",
        ]
    );
    assert_eq!(ctx.response().status(), StatusCode::OK);
    assert_eq!(
        ctx.valid_response().map(|v| v.body().clone()),
        Some(json!({"id": "p-1", "echo": {"name": "widget"}}))
    );
}

#[tokio::test]
async fn test_invalid_request_runs_nothing_downstream() {
    let journal = Journal::default();
    let pipeline = build(&config(), vec![recorder("user", &journal)], &journal);

    let mut ctx = post(json!({"name": ""}));
    let err = pipeline.run(&mut ctx).await.unwrap_err();

    assert!(matches!(err, RouteError::RequestValidation(_)));
    assert!(journal.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_user_middleware_sees_response_failure() {
    let journal = Journal::default();
    let config = ValidationConfig::new()
        .response_body(ObjectSchema::new().field("missing", ValueSchema::string()));
    let pipeline = build(&config, vec![recorder("user", &journal)], &journal);

    let mut ctx = post(json!({}));
    let err = pipeline.run(&mut ctx).await.unwrap_err();

    assert!(matches!(err, RouteError::ResponseValidation(_)));
    assert_eq!(
        *journal.lock().unwrap(),
        vec!["user:before valid.req=true", "handler", "user:after valid.res=false"]
    );
}

#[tokio::test]
async fn test_short_circuit_between_stages() {
    let journal = Journal::default();
    let deny: BoxedMiddleware = Arc::new(from_fn("deny", |ctx, _next| {
        Box::pin(async move {
            ctx.response_mut().set_status(StatusCode::FORBIDDEN);
            ctx.response_mut().set_json(json!({"error": "Forbidden"}));
            Ok(())
        })
    }));
    assert_eq!(deny.name(), "deny");

    let pipeline = build(&config(), vec![deny, recorder("after_deny", &journal)], &journal);
    let mut ctx = post(json!({"name": "widget"}));
    pipeline.run(&mut ctx).await.unwrap();

    assert_eq!(ctx.response().status(), StatusCode::FORBIDDEN);
    assert!(journal.lock().unwrap().is_empty());
    assert!(ctx.valid_response().is_none());
}

#[tokio::test]
async fn test_concurrent_invocations_do_not_share_context() {
    let journal = Journal::default();
    let pipeline = Arc::new(build(&config(), Vec::new(), &journal));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let pipeline = Arc::clone(&pipeline);
        tasks.push(tokio::spawn(async move {
            let mut ctx = post(json!({ "name": format!("item-{i}") }));
            pipeline.run(&mut ctx).await.unwrap();
            ctx.response().body().as_json().cloned()
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let body = task.await.unwrap().unwrap();
        assert_eq!(body["echo"]["name"], format!("item-{i}"));
    }
}
