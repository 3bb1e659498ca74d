//! Shared helpers for the HTTP API tests

#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_web::{
    App, Error,
    dev::{Service, ServiceResponse},
    http::header::CONTENT_TYPE,
    middleware::{NormalizePath, TrailingSlash},
    test, web,
};
use kvconf_common::IDEMPOTENCY_KEY_HEADER;
use kvconf_server::{
    api::route::routes, middleware::ObservabilityMiddleware, model::app_state::AppState,
};
use kvconf_store::{KvBackend, MemoryKvBackend};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::Value;

/// Application state over a fresh in-memory backend
pub fn memory_state() -> (AppState, MemoryKvBackend) {
    let backend = MemoryKvBackend::new();
    (state_over(Arc::new(backend.clone())), backend)
}

pub fn state_over(backend: Arc<dyn KvBackend>) -> AppState {
    let handle = PrometheusBuilder::new().build_recorder().handle();
    AppState::from_backend(backend).with_metrics_handle(handle)
}

/// Same middleware stack and routes as the production server
pub async fn create_test_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse, Error = Error> {
    test::init_service(
        App::new()
            .wrap(ObservabilityMiddleware::new())
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .app_data(web::Data::new(state))
            .configure(routes),
    )
    .await
}

pub async fn post_json<S>(app: &S, uri: &str, body: Value, token: Option<&str>) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let mut req = test::TestRequest::post()
        .uri(uri)
        .insert_header((CONTENT_TYPE, "application/json"))
        .set_payload(body.to_string());
    if let Some(token) = token {
        req = req.insert_header((IDEMPOTENCY_KEY_HEADER, token));
    }
    test::call_service(app, req.to_request()).await
}

pub async fn get<S>(app: &S, uri: &str) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    test::call_service(app, test::TestRequest::get().uri(uri).to_request()).await
}

pub async fn put<S>(app: &S, uri: &str) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    test::call_service(app, test::TestRequest::put().uri(uri).to_request()).await
}

pub async fn delete<S>(app: &S, uri: &str) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    test::call_service(app, test::TestRequest::delete().uri(uri).to_request()).await
}

/// Create a configuration and return its JSON
pub async fn create_config<S>(app: &S, body: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let resp = post_json(app, "/config", body, None).await;
    assert_eq!(resp.status(), 201);
    test::read_body_json(resp).await
}

/// Create a group and return its JSON
pub async fn create_group<S>(app: &S, body: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let resp = post_json(app, "/group", body, None).await;
    assert_eq!(resp.status(), 201);
    test::read_body_json(resp).await
}
