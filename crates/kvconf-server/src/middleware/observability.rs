//! Request span and HTTP metrics middleware.
//!
//! Every request runs inside an `http_request` span and is counted under its
//! route pattern (`/config/{id}/{version}`), so handlers carry no per-route
//! instrumentation.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::task::{Context, Poll};

use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
};
use tracing::{Instrument, Span, debug, info_span};

use crate::metrics::{Timer, record_http_request};

/// Label used for requests that matched no route
const UNMATCHED_PATH: &str = "unmatched";

/// Observability middleware factory
pub struct ObservabilityMiddleware;

impl ObservabilityMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ObservabilityMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for ObservabilityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = ObservabilityMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ObservabilityMiddlewareService { service }))
    }
}

pub struct ObservabilityMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for ObservabilityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let timer = Timer::new();
        let method = req.method().to_string();
        let target = req.path().to_string();
        let pattern = req
            .match_pattern()
            .unwrap_or_else(|| UNMATCHED_PATH.to_string());
        let idempotency_key = req
            .headers()
            .get(kvconf_common::IDEMPOTENCY_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let span = info_span!(
            "http_request",
            http.method = %method,
            http.route = %pattern,
            http.target = %target,
            idempotency_key = %idempotency_key,
            http.status_code = tracing::field::Empty,
        );

        let fut = self.service.call(req);

        Box::pin(
            async move {
                let result = fut.await;
                let status = match &result {
                    Ok(res) => res.status().as_u16(),
                    Err(err) => err.as_response_error().status_code().as_u16(),
                };
                Span::current().record("http.status_code", status);

                let elapsed = timer.elapsed_secs();
                record_http_request(&method, &pattern, status, elapsed);
                debug!(status, elapsed_secs = elapsed, "Request completed");

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test, web};
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[actix_web::test]
    async fn test_records_route_pattern() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let app = test::init_service(
            App::new().wrap(ObservabilityMiddleware::new()).route(
                "/config/{id}",
                web::get().to(|| async { HttpResponse::NotFound().finish() }),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/config/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 404);

        let req = test::TestRequest::get().uri("/nowhere").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 404);

        let rendered = handle.render();
        assert!(rendered.contains("path=\"/config/{id}\""));
        assert!(rendered.contains("path=\"unmatched\""));
        assert!(!rendered.contains("/config/abc"));
    }
}
