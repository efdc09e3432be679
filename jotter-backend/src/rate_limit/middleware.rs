//! actix-web middleware wiring for the admission gate.

use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpResponse};
use futures_util::future::LocalBoxFuture;

use super::{Decision, RateLimiter};
use crate::error::ApiError;

/// Wraps a scope so every request is checked against the rate limiter
/// before any handler runs. Rejected requests never reach the handlers.
pub struct RateLimitGuard {
    limiter: Arc<RateLimiter>,
}

impl RateLimitGuard {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitGuardService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitGuardService<S> {
    service: Rc<S>,
    limiter: Arc<RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let limiter = self.limiter.clone();
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let peer = req
                .connection_info()
                .realip_remote_addr()
                .map(|addr| addr.to_string());

            match limiter.check(peer.as_deref()).await {
                Ok(Decision::Allowed) => service
                    .call(req)
                    .await
                    .map(|res| res.map_into_left_body()),
                Ok(Decision::Limited) => {
                    let response =
                        HttpResponse::from_error(ApiError::RateLimited).map_into_right_body();
                    Ok(req.into_response(response))
                }
                Err(e) => {
                    // Counter store fault - same policy as any other store fault
                    let response = HttpResponse::from_error(ApiError::Store(Box::new(e)))
                        .map_into_right_body();
                    Ok(req.into_response(response))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::counter::{CounterError, HitCounter, MemoryCounter};
    use crate::rate_limit::KeyStrategy;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use async_trait::async_trait;
    use std::time::Duration;

    async fn ping() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    fn limiter_with(counter: Arc<dyn HitCounter>, max: u64) -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(
            counter,
            max,
            Duration::from_secs(60),
            KeyStrategy::Global,
        ))
    }

    #[actix_web::test]
    async fn test_guard_rejects_over_threshold() {
        let limiter = limiter_with(Arc::new(MemoryCounter::new()), 2);
        let app = test::init_service(
            App::new().service(
                web::scope("/notes")
                    .wrap(RateLimitGuard::new(limiter))
                    .route("", web::get().to(ping)),
            ),
        )
        .await;

        for _ in 0..2 {
            let req = test::TestRequest::get().uri("/notes").to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }

        let req = test::TestRequest::get().uri("/notes").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Too many requests"));
    }

    struct FailingCounter;

    #[async_trait]
    impl HitCounter for FailingCounter {
        async fn hit(&self, _key: &str, _window: Duration) -> Result<u64, CounterError> {
            Err(CounterError::Timeout)
        }
    }

    #[actix_web::test]
    async fn test_guard_surfaces_counter_fault_as_server_error() {
        let limiter = limiter_with(Arc::new(FailingCounter), 100);
        let app = test::init_service(
            App::new().service(
                web::scope("/notes")
                    .wrap(RateLimitGuard::new(limiter))
                    .route("", web::get().to(ping)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/notes").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
