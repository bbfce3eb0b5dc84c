use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use chrono::Utc;
use futures::future::{ready, LocalBoxFuture, Ready};

use super::extractors::{CurrentUser, PendingSession};
use super::guard::authenticate;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;
use crate::store::Session;

/// Rejects requests that do not carry a valid bearer token.
///
/// On success the resolved user and the request's open store session are
/// left in the request extensions for [`CurrentUser`] and
/// [`UnitOfWork`](super::UnitOfWork).
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let (user, session) = match resolve(&req).await {
                Ok(resolved) => resolved,
                Err(err) => return Ok(req.error_response(err).map_into_right_body()),
            };

            req.extensions_mut().insert(CurrentUser(user));
            req.extensions_mut().insert(PendingSession(session));

            let res = service.call(req).await?;
            // Release a session no handler claimed, e.g. when path extraction failed.
            res.request().extensions_mut().remove::<PendingSession>();
            Ok(res.map_into_left_body())
        })
    }
}

/// Opens the request's session and authenticates the caller with it.
async fn resolve(req: &ServiceRequest) -> Result<(User, Box<dyn Session>), AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("application state is not configured".into()))?;

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let mut session = state.store.begin().await?;
    let user = authenticate(&state.tokens, session.users(), auth_header, Utc::now()).await?;
    Ok((user, session))
}
