use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;
use crate::store::{Session, TaskRepository, UserRepository};

/// The user resolved by [`AuthMiddleware`](super::AuthMiddleware).
///
/// Only available on routes wrapped by the middleware; anywhere else the
/// extraction fails with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<CurrentUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => ready(Err(AppError::Unauthorized(
                "Could not validate credentials".to_string(),
            ))),
        }
    }
}

/// A session opened by the middleware and waiting for the handler.
pub(crate) struct PendingSession(pub(crate) Box<dyn Session>);

/// The request's single store session.
///
/// Reuses the session the auth middleware opened, or begins one for public
/// routes. Writes are discarded unless [`UnitOfWork::commit`] is called.
pub struct UnitOfWork(Box<dyn Session>);

impl UnitOfWork {
    /// Opens a fresh session outside of request extraction.
    pub async fn begin(state: &AppState) -> Result<Self, AppError> {
        Ok(UnitOfWork(state.store.begin().await?))
    }

    pub fn session(&mut self) -> &mut dyn Session {
        self.0.as_mut()
    }

    pub fn users(&mut self) -> &mut dyn UserRepository {
        self.0.users()
    }

    pub fn tasks(&mut self) -> &mut dyn TaskRepository {
        self.0.tasks()
    }

    pub async fn commit(self) -> Result<(), AppError> {
        self.0.commit().await?;
        Ok(())
    }
}

impl FromRequest for UnitOfWork {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pending = req.extensions_mut().remove::<PendingSession>();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            if let Some(PendingSession(session)) = pending {
                return Ok(UnitOfWork(session));
            }
            let state = state.ok_or_else(|| {
                AppError::InternalServerError("application state is not configured".into())
            })?;
            UnitOfWork::begin(&state).await
        })
    }
}
