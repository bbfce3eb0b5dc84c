//! Shared setup for the integration tests: an app over a fresh in-memory
//! store plus small request helpers.
#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header::HeaderMap, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use chrono::Duration;
use jsonwebtoken::Algorithm;
use serde_json::{json, Value};
use std::sync::Arc;
use tasktrack::auth::TokenService;
use tasktrack::routes;
use tasktrack::store::MemoryStore;
use tasktrack::AppState;

pub const SECRET: &[u8] = b"integration-test-secret";
// Lowest cost bcrypt accepts; keeps the suite fast.
pub const TEST_COST: u32 = 4;

pub fn token_service() -> TokenService {
    TokenService::new(SECRET, Algorithm::HS256, Duration::minutes(30))
}

pub fn state(store: &MemoryStore) -> web::Data<AppState> {
    web::Data::new(AppState {
        store: Arc::new(store.clone()),
        tokens: token_service(),
        bcrypt_cost: TEST_COST,
    })
}

pub async fn init_app(
    store: &MemoryStore,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(state(store))
            .wrap(Logger::default())
            .configure(routes::config),
    )
    .await
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Sends `req` and decodes the body as JSON (`Null` when empty).
pub async fn send<S, B>(app: &S, req: Request) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    Reply {
        status,
        headers,
        body,
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub async fn register<S, B>(app: &S, email: &str, password: &str) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    send(app, req).await
}

pub async fn login<S, B>(app: &S, email: &str, password: &str) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/token")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    send(app, req).await
}

/// Registers a user, logs in and returns the bearer token.
pub async fn sign_up<S, B>(app: &S, email: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let registered = register(app, email, password).await;
    assert_eq!(registered.status, StatusCode::OK, "register: {}", registered.body);

    let logged_in = login(app, email, password).await;
    assert_eq!(logged_in.status, StatusCode::OK, "login: {}", logged_in.body);
    logged_in.body["access_token"]
        .as_str()
        .expect("access_token in login response")
        .to_string()
}

pub async fn create_task<S, B>(app: &S, token: &str, payload: Value) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/tasks/")
        .insert_header(bearer(token))
        .set_json(payload)
        .to_request();
    send(app, req).await
}
