//! Resolves the caller of a request from its `Authorization` header.

use chrono::{DateTime, Utc};

use super::token::{AuthError, TokenService};
use crate::error::AppError;
use crate::models::User;
use crate::store::UserRepository;

const BEARER: &str = "bearer";

/// Extracts the credential from an `Authorization` header value.
/// The scheme is matched case-insensitively.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(AuthError::Unauthorized("missing credentials"))?;

    let (scheme, credential) = header
        .split_once(' ')
        .ok_or(AuthError::Unauthorized("unsupported authorization scheme"))?;
    if !scheme.eq_ignore_ascii_case(BEARER) {
        return Err(AuthError::Unauthorized("unsupported authorization scheme"));
    }

    let credential = credential.trim();
    if credential.is_empty() {
        return Err(AuthError::Unauthorized("missing credentials"));
    }
    Ok(credential)
}

/// Verifies the bearer token and loads its subject from the credential store.
///
/// Every failure to authenticate comes back as [`AppError::Unauthorized`];
/// only a failing store surfaces as something else. Nothing is cached: each
/// call re-verifies the token and re-reads the user.
pub async fn authenticate(
    tokens: &TokenService,
    users: &mut dyn UserRepository,
    header: Option<&str>,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    let token = bearer_token(header)?;
    let user_id = tokens.verify_at(token, now)?;

    match users.find_by_id(user_id).await? {
        Some(record) => Ok(record.into()),
        None => Err(AuthError::Unauthorized("subject no longer exists").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;
    use crate::store::{MemoryStore, Store};
    use chrono::Duration;
    use jsonwebtoken::Algorithm;

    fn tokens() -> TokenService {
        TokenService::new(b"guard-secret", Algorithm::HS256, Duration::minutes(30))
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(Some("bearer   abc")), Ok("abc"));
        assert_eq!(bearer_token(Some("  BEARER abc  ")), Ok("abc"));

        for bad in [None, Some(""), Some("Bearer"), Some("Bearer   "), Some("Basic dXNlcjpwdw==")] {
            assert!(
                matches!(bearer_token(bad), Err(AuthError::Unauthorized(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test_log::test(actix_rt::test)]
    async fn test_authenticate_resolves_existing_user() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let record = UserRecord::new("a@x.com".into(), "hash".into(), Utc::now());

        let mut session = store.begin().await.unwrap();
        session.users().create(&record).await.unwrap();

        let now = Utc::now();
        let token = tokens.issue_at(record.id, Duration::minutes(30), now).unwrap();
        let header = format!("Bearer {}", token);

        let user = authenticate(&tokens, session.users(), Some(&header), now)
            .await
            .unwrap();
        assert_eq!(user.id, record.id);
        assert_eq!(user.email, "a@x.com");
    }

    #[actix_rt::test]
    async fn test_authenticate_rejects_bad_credentials() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let record = UserRecord::new("a@x.com".into(), "hash".into(), Utc::now());
        let mut session = store.begin().await.unwrap();
        session.users().create(&record).await.unwrap();

        let now = Utc::now();
        let valid = tokens.issue_at(record.id, Duration::minutes(30), now).unwrap();
        let expired = tokens
            .issue_at(record.id, Duration::minutes(30), now - Duration::hours(1))
            .unwrap();
        let foreign = TokenService::new(b"other", Algorithm::HS256, Duration::minutes(30))
            .issue_at(record.id, Duration::minutes(30), now)
            .unwrap();
        let orphan = tokens
            .issue_at(uuid::Uuid::new_v4(), Duration::minutes(30), now)
            .unwrap();

        let cases = vec![
            (None, "missing header"),
            (Some(format!("Token {}", valid)), "scheme mismatch"),
            (Some(format!("Bearer {}", expired)), "expired token"),
            (Some(format!("Bearer {}", foreign)), "foreign signature"),
            (Some("Bearer garbage".to_string()), "malformed token"),
            (Some(format!("Bearer {}", orphan)), "unknown subject"),
        ];

        for (header, description) in cases {
            let result = authenticate(&tokens, session.users(), header.as_deref(), now).await;
            assert!(
                matches!(result, Err(AppError::Unauthorized(_))),
                "{} should be unauthorized, got {:?}",
                description,
                result
            );
        }
    }
}
