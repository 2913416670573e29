use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use shared_models::auth::{AuthUser, JwtClaims, Role};
use shared_models::error::AppError;

pub fn create_token(
    user_id: i64,
    email: &str,
    role: Role,
    jwt_secret: &str,
    expiration_hours: i64,
) -> Result<String, AppError> {
    if jwt_secret.is_empty() {
        return Err(AppError::Internal("JWT secret is not set".to_string()));
    }

    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + Duration::hours(expiration_hours)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<AuthUser, AppError> {
    if jwt_secret.is_empty() {
        return Err(AppError::Auth("JWT secret is not set".to_string()));
    }

    let validation = Validation::new(Algorithm::HS256);

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => {
            debug!("Token expired");
            AppError::Auth("Token expired".to_string())
        }
        other => {
            debug!("Token rejected: {:?}", other);
            AppError::Auth("Invalid token".to_string())
        }
    })?;

    let claims = data.claims;
    let id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Auth("Invalid token".to_string()))?;

    debug!("Token validated successfully for user: {}", id);

    Ok(AuthUser {
        id,
        email: claims.email,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_issued_token_validates() {
        let token = create_token(42, "doc@clinic.test", Role::Doctor, SECRET, 1).unwrap();
        let user = validate_token(&token, SECRET).unwrap();

        assert_eq!(user.id, 42);
        assert_eq!(user.email, "doc@clinic.test");
        assert_eq!(user.role, Role::Doctor);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = create_token(1, "p@clinic.test", Role::Patient, SECRET, -2).unwrap();
        assert_matches!(
            validate_token(&token, SECRET),
            Err(AppError::Auth(msg)) if msg == "Token expired"
        );
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_token(1, "p@clinic.test", Role::Patient, SECRET, 1).unwrap();
        assert_matches!(
            validate_token(&token, "another-secret"),
            Err(AppError::Auth(msg)) if msg == "Invalid token"
        );
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        assert_matches!(validate_token("invalid.token.format", SECRET), Err(AppError::Auth(_)));
    }

    #[test]
    fn test_empty_secret() {
        assert_matches!(create_token(1, "a@b.com", Role::Patient, "", 1), Err(AppError::Internal(_)));
        assert_matches!(validate_token("x.y.z", ""), Err(AppError::Auth(_)));
    }
}
