use super::model::{AuthenticatedUser, CustomClaims};
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::jwks::JwksClient;

/// Validates bearer tokens issued by the external identity provider
pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    // iss, aud, exp and nbf are checked by jsonwebtoken
    #[serde(flatten)]
    custom: CustomClaims,
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        leeway: Duration,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            leeway: leeway.as_secs(),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        validation
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Auth(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Auth(format!(
                "Unsupported algorithm: {:?}. Only RS256 is allowed",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Auth("Missing kid in token header".to_string()))?;

        let decoding_key = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let claims = decode::<Claims>(token, &decoding_key, &self.validation())
            .map_err(|e| AppError::Auth(e.to_string()))?
            .claims;

        Ok(AuthenticatedUser {
            sub: claims.sub,
            roles: claims.custom.roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_roles_default_to_empty() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "kiosk-user",
            "iss": "https://id.example.com",
            "aud": "printdesk",
            "exp": 2000000000u64
        }))
        .unwrap();
        assert_eq!(claims.sub, "kiosk-user");
        assert!(claims.custom.roles.is_empty());
    }

    #[test]
    fn test_claims_roles_are_read() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "operator",
            "roles": ["shop"]
        }))
        .unwrap();
        assert_eq!(claims.custom.roles, vec!["shop".to_string()]);
    }

    #[tokio::test]
    async fn test_rejects_garbage_token() {
        let validator = JwtValidator::new(
            Arc::new(JwksClient::new(
                "http://127.0.0.1:9/jwks",
                Duration::from_secs(60),
            )),
            "https://id.example.com".to_string(),
            "printdesk".to_string(),
            Duration::from_secs(0),
        );

        let err = validator.validate_token("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }
}
