//! OAuth2 access tokens for the service account.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::credentials::ServiceAccountKey;
use super::error::StorageError;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Maximum assertion lifetime accepted by Google.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Source of bearer tokens for Drive requests.
pub trait TokenProvider: Send + Sync {
    /// Obtain an access token.
    fn access_token(&self) -> impl Future<Output = Result<String, StorageError>> + Send;
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Mints access tokens with the JWT-bearer grant.
///
/// A fresh token is requested for every call.
pub struct ServiceAccountTokenProvider {
    http: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
}

impl ServiceAccountTokenProvider {
    /// Create a provider with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` if the private key is not a valid RSA PEM.
    pub fn new(key: ServiceAccountKey, scope: impl Into<String>) -> Result<Self, StorageError> {
        Self::with_http_client(reqwest::Client::new(), key, scope)
    }

    /// Create a provider sharing an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` if the private key is not a valid RSA PEM.
    pub fn with_http_client(
        http: reqwest::Client,
        key: ServiceAccountKey,
        scope: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StorageError::invalid_credentials(format!("private key: {e}")))?;

        Ok(Self {
            http,
            key,
            encoding_key,
            scope: scope.into(),
        })
    }

    /// The service account this provider authenticates as.
    #[must_use]
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Build the signed assertion exchanged for an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn assertion(&self, issued_at: DateTime<Utc>) -> Result<String, StorageError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.key.private_key_id);

        Ok(jsonwebtoken::encode(&header, &claims, &self.encoding_key)?)
    }
}

impl TokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<String, StorageError> {
        let assertion = self.assertion(Utc::now())?;
        debug!(client_email = %self.key.client_email, "Requesting access token");

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Token exchange rejected");
            return Err(StorageError::TokenExchange(format!("{status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(format!("token response: {e}")))?;
        Ok(token.access_token)
    }
}

impl fmt::Debug for ServiceAccountTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountTokenProvider")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};

    const SERVICE_ACCOUNT: &str = include_str!("../../tests/fixtures/service_account.json");
    const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/test_key.pub.pem");

    fn provider() -> ServiceAccountTokenProvider {
        let key = ServiceAccountKey::from_json(SERVICE_ACCOUNT).expect("fixture should parse");
        ServiceAccountTokenProvider::new(key, "https://www.googleapis.com/auth/drive")
            .expect("fixture key should load")
    }

    #[test]
    fn test_assertion_claims() {
        let provider = provider();
        let issued_at = Utc::now();
        let assertion = provider.assertion(issued_at).expect("signing should succeed");

        let header = decode_header(&assertion).expect("header should decode");
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("0123456789abcdef"));

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth2.googleapis.com/token"]);
        let decoded = decode::<serde_json::Value>(
            &assertion,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).expect("public key should load"),
            &validation,
        )
        .expect("assertion should verify against the public key");

        let claims = decoded.claims;
        assert_eq!(
            claims["iss"],
            "uploader@hackportal-test.iam.gserviceaccount.com"
        );
        assert_eq!(claims["scope"], "https://www.googleapis.com/auth/drive");
        assert_eq!(claims["iat"], issued_at.timestamp());
        assert_eq!(claims["exp"], issued_at.timestamp() + ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn test_invalid_private_key_rejected() {
        let key = ServiceAccountKey::from_json(r#"{"client_email": "a@b.c", "private_key": "not a pem"}"#)
            .expect("key json should parse");
        let err = ServiceAccountTokenProvider::new(key, "scope").unwrap_err();
        assert!(matches!(err, StorageError::InvalidCredentials(_)));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let debug = format!("{:?}", provider());
        assert!(!debug.contains("PRIVATE KEY"));
    }
}
