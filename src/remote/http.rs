//! HTTP binding for the remote content service
//!
//! Speaks JSON over HTTP against the service's REST surface:
//! - `POST /auth/login`, `POST /auth/logout`, `GET /auth/me`
//! - `GET /articles/published`, `GET /articles`, `GET /articles/{id}`
//! - `POST /articles`, `PUT /articles/{id}`
//! - `POST /articles/{id}/publish`, `POST /articles/{id}/unpublish`
//!
//! Proof attachment: bearer tokens go in `Authorization`, ambient principals
//! in `x-caller-principal` (the fronting infrastructure authenticates them),
//! anonymous calls carry neither.
//!
//! Failures arrive as `{"error": {"code", "message"}}` envelopes; the code is
//! mapped structurally onto `RemoteError`, with the HTTP status as fallback
//! when the body is not the envelope.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{CallerProof, RemoteError, RemoteStore};
use crate::config::RemoteConfig;
use crate::models::{Article, ArticleId, ArticleInput, Role};

/// HTTP client binding implementing [`RemoteStore`].
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    /// Build a client against the configured endpoint
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        Ok(builder
            .send()
            .await
            .context("Failed to reach remote content service")?)
    }

    async fn expect_json<T: DeserializeOwned>(&self, response: Response) -> Result<T, RemoteError> {
        if response.status().is_success() {
            Ok(response
                .json::<T>()
                .await
                .context("Failed to decode remote response")?)
        } else {
            Err(read_failure(response).await)
        }
    }
}

/// Attach the caller's proof to an outgoing request
fn attach_proof(builder: RequestBuilder, proof: &CallerProof) -> RequestBuilder {
    match proof {
        CallerProof::Token(token) => builder.bearer_auth(token),
        CallerProof::Identity(principal) => builder.header("x-caller-principal", principal),
        CallerProof::Anonymous => builder,
    }
}

/// Turn a non-success response into a structured failure kind
async fn read_failure(response: Response) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    classify_failure(status, &body)
}

fn classify_failure(status: StatusCode, body: &str) -> RemoteError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        let message = envelope.error.message;
        match envelope.error.code.as_str() {
            "INVALID_CREDENTIALS" => return RemoteError::InvalidCredentials,
            "UNAUTHORIZED" => return RemoteError::Unauthorized(message),
            "FORBIDDEN" => return RemoteError::Forbidden(message),
            "NOT_FOUND" => return RemoteError::NotFound(message),
            "VALIDATION_ERROR" => return RemoteError::Validation(message),
            _ => {} // Unknown code: fall back to the HTTP status
        }
    }

    let detail = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.trim().to_string()
    };

    match status {
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized(detail),
        StatusCode::FORBIDDEN => RemoteError::Forbidden(detail),
        StatusCode::NOT_FOUND => RemoteError::NotFound(detail),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            RemoteError::Validation(detail)
        }
        _ => RemoteError::Transport(anyhow::anyhow!(
            "Remote service returned {}: {}",
            status,
            detail
        )),
    }
}

/// On the login route a rejected proof means a rejected credential pair
fn login_failure(err: RemoteError) -> RemoteError {
    match err {
        RemoteError::Unauthorized(_) => RemoteError::InvalidCredentials,
        other => other,
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    role: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn login(&self, username: &str, password: &str) -> Result<String, RemoteError> {
        let request = self
            .client
            .post(self.url("/auth/login"))
            .json(&LoginRequest { username, password });

        let response = self.send(request).await.map_err(login_failure)?;
        let parsed: LoginResponse = self
            .expect_json(response)
            .await
            .map_err(login_failure)?;
        Ok(parsed.token)
    }

    async fn logout(&self, token: &str) -> Result<(), RemoteError> {
        let request = self.client.post(self.url("/auth/logout")).bearer_auth(token);
        let response = self.send(request).await?;

        if response.status().is_success() {
            return Ok(());
        }
        match read_failure(response).await {
            // A token the service no longer knows is already logged out
            RemoteError::Unauthorized(_) | RemoteError::NotFound(_) => Ok(()),
            err => Err(err),
        }
    }

    async fn create(
        &self,
        input: &ArticleInput,
        proof: &CallerProof,
    ) -> Result<Article, RemoteError> {
        let request = attach_proof(self.client.post(self.url("/articles")), proof).json(input);
        let response = self.send(request).await?;
        self.expect_json(response).await
    }

    async fn update(
        &self,
        id: &ArticleId,
        input: &ArticleInput,
        proof: &CallerProof,
    ) -> Result<Article, RemoteError> {
        let request = attach_proof(
            self.client.put(self.url(&format!("/articles/{}", id))),
            proof,
        )
        .json(input);
        let response = self.send(request).await?;
        self.expect_json(response).await
    }

    async fn publish(&self, id: &ArticleId, proof: &CallerProof) -> Result<Article, RemoteError> {
        let request = attach_proof(
            self.client
                .post(self.url(&format!("/articles/{}/publish", id))),
            proof,
        );
        let response = self.send(request).await?;
        self.expect_json(response).await
    }

    async fn unpublish(
        &self,
        id: &ArticleId,
        proof: &CallerProof,
    ) -> Result<Article, RemoteError> {
        let request = attach_proof(
            self.client
                .post(self.url(&format!("/articles/{}/unpublish", id))),
            proof,
        );
        let response = self.send(request).await?;
        self.expect_json(response).await
    }

    async fn get_by_id(
        &self,
        id: &ArticleId,
        proof: &CallerProof,
    ) -> Result<Option<Article>, RemoteError> {
        let request = attach_proof(self.client.get(self.url(&format!("/articles/{}", id))), proof);
        let response = self.send(request).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let article: Article = self.expect_json(response).await?;
        Ok(Some(article))
    }

    async fn list_published(&self) -> Result<Vec<Article>, RemoteError> {
        let request = self.client.get(self.url("/articles/published"));
        let response = self.send(request).await?;
        self.expect_json(response).await
    }

    async fn list_all(&self, proof: &CallerProof) -> Result<Vec<Article>, RemoteError> {
        let request = attach_proof(self.client.get(self.url("/articles")), proof);
        let response = self.send(request).await?;
        self.expect_json(response).await
    }

    async fn is_caller_admin(&self, proof: &CallerProof) -> Result<bool, RemoteError> {
        // An anonymous caller can never be admin; skip the round trip
        if proof.is_anonymous() {
            return Ok(false);
        }

        let request = attach_proof(self.client.get(self.url("/auth/me")), proof);
        let response = self.send(request).await?;
        let me: MeResponse = self.expect_json(response).await?;
        Ok(matches!(me.role.parse::<Role>(), Ok(Role::Admin)))
    }
}
