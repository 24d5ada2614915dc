//! Remote API strategy
//!
//! Talks to the lead search and lead detail endpoints with a bearer token.
//! Expired tokens are refreshed through the OAuth endpoint when a refresh
//! token and client credentials are configured; there is no manual path.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::query::{lead_search_body, with_paging};
use crate::config::{ApiBackendConfig, Secret};
use crate::crawler::{PageSource, SearchQuery};
use crate::extract::RawPayload;
use crate::model::SearchFilter;
use crate::session::{Authenticator, LoginAttempt};
use crate::url::member_id_from_reference;
use crate::{AuthError, FetchError, FetchResult};

const RESTLI_HEADER: &str = "X-Restli-Protocol-Version";
const RESTLI_VERSION: &str = "2.0.0";

#[derive(Debug, Clone)]
struct Token {
    access: Secret,
    refresh: Secret,
    /// Unix milliseconds; 0 when unknown
    expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Builds the HTTP client used by the API strategy
pub fn build_api_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("profile-harvester/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Token-based driver for the remote API
pub struct ApiDriver {
    client: Client,
    base_url: String,
    sales_url: String,
    oauth_token_url: String,
    client_id: String,
    client_secret: Secret,
    page_size: u32,
    detail_fields: String,
    token: RwLock<Token>,
}

impl ApiDriver {
    pub fn new(config: &ApiBackendConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sales_url: config.sales_url.trim_end_matches('/').to_string(),
            oauth_token_url: config.oauth_token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            page_size: config.page_size,
            detail_fields: config.detail_fields.clone(),
            token: RwLock::new(Token {
                access: config.access_token.clone(),
                refresh: config.refresh_token.clone(),
                expires_at: config.token_expires_at,
            }),
        }
    }

    fn token(&self) -> Token {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(self.token().access.expose())
            .header(RESTLI_HEADER, RESTLI_VERSION)
    }

    fn can_refresh(&self) -> bool {
        !self.token().refresh.is_empty()
            && !self.client_id.is_empty()
            && !self.client_secret.is_empty()
    }

    /// Exchanges the refresh token for a new access token
    async fn refresh_token(&self) -> Result<(), AuthError> {
        let refresh = self.token().refresh;
        tracing::info!("Refreshing API access token");

        let response = self
            .client
            .post(&self.oauth_token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh.expose()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::InvalidCredentials(format!(
                "token refresh returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("token refresh response: {}", e)))?;

        let mut token = self.token.write().unwrap_or_else(PoisonError::into_inner);
        token.access = Secret::new(body.access_token);
        if let Some(new_refresh) = body.refresh_token.filter(|t| !t.is_empty()) {
            token.refresh = Secret::new(new_refresh);
        }
        token.expires_at = body
            .expires_in
            .map(|secs| chrono::Utc::now().timestamp_millis() + secs * 1000)
            .unwrap_or(0);
        Ok(())
    }

    async fn read_json(response: Response, url: &str) -> FetchResult<Value> {
        match response.status() {
            StatusCode::UNAUTHORIZED => Err(FetchError::Unauthorized {
                url: url.to_string(),
            }),
            StatusCode::NOT_FOUND => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
            status if !status.is_success() => Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            }),
            _ => response.json().await.map_err(|e| FetchError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Authenticator for ApiDriver {
    async fn acquire(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn release(&self) {}

    async fn verify(&self) -> FetchResult<bool> {
        if self.token().access.is_empty() || self.token_expired() {
            return Ok(false);
        }

        let url = format!("{}/me", self.base_url);
        let response = self.authorized(self.client.get(&url)).send().await?;
        match Self::read_json(response, &url).await {
            Ok(_) => Ok(true),
            Err(FetchError::Unauthorized { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn submit_credentials(&self) -> LoginAttempt {
        match self.verify().await {
            Ok(true) => return LoginAttempt::Authenticated,
            Ok(false) => {}
            Err(e) => return LoginAttempt::Rejected(AuthError::Unavailable(e.to_string())),
        }

        if self.can_refresh() {
            return match self.refresh_token().await {
                Ok(()) => LoginAttempt::Authenticated,
                Err(e) => LoginAttempt::Rejected(e),
            };
        }

        if self.token().access.is_empty() {
            LoginAttempt::Rejected(AuthError::MissingCredentials(
                "api.access-token is not configured".to_string(),
            ))
        } else {
            LoginAttempt::Rejected(AuthError::TokenExpired)
        }
    }

    async fn login_signal(&self) -> bool {
        false
    }

    fn token_expired(&self) -> bool {
        let expires_at = self.token().expires_at;
        expires_at > 0 && chrono::Utc::now().timestamp_millis() >= expires_at
    }
}

#[async_trait]
impl PageSource for ApiDriver {
    fn build_query(&self, filter: &SearchFilter) -> FetchResult<SearchQuery> {
        Ok(SearchQuery::Body(lead_search_body(filter)))
    }

    async fn fetch_search_page(&self, query: &SearchQuery, page: u32) -> FetchResult<RawPayload> {
        let url = format!("{}/sales/search/lead", self.sales_url);
        let SearchQuery::Body(body) = query else {
            return Err(FetchError::Navigation {
                url,
                message: "API searches need a request body".to_string(),
            });
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&with_paging(body, page, self.page_size))
            .send()
            .await?;
        Self::read_json(response, &url).await.map(RawPayload::Json)
    }

    async fn fetch_profile(&self, profile: &str) -> FetchResult<RawPayload> {
        let member_id = member_id_from_reference(profile)
            .ok_or_else(|| FetchError::InvalidProfileUrl(profile.to_string()))?;

        let url = format!("{}/sales/leads/{}", self.sales_url, member_id);
        let response = self
            .authorized(self.client.get(&url))
            .query(&[("fields", self.detail_fields.as_str())])
            .send()
            .await?;
        Self::read_json(response, &url).await.map(RawPayload::Json)
    }
}
