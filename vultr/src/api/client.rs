use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::common::ApiQueryParams;
use super::error::ApiError;

/// Public Vultr API v2 endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.vultr.com/v2";

/// Vultr API client.
///
/// Calls are single-shot: any failure surfaces immediately to the caller,
/// there is no retry layer.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    auth_header: String,
}

/// Vultr error body: `{"error": "...", "status": 400}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl Client {
    pub fn new(api_key: &str) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Bearer {}", api_key),
        })
    }

    /// Instance API operations
    pub fn instances(&self) -> super::instance::InstanceApi<'_> {
        super::instance::InstanceApi::new(self)
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, &self.auth_header)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Execute a GET request with query parameters
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ApiQueryParams,
    ) -> Result<T, ApiError> {
        let full_path = format!("{}{}", path, params.to_query_string());
        self.get(&full_path).await
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                tracing::error!("failed to parse response: {}, body: {}", e, text);
                ApiError::Parse(format!("failed to parse response: {}", e))
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Auth);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited);
        }

        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.error,
            Err(_) => text,
        };

        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[derive(Debug, Deserialize)]
    struct Account {
        name: String,
    }

    #[tokio::test]
    async fn get_parses_successful_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/account")
            .match_header("authorization", "Bearer test-key")
            .with_body(r#"{"name":"example"}"#)
            .create_async()
            .await;

        let client = Client::with_base_url(&server.url(), "test-key").unwrap();
        let account: Account = client.get("/account").await.unwrap();

        assert_eq!(account.name, "example");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_maps_unauthorized_to_auth_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/account")
            .with_status(401)
            .with_body(r#"{"error":"Invalid API token.","status":401}"#)
            .create_async()
            .await;

        let client = Client::with_base_url(&server.url(), "bad-key").unwrap();
        let result: Result<Account, _> = client.get("/account").await;

        assert!(matches!(result, Err(ApiError::Auth)));
    }

    #[tokio::test]
    async fn get_maps_rate_limit_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/account")
            .with_status(429)
            .create_async()
            .await;

        let client = Client::with_base_url(&server.url(), "key").unwrap();
        let result: Result<Account, _> = client.get("/account").await;

        assert!(matches!(result, Err(ApiError::RateLimited)));
    }

    #[tokio::test]
    async fn get_extracts_vultr_error_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/account")
            .with_status(400)
            .with_body(r#"{"error":"invalid cursor","status":400}"#)
            .create_async()
            .await;

        let client = Client::with_base_url(&server.url(), "key").unwrap();
        let result: Result<Account, _> = client.get("/account").await;

        match result {
            Err(ApiError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid cursor");
            }
            other => panic!("expected Api error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn get_reports_unparseable_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/account")
            .with_body("not json")
            .create_async()
            .await;

        let client = Client::with_base_url(&server.url(), "key").unwrap();
        let result: Result<Account, _> = client.get("/account").await;

        assert!(matches!(result, Err(ApiError::Parse(_))));
    }

    #[tokio::test]
    async fn client_strips_trailing_slash_from_base_url() {
        let mut server = Server::new_async().await;
        let mock = server.mock("GET", "/account").create_async().await;

        let client = Client::with_base_url(&format!("{}/", server.url()), "key").unwrap();
        let _: Result<Account, _> = client.get("/account").await;

        mock.assert_async().await;
    }
}
