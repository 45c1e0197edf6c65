//! Authenticated HTTP dispatch to the gateway
//!
//! [`DarajaApi`] is the single place where network failures surface: it
//! obtains a bearer token from the [`TokenManager`], serializes the payload
//! and performs the POST. Responses come back as raw JSON; gateway result
//! codes are left to the caller to interpret.

pub mod error;
pub mod types;

use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::error::Error;
use crate::token::TokenManager;
use error::DarajaApiError;

/// Low-level gateway HTTP client
#[derive(Clone)]
pub struct DarajaApi {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<TokenManager>,
}

impl DarajaApi {
    /// Create a dispatcher for `base_url` drawing tokens from `tokens`
    pub fn new(http: reqwest::Client, base_url: Url, tokens: Arc<TokenManager>) -> Self {
        Self {
            http,
            base_url,
            tokens,
        }
    }

    /// POST `payload` to `path` with bearer auth, returning the raw response
    pub async fn post<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<serde_json::Value, Error> {
        let token = self.tokens.access_token().await?;
        let url = self.base_url.join(path)?;

        tracing::debug!("POST {}", url);

        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> Result<serde_json::Value, Error> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(serde_json::from_str(&text)?)
        } else {
            tracing::warn!("Gateway error: {} - {}", status, text);
            match serde_json::from_str::<DarajaApiError>(&text) {
                Ok(api_error) => Err(Error::Api(api_error)),
                Err(_) => Err(Error::Status {
                    status: status.as_u16(),
                    body: text,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::token::InMemoryTokenStore;

    async fn serve(app: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{}", addr)).unwrap()
    }

    fn with_token_endpoint(app: Router) -> Router {
        app.route(
            "/oauth/v1/generate",
            get(|| async { Json(json!({"access_token": "test-token", "expires_in": "3599"})) }),
        )
    }

    fn api(base_url: Url) -> DarajaApi {
        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            base_url.clone(),
            "key".to_string(),
            "secret".to_string(),
            Arc::new(InMemoryTokenStore::new()),
        ));
        DarajaApi::new(http, base_url, tokens)
    }

    #[tokio::test]
    async fn test_post_attaches_bearer_and_returns_raw_json() {
        let app = with_token_endpoint(Router::new().route(
            "/mpesa/accountbalance/v1/query",
            post(
                |headers: axum::http::HeaderMap, Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(
                        headers.get("authorization").unwrap(),
                        "Bearer test-token"
                    );
                    assert_eq!(body["CommandID"], "AccountBalance");
                    Json(json!({"ResponseCode": "0", "ResponseDescription": "Accepted"}))
                },
            ),
        ));
        let api = api(serve(app).await);

        let response = api
            .post(
                "/mpesa/accountbalance/v1/query",
                &json!({"CommandID": "AccountBalance"}),
            )
            .await
            .unwrap();

        assert_eq!(response["ResponseCode"], "0");
    }

    #[tokio::test]
    async fn test_structured_gateway_error_is_parsed() {
        let app = with_token_endpoint(Router::new().route(
            "/mpesa/reversal/v1/request",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "requestId": "1-2-3",
                        "errorCode": "404.001.03",
                        "errorMessage": "Invalid Access Token"
                    })),
                )
            }),
        ));
        let api = api(serve(app).await);

        let err = api
            .post("/mpesa/reversal/v1/request", &json!({}))
            .await
            .unwrap_err();

        match err {
            Error::Api(api_error) => {
                assert_eq!(api_error.error_code, "404.001.03");
            }
            other => panic!("expected Error::Api, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unstructured_error_surfaces_status_and_body() {
        let app = with_token_endpoint(Router::new().route(
            "/mpesa/qrcode/v1/generate",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream unavailable") }),
        ));
        let api = api(serve(app).await);

        let err = api
            .post("/mpesa/qrcode/v1/generate", &json!({}))
            .await
            .unwrap_err();

        match err {
            Error::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream unavailable");
            }
            other => panic!("expected Error::Status, got {:?}", other),
        }
    }
}
