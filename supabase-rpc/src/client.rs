use std::sync::Arc;

use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::{Credentials, RpcUrl};

/// Client for invoking Postgres functions through PostgREST.
///
/// Cheap to clone; the underlying `reqwest::Client` pools connections.
#[derive(Clone, Debug)]
pub struct SupabaseClient {
    http: reqwest::Client,
    credentials: Arc<Credentials>,
}

impl SupabaseClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_http_client(credentials, reqwest::Client::new())
    }

    /// Use a preconfigured HTTP client, e.g. one with a request timeout.
    pub fn with_http_client(credentials: Credentials, http: reqwest::Client) -> Self {
        Self {
            http,
            credentials: Arc::new(credentials),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.credentials.url
    }

    /// Call `function` with `params` serialized as the JSON body and decode
    /// the JSON response as `T`.
    #[tracing::instrument(name = "supabase_rpc", skip(self, params))]
    pub async fn call<P, T>(&self, function: &str, params: &P) -> Result<T, RpcError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if !is_valid_function_name(function) {
            return Err(RpcError::InvalidFunction(function.to_string()));
        }

        let url = RpcUrl::for_function(&self.credentials.url, function);

        let resp = self
            .http
            .post(url.as_ref())
            .header("apikey", &self.credentials.api_key)
            .header("Authorization", self.credentials.bearer_header())
            .json(params)
            .send()
            .await
            .map_err(|e| RpcError::ResponseError(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RpcError::Unauthorized);
        }

        if !status.is_success() {
            let body = resp
                .text()
                .await
                .map_err(|e| RpcError::ResponseError(e.to_string()))?;
            let message = PostgrestError::message_from_body(&body);
            tracing::warn!(status = status.as_u16(), "RPC call returned an error: {}", message);
            return Err(RpcError::Rpc {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<T>().await.map_err(|e| {
            RpcError::ParsingError(format!("Failed to parse response as JSON: {}", e))
        })
    }
}

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid function name: {0}")]
    InvalidFunction(String),
    #[error("ResponseError: {0}")]
    ResponseError(String),
    #[error("RPC failed with status {status}: {message}")]
    Rpc { status: u16, message: String },
    #[error("ParsingError: {0}")]
    ParsingError(String),
}

/// Error body returned by PostgREST for failed calls.
#[derive(Debug, Deserialize)]
pub struct PostgrestError {
    pub message: String,
    pub code: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl PostgrestError {
    /// Best-effort human readable message; falls back to the raw body.
    pub fn message_from_body(body: &str) -> String {
        match serde_json::from_str::<PostgrestError>(body) {
            Ok(err) => match err.code {
                Some(code) => format!("{} ({})", err.message, code),
                None => err.message,
            },
            Err(_) if body.trim().is_empty() => "empty response body".to_string(),
            Err(_) => body.trim().to_string(),
        }
    }
}

fn is_valid_function_name(function: &str) -> bool {
    !function.is_empty()
        && function
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
