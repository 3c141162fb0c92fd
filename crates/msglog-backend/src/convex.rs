//! Convex HTTP API client.

use async_trait::async_trait;
use msglog_core::{
    CreationTime, FunctionPaths, LogService, Message, SendArgs, ServiceConfig, ServiceError,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

/// Longest response excerpt carried in an error.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy)]
enum CallKind {
    Query,
    Mutation,
}

impl CallKind {
    const fn endpoint(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }
}

#[derive(Serialize)]
struct CallRequest<'a> {
    path: &'a str,
    args: Value,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum CallResponse {
    Success {
        #[serde(default)]
        value: Value,
    },
    Error {
        #[serde(rename = "errorMessage")]
        error_message: String,
        #[serde(rename = "errorData", default)]
        error_data: Option<Value>,
    },
}

fn truncate_for_error(text: &str) -> &str {
    match text.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Log service backed by a Convex deployment.
#[derive(Clone)]
pub struct ConvexLogService {
    http: reqwest::Client,
    base_url: String,
    admin_key: Option<String>,
    functions: FunctionPaths,
}

impl ConvexLogService {
    /// Build a client from connection settings.
    ///
    /// # Errors
    /// Returns a transport error if the HTTP client cannot be constructed.
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ServiceError::Transport(format!("failed to create http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.deployment_url.trim_end_matches('/').to_string(),
            admin_key: config
                .admin_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            functions: config.functions.clone(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        kind: CallKind,
        path: &str,
        args: Value,
    ) -> Result<T, ServiceError> {
        let url = format!("{}/api/{}", self.base_url, kind.endpoint());
        let mut request = self.http.post(&url).json(&CallRequest {
            path,
            args,
            format: "json",
        });
        if let Some(key) = &self.admin_key {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Convex {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Transport(format!("{path}: request failed: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(format!("{path}: failed to read response: {e}")))?;

        let Ok(envelope) = serde_json::from_str::<CallResponse>(&text) else {
            return Err(ServiceError::Transport(format!(
                "{path}: unexpected response (HTTP {status}): {}",
                truncate_for_error(&text)
            )));
        };

        match envelope {
            CallResponse::Success { value } => serde_json::from_value(value).map_err(|e| {
                ServiceError::Transport(format!("{path}: invalid result payload: {e}"))
            }),
            CallResponse::Error {
                error_message,
                error_data: Some(data),
            } => Err(ServiceError::Application(format!("{error_message} ({data})"))),
            CallResponse::Error { error_message, .. } => {
                Err(ServiceError::Application(error_message))
            }
        }
    }
}

#[async_trait]
impl LogService for ConvexLogService {
    async fn send(&self, args: &SendArgs) -> Result<(), ServiceError> {
        let args = serde_json::to_value(args)
            .map_err(|e| ServiceError::Transport(format!("failed to encode send args: {e}")))?;
        self.call(CallKind::Mutation, &self.functions.send, args)
            .await
    }

    async fn list_recent(&self, last_n: usize) -> Result<Vec<Message>, ServiceError> {
        self.call(
            CallKind::Query,
            &self.functions.list_recent,
            json!({ "lastN": last_n }),
        )
        .await
    }

    async fn list_all(&self) -> Result<Vec<Message>, ServiceError> {
        self.call(CallKind::Query, &self.functions.list_all, json!({}))
            .await
    }

    async fn clear_table(&self) -> Result<(), ServiceError> {
        self.call(CallKind::Mutation, &self.functions.clear_table, json!({}))
            .await
    }

    async fn scan_incompletes(&self) -> Result<u64, ServiceError> {
        let count: f64 = self
            .call(CallKind::Query, &self.functions.scan_incompletes, json!({}))
            .await?;
        if !count.is_finite() || count < 0.0 {
            return Err(ServiceError::Transport(format!(
                "{}: invalid count {count}",
                self.functions.scan_incompletes
            )));
        }
        Ok(count as u64)
    }

    async fn context_messages(
        &self,
        reference_time: CreationTime,
    ) -> Result<Vec<Message>, ServiceError> {
        self.call(
            CallKind::Query,
            &self.functions.context_messages,
            json!({ "refTime": reference_time.as_millis() }),
        )
        .await
    }
}
