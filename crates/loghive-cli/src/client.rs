//! Shared HTTP client construction, error types, and the GraphQL transport
//! helper used by every management command.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use loghive_api_models::{ApiError, GraphqlResponse};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// CLI-level error type distinguishing validation failures, operational
/// failures, and operator-requested cancellation.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
    Cancelled,
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Cancellation is the expected outcome of an operator interrupt and
    /// maps to a clean exit.
    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
            Self::Cancelled => 0,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
            Self::Cancelled => "interrupted".to_string(),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}

/// Connection context passed to every command handler.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) token: Option<String>,
}

impl AppContext {
    pub(crate) fn endpoint(&self, path: &str) -> CliResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| CliError::failure(anyhow!("invalid base URL: {err}")))
    }

    pub(crate) fn auth_token(&self) -> CliResult<&str> {
        self.token.as_deref().ok_or_else(|| {
            CliError::validation(
                "API token is required (pass --token, set LOGHIVE_TOKEN, or run `loghive login`)",
            )
        })
    }
}

/// Construct the process-wide HTTP client: request timeout plus an
/// `x-request-id` default header carrying the invocation's trace id.
pub(crate) fn build_client(timeout_secs: u64, trace_id: &str) -> CliResult<Client> {
    let mut default_headers = HeaderMap::new();
    let request_id = HeaderValue::from_str(trace_id)
        .map_err(|_| CliError::failure(anyhow!("trace identifier contains invalid characters")))?;
    default_headers.insert(HEADER_REQUEST_ID, request_id);

    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .default_headers(default_headers)
        .build()
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
}

/// Classify a non-success HTTP response into a CLI error, preferring the
/// server's own diagnostic when the body carries one.
pub(crate) async fn classify_status(response: reqwest::Response) -> CliError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();

    let detail = serde_json::from_slice::<ApiError>(&bytes)
        .ok()
        .and_then(|problem| problem.detail)
        .unwrap_or_else(|| String::from_utf8_lossy(&bytes).trim().to_string());

    let message = if detail.is_empty() {
        format!("request failed with status {status}")
    } else {
        format!("{detail} (status {status})")
    };

    if status.is_client_error() && status != reqwest::StatusCode::UNAUTHORIZED {
        CliError::validation(message)
    } else {
        CliError::failure(anyhow!(message))
    }
}

/// Issue one GraphQL request against the management endpoint and unwrap the
/// `{data, errors}` envelope. Any reported error fails the invocation.
pub(crate) async fn graphql<T: DeserializeOwned>(
    ctx: &AppContext,
    query: &str,
    variables: Value,
) -> CliResult<T> {
    let token = ctx.auth_token()?;
    let url = ctx.endpoint("/graphql")?;

    let response = ctx
        .client
        .post(url)
        .bearer_auth(token)
        .json(&json!({"query": query, "variables": variables}))
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /graphql failed: {err}")))?;

    if !response.status().is_success() {
        return Err(classify_status(response).await);
    }

    let envelope = response
        .json::<GraphqlResponse<T>>()
        .await
        .map_err(|err| CliError::failure(anyhow!("failed to parse GraphQL response: {err}")))?;

    if let Some(error) = envelope.errors.first() {
        return Err(CliError::failure(anyhow!(
            "server rejected the request: {}",
            error.message
        )));
    }

    envelope
        .data
        .ok_or_else(|| CliError::failure(anyhow!("GraphQL response carried no data")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde::Deserialize;

    fn context(base_url: &str, token: Option<&str>) -> AppContext {
        AppContext {
            client: Client::new(),
            base_url: base_url.parse().unwrap(),
            token: token.map(str::to_string),
        }
    }

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::validation("bad flag").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow!("boom")).exit_code(), 3);
        assert_eq!(CliError::Cancelled.exit_code(), 0);
    }

    #[test]
    fn missing_token_is_a_validation_error() {
        let ctx = context("http://localhost:8080", None);
        assert!(matches!(
            ctx.auth_token().unwrap_err(),
            CliError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn classify_prefers_server_detail() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/boom");
            then.status(400).json_body(serde_json::json!({
                "detail": "repository name is taken"
            }));
        });

        let response = Client::new()
            .get(format!("{}/boom", server.base_url()))
            .send()
            .await
            .unwrap();
        let err = classify_status(response).await;
        assert!(matches!(
            err,
            CliError::Validation(message) if message.contains("repository name is taken")
        ));
    }

    #[tokio::test]
    async fn classify_treats_server_errors_as_failures() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/boom");
            then.status(502);
        });

        let response = Client::new()
            .get(format!("{}/boom", server.base_url()))
            .send()
            .await
            .unwrap();
        assert!(matches!(classify_status(response).await, CliError::Failure(_)));
    }

    #[derive(Deserialize, Debug)]
    struct Greeting {
        greeting: String,
    }

    #[tokio::test]
    async fn graphql_unwraps_the_data_envelope() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/graphql")
                .header("authorization", "Bearer secret");
            then.status(200)
                .json_body(serde_json::json!({"data": {"greeting": "hello"}}));
        });

        let ctx = context(&server.base_url(), Some("secret"));
        let data: Greeting = graphql(&ctx, "query { greeting }", Value::Null)
            .await
            .unwrap();
        assert_eq!(data.greeting, "hello");
        mock.assert();
    }

    #[tokio::test]
    async fn graphql_errors_fail_the_invocation() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/graphql");
            then.status(200).json_body(serde_json::json!({
                "data": null,
                "errors": [{"message": "unknown repository"}]
            }));
        });

        let ctx = context(&server.base_url(), Some("secret"));
        let err = graphql::<Greeting>(&ctx, "query { greeting }", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Failure(error) if error.to_string().contains("unknown repository")
        ));
    }
}
