//! Server status command.

use anyhow::anyhow;
use loghive_api_models::StatusResponse;

use crate::cli::OutputFormat;
use crate::client::{AppContext, CliError, CliResult, classify_status};
use crate::output::render_status;

pub(crate) async fn handle_status(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    let url = ctx.endpoint("/api/v1/status")?;
    let response = ctx
        .client
        .get(url)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /api/v1/status failed: {err}")))?;

    if !response.status().is_success() {
        return Err(classify_status(response).await);
    }

    let status = response
        .json::<StatusResponse>()
        .await
        .map_err(|err| CliError::failure(anyhow!("failed to parse status response: {err}")))?;
    render_status(&status, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use reqwest::Client;

    #[tokio::test]
    async fn status_round_trips_without_authentication() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v1/status");
            then.status(200)
                .json_body(serde_json::json!({"status": "OK", "version": "1.42.0"}));
        });

        let ctx = AppContext {
            client: Client::new(),
            base_url: server.base_url().parse().unwrap(),
            token: None,
        };
        handle_status(&ctx, OutputFormat::Table).await.unwrap();
        mock.assert();
    }
}
