//! The search command: query-job lifecycle, the poll-render loop, and the
//! three execution modes.

use std::io::{self, Write};

use anyhow::anyhow;
use loghive_api_models::{QuerySpec, ResultSnapshot};
use tokio_util::sync::CancellationToken;

use crate::cli::SearchArgs;
use crate::client::{AppContext, CliError, CliResult};
use crate::format::{DEFAULT_EVENT_FORMAT, RowFormat};
use crate::jobs::{JobHandle, QueryJobClient};
use crate::output::{SnapshotRenderer, select_renderer};
use crate::poll::JobPoller;

/// Execution mode, fixed for the whole invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchMode {
    /// Render every non-empty snapshot, stop once the job is done.
    Normal,
    /// Keep polling and rendering until externally cancelled.
    Live,
    /// Stay quiet until the job is done, then render the final snapshot.
    Complete,
}

impl SearchMode {
    fn from_args(args: &SearchArgs) -> CliResult<Self> {
        match (args.live, args.complete) {
            (true, true) => Err(CliError::validation(
                "--live and --complete are mutually exclusive",
            )),
            (true, false) => Ok(Self::Live),
            (false, true) => Ok(Self::Complete),
            (false, false) => Ok(Self::Normal),
        }
    }
}

pub(crate) async fn handle_search(
    ctx: &AppContext,
    args: SearchArgs,
    cancel: &CancellationToken,
) -> CliResult<()> {
    let mode = SearchMode::from_args(&args)?;
    let query = args.query.trim();
    if query.is_empty() {
        return Err(CliError::validation("query must not be empty"));
    }
    let format = RowFormat::parse(args.format.as_deref().unwrap_or(DEFAULT_EVENT_FORMAT))?;

    let spec = QuerySpec {
        query_string: query.to_string(),
        start: args.start.clone(),
        end: args.end.clone(),
        is_live: args.live,
        arguments: args.arguments.iter().cloned().collect(),
    };

    let jobs = QueryJobClient::new(ctx);
    let job = jobs.create(&args.repository, &spec).await?;
    tracing::debug!(repository = %job.repository, job = %job.id, "query job created");

    let mut stdout = io::stdout();
    let outcome = poll_and_render(&jobs, &job, mode, format, cancel, &mut stdout).await;

    // Best-effort: the job is released on every exit path, and a failed
    // deletion never fails the invocation.
    if let Err(err) = jobs.delete(&job).await {
        tracing::debug!(job = %job.id, error = %err, "query job deletion failed");
    }

    outcome
}

async fn poll_and_render(
    jobs: &QueryJobClient<'_>,
    job: &JobHandle,
    mode: SearchMode,
    format: RowFormat,
    cancel: &CancellationToken,
    out: &mut dyn Write,
) -> CliResult<()> {
    let mut poller = JobPoller::new();
    let mut renderer: Option<Box<dyn SnapshotRenderer>> = None;
    let mut pending: Option<ResultSnapshot> = None;

    loop {
        let snapshot = poller.wait_and_poll(jobs, job, cancel).await?;
        let renderer = renderer.get_or_insert_with(|| select_renderer(&snapshot, format.clone()));

        if mode != SearchMode::Complete && !snapshot.events.is_empty() {
            renderer.render(&snapshot, out).map_err(write_error)?;
        }

        let done = snapshot.done;
        let cancelled = snapshot.cancelled;
        if mode == SearchMode::Complete {
            pending = Some(snapshot);
        }

        if cancelled {
            tracing::warn!(job = %job.id, "query job was cancelled on the server");
            break;
        }
        if done && mode != SearchMode::Live {
            break;
        }
    }

    if let (Some(snapshot), Some(renderer)) = (pending.as_ref(), renderer.as_mut()) {
        renderer.render(snapshot, out).map_err(write_error)?;
    }
    Ok(())
}

fn write_error(err: io::Error) -> CliError {
    CliError::failure(anyhow!("failed to write search output: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use reqwest::Client;
    use std::time::Duration;

    fn context(base_url: &str) -> AppContext {
        AppContext {
            client: Client::new(),
            base_url: base_url.parse().unwrap(),
            token: Some("secret".to_string()),
        }
    }

    fn search_args(repository: &str, query: &str) -> SearchArgs {
        SearchArgs {
            repository: repository.to_string(),
            query: query.to_string(),
            start: None,
            end: None,
            live: false,
            complete: false,
            format: None,
            arguments: Vec::new(),
        }
    }

    fn mock_create(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/repositories/sandbox/queryjobs");
            then.status(200).json_body(serde_json::json!({"id": "j-1"}));
        })
    }

    fn mock_delete(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(DELETE)
                .path("/api/v1/repositories/sandbox/queryjobs/j-1");
            then.status(204);
        })
    }

    #[test]
    fn live_and_complete_are_rejected_together() {
        let mut args = search_args("sandbox", "count()");
        args.live = true;
        args.complete = true;
        assert!(matches!(
            SearchMode::from_args(&args).unwrap_err(),
            CliError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn normal_mode_terminates_on_done_and_releases_the_job() {
        let server = MockServer::start_async().await;
        let create = mock_create(&server);
        let poll = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/repositories/sandbox/queryjobs/j-1");
            then.status(200).json_body(serde_json::json!({
                "done": true,
                "events": [{"@id": "a", "@rawstring": "hello"}],
                "metaData": {"eventCount": 1, "isAggregate": false, "pollAfter": 10}
            }));
        });
        let delete = mock_delete(&server);

        let ctx = context(&server.base_url());
        let mut args = search_args("sandbox", "count()");
        args.format = Some("{@rawstring}".to_string());
        handle_search(&ctx, args, &CancellationToken::new())
            .await
            .unwrap();

        create.assert();
        poll.assert();
        delete.assert();
    }

    #[tokio::test]
    async fn complete_mode_renders_only_the_final_snapshot() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/repositories/sandbox/queryjobs/j-1");
            then.status(200).json_body(serde_json::json!({
                "done": true,
                "events": [{"@id": "a", "@rawstring": "final"}],
                "metaData": {"eventCount": 1, "isAggregate": false, "pollAfter": 10}
            }));
        });

        let ctx = context(&server.base_url());
        let jobs = QueryJobClient::new(&ctx);
        let job = JobHandle {
            repository: "sandbox".to_string(),
            id: "j-1".to_string(),
        };
        let mut sink = Vec::new();
        poll_and_render(
            &jobs,
            &job,
            SearchMode::Complete,
            RowFormat::parse("{@rawstring}").unwrap(),
            &CancellationToken::new(),
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(String::from_utf8(sink).unwrap(), "final\n");
    }

    #[tokio::test]
    async fn live_mode_keeps_polling_past_done_until_cancelled() {
        let server = MockServer::start_async().await;
        let create = mock_create(&server);
        let poll = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/repositories/sandbox/queryjobs/j-1");
            then.status(200).json_body(serde_json::json!({
                "done": true,
                "events": [],
                "metaData": {"eventCount": 0, "isAggregate": false, "pollAfter": 10}
            }));
        });
        let delete = mock_delete(&server);

        let ctx = context(&server.base_url());
        let mut args = search_args("sandbox", "count()");
        args.live = true;

        let cancel = CancellationToken::new();
        let trigger = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(150)).await;
                cancel.cancel();
            })
        };

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            handle_search(&ctx, args, &cancel),
        )
        .await
        .expect("live search did not stop on cancellation");

        assert!(matches!(result.unwrap_err(), CliError::Cancelled));
        create.assert();
        assert!(poll.hits() > 1);
        delete.assert();
        trigger.await.unwrap();
    }

    #[tokio::test]
    async fn server_side_cancellation_ends_the_loop() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/repositories/sandbox/queryjobs/j-1");
            then.status(200).json_body(serde_json::json!({
                "done": false,
                "cancelled": true,
                "metaData": {"pollAfter": 10}
            }));
        });

        let ctx = context(&server.base_url());
        let jobs = QueryJobClient::new(&ctx);
        let job = JobHandle {
            repository: "sandbox".to_string(),
            id: "j-1".to_string(),
        };
        let mut sink = Vec::new();
        poll_and_render(
            &jobs,
            &job,
            SearchMode::Normal,
            RowFormat::parse("{@rawstring}").unwrap(),
            &CancellationToken::new(),
            &mut sink,
        )
        .await
        .unwrap();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn an_empty_query_is_rejected_before_any_request() {
        let ctx = context("http://localhost:9");
        let args = search_args("sandbox", "   ");
        assert!(matches!(
            handle_search(&ctx, args, &CancellationToken::new())
                .await
                .unwrap_err(),
            CliError::Validation(_)
        ));
    }
}
