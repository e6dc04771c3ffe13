//! Poll cadence management for one query job.

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use loghive_api_models::ResultSnapshot;

use crate::client::{CliError, CliResult};
use crate::jobs::{JobHandle, QueryJobClient};

/// Owns the next-permitted-poll timestamp for one job.
///
/// The poller never issues a network poll before that timestamp, except for
/// the very first poll, which is immediate. It does not retry: poll errors
/// propagate to the orchestrator unchanged.
#[derive(Debug, Default)]
pub(crate) struct JobPoller {
    pub(crate) next_poll: Option<Instant>,
}

impl JobPoller {
    pub(crate) const fn new() -> Self {
        Self { next_poll: None }
    }

    /// Wait out the server-advised interval, then issue one poll.
    ///
    /// The inter-poll sleep is the pipeline's primary interruption point:
    /// the token firing during it (or during the in-flight request) returns
    /// `CliError::Cancelled` immediately.
    pub(crate) async fn wait_and_poll(
        &mut self,
        jobs: &QueryJobClient<'_>,
        job: &JobHandle,
        cancel: &CancellationToken,
    ) -> CliResult<ResultSnapshot> {
        if let Some(deadline) = self.next_poll {
            tokio::select! {
                () = cancel.cancelled() => return Err(CliError::Cancelled),
                () = sleep_until(deadline) => {}
            }
        }

        let snapshot = jobs.poll(job, cancel).await?;
        self.next_poll = Some(Instant::now() + snapshot.poll_after());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AppContext;
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

    fn job() -> JobHandle {
        JobHandle {
            repository: "sandbox".to_string(),
            id: "j-1".to_string(),
        }
    }

    #[tokio::test]
    async fn first_poll_is_immediate_and_sets_the_next_deadline() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/repositories/sandbox/queryjobs/j-1");
            then.status(200).json_body(serde_json::json!({
                "done": false,
                "metaData": {"pollAfter": 750}
            }));
        });

        let ctx = context(&server.base_url());
        let jobs = QueryJobClient::new(&ctx);
        let mut poller = JobPoller::new();
        assert!(poller.next_poll.is_none());

        let before = Instant::now();
        let snapshot = poller
            .wait_and_poll(&jobs, &job(), &CancellationToken::new())
            .await
            .unwrap();
        let after = Instant::now();

        assert!(!snapshot.done);
        let next = poller.next_poll.expect("deadline recorded");
        let advised = Duration::from_millis(750);
        assert!(next >= before + advised);
        assert!(next <= after + advised);
    }

    #[tokio::test]
    async fn second_poll_waits_for_the_advised_interval() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/repositories/sandbox/queryjobs/j-1");
            then.status(200).json_body(serde_json::json!({
                "done": false,
                "metaData": {"pollAfter": 200}
            }));
        });

        let ctx = context(&server.base_url());
        let jobs = QueryJobClient::new(&ctx);
        let mut poller = JobPoller::new();
        let cancel = CancellationToken::new();

        poller.wait_and_poll(&jobs, &job(), &cancel).await.unwrap();
        let deadline = poller.next_poll.unwrap();
        poller.wait_and_poll(&jobs, &job(), &cancel).await.unwrap();

        // The second network request happened at or after the deadline.
        assert!(Instant::now() >= deadline);
        mock.assert_hits(2);
    }

    #[tokio::test]
    async fn cancellation_mid_wait_returns_without_polling() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/repositories/sandbox/queryjobs/j-1");
            then.status(200)
                .json_body(serde_json::json!({"done": true, "metaData": {}}));
        });

        let ctx = context(&server.base_url());
        let jobs = QueryJobClient::new(&ctx);
        let mut poller = JobPoller::new();
        poller.next_poll = Some(Instant::now() + Duration::from_secs(60));

        let cancel = CancellationToken::new();
        let trigger = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                cancel.cancel();
            })
        };

        let started = Instant::now();
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            poller.wait_and_poll(&jobs, &job(), &cancel),
        )
        .await
        .expect("wait did not honor cancellation");
        assert!(matches!(result.unwrap_err(), CliError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
        mock.assert_hits(0);
        trigger.await.unwrap();
    }
}
