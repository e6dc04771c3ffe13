//! REST client for asynchronous query jobs: create, poll, delete.

use anyhow::anyhow;
use loghive_api_models::{CreateQueryJobResponse, QuerySpec, ResultSnapshot};
use tokio_util::sync::CancellationToken;

use crate::client::{AppContext, CliError, CliResult, classify_status};

/// The (repository, job id) pair identifying one job for its lifetime.
#[derive(Debug, Clone)]
pub(crate) struct JobHandle {
    pub(crate) repository: String,
    pub(crate) id: String,
}

/// Thin client over the query-job endpoints of one server instance.
pub(crate) struct QueryJobClient<'a> {
    ctx: &'a AppContext,
}

impl<'a> QueryJobClient<'a> {
    pub(crate) const fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// Submit a query job and return its handle.
    pub(crate) async fn create(&self, repository: &str, spec: &QuerySpec) -> CliResult<JobHandle> {
        let token = self.ctx.auth_token()?;
        let url = self
            .ctx
            .endpoint(&format!("/api/v1/repositories/{repository}/queryjobs"))?;

        let response = self
            .ctx
            .client
            .post(url)
            .bearer_auth(token)
            .json(spec)
            .send()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to create query job: {err}")))?;

        if !response.status().is_success() {
            return Err(classify_status(response).await);
        }

        let body = response
            .json::<CreateQueryJobResponse>()
            .await
            .map_err(|err| {
                CliError::failure(anyhow!("failed to parse query job response: {err}"))
            })?;

        if body.id.is_empty() {
            return Err(CliError::failure(anyhow!(
                "server returned an empty query job id"
            )));
        }

        Ok(JobHandle {
            repository: repository.to_string(),
            id: body.id,
        })
    }

    /// Issue one poll request.
    ///
    /// The in-flight request is abandoned as soon as the token fires, so
    /// interrupt latency stays bounded by the select rather than the
    /// server's response time.
    pub(crate) async fn poll(
        &self,
        job: &JobHandle,
        cancel: &CancellationToken,
    ) -> CliResult<ResultSnapshot> {
        let token = self.ctx.auth_token()?;
        let url = self.ctx.endpoint(&format!(
            "/api/v1/repositories/{}/queryjobs/{}",
            job.repository, job.id
        ))?;
        let request = self.ctx.client.get(url).bearer_auth(token).send();

        let response = tokio::select! {
            () = cancel.cancelled() => return Err(CliError::Cancelled),
            result = request => result
                .map_err(|err| CliError::failure(anyhow!("failed to poll query job: {err}")))?,
        };

        if !response.status().is_success() {
            return Err(classify_status(response).await);
        }

        response
            .json::<ResultSnapshot>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse query job snapshot: {err}")))
    }

    /// Request deletion of a finished or abandoned job. Callers treat
    /// failures as non-fatal.
    pub(crate) async fn delete(&self, job: &JobHandle) -> CliResult<()> {
        let token = self.ctx.auth_token()?;
        let url = self.ctx.endpoint(&format!(
            "/api/v1/repositories/{}/queryjobs/{}",
            job.repository, job.id
        ))?;

        let response = self
            .ctx
            .client
            .delete(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to delete query job: {err}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(classify_status(response).await)
        }
    }
}
