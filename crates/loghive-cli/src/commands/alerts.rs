//! Alert management commands.

use loghive_api_models::Alert;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::cli::{OutputFormat, RepoScopedArgs, RepoScopedNameArgs};
use crate::client::{AppContext, CliError, CliResult, graphql};
use crate::output::{render_alert, render_alert_list};

const ALERT_FIELDS: &str = "id name description enabled";

pub(crate) async fn handle_alert_list(
    ctx: &AppContext,
    args: RepoScopedArgs,
    output: OutputFormat,
) -> CliResult<()> {
    #[derive(Deserialize)]
    struct Data {
        repository: Option<RepositoryAlerts>,
    }

    #[derive(Deserialize)]
    struct RepositoryAlerts {
        alerts: Vec<Alert>,
    }

    let query = format!(
        "query Alerts($repository: String!) \
         {{ repository(name: $repository) {{ alerts {{ {ALERT_FIELDS} }} }} }}"
    );
    let data: Data = graphql(ctx, &query, json!({"repository": args.repository})).await?;
    let repository = data.repository.ok_or_else(|| {
        CliError::validation(format!("repository '{}' does not exist", args.repository))
    })?;
    render_alert_list(&repository.alerts, output)
}

pub(crate) async fn handle_alert_show(
    ctx: &AppContext,
    args: RepoScopedNameArgs,
    output: OutputFormat,
) -> CliResult<()> {
    #[derive(Deserialize)]
    struct Data {
        repository: Option<RepositoryAlert>,
    }

    #[derive(Deserialize)]
    struct RepositoryAlert {
        alert: Option<Alert>,
    }

    let query = format!(
        "query Alert($repository: String!, $name: String!) \
         {{ repository(name: $repository) {{ alert(name: $name) {{ {ALERT_FIELDS} }} }} }}"
    );
    let data: Data = graphql(
        ctx,
        &query,
        json!({"repository": args.repository, "name": args.name}),
    )
    .await?;
    let alert = data
        .repository
        .and_then(|repository| repository.alert)
        .ok_or_else(|| {
            CliError::validation(format!(
                "alert '{}' does not exist in repository '{}'",
                args.name, args.repository
            ))
        })?;
    render_alert(&alert, output)
}

pub(crate) async fn handle_alert_remove(
    ctx: &AppContext,
    args: RepoScopedNameArgs,
) -> CliResult<()> {
    const MUTATION: &str = "mutation RemoveAlert($repository: String!, $name: String!) \
                            { removeAlert(repositoryName: $repository, name: $name) }";
    graphql::<Value>(
        ctx,
        MUTATION,
        json!({"repository": args.repository, "name": args.name}),
    )
    .await?;
    println!("Alert removed ({})", args.name);
    Ok(())
}
