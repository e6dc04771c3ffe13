//! Ingest-token management commands.

use loghive_api_models::IngestToken;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::cli::{OutputFormat, RepoScopedArgs, RepoScopedNameArgs, TokenAddArgs};
use crate::client::{AppContext, CliError, CliResult, graphql};
use crate::output::render_token_list;

const TOKEN_FIELDS: &str = "name token parser";

pub(crate) async fn handle_token_list(
    ctx: &AppContext,
    args: RepoScopedArgs,
    output: OutputFormat,
) -> CliResult<()> {
    #[derive(Deserialize)]
    struct Data {
        repository: Option<RepositoryTokens>,
    }

    #[derive(Deserialize)]
    struct RepositoryTokens {
        #[serde(rename = "ingestTokens")]
        ingest_tokens: Vec<IngestToken>,
    }

    let query = format!(
        "query IngestTokens($repository: String!) \
         {{ repository(name: $repository) {{ ingestTokens {{ {TOKEN_FIELDS} }} }} }}"
    );
    let data: Data = graphql(ctx, &query, json!({"repository": args.repository})).await?;
    let repository = data.repository.ok_or_else(|| {
        CliError::validation(format!("repository '{}' does not exist", args.repository))
    })?;
    render_token_list(&repository.ingest_tokens, output)
}

pub(crate) async fn handle_token_add(ctx: &AppContext, args: TokenAddArgs) -> CliResult<()> {
    #[derive(Deserialize)]
    struct Data {
        #[serde(rename = "addIngestToken")]
        add_ingest_token: IngestToken,
    }

    let mutation = format!(
        "mutation AddIngestToken($repository: String!, $name: String!, $parser: String) \
         {{ addIngestToken(repositoryName: $repository, name: $name, parserName: $parser) \
         {{ {TOKEN_FIELDS} }} }}"
    );
    let data: Data = graphql(
        ctx,
        &mutation,
        json!({
            "repository": args.repository,
            "name": args.name,
            "parser": args.parser,
        }),
    )
    .await?;
    let created = data.add_ingest_token;
    println!("Ingest token '{}' created: {}", created.name, created.token);
    Ok(())
}

pub(crate) async fn handle_token_remove(
    ctx: &AppContext,
    args: RepoScopedNameArgs,
) -> CliResult<()> {
    const MUTATION: &str = "mutation RemoveIngestToken($repository: String!, $name: String!) \
                            { removeIngestToken(repositoryName: $repository, name: $name) }";
    graphql::<Value>(
        ctx,
        MUTATION,
        json!({"repository": args.repository, "name": args.name}),
    )
    .await?;
    println!("Ingest token removed ({})", args.name);
    Ok(())
}
