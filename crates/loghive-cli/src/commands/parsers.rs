//! Parser management commands.

use loghive_api_models::Parser;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::cli::{OutputFormat, RepoScopedArgs, RepoScopedNameArgs};
use crate::client::{AppContext, CliError, CliResult, graphql};
use crate::output::{render_parser, render_parser_list};

const PARSER_FIELDS: &str = "id name isBuiltIn";

pub(crate) async fn handle_parser_list(
    ctx: &AppContext,
    args: RepoScopedArgs,
    output: OutputFormat,
) -> CliResult<()> {
    #[derive(Deserialize)]
    struct Data {
        repository: Option<RepositoryParsers>,
    }

    #[derive(Deserialize)]
    struct RepositoryParsers {
        parsers: Vec<Parser>,
    }

    let query = format!(
        "query Parsers($repository: String!) \
         {{ repository(name: $repository) {{ parsers {{ {PARSER_FIELDS} }} }} }}"
    );
    let data: Data = graphql(ctx, &query, json!({"repository": args.repository})).await?;
    let repository = data.repository.ok_or_else(|| {
        CliError::validation(format!("repository '{}' does not exist", args.repository))
    })?;
    render_parser_list(&repository.parsers, output)
}

pub(crate) async fn handle_parser_show(
    ctx: &AppContext,
    args: RepoScopedNameArgs,
    output: OutputFormat,
) -> CliResult<()> {
    #[derive(Deserialize)]
    struct Data {
        repository: Option<RepositoryParser>,
    }

    #[derive(Deserialize)]
    struct RepositoryParser {
        parser: Option<Parser>,
    }

    let query = format!(
        "query Parser($repository: String!, $name: String!) \
         {{ repository(name: $repository) {{ parser(name: $name) {{ {PARSER_FIELDS} }} }} }}"
    );
    let data: Data = graphql(
        ctx,
        &query,
        json!({"repository": args.repository, "name": args.name}),
    )
    .await?;
    let parser = data
        .repository
        .and_then(|repository| repository.parser)
        .ok_or_else(|| {
            CliError::validation(format!(
                "parser '{}' does not exist in repository '{}'",
                args.name, args.repository
            ))
        })?;
    render_parser(&parser, output)
}

pub(crate) async fn handle_parser_remove(
    ctx: &AppContext,
    args: RepoScopedNameArgs,
) -> CliResult<()> {
    const MUTATION: &str = "mutation RemoveParser($repository: String!, $name: String!) \
                            { removeParser(repositoryName: $repository, name: $name) }";
    graphql::<Value>(
        ctx,
        MUTATION,
        json!({"repository": args.repository, "name": args.name}),
    )
    .await?;
    println!("Parser removed ({})", args.name);
    Ok(())
}
