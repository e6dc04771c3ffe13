//! Repository management commands.

use loghive_api_models::Repository;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::cli::{OutputFormat, RepoCreateArgs, RepoNameArgs};
use crate::client::{AppContext, CliError, CliResult, graphql};
use crate::output::{render_repository, render_repository_list};

const REPOSITORY_FIELDS: &str = "id name description compressedByteSize retentionDays";

pub(crate) async fn handle_repo_list(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    #[derive(Deserialize)]
    struct Data {
        repositories: Vec<Repository>,
    }

    let query = format!("query {{ repositories {{ {REPOSITORY_FIELDS} }} }}");
    let data: Data = graphql(ctx, &query, Value::Null).await?;
    render_repository_list(&data.repositories, output)
}

pub(crate) async fn handle_repo_show(
    ctx: &AppContext,
    args: RepoNameArgs,
    output: OutputFormat,
) -> CliResult<()> {
    #[derive(Deserialize)]
    struct Data {
        repository: Option<Repository>,
    }

    let query = format!(
        "query Repository($name: String!) {{ repository(name: $name) {{ {REPOSITORY_FIELDS} }} }}"
    );
    let data: Data = graphql(ctx, &query, json!({"name": args.name})).await?;
    let repository = data.repository.ok_or_else(|| {
        CliError::validation(format!("repository '{}' does not exist", args.name))
    })?;
    render_repository(&repository, output)
}

pub(crate) async fn handle_repo_create(ctx: &AppContext, args: RepoCreateArgs) -> CliResult<()> {
    #[derive(Deserialize)]
    struct Data {
        #[serde(rename = "createRepository")]
        create_repository: Created,
    }

    #[derive(Deserialize)]
    struct Created {
        repository: Repository,
    }

    let mutation = format!(
        "mutation CreateRepository($name: String!, $description: String) \
         {{ createRepository(name: $name, description: $description) \
         {{ repository {{ {REPOSITORY_FIELDS} }} }} }}"
    );
    let data: Data = graphql(
        ctx,
        &mutation,
        json!({"name": args.name, "description": args.description}),
    )
    .await?;
    let repository = data.create_repository.repository;
    println!("Repository created (id: {})", repository.id);
    Ok(())
}

pub(crate) async fn handle_repo_delete(ctx: &AppContext, args: RepoNameArgs) -> CliResult<()> {
    const MUTATION: &str =
        "mutation DeleteRepository($name: String!) { deleteRepository(name: $name) }";
    graphql::<Value>(ctx, MUTATION, json!({"name": args.name})).await?;
    println!("Repository deletion requested ({})", args.name);
    Ok(())
}
