//! User management commands.

use loghive_api_models::User;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::cli::{OutputFormat, UserAddArgs, UserNameArgs, UserUpdateArgs};
use crate::client::{AppContext, CliError, CliResult, graphql};
use crate::output::{render_user, render_user_list};

const USER_FIELDS: &str = "id username fullName email isRoot createdAt";

pub(crate) async fn handle_user_list(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    #[derive(Deserialize)]
    struct Data {
        users: Vec<User>,
    }

    let query = format!("query {{ users {{ {USER_FIELDS} }} }}");
    let data: Data = graphql(ctx, &query, Value::Null).await?;
    render_user_list(&data.users, output)
}

pub(crate) async fn handle_user_show(
    ctx: &AppContext,
    args: UserNameArgs,
    output: OutputFormat,
) -> CliResult<()> {
    #[derive(Deserialize)]
    struct Data {
        user: Option<User>,
    }

    let query =
        format!("query User($username: String!) {{ user(username: $username) {{ {USER_FIELDS} }} }}");
    let data: Data = graphql(ctx, &query, json!({"username": args.username})).await?;
    let user = data
        .user
        .ok_or_else(|| CliError::validation(format!("user '{}' does not exist", args.username)))?;
    render_user(&user, output)
}

pub(crate) async fn handle_user_add(ctx: &AppContext, args: UserAddArgs) -> CliResult<()> {
    #[derive(Deserialize)]
    struct Data {
        #[serde(rename = "addUser")]
        add_user: Added,
    }

    #[derive(Deserialize)]
    struct Added {
        user: User,
    }

    let mutation = format!(
        "mutation AddUser($username: String!, $fullName: String, $email: String, $isRoot: Boolean) \
         {{ addUser(username: $username, fullName: $fullName, email: $email, isRoot: $isRoot) \
         {{ user {{ {USER_FIELDS} }} }} }}"
    );
    let data: Data = graphql(
        ctx,
        &mutation,
        json!({
            "username": args.username,
            "fullName": args.full_name,
            "email": args.email,
            "isRoot": args.root,
        }),
    )
    .await?;
    println!("User added (id: {})", data.add_user.user.id);
    Ok(())
}

pub(crate) async fn handle_user_update(ctx: &AppContext, args: UserUpdateArgs) -> CliResult<()> {
    if args.full_name.is_none() && args.email.is_none() && args.root.is_none() {
        return Err(CliError::validation(
            "nothing to update (pass --full-name, --email, or --root)",
        ));
    }

    let mutation = "mutation UpdateUser($username: String!, $fullName: String, $email: String, \
                    $isRoot: Boolean) { updateUser(username: $username, fullName: $fullName, \
                    email: $email, isRoot: $isRoot) { user { id } } }";
    graphql::<Value>(
        ctx,
        mutation,
        json!({
            "username": args.username,
            "fullName": args.full_name,
            "email": args.email,
            "isRoot": args.root,
        }),
    )
    .await?;
    println!("User updated ({})", args.username);
    Ok(())
}

pub(crate) async fn handle_user_remove(ctx: &AppContext, args: UserNameArgs) -> CliResult<()> {
    const MUTATION: &str =
        "mutation RemoveUser($username: String!) { removeUser(username: $username) { user { id } } }";
    graphql::<Value>(ctx, MUTATION, json!({"username": args.username})).await?;
    println!("User removed ({})", args.username);
    Ok(())
}
