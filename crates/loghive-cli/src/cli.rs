//! Argument parsing, connection resolution, and command dispatch.

use clap::{Args, Parser, Subcommand, ValueEnum};
use loghive_config::{ConfigError, ConfigFile};
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliError, CliResult, build_client};
use crate::commands::alerts::{handle_alert_list, handle_alert_remove, handle_alert_show};
use crate::commands::login::handle_login;
use crate::commands::parsers::{handle_parser_list, handle_parser_remove, handle_parser_show};
use crate::commands::repos::{
    handle_repo_create, handle_repo_delete, handle_repo_list, handle_repo_show,
};
use crate::commands::search::handle_search;
use crate::commands::status::handle_status;
use crate::commands::tokens::{handle_token_add, handle_token_list, handle_token_remove};
use crate::commands::users::{
    handle_user_add, handle_user_list, handle_user_remove, handle_user_show, handle_user_update,
};

const DEFAULT_ADDRESS: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Parses CLI arguments, executes the requested command, and maps the
/// outcome to a process exit code: 0 for success or a clean interrupt, 2 for
/// validation failures, 3 for operational failures.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    init_tracing();
    let trace_id = Uuid::new_v4().to_string();

    match dispatch(cli, &trace_id).await {
        Ok(()) => 0,
        Err(err) => {
            // An operator interrupt is the expected way to stop a live
            // search; it exits cleanly without an error banner.
            if !matches!(err, CliError::Cancelled) {
                eprintln!("error: {}", err.display_message());
            }
            err.exit_code()
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli, trace_id: &str) -> CliResult<()> {
    let path = ConfigFile::default_path().map_err(CliError::failure)?;
    let file = ConfigFile::load(&path).map_err(CliError::failure)?;
    let connection = resolve_connection(&cli, &file)?;

    let ctx = AppContext {
        client: build_client(cli.timeout, trace_id)?,
        base_url: connection.address,
        token: connection.token,
    };

    // One interrupt source per process, threaded explicitly through every
    // suspend point of the search pipeline.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let output = cli.output;
    match cli.command {
        Command::Search(args) => handle_search(&ctx, args, &cancel).await,
        Command::Repos(command) => match command {
            ReposCommand::List => handle_repo_list(&ctx, output).await,
            ReposCommand::Show(args) => handle_repo_show(&ctx, args, output).await,
            ReposCommand::Create(args) => handle_repo_create(&ctx, args).await,
            ReposCommand::Delete(args) => handle_repo_delete(&ctx, args).await,
        },
        Command::Users(command) => match command {
            UsersCommand::List => handle_user_list(&ctx, output).await,
            UsersCommand::Show(args) => handle_user_show(&ctx, args, output).await,
            UsersCommand::Add(args) => handle_user_add(&ctx, args).await,
            UsersCommand::Update(args) => handle_user_update(&ctx, args).await,
            UsersCommand::Remove(args) => handle_user_remove(&ctx, args).await,
        },
        Command::Parsers(command) => match command {
            ParsersCommand::List(args) => handle_parser_list(&ctx, args, output).await,
            ParsersCommand::Show(args) => handle_parser_show(&ctx, args, output).await,
            ParsersCommand::Remove(args) => handle_parser_remove(&ctx, args).await,
        },
        Command::Alerts(command) => match command {
            AlertsCommand::List(args) => handle_alert_list(&ctx, args, output).await,
            AlertsCommand::Show(args) => handle_alert_show(&ctx, args, output).await,
            AlertsCommand::Remove(args) => handle_alert_remove(&ctx, args).await,
        },
        Command::IngestTokens(command) => match command {
            TokensCommand::List(args) => handle_token_list(&ctx, args, output).await,
            TokensCommand::Add(args) => handle_token_add(&ctx, args).await,
            TokensCommand::Remove(args) => handle_token_remove(&ctx, args).await,
        },
        Command::Status => handle_status(&ctx, output).await,
        Command::Login => handle_login(&ctx, cli.profile.as_deref()).await,
    }
}

#[derive(Debug)]
struct Connection {
    address: Url,
    token: Option<String>,
}

/// Layer the connection sources: explicit flags and environment variables
/// win over the selected profile, which wins over the built-in default.
fn resolve_connection(cli: &Cli, file: &ConfigFile) -> CliResult<Connection> {
    let profile = match file.profile(cli.profile.as_deref()) {
        Ok(profile) => profile,
        // `login` creates the profile it was pointed at; every other
        // command needs it to exist.
        Err(ConfigError::UnknownProfile { .. }) if matches!(cli.command, Command::Login) => None,
        Err(err @ ConfigError::UnknownProfile { .. }) => {
            return Err(CliError::validation(err.to_string()));
        }
        Err(err) => return Err(CliError::failure(err)),
    };

    let address = match &cli.address {
        Some(raw) => raw.parse::<Url>().map_err(|err| {
            CliError::validation(format!("invalid server address '{raw}': {err}"))
        })?,
        None => match profile {
            Some(profile) => profile.parsed_address().map_err(CliError::failure)?,
            None => DEFAULT_ADDRESS
                .parse()
                .map_err(|err| CliError::failure(anyhow::anyhow!("invalid default address: {err}")))?,
        },
    };

    let token = cli
        .token
        .clone()
        .or_else(|| profile.and_then(|profile| profile.token.clone()));

    Ok(Connection { address, token })
}

#[derive(Parser)]
#[command(
    name = "loghive",
    about = "Management CLI for a Loghive log platform instance",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "LOGHIVE_ADDRESS",
        help = "Base URL of the server, overriding the selected profile"
    )]
    pub(crate) address: Option<String>,
    #[arg(long, global = true, env = "LOGHIVE_TOKEN", hide_env_values = true)]
    pub(crate) token: Option<String>,
    #[arg(long, global = true, env = "LOGHIVE_PROFILE")]
    pub(crate) profile: Option<String>,
    #[arg(
        long,
        global = true,
        env = "LOGHIVE_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Output shape for management commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run a search against a repository.
    Search(SearchArgs),
    /// Manage repositories.
    #[command(subcommand)]
    Repos(ReposCommand),
    /// Manage user accounts.
    #[command(subcommand)]
    Users(UsersCommand),
    /// Manage parsers installed in a repository.
    #[command(subcommand)]
    Parsers(ParsersCommand),
    /// Manage alerts configured on a repository.
    #[command(subcommand)]
    Alerts(AlertsCommand),
    /// Manage ingest tokens of a repository.
    #[command(subcommand)]
    IngestTokens(TokensCommand),
    /// Report server status and version.
    Status,
    /// Verify an API token and store it as a profile.
    Login,
}

#[derive(Args)]
pub(crate) struct SearchArgs {
    /// Repository to search.
    pub(crate) repository: String,
    /// Query text.
    pub(crate) query: String,
    /// Start of the search interval, absolute or relative (e.g. "10m").
    #[arg(long)]
    pub(crate) start: Option<String>,
    /// End of the search interval.
    #[arg(long)]
    pub(crate) end: Option<String>,
    /// Keep the search running and render results as they arrive.
    #[arg(long, conflicts_with = "complete")]
    pub(crate) live: bool,
    /// Suppress partial results and render only the final result.
    #[arg(long)]
    pub(crate) complete: bool,
    /// Row format template, e.g. "{@timestamp} {host:-12} {@rawstring}".
    #[arg(long = "format")]
    pub(crate) format: Option<String>,
    /// Named query argument, repeatable.
    #[arg(long = "arg", value_parser = parse_key_value, value_name = "KEY=VALUE")]
    pub(crate) arguments: Vec<(String, String)>,
}

#[derive(Subcommand)]
pub(crate) enum ReposCommand {
    /// List all repositories.
    List,
    /// Show one repository.
    Show(RepoNameArgs),
    /// Create a repository.
    Create(RepoCreateArgs),
    /// Delete a repository.
    Delete(RepoNameArgs),
}

#[derive(Args)]
pub(crate) struct RepoNameArgs {
    /// Repository name.
    pub(crate) name: String,
}

#[derive(Args)]
pub(crate) struct RepoCreateArgs {
    /// Repository name.
    pub(crate) name: String,
    /// Free-form description.
    #[arg(long)]
    pub(crate) description: Option<String>,
}

#[derive(Args)]
pub(crate) struct RepoScopedArgs {
    /// Repository name.
    pub(crate) repository: String,
}

#[derive(Args)]
pub(crate) struct RepoScopedNameArgs {
    /// Repository name.
    pub(crate) repository: String,
    /// Entity name within the repository.
    pub(crate) name: String,
}

#[derive(Subcommand)]
pub(crate) enum UsersCommand {
    /// List all users.
    List,
    /// Show one user.
    Show(UserNameArgs),
    /// Add a user.
    Add(UserAddArgs),
    /// Update a user's details.
    Update(UserUpdateArgs),
    /// Remove a user.
    Remove(UserNameArgs),
}

#[derive(Args)]
pub(crate) struct UserNameArgs {
    /// Login name.
    pub(crate) username: String,
}

#[derive(Args)]
pub(crate) struct UserAddArgs {
    /// Login name.
    pub(crate) username: String,
    /// Display name.
    #[arg(long)]
    pub(crate) full_name: Option<String>,
    /// Contact email address.
    #[arg(long)]
    pub(crate) email: Option<String>,
    /// Grant root privileges.
    #[arg(long)]
    pub(crate) root: bool,
}

#[derive(Args)]
pub(crate) struct UserUpdateArgs {
    /// Login name.
    pub(crate) username: String,
    /// New display name.
    #[arg(long)]
    pub(crate) full_name: Option<String>,
    /// New contact email address.
    #[arg(long)]
    pub(crate) email: Option<String>,
    /// Grant or revoke root privileges.
    #[arg(long)]
    pub(crate) root: Option<bool>,
}

#[derive(Subcommand)]
pub(crate) enum ParsersCommand {
    /// List parsers in a repository.
    List(RepoScopedArgs),
    /// Show one parser.
    Show(RepoScopedNameArgs),
    /// Remove a parser.
    Remove(RepoScopedNameArgs),
}

#[derive(Subcommand)]
pub(crate) enum AlertsCommand {
    /// List alerts on a repository.
    List(RepoScopedArgs),
    /// Show one alert.
    Show(RepoScopedNameArgs),
    /// Remove an alert.
    Remove(RepoScopedNameArgs),
}

#[derive(Subcommand)]
pub(crate) enum TokensCommand {
    /// List ingest tokens of a repository.
    List(RepoScopedArgs),
    /// Add an ingest token.
    Add(TokenAddArgs),
    /// Remove an ingest token.
    Remove(RepoScopedNameArgs),
}

#[derive(Args)]
pub(crate) struct TokenAddArgs {
    /// Repository name.
    pub(crate) repository: String,
    /// Token name.
    pub(crate) name: String,
    /// Parser assigned to data ingested with this token.
    #[arg(long)]
    pub(crate) parser: Option<String>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use loghive_config::Profile;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(args)
    }

    #[test]
    fn live_and_complete_conflict_at_parse_time() {
        let result = parse(&["loghive", "search", "sandbox", "count()", "--live", "--complete"]);
        assert!(result.is_err());
    }

    #[test]
    fn search_arguments_parse_key_value_pairs() {
        let cli = parse(&[
            "loghive", "search", "sandbox", "count()", "--arg", "host=web-1", "--arg", "env=prod",
        ])
        .unwrap();
        let Command::Search(args) = cli.command else {
            panic!("expected the search command");
        };
        assert_eq!(
            args.arguments,
            vec![
                ("host".to_string(), "web-1".to_string()),
                ("env".to_string(), "prod".to_string())
            ]
        );
    }

    #[test]
    fn malformed_query_arguments_are_rejected() {
        assert!(parse(&["loghive", "search", "sandbox", "count()", "--arg", "hostweb"]).is_err());
        assert!(parse(&["loghive", "search", "sandbox", "count()", "--arg", "=web"]).is_err());
    }

    #[test]
    fn flags_override_the_profile() {
        let mut file = ConfigFile::default();
        file.set_profile(
            "prod",
            Profile {
                address: "https://logs.example.com/".to_string(),
                token: Some("profile-token".to_string()),
            },
        );

        let cli = parse(&[
            "loghive",
            "--profile",
            "prod",
            "--token",
            "flag-token",
            "status",
        ])
        .unwrap();
        let connection = resolve_connection(&cli, &file).unwrap();
        assert_eq!(connection.address.as_str(), "https://logs.example.com/");
        assert_eq!(connection.token.as_deref(), Some("flag-token"));
    }

    #[test]
    fn missing_profile_is_a_validation_error() {
        let cli = parse(&["loghive", "--profile", "staging", "status"]).unwrap();
        let err = resolve_connection(&cli, &ConfigFile::default()).unwrap_err();
        assert!(matches!(err, CliError::Validation(_)));
    }

    #[test]
    fn login_tolerates_a_profile_that_does_not_exist_yet() {
        let cli = parse(&["loghive", "--profile", "staging", "login"]).unwrap();
        let connection = resolve_connection(&cli, &ConfigFile::default()).unwrap();
        assert_eq!(connection.address.as_str(), "http://localhost:8080/");
        assert!(connection.token.is_none());
    }

    #[test]
    fn the_default_address_applies_without_flags_or_profiles() {
        let cli = parse(&["loghive", "repos", "list"]).unwrap();
        let connection = resolve_connection(&cli, &ConfigFile::default()).unwrap();
        assert_eq!(connection.address.as_str(), "http://localhost:8080/");
    }
}
