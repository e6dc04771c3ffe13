//! The login command: verify a token and store it as a profile.

use anyhow::anyhow;
use loghive_config::{ConfigFile, Profile};
use serde::Deserialize;
use serde_json::Value;

use crate::client::{AppContext, CliError, CliResult, graphql};

const DEFAULT_PROFILE_NAME: &str = "default";

pub(crate) async fn handle_login(ctx: &AppContext, profile_name: Option<&str>) -> CliResult<()> {
    let token = match &ctx.token {
        Some(token) => token.clone(),
        None => rpassword::prompt_password("API token: ")
            .map_err(|err| CliError::failure(anyhow!("failed to read token: {err}")))?,
    };
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(CliError::validation("API token must not be empty"));
    }

    // Verify the token before persisting anything.
    let verify_ctx = AppContext {
        client: ctx.client.clone(),
        base_url: ctx.base_url.clone(),
        token: Some(token.clone()),
    };

    #[derive(Deserialize)]
    struct Data {
        viewer: Viewer,
    }

    #[derive(Deserialize)]
    struct Viewer {
        username: String,
    }

    let data: Data = graphql(&verify_ctx, "query { viewer { username } }", Value::Null).await?;

    let path = ConfigFile::default_path().map_err(CliError::failure)?;
    let mut file = ConfigFile::load(&path).map_err(CliError::failure)?;
    let name = profile_name.unwrap_or(DEFAULT_PROFILE_NAME);
    file.set_profile(
        name,
        Profile {
            address: ctx.base_url.to_string(),
            token: Some(token),
        },
    );
    file.save(&path).map_err(CliError::failure)?;

    println!(
        "Logged in to {} as {}",
        ctx.base_url, data.viewer.username
    );
    println!("Profile '{}' saved to {}", name, path.display());
    Ok(())
}
