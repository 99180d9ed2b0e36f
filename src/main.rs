use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use pb_auth::{ClientConfig, Credentials, PbClient};
use pb_profile::Profile;
use pb_profile::config::AuthSection;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Authenticate against a PocketBase instance
#[derive(Debug, Parser)]
#[command(name = "pb-client", version)]
struct Cli {
    /// Profile file, defaults to profile.toml in the user config directory
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Instance URL; when set, credentials come from flags instead of the profile
    #[arg(long, env = "PB_URL", global = true)]
    url: Option<String>,

    #[arg(long, env = "PB_EMAIL", global = true)]
    email: Option<String>,

    #[arg(long, env = "PB_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "PB_TOKEN", global = true, hide_env_values = true, conflicts_with = "email")]
    token: Option<String>,

    /// Authenticate as an admin instead of an auth collection record
    #[arg(long, global = true)]
    admin: bool,

    /// Auth collection for non-admin accounts
    #[arg(long, default_value = pb_auth::config::DEFAULT_AUTH_COLLECTION, global = true)]
    collection: String,

    /// Log token handling at debug level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Authorize and print the authenticated record
    Login,
    /// Authorize and print the token
    Token,
    /// Store the connection flags in the profile file
    SaveProfile,
}

impl Cli {
    fn account(&self) -> String {
        if self.admin {
            "admin".to_string()
        } else {
            self.collection.clone()
        }
    }

    fn auth_section(&self) -> anyhow::Result<Option<AuthSection>> {
        match (&self.email, &self.password, &self.token) {
            (_, _, Some(token)) => Ok(Some(AuthSection::Token {
                account: self.account(),
                token: token.clone(),
            })),
            (Some(email), Some(password), None) => Ok(Some(AuthSection::Password {
                account: self.account(),
                email: email.clone(),
                password: password.clone(),
            })),
            (Some(_), None, None) => bail!("--email requires --password"),
            (None, Some(_), None) => bail!("--password requires --email"),
            (None, None, None) => Ok(None),
        }
    }

    /// Credential flags only apply together with --url
    fn has_credential_flags(&self) -> bool {
        self.email.is_some() || self.password.is_some() || self.token.is_some()
    }

    fn profile_path(&self) -> anyhow::Result<PathBuf> {
        match &self.profile {
            Some(path) => Ok(path.clone()),
            None => Ok(Profile::default_path()?),
        }
    }

    async fn profile(&self) -> anyhow::Result<Profile> {
        if let Some(url) = &self.url {
            return Ok(Profile {
                auth: self.auth_section()?,
                ..Profile::new(url.clone())
            });
        }

        let path = self.profile_path()?;
        if self.has_credential_flags() {
            warn!(
                profile = %path.display(),
                "Ignoring --email/--password/--token without --url, using the profile credentials"
            );
        }
        Profile::load(&path)
            .await
            .with_context(|| format!("no --url given and no usable profile at {}", path.display()))
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("pb_auth=debug,pb_profile=debug,pb_client=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn authorized_client(cli: &Cli) -> anyhow::Result<PbClient> {
    let config: ClientConfig = cli.profile().await?.into_client_config()?;
    if matches!(config.credentials, Credentials::None) {
        bail!("no credentials configured, pass --email/--password or --token");
    }

    let client = PbClient::new(config)?;
    client.authorize().await.context("authorization failed")?;
    Ok(client)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match &cli.command {
        Command::Login => {
            let client = authorized_client(&cli).await?;
            let store = client.auth_store();

            let record = store.record().unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&record)?);
            if let Some(valid_until) = store.valid_until() {
                eprintln!("token valid until {valid_until}");
            }
        }
        Command::Token => {
            let client = authorized_client(&cli).await?;
            println!("{}", client.auth_store().token());
        }
        Command::SaveProfile => {
            let Some(url) = &cli.url else {
                bail!("save-profile needs --url");
            };
            let profile = Profile {
                auth: cli.auth_section()?,
                ..Profile::new(url.clone())
            };
            // Validate before writing
            profile.clone().into_client_config()?;

            let path = cli.profile_path()?;
            profile.save(&path).await?;
            debug!(path = %path.display(), "Profile saved");
            println!("profile written to {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pb-client").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_password_without_email_is_rejected() {
        let cli = parse(&["--url", "http://localhost:8090", "--password", "pw", "login"]);

        let err = cli.auth_section().unwrap_err();
        assert!(err.to_string().contains("--password requires --email"));
    }

    #[test]
    fn test_email_without_password_is_rejected() {
        let cli = parse(&["--email", "user@user.com", "token"]);

        let err = cli.auth_section().unwrap_err();
        assert!(err.to_string().contains("--email requires --password"));
    }

    #[test]
    fn test_auth_section_from_flags() {
        let cli = parse(&[
            "--admin",
            "--email",
            "admin@admin.com",
            "--password",
            "pw",
            "login",
        ]);

        match cli.auth_section().unwrap() {
            Some(AuthSection::Password { account, email, .. }) => {
                assert_eq!(account, "admin");
                assert_eq!(email, "admin@admin.com");
            }
            other => panic!("Expected password section, got {other:?}"),
        }
        assert!(cli.has_credential_flags());
    }

    #[test]
    fn test_token_uses_collection() {
        let cli = parse(&["--collection", "staff", "--token", "tok", "token"]);

        assert!(matches!(
            cli.auth_section().unwrap(),
            Some(AuthSection::Token { ref account, ref token }) if account == "staff" && token == "tok"
        ));
    }
}
