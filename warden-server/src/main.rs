use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use warden_core::UserPatch;
use warden_server::commands::{self, build_claims, parse_claim, password_or_prompt};
use warden_server::infra::{
    config::Config,
    startup::{AppContext, token_service},
    telemetry::init_tracing,
};

#[derive(Parser, Debug)]
#[command(
    name = "warden",
    version,
    about = "Warden account backend",
    long_about = "Manage Warden user accounts, tokens and the database schema."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply database migrations and exit
    Migrate,
    /// Create, inspect, change or remove user accounts
    #[command(subcommand)]
    User(UserCommand),
    /// Check credentials and issue an access/refresh token pair
    Login(Credentials),
    /// Issue or verify access tokens without touching the database
    #[command(subcommand)]
    Token(TokenCommand),
    /// Print an Argon2 hash of a password
    HashPassword(PasswordArg),
    /// Check a password against a stored hash
    VerifyPassword {
        /// PHC-formatted hash to check against
        hash: String,
        #[command(flatten)]
        password: PasswordArg,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Register a new user
    Create(Credentials),
    /// Show the user with this email
    Show { email: String },
    /// Change a user's email, password or refresh token
    Update {
        email: String,
        #[arg(long)]
        new_email: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
        #[arg(long)]
        refresh_token: Option<String>,
    },
    /// Delete the user with this email
    Delete { email: String },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Sign a token carrying the given claims
    Issue {
        /// Claim as key=value; repeatable. JSON values keep their type.
        #[arg(long = "claim", value_parser = parse_claim)]
        claims: Vec<(String, Value)>,
        /// Lifetime such as `15m` or `2h`; defaults to the configured expiry
        #[arg(long)]
        expires_in: Option<humantime::Duration>,
    },
    /// Verify a token and print its claims
    Verify { token: String },
}

#[derive(Args, Debug)]
struct Credentials {
    email: String,
    #[command(flatten)]
    password: PasswordArg,
}

#[derive(Args, Debug)]
struct PasswordArg {
    /// Password; prompted for when omitted
    #[arg(long, env = "WARDEN_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    // Config is loaded only by the commands that use it.
    let output = match cli.command {
        Command::Migrate => commands::migrate(&Config::from_env()?).await?,
        Command::User(command) => run_user(Config::from_env()?, command).await?,
        Command::Login(Credentials { email, password }) => {
            let config = Config::from_env()?;
            let password = password_or_prompt(password.password, false)?;
            let ctx = AppContext::connect(&config).await?;
            commands::login(&ctx, &email, &password).await?
        }
        Command::Token(command) => run_token(&Config::from_env()?, command)?,
        Command::HashPassword(password) => {
            let password = password_or_prompt(password.password, true)?;
            commands::hash_password(&password)?
        }
        Command::VerifyPassword { hash, password } => {
            let password = password_or_prompt(password.password, false)?;
            commands::verify_password(&password, &hash)?
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("failed to render output")?
    );
    Ok(())
}

async fn run_user(config: Config, command: UserCommand) -> Result<Value> {
    // Prompt before connecting.
    match command {
        UserCommand::Create(Credentials { email, password }) => {
            let password = password_or_prompt(password.password, true)?;
            let ctx = AppContext::connect(&config).await?;
            commands::create_user(&ctx, &email, &password).await
        }
        UserCommand::Show { email } => {
            let ctx = AppContext::connect(&config).await?;
            commands::show_user(&ctx, &email).await
        }
        UserCommand::Update {
            email,
            new_email,
            new_password,
            refresh_token,
        } => {
            let patch = UserPatch {
                email: new_email,
                password: new_password,
                refresh_token,
            };
            let ctx = AppContext::connect(&config).await?;
            commands::update_user(&ctx, &email, &patch).await
        }
        UserCommand::Delete { email } => {
            let ctx = AppContext::connect(&config).await?;
            commands::delete_user(&ctx, &email).await
        }
    }
}

fn run_token(config: &Config, command: TokenCommand) -> Result<Value> {
    let tokens = token_service(config)?;
    match command {
        TokenCommand::Issue { claims, expires_in } => {
            let expires_in = expires_in
                .map(|duration| chrono::Duration::from_std(duration.into()))
                .transpose()
                .context("expiry is out of range")?;
            commands::issue_token(&tokens, &build_claims(claims), expires_in)
        }
        TokenCommand::Verify { token } => commands::verify_token(&tokens, &token),
    }
}
