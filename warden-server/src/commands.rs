//! Handlers behind each `warden` subcommand. Each returns the JSON value the
//! binary prints on stdout.

use anyhow::{Context, Result, anyhow, bail};
use chrono::Duration;
use dialoguer::Password;
use serde_json::{Value, json};
use tracing::info;
use warden_core::{Claims, CredentialHasher, TokenService, UserPatch, UserStoreError};

use crate::infra::{
    config::Config,
    startup::{AppContext, connect_database},
};

/// Use the password given on the command line, or prompt for it.
pub fn password_or_prompt(given: Option<String>, confirm: bool) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    prompt.interact().context("failed to read password")
}

/// Parse a `key=value` claim. Values that read as JSON keep their type;
/// anything else becomes a string.
pub fn parse_claim(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("claim name must not be empty".to_string());
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn build_claims(pairs: Vec<(String, Value)>) -> Claims {
    pairs.into_iter().collect()
}

pub async fn migrate(config: &Config) -> Result<Value> {
    let database = connect_database(config).await?;
    database.migrate().await.context("failed to apply migrations")?;
    info!("Database migrations complete");
    Ok(json!({ "migrated": true }))
}

pub async fn create_user(ctx: &AppContext, email: &str, password: &str) -> Result<Value> {
    match ctx.accounts.create_user(email, password).await {
        Ok(user) => Ok(serde_json::to_value(user)?),
        Err(UserStoreError::DuplicateEmail(email)) => {
            bail!("a user with email {email} already exists")
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn show_user(ctx: &AppContext, email: &str) -> Result<Value> {
    let user = ctx
        .accounts
        .get_user(email)
        .await?
        .ok_or_else(|| anyhow!("no user with email {email}"))?;
    Ok(serde_json::to_value(user)?)
}

pub async fn update_user(ctx: &AppContext, email: &str, patch: &UserPatch) -> Result<Value> {
    let user = ctx
        .accounts
        .update_user(email, patch)
        .await?
        .ok_or_else(|| anyhow!("no user with email {email}"))?;
    Ok(serde_json::to_value(user)?)
}

pub async fn delete_user(ctx: &AppContext, email: &str) -> Result<Value> {
    let user = ctx
        .accounts
        .delete_user(email)
        .await?
        .ok_or_else(|| anyhow!("no user with email {email}"))?;
    Ok(json!({ "deleted": user }))
}

pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<Value> {
    let pair = ctx
        .accounts
        .login(email, password)
        .await?
        .ok_or_else(|| anyhow!("invalid email or password"))?;
    Ok(serde_json::to_value(pair)?)
}

pub fn issue_token(
    tokens: &TokenService,
    claims: &Claims,
    expires_in: Option<Duration>,
) -> Result<Value> {
    let token = tokens.issue(claims, expires_in)?;
    Ok(json!({ "token": token }))
}

pub fn verify_token(tokens: &TokenService, token: &str) -> Result<Value> {
    let claims = tokens
        .verify(token)
        .map_err(|_| anyhow!("token is invalid or expired"))?;
    Ok(Value::Object(claims))
}

pub fn hash_password(password: &str) -> Result<Value> {
    let hash = CredentialHasher::new()?.hash(password)?;
    Ok(json!({ "hash": hash }))
}

pub fn verify_password(password: &str, hash: &str) -> Result<Value> {
    let matches = CredentialHasher::new()?.verify(password, hash);
    if !matches {
        bail!("password does not match");
    }
    Ok(json!({ "matches": true }))
}
