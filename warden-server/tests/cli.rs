use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;

const SECRET: &str = "cli-test-secret";

fn warden() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("warden");
    cmd.env_remove("DATABASE_URL")
        .env_remove("WARDEN_PASSWORD")
        .env("JWT_SECRET_KEY", SECRET)
        .env("HASH_ALGORITHM", "HS256")
        .env("RUST_LOG", "warn");
    cmd
}

fn stdout_json(cmd: &mut assert_cmd::Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("command prints JSON")
}

#[test]
fn help_lists_subcommands() {
    warden()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("user"))
        .stdout(predicate::str::contains("token"));
}

#[test]
fn token_issue_then_verify() {
    let issued = stdout_json(warden().args([
        "token", "issue", "--claim", "sub=a@x.com", "--claim", "level=2",
    ]));
    let token = issued["token"].as_str().expect("token string").to_string();

    let claims = stdout_json(warden().args(["token", "verify", &token]));
    assert_eq!(claims["sub"], "a@x.com");
    assert_eq!(claims["level"], 2);
    assert!(claims["exp"].is_i64());
}

#[test]
fn token_from_another_secret_is_rejected() {
    let issued = stdout_json(warden().args(["token", "issue", "--claim", "sub=a@x.com"]));
    let token = issued["token"].as_str().expect("token string").to_string();

    warden()
        .env("JWT_SECRET_KEY", "some-other-secret")
        .args(["token", "verify", &token])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid or expired"));
}

#[test]
fn missing_secret_is_fatal() {
    warden()
        .env("JWT_SECRET_KEY", "")
        .args(["token", "issue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("token configuration"));
}

#[test]
fn unsupported_algorithm_is_fatal() {
    warden()
        .env("HASH_ALGORITHM", "none")
        .args(["token", "issue"])
        .assert()
        .failure();
}

#[test]
fn hash_then_verify_password() {
    let hashed = stdout_json(warden().args(["hash-password", "--password", "pw"]));
    let hash = hashed["hash"].as_str().expect("hash string").to_string();
    assert!(hash.starts_with("$argon2id$"));

    warden()
        .args(["verify-password", &hash, "--password", "pw"])
        .assert()
        .success();
    warden()
        .args(["verify-password", &hash, "--password", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not match"));
}

#[test]
fn user_commands_need_a_database_url() {
    warden()
        .args(["user", "show", "a@x.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL"));
}

#[test]
fn password_commands_ignore_bad_pool_settings() {
    let hashed = stdout_json(
        warden()
            .env("DB_POOL_SIZE", "many")
            .args(["hash-password", "--password", "pw"]),
    );
    let hash = hashed["hash"].as_str().expect("hash string").to_string();

    warden()
        .env("DB_POOL_SIZE", "many")
        .args(["verify-password", &hash, "--password", "pw"])
        .assert()
        .success();

    warden()
        .env("DB_POOL_SIZE", "many")
        .args(["token", "issue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DB_POOL_SIZE"));
}

#[test]
fn oversized_expiry_fails_cleanly() {
    warden()
        .args(["token", "issue", "--expires-in", "300000years"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"))
        .stderr(predicate::str::contains("panicked").not());
}
