//! Operator tooling for Warden: configuration, startup wiring and the
//! command handlers behind the `warden` binary.

pub mod commands;
pub mod infra;
