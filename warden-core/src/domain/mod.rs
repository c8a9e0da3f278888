//! Domain layer: account records, credentials and tokens.

pub mod users;
