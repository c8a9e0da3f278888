pub mod config;
pub mod db;
pub mod startup;
pub mod telemetry;
