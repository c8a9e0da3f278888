#[cfg(feature = "database")]
pub mod postgres;
