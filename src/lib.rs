pub mod config;
pub mod ingest;
pub mod pki;
pub mod schedule;
pub mod server;
pub mod setup;
pub mod store;
pub mod telemetry;
pub mod verification;

#[cfg(test)]
mod test_support;
