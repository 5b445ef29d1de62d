//! nessie-wallet: account data aggregation over the Nessie banking API,
//! with a mock data source for offline use.

pub mod cli;
pub mod config;
pub mod services;
pub mod types;
