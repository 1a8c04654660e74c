//! Library half of the `order-recon` CLI: configuration and logging.

pub mod config;
pub mod logging;
