//! crypto-charts Core Library
//!
//! Terminal dashboards for cryptocurrency market data from two providers:
//! CoinGecko (public) and the Crypto.com Exchange (authenticated).
//!
//! # Architecture
//!
//! This crate provides:
//! - **config**: Environment and `.env` configuration
//! - **api**: Provider HTTP clients and the Crypto.com request signer
//! - **charts**: Series types, normalization, summary metrics, formatting
//! - **dashboard**: Page pipeline, terminal widgets and the interactive app
//! - **utils**: Logging, JSON and HTTP helpers
//!
//! # Security
//!
//! The Crypto.com API secret is held in a `secrecy::SecretString` and is
//! never logged. Log fields named like keys or signatures are redacted.
//!
//! # Example
//!
//! ```rust,ignore
//! use crypto_charts::charts::{normalize_pairs, ChartCalculator, OrderPolicy};
//!
//! let series = normalize_pairs(&prices, &volumes, OrderPolicy::Trust)?;
//! let summary = ChartCalculator::summarize(&series)?;
//! println!("{}", crypto_charts::charts::format_price(summary.current_price));
//! ```

pub mod api;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod utils;

// Re-export key types for convenience
pub use error::{ChartsError, ChartsResult, ErrorCode};
