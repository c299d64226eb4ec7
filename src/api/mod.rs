//! API Module
//!
//! HTTP clients for the two market data providers.

pub mod coingecko;
pub mod cryptocom;
pub mod signer;

pub use coingecko::{CoinGeckoClient, MarketChart};
pub use cryptocom::CryptoComClient;
pub use signer::{build_param_string, RequestParams, RequestSigner, SignedRequest, SignerError};
