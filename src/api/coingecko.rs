//! CoinGecko API client for price data
//!
//! API Endpoints used:
//! - /coins/markets - Top coins by market cap
//! - /coins/{id}/market_chart - Historical price/volume

use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use crate::charts::{Instrument, TimeRange};
use crate::config::CoinGeckoConfig;
use crate::error::{ChartsError, ChartsResult};
use crate::utils::{build_client, parse_json, read_success_body};
use crate::{log_debug, log_info};

/// Quote currency used by the dashboard
pub const DEFAULT_VS_CURRENCY: &str = "usd";
/// Number of coins listed for selection
pub const DEFAULT_PER_PAGE: u32 = 100;

/// `/coins/{id}/market_chart` payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketChart {
    /// `[timestamp_ms, price]`
    #[serde(default)]
    pub prices: Vec<(f64, f64)>,
    /// `[timestamp_ms, volume]`
    #[serde(default)]
    pub total_volumes: Vec<(f64, f64)>,
}

#[derive(Debug, Deserialize)]
struct CoinMarket {
    id: String,
    name: String,
}

/// CoinGecko API client
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: Client,
    base_url: Url,
}

impl CoinGeckoClient {
    pub fn new(config: &CoinGeckoConfig) -> ChartsResult<Self> {
        Ok(Self {
            http: build_client(config.http.timeout)?,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> ChartsResult<Url> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| ChartsError::configuration(format!("Base URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build coin listing URL
    /// GET /coins/markets?vs_currency={currency}&order=market_cap_desc&per_page={n}&page=1&sparkline=false
    pub fn coins_markets_url(&self, vs_currency: &str, per_page: u32) -> ChartsResult<Url> {
        let mut url = self.endpoint(&["coins", "markets"])?;
        url.query_pairs_mut()
            .append_pair("vs_currency", vs_currency)
            .append_pair("order", "market_cap_desc")
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", "1")
            .append_pair("sparkline", "false");
        Ok(url)
    }

    /// Build market chart URL for historical data
    /// GET /coins/{id}/market_chart?vs_currency={currency}&days={days}
    pub fn market_chart_url(&self, coin_id: &str, vs_currency: &str, range: TimeRange) -> ChartsResult<Url> {
        let mut url = self.endpoint(&["coins", coin_id, "market_chart"])?;
        url.query_pairs_mut()
            .append_pair("vs_currency", vs_currency)
            .append_pair("days", &range.days().to_string());
        Ok(url)
    }

    fn fetch(&self, url: Url) -> ChartsResult<String> {
        log_debug!("coingecko", "GET", url = url);
        let response = self.http.get(url).send()?;
        read_success_body(response)
    }

    /// Top coins by market cap, in ranking order
    pub fn list_coins(&self, vs_currency: &str, per_page: u32) -> ChartsResult<Vec<Instrument>> {
        let body = self.fetch(self.coins_markets_url(vs_currency, per_page)?)?;
        let coins = parse_coins_markets(&body, vs_currency)?;
        log_info!("coingecko", "Fetched coin list", count = coins.len());
        Ok(coins)
    }

    /// Price and volume history for one coin
    pub fn market_chart(&self, coin_id: &str, vs_currency: &str, range: TimeRange) -> ChartsResult<MarketChart> {
        if coin_id.trim().is_empty() {
            return Err(ChartsError::invalid_input("Coin id is empty"));
        }
        let body = self.fetch(self.market_chart_url(coin_id, vs_currency, range)?)?;
        let chart = parse_market_chart(&body)?;
        log_debug!(
            "coingecko",
            "Fetched market chart",
            coin = coin_id,
            prices = chart.prices.len(),
            volumes = chart.total_volumes.len(),
        );
        Ok(chart)
    }
}

/// Parse `/coins/markets` into instruments quoted in `vs_currency`
pub fn parse_coins_markets(json: &str, vs_currency: &str) -> ChartsResult<Vec<Instrument>> {
    let coins: Vec<CoinMarket> = parse_json(json)?;
    Ok(coins
        .into_iter()
        .map(|coin| Instrument::new(coin.id, coin.name, vs_currency))
        .collect())
}

/// Parse `/coins/{id}/market_chart`
pub fn parse_market_chart(json: &str) -> ChartsResult<MarketChart> {
    parse_json(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpSettings;

    fn client(base: &str) -> CoinGeckoClient {
        CoinGeckoClient::new(&CoinGeckoConfig {
            base_url: Url::parse(base).unwrap(),
            http: HttpSettings::default(),
        })
        .unwrap()
    }

    #[test]
    fn test_market_chart_url() {
        let c = client("https://api.coingecko.com/api/v3");
        let url = c.market_chart_url("bitcoin", "usd", TimeRange::Days7).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.coingecko.com/api/v3/coins/bitcoin/market_chart?vs_currency=usd&days=7"
        );

        let year = c.market_chart_url("ethereum", "usd", TimeRange::Year1).unwrap();
        assert!(year.as_str().ends_with("days=365"));
    }

    #[test]
    fn test_coins_markets_url() {
        let c = client("https://api.coingecko.com/api/v3/");
        let url = c.coins_markets_url(DEFAULT_VS_CURRENCY, DEFAULT_PER_PAGE).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=100&page=1&sparkline=false"
        );
    }

    #[test]
    fn test_coin_id_is_path_encoded() {
        let c = client("https://api.coingecko.com/api/v3");
        let url = c.market_chart_url("a/b", "usd", TimeRange::Hours24).unwrap();
        assert!(url.path().contains("a%2Fb"));
    }

    #[test]
    fn test_parse_market_chart() {
        let json = r#"{
            "prices": [[1704067200000, 42000.5], [1704153600000, 43500.75]],
            "total_volumes": [[1704067200000, 25000000000], [1704153600000, 28000000000]],
            "market_caps": [[1704067200000, 820000000000], [1704153600000, 850000000000]]
        }"#;

        let chart = parse_market_chart(json).unwrap();
        assert_eq!(chart.prices.len(), 2);
        assert_eq!(chart.prices[0], (1704067200000.0, 42000.5));
        assert_eq!(chart.total_volumes[1].1, 28000000000.0);

        let empty = parse_market_chart("{}").unwrap();
        assert!(empty.prices.is_empty());

        assert!(parse_market_chart(r#"{"prices": "nope"}"#).is_err());
    }

    #[test]
    fn test_parse_coins_markets() {
        let json = r#"[
            {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "current_price": 42000},
            {"id": "ethereum", "symbol": "eth", "name": "Ethereum", "current_price": 2300}
        ]"#;
        let coins = parse_coins_markets(json, "usd").unwrap();
        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0], Instrument::new("bitcoin", "Bitcoin", "usd"));
        assert_eq!(coins[1].name, "Ethereum");
    }
}
