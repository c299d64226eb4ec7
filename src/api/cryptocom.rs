//! Crypto.com Exchange client
//!
//! Every request goes through [`CryptoComClient::get`], which signs it,
//! attaches the `api-key`, `api-timestamp` and `api-signature` headers and
//! unwraps the `{code, method, result}` envelope.
//!
//! API Endpoints used:
//! - /public/get-instruments - Tradable instruments
//! - /public/get-candlestick - OHLCV candles for one instrument

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use url::Url;

use super::signer::{RequestParams, RequestSigner};
use crate::charts::{Instrument, TimeRange};
use crate::config::CryptoComConfig;
use crate::error::{ChartsError, ChartsResult};
use crate::utils::{api_error, build_client, extract_domain, parse_json};
use crate::{log_debug, log_info};

pub const INSTRUMENTS_ENDPOINT: &str = "public/get-instruments";
pub const CANDLESTICK_ENDPOINT: &str = "public/get-candlestick";

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    method: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InstrumentsResult {
    instruments: Vec<InstrumentRecord>,
}

#[derive(Debug, Deserialize)]
struct InstrumentRecord {
    instrument_name: String,
    #[serde(default)]
    quote_currency: String,
}

#[derive(Debug, Deserialize)]
struct CandlestickResult {
    #[serde(default)]
    data: Vec<Value>,
}

/// Authenticated Crypto.com API client
pub struct CryptoComClient {
    http: Client,
    base_url: Url,
    api_key: String,
    signer: RequestSigner,
}

impl CryptoComClient {
    /// Build a client from configuration. Fails before any request when the
    /// secret cannot key the signer.
    pub fn new(config: &CryptoComConfig) -> ChartsResult<Self> {
        let signer = RequestSigner::new(&config.credentials.api_secret)?;
        Ok(Self {
            http: build_client(config.http.timeout)?,
            base_url: config.base_url.clone(),
            api_key: config.credentials.api_key.clone(),
            signer,
        })
    }

    /// Path that is signed and requested: base URL path + `/` + endpoint
    pub fn request_path(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.path().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Full request URL with the parameters as a sorted query string
    pub fn request_url(&self, endpoint: &str, params: &RequestParams) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&self.request_path(endpoint));
        url.set_query(None);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        url
    }

    /// Signed GET returning the envelope's `result` payload.
    ///
    /// Any status other than 200 is an API error carrying the raw body.
    pub fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &RequestParams) -> ChartsResult<T> {
        let path = self.request_path(endpoint);
        let url = self.request_url(endpoint, params);
        let signed = self.signer.sign(&path, params);

        log_debug!(
            "cryptocom",
            "Sending signed request",
            host = extract_domain(url.as_str()),
            path = path,
            api_key = self.api_key,
            api_timestamp = signed.timestamp,
            api_signature = signed.signature,
        );

        let response = self
            .http
            .get(url)
            .header("api-key", &self.api_key)
            .header("api-timestamp", &signed.timestamp)
            .header("api-signature", &signed.signature)
            .send()?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(api_error(response));
        }

        let body = response.text()?;
        let envelope: Envelope<T> = parse_json(&body)?;
        log_debug!(
            "cryptocom",
            "Received response",
            method = envelope.method.as_deref().unwrap_or("-"),
            code = envelope.code.unwrap_or_default(),
        );

        envelope.result.ok_or_else(|| {
            ChartsError::parse_error(format!("Response from {} has no result", endpoint))
                .with_details(body)
        })
    }

    /// Tradable instruments, in the order the exchange lists them
    pub fn list_instruments(&self) -> ChartsResult<Vec<Instrument>> {
        let result: InstrumentsResult = self.get(INSTRUMENTS_ENDPOINT, &RequestParams::new())?;
        let instruments: Vec<Instrument> = result
            .instruments
            .into_iter()
            .map(|record| {
                Instrument::new(
                    record.instrument_name.clone(),
                    record.instrument_name,
                    record.quote_currency,
                )
            })
            .collect();
        log_info!("cryptocom", "Fetched instruments", count = instruments.len());
        Ok(instruments)
    }

    /// Raw candle rows for `instrument` covering `range` up to `now`
    pub fn get_candlestick(
        &self,
        instrument: &str,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> ChartsResult<Vec<Value>> {
        let params = candlestick_params(instrument, range, now)?;
        let result: CandlestickResult = self.get(CANDLESTICK_ENDPOINT, &params)?;
        log_debug!(
            "cryptocom",
            "Fetched candles",
            instrument = instrument,
            range = range.cli_name(),
            rows = result.data.len(),
        );
        Ok(result.data)
    }
}

impl fmt::Debug for CryptoComClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoComClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Query parameters for a candlestick request
pub fn candlestick_params(instrument: &str, range: TimeRange, now: DateTime<Utc>) -> ChartsResult<RequestParams> {
    let timeframe = range.candle_interval().ok_or_else(|| {
        ChartsError::invalid_input(format!(
            "Time range '{}' is not available for candlestick data",
            range.cli_name()
        ))
    })?;
    if instrument.trim().is_empty() {
        return Err(ChartsError::invalid_input("Instrument name is empty"));
    }

    let end_ts = now.timestamp_millis();
    let start_ts = end_ts - range.lookback_ms();

    let mut params = RequestParams::new();
    params.insert("instrument_name".into(), instrument.to_string());
    params.insert("timeframe".into(), timeframe.to_string());
    params.insert("start_ts".into(), start_ts.to_string());
    params.insert("end_ts".into(), end_ts.to_string());
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, HttpSettings};
    use crate::error::ErrorCode;
    use secrecy::SecretString;

    fn client(base: &str) -> CryptoComClient {
        let config = CryptoComConfig {
            base_url: Url::parse(base).unwrap(),
            credentials: Credentials::new("key-123", SecretString::from("s3cr3t".to_string())).unwrap(),
            http: HttpSettings::default(),
        };
        CryptoComClient::new(&config).unwrap()
    }

    #[test]
    fn test_request_path() {
        let c = client("https://api.crypto.com/v2");
        assert_eq!(c.request_path(CANDLESTICK_ENDPOINT), "/v2/public/get-candlestick");

        let trailing = client("https://api.crypto.com/v2/");
        assert_eq!(trailing.request_path(INSTRUMENTS_ENDPOINT), "/v2/public/get-instruments");
    }

    #[test]
    fn test_request_url_sorted_query() {
        let c = client("https://api.crypto.com/v2");
        let mut params = RequestParams::new();
        params.insert("timeframe".into(), "1D".into());
        params.insert("instrument_name".into(), "BTC_USDT".into());

        let url = c.request_url(CANDLESTICK_ENDPOINT, &params);
        assert_eq!(
            url.as_str(),
            "https://api.crypto.com/v2/public/get-candlestick?instrument_name=BTC_USDT&timeframe=1D"
        );

        let bare = c.request_url(INSTRUMENTS_ENDPOINT, &RequestParams::new());
        assert_eq!(bare.as_str(), "https://api.crypto.com/v2/public/get-instruments");
    }

    #[test]
    fn test_candlestick_params() {
        let now = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        let params = candlestick_params("BTC_USDT", TimeRange::Days7, now).unwrap();

        assert_eq!(params["timeframe"], "4h");
        assert_eq!(params["end_ts"], "1700000000000");
        assert_eq!(params["start_ts"], (1_700_000_000_000_i64 - 7 * 86_400_000).to_string());
        assert_eq!(params["instrument_name"], "BTC_USDT");
    }

    #[test]
    fn test_candlestick_rejects_unsupported_range() {
        let now = Utc::now();
        let err = candlestick_params("BTC_USDT", TimeRange::Year1, now).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(candlestick_params(" ", TimeRange::Days7, now).is_err());
    }

    #[test]
    fn test_envelope_without_result() {
        let envelope: Envelope<Value> = parse_json(r#"{"code": 0, "method": "public/get-instruments"}"#).unwrap();
        assert!(envelope.result.is_none());
        assert_eq!(envelope.method.as_deref(), Some("public/get-instruments"));
    }
}
