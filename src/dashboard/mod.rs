//! Dashboard pipeline
//!
//! A [`MarketSource`] lists instruments and fetches one normalized series.
//! [`render_page`] runs fetch, normalize and summarize for one selection
//! and folds every outcome into a [`Page`] so a failed render never takes
//! the dashboard down.

pub mod app;
pub mod widgets;

use chrono::Utc;
use std::fmt;

use crate::api::coingecko::{DEFAULT_PER_PAGE, DEFAULT_VS_CURRENCY};
use crate::api::{CoinGeckoClient, CryptoComClient};
use crate::charts::{
    normalize_candles, normalize_pairs, CandleLayout, ChartCalculator, Instrument, NormalizedSeries,
    OrderPolicy, SummaryMetrics, TimeRange,
};
use crate::error::{ChartsError, ChartsResult};
use crate::{log_error, log_info};

/// Market data provider behind a dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    #[value(name = "coingecko")]
    CoinGecko,
    #[value(name = "cryptocom")]
    CryptoCom,
}

impl Provider {
    pub fn title(&self) -> &'static str {
        match self {
            Provider::CoinGecko => "Cryptocurrency Charts",
            Provider::CryptoCom => "Crypto.com Charts",
        }
    }

    pub fn attribution(&self) -> &'static str {
        match self {
            Provider::CoinGecko => "Data provided by CoinGecko API",
            Provider::CryptoCom => "Data provided by Crypto.com Exchange API",
        }
    }

    /// Label of the third metric
    pub fn volume_label(&self) -> &'static str {
        match self {
            Provider::CoinGecko => "24h Volume",
            Provider::CryptoCom => "Total Volume",
        }
    }

    /// Whether the volume metric is a dollar amount
    pub fn volume_is_currency(&self) -> bool {
        matches!(self, Provider::CoinGecko)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::CoinGecko => write!(f, "CoinGecko"),
            Provider::CryptoCom => write!(f, "Crypto.com"),
        }
    }
}

/// A provider the dashboard can chart
pub trait MarketSource {
    fn provider(&self) -> Provider;

    /// Instruments offered for selection. Failures are listing errors.
    fn list_instruments(&self) -> ChartsResult<Vec<Instrument>>;

    /// Time ranges this provider can serve
    fn supported_ranges(&self) -> &'static [TimeRange];

    /// Fetch and normalize the series for one selection
    fn fetch_series(&self, instrument: &Instrument, range: TimeRange) -> ChartsResult<NormalizedSeries>;
}

/// Public CoinGecko market charts
#[derive(Debug)]
pub struct CoinGeckoSource {
    client: CoinGeckoClient,
    vs_currency: String,
    per_page: u32,
    order: OrderPolicy,
}

impl CoinGeckoSource {
    pub fn new(client: CoinGeckoClient, order: OrderPolicy) -> Self {
        Self {
            client,
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
            per_page: DEFAULT_PER_PAGE,
            order,
        }
    }
}

impl MarketSource for CoinGeckoSource {
    fn provider(&self) -> Provider {
        Provider::CoinGecko
    }

    fn list_instruments(&self) -> ChartsResult<Vec<Instrument>> {
        self.client
            .list_coins(&self.vs_currency, self.per_page)
            .map_err(ChartsError::into_listing_error)
    }

    fn supported_ranges(&self) -> &'static [TimeRange] {
        &TimeRange::ALL
    }

    fn fetch_series(&self, instrument: &Instrument, range: TimeRange) -> ChartsResult<NormalizedSeries> {
        let chart = self.client.market_chart(&instrument.id, &self.vs_currency, range)?;
        normalize_pairs(&chart.prices, &chart.total_volumes, self.order)
    }
}

/// Authenticated Crypto.com candlesticks
#[derive(Debug)]
pub struct CryptoComSource {
    client: CryptoComClient,
    layout: CandleLayout,
    order: OrderPolicy,
}

impl CryptoComSource {
    pub fn new(client: CryptoComClient, order: OrderPolicy) -> Self {
        Self {
            client,
            layout: CandleLayout::EXCHANGE,
            order,
        }
    }
}

impl MarketSource for CryptoComSource {
    fn provider(&self) -> Provider {
        Provider::CryptoCom
    }

    fn list_instruments(&self) -> ChartsResult<Vec<Instrument>> {
        self.client
            .list_instruments()
            .map_err(ChartsError::into_listing_error)
    }

    fn supported_ranges(&self) -> &'static [TimeRange] {
        &TimeRange::CANDLE
    }

    fn fetch_series(&self, instrument: &Instrument, range: TimeRange) -> ChartsResult<NormalizedSeries> {
        let rows = self.client.get_candlestick(&instrument.id, range, Utc::now())?;
        normalize_candles(&rows, &self.layout, self.order)
    }
}

/// Outcome of one render
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Chart {
        instrument: Instrument,
        range: TimeRange,
        series: NormalizedSeries,
        summary: SummaryMetrics,
    },
    /// The provider returned an empty series
    NoData { instrument: Instrument, range: TimeRange },
    /// Fetching or normalizing failed; the message is shown in place of the chart
    Failed { message: String },
}

impl Page {
    pub fn is_chart(&self) -> bool {
        matches!(self, Page::Chart { .. })
    }
}

/// Fetch, normalize and summarize one selection.
pub fn render_page<S: MarketSource + ?Sized>(source: &S, instrument: &Instrument, range: TimeRange) -> Page {
    if !source.supported_ranges().contains(&range) {
        return Page::Failed {
            message: format!(
                "{} does not offer the {} range",
                source.provider(),
                range.display_name()
            ),
        };
    }

    let series = match source.fetch_series(instrument, range) {
        Ok(series) => series,
        Err(e) => {
            log_error!("dashboard", "Render failed", instrument = instrument.id, error = e);
            return Page::Failed {
                message: format!("Error fetching data: {}", e),
            };
        }
    };

    if series.is_empty() {
        log_info!("dashboard", "No data for selection", instrument = instrument.id, range = range.cli_name());
        return Page::NoData {
            instrument: instrument.clone(),
            range,
        };
    }

    match ChartCalculator::summarize(&series) {
        Ok(summary) => Page::Chart {
            instrument: instrument.clone(),
            range,
            series,
            summary,
        },
        Err(e) => Page::Failed {
            message: format!("Error summarizing data: {}", e),
        },
    }
}

/// Look up an instrument by id (exact) or display name (case-insensitive)
pub fn find_instrument<'a>(instruments: &'a [Instrument], query: &str) -> Option<&'a Instrument> {
    instruments
        .iter()
        .find(|i| i.id == query)
        .or_else(|| instruments.iter().find(|i| i.name.eq_ignore_ascii_case(query)))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::charts::{CandlePoint, LinePoint};
    use chrono::DateTime;
    use std::cell::Cell;

    /// In-memory source with a canned series or error
    pub struct StaticSource {
        pub provider: Provider,
        pub instruments: ChartsResult<Vec<Instrument>>,
        pub series: ChartsResult<NormalizedSeries>,
        pub fetches: Cell<usize>,
    }

    impl StaticSource {
        pub fn new(provider: Provider, series: ChartsResult<NormalizedSeries>) -> Self {
            Self {
                provider,
                instruments: Ok(vec![
                    Instrument::new("bitcoin", "Bitcoin", "usd"),
                    Instrument::new("ethereum", "Ethereum", "usd"),
                ]),
                series,
                fetches: Cell::new(0),
            }
        }
    }

    impl MarketSource for StaticSource {
        fn provider(&self) -> Provider {
            self.provider
        }

        fn list_instruments(&self) -> ChartsResult<Vec<Instrument>> {
            self.instruments.clone()
        }

        fn supported_ranges(&self) -> &'static [TimeRange] {
            match self.provider {
                Provider::CoinGecko => &TimeRange::ALL,
                Provider::CryptoCom => &TimeRange::CANDLE,
            }
        }

        fn fetch_series(&self, _instrument: &Instrument, _range: TimeRange) -> ChartsResult<NormalizedSeries> {
            self.fetches.set(self.fetches.get() + 1);
            self.series.clone()
        }
    }

    pub fn ts(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(ms).unwrap()
    }

    pub fn line_series() -> NormalizedSeries {
        NormalizedSeries::Line(vec![
            LinePoint { timestamp: ts(0), price: 100.0, volume: 1000.0 },
            LinePoint { timestamp: ts(86_400_000), price: 110.0, volume: 1200.0 },
        ])
    }

    pub fn candle_series() -> NormalizedSeries {
        NormalizedSeries::Candles(vec![
            CandlePoint { timestamp: ts(0), open: 100.0, high: 105.0, low: 95.0, close: 102.0, volume: 500.0 },
            CandlePoint { timestamp: ts(3_600_000), open: 102.0, high: 104.0, low: 97.0, close: 98.0, volume: 300.0 },
        ])
    }
}
