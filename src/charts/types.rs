//! Price chart types and data structures

use chrono::{DateTime, Utc};
use std::fmt;

/// Milliseconds in one day
pub const MS_PER_DAY: i64 = 86_400_000;

/// Lookback window offered by the dashboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum TimeRange {
    #[value(name = "24h")]
    Hours24,
    #[value(name = "7d")]
    Days7,
    #[value(name = "30d")]
    Days30,
    #[value(name = "90d")]
    Days90,
    #[value(name = "1y")]
    Year1,
}

impl TimeRange {
    /// Every range, in menu order
    pub const ALL: [TimeRange; 5] = [
        TimeRange::Hours24,
        TimeRange::Days7,
        TimeRange::Days30,
        TimeRange::Days90,
        TimeRange::Year1,
    ];

    /// Ranges that have a candlestick sampling interval
    pub const CANDLE: [TimeRange; 4] = [
        TimeRange::Hours24,
        TimeRange::Days7,
        TimeRange::Days30,
        TimeRange::Days90,
    ];

    /// Lookback in days
    pub fn days(&self) -> u32 {
        match self {
            TimeRange::Hours24 => 1,
            TimeRange::Days7 => 7,
            TimeRange::Days30 => 30,
            TimeRange::Days90 => 90,
            TimeRange::Year1 => 365,
        }
    }

    /// Lookback in milliseconds (`days * 86_400_000`)
    pub fn lookback_ms(&self) -> i64 {
        i64::from(self.days()) * MS_PER_DAY
    }

    /// Candle timeframe requested from the exchange, if this range has one
    pub fn candle_interval(&self) -> Option<&'static str> {
        match self {
            TimeRange::Hours24 => Some("1h"),
            TimeRange::Days7 => Some("4h"),
            TimeRange::Days30 => Some("1D"),
            TimeRange::Days90 => Some("1D"),
            TimeRange::Year1 => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TimeRange::Hours24 => "24 Hours",
            TimeRange::Days7 => "7 Days",
            TimeRange::Days30 => "30 Days",
            TimeRange::Days90 => "90 Days",
            TimeRange::Year1 => "1 Year",
        }
    }

    /// Name accepted on the command line
    pub fn cli_name(&self) -> &'static str {
        match self {
            TimeRange::Hours24 => "24h",
            TimeRange::Days7 => "7d",
            TimeRange::Days30 => "30d",
            TimeRange::Days90 => "90d",
            TimeRange::Year1 => "1y",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A tradable coin or pair as listed by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    /// Provider identifier (`bitcoin`, `BTC_USDT`)
    pub id: String,
    /// Display name
    pub name: String,
    /// Quote currency (`usd`, `USDT`)
    pub quote_currency: String,
}

impl Instrument {
    pub fn new(id: impl Into<String>, name: impl Into<String>, quote_currency: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quote_currency: quote_currency.into(),
        }
    }
}

/// Price sample with the volume recorded at the same instant
#[derive(Debug, Clone, PartialEq)]
pub struct LinePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
}

/// OHLC candlestick with traded volume
#[derive(Debug, Clone, PartialEq)]
pub struct CandlePoint {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl CandlePoint {
    /// Check if bullish (close >= open)
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// Top of the candle body
    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }

    /// Bottom of the candle body
    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }
}

/// Uniform time series consumed by the summary calculator and the charts.
///
/// Points keep the order the provider delivered them in.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedSeries {
    Line(Vec<LinePoint>),
    Candles(Vec<CandlePoint>),
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        match self {
            NormalizedSeries::Line(points) => points.len(),
            NormalizedSeries::Candles(candles) => candles.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        match self {
            NormalizedSeries::Line(points) => points.iter().map(|p| p.timestamp).collect(),
            NormalizedSeries::Candles(candles) => candles.iter().map(|c| c.timestamp).collect(),
        }
    }

    pub fn volumes(&self) -> Vec<f64> {
        match self {
            NormalizedSeries::Line(points) => points.iter().map(|p| p.volume).collect(),
            NormalizedSeries::Candles(candles) => candles.iter().map(|c| c.volume).collect(),
        }
    }

    /// Lowest and highest price touched by the series
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        let (lows, highs): (Vec<f64>, Vec<f64>) = match self {
            NormalizedSeries::Line(points) => points.iter().map(|p| (p.price, p.price)).unzip(),
            NormalizedSeries::Candles(candles) => candles.iter().map(|c| (c.low, c.high)).unzip(),
        };
        let low = lows.into_iter().reduce(f64::min)?;
        let high = highs.into_iter().reduce(f64::max)?;
        Some((low, high))
    }
}

/// Percentage change between the first and last price
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceChange {
    Percent(f64),
    /// Starting price was zero or the result was not finite
    Undefined,
}

/// How the volume metric was derived from the series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeAggregation {
    /// Volume of the last point
    Latest,
    /// Sum over every point
    Sum,
}

/// Headline numbers shown above a chart
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMetrics {
    pub current_price: f64,
    pub percentage_change: PriceChange,
    pub volume_metric: f64,
    pub aggregation: VolumeAggregation,
}
