//! Series normalization
//!
//! Turns the two provider payload shapes into a [`NormalizedSeries`]:
//!
//! - pair lists: separate `[timestamp, value]` sequences for price and
//!   volume, zipped by position;
//! - candle rows: one row per interval carrying timestamp, OHLC and volume,
//!   read through a [`CandleLayout`].
//!
//! Order is never changed. With [`OrderPolicy::Verify`] a series whose
//! timestamps go backwards is rejected instead of being passed through.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::types::{CandlePoint, LinePoint, NormalizedSeries};
use crate::error::{ChartsError, ChartsResult};
use crate::utils::{as_json_f64, as_json_i64};

/// What to do about timestamp order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPolicy {
    /// Keep provider order without checking it
    #[default]
    Trust,
    /// Reject series whose timestamps decrease
    Verify,
}

/// Column positions inside a candle row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandleLayout {
    pub timestamp: usize,
    pub open: usize,
    pub high: usize,
    pub low: usize,
    pub close: usize,
    pub volume: usize,
}

impl CandleLayout {
    /// `[ts, open, high, low, close, volume, quote_volume]`
    pub const EXCHANGE: CandleLayout = CandleLayout {
        timestamp: 0,
        open: 1,
        high: 2,
        low: 3,
        close: 4,
        volume: 5,
    };

    /// Shortest row this layout can read
    pub fn min_width(&self) -> usize {
        [self.timestamp, self.open, self.high, self.low, self.close, self.volume]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Field names used when the exchange sends candles as objects
const OBJECT_KEYS: CandleKeys = CandleKeys {
    timestamp: "t",
    open: "o",
    high: "h",
    low: "l",
    close: "c",
    volume: "v",
};

struct CandleKeys {
    timestamp: &'static str,
    open: &'static str,
    high: &'static str,
    low: &'static str,
    close: &'static str,
    volume: &'static str,
}

/// Convert epoch milliseconds to a UTC instant
pub fn to_datetime(ms: i64) -> ChartsResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| ChartsError::parse_error(format!("Timestamp out of range: {}", ms)))
}

fn pair_millis(raw: f64) -> ChartsResult<i64> {
    if !raw.is_finite() || raw.abs() >= i64::MAX as f64 {
        return Err(ChartsError::parse_error(format!("Invalid timestamp: {}", raw)));
    }
    Ok(raw.trunc() as i64)
}

/// Zip price and volume pair lists into a line series.
///
/// Both lists must have the same length and agree on every timestamp.
pub fn normalize_pairs(
    prices: &[(f64, f64)],
    volumes: &[(f64, f64)],
    policy: OrderPolicy,
) -> ChartsResult<NormalizedSeries> {
    if prices.len() != volumes.len() {
        return Err(ChartsError::series_mismatch(format!(
            "{} price points but {} volume points",
            prices.len(),
            volumes.len()
        )));
    }

    let mut points = Vec::with_capacity(prices.len());
    for (index, (&(price_ts, price), &(volume_ts, volume))) in prices.iter().zip(volumes).enumerate() {
        let price_ms = pair_millis(price_ts)?;
        let volume_ms = pair_millis(volume_ts)?;
        if price_ms != volume_ms {
            return Err(ChartsError::series_mismatch(format!(
                "Timestamps differ at index {}",
                index
            ))
            .with_details(format!("price={} volume={}", price_ms, volume_ms)));
        }
        points.push(LinePoint {
            timestamp: to_datetime(price_ms)?,
            price,
            volume,
        });
    }

    if policy == OrderPolicy::Verify {
        check_order(points.iter().map(|p| p.timestamp))?;
    }

    Ok(NormalizedSeries::Line(points))
}

/// Read candle rows into a candle series.
///
/// Rows may be positional arrays (read through `layout`) or objects keyed
/// `t/o/h/l/c/v`. Cells may be numbers or numeric strings.
pub fn normalize_candles(
    rows: &[Value],
    layout: &CandleLayout,
    policy: OrderPolicy,
) -> ChartsResult<NormalizedSeries> {
    let candles = rows
        .iter()
        .enumerate()
        .map(|(index, row)| read_candle(index, row, layout))
        .collect::<ChartsResult<Vec<_>>>()?;

    if policy == OrderPolicy::Verify {
        check_order(candles.iter().map(|c| c.timestamp))?;
    }

    Ok(NormalizedSeries::Candles(candles))
}

fn read_candle(index: usize, row: &Value, layout: &CandleLayout) -> ChartsResult<CandlePoint> {
    match row {
        Value::Array(cells) => {
            if cells.len() < layout.min_width() {
                return Err(ChartsError::parse_error(format!(
                    "Candle row {} has {} columns, expected at least {}",
                    index,
                    cells.len(),
                    layout.min_width()
                )));
            }
            build_candle(index, |field| {
                let column = match field {
                    Field::Timestamp => layout.timestamp,
                    Field::Open => layout.open,
                    Field::High => layout.high,
                    Field::Low => layout.low,
                    Field::Close => layout.close,
                    Field::Volume => layout.volume,
                };
                cells.get(column)
            })
        }
        Value::Object(map) => build_candle(index, |field| {
            let key = match field {
                Field::Timestamp => OBJECT_KEYS.timestamp,
                Field::Open => OBJECT_KEYS.open,
                Field::High => OBJECT_KEYS.high,
                Field::Low => OBJECT_KEYS.low,
                Field::Close => OBJECT_KEYS.close,
                Field::Volume => OBJECT_KEYS.volume,
            };
            map.get(key)
        }),
        other => Err(ChartsError::parse_error(format!(
            "Candle row {} is not an array or object",
            index
        ))
        .with_details(other.to_string())),
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Timestamp,
    Open,
    High,
    Low,
    Close,
    Volume,
}

fn build_candle<'a, F>(index: usize, cell: F) -> ChartsResult<CandlePoint>
where
    F: Fn(Field) -> Option<&'a Value>,
{
    let number = |field: Field| -> ChartsResult<f64> {
        cell(field).and_then(as_json_f64).ok_or_else(|| {
            ChartsError::parse_error(format!("Candle row {} has a non-numeric {:?}", index, field))
        })
    };

    let ms = cell(Field::Timestamp).and_then(as_json_i64).ok_or_else(|| {
        ChartsError::parse_error(format!("Candle row {} has an invalid timestamp", index))
    })?;

    Ok(CandlePoint {
        timestamp: to_datetime(ms)?,
        open: number(Field::Open)?,
        high: number(Field::High)?,
        low: number(Field::Low)?,
        close: number(Field::Close)?,
        volume: number(Field::Volume)?,
    })
}

fn check_order<I>(timestamps: I) -> ChartsResult<()>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut previous: Option<DateTime<Utc>> = None;
    for (index, ts) in timestamps.into_iter().enumerate() {
        if let Some(prev) = previous {
            if ts < prev {
                return Err(ChartsError::unordered_series(format!(
                    "Timestamp at index {} is earlier than the one before it",
                    index
                ))
                .with_details(format!("{} < {}", ts.to_rfc3339(), prev.to_rfc3339())));
            }
        }
        previous = Some(ts);
    }
    Ok(())
}
