//! Summary metrics for a normalized series

use super::types::*;
use crate::error::{ChartsError, ChartsResult};

/// Headline-metric calculator
pub struct ChartCalculator;

impl ChartCalculator {
    /// Current price, percentage change and volume metric of a series.
    ///
    /// Line series report the last point's volume; candle series report the
    /// total volume over every candle.
    pub fn summarize(series: &NormalizedSeries) -> ChartsResult<SummaryMetrics> {
        match series {
            NormalizedSeries::Line(points) => {
                let (first, last) = match (points.first(), points.last()) {
                    (Some(first), Some(last)) => (first, last),
                    _ => return Err(empty_series()),
                };
                Ok(SummaryMetrics {
                    current_price: last.price,
                    percentage_change: Self::percentage_change(first.price, last.price),
                    volume_metric: last.volume,
                    aggregation: VolumeAggregation::Latest,
                })
            }
            NormalizedSeries::Candles(candles) => {
                let (first, last) = match (candles.first(), candles.last()) {
                    (Some(first), Some(last)) => (first, last),
                    _ => return Err(empty_series()),
                };
                Ok(SummaryMetrics {
                    current_price: last.close,
                    percentage_change: Self::percentage_change(first.open, last.close),
                    volume_metric: candles.iter().map(|c| c.volume).sum(),
                    aggregation: VolumeAggregation::Sum,
                })
            }
        }
    }

    /// `(new - old) / old * 100`, undefined for a zero base
    pub fn percentage_change(old: f64, new: f64) -> PriceChange {
        if old == 0.0 {
            return PriceChange::Undefined;
        }
        let change = ((new - old) / old) * 100.0;
        if change.is_finite() {
            PriceChange::Percent(change)
        } else {
            PriceChange::Undefined
        }
    }
}

fn empty_series() -> ChartsError {
    ChartsError::invalid_input("Cannot summarize an empty series")
}
