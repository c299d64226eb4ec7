//! Terminal rendering of a [`Page`]

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
    Frame,
};

use super::{Page, Provider};
use crate::charts::{
    format_change, format_compact, format_price, format_volume, CandlePoint, LinePoint, NormalizedSeries,
    PriceChange, SummaryMetrics, TimeRange,
};

/// Accent used for the price line and volume bars
pub const ACCENT: Color = Color::Rgb(0x17, 0xC3, 0x7B);

const METRICS_HEIGHT: u16 = 3;

/// Rows needed to show a chart page comfortably
pub const PAGE_HEIGHT: u16 = 30;

/// Draw a page (metrics, price chart, volume chart, footer) into `area`
pub fn draw_page(frame: &mut Frame, area: Rect, provider: Provider, page: &Page) {
    let [body, footer] = Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);

    match page {
        Page::Chart {
            instrument,
            range,
            series,
            summary,
        } => {
            let [metrics, price, volume] = Layout::vertical([
                Constraint::Length(METRICS_HEIGHT),
                Constraint::Min(6),
                Constraint::Percentage(30),
            ])
            .areas(body);

            draw_metrics(frame, metrics, provider, summary);

            let title = format!(" {} Price Chart ({}) ", instrument.name, range.display_name());
            match series {
                NormalizedSeries::Line(points) => {
                    let data = line_data(points);
                    let chart = line_chart(&data, series.price_bounds(), *range, &title, &instrument.quote_currency);
                    frame.render_widget(chart, price);
                }
                NormalizedSeries::Candles(candles) => {
                    draw_candles(frame, price, candles, series.price_bounds(), &title);
                }
            }

            let volume_title = format!(" {} Volume Chart ", instrument.name);
            draw_volume(frame, volume, &series.volumes(), &volume_title);
        }
        Page::NoData { instrument, range } => {
            let text = format!(
                "No data available for {} over {}.",
                instrument.name,
                range.display_name()
            );
            let notice = Paragraph::new(text)
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL).title(" No data "));
            frame.render_widget(notice, body);
        }
        Page::Failed { message } => {
            let error = Paragraph::new(message.as_str())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title(" Error "));
            frame.render_widget(error, body);
        }
    }

    draw_footer(frame, footer, provider);
}

/// Attribution line under every page
pub fn draw_footer(frame: &mut Frame, area: Rect, provider: Provider) {
    let footer = Paragraph::new(provider.attribution())
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, area);
}

fn draw_metrics(frame: &mut Frame, area: Rect, provider: Provider, summary: &SummaryMetrics) {
    let cells = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .split(area);

    let change_style = match summary.percentage_change {
        PriceChange::Percent(p) if p > 0.0 => Style::default().fg(Color::Green),
        PriceChange::Percent(p) if p < 0.0 => Style::default().fg(Color::Red),
        _ => Style::default(),
    };

    let metrics = [
        ("Current Price", format_price(summary.current_price), Style::default()),
        ("Price Change", format_change(summary.percentage_change), change_style),
        (
            provider.volume_label(),
            format_volume(summary.volume_metric, provider.volume_is_currency()),
            Style::default(),
        ),
    ];

    for ((label, value, style), cell) in metrics.into_iter().zip(cells.iter()) {
        let widget = Paragraph::new(Line::from(Span::styled(value, style.add_modifier(Modifier::BOLD))))
            .block(Block::default().borders(Borders::ALL).title(format!(" {} ", label)));
        frame.render_widget(widget, *cell);
    }
}

fn time_format(range: TimeRange) -> &'static str {
    match range {
        TimeRange::Hours24 => "%H:%M",
        TimeRange::Days7 | TimeRange::Days30 | TimeRange::Days90 => "%m-%d",
        TimeRange::Year1 => "%Y-%m",
    }
}

fn time_labels(first: DateTime<Utc>, last: DateTime<Utc>, range: TimeRange) -> Vec<String> {
    let fmt = time_format(range);
    let middle = first + (last - first) / 2;
    vec![
        first.format(fmt).to_string(),
        middle.format(fmt).to_string(),
        last.format(fmt).to_string(),
    ]
}

fn padded_bounds(low: f64, high: f64) -> [f64; 2] {
    let span = (high - low).abs().max(high.abs() * 1e-3).max(1e-9);
    let pad = span * 0.05;
    [low - pad, high + pad]
}

/// `(epoch_ms, price)` pairs for the line chart
pub fn line_data(points: &[LinePoint]) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|p| (p.timestamp.timestamp_millis() as f64, p.price))
        .collect()
}

/// Braille line chart of price over time
pub fn line_chart<'a>(
    data: &'a [(f64, f64)],
    bounds: Option<(f64, f64)>,
    range: TimeRange,
    title: &str,
    quote: &str,
) -> Chart<'a> {
    let (x_bounds, x_labels) = match (data.first(), data.last()) {
        (Some(&(first, _)), Some(&(last, _))) => {
            let labels = match (
                DateTime::<Utc>::from_timestamp_millis(first as i64),
                DateTime::<Utc>::from_timestamp_millis(last as i64),
            ) {
                (Some(a), Some(b)) => time_labels(a, b, range),
                _ => Vec::new(),
            };
            ([first, last.max(first + 1.0)], labels)
        }
        _ => ([0.0, 1.0], Vec::new()),
    };

    let y_bounds = match bounds {
        Some((low, high)) if low.is_finite() && high.is_finite() => padded_bounds(low, high),
        _ => [0.0, 1.0],
    };

    let dataset = Dataset::default()
        .name("Price")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(ACCENT))
        .data(data);

    Chart::new(vec![dataset])
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .x_axis(
            Axis::default()
                .title("Date")
                .style(Style::default().fg(Color::Gray))
                .bounds(x_bounds)
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(format!("Price ({})", quote.to_uppercase()))
                .style(Style::default().fg(Color::Gray))
                .bounds(y_bounds)
                .labels(vec![format_compact(y_bounds[0]), format_compact(y_bounds[1])]),
        )
}

fn draw_candles(frame: &mut Frame, area: Rect, candles: &[CandlePoint], bounds: Option<(f64, f64)>, title: &str) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some((low, high)) = bounds.filter(|(l, h)| l.is_finite() && h.is_finite()) else {
        return;
    };
    let [y_min, y_max] = padded_bounds(low, high);

    let [labels, plot] = Layout::horizontal([Constraint::Length(10), Constraint::Min(1)]).areas(inner);
    let scale = Paragraph::new(vec![
        Line::from(format_compact(y_max)),
        Line::from(""),
        Line::from(format_compact(y_min)),
    ])
    .style(Style::default().fg(Color::Gray));
    frame.render_widget(scale, labels);
    frame.render_widget(CandleChart::new(candles, y_min, y_max), plot);
}

fn draw_volume(frame: &mut Frame, area: Rect, volumes: &[f64], title: &str) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let max_bars = block.inner(area).width.max(1) as usize;
    let buckets = bucket_volumes(volumes, max_bars);

    let bars: Vec<Bar> = buckets
        .iter()
        .map(|v| {
            Bar::default()
                .value(v.max(0.0).round() as u64)
                .text_value(String::new())
                .style(Style::default().fg(ACCENT))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

/// Average consecutive volumes so at most `max_bars` bars remain
pub fn bucket_volumes(volumes: &[f64], max_bars: usize) -> Vec<f64> {
    if volumes.is_empty() || max_bars == 0 {
        return Vec::new();
    }
    let size = volumes.len().div_ceil(max_bars);
    volumes
        .chunks(size)
        .map(|chunk| chunk.iter().sum::<f64>() / chunk.len() as f64)
        .collect()
}

/// Merge consecutive candles so at most `max_candles` remain.
///
/// Each merged candle keeps the first open, the last close, the extreme
/// high and low, and the summed volume, so the whole window stays visible.
pub fn bucket_candles(candles: &[CandlePoint], max_candles: usize) -> Vec<CandlePoint> {
    if candles.is_empty() || max_candles == 0 {
        return Vec::new();
    }
    let size = candles.len().div_ceil(max_candles);
    candles
        .chunks(size)
        .filter_map(|chunk| {
            let (first, last) = (chunk.first()?, chunk.last()?);
            Some(CandlePoint {
                timestamp: first.timestamp,
                open: first.open,
                high: chunk.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max),
                low: chunk.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
                close: last.close,
                volume: chunk.iter().map(|c| c.volume).sum(),
            })
        })
        .collect()
}

/// Candlesticks drawn one terminal column each, oldest on the left.
/// Windows wider than the area are merged with [`bucket_candles`].
pub struct CandleChart<'a> {
    candles: &'a [CandlePoint],
    y_min: f64,
    y_max: f64,
}

impl<'a> CandleChart<'a> {
    pub fn new(candles: &'a [CandlePoint], y_min: f64, y_max: f64) -> Self {
        Self { candles, y_min, y_max }
    }
}

impl Widget for CandleChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.candles.is_empty() || area.width == 0 || area.height == 0 {
            return;
        }

        let height = area.height as i32;
        let width = area.width as usize;
        let shown = bucket_candles(self.candles, width);
        let span = (self.y_max - self.y_min).max(1e-9);

        let row_of = |price: f64| -> i32 {
            let ratio = ((price - self.y_min) / span).clamp(0.0, 1.0);
            let rel = (ratio * (height as f64 - 1.0)).round() as i32;
            area.y as i32 + (height - 1) - rel
        };
        let row_min = area.y as i32;
        let row_max = area.y as i32 + height - 1;

        for (i, candle) in shown.iter().enumerate() {
            let x = area.x + i as u16;
            let color = if candle.is_bullish() { Color::Green } else { Color::Red };

            let wick_top = row_of(candle.high).max(row_min);
            let wick_bottom = row_of(candle.low).min(row_max);
            for y in wick_top..=wick_bottom {
                if let Some(cell) = buf.cell_mut((x, y as u16)) {
                    cell.set_symbol("│").set_fg(color);
                }
            }

            let body_top = row_of(candle.body_high()).max(row_min);
            let body_bottom = row_of(candle.body_low()).min(row_max);
            for y in body_top..=body_bottom {
                if let Some(cell) = buf.cell_mut((x, y as u16)) {
                    cell.set_symbol("█").set_fg(color);
                }
            }
        }
    }
}

/// Plain-text rendering of a page, for non-terminal output
pub fn page_lines(provider: Provider, page: &Page) -> Vec<String> {
    let mut lines = Vec::new();
    match page {
        Page::Chart {
            instrument,
            range,
            series,
            summary,
        } => {
            lines.push(format!("{} ({}, {} points)", instrument.name, range.display_name(), series.len()));
            lines.push(format!("Current Price: {}", format_price(summary.current_price)));
            lines.push(format!("Price Change: {}", format_change(summary.percentage_change)));
            lines.push(format!(
                "{}: {}",
                provider.volume_label(),
                format_volume(summary.volume_metric, provider.volume_is_currency())
            ));
        }
        Page::NoData { instrument, range } => {
            lines.push(format!(
                "No data available for {} over {}.",
                instrument.name,
                range.display_name()
            ));
        }
        Page::Failed { message } => lines.push(message.clone()),
    }
    lines.push(provider.attribution().to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::super::testing::{candle_series, line_series};
    use super::*;
    use crate::charts::{ChartCalculator, Instrument};
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    fn chart_page(series: NormalizedSeries, instrument: Instrument, range: TimeRange) -> Page {
        let summary = ChartCalculator::summarize(&series).unwrap();
        Page::Chart {
            instrument,
            range,
            series,
            summary,
        }
    }

    fn render(provider: Provider, page: &Page) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, PAGE_HEIGHT)).unwrap();
        terminal
            .draw(|frame| draw_page(frame, frame.area(), provider, page))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_line_page_metrics() {
        let page = chart_page(line_series(), Instrument::new("bitcoin", "Bitcoin", "usd"), TimeRange::Days7);
        let text = render(Provider::CoinGecko, &page);

        assert!(text.contains("Current Price"));
        assert!(text.contains("$110.00"));
        assert!(text.contains("10.00%"));
        assert!(text.contains("24h Volume"));
        assert!(text.contains("$1,200"));
        assert!(text.contains("Bitcoin Price Chart"));
        assert!(text.contains("Data provided by CoinGecko API"));
    }

    #[test]
    fn test_candle_page_draws_candles() {
        let page = chart_page(
            candle_series(),
            Instrument::new("BTC_USDT", "BTC_USDT", "USDT"),
            TimeRange::Hours24,
        );
        let text = render(Provider::CryptoCom, &page);

        assert!(text.contains("Total Volume"));
        assert!(text.contains("800"));
        assert!(text.contains("█"));
        assert!(text.contains("Data provided by Crypto.com Exchange API"));
    }

    #[test]
    fn test_failed_and_empty_pages() {
        let failed = render(
            Provider::CoinGecko,
            &Page::Failed {
                message: "Error fetching data: boom".into(),
            },
        );
        assert!(failed.contains("Error fetching data: boom"));

        let empty = render(
            Provider::CoinGecko,
            &Page::NoData {
                instrument: Instrument::new("bitcoin", "Bitcoin", "usd"),
                range: TimeRange::Hours24,
            },
        );
        assert!(empty.contains("No data available for Bitcoin over 24 Hours."));
    }

    #[test]
    fn test_candle_widget_colors() {
        let candles = match candle_series() {
            NormalizedSeries::Candles(c) => c,
            NormalizedSeries::Line(_) => unreachable!(),
        };
        let area = Rect::new(0, 0, 2, 10);
        let mut buf = Buffer::empty(area);
        CandleChart::new(&candles, 95.0, 105.0).render(area, &mut buf);

        let first_column: Vec<Color> = (0..10)
            .filter_map(|y| buf.cell((0, y)))
            .filter(|c| c.symbol() != " ")
            .map(|c| c.fg)
            .collect();
        assert!(!first_column.is_empty());
        assert!(first_column.iter().all(|c| *c == Color::Green));

        let second_column_has_red = (0..10)
            .filter_map(|y| buf.cell((1, y)))
            .any(|c| c.fg == Color::Red);
        assert!(second_column_has_red);
    }

    #[test]
    fn test_bucket_candles_merges_ohlc() {
        let candles = match candle_series() {
            NormalizedSeries::Candles(c) => c,
            NormalizedSeries::Line(_) => unreachable!(),
        };
        let merged = bucket_candles(&candles, 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].timestamp, candles[0].timestamp);
        assert_eq!(merged[0].open, candles[0].open);
        assert_eq!(merged[0].close, candles[candles.len() - 1].close);
        assert_eq!(merged[0].high, candles.iter().map(|c| c.high).fold(f64::MIN, f64::max));
        assert_eq!(merged[0].low, candles.iter().map(|c| c.low).fold(f64::MAX, f64::min));
        assert_eq!(merged[0].volume, candles.iter().map(|c| c.volume).sum::<f64>());

        assert_eq!(bucket_candles(&candles, 10), candles);
        assert!(bucket_candles(&[], 10).is_empty());
    }

    #[test]
    fn test_candle_widget_keeps_oldest_candles() {
        // 90 daily candles into 56 columns; only the oldest one reaches 200
        let candles: Vec<CandlePoint> = (0..90)
            .map(|i| CandlePoint {
                timestamp: DateTime::<Utc>::from_timestamp_millis(i * 86_400_000).unwrap(),
                open: 100.0,
                high: if i == 0 { 200.0 } else { 101.0 },
                low: 99.0,
                close: 100.5,
                volume: 1.0,
            })
            .collect();
        let area = Rect::new(0, 0, 56, 20);
        let mut buf = Buffer::empty(area);
        CandleChart::new(&candles, 99.0, 200.0).render(area, &mut buf);

        let drawn_columns = (0..56)
            .filter(|&x| (0..20).any(|y| buf.cell((x, y)).is_some_and(|c| c.symbol() != " ")))
            .count();
        assert_eq!(drawn_columns, bucket_candles(&candles, 56).len());
        assert!(drawn_columns < 56);

        // the spike of the first candle reaches the top row
        assert_eq!(buf.cell((0, 0)).map(|c| c.symbol()), Some("│"));
    }

    #[test]
    fn test_bucket_volumes() {
        assert_eq!(bucket_volumes(&[1.0, 3.0, 5.0, 7.0], 2), vec![2.0, 6.0]);
        assert_eq!(bucket_volumes(&[1.0, 2.0], 10), vec![1.0, 2.0]);
        assert!(bucket_volumes(&[], 10).is_empty());
    }

    #[test]
    fn test_page_lines() {
        let page = chart_page(candle_series(), Instrument::new("BTC_USDT", "BTC_USDT", "USDT"), TimeRange::Days7);
        let lines = page_lines(Provider::CryptoCom, &page);
        assert_eq!(lines[1], "Current Price: $98.00");
        assert_eq!(lines[2], "Price Change: -2.00%");
        assert_eq!(lines[3], "Total Volume: 800");
        assert_eq!(lines.last().map(String::as_str), Some("Data provided by Crypto.com Exchange API"));
    }
}
