use std::io::{self, IsTerminal};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ratatui::{
    backend::CrosstermBackend,
    crossterm::terminal::{disable_raw_mode, enable_raw_mode},
    Terminal, TerminalOptions, Viewport,
};

use crypto_charts::api::{CoinGeckoClient, CryptoComClient};
use crypto_charts::charts::{OrderPolicy, TimeRange};
use crypto_charts::config::{self, CoinGeckoConfig, CryptoComConfig};
use crypto_charts::dashboard::widgets::{draw_page, page_lines, PAGE_HEIGHT};
use crypto_charts::dashboard::{
    app, find_instrument, render_page, CoinGeckoSource, CryptoComSource, MarketSource, Page, Provider,
};
use crypto_charts::utils::logging;

#[derive(Debug, Parser)]
#[command(
    name = "crypto-charts",
    version,
    about = "Cryptocurrency price and volume charts from CoinGecko or Crypto.com"
)]
struct Cli {
    /// Print debug logs to stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Reject series whose timestamps go backwards
    #[arg(long, global = true)]
    strict_order: bool,

    /// Market data provider
    #[arg(value_enum)]
    provider: Provider,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive dashboard (default)
    Dashboard,
    /// Print the instruments offered for selection
    Instruments,
    /// Render one chart inline
    Chart {
        /// Instrument id or display name (`bitcoin`, `BTC_USDT`)
        #[arg(long, short)]
        instrument: String,

        /// Lookback window
        #[arg(long, short, value_enum, default_value = "24h")]
        range: TimeRange,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.debug {
        logging::enable_debug();
    }
    config::load_dotenv();

    let order = if cli.strict_order {
        OrderPolicy::Verify
    } else {
        OrderPolicy::Trust
    };
    let source = build_source(cli.provider, order)?;

    match cli.command.unwrap_or(Command::Dashboard) {
        Command::Dashboard => app::run(source.as_ref())?,
        Command::Instruments => {
            for instrument in source.list_instruments()? {
                println!("{}\t{}\t{}", instrument.id, instrument.name, instrument.quote_currency);
            }
        }
        Command::Chart { instrument, range } => chart(source.as_ref(), &instrument, range)?,
    }

    Ok(())
}

fn build_source(provider: Provider, order: OrderPolicy) -> Result<Box<dyn MarketSource>> {
    let source: Box<dyn MarketSource> = match provider {
        Provider::CoinGecko => {
            let config = CoinGeckoConfig::from_env().context("Invalid CoinGecko configuration")?;
            Box::new(CoinGeckoSource::new(CoinGeckoClient::new(&config)?, order))
        }
        Provider::CryptoCom => {
            let config = CryptoComConfig::from_env().context("Missing or invalid Crypto.com configuration")?;
            Box::new(CryptoComSource::new(CryptoComClient::new(&config)?, order))
        }
    };
    Ok(source)
}

fn chart(source: &dyn MarketSource, query: &str, range: TimeRange) -> Result<()> {
    let provider = source.provider();
    if !source.supported_ranges().contains(&range) {
        bail!("{} does not offer the {} range", provider, range.cli_name());
    }

    let instruments = source.list_instruments()?;
    let Some(instrument) = find_instrument(&instruments, query) else {
        bail!("Unknown instrument '{}' for {}", query, provider);
    };

    let page = render_page(source, instrument, range);

    if io::stdout().is_terminal() {
        draw_inline(provider, &page)?;
    } else {
        for line in page_lines(provider, &page) {
            println!("{}", line);
        }
    }

    if let Page::Failed { message } = page {
        bail!(message);
    }
    Ok(())
}

fn draw_inline(provider: Provider, page: &Page) -> Result<()> {
    enable_raw_mode()?;
    let drawn = (|| -> io::Result<()> {
        let mut terminal = Terminal::with_options(
            CrosstermBackend::new(io::stdout()),
            TerminalOptions {
                viewport: Viewport::Inline(PAGE_HEIGHT),
            },
        )?;
        terminal.draw(|frame| draw_page(frame, frame.area(), provider, page))?;
        Ok(())
    })();
    disable_raw_mode()?;
    drawn?;
    println!();
    Ok(())
}
