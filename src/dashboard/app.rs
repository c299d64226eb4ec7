//! Interactive terminal dashboard
//!
//! Keys:
//!   Up / Down     = choose instrument
//!   Left / Right  = choose time range
//!   Enter / r     = render the selection
//!   q / Esc       = quit

use std::io::{self, Stdout};
use std::time::Duration;

use ratatui::{
    backend::CrosstermBackend,
    crossterm::{
        event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    },
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
    Frame, Terminal,
};

use super::widgets::{draw_footer, draw_page};
use super::{render_page, MarketSource, Page, Provider};
use crate::charts::{Instrument, TimeRange};
use crate::error::{ChartsError, ChartsResult};
use crate::utils::logging;
use crate::{log_debug, log_info};

const SIDEBAR_WIDTH: u16 = 32;
const PAGE_JUMP: usize = 10;

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Render,
    Quit,
}

/// Selection and last rendered page
#[derive(Debug)]
pub struct DashboardState {
    pub provider: Provider,
    pub instruments: Vec<Instrument>,
    pub ranges: &'static [TimeRange],
    pub list_state: ListState,
    pub range_index: usize,
    pub page: Option<Page>,
    pub loading: bool,
}

impl DashboardState {
    pub fn new(provider: Provider, instruments: Vec<Instrument>, ranges: &'static [TimeRange]) -> Self {
        let mut list_state = ListState::default();
        if !instruments.is_empty() {
            list_state.select(Some(0));
        }
        Self {
            provider,
            instruments,
            ranges,
            list_state,
            range_index: 0,
            page: None,
            loading: false,
        }
    }

    pub fn selected_instrument(&self) -> Option<&Instrument> {
        self.list_state.selected().and_then(|i| self.instruments.get(i))
    }

    pub fn selected_range(&self) -> Option<TimeRange> {
        self.ranges.get(self.range_index).copied()
    }

    fn move_selection(&mut self, delta: isize) {
        if self.instruments.is_empty() {
            return;
        }
        let last = self.instruments.len() - 1;
        let current = self.list_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(last);
        self.list_state.select(Some(next));
    }

    fn move_range(&mut self, delta: isize) {
        if self.ranges.is_empty() {
            return;
        }
        let last = self.ranges.len() - 1;
        self.range_index = self.range_index.saturating_add_signed(delta).min(last);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::None;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Enter | KeyCode::Char('r') => Action::Render,
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1);
                Action::None
            }
            KeyCode::PageUp => {
                self.move_selection(-(PAGE_JUMP as isize));
                Action::None
            }
            KeyCode::PageDown => {
                self.move_selection(PAGE_JUMP as isize);
                Action::None
            }
            KeyCode::Home => {
                self.move_selection(isize::MIN);
                Action::None
            }
            KeyCode::End => {
                self.move_selection(isize::MAX);
                Action::None
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.move_range(-1);
                Action::None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.move_range(1);
                Action::None
            }
            _ => Action::None,
        }
    }

    /// Render the current selection through `source`
    pub fn render_selection<S: MarketSource + ?Sized>(&mut self, source: &S) {
        let (Some(instrument), Some(range)) = (self.selected_instrument().cloned(), self.selected_range()) else {
            return;
        };
        log_debug!("app", "Rendering selection", instrument = instrument.id, range = range.cli_name());
        self.page = Some(render_page(source, &instrument, range));
        self.loading = false;
    }
}

/// Draw the whole dashboard
pub fn draw(frame: &mut Frame, state: &mut DashboardState) {
    let [sidebar, main] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)]).areas(frame.area());

    draw_sidebar(frame, sidebar, state);

    let [title, body, help] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .areas(main);

    let heading = Paragraph::new(Line::from(state.provider.title()))
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(heading, title);

    match (&state.page, state.loading) {
        (_, true) => {
            let text = match (state.selected_instrument(), state.selected_range()) {
                (Some(i), Some(r)) => format!("Loading {} ({})...", i.name, r.display_name()),
                _ => "Loading...".to_string(),
            };
            draw_placeholder(frame, body, state.provider, &text);
        }
        (Some(page), false) => draw_page(frame, body, state.provider, page),
        (None, false) => draw_placeholder(frame, body, state.provider, "Press Enter to render the selection."),
    }

    let keys = Paragraph::new("↑/↓ instrument  ←/→ range  Enter/r render  q quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(keys, help);
}

fn draw_placeholder(frame: &mut Frame, area: Rect, provider: Provider, text: &str) {
    let [body, footer] = Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);
    let notice = Paragraph::new(text.to_string()).block(Block::default().borders(Borders::ALL));
    frame.render_widget(notice, body);
    draw_footer(frame, footer, provider);
}

fn draw_sidebar(frame: &mut Frame, area: Rect, state: &mut DashboardState) {
    let [ranges, list] = Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).areas(area);

    let titles: Vec<String> = state.ranges.iter().map(|r| r.cli_name().to_string()).collect();
    let tabs = Tabs::new(titles)
        .select(state.range_index)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(" Time Range "));
    frame.render_widget(tabs, ranges);

    let items: Vec<ListItem> = state
        .instruments
        .iter()
        .map(|i| ListItem::new(i.name.clone()))
        .collect();
    let list_widget = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Instrument "))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list_widget, list, &mut state.list_state);
}

/// Raw mode + alternate screen, undone on drop.
///
/// Built before the terminal so a failed setup step still restores the screen.
struct ScreenGuard {
    alternate: bool,
}

impl ScreenGuard {
    fn enter() -> ChartsResult<Self> {
        enable_raw_mode()?;
        let mut guard = Self { alternate: false };
        execute!(io::stdout(), EnterAlternateScreen)?;
        guard.alternate = true;
        logging::suppress_output();
        Ok(guard)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        if self.alternate {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            logging::resume_output();
        }
    }
}

/// Terminal on the alternate screen
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    _screen: ScreenGuard,
}

impl TerminalGuard {
    fn enter() -> ChartsResult<Self> {
        let screen = ScreenGuard::enter()?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        Ok(Self {
            terminal,
            _screen: screen,
        })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}

/// Run the interactive dashboard until the user quits.
///
/// The instrument list is fetched once up front; failing to fetch it, or
/// getting an empty list, ends the session with a listing error.
pub fn run<S: MarketSource + ?Sized>(source: &S) -> ChartsResult<()> {
    let instruments = source.list_instruments()?;
    if instruments.is_empty() {
        return Err(ChartsError::listing_fetch("No instruments available"));
    }
    log_info!("app", "Starting dashboard", provider = source.provider(), instruments = instruments.len());

    let mut state = DashboardState::new(source.provider(), instruments, source.supported_ranges());
    let mut guard = TerminalGuard::enter()?;

    state.loading = true;
    loop {
        guard.terminal.draw(|frame| draw(frame, &mut state))?;

        if state.loading {
            state.render_selection(source);
            continue;
        }

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            match state.handle_key(key) {
                Action::Quit => break,
                Action::Render => state.loading = true,
                Action::None => {}
            }
        }
    }

    Ok(())
}
