// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use irea_app::{
    BackendStatus, Coordinate, Effect, FormField, Outcome, PageCommand, PageState, Region,
    StreetView, format_rate, format_residual_pct, format_usd, format_usd_thousands,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::Date;
use tracing::{debug, warn};

pub const MAP_ROWS: usize = 15;
pub const MAP_COLS: usize = 31;
const MODEL_LABEL_FALLBACK: &str = "Baseline+Residual";
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

const CELL_INSIDE: char = '·';
const CELL_SELECTED: char = '●';
const CELL_CURSOR: char = '+';
const CELL_CURSOR_ON_SELECTED: char = '◉';

/// What the page needs from its host: a clock and somewhere to run outbound
/// requests. Hosts that can thread should override `spawn_effect`.
pub trait AppRuntime {
    fn today(&mut self) -> Date;
    fn execute(&mut self, effect: Effect) -> Outcome;
    fn spawn_effect(&mut self, effect: Effect, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = self.execute(effect);
        tx.send(InternalEvent::Outcome(outcome))
            .map_err(|_| anyhow!("page event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Outcome(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Map,
    Search,
    Form,
}

impl Focus {
    const ALL: [Self; 3] = [Self::Map, Self::Search, Self::Form];

    const fn label(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Search => "search",
            Self::Form => "form",
        }
    }

    fn rotate(self, delta: isize) -> Self {
        let current = Self::ALL
            .iter()
            .position(|focus| *focus == self)
            .unwrap_or(0) as isize;
        let len = Self::ALL.len() as isize;
        Self::ALL[(current + delta).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapCell {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    focus: Focus,
    cursor: MapCell,
    followed: Option<Coordinate>,
    search_input: String,
    form_index: usize,
    help_visible: bool,
    status_line: Option<String>,
    status_token: u64,
}

impl Default for MapCell {
    fn default() -> Self {
        Self {
            row: MAP_ROWS / 2,
            col: MAP_COLS / 2,
        }
    }
}

/// The grid spans exactly the region, so the cursor can never leave it.
fn map_viewport(region: &Region) -> (f64, f64, f64, f64) {
    (region.lat_min, region.lat_max, region.lng_min, region.lng_max)
}

/// Center of a grid cell. Row 0 is the northern edge.
pub fn cell_coordinate(region: &Region, cell: MapCell) -> Coordinate {
    let (lat_lo, lat_hi, lng_lo, lng_hi) = map_viewport(region);
    let lat_step = (lat_hi - lat_lo) / MAP_ROWS as f64;
    let lng_step = (lng_hi - lng_lo) / MAP_COLS as f64;
    Coordinate::new(
        lat_hi - (cell.row as f64 + 0.5) * lat_step,
        lng_lo + (cell.col as f64 + 0.5) * lng_step,
    )
}

pub fn cell_for(region: &Region, coordinate: Coordinate) -> Option<MapCell> {
    let (lat_lo, lat_hi, lng_lo, lng_hi) = map_viewport(region);
    if !coordinate.is_finite()
        || coordinate.latitude < lat_lo
        || coordinate.latitude > lat_hi
        || coordinate.longitude < lng_lo
        || coordinate.longitude > lng_hi
    {
        return None;
    }
    let row = ((lat_hi - coordinate.latitude) / (lat_hi - lat_lo) * MAP_ROWS as f64) as usize;
    let col = ((coordinate.longitude - lng_lo) / (lng_hi - lng_lo) * MAP_COLS as f64) as usize;
    Some(MapCell {
        row: row.min(MAP_ROWS - 1),
        col: col.min(MAP_COLS - 1),
    })
}

pub fn run_app<R: AppRuntime>(state: &mut PageState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    follow_coordinate(state, &mut view_data);
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut PageState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status_line = None;
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Outcome(outcome) => {
                let health = matches!(outcome, Outcome::HealthChecked { .. });
                let today = runtime.today();
                let follow_up = state.apply(outcome, today);
                follow_coordinate(state, view_data);
                spawn_effects(runtime, view_data, tx, follow_up);
                if health {
                    report_backend(state, view_data, tx);
                }
            }
        }
    }
}

fn report_backend(state: &PageState, view_data: &mut ViewData, tx: &Sender<InternalEvent>) {
    let message = match &state.backend {
        BackendStatus::Healthy => "backend ok".to_owned(),
        BackendStatus::Unavailable(reason) => format!("backend unavailable: {reason}"),
        BackendStatus::Checking | BackendStatus::Unknown => return,
    };
    emit_status(view_data, tx, message);
}

fn dispatch_page<R: AppRuntime>(
    state: &mut PageState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: PageCommand,
) {
    let today = runtime.today();
    let effects = state.dispatch(command, today);
    follow_coordinate(state, view_data);
    spawn_effects(runtime, view_data, tx, effects);
}

fn spawn_effects<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    effects: Vec<Effect>,
) {
    for effect in effects {
        let kind = effect.kind();
        debug!(kind, "spawning effect");
        if let Err(error) = runtime.spawn_effect(effect, tx.clone()) {
            warn!(kind, %error, "effect did not start");
            emit_status(view_data, tx, format!("{kind} request did not start: {error}"));
        }
    }
}

/// Keeps the map cursor on the accepted coordinate whenever it moves.
fn follow_coordinate(state: &PageState, view_data: &mut ViewData) {
    if view_data.followed == Some(state.coordinate) {
        return;
    }
    view_data.followed = Some(state.coordinate);
    if let Some(cell) = cell_for(&state.region, state.coordinate) {
        view_data.cursor = cell;
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status_line = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut PageState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => return true,
            KeyCode::Char('s') => {
                dispatch_page(state, runtime, view_data, internal_tx, PageCommand::SubmitForm);
            }
            KeyCode::Char('r') => {
                dispatch_page(state, runtime, view_data, internal_tx, PageCommand::ResetForm);
                emit_status(view_data, internal_tx, "form reset");
            }
            KeyCode::Char('p') => {
                emit_status(view_data, internal_tx, "checking backend…");
                dispatch_page(state, runtime, view_data, internal_tx, PageCommand::CheckBackend);
            }
            KeyCode::Char('u') if view_data.focus == Focus::Search => {
                view_data.search_input.clear();
            }
            _ => {}
        }
        return false;
    }

    if view_data.help_visible {
        view_data.help_visible = false;
        return false;
    }

    match key.code {
        KeyCode::Tab => {
            view_data.focus = view_data.focus.rotate(1);
            return false;
        }
        KeyCode::BackTab => {
            view_data.focus = view_data.focus.rotate(-1);
            return false;
        }
        KeyCode::Esc => {
            if state.error.is_some() {
                dispatch_page(state, runtime, view_data, internal_tx, PageCommand::ClearError);
            } else {
                view_data.focus = Focus::Map;
            }
            return false;
        }
        _ => {}
    }

    match view_data.focus {
        Focus::Map => handle_map_key(state, runtime, view_data, internal_tx, key),
        Focus::Search => {
            handle_search_key(state, runtime, view_data, internal_tx, key);
            false
        }
        Focus::Form => {
            handle_form_key(state, runtime, view_data, internal_tx, key);
            false
        }
    }
}

fn handle_map_key<R: AppRuntime>(
    state: &mut PageState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let MapCell { row, col } = view_data.cursor;
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Up | KeyCode::Char('k') => view_data.cursor.row = row.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => view_data.cursor.row = (row + 1).min(MAP_ROWS - 1),
        KeyCode::Left | KeyCode::Char('h') => view_data.cursor.col = col.saturating_sub(1),
        KeyCode::Right | KeyCode::Char('l') => view_data.cursor.col = (col + 1).min(MAP_COLS - 1),
        KeyCode::Char('c') => {
            if let Some(cell) = cell_for(&state.region, state.coordinate) {
                view_data.cursor = cell;
            }
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            let coordinate = cell_coordinate(&state.region, view_data.cursor);
            dispatch_page(
                state,
                runtime,
                view_data,
                internal_tx,
                PageCommand::MapClick {
                    coordinate,
                    label: None,
                },
            );
        }
        KeyCode::Char('v') => {
            let message = match &state.street_view {
                StreetView::Available(url) => format!("street view: {url}"),
                StreetView::Checking => "street view: checking".to_owned(),
                StreetView::Missing => "street view: no panorama here".to_owned(),
                StreetView::Unknown => "street view: pick a spot on the map first".to_owned(),
            };
            emit_status(view_data, internal_tx, message);
        }
        KeyCode::Char('?') => view_data.help_visible = true,
        _ => {}
    }
    false
}

fn handle_search_key<R: AppRuntime>(
    state: &mut PageState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Enter => {
            let query = view_data.search_input.clone();
            dispatch_page(
                state,
                runtime,
                view_data,
                internal_tx,
                PageCommand::SearchAddress(query),
            );
        }
        KeyCode::Backspace => {
            view_data.search_input.pop();
        }
        KeyCode::Char(ch) => view_data.search_input.push(ch),
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut PageState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let fields = FormField::ALL;
    let index = view_data.form_index.min(fields.len() - 1);
    let field = fields[index];
    match key.code {
        KeyCode::Up => view_data.form_index = (index + fields.len() - 1) % fields.len(),
        KeyCode::Down => view_data.form_index = (index + 1) % fields.len(),
        KeyCode::Enter => {
            dispatch_page(state, runtime, view_data, internal_tx, PageCommand::SubmitForm);
        }
        KeyCode::Char(' ') if field.is_toggle() => state.form.renovated = !state.form.renovated,
        KeyCode::Char('y') if field.is_toggle() => state.form.renovated = true,
        KeyCode::Char('n') if field.is_toggle() => state.form.renovated = false,
        KeyCode::Char(ch) if is_numeric_input(ch) => {
            if let Some(text) = state.form.text_mut(field) {
                text.push(ch);
            }
        }
        KeyCode::Backspace => {
            if let Some(text) = state.form.text_mut(field) {
                text.pop();
            }
        }
        _ => {}
    }
}

fn is_numeric_input(ch: char) -> bool {
    ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E')
}

fn render(frame: &mut ratatui::Frame<'_>, state: &PageState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state))
        .block(Block::default().title("irea").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(MAP_COLS as u16 + 2),
            Constraint::Length(36),
            Constraint::Min(30),
        ])
        .split(layout[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(MAP_ROWS as u16 + 2), Constraint::Length(3)])
        .split(columns[0]);

    let map = Paragraph::new(map_text(state, view_data))
        .block(panel(format!("{} map", state.region.name), view_data.focus == Focus::Map));
    frame.render_widget(map, left[0]);

    let search_title = if state.searching { "search (searching…)" } else { "search" };
    let search = Paragraph::new(view_data.search_input.as_str())
        .block(panel(search_title.to_owned(), view_data.focus == Focus::Search));
    frame.render_widget(search, left[1]);

    let form_title = if state.submitting { "house (estimating…)" } else { "house" };
    let form = Paragraph::new(form_text(state, view_data))
        .block(panel(form_title.to_owned(), view_data.focus == Focus::Form));
    frame.render_widget(form, columns[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(6)])
        .split(columns[2]);

    let results = Paragraph::new(results_text(state))
        .wrap(Wrap { trim: false })
        .block(Block::default().title("results").borders(Borders::ALL));
    frame.render_widget(results, right[0]);
    render_trend_chart(frame, right[1], state);

    let (status, style) = match state.error_message() {
        Some(error) => (error, Style::default().fg(Color::Red)),
        None => (status_text(view_data), Style::default().fg(Color::Yellow)),
    };
    let status_widget = Paragraph::new(status)
        .style(style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn panel(title: String, focused: bool) -> Block<'static> {
    let block = Block::default().title(title).borders(Borders::ALL);
    if focused {
        block.border_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        block
    }
}

fn render_trend_chart(frame: &mut ratatui::Frame<'_>, area: Rect, state: &PageState) {
    let block = Block::default().title("value trend").borders(Borders::ALL);
    let (Some((low, high)), Some(first), Some(last)) = (
        state.chart_bounds(),
        state.trend.first(),
        state.trend.last(),
    ) else {
        frame.render_widget(Paragraph::new("no trend yet").block(block), area);
        return;
    };

    let points = state
        .trend
        .iter()
        .map(|point| (f64::from(point.year), point.value))
        .collect::<Vec<_>>();
    let dataset = Dataset::default()
        .name("value")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);

    let x_labels = state
        .trend
        .iter()
        .map(|point| point.label())
        .collect::<Vec<_>>();
    let y_labels = vec![
        format_usd_thousands(low),
        format_usd_thousands((low + high) / 2.0),
        format_usd_thousands(high),
    ];
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([f64::from(first.year), f64::from(last.year)])
                .labels(x_labels),
        )
        .y_axis(Axis::default().bounds([low, high]).labels(y_labels));
    frame.render_widget(chart, area);
}

fn header_text(state: &PageState) -> String {
    let mut parts = vec![state.location_label()];
    if state.address_label.is_some() {
        parts.push(state.coordinate.label());
    }
    if state.searching {
        parts.push("searching…".to_owned());
    }
    if state.submitting {
        parts.push("estimating…".to_owned());
    }
    if state.backend == BackendStatus::Checking {
        parts.push("checking backend…".to_owned());
    }
    parts.join(" | ")
}

fn map_text(state: &PageState, view_data: &ViewData) -> String {
    let selected = cell_for(&state.region, state.coordinate);
    let mut lines = Vec::with_capacity(MAP_ROWS);
    for row in 0..MAP_ROWS {
        let line = (0..MAP_COLS)
            .map(|col| {
                let cell = MapCell { row, col };
                let is_cursor = cell == view_data.cursor;
                let is_selected = selected == Some(cell);
                match (is_cursor, is_selected) {
                    (true, true) => CELL_CURSOR_ON_SELECTED,
                    (true, false) => CELL_CURSOR,
                    (false, true) => CELL_SELECTED,
                    (false, false) => CELL_INSIDE,
                }
            })
            .collect::<String>();
        lines.push(line);
    }
    lines.join("\n")
}

fn form_text(state: &PageState, view_data: &ViewData) -> String {
    FormField::ALL
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let marker = if view_data.focus == Focus::Form && index == view_data.form_index {
                ">"
            } else {
                " "
            };
            let value = state.form.display_value(*field);
            let value = if value.trim().is_empty() && field.is_optional() {
                "(optional)".to_owned()
            } else {
                value
            };
            format!("{marker} {:<15} {value}", field.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn results_text(state: &PageState) -> String {
    let Some(result) = &state.result else {
        return if state.submitting {
            "estimating…".to_owned()
        } else {
            "submit the form to estimate a price".to_owned()
        };
    };
    let model = if result.model_version.trim().is_empty() {
        MODEL_LABEL_FALLBACK
    } else {
        result.model_version.as_str()
    };
    let street_view = match &state.street_view {
        StreetView::Available(_) => "available (v on map shows URL)",
        StreetView::Checking => "checking…",
        StreetView::Missing => "none nearby",
        StreetView::Unknown => "—",
    };
    [
        format!("Final price:    {}", format_usd(Some(result.final_price))),
        format!("Assessment:     {}", format_usd(result.assess_price)),
        format!("Residual adj.:  {}", format_residual_pct(result.residual)),
        format!("Model:          {model}"),
        format!("Trend r:        {}", format_rate(result.growth_rate())),
        format!("Street view:    {street_view}"),
    ]
    .join("\n")
}

fn status_text(view_data: &ViewData) -> String {
    let hints = match view_data.focus {
        Focus::Map => "arrows/hjkl move | enter pick | c recenter | v street view | ? help | q quit",
        Focus::Search => "type address | enter search | ctrl+u clear",
        Focus::Form => "up/down field | type value | space toggle | enter submit | ctrl+r reset",
    };
    let focus = view_data.focus.label().to_uppercase();
    match &view_data.status_line {
        Some(status) => format!("{focus} | {status} | tab focus | {hints}"),
        None => format!("{focus} | tab focus | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: tab/shift+tab focus | ctrl+s submit | ctrl+r reset form | ctrl+p ping backend | esc clear error | ctrl+c quit\n\
map: arrows or h/j/k/l move | enter or space pick location | c recenter | v street view | q quit\n\
search: type address | enter search | backspace delete | ctrl+u clear\n\
form: up/down field | type digits | space/y/n renovated | enter submit\n\
any key closes this help"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, Focus, InternalEvent, MAP_COLS, MAP_ROWS, MapCell, ViewData, cell_coordinate,
        cell_for, follow_coordinate, form_text, handle_key_event, header_text, map_text,
        process_internal_events, render, results_text, status_text,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use irea_app::{
        AppError, BackendStatus, Coordinate, Effect, Outcome, PageCommand, PageState,
        PredictionResult, Region, StreetView, TrendMeta,
    };
    use irea_testkit::{FakeGeocoder, FakePredictor, GeoCall, fixture_date};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;
    use time::Date;

    const HULL_ST: Coordinate = Coordinate::new(42.3663, -71.0547);

    struct TestRuntime {
        geocoder: FakeGeocoder,
        predictor: FakePredictor,
        executed: Vec<&'static str>,
    }

    impl Default for TestRuntime {
        fn default() -> Self {
            Self {
                geocoder: FakeGeocoder::default(),
                predictor: FakePredictor::new(),
                executed: Vec::new(),
            }
        }
    }

    impl AppRuntime for TestRuntime {
        fn today(&mut self) -> Date {
            fixture_date()
        }

        fn execute(&mut self, effect: Effect) -> Outcome {
            self.executed.push(effect.kind());
            effect.execute(&self.geocoder, &self.predictor)
        }
    }

    /// Holds effects back so a test can observe the page while they are in
    /// flight.
    #[derive(Default)]
    struct DeferredRuntime {
        inner: TestRuntime,
        pending: Vec<Effect>,
    }

    impl AppRuntime for DeferredRuntime {
        fn today(&mut self) -> Date {
            fixture_date()
        }

        fn execute(&mut self, effect: Effect) -> Outcome {
            self.inner.execute(effect)
        }

        fn spawn_effect(
            &mut self,
            effect: Effect,
            _tx: mpsc::Sender<InternalEvent>,
        ) -> anyhow::Result<()> {
            self.pending.push(effect);
            Ok(())
        }
    }

    struct Page {
        state: PageState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: mpsc::Sender<InternalEvent>,
        rx: mpsc::Receiver<InternalEvent>,
    }

    impl Page {
        fn new(runtime: TestRuntime) -> Self {
            let state = PageState::default();
            let mut view_data = ViewData::default();
            follow_coordinate(&state, &mut view_data);
            let (tx, rx) = mpsc::channel();
            Self {
                state,
                runtime,
                view_data,
                tx,
                rx,
            }
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            let quit = handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, modifiers),
            );
            process_internal_events(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                &self.rx,
            );
            quit
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn screen(&self) -> String {
            let mut terminal =
                Terminal::new(TestBackend::new(140, 30)).expect("test terminal builds");
            terminal
                .draw(|frame| render(frame, &self.state, &self.view_data))
                .expect("frame draws");
            terminal
                .backend()
                .buffer()
                .content()
                .iter()
                .map(|cell| cell.symbol())
                .collect()
        }
    }

    fn scenario_result() -> PredictionResult {
        let mut result = PredictionResult::with_price(750_000.0);
        result.residual = Some(0.05);
        result.trend = Some(TrendMeta {
            long_term_log_trend: Some(0.04),
            ..TrendMeta::default()
        });
        result
    }

    #[test]
    fn every_grid_cell_lies_inside_the_region() {
        let region = Region::boston();
        for row in 0..MAP_ROWS {
            for col in 0..MAP_COLS {
                let coordinate = cell_coordinate(&region, MapCell { row, col });
                assert!(region.contains_coordinate(coordinate), "{row},{col}");
            }
        }
        let north_west = cell_coordinate(&region, MapCell { row: 0, col: 0 });
        assert!(north_west.latitude > region.lat_max - (region.lat_max - region.lat_min) / 10.0);
        assert!(north_west.longitude < region.lng_min + (region.lng_max - region.lng_min) / 10.0);
    }

    #[test]
    fn cell_lookup_inverts_cell_centers() {
        let region = Region::boston();
        for row in 0..MAP_ROWS {
            for col in 0..MAP_COLS {
                let cell = MapCell { row, col };
                assert_eq!(cell_for(&region, cell_coordinate(&region, cell)), Some(cell));
            }
        }
        assert_eq!(cell_for(&region, Coordinate::new(40.7, -74.0)), None);
    }

    #[test]
    fn tab_cycles_focus() {
        let mut page = Page::new(TestRuntime::default());
        assert_eq!(page.view_data.focus, Focus::Map);
        page.press(KeyCode::Tab);
        assert_eq!(page.view_data.focus, Focus::Search);
        page.press(KeyCode::Tab);
        assert_eq!(page.view_data.focus, Focus::Form);
        page.press(KeyCode::BackTab);
        assert_eq!(page.view_data.focus, Focus::Search);
    }

    #[test]
    fn enter_on_map_picks_location_and_fetches_label() {
        let mut page = Page::new(TestRuntime::default());
        page.press(KeyCode::Up);
        page.press(KeyCode::Left);
        let expected = cell_coordinate(&page.state.region, page.view_data.cursor);

        page.press(KeyCode::Enter);
        assert_eq!(page.state.coordinate, expected);
        assert_eq!(page.runtime.executed, vec!["describe", "street-view"]);
        assert_eq!(page.state.location_label(), expected.label());
        assert_eq!(page.state.street_view, StreetView::Missing);
    }

    #[test]
    fn cursor_stops_at_the_region_edge() {
        let mut page = Page::new(TestRuntime::default());
        for _ in 0..MAP_ROWS + 3 {
            page.press(KeyCode::Up);
        }
        for _ in 0..MAP_COLS + 3 {
            page.press(KeyCode::Left);
        }
        assert_eq!(page.view_data.cursor, MapCell { row: 0, col: 0 });

        page.press(KeyCode::Enter);
        assert!(page.state.error.is_none());
        assert!(page.state.region.contains_coordinate(page.state.coordinate));
        assert_eq!(page.runtime.executed, vec!["describe", "street-view"]);
    }

    #[test]
    fn region_error_shows_on_screen_until_escape() {
        let mut page = Page::new(TestRuntime::default());
        let before = page.state.coordinate;
        page.state.dispatch(
            PageCommand::MapClick {
                coordinate: Coordinate::new(40.7128, -74.0060),
                label: None,
            },
            fixture_date(),
        );
        assert_eq!(page.state.coordinate, before);
        assert!(page.screen().contains("Only support Boston area"));

        page.press(KeyCode::Esc);
        assert!(page.state.error.is_none());
    }

    #[test]
    fn search_then_submit_renders_results() {
        let runtime = TestRuntime {
            geocoder: FakeGeocoder::default().with_hit("12 Hull St", HULL_ST, "12 Hull St, Boston"),
            predictor: FakePredictor::new().with_response(Ok(scenario_result())),
            ..TestRuntime::default()
        };
        let mut page = Page::new(runtime);

        page.press(KeyCode::Tab);
        page.type_text("12 Hull St");
        page.press(KeyCode::Enter);
        assert_eq!(page.state.coordinate, HULL_ST);
        assert_eq!(
            page.view_data.cursor,
            cell_for(&page.state.region, HULL_ST).expect("inside viewport")
        );
        assert!(header_text(&page.state).starts_with("12 Hull St, Boston"));

        page.press(KeyCode::Tab);
        page.press(KeyCode::Enter);
        assert_eq!(page.runtime.predictor.call_count(), 1);
        assert!(
            page.runtime
                .geocoder
                .calls()
                .contains(&GeoCall::Describe(HULL_ST))
        );

        let results = results_text(&page.state);
        assert!(results.contains("$750,000"), "{results}");
        assert!(results.contains("+5.1%"), "{results}");
        assert!(results.contains("IREA_V3"), "{results}");
        assert!(results.contains("0.0400"), "{results}");
        assert_eq!(page.state.trend.len(), 7);

        let screen = page.screen();
        assert!(screen.contains("$750,000"));
        assert!(screen.contains("value trend"));
    }

    #[test]
    fn form_editing_updates_fields_and_reset_restores_defaults() {
        let mut page = Page::new(TestRuntime::default());
        page.view_data.focus = Focus::Form;

        for _ in 0..4 {
            page.press(KeyCode::Backspace);
        }
        page.type_text("2400x");
        assert_eq!(page.state.form.area_sqft, "2400");

        for _ in 0..5 {
            page.press(KeyCode::Down);
        }
        page.press(KeyCode::Char(' '));
        assert!(page.state.form.renovated);
        assert!(form_text(&page.state, &page.view_data).contains("> Renovated"));

        page.press_with(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(page.state.form.area_sqft, "1200");
        assert!(!page.state.form.renovated);
        assert!(status_text(&page.view_data).contains("form reset"));
    }

    #[test]
    fn blank_optional_fields_render_a_placeholder() {
        let page = Page::new(TestRuntime::default());
        let text = form_text(&page.state, &page.view_data);
        assert!(text.contains("Lot (sqft)      (optional)"));
        assert!(text.contains("No / Unknown"));
    }

    #[test]
    fn failed_submit_keeps_page_interactive() {
        let mut page = Page::new(TestRuntime::default());
        page.press_with(KeyCode::Char('s'), KeyModifiers::CONTROL);

        assert!(!page.state.submitting);
        let error = page.state.error_message().expect("scripted failure surfaces");
        assert!(error.contains("fake://predict"));
        assert!(!page.press(KeyCode::Tab));
    }

    #[test]
    fn ctrl_p_reports_backend_health() {
        let failure = AppError::Transport {
            url: "http://127.0.0.1:8000/health".to_owned(),
            reason: "connection refused".to_owned(),
        };
        let mut page = Page::new(TestRuntime {
            predictor: FakePredictor::new().with_unhealthy(failure),
            ..TestRuntime::default()
        });
        page.press_with(KeyCode::Char('p'), KeyModifiers::CONTROL);
        assert_eq!(page.runtime.executed, vec!["health"]);
        let status = status_text(&page.view_data);
        assert!(status.contains("backend unavailable"), "{status}");
        assert!(status.contains("connection refused"), "{status}");
        assert!(page.state.error.is_none());
    }

    #[test]
    fn ctrl_p_keeps_the_page_responsive_while_checking() {
        let mut state = PageState::default();
        let mut runtime = DeferredRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, rx) = mpsc::channel();

        handle_key_event(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL),
        );
        assert_eq!(runtime.pending.len(), 1);
        assert_eq!(state.backend, BackendStatus::Checking);
        assert!(status_text(&view_data).contains("checking backend"));
        assert!(header_text(&state).contains("checking backend"));

        handle_key_event(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE),
        );
        assert_eq!(view_data.focus, Focus::Search);

        let effect = runtime.pending.remove(0);
        let outcome = runtime.execute(effect);
        tx.send(InternalEvent::Outcome(outcome)).expect("channel open");
        process_internal_events(&mut state, &mut runtime, &mut view_data, &tx, &rx);
        assert_eq!(state.backend, BackendStatus::Healthy);
        assert!(status_text(&view_data).contains("backend ok"));
    }

    #[test]
    fn quit_keys() {
        let mut page = Page::new(TestRuntime::default());
        page.view_data.focus = Focus::Search;
        assert!(!page.press(KeyCode::Char('q')));
        assert_eq!(page.view_data.search_input, "q");
        assert!(page.press_with(KeyCode::Char('c'), KeyModifiers::CONTROL));

        page.view_data.focus = Focus::Map;
        assert!(page.press(KeyCode::Char('q')));
    }

    #[test]
    fn map_marks_selection_and_cursor() {
        let mut page = Page::new(TestRuntime::default());
        let text = map_text(&page.state, &page.view_data);
        assert_eq!(text.lines().count(), MAP_ROWS);
        assert!(text.contains('◉'));

        page.press(KeyCode::Right);
        let text = map_text(&page.state, &page.view_data);
        assert!(text.contains('●'));
        assert!(text.contains('+'));
    }

    #[test]
    fn help_overlay_opens_and_any_key_closes_it() {
        let mut page = Page::new(TestRuntime::default());
        page.press(KeyCode::Char('?'));
        assert!(page.view_data.help_visible);
        assert!(page.screen().contains("any key closes this help"));
        page.press(KeyCode::Char('x'));
        assert!(!page.view_data.help_visible);
    }
}
