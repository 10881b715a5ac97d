use chrono::NaiveDate;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;
use std::sync::{mpsc::Sender, Arc};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod category;
pub mod chart_export;
pub mod config;
pub mod dashboard;
pub mod delay;
pub mod error;
pub mod filter;
pub mod format;
pub mod loader;
pub mod metrics;
pub mod report;
pub mod widgets;

#[cfg(test)]
mod fixtures;

pub use config::{AppConfig, Appearance, ColorParser, ConfigManager, Theme};
pub use error::DashboardError;
pub use orderlens_cli::{Args, ReportFormat};

use chart_export::{export_charts, ExportSize};
use dashboard::{compute_snapshot, DashboardSnapshot};
use filter::parse_date;
use loader::{LoadOptions, OrderTable, SessionData};
use widgets::category::CategoryPanel;
use widgets::controls::Controls;
use widgets::date_range::{DateRangeInput, DateRangeSidebar, KeyOutcome};
use widgets::delay::DelayPanel;
use widgets::kpi::KpiCards;

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "orderlens";

const SIDEBAR_WIDTH: u16 = 26;

/// Effective settings after layering the config file and command-line flags.
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub path: PathBuf,
    pub load: LoadOptions,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub top_n: usize,
    pub export_dir: PathBuf,
    pub export_size: ExportSize,
    pub debug: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        let config = AppConfig::default();
        Self {
            path: config.data.path,
            load: LoadOptions::default(),
            start: None,
            end: None,
            top_n: config.dashboard.top_categories,
            export_dir: config.export.directory,
            export_size: ExportSize {
                width: config.export.width,
                height: config.export.height,
            },
            debug: false,
        }
    }
}

fn parse_date_arg(flag: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|v| {
            parse_date(v)
                .ok_or_else(|| eyre!("Invalid {} date '{}'. Expected YYYY-MM-DD", flag, v))
        })
        .transpose()
}

impl DashboardOptions {
    /// Command-line flags take precedence over the config file.
    pub fn from_args_and_config(args: &Args, config: &AppConfig) -> Result<Self> {
        let mut load = LoadOptions::default().with_timestamp_format(
            args.timestamp_format
                .clone()
                .unwrap_or_else(|| config.data.timestamp_format.clone()),
        );
        if let Some(delimiter) = args.delimiter.or(config.data.delimiter) {
            load = load.with_delimiter(delimiter);
        }

        let top_n = args.top_n.unwrap_or(config.dashboard.top_categories);
        if top_n == 0 {
            return Err(eyre!("--top-n must be greater than 0"));
        }

        Ok(Self {
            path: args.path.clone().unwrap_or_else(|| config.data.path.clone()),
            load,
            start: parse_date_arg("--start", args.start.as_deref())?,
            end: parse_date_arg("--end", args.end.as_deref())?,
            top_n,
            export_dir: args
                .export_charts
                .clone()
                .unwrap_or_else(|| config.export.directory.clone()),
            export_size: ExportSize {
                width: config.export.width,
                height: config.export.height,
            },
            debug: args.debug || config.debug.enabled,
        })
    }
}

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Open,
    DoLoad, // Internal event to actually perform loading after the loading screen is drawn
    Recompute,
    Export,
    Exit,
    Crash(String),
    Resize(u16, u16), // resized (width, height)
}

#[derive(Debug, Default)]
struct DebugState {
    enabled: bool,
    num_events: usize,
    num_frames: usize,
    last_recompute: Option<Duration>,
}

pub struct App {
    events: Sender<AppEvent>,
    session: SessionData,
    options: DashboardOptions,
    table: Option<Arc<OrderTable>>,
    input: Option<DateRangeInput>,
    snapshot: Option<DashboardSnapshot>,
    notes: Vec<String>,
    /// Stops the whole dashboard; only this message and the quit hint render.
    fatal: Option<String>,
    /// Stops the panels until the date range is fixed.
    range_error: Option<String>,
    loading: bool,
    show_help: bool,
    status: Option<String>,
    theme: Theme,
    debug: DebugState,
}

impl App {
    pub fn new(events: Sender<AppEvent>, options: DashboardOptions) -> App {
        Self::new_with_theme(events, options, Theme::default())
    }

    pub fn new_with_theme(events: Sender<AppEvent>, options: DashboardOptions, theme: Theme) -> App {
        let session = SessionData::new(options.path.clone(), options.load.clone());
        App {
            events,
            session,
            debug: DebugState {
                enabled: options.debug,
                ..DebugState::default()
            },
            options,
            table: None,
            input: None,
            snapshot: None,
            notes: Vec::new(),
            fatal: None,
            range_error: None,
            loading: false,
            show_help: false,
            status: None,
            theme,
        }
    }

    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn date_input(&self) -> Option<&DateRangeInput> {
        self.input.as_ref()
    }

    pub fn fatal_error(&self) -> Option<&str> {
        self.fatal.as_deref()
    }

    pub fn range_error(&self) -> Option<&str> {
        self.range_error.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_help_visible(&self) -> bool {
        self.show_help
    }

    fn color(&self, name: &str) -> ratatui::style::Color {
        self.theme.get(name)
    }

    fn load(&mut self) -> Option<AppEvent> {
        self.loading = false;
        let table = match self.session.table() {
            Ok(table) => table,
            Err(e) => {
                error!(error = %e, "failed to load dataset");
                self.fatal = Some(e.user_message());
                return None;
            }
        };
        let Some(bounds) = table.date_bounds() else {
            warn!(path = %self.session.path().display(), "no purchase dates in dataset");
            self.fatal = Some(format!(
                "No valid purchase dates found in '{}'.",
                self.session.path().display()
            ));
            return None;
        };
        info!(min = %bounds.min(), max = %bounds.max(), "data available");
        self.input = Some(DateRangeInput::new(bounds).with_range(self.options.start, self.options.end));
        self.table = Some(table);
        Some(AppEvent::Recompute)
    }

    fn recompute(&mut self) {
        let (Some(table), Some(input)) = (&self.table, &self.input) else {
            return;
        };
        let started = Instant::now();
        match compute_snapshot(table, input.start(), input.end(), self.options.top_n) {
            Ok(snapshot) => {
                self.notes = report::insight_notes(&snapshot);
                self.snapshot = Some(snapshot);
                self.range_error = None;
            }
            Err(e) if !e.is_fatal() => {
                debug!(error = %e, "range rejected");
                self.snapshot = None;
                self.range_error = Some(e.user_message());
            }
            Err(e) => {
                error!(error = %e, "failed to compute dashboard");
                self.snapshot = None;
                self.fatal = Some(e.user_message());
            }
        }
        self.debug.last_recompute = Some(started.elapsed());
    }

    fn export(&mut self) {
        let Some(snapshot) = &self.snapshot else {
            self.status = Some("No data to export".to_string());
            return;
        };
        let dir = &self.options.export_dir;
        self.status = Some(match export_charts(dir, snapshot, self.options.export_size) {
            Ok(files) => format!("Exported {} chart(s) to {}", files.len(), dir.display()),
            Err(e) => {
                warn!(error = %e, "chart export failed");
                format!("Export failed: {}", e)
            }
        });
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppEvent::Exit);
        }

        if self.fatal.is_some() {
            return match event.code {
                KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Exit),
                _ => None,
            };
        }

        if self.show_help {
            match event.code {
                KeyCode::Char('q') => return Some(AppEvent::Exit),
                KeyCode::Char('?') | KeyCode::Esc | KeyCode::Enter => self.show_help = false,
                _ => {}
            }
            return None;
        }

        let editing = self.input.as_ref().is_some_and(|i| i.is_editing());
        if !editing {
            match event.code {
                KeyCode::Char('q') | KeyCode::Esc => return Some(AppEvent::Exit),
                KeyCode::Char('?') => {
                    self.show_help = true;
                    return None;
                }
                KeyCode::Char('e') => return Some(AppEvent::Export),
                _ => {}
            }
        }

        let input = self.input.as_mut()?;
        match input.key(event) {
            KeyOutcome::RangeChanged => {
                self.status = None;
                Some(AppEvent::Recompute)
            }
            KeyOutcome::Handled | KeyOutcome::Unhandled => None,
        }
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open => {
                // Draw the loading screen before blocking on the read
                self.loading = true;
                Some(AppEvent::DoLoad)
            }
            AppEvent::DoLoad => self.load(),
            AppEvent::Recompute => {
                self.recompute();
                None
            }
            AppEvent::Export => {
                self.export();
                None
            }
            AppEvent::Resize(_, _) | AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let mut lines = vec![Line::styled(
            "E-Commerce Business Insights",
            Style::default()
                .fg(self.color("primary"))
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(input) = &self.input {
            let bounds = input.bounds();
            lines.push(Line::styled(
                format!("Data available: {} to {}", bounds.min(), bounds.max()),
                Style::default().fg(self.color("text_secondary")),
            ));
        }
        Paragraph::new(lines).render(area, buf);
    }

    fn render_message(&self, title: &str, message: &str, area: Rect, buf: &mut Buffer) {
        let color = self.color("error");
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(format!(" {} ", title));
        Paragraph::new(message)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true })
            .block(block)
            .render(area, buf);
    }

    fn render_panels(&self, snapshot: &DashboardSnapshot, area: Rect, buf: &mut Buffer) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Fill(1),
                Constraint::Length(11),
            ])
            .split(area);

        KpiCards::new(&snapshot.kpis)
            .with_colors(self.color("card_border"), self.color("text_primary"))
            .render(layout[0], buf);
        CategoryPanel::new(&snapshot.categories)
            .with_colors(
                self.color("card_border"),
                self.color("revenue_bar"),
                self.color("cancellation_rate"),
                self.color("primary"),
            )
            .render(layout[1], buf);
        let narrative = self.notes.last().map(String::as_str).unwrap_or_default();
        DelayPanel::new(&snapshot.delay, narrative)
            .with_colors(
                self.color("card_border"),
                self.color("late"),
                self.color("on_time"),
                self.color("text_secondary"),
            )
            .render(layout[2], buf);
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let width = area.width.saturating_sub(8).min(80);
        let height = area.height.saturating_sub(4).min(16);
        let popup = Rect::new(
            area.x + (area.width.saturating_sub(width)) / 2,
            area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        );
        Clear.render(popup, buf);

        let mut lines = vec![
            Line::raw("Revenue counts delivered order lines only; the cancellation rate"),
            Line::raw("is canceled or unavailable orders over all orders in the category."),
            Line::raw("A delivery is late when it arrives at least a day after the estimate."),
            Line::raw(""),
        ];
        lines.extend(self.notes.iter().map(|n| Line::raw(format!("• {}", n))));

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.color("primary")))
            .title(" Insights (? to close) ");
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(block)
            .render(popup, buf);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        Block::default()
            .style(Style::default().bg(self.color("background")))
            .render(area, buf);

        let mut constraints = vec![
            Constraint::Length(2), // Header
            Constraint::Fill(1),
            Constraint::Length(1), // Controls
        ];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let halted = self.fatal.is_some();
        let controls = Controls::new()
            .with_halted(halted)
            .with_row_count(self.snapshot.as_ref().map(|s| s.rows))
            .with_status(self.status.clone())
            .with_colors(self.color("primary"), self.color("controls_bg"));
        (&controls).render(layout[2], buf);

        if self.debug.enabled {
            let recompute = self
                .debug
                .last_recompute
                .map(|d| format!("{:.1}ms", d.as_secs_f64() * 1000.0))
                .unwrap_or_else(|| "-".to_string());
            Paragraph::new(format!(
                "events: {}  frames: {}  last recompute: {}  loaded: {}",
                self.debug.num_events,
                self.debug.num_frames,
                recompute,
                self.session.is_loaded()
            ))
            .style(Style::default().fg(self.color("dimmed")))
            .render(layout[3], buf);
        }

        if let Some(message) = &self.fatal {
            self.render_message("Error", message, layout[0].union(layout[1]), buf);
            return;
        }

        self.render_header(layout[0], buf);

        let Some(input) = &self.input else {
            let text = if self.loading {
                format!("Loading {}…", self.session.path().display())
            } else {
                "No data loaded".to_string()
            };
            Paragraph::new(text).centered().render(layout[1], buf);
            return;
        };

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
            .split(layout[1]);

        DateRangeSidebar::new(input)
            .with_colors(
                self.color("card_border"),
                self.color("input_active"),
                self.color("text_secondary"),
                self.color("error"),
            )
            .render(body[0], buf);

        if let Some(message) = &self.range_error {
            self.render_message("Invalid date range", message, body[1], buf);
        } else if let Some(snapshot) = &self.snapshot {
            self.render_panels(snapshot, body[1], buf);
        }

        if self.show_help {
            self.render_help(area, buf);
        }
    }
}
