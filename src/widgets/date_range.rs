//! Sidebar with the start/end date inputs.

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::filter::{parse_date, DateBounds};

const DATE_INPUT_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateField {
    #[default]
    Start,
    End,
}

impl DateField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::End => "End",
        }
    }

    fn other(self) -> Self {
        match self {
            Self::Start => Self::End,
            Self::End => Self::Start,
        }
    }
}

/// What a key press did to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not a date-input key; the caller may handle it.
    Unhandled,
    /// Consumed; only the input itself needs a redraw.
    Handled,
    /// One of the two dates changed.
    RangeChanged,
}

/// Two date inputs that never leave the observed bounds.
///
/// Each field is clamped on its own, so start can still end up after end;
/// that is reported by the snapshot, not prevented here.
#[derive(Debug, Clone)]
pub struct DateRangeInput {
    bounds: DateBounds,
    start: NaiveDate,
    end: NaiveDate,
    focus: DateField,
    editing: Option<String>,
    edit_error: Option<String>,
}

impl DateRangeInput {
    pub fn new(bounds: DateBounds) -> Self {
        Self {
            bounds,
            start: bounds.min(),
            end: bounds.max(),
            focus: DateField::Start,
            editing: None,
            edit_error: None,
        }
    }

    /// Start from an explicit selection; both dates are clamped.
    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        if let Some(start) = start {
            self.start = self.bounds.clamp(start);
        }
        if let Some(end) = end {
            self.end = self.bounds.clamp(end);
        }
        self
    }

    pub fn bounds(&self) -> DateBounds {
        self.bounds
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn focus(&self) -> DateField {
        self.focus
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn edit_error(&self) -> Option<&str> {
        self.edit_error.as_deref()
    }

    pub fn value(&self, field: DateField) -> NaiveDate {
        match field {
            DateField::Start => self.start,
            DateField::End => self.end,
        }
    }

    fn set(&mut self, field: DateField, date: NaiveDate) -> bool {
        let date = self.bounds.clamp(date);
        let slot = match field {
            DateField::Start => &mut self.start,
            DateField::End => &mut self.end,
        };
        let changed = *slot != date;
        *slot = date;
        changed
    }

    pub fn toggle_focus(&mut self) {
        self.focus = self.focus.other();
    }

    /// Move the focused date by `days`, stopping at the bounds.
    pub fn step(&mut self, days: i64) -> bool {
        let next = self.bounds.step(self.value(self.focus), days);
        self.set(self.focus, next)
    }

    pub fn jump_to_min(&mut self) -> bool {
        self.set(self.focus, self.bounds.min())
    }

    pub fn jump_to_max(&mut self) -> bool {
        self.set(self.focus, self.bounds.max())
    }

    /// Back to the full observed range.
    pub fn reset(&mut self) -> bool {
        self.editing = None;
        self.edit_error = None;
        let changed = self.start != self.bounds.min() || self.end != self.bounds.max();
        self.start = self.bounds.min();
        self.end = self.bounds.max();
        changed
    }

    pub fn begin_edit(&mut self) {
        self.editing = Some(self.value(self.focus).format("%Y-%m-%d").to_string());
        self.edit_error = None;
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.edit_error = None;
    }

    /// Apply the typed date. An unparsable buffer keeps edit mode open.
    pub fn commit_edit(&mut self) -> bool {
        let Some(buffer) = self.editing.as_deref() else {
            return false;
        };
        match parse_date(buffer) {
            Some(date) => {
                self.editing = None;
                self.edit_error = None;
                self.set(self.focus, date)
            }
            None => {
                self.edit_error = Some(format!("'{}' is not a date (YYYY-MM-DD)", buffer.trim()));
                false
            }
        }
    }

    fn edit_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        let Some(buffer) = self.editing.as_mut() else {
            return KeyOutcome::Unhandled;
        };
        match event.code {
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                if buffer.len() < DATE_INPUT_LEN {
                    buffer.push(c);
                }
                KeyOutcome::Handled
            }
            KeyCode::Backspace => {
                buffer.pop();
                KeyOutcome::Handled
            }
            KeyCode::Esc => {
                self.cancel_edit();
                KeyOutcome::Handled
            }
            KeyCode::Enter => {
                if self.commit_edit() {
                    KeyOutcome::RangeChanged
                } else {
                    KeyOutcome::Handled
                }
            }
            // Swallow everything else so typing never triggers shortcuts.
            _ => KeyOutcome::Handled,
        }
    }

    pub fn key(&mut self, event: &KeyEvent) -> KeyOutcome {
        if self.is_editing() {
            return self.edit_key(event);
        }
        let changed = match event.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.toggle_focus();
                return KeyOutcome::Handled;
            }
            KeyCode::Enter => {
                self.begin_edit();
                return KeyOutcome::Handled;
            }
            KeyCode::Left => self.step(-1),
            KeyCode::Right => self.step(1),
            KeyCode::Down => self.step(-7),
            KeyCode::Up => self.step(7),
            KeyCode::PageDown => self.step(-30),
            KeyCode::PageUp => self.step(30),
            KeyCode::Home => self.jump_to_min(),
            KeyCode::End => self.jump_to_max(),
            KeyCode::Char('r') => self.reset(),
            _ => return KeyOutcome::Unhandled,
        };
        if changed {
            KeyOutcome::RangeChanged
        } else {
            KeyOutcome::Handled
        }
    }
}

/// Renders a [`DateRangeInput`] as the left sidebar.
pub struct DateRangeSidebar<'a> {
    input: &'a DateRangeInput,
    border_color: Color,
    active_color: Color,
    text_secondary: Color,
    error_color: Color,
}

impl<'a> DateRangeSidebar<'a> {
    pub fn new(input: &'a DateRangeInput) -> Self {
        Self {
            input,
            border_color: Color::Cyan,
            active_color: Color::Yellow,
            text_secondary: Color::DarkGray,
            error_color: Color::Red,
        }
    }

    pub fn with_colors(
        mut self,
        border: Color,
        active: Color,
        text_secondary: Color,
        error: Color,
    ) -> Self {
        self.border_color = border;
        self.active_color = active;
        self.text_secondary = text_secondary;
        self.error_color = error;
        self
    }

    fn render_field(&self, field: DateField, area: Rect, buf: &mut Buffer) {
        let focused = self.input.focus() == field;
        let border_style = if focused {
            Style::default().fg(self.active_color)
        } else {
            Style::default().fg(self.border_color)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" {} ", field.label()));

        let text = match (&self.input.editing, focused) {
            (Some(buffer), true) => Line::from(vec![
                Span::raw(buffer.clone()),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]),
            _ => Line::from(self.input.value(field).format("%Y-%m-%d").to_string()),
        };
        let style = if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Paragraph::new(text).style(style).block(block).render(area, buf);
    }
}

impl Widget for DateRangeSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.border_color))
            .title(" Date Range ");
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Start
                Constraint::Length(3), // End
                Constraint::Length(2), // Edit error
                Constraint::Fill(1),   // Hints
            ])
            .split(inner);

        self.render_field(DateField::Start, layout[0], buf);
        self.render_field(DateField::End, layout[1], buf);

        if let Some(err) = self.input.edit_error() {
            Paragraph::new(err)
                .style(Style::default().fg(self.error_color))
                .wrap(Wrap { trim: true })
                .render(layout[2], buf);
        }

        let bounds = self.input.bounds();
        let hint = Style::default().fg(self.text_secondary);
        let lines = vec![
            Line::styled(format!("From {}", bounds.min()), hint),
            Line::styled(format!("  to {}", bounds.max()), hint),
            Line::raw(""),
            Line::styled("Tab      switch field", hint),
            Line::styled("←/→      ±1 day", hint),
            Line::styled("↑/↓      ±7 days", hint),
            Line::styled("PgUp/Dn  ±30 days", hint),
            Line::styled("Home/End bounds", hint),
            Line::styled("Enter    type date", hint),
        ];
        Paragraph::new(lines).render(layout[3], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn input() -> DateRangeInput {
        DateRangeInput::new(DateBounds::new(date(2022, 1, 1), date(2022, 3, 31)))
    }

    #[test]
    fn starts_at_full_range() {
        let i = input();
        assert_eq!(i.start(), date(2022, 1, 1));
        assert_eq!(i.end(), date(2022, 3, 31));
        assert_eq!(i.focus(), DateField::Start);
    }

    #[test]
    fn explicit_range_is_clamped() {
        let i = input().with_range(Some(date(2021, 6, 1)), Some(date(2022, 2, 1)));
        assert_eq!(i.start(), date(2022, 1, 1));
        assert_eq!(i.end(), date(2022, 2, 1));
    }

    #[test]
    fn stepping_stays_in_bounds() {
        let mut i = input();
        assert_eq!(i.key(&key(KeyCode::Left)), KeyOutcome::Handled);
        assert_eq!(i.start(), date(2022, 1, 1));
        assert_eq!(i.key(&key(KeyCode::PageUp)), KeyOutcome::RangeChanged);
        assert_eq!(i.start(), date(2022, 1, 31));
        i.key(&key(KeyCode::Tab));
        assert_eq!(i.key(&key(KeyCode::Up)), KeyOutcome::Handled);
        assert_eq!(i.end(), date(2022, 3, 31));
        i.key(&key(KeyCode::Home));
        assert_eq!(i.end(), date(2022, 1, 1));
    }

    #[test]
    fn start_may_pass_end() {
        let mut i = input();
        i.key(&key(KeyCode::Tab));
        i.key(&key(KeyCode::Home));
        i.key(&key(KeyCode::Tab));
        i.key(&key(KeyCode::Right));
        assert!(i.start() > i.end());
        assert_eq!(i.key(&key(KeyCode::Char('r'))), KeyOutcome::RangeChanged);
        assert_eq!(i.start(), date(2022, 1, 1));
        assert_eq!(i.end(), date(2022, 3, 31));
    }

    #[test]
    fn typed_dates() {
        let mut i = input();
        i.key(&key(KeyCode::Enter));
        assert!(i.is_editing());
        for _ in 0..10 {
            i.key(&key(KeyCode::Backspace));
        }
        for c in "2022-02-14".chars() {
            i.key(&key(KeyCode::Char(c)));
        }
        // Shortcuts are swallowed while typing.
        assert_eq!(i.key(&key(KeyCode::Char('q'))), KeyOutcome::Handled);
        assert_eq!(i.key(&key(KeyCode::Enter)), KeyOutcome::RangeChanged);
        assert!(!i.is_editing());
        assert_eq!(i.start(), date(2022, 2, 14));
    }

    #[test]
    fn typed_dates_are_clamped_and_validated() {
        let mut i = input();
        i.key(&key(KeyCode::Tab));
        i.key(&key(KeyCode::Enter));
        i.key(&key(KeyCode::Backspace));
        i.key(&key(KeyCode::Backspace));
        assert_eq!(i.key(&key(KeyCode::Enter)), KeyOutcome::Handled);
        assert!(i.is_editing());
        assert!(i.edit_error().is_some());

        // 2023-03-10 lies past the bounds.
        for _ in 0..10 {
            i.key(&key(KeyCode::Backspace));
        }
        for c in "2023-03-10".chars() {
            i.key(&key(KeyCode::Char(c)));
        }
        assert_eq!(i.key(&key(KeyCode::Enter)), KeyOutcome::Handled);
        assert_eq!(i.end(), date(2022, 3, 31));
        assert!(i.edit_error().is_none());
    }

    #[test]
    fn escape_cancels_edit() {
        let mut i = input();
        i.key(&key(KeyCode::Enter));
        i.key(&key(KeyCode::Backspace));
        assert_eq!(i.key(&key(KeyCode::Esc)), KeyOutcome::Handled);
        assert!(!i.is_editing());
        assert_eq!(i.start(), date(2022, 1, 1));
    }

    #[test]
    fn unrelated_keys_pass_through() {
        let mut i = input();
        assert_eq!(i.key(&key(KeyCode::Char('q'))), KeyOutcome::Unhandled);
        assert_eq!(i.key(&key(KeyCode::Char('e'))), KeyOutcome::Unhandled);
    }
}
