use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

const CONTROLS: [(&str, &str); 5] = [
    ("Tab", "Field"),
    ("r", "Reset"),
    ("e", "Export"),
    ("?", "Insights"),
    ("q", "Quit"),
];

const HALTED_CONTROLS: [(&str, &str); 1] = [("q", "Quit")];

#[derive(Default)]
pub struct Controls {
    pub row_count: Option<usize>,
    pub halted: bool,
    pub status: Option<String>,
    key_color: Option<Color>,
    bg_color: Option<Color>,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row_count(mut self, row_count: Option<usize>) -> Self {
        self.row_count = row_count;
        self
    }

    /// Only the quit hint is shown when halted.
    pub fn with_halted(mut self, halted: bool) -> Self {
        self.halted = halted;
        self
    }

    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }

    pub fn with_colors(mut self, key: Color, bg: Color) -> Self {
        self.key_color = Some(key);
        self.bg_color = Some(bg);
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let controls: &[(&str, &str)] = if self.halted {
            &HALTED_CONTROLS
        } else {
            &CONTROLS
        };

        let mut constraints = controls.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        constraints.push(Constraint::Fill(1)); // status / padding
        if self.row_count.is_some() {
            constraints.push(Constraint::Length(20));
        }

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let bg = self.bg_color.unwrap_or(Color::DarkGray);
        let key_style = Style::default()
            .fg(self.key_color.unwrap_or(Color::Reset))
            .bold();

        for (i, (key, action)) in controls.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(key_style)
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(Style::default().bg(bg))
                .render(layout[j + 1], buf);
        }

        let fill_idx = controls.len() * 2;
        Paragraph::new(self.status.clone().unwrap_or_default())
            .style(Style::default().bg(bg).fg(Color::White))
            .render(layout[fill_idx], buf);

        if let Some(count) = self.row_count {
            Paragraph::new(format!("Lines: {}", crate::format::format_count(count as u64)))
                .style(Style::default().bg(bg).fg(Color::White))
                .right_aligned()
                .render(layout[fill_idx + 1], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(controls: &Controls) -> String {
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        controls.render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn full_controls() {
        let text = rendered(&Controls::new().with_row_count(Some(1200)));
        assert!(text.contains("Export"));
        assert!(text.contains("Quit"));
        assert!(text.contains("Lines: 1,200"));
    }

    #[test]
    fn keys_are_bold_in_key_color() {
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        Controls::new()
            .with_colors(Color::Cyan, Color::Black)
            .render(area, &mut buf);

        // "Tab" is centered in its 5-wide cell
        let cell = &buf[(1, 0)];
        assert_eq!(cell.symbol(), "T");
        assert_eq!(cell.fg, Color::Cyan);
        assert!(cell.modifier.contains(ratatui::style::Modifier::BOLD));
        assert_eq!(buf[(5, 0)].bg, Color::Black);
    }

    #[test]
    fn halted_only_quits() {
        let text = rendered(&Controls::new().with_halted(true));
        assert!(text.contains("Quit"));
        assert!(!text.contains("Export"));
        assert!(!text.contains("Reset"));
    }
}
