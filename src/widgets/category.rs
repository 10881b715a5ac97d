//! Category panel: revenue bars with the cancellation table underneath.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Row, Table, Widget},
};

use crate::category::CategoryPerformance;
use crate::format::{format_axis_label, format_count, format_percent, format_thousands};

const LABEL_WIDTH: usize = 18;

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

pub struct CategoryPanel<'a> {
    categories: &'a [CategoryPerformance],
    border_color: Color,
    bar_color: Color,
    rate_color: Color,
    header_color: Color,
}

impl<'a> CategoryPanel<'a> {
    pub fn new(categories: &'a [CategoryPerformance]) -> Self {
        Self {
            categories,
            border_color: Color::Cyan,
            bar_color: Color::LightBlue,
            rate_color: Color::Red,
            header_color: Color::Cyan,
        }
    }

    pub fn with_colors(mut self, border: Color, bar: Color, rate: Color, header: Color) -> Self {
        self.border_color = border;
        self.bar_color = bar;
        self.rate_color = rate;
        self.header_color = header;
        self
    }

    fn render_bars(&self, area: Rect, buf: &mut Buffer) {
        let bars: Vec<Bar> = self
            .categories
            .iter()
            .map(|c| {
                Bar::default()
                    .value(c.revenue.max(0.0).round() as u64)
                    .label(Line::from(truncate(&c.category, LABEL_WIDTH)))
                    .text_value(format_axis_label(c.revenue))
                    .style(Style::default().fg(self.bar_color))
                    .value_style(
                        Style::default()
                            .fg(Color::Black)
                            .bg(self.bar_color)
                            .add_modifier(Modifier::BOLD),
                    )
            })
            .collect();

        BarChart::default()
            .direction(Direction::Horizontal)
            .data(BarGroup::default().bars(&bars))
            .bar_width(1)
            .bar_gap(0)
            .render(area, buf);
    }

    fn render_table(&self, area: Rect, buf: &mut Buffer) {
        let header = Row::new(["Category", "Revenue", "Orders", "Canceled", "Rate"]).style(
            Style::default()
                .fg(self.header_color)
                .add_modifier(Modifier::BOLD),
        );
        let rows = self.categories.iter().map(|c| {
            Row::new([
                Line::from(c.category.clone()),
                Line::from(format_thousands(c.revenue)).right_aligned(),
                Line::from(format_count(c.total_orders)).right_aligned(),
                Line::from(format_count(c.canceled_orders)).right_aligned(),
                Line::styled(
                    format_percent(c.cancellation_rate),
                    Style::default().fg(self.rate_color),
                )
                .right_aligned(),
            ])
        });
        Table::new(
            rows,
            [
                Constraint::Fill(1),
                Constraint::Length(14),
                Constraint::Length(8),
                Constraint::Length(9),
                Constraint::Length(7),
            ],
        )
        .header(header)
        .render(area, buf);
    }
}

impl Widget for CategoryPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.border_color))
            .title(" Revenue and Cancellation Rate by Category ");
        let inner = block.inner(area);
        block.render(area, buf);

        if self.categories.is_empty() {
            Paragraph::new("No delivered orders in this date range")
                .centered()
                .render(inner, buf);
            return;
        }

        let n = self.categories.len() as u16;
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(n),
                Constraint::Length(1),
                Constraint::Min(n + 1),
            ])
            .split(inner);

        self.render_bars(layout[0], buf);
        self.render_table(layout[2], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_names() {
        assert_eq!(truncate("toys", 18), "toys");
        assert_eq!(truncate("computers_accessories", 10), "computers…");
    }

    #[test]
    fn renders_rows_and_empty_state() {
        let cats = vec![CategoryPerformance {
            category: "Toys".to_string(),
            revenue: 60.0,
            total_orders: 4,
            canceled_orders: 1,
            cancellation_rate: 25.0,
        }];
        let area = Rect::new(0, 0, 80, 12);
        let mut buf = Buffer::empty(area);
        CategoryPanel::new(&cats).render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Toys"));
        assert!(text.contains("25.0%"));

        let mut buf = Buffer::empty(area);
        CategoryPanel::new(&[]).render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("No delivered orders"));
    }
}
