use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::format::{format_count, format_score, format_thousands};
use crate::metrics::KpiSummary;

/// The three headline cards: revenue, orders and average review score.
pub struct KpiCards<'a> {
    kpis: &'a KpiSummary,
    border_color: Color,
    value_color: Color,
}

impl<'a> KpiCards<'a> {
    pub fn new(kpis: &'a KpiSummary) -> Self {
        Self {
            kpis,
            border_color: Color::Cyan,
            value_color: Color::White,
        }
    }

    pub fn with_colors(mut self, border: Color, value: Color) -> Self {
        self.border_color = border;
        self.value_color = value;
        self
    }

    /// (title, value) in display order.
    pub fn cards(&self) -> [(&'static str, String); 3] {
        [
            ("Total Revenue", format_thousands(self.kpis.total_revenue)),
            ("Total Orders", format_count(self.kpis.total_orders)),
            (
                "Average Review Score",
                format!("{} / 5.0", format_score(self.kpis.avg_review_score)),
            ),
        ]
    }
}

impl Widget for KpiCards<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(area);

        for (i, (title, value)) in self.cards().into_iter().enumerate() {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.border_color))
                .title(format!(" {} ", title));
            Paragraph::new(value)
                .style(
                    Style::default()
                        .fg(self.value_color)
                        .add_modifier(Modifier::BOLD),
                )
                .centered()
                .block(block)
                .render(layout[i], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_values() {
        let kpis = KpiSummary {
            total_revenue: 1_234_567.8,
            total_orders: 98_765,
            avg_review_score: Some(4.086),
        };
        let cards = KpiCards::new(&kpis).cards();
        assert_eq!(cards[0].1, "1,234,568");
        assert_eq!(cards[1].1, "98,765");
        assert_eq!(cards[2].1, "4.09 / 5.0");
    }

    #[test]
    fn undefined_score_card() {
        let kpis = KpiSummary {
            total_revenue: 0.0,
            total_orders: 0,
            avg_review_score: None,
        };
        let cards = KpiCards::new(&kpis).cards();
        assert_eq!(cards[2].1, "n/a / 5.0");
    }

    #[test]
    fn renders_titles() {
        let kpis = KpiSummary {
            total_revenue: 25.0,
            total_orders: 2,
            avg_review_score: Some(3.0),
        };
        let area = Rect::new(0, 0, 90, 3);
        let mut buf = Buffer::empty(area);
        KpiCards::new(&kpis).render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Total Revenue"));
        assert!(text.contains("3.00 / 5.0"));
    }
}
