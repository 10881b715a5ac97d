//! Delay panel: mean score per delivery bucket and the key takeaways.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Widget, Wrap},
};

use crate::delay::{DelayAnalysis, DeliveryBucket};
use crate::format::{format_delta, format_score};

/// Bars are drawn in tenths of a point so 4.25 and 4.3 differ visibly.
const SCORE_SCALE: f64 = 10.0;
const SCORE_AXIS_MAX: u64 = 55;

pub struct DelayPanel<'a> {
    delay: &'a DelayAnalysis,
    narrative: &'a str,
    border_color: Color,
    late_color: Color,
    on_time_color: Color,
    text_secondary: Color,
}

impl<'a> DelayPanel<'a> {
    pub fn new(delay: &'a DelayAnalysis, narrative: &'a str) -> Self {
        Self {
            delay,
            narrative,
            border_color: Color::Cyan,
            late_color: Color::Red,
            on_time_color: Color::Green,
            text_secondary: Color::DarkGray,
        }
    }

    pub fn with_colors(
        mut self,
        border: Color,
        late: Color,
        on_time: Color,
        text_secondary: Color,
    ) -> Self {
        self.border_color = border;
        self.late_color = late;
        self.on_time_color = on_time;
        self.text_secondary = text_secondary;
        self
    }

    fn bucket_color(&self, bucket: DeliveryBucket) -> Color {
        match bucket {
            DeliveryBucket::Late => self.late_color,
            DeliveryBucket::OnTime => self.on_time_color,
        }
    }

    fn render_bars(&self, area: Rect, buf: &mut Buffer) {
        let bars: Vec<Bar> = DeliveryBucket::ALL
            .into_iter()
            .map(|bucket| {
                let score = self.delay.bucket(bucket).mean_score;
                let color = self.bucket_color(bucket);
                Bar::default()
                    .value(score.map(|s| (s * SCORE_SCALE).round() as u64).unwrap_or(0))
                    .label(Line::from(bucket.label()))
                    .text_value(format_score(score))
                    .style(Style::default().fg(color))
                    .value_style(
                        Style::default()
                            .fg(Color::Black)
                            .bg(color)
                            .add_modifier(Modifier::BOLD),
                    )
            })
            .collect();

        let bar_width = (area.width / 4).clamp(3, 14);
        BarChart::default()
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width)
            .bar_gap(bar_width / 2)
            .max(SCORE_AXIS_MAX)
            .render(area, buf);
    }

    fn takeaways(&self) -> Vec<Line<'a>> {
        let label = Style::default().fg(self.text_secondary);
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let late = self.delay.late;
        let on_time = self.delay.on_time;
        vec![
            Line::from(vec![
                Span::styled("Score: On Time  ", label),
                Span::styled(format_score(on_time.mean_score), bold.fg(self.on_time_color)),
                Span::styled(format!("  ({} lines)", on_time.orders), label),
            ]),
            Line::from(vec![
                Span::styled("Score: Late     ", label),
                Span::styled(format_score(late.mean_score), bold.fg(self.late_color)),
                Span::styled(format!("  ({} lines)", late.orders), label),
            ]),
            Line::from(vec![
                Span::styled("Difference      ", label),
                Span::styled(format_delta(self.delay.delta), bold),
            ]),
            Line::raw(""),
            Line::raw(self.narrative),
        ]
    }
}

impl Widget for DelayPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.border_color))
            .title(" Delivery Delay vs. Review Score ");
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(inner);

        self.render_bars(layout[0], buf);

        let notes = Block::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(self.text_secondary))
            .title(" Key Takeaways ");
        Paragraph::new(self.takeaways())
            .wrap(Wrap { trim: true })
            .block(notes)
            .render(layout[1], buf);
    }
}
