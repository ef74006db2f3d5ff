use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::report::{ScoreBand, format_score};

/// Single-line text input state.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            masked: false,
        }
    }

    pub fn masked(label: &'static str) -> Self {
        Self {
            masked: true,
            ..Self::new(label)
        }
    }

    pub fn push(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn pop(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn text(&self) -> &str {
        &self.value
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

pub fn card(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
}

pub fn input(frame: &mut Frame, area: Rect, field: &TextField, focused: bool) {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let cursor = if focused { "_" } else { "" };
    let widget = Paragraph::new(format!("{}{}", field.display(), cursor))
        .block(card(field.label).border_style(style));
    frame.render_widget(widget, area);
}

/// Multi-line input; newlines are kept as typed.
pub fn text_area(frame: &mut Frame, area: Rect, label: &str, value: &str, focused: bool) {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let text = if focused { format!("{}_", value) } else { value.to_string() };
    let widget = Paragraph::new(text)
        .block(card(label).border_style(style))
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, area);
}

pub fn button(label: &str, enabled: bool, loading: bool) -> Span<'static> {
    if loading {
        Span::styled(
            format!("[ {}... ]", label),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )
    } else if enabled {
        Span::styled(
            format!("[ {} ]", label),
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!("[ {} ]", label), Style::default().fg(Color::DarkGray))
    }
}

pub fn select<'a>(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    items: Vec<ListItem<'a>>,
    state: &mut ListState,
    focused: bool,
) {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(card(title).border_style(border))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, state);
}

/// Colored score span, the one place a score gets its band treatment.
pub fn score_span(score: f64) -> Span<'static> {
    let band = ScoreBand::of(score);
    Span::styled(
        format!("{:>5}", format_score(score)),
        Style::default().fg(band.color()).add_modifier(Modifier::BOLD),
    )
}

pub fn score_gauge(frame: &mut Frame, area: Rect, score: f64) {
    let band = ScoreBand::of(score);
    let ratio = (score / 100.0).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(card("Score"))
        .gauge_style(Style::default().fg(band.color()))
        .ratio(if ratio.is_nan() { 0.0 } else { ratio })
        .label(format!("{}/100  {}", format_score(score), band.label()));
    frame.render_widget(gauge, area);
}

pub fn modal(frame: &mut Frame, title: &str, body: &str) {
    let area = centered_rect(50, 25, frame.area());
    frame.render_widget(Clear, area);
    let widget = Paragraph::new(format!("{}\n\n[y] confirm   [n] cancel", body))
        .block(card(title).border_style(Style::default().fg(Color::Yellow)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

pub fn banner(message: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" ! {}  (x to dismiss)", message))
        .style(Style::default().fg(Color::White).bg(Color::Red))
}

pub fn notice(message: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" {}", message)).style(Style::default().fg(Color::Green))
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_field_editing() {
        let mut field = TextField::new("Email");
        for c in "a@b.co".chars() {
            field.push(c);
        }
        field.pop();
        assert_eq!(field.text(), "a@b.c");
        assert!(!field.is_blank());
        field.clear();
        assert!(field.is_blank());
    }

    #[test]
    fn test_masked_field_hides_value() {
        let mut field = TextField::masked("Password");
        field.value = "hunter2".to_string();
        assert_eq!(field.display(), "*******");
    }

    #[test]
    fn test_score_span_uses_band_color() {
        assert_eq!(score_span(80.0).style.fg, Some(Color::Green));
        assert_eq!(score_span(60.0).style.fg, Some(Color::Yellow));
        assert_eq!(score_span(59.0).style.fg, Some(Color::Red));
    }

    #[test]
    fn test_disabled_button_is_dimmed() {
        assert_eq!(button("Start Analysis", false, false).style.fg, Some(Color::DarkGray));
        assert_eq!(button("Start Analysis", true, false).style.bg, Some(Color::Cyan));
        assert!(button("Start Analysis", true, true).content.contains("..."));
    }

    #[test]
    fn test_centered_rect_is_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(50, 25, area);
        assert!(inner.x >= 25 && inner.right() <= 75);
        assert!(inner.y > 0 && inner.bottom() < 40);
    }
}
