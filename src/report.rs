//! How an analysis result is presented, shared by every screen and command
//! that shows a score.

use ratatui::style::Color;

use crate::models::AnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Positive,
    Neutral,
    Negative,
}

impl ScoreBand {
    /// `>= 80` positive, `60..80` neutral, everything else (NaN included) negative.
    pub fn of(score: f64) -> Self {
        if score >= 80.0 {
            ScoreBand::Positive
        } else if score >= 60.0 {
            ScoreBand::Neutral
        } else {
            ScoreBand::Negative
        }
    }

    pub fn color(self) -> Color {
        match self {
            ScoreBand::Positive => Color::Green,
            ScoreBand::Neutral => Color::Yellow,
            ScoreBand::Negative => Color::Red,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Positive => "strong match",
            ScoreBand::Neutral => "partial match",
            ScoreBand::Negative => "weak match",
        }
    }

    /// Single-character marker for plain-text output.
    pub fn marker(self) -> char {
        match self {
            ScoreBand::Positive => '+',
            ScoreBand::Neutral => '~',
            ScoreBand::Negative => '-',
        }
    }
}

pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        format!("{:.1}", score)
    }
}

/// Suggestions numbered in server order.
pub fn suggestion_lines(suggestions: &[String]) -> Vec<String> {
    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect()
}

/// Long-form text split into lines with whitespace kept verbatim.
pub fn preformatted(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Plain-text report used by `history show` and `analyze`.
pub fn render_text(result: &AnalysisResult) -> String {
    let band = ScoreBand::of(result.score);
    let mut out = String::new();

    out.push_str(&format!("Analysis #{}\n", result.id));
    if !result.cv_name.is_empty() {
        out.push_str(&format!("CV: {}\n", result.cv_name));
    }
    if !result.job_title.is_empty() {
        out.push_str(&format!("Job: {}\n", result.job_title));
    }
    out.push_str(&format!(
        "Score: {}/100 [{}] {}\n",
        format_score(result.score),
        band.marker(),
        band.label()
    ));
    if !result.created_at.is_empty() {
        out.push_str(&format!("Created: {}\n", result.created_at));
    }

    out.push_str("\n--- Feedback ---\n");
    for line in preformatted(&result.feedback) {
        out.push_str(line);
        out.push('\n');
    }

    if !result.suggestions.is_empty() {
        out.push_str("\n--- Suggestions ---\n");
        for line in suggestion_lines(&result.suggestions) {
            out.push_str(&line);
            out.push('\n');
        }
    }

    if !result.improved_cv.is_empty() {
        out.push_str("\n--- Improved CV ---\n");
        for line in preformatted(&result.improved_cv) {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries_are_exact() {
        assert_eq!(ScoreBand::of(80.0), ScoreBand::Positive);
        assert_eq!(ScoreBand::of(79.0), ScoreBand::Neutral);
        assert_eq!(ScoreBand::of(79.99), ScoreBand::Neutral);
        assert_eq!(ScoreBand::of(60.0), ScoreBand::Neutral);
        assert_eq!(ScoreBand::of(59.0), ScoreBand::Negative);
        assert_eq!(ScoreBand::of(59.99), ScoreBand::Negative);
        assert_eq!(ScoreBand::of(100.0), ScoreBand::Positive);
        assert_eq!(ScoreBand::of(0.0), ScoreBand::Negative);
        assert_eq!(ScoreBand::of(f64::NAN), ScoreBand::Negative);
    }

    #[test]
    fn test_each_band_has_its_own_color() {
        assert_eq!(ScoreBand::Positive.color(), Color::Green);
        assert_eq!(ScoreBand::Neutral.color(), Color::Yellow);
        assert_eq!(ScoreBand::Negative.color(), Color::Red);
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(80.0), "80");
        assert_eq!(format_score(79.6), "79.6");
    }

    #[test]
    fn test_suggestions_keep_server_order() {
        let suggestions = vec!["Add metrics".to_string(), "Mention Rust".to_string()];
        assert_eq!(
            suggestion_lines(&suggestions),
            vec!["1. Add metrics".to_string(), "2. Mention Rust".to_string()]
        );
    }

    #[test]
    fn test_preformatted_keeps_whitespace() {
        let text = "# Summary\n\n  * indented **bold**\r\ntrailing  ";
        assert_eq!(
            preformatted(text),
            vec!["# Summary", "", "  * indented **bold**", "trailing  "]
        );
    }

    #[test]
    fn test_render_text_sections() {
        let result = AnalysisResult {
            id: 4,
            score: 79.6,
            feedback: "Good\n\n  fit".to_string(),
            suggestions: vec!["One".to_string(), "Two".to_string()],
            improved_cv: "Jane Doe\n  Engineer".to_string(),
            cv_name: "jane.pdf".to_string(),
            job_title: "Engineer".to_string(),
            created_at: "2024-10-24 10:00:00".to_string(),
        };
        let text = render_text(&result);
        assert!(text.contains("Score: 79.6/100 [~] partial match"));
        assert!(text.contains("Good\n\n  fit\n"));
        assert!(text.contains("1. One\n2. Two\n"));
        assert!(text.contains("Jane Doe\n  Engineer\n"));
    }
}
