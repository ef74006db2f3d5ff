use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cv {
    pub id: i64,
    pub file_name: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescription {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String, // list endpoints may omit it
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: i64,
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub improved_cv: String,
    #[serde(default)]
    pub cv_name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub created_at: String,
}

/// Auth endpoints answer `{success, user_id, email}` on both register and login.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthReply {
    pub user_id: i64,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthReply {
    /// A missing or blank email in the reply falls back to the one the user typed.
    pub fn into_session(self, typed_email: &str) -> Session {
        let email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| typed_email.trim().to_string());
        Session { id: self.user_id, email }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardStats {
    pub total: usize,
    pub average_score: i64,
    pub recent: Vec<AnalysisResult>,
}

impl DashboardStats {
    pub fn from_history(history: &[AnalysisResult]) -> Self {
        let total = history.len();
        let average_score = if total > 0 {
            let sum: f64 = history.iter().map(|r| r.score).sum();
            (sum / total as f64).round() as i64
        } else {
            0
        };
        Self {
            total,
            average_score,
            recent: history.iter().take(3).cloned().collect(),
        }
    }
}

/// Accepts RFC 3339 or SQLite's `datetime('now')` format.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Short date for list rows; falls back to the raw server string.
pub fn display_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(ts) => ts.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}
