use super::{Effect, EmptyState};
use crate::dispatch::{Request, Response};
use crate::models::{DashboardStats, Session};
use crate::router::Route;

#[derive(Debug)]
pub struct DashboardPage {
    user_id: i64,
    pub email: String,
    pub stats: DashboardStats,
    pub loading: bool,
    pub error: Option<String>,
    /// `None` until the health check answers.
    pub backend: Option<Result<(), String>>,
}

impl DashboardPage {
    pub fn new(session: &Session) -> Self {
        Self {
            user_id: session.id,
            email: session.email.clone(),
            stats: DashboardStats::default(),
            loading: false,
            error: None,
            backend: None,
        }
    }

    pub fn mount(&mut self) -> Vec<Request> {
        self.loading = true;
        self.error = None;
        self.backend = None;
        vec![Request::History { user_id: self.user_id }, Request::Health]
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        (!self.loading && self.error.is_none() && self.stats.recent.is_empty()).then_some(EmptyState {
            message: "No recent activity found. Start your first analysis!",
            action: "Analyze a CV",
            target: Route::Analyze,
        })
    }

    pub fn apply(&mut self, response: Response) -> Vec<Effect> {
        match response {
            Response::History(result) => {
                self.loading = false;
                match result {
                    Ok(history) => self.stats = DashboardStats::from_history(&history),
                    Err(err) => self.error = Some(err.message),
                }
            }
            Response::Health(result) => {
                self.backend = Some(result.map(|_| ()).map_err(|err| err.message));
            }
            _ => {}
        }
        Vec::new()
    }
}
