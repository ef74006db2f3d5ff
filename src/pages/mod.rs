//! Screen state machines.
//!
//! A page owns its local UI state and talks to the backend only through
//! [`Request`]s it hands back to the shell; responses come back through
//! `apply`. Nothing here touches the terminal or the network.

mod analyze;
mod auth;
mod dashboard;
mod history;
mod jobs;
mod upload;

pub use analyze::{AnalyzeFocus, AnalyzePage};
pub use auth::{LoginPage, RegisterPage};
pub use dashboard::DashboardPage;
pub use history::{HistoryPage, TimeWindow};
pub use jobs::{JobsFocus, JobsPage};
pub use upload::{UploadPage, validate_cv_path};

use crate::api::ApiResult;
use crate::dispatch::{Request, Response};
use crate::models::{AnalysisResult, Cv, JobDescription, Session};
use crate::router::Route;

/// What a page asks the shell to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Request(Request),
    SignedIn(Session),
    Navigate(Route),
}

/// Explicit "nothing here yet" messaging with a way forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyState {
    pub message: &'static str,
    pub action: &'static str,
    pub target: Route,
}

pub trait Identified {
    fn id(&self) -> i64;
}

impl Identified for Cv {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Identified for JobDescription {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Identified for AnalysisResult {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Server-backed list with selection and a confirm-then-delete flow.
#[derive(Debug)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub selected: usize,
    pub loading: bool,
    pub error: Option<String>,
    confirming: Option<i64>,
    deleting: Option<i64>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            loading: false,
            error: None,
            confirming: None,
            deleting: None,
        }
    }
}

impl<T: Identified> Listing<T> {
    pub fn start_loading(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn loaded(&mut self, result: ApiResult<Vec<T>>) {
        self.loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
            }
            Err(err) => self.error = Some(err.message),
        }
        self.clamp(self.items.len());
    }

    pub fn is_empty_state(&self) -> bool {
        !self.loading && self.error.is_none() && self.items.is_empty()
    }

    pub fn next(&mut self, visible: usize) {
        if visible > 0 && self.selected < visible - 1 {
            self.selected += 1;
        }
    }

    pub fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp(&mut self, visible: usize) {
        if self.selected >= visible {
            self.selected = visible.saturating_sub(1);
        }
    }

    /// Opens the confirmation step. Nothing is sent yet.
    pub fn request_delete(&mut self, id: i64) -> bool {
        if self.deleting.is_some() || !self.items.iter().any(|item| item.id() == id) {
            return false;
        }
        self.confirming = Some(id);
        true
    }

    pub fn confirming(&self) -> Option<i64> {
        self.confirming
    }

    pub fn deleting(&self) -> Option<i64> {
        self.deleting
    }

    /// Hands back the id to delete exactly once per confirmation.
    pub fn confirm_delete(&mut self) -> Option<i64> {
        let id = self.confirming.take()?;
        self.deleting = Some(id);
        Some(id)
    }

    pub fn cancel_delete(&mut self) {
        self.confirming = None;
    }

    pub fn deleted(&mut self, id: i64, result: ApiResult<()>) {
        if self.deleting == Some(id) {
            self.deleting = None;
        }
        match result {
            Ok(()) => {
                self.items.retain(|item| item.id() != id);
                self.clamp(self.items.len());
            }
            Err(err) => self.error = Some(err.message),
        }
    }
}

pub enum Page {
    Login(LoginPage),
    Register(RegisterPage),
    Dashboard(DashboardPage),
    Upload(UploadPage),
    Jobs(JobsPage),
    Analyze(AnalyzePage),
    History(HistoryPage),
}

impl Page {
    /// Builds the page for `route` and the requests it issues on mount.
    /// Protected pages need a session; the router guarantees one.
    pub fn mount(route: Route, session: Option<&Session>, export_dir: &std::path::Path) -> (Page, Vec<Request>) {
        match (route, session) {
            (Route::Register, _) => (Page::Register(RegisterPage::default()), Vec::new()),
            (Route::Login, _) | (_, None) => (Page::Login(LoginPage::default()), Vec::new()),
            (Route::Dashboard, Some(session)) => {
                let mut page = DashboardPage::new(session);
                let requests = page.mount();
                (Page::Dashboard(page), requests)
            }
            (Route::Upload, Some(session)) => {
                let mut page = UploadPage::new(session);
                let requests = page.mount();
                (Page::Upload(page), requests)
            }
            (Route::Jobs, Some(session)) => {
                let mut page = JobsPage::new(session);
                let requests = page.mount();
                (Page::Jobs(page), requests)
            }
            (Route::Analyze, Some(session)) => {
                let mut page = AnalyzePage::new(session);
                let requests = page.mount();
                (Page::Analyze(page), requests)
            }
            (Route::History, Some(session)) => {
                let mut page = HistoryPage::new(session, export_dir.to_path_buf());
                let requests = page.mount();
                (Page::History(page), requests)
            }
        }
    }

    pub fn apply(&mut self, response: Response) -> Vec<Effect> {
        match self {
            Page::Login(page) => page.apply(response),
            Page::Register(page) => page.apply(response),
            Page::Dashboard(page) => page.apply(response),
            Page::Upload(page) => page.apply(response),
            Page::Jobs(page) => page.apply(response),
            Page::Analyze(page) => page.apply(response),
            Page::History(page) => page.apply(response),
        }
    }

    pub fn route(&self) -> Route {
        match self {
            Page::Login(_) => Route::Login,
            Page::Register(_) => Route::Register,
            Page::Dashboard(_) => Route::Dashboard,
            Page::Upload(_) => Route::Upload,
            Page::Jobs(_) => Route::Jobs,
            Page::Analyze(_) => Route::Analyze,
            Page::History(_) => Route::History,
        }
    }
}
