use tracing::info;

use super::{Effect, EmptyState};
use crate::dispatch::{Request, Response};
use crate::models::{AnalysisResult, Cv, JobDescription, Session};
use crate::router::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeFocus {
    Cvs,
    Jobs,
}

#[derive(Debug)]
pub struct AnalyzePage {
    user_id: i64,
    pub cvs: Vec<Cv>,
    pub jobs: Vec<JobDescription>,
    pub cv_cursor: usize,
    pub job_cursor: usize,
    pub cv_id: Option<i64>,
    pub job_id: Option<i64>,
    pub focus: AnalyzeFocus,
    pub loading_cvs: bool,
    pub loading_jobs: bool,
    pub cv_error: Option<String>,
    pub job_error: Option<String>,
    pub analyzing: bool,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
    pub scroll: u16,
}

impl AnalyzePage {
    pub fn new(session: &Session) -> Self {
        Self {
            user_id: session.id,
            cvs: Vec::new(),
            jobs: Vec::new(),
            cv_cursor: 0,
            job_cursor: 0,
            cv_id: None,
            job_id: None,
            focus: AnalyzeFocus::Cvs,
            loading_cvs: false,
            loading_jobs: false,
            cv_error: None,
            job_error: None,
            analyzing: false,
            result: None,
            error: None,
            scroll: 0,
        }
    }

    pub fn mount(&mut self) -> Vec<Request> {
        self.loading_cvs = true;
        self.loading_jobs = true;
        vec![
            Request::ListCvs { user_id: self.user_id },
            Request::ListJobs { user_id: self.user_id },
        ]
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            AnalyzeFocus::Cvs => AnalyzeFocus::Jobs,
            AnalyzeFocus::Jobs => AnalyzeFocus::Cvs,
        };
    }

    pub fn next(&mut self) {
        match self.focus {
            AnalyzeFocus::Cvs if self.cv_cursor + 1 < self.cvs.len() => self.cv_cursor += 1,
            AnalyzeFocus::Jobs if self.job_cursor + 1 < self.jobs.len() => self.job_cursor += 1,
            _ => {}
        }
    }

    pub fn prev(&mut self) {
        match self.focus {
            AnalyzeFocus::Cvs => self.cv_cursor = self.cv_cursor.saturating_sub(1),
            AnalyzeFocus::Jobs => self.job_cursor = self.job_cursor.saturating_sub(1),
        }
    }

    /// Selects the item under the cursor in the focused list.
    pub fn select(&mut self) {
        if self.analyzing {
            return;
        }
        match self.focus {
            AnalyzeFocus::Cvs => {
                if let Some(cv) = self.cvs.get(self.cv_cursor) {
                    self.cv_id = Some(cv.id);
                }
            }
            AnalyzeFocus::Jobs => {
                if let Some(job) = self.jobs.get(self.job_cursor) {
                    self.job_id = Some(job.id);
                }
            }
        }
        self.error = None;
    }

    pub fn can_start(&self) -> bool {
        self.cv_id.is_some() && self.job_id.is_some() && !self.analyzing
    }

    /// At most one analyze request per started analysis.
    pub fn start(&mut self) -> Option<Effect> {
        if self.analyzing {
            return None;
        }
        let (Some(cv_id), Some(job_id)) = (self.cv_id, self.job_id) else {
            self.error = Some("Select a CV and a job description first".to_string());
            return None;
        };
        self.analyzing = true;
        self.error = None;
        self.result = None;
        self.scroll = 0;
        info!(cv_id, job_id, "starting analysis");
        Some(Effect::Request(Request::Analyze {
            user_id: self.user_id,
            cv_id,
            job_id,
        }))
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(3);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(3);
    }

    pub fn cv_empty_state(&self) -> Option<EmptyState> {
        (!self.loading_cvs && self.cv_error.is_none() && self.cvs.is_empty()).then_some(EmptyState {
            message: "No CVs yet.",
            action: "Upload a CV",
            target: Route::Upload,
        })
    }

    pub fn job_empty_state(&self) -> Option<EmptyState> {
        (!self.loading_jobs && self.job_error.is_none() && self.jobs.is_empty()).then_some(EmptyState {
            message: "No job descriptions yet.",
            action: "Add a job description",
            target: Route::Jobs,
        })
    }

    /// The empty state whose call-to-action applies right now.
    pub fn empty_state(&self) -> Option<EmptyState> {
        self.cv_empty_state().or_else(|| self.job_empty_state())
    }

    pub fn apply(&mut self, response: Response) -> Vec<Effect> {
        match response {
            Response::Cvs(result) => {
                self.loading_cvs = false;
                match result {
                    Ok(cvs) => {
                        self.cvs = cvs;
                        self.cv_error = None;
                    }
                    Err(err) => {
                        self.cv_error = Some(err.message.clone());
                        self.error = Some(err.message);
                    }
                }
                self.cv_cursor = self.cv_cursor.min(self.cvs.len().saturating_sub(1));
            }
            Response::Jobs(result) => {
                self.loading_jobs = false;
                match result {
                    Ok(jobs) => {
                        self.jobs = jobs;
                        self.job_error = None;
                    }
                    Err(err) => {
                        self.job_error = Some(err.message.clone());
                        self.error = Some(err.message);
                    }
                }
                self.job_cursor = self.job_cursor.min(self.jobs.len().saturating_sub(1));
            }
            Response::Analyzed(result) => {
                self.analyzing = false;
                match result {
                    Ok(analysis) => self.result = Some(analysis),
                    Err(err) => self.error = Some(format!("Analysis failed: {}", err.message)),
                }
            }
            _ => {}
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ErrorKind};
    use crate::dispatch::testing::analysis;

    fn page_with_data() -> AnalyzePage {
        let mut page = AnalyzePage::new(&Session {
            id: 7,
            email: "a@b.com".to_string(),
        });
        page.mount();
        page.apply(Response::Cvs(Ok(vec![
            Cv { id: 10, file_name: "a.pdf".to_string(), created_at: String::new() },
            Cv { id: 11, file_name: "b.pdf".to_string(), created_at: String::new() },
        ])));
        page.apply(Response::Jobs(Ok(vec![JobDescription {
            id: 20,
            title: "Engineer".to_string(),
            content: String::new(),
            created_at: String::new(),
        }])));
        page
    }

    #[test]
    fn test_start_disabled_until_both_selected() {
        let mut page = page_with_data();
        assert!(!page.can_start());

        page.next();
        page.select();
        assert_eq!(page.cv_id, Some(11));
        assert!(!page.can_start());
        assert_eq!(page.start(), None);

        page.toggle_focus();
        page.select();
        assert_eq!(page.job_id, Some(20));
        assert!(page.can_start());
    }

    #[test]
    fn test_repeated_start_emits_one_request() {
        let mut page = page_with_data();
        page.select();
        page.toggle_focus();
        page.select();

        let effects: Vec<Effect> = (0..5).filter_map(|_| page.start()).collect();
        assert_eq!(
            effects,
            vec![Effect::Request(Request::Analyze {
                user_id: 7,
                cv_id: 10,
                job_id: 20
            })]
        );
        assert!(!page.can_start());

        page.apply(Response::Analyzed(Ok(analysis(99, 85.0))));
        assert!(page.can_start());
        assert_eq!(page.result.as_ref().map(|r| r.id), Some(99));
    }

    #[test]
    fn test_failed_analysis_can_be_retried() {
        let mut page = page_with_data();
        page.select();
        page.toggle_focus();
        page.select();
        page.start();
        page.apply(Response::Analyzed(Err(ApiError::new(ErrorKind::Network, "Request timed out"))));
        assert_eq!(page.error.as_deref(), Some("Analysis failed: Request timed out"));
        assert!(page.start().is_some());
    }

    #[test]
    fn test_empty_states_point_to_the_right_pages() {
        let mut page = AnalyzePage::new(&Session {
            id: 7,
            email: "a@b.com".to_string(),
        });
        page.mount();
        assert_eq!(page.empty_state(), None);

        page.apply(Response::Cvs(Ok(Vec::new())));
        page.apply(Response::Jobs(Ok(vec![JobDescription {
            id: 1,
            title: "x".to_string(),
            content: String::new(),
            created_at: String::new(),
        }])));
        assert_eq!(page.empty_state().map(|e| e.target), Some(Route::Upload));

        page.apply(Response::Cvs(Ok(vec![Cv {
            id: 1,
            file_name: "a.pdf".to_string(),
            created_at: String::new(),
        }])));
        page.apply(Response::Jobs(Ok(Vec::new())));
        assert_eq!(page.empty_state().map(|e| e.target), Some(Route::Jobs));
    }

    #[test]
    fn test_failed_list_load_is_not_an_empty_state() {
        let mut page = AnalyzePage::new(&Session {
            id: 7,
            email: "a@b.com".to_string(),
        });
        page.mount();
        page.apply(Response::Cvs(Err(ApiError::new(
            ErrorKind::Network,
            "Could not reach the server",
        ))));
        page.apply(Response::Jobs(Err(ApiError::new(ErrorKind::Server, "HTTP 500"))));

        assert_eq!(page.error.as_deref(), Some("HTTP 500"));
        assert_eq!(page.cv_empty_state(), None);
        assert_eq!(page.job_empty_state(), None);
        assert_eq!(page.empty_state(), None);

        // A later successful load of an empty list is a real empty state.
        page.apply(Response::Cvs(Ok(Vec::new())));
        assert_eq!(page.cv_empty_state().map(|e| e.target), Some(Route::Upload));
    }
}
