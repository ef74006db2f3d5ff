use super::{Effect, EmptyState, Listing};
use crate::dispatch::{Request, Response};
use crate::models::{JobDescription, Session};
use crate::router::Route;
use crate::widgets::TextField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobsFocus {
    List,
    Search,
    Title,
    Content,
}

#[derive(Debug)]
pub struct JobsPage {
    user_id: i64,
    pub jobs: Listing<JobDescription>,
    pub search: TextField,
    pub title: TextField,
    pub content: String,
    pub focus: JobsFocus,
    pub saving: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl JobsPage {
    pub fn new(session: &Session) -> Self {
        Self {
            user_id: session.id,
            jobs: Listing::default(),
            search: TextField::new("Search"),
            title: TextField::new("Title"),
            content: String::new(),
            focus: JobsFocus::List,
            saving: false,
            error: None,
            notice: None,
        }
    }

    pub fn mount(&mut self) -> Vec<Request> {
        vec![self.refresh()]
    }

    pub fn refresh(&mut self) -> Request {
        self.jobs.start_loading();
        Request::ListJobs { user_id: self.user_id }
    }

    pub fn visible(&self) -> Vec<&JobDescription> {
        let needle = self.search.text().trim().to_lowercase();
        self.jobs
            .items
            .iter()
            .filter(|job| needle.is_empty() || job.title.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn selected(&self) -> Option<&JobDescription> {
        self.visible().get(self.jobs.selected).copied()
    }

    pub fn next(&mut self) {
        let visible = self.visible().len();
        self.jobs.next(visible);
    }

    pub fn prev(&mut self) {
        self.jobs.prev();
    }

    pub fn search_changed(&mut self) {
        let visible = self.visible().len();
        self.jobs.clamp(visible);
    }

    pub fn can_save(&self) -> bool {
        !self.saving && !self.title.is_blank() && !self.content.trim().is_empty()
    }

    pub fn save(&mut self) -> Option<Effect> {
        if self.saving {
            return None;
        }
        if self.title.is_blank() || self.content.trim().is_empty() {
            self.error = Some("Title and description are both required".to_string());
            return None;
        }
        self.saving = true;
        self.error = None;
        self.notice = None;
        Some(Effect::Request(Request::SaveJob {
            user_id: self.user_id,
            title: self.title.text().trim().to_string(),
            content: self.content.clone(),
        }))
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selected().map(|job| job.id) {
            Some(id) => self.jobs.request_delete(id),
            None => false,
        }
    }

    pub fn confirm_delete(&mut self) -> Option<Effect> {
        self.jobs
            .confirm_delete()
            .map(|id| Effect::Request(Request::DeleteJob { id }))
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        self.jobs.is_empty_state().then_some(EmptyState {
            message: "No job descriptions yet.",
            action: "Add the posting you want to match against",
            target: Route::Jobs,
        })
    }

    pub fn apply(&mut self, response: Response) -> Vec<Effect> {
        match response {
            Response::Jobs(result) => {
                self.jobs.loaded(result);
                Vec::new()
            }
            Response::JobSaved(result) => {
                self.saving = false;
                match result {
                    Ok(()) => {
                        self.notice = Some("Job description saved".to_string());
                        self.title.clear();
                        self.content.clear();
                        self.focus = JobsFocus::List;
                        vec![Effect::Request(self.refresh())]
                    }
                    Err(err) => {
                        self.error = Some(err.message);
                        Vec::new()
                    }
                }
            }
            Response::JobDeleted { id, result } => {
                self.jobs.deleted(id, result);
                let visible = self.visible().len();
                self.jobs.clamp(visible);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            id: 7,
            email: "a@b.com".to_string(),
        }
    }

    fn job(id: i64, title: &str) -> JobDescription {
        JobDescription {
            id,
            title: title.to_string(),
            content: String::new(),
            created_at: String::new(),
        }
    }

    fn loaded_page() -> JobsPage {
        let mut page = JobsPage::new(&session());
        page.mount();
        page.apply(Response::Jobs(Ok(vec![
            job(1, "Senior Frontend Engineer"),
            job(2, "Product Designer"),
            job(3, "Backend Specialist"),
        ])));
        page
    }

    #[test]
    fn test_search_filters_by_title() {
        let mut page = loaded_page();
        page.search.value = "END".to_string();
        page.search_changed();
        let titles: Vec<&str> = page.visible().iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["Senior Frontend Engineer", "Backend Specialist"]);

        page.next();
        assert_eq!(page.selected().map(|j| j.id), Some(3));
    }

    #[test]
    fn test_save_requires_title_and_content() {
        let mut page = loaded_page();
        page.title.value = "Engineer".to_string();
        assert!(!page.can_save());
        assert_eq!(page.save(), None);
        assert!(page.error.is_some());
    }

    #[test]
    fn test_save_then_refresh() {
        let mut page = loaded_page();
        page.title.value = " Engineer ".to_string();
        page.content = "Rust\n  and more".to_string();
        assert_eq!(
            page.save(),
            Some(Effect::Request(Request::SaveJob {
                user_id: 7,
                title: "Engineer".to_string(),
                content: "Rust\n  and more".to_string(),
            }))
        );
        assert_eq!(page.save(), None);

        let effects = page.apply(Response::JobSaved(Ok(())));
        assert_eq!(effects, vec![Effect::Request(Request::ListJobs { user_id: 7 })]);
        assert!(page.title.is_blank());
        assert!(page.content.is_empty());
    }

    #[test]
    fn test_delete_removes_only_that_job() {
        let mut page = loaded_page();
        page.next();
        assert!(page.delete_selected());
        assert_eq!(page.confirm_delete(), Some(Effect::Request(Request::DeleteJob { id: 2 })));
        page.apply(Response::JobDeleted { id: 2, result: Ok(()) });
        let ids: Vec<i64> = page.jobs.items.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_empty_state() {
        let mut page = JobsPage::new(&session());
        page.mount();
        page.apply(Response::Jobs(Ok(Vec::new())));
        assert_eq!(page.empty_state().map(|e| e.message), Some("No job descriptions yet."));
    }
}
