use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;

use super::{Effect, EmptyState, Listing};
use crate::dispatch::{Request, Response};
use crate::models::{AnalysisResult, Session, parse_timestamp};
use crate::router::Route;
use crate::widgets::TextField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    AllTime,
    Last30Days,
    Last3Months,
}

impl TimeWindow {
    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::AllTime => "All Time",
            TimeWindow::Last30Days => "Last 30 Days",
            TimeWindow::Last3Months => "Last 3 Months",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            TimeWindow::AllTime => TimeWindow::Last30Days,
            TimeWindow::Last30Days => TimeWindow::Last3Months,
            TimeWindow::Last3Months => TimeWindow::AllTime,
        }
    }

    /// Rows with an unreadable timestamp only show under `AllTime`.
    pub fn contains(self, created_at: &str, now: DateTime<Utc>) -> bool {
        let days = match self {
            TimeWindow::AllTime => return true,
            TimeWindow::Last30Days => 30,
            TimeWindow::Last3Months => 90,
        };
        parse_timestamp(created_at).is_some_and(|ts| now - ts <= Duration::days(days))
    }
}

#[derive(Debug)]
pub struct HistoryPage {
    user_id: i64,
    export_dir: PathBuf,
    pub history: Listing<AnalysisResult>,
    pub search: TextField,
    pub searching: bool,
    pub window: TimeWindow,
    pub detail: Option<AnalysisResult>,
    pub loading_detail: bool,
    pub exporting: bool,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub scroll: u16,
}

impl HistoryPage {
    pub fn new(session: &Session, export_dir: PathBuf) -> Self {
        Self {
            user_id: session.id,
            export_dir,
            history: Listing::default(),
            search: TextField::new("Search past analyses"),
            searching: false,
            window: TimeWindow::AllTime,
            detail: None,
            loading_detail: false,
            exporting: false,
            notice: None,
            error: None,
            scroll: 0,
        }
    }

    pub fn mount(&mut self) -> Vec<Request> {
        self.history.start_loading();
        vec![Request::History { user_id: self.user_id }]
    }

    pub fn visible_at(&self, now: DateTime<Utc>) -> Vec<&AnalysisResult> {
        let needle = self.search.text().trim().to_lowercase();
        self.history
            .items
            .iter()
            .filter(|r| {
                needle.is_empty()
                    || r.cv_name.to_lowercase().contains(&needle)
                    || r.job_title.to_lowercase().contains(&needle)
            })
            .filter(|r| self.window.contains(&r.created_at, now))
            .collect()
    }

    pub fn visible(&self) -> Vec<&AnalysisResult> {
        self.visible_at(Utc::now())
    }

    pub fn selected(&self) -> Option<&AnalysisResult> {
        self.visible().get(self.history.selected).copied()
    }

    pub fn next(&mut self) {
        let visible = self.visible().len();
        self.history.next(visible);
    }

    pub fn prev(&mut self) {
        self.history.prev();
    }

    pub fn filters_changed(&mut self) {
        let visible = self.visible().len();
        self.history.clamp(visible);
    }

    pub fn cycle_window(&mut self) {
        self.window = self.window.cycle();
        self.filters_changed();
    }

    pub fn open_selected(&mut self) -> Option<Effect> {
        if self.loading_detail {
            return None;
        }
        let id = self.selected()?.id;
        self.loading_detail = true;
        self.scroll = 0;
        Some(Effect::Request(Request::Result { id }))
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
        self.scroll = 0;
    }

    /// Exports the result in the detail view, or the selected row.
    pub fn export(&mut self) -> Option<Effect> {
        if self.exporting {
            return None;
        }
        let id = match &self.detail {
            Some(detail) => detail.id,
            None => self.selected()?.id,
        };
        self.exporting = true;
        self.notice = None;
        Some(Effect::Request(Request::ExportCv {
            id,
            dest: self.export_dir.join(format!("improved_cv_{}.txt", id)),
        }))
    }

    pub fn delete_selected(&mut self) -> bool {
        let id = match &self.detail {
            Some(detail) => Some(detail.id),
            None => self.selected().map(|r| r.id),
        };
        match id {
            Some(id) => self.history.request_delete(id),
            None => false,
        }
    }

    pub fn confirm_delete(&mut self) -> Option<Effect> {
        self.history
            .confirm_delete()
            .map(|id| Effect::Request(Request::DeleteResult { id }))
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(3);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(3);
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        self.history.is_empty_state().then_some(EmptyState {
            message: "No analyses yet.",
            action: "Run your first analysis",
            target: Route::Analyze,
        })
    }

    pub fn apply(&mut self, response: Response) -> Vec<Effect> {
        match response {
            Response::History(result) => {
                self.history.loaded(result);
                self.filters_changed();
            }
            Response::Result(result) => {
                self.loading_detail = false;
                match result {
                    Ok(detail) => self.detail = Some(detail),
                    Err(err) => self.error = Some(err.message),
                }
            }
            Response::ResultDeleted { id, result } => {
                let removed = result.is_ok();
                self.history.deleted(id, result);
                if removed && self.detail.as_ref().is_some_and(|d| d.id == id) {
                    self.close_detail();
                }
                self.filters_changed();
            }
            Response::Exported { id, result } => {
                self.exporting = false;
                match result {
                    Ok(path) => {
                        self.notice = Some(format!(
                            "Improved CV for analysis #{} saved to {}",
                            id,
                            path.display()
                        ))
                    }
                    Err(err) => self.error = Some(err.message),
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
    use crate::dispatch::testing::analysis;
    use chrono::TimeZone;

    fn page() -> HistoryPage {
        let mut page = HistoryPage::new(
            &Session {
                id: 7,
                email: "a@b.com".to_string(),
            },
            PathBuf::from("/tmp/exports"),
        );
        page.mount();
        page
    }

    fn dated(id: i64, created_at: &str) -> AnalysisResult {
        let mut r = analysis(id, 70.0);
        r.created_at = created_at.to_string();
        r
    }

    #[test]
    fn test_time_window() {
        let now = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
        assert!(TimeWindow::Last30Days.contains("2024-10-24 10:00:00", now));
        assert!(!TimeWindow::Last30Days.contains("2024-08-30 10:00:00", now));
        assert!(TimeWindow::Last3Months.contains("2024-08-30 10:00:00", now));
        assert!(!TimeWindow::Last3Months.contains("not a date", now));
        assert!(TimeWindow::AllTime.contains("not a date", now));
        assert_eq!(TimeWindow::Last3Months.cycle(), TimeWindow::AllTime);
    }

    #[test]
    fn test_search_and_window_filters() {
        let mut page = page();
        let mut a = dated(1, "2024-10-24 10:00:00");
        a.cv_name = "Product_Manager_Resume_v2.pdf".to_string();
        let mut b = dated(2, "2024-08-30 10:00:00");
        b.cv_name = "Draft_Resume_Tech.pdf".to_string();
        page.apply(Response::History(Ok(vec![a, b])));

        let now = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
        assert_eq!(page.visible_at(now).len(), 2);

        page.search.value = "resume".to_string();
        assert_eq!(page.visible_at(now).len(), 2);
        page.search.value = "tech".to_string();
        let ids: Vec<i64> = page.visible_at(now).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2]);

        page.search.clear();
        page.window = TimeWindow::Last30Days;
        let ids: Vec<i64> = page.visible_at(now).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_open_detail_and_export() {
        let mut page = page();
        page.apply(Response::History(Ok(vec![analysis(4, 90.0)])));

        assert_eq!(page.open_selected(), Some(Effect::Request(Request::Result { id: 4 })));
        assert_eq!(page.open_selected(), None);
        page.apply(Response::Result(Ok(analysis(4, 90.0))));
        assert_eq!(page.detail.as_ref().map(|d| d.id), Some(4));

        assert_eq!(
            page.export(),
            Some(Effect::Request(Request::ExportCv {
                id: 4,
                dest: PathBuf::from("/tmp/exports/improved_cv_4.txt"),
            }))
        );
        assert_eq!(page.export(), None);
        page.apply(Response::Exported {
            id: 4,
            result: Ok(PathBuf::from("/tmp/exports/improved_cv_4.txt")),
        });
        assert!(!page.exporting);
        assert_eq!(
            page.notice.as_deref(),
            Some("Improved CV for analysis #4 saved to /tmp/exports/improved_cv_4.txt")
        );
    }

    #[test]
    fn test_delete_from_detail_closes_it() {
        let mut page = page();
        page.apply(Response::History(Ok(vec![analysis(4, 90.0), analysis(5, 50.0)])));
        page.apply(Response::Result(Ok(analysis(4, 90.0))));

        assert!(page.delete_selected());
        assert_eq!(page.confirm_delete(), Some(Effect::Request(Request::DeleteResult { id: 4 })));
        page.apply(Response::ResultDeleted { id: 4, result: Ok(()) });

        assert!(page.detail.is_none());
        let ids: Vec<i64> = page.history.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5]);
    }

    #[test]
    fn test_empty_history_points_to_analyze() {
        let mut page = page();
        assert_eq!(page.empty_state(), None);
        page.apply(Response::History(Ok(Vec::new())));
        assert_eq!(page.empty_state().map(|e| e.target), Some(Route::Analyze));
    }

    #[test]
    fn test_reload_keeps_selection_inside_filtered_rows() {
        let mut page = page();
        let titled = |id: i64, title: &str| {
            let mut r = analysis(id, 70.0);
            r.job_title = title.to_string();
            r
        };
        page.apply(Response::History(Ok(vec![
            titled(1, "Backend Engineer"),
            titled(2, "Backend Lead"),
            titled(3, "Backend Intern"),
        ])));
        page.search.value = "backend".to_string();
        page.filters_changed();
        page.next();
        page.next();
        assert_eq!(page.selected().map(|r| r.id), Some(3));

        page.mount();
        page.apply(Response::History(Ok(vec![
            titled(1, "Backend Engineer"),
            titled(4, "Designer"),
            titled(5, "Analyst"),
        ])));
        assert_eq!(page.visible().len(), 1);
        assert_eq!(page.selected().map(|r| r.id), Some(1));
    }
}
