use std::path::{Path, PathBuf};

use super::{Effect, EmptyState, Listing};
use crate::dispatch::{Request, Response};
use crate::models::{Cv, Session};
use crate::router::Route;
use crate::widgets::TextField;

const ACCEPTED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

/// Client-side checks before a file is sent anywhere.
pub fn validate_cv_path(path: &Path) -> Result<(), String> {
    if path.as_os_str().is_empty() {
        return Err("Choose a file to upload".to_string());
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err("Only PDF, DOC or DOCX files are accepted".to_string());
    }
    if !path.is_file() {
        return Err(format!("File not found: {}", path.display()));
    }
    Ok(())
}

#[derive(Debug)]
pub struct UploadPage {
    user_id: i64,
    pub path: TextField,
    pub editing: bool,
    pub cvs: Listing<Cv>,
    pub uploading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl UploadPage {
    pub fn new(session: &Session) -> Self {
        Self {
            user_id: session.id,
            path: TextField::new("File path (.pdf, .doc, .docx)"),
            editing: false,
            cvs: Listing::default(),
            uploading: false,
            error: None,
            notice: None,
        }
    }

    pub fn mount(&mut self) -> Vec<Request> {
        vec![self.refresh()]
    }

    pub fn refresh(&mut self) -> Request {
        self.cvs.start_loading();
        Request::ListCvs { user_id: self.user_id }
    }

    pub fn can_upload(&self) -> bool {
        !self.uploading && !self.path.is_blank()
    }

    pub fn upload(&mut self) -> Option<Effect> {
        if self.uploading {
            return None;
        }
        let path = PathBuf::from(self.path.text().trim());
        if let Err(message) = validate_cv_path(&path) {
            self.error = Some(message);
            return None;
        }
        self.uploading = true;
        self.error = None;
        self.notice = None;
        Some(Effect::Request(Request::UploadCv {
            user_id: self.user_id,
            path,
        }))
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.cvs.items.get(self.cvs.selected).map(|cv| cv.id) {
            Some(id) => self.cvs.request_delete(id),
            None => false,
        }
    }

    pub fn confirm_delete(&mut self) -> Option<Effect> {
        self.cvs
            .confirm_delete()
            .map(|id| Effect::Request(Request::DeleteCv { id }))
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        self.cvs.is_empty_state().then_some(EmptyState {
            message: "No CVs uploaded yet.",
            action: "Enter the path of your first CV",
            target: Route::Upload,
        })
    }

    pub fn apply(&mut self, response: Response) -> Vec<Effect> {
        match response {
            Response::Cvs(result) => {
                self.cvs.loaded(result);
                Vec::new()
            }
            Response::CvUploaded(result) => {
                self.uploading = false;
                match result {
                    Ok(()) => {
                        self.notice = Some("CV uploaded successfully!".to_string());
                        self.path.clear();
                        self.editing = false;
                        vec![Effect::Request(self.refresh())]
                    }
                    Err(err) => {
                        self.error = Some(if err.message.is_empty() {
                            "Upload failed".to_string()
                        } else {
                            err.message
                        });
                        Vec::new()
                    }
                }
            }
            Response::CvDeleted { id, result } => {
                self.cvs.deleted(id, result);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ErrorKind};

    fn session() -> Session {
        Session {
            id: 7,
            email: "a@b.com".to_string(),
        }
    }

    fn cv(id: i64) -> Cv {
        Cv {
            id,
            file_name: format!("cv-{}.pdf", id),
            created_at: "2024-10-24 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_validate_cv_path() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("resume.PDF");
        std::fs::write(&pdf, b"%PDF").unwrap();
        let txt = dir.path().join("resume.txt");
        std::fs::write(&txt, b"plain").unwrap();

        assert!(validate_cv_path(&pdf).is_ok());
        assert_eq!(
            validate_cv_path(&txt).unwrap_err(),
            "Only PDF, DOC or DOCX files are accepted"
        );
        assert_eq!(validate_cv_path(Path::new("")).unwrap_err(), "Choose a file to upload");
        assert!(validate_cv_path(&dir.path().join("missing.docx"))
            .unwrap_err()
            .starts_with("File not found"));
    }

    #[test]
    fn test_empty_path_blocks_upload_without_request() {
        let mut page = UploadPage::new(&session());
        assert!(!page.can_upload());
        assert_eq!(page.upload(), None);
        assert_eq!(page.error.as_deref(), Some("Choose a file to upload"));
    }

    #[test]
    fn test_successful_upload_refreshes_list() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("resume.pdf");
        std::fs::write(&pdf, b"%PDF").unwrap();

        let mut page = UploadPage::new(&session());
        page.path.value = pdf.display().to_string();
        let effect = page.upload();
        assert_eq!(
            effect,
            Some(Effect::Request(Request::UploadCv {
                user_id: 7,
                path: pdf.clone()
            }))
        );
        assert_eq!(page.upload(), None);

        let effects = page.apply(Response::CvUploaded(Ok(())));
        assert_eq!(effects, vec![Effect::Request(Request::ListCvs { user_id: 7 })]);
        assert_eq!(page.notice.as_deref(), Some("CV uploaded successfully!"));
        assert!(page.path.is_blank());
    }

    #[test]
    fn test_failed_upload_shows_error() {
        let mut page = UploadPage::new(&session());
        page.uploading = true;
        page.apply(Response::CvUploaded(Err(ApiError::new(ErrorKind::Validation, "No file part"))));
        assert!(!page.uploading);
        assert_eq!(page.error.as_deref(), Some("No file part"));
    }

    #[test]
    fn test_empty_state_when_no_cvs() {
        let mut page = UploadPage::new(&session());
        page.mount();
        assert_eq!(page.empty_state(), None);
        page.apply(Response::Cvs(Ok(Vec::new())));
        let empty = page.empty_state().unwrap();
        assert_eq!(empty.message, "No CVs uploaded yet.");
        assert_eq!(empty.target, Route::Upload);
    }

    #[test]
    fn test_delete_selected_cv_flow() {
        let mut page = UploadPage::new(&session());
        page.apply(Response::Cvs(Ok(vec![cv(1), cv(2)])));
        page.cvs.next(2);

        assert_eq!(page.confirm_delete(), None);
        assert!(page.delete_selected());
        assert_eq!(page.confirm_delete(), Some(Effect::Request(Request::DeleteCv { id: 2 })));
        assert_eq!(page.confirm_delete(), None);

        page.apply(Response::CvDeleted { id: 2, result: Ok(()) });
        assert_eq!(page.cvs.items.len(), 1);
        assert_eq!(page.cvs.items[0].id, 1);
    }
}
