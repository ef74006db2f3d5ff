use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, warn};

use crate::api::{ApiError, ApiResult, Backend, ErrorKind};
use crate::models::{AnalysisResult, Cv, JobDescription, Session};

/// A backend call requested by a screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Register { email: String, password: String },
    Login { email: String, password: String },
    Health,
    UploadCv { user_id: i64, path: PathBuf },
    ListCvs { user_id: i64 },
    DeleteCv { id: i64 },
    SaveJob { user_id: i64, title: String, content: String },
    ListJobs { user_id: i64 },
    DeleteJob { id: i64 },
    Analyze { user_id: i64, cv_id: i64, job_id: i64 },
    History { user_id: i64 },
    Result { id: i64 },
    DeleteResult { id: i64 },
    ExportCv { id: i64, dest: PathBuf },
}

impl Request {
    /// Log-safe name; credentials never reach the log file.
    pub fn label(&self) -> &'static str {
        match self {
            Request::Register { .. } => "register",
            Request::Login { .. } => "login",
            Request::Health => "health",
            Request::UploadCv { .. } => "upload_cv",
            Request::ListCvs { .. } => "list_cvs",
            Request::DeleteCv { .. } => "delete_cv",
            Request::SaveJob { .. } => "save_job",
            Request::ListJobs { .. } => "list_jobs",
            Request::DeleteJob { .. } => "delete_job",
            Request::Analyze { .. } => "analyze",
            Request::History { .. } => "history",
            Request::Result { .. } => "result",
            Request::DeleteResult { .. } => "delete_result",
            Request::ExportCv { .. } => "export_cv",
        }
    }
}

#[derive(Debug)]
pub enum Response {
    Authenticated(ApiResult<Session>),
    Health(ApiResult<Value>),
    CvUploaded(ApiResult<()>),
    Cvs(ApiResult<Vec<Cv>>),
    CvDeleted { id: i64, result: ApiResult<()> },
    JobSaved(ApiResult<()>),
    Jobs(ApiResult<Vec<JobDescription>>),
    JobDeleted { id: i64, result: ApiResult<()> },
    Analyzed(ApiResult<AnalysisResult>),
    History(ApiResult<Vec<AnalysisResult>>),
    Result(ApiResult<AnalysisResult>),
    ResultDeleted { id: i64, result: ApiResult<()> },
    Exported { id: i64, result: ApiResult<PathBuf> },
}

pub fn execute(backend: &dyn Backend, request: Request) -> Response {
    match request {
        Request::Register { email, password } => {
            Response::Authenticated(backend.register(&email, &password))
        }
        Request::Login { email, password } => Response::Authenticated(backend.login(&email, &password)),
        Request::Health => Response::Health(backend.health()),
        Request::UploadCv { user_id, path } => Response::CvUploaded(backend.upload_cv(user_id, &path)),
        Request::ListCvs { user_id } => Response::Cvs(backend.list_cvs(user_id)),
        Request::DeleteCv { id } => Response::CvDeleted {
            id,
            result: backend.delete_cv(id),
        },
        Request::SaveJob { user_id, title, content } => {
            Response::JobSaved(backend.save_job_description(user_id, &title, &content))
        }
        Request::ListJobs { user_id } => Response::Jobs(backend.list_job_descriptions(user_id)),
        Request::DeleteJob { id } => Response::JobDeleted {
            id,
            result: backend.delete_job_description(id),
        },
        Request::Analyze { user_id, cv_id, job_id } => {
            Response::Analyzed(backend.analyze(user_id, cv_id, job_id))
        }
        Request::History { user_id } => Response::History(backend.analysis_history(user_id)),
        Request::Result { id } => Response::Result(backend.analysis_result(id)),
        Request::DeleteResult { id } => Response::ResultDeleted {
            id,
            result: backend.delete_analysis_result(id),
        },
        Request::ExportCv { id, dest } => {
            let result = backend.export_cv(id).and_then(|text| {
                std::fs::write(&dest, text).map_err(|e| {
                    ApiError::new(ErrorKind::Io, format!("Failed to write {}: {}", dest.display(), e))
                })?;
                Ok(dest)
            });
            Response::Exported { id, result }
        }
    }
}

/// Runs requests off the UI thread.
///
/// Each response is tagged with the screen generation it was issued under;
/// leaving a screen bumps the generation and late responses are dropped.
pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    tx: Sender<(u64, Response)>,
    rx: Receiver<(u64, Response)>,
    generation: u64,
    in_flight: usize,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            tx,
            rx,
            generation: 0,
            in_flight: 0,
        }
    }

    pub fn submit(&mut self, request: Request) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let generation = self.generation;
        self.in_flight += 1;
        debug!(generation, request = request.label(), "dispatching request");
        thread::spawn(move || {
            let response = execute(backend.as_ref(), request);
            // The receiver only disappears when the app is shutting down.
            let _ = tx.send((generation, response));
        });
    }

    /// Invalidates every request issued so far.
    pub fn unmount(&mut self) {
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Responses that arrived since the last call, minus stale ones.
    pub fn drain(&mut self) -> Vec<Response> {
        let mut fresh = Vec::new();
        while let Ok((generation, response)) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            if generation == self.generation {
                fresh.push(response);
            } else {
                warn!(generation, current = self.generation, "dropping response for unmounted screen");
            }
        }
        fresh
    }
}
