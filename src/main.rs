mod api;
mod config;
mod dispatch;
mod models;
mod pages;
mod report;
mod router;
mod session;
mod storage;
mod tui;
mod widgets;

use anyhow::{Context, Result, anyhow, bail};
use api::{ApiClient, Backend};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use config::{Config, GlobalArgs};
use dispatch::Dispatcher;
use models::{AnalysisResult, DashboardStats, Session, display_date};
use pages::{TimeWindow, validate_cv_path};
use report::{ScoreBand, format_score, render_text};
use session::SessionStore;
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use storage::LocalStorage;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cvscan")]
#[command(about = "Match your CV against job descriptions and track the results")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Defaults to the interactive interface
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        email: String,

        /// Prompted for when omitted
        #[arg(long, env = "CVSCAN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign in
    Login {
        email: String,

        /// Prompted for when omitted
        #[arg(long, env = "CVSCAN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show who is signed in
    Whoami,

    /// Check that the backend is reachable
    Health,

    /// Manage uploaded CVs
    Cv {
        #[command(subcommand)]
        command: CvCommands,
    },

    /// Manage job descriptions
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Score a CV against a job description
    Analyze {
        /// CV ID
        cv_id: i64,

        /// Job description ID
        job_id: i64,
    },

    /// Browse past analyses
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Summary of recent activity
    Dashboard,

    /// Interactive terminal interface
    Tui,
}

#[derive(Subcommand)]
enum CvCommands {
    /// Upload a PDF, DOC or DOCX file
    Upload { file: PathBuf },

    /// List uploaded CVs
    List,

    /// Delete a CV
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum JobCommands {
    /// Save a job description
    Add {
        title: String,

        /// Read the description from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Description text
        #[arg(short, long)]
        text: Option<String>,
    },

    /// List job descriptions
    List {
        /// Only titles containing this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Delete a job description
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List past analyses
    List {
        /// Match against CV name or job title
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long, value_enum, default_value_t = WindowArg::All)]
        window: WindowArg,
    },

    /// Show one analysis in full
    Show { id: i64 },

    /// Delete an analysis
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Download the improved CV as text
    Export {
        id: i64,

        /// Output file (default: improved_cv_<id>.txt)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WindowArg {
    All,
    #[value(name = "30d")]
    Days30,
    #[value(name = "3m")]
    Months3,
}

impl From<WindowArg> for TimeWindow {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::All => TimeWindow::AllTime,
            WindowArg::Days30 => TimeWindow::Last30Days,
            WindowArg::Months3 => TimeWindow::Last3Months,
        }
    }
}

fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cvscan=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}

fn require_session(storage: LocalStorage) -> Result<Session> {
    let store = SessionStore::load(storage)?;
    store
        .current()
        .cloned()
        .ok_or_else(|| anyhow!("Not logged in. Run 'cvscan login' first."))
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn confirm(question: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(is_yes(&prompt(&format!("{} [y/N] ", question))?))
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    let password = match password {
        Some(p) => p,
        None => prompt("Password: ")?,
    };
    if password.is_empty() {
        bail!("Email and password are required");
    }
    Ok(password)
}

fn filter_history(
    history: Vec<AnalysisResult>,
    search: Option<&str>,
    window: TimeWindow,
) -> Vec<AnalysisResult> {
    let needle = search.unwrap_or("").trim().to_lowercase();
    let now = Utc::now();
    history
        .into_iter()
        .filter(|r| {
            needle.is_empty()
                || r.cv_name.to_lowercase().contains(&needle)
                || r.job_title.to_lowercase().contains(&needle)
        })
        .filter(|r| window.contains(&r.created_at, now))
        .collect()
}

fn print_history_header() {
    println!(
        "{:<6} {:>6} {:<2} {:<28} {:<28} {:<10}",
        "ID", "SCORE", "", "CV", "JOB", "DATE"
    );
    println!("{}", "-".repeat(84));
}

fn average_line(average_score: i64) -> String {
    let band = ScoreBand::of(average_score as f64);
    format!(
        "Average score:  {}/100 [{}] {}",
        average_score,
        band.marker(),
        band.label()
    )
}

fn print_history_row(result: &AnalysisResult) {
    let band = ScoreBand::of(result.score);
    println!(
        "{:<6} {:>6} {:<2} {:<28} {:<28} {:<10}",
        result.id,
        format_score(result.score),
        band.marker(),
        truncate(&result.cv_name, 26),
        truncate(&result.job_title, 26),
        display_date(&result.created_at)
    );
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_args(&cli.global)?;
    config.ensure_dirs()?;
    init_logging(&config)?;
    info!(api_url = %config.api_url, data_dir = %config.data_dir.display(), "starting");

    let storage = LocalStorage::open(&config.data_dir)?;
    let client = ApiClient::new(&config.api_url, config.timeout)?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Register { email, password } => {
            let password = password_or_prompt(password)?;
            let session = client
                .register(email.trim(), &password)
                .context("Registration failed")?;
            let mut store = SessionStore::load(storage)?;
            store.login(session.clone())?;
            println!("Account created. Logged in as {} (user #{}).", session.email, session.id);
        }

        Commands::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let session = client.login(email.trim(), &password).context("Login failed")?;
            let mut store = SessionStore::load(storage)?;
            store.login(session.clone())?;
            println!("Logged in as {} (user #{}).", session.email, session.id);
        }

        Commands::Logout => {
            let mut store = SessionStore::load(storage)?;
            let was_logged_in = store.is_authenticated();
            store.logout()?;
            if was_logged_in {
                println!("Logged out.");
            } else {
                println!("Not logged in.");
            }
        }

        Commands::Whoami => {
            let store = SessionStore::load(storage)?;
            match store.current() {
                Some(session) => println!("Logged in as {} (user #{}).", session.email, session.id),
                None => println!("Not logged in."),
            }
        }

        Commands::Health => {
            let status = client.health().context("Backend is not reachable")?;
            println!("Backend at {} is up.", client.base_url());
            if !status.is_null() {
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
        }

        Commands::Cv { command } => {
            let session = require_session(storage)?;
            match command {
                CvCommands::Upload { file } => {
                    validate_cv_path(&file).map_err(|message| anyhow!(message))?;
                    client.upload_cv(session.id, &file).context("Upload failed")?;
                    println!("CV uploaded successfully!");
                }

                CvCommands::List => {
                    let cvs = client.list_cvs(session.id).context("Failed to load CVs")?;
                    if cvs.is_empty() {
                        println!("No CVs uploaded yet. Run 'cvscan cv upload <file>' to add one.");
                    } else {
                        println!("{:<6} {:<40} {:<10}", "ID", "FILE", "UPLOADED");
                        println!("{}", "-".repeat(58));
                        for cv in cvs {
                            println!(
                                "{:<6} {:<40} {:<10}",
                                cv.id,
                                truncate(&cv.file_name, 38),
                                display_date(&cv.created_at)
                            );
                        }
                    }
                }

                CvCommands::Delete { id, yes } => {
                    if !confirm(&format!("Delete CV #{}?", id), yes)? {
                        println!("Cancelled.");
                        return Ok(());
                    }
                    client
                        .delete_cv(id)
                        .with_context(|| format!("Failed to delete CV #{}", id))?;
                    println!("Deleted CV #{}.", id);
                }
            }
        }

        Commands::Job { command } => {
            let session = require_session(storage)?;
            match command {
                JobCommands::Add { title, file, text } => {
                    let content = match (file, text) {
                        (Some(file), _) => std::fs::read_to_string(&file)
                            .with_context(|| format!("Failed to read job description: {}", file.display()))?,
                        (None, Some(text)) => text,
                        (None, None) => bail!("Provide the description with --file or --text"),
                    };
                    if title.trim().is_empty() || content.trim().is_empty() {
                        bail!("Title and description are both required");
                    }
                    client
                        .save_job_description(session.id, title.trim(), &content)
                        .context("Failed to save job description")?;
                    println!("Job description saved");
                }

                JobCommands::List { search } => {
                    let needle = search.unwrap_or_default().to_lowercase();
                    let jobs: Vec<_> = client
                        .list_job_descriptions(session.id)
                        .context("Failed to load job descriptions")?
                        .into_iter()
                        .filter(|job| job.title.to_lowercase().contains(&needle))
                        .collect();
                    if jobs.is_empty() {
                        println!("No job descriptions yet. Run 'cvscan job add <title> --file <path>' to add one.");
                    } else {
                        println!("{:<6} {:<40} {:<10}", "ID", "TITLE", "CREATED");
                        println!("{}", "-".repeat(58));
                        for job in jobs {
                            println!(
                                "{:<6} {:<40} {:<10}",
                                job.id,
                                truncate(&job.title, 38),
                                display_date(&job.created_at)
                            );
                        }
                    }
                }

                JobCommands::Delete { id, yes } => {
                    if !confirm(&format!("Delete job description #{}?", id), yes)? {
                        println!("Cancelled.");
                        return Ok(());
                    }
                    client
                        .delete_job_description(id)
                        .with_context(|| format!("Failed to delete job description #{}", id))?;
                    println!("Deleted job description #{}.", id);
                }
            }
        }

        Commands::Analyze { cv_id, job_id } => {
            let session = require_session(storage)?;
            println!("Analyzing CV #{} against job description #{}...", cv_id, job_id);
            let result = client
                .analyze(session.id, cv_id, job_id)
                .context("Analysis failed")?;
            println!();
            print!("{}", render_text(&result));
        }

        Commands::History { command } => {
            let session = require_session(storage)?;
            match command {
                HistoryCommands::List { search, window } => {
                    let history = client
                        .analysis_history(session.id)
                        .context("Failed to load history")?;
                    if history.is_empty() {
                        println!("No analyses yet. Run 'cvscan analyze <cv-id> <job-id>' to start.");
                        return Ok(());
                    }
                    let rows = filter_history(history, search.as_deref(), window.into());
                    if rows.is_empty() {
                        println!("No analyses match.");
                    } else {
                        print_history_header();
                        for result in &rows {
                            print_history_row(result);
                        }
                    }
                }

                HistoryCommands::Show { id } => {
                    let result = client
                        .analysis_result(id)
                        .with_context(|| format!("Failed to load analysis #{}", id))?;
                    print!("{}", render_text(&result));
                }

                HistoryCommands::Delete { id, yes } => {
                    if !confirm(&format!("Delete analysis #{}?", id), yes)? {
                        println!("Cancelled.");
                        return Ok(());
                    }
                    client
                        .delete_analysis_result(id)
                        .with_context(|| format!("Failed to delete analysis #{}", id))?;
                    println!("Deleted analysis #{}.", id);
                }

                HistoryCommands::Export { id, out } => {
                    let text = client
                        .export_cv(id)
                        .with_context(|| format!("Failed to export analysis #{}", id))?;
                    let out = out.unwrap_or_else(|| PathBuf::from(format!("improved_cv_{}.txt", id)));
                    std::fs::write(&out, text).with_context(|| format!("Failed to write {}", out.display()))?;
                    println!("Improved CV saved to {}", out.display());
                }
            }
        }

        Commands::Dashboard => {
            let session = require_session(storage)?;
            let history = client
                .analysis_history(session.id)
                .context("Failed to load history")?;
            let stats = DashboardStats::from_history(&history);
            println!("Welcome back, {}", session.email);
            println!();
            println!("Total analyses: {}", stats.total);
            if stats.total > 0 {
                println!("{}", average_line(stats.average_score));
            }
            println!();
            if stats.recent.is_empty() {
                println!("No recent activity found. Start your first analysis!");
            } else {
                println!("Recent activity:");
                print_history_header();
                for result in &stats.recent {
                    print_history_row(result);
                }
            }
        }

        Commands::Tui => {
            let session = SessionStore::new(storage);
            let dispatcher = Dispatcher::new(Arc::new(client));
            let mut app = tui::App::new(session, dispatcher, config.export_dir());
            tui::run(&mut app)?;
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::analysis;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Senior Frontend Engineer", 10), "Senior ...");
        assert_eq!(truncate("Développeur Rust confirmé", 8), "Dével...");
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES\n"));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }

    #[test]
    fn test_filter_history_by_search() {
        let mut a = analysis(1, 80.0);
        a.job_title = "Backend Engineer".to_string();
        let b = analysis(2, 50.0);
        let rows = filter_history(vec![a, b], Some("backend"), TimeWindow::AllTime);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
    }

    #[test]
    fn test_average_line_carries_band() {
        assert_eq!(average_line(80), "Average score:  80/100 [+] strong match");
        assert!(average_line(60).ends_with("[~] partial match"));
        assert!(average_line(59).ends_with("[-] weak match"));
    }

    #[test]
    fn test_subcommand_defaults_to_tui() {
        let cli = Cli::try_parse_from(["cvscan"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["cvscan", "history", "list", "--window", "30d"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::History {
                command: HistoryCommands::List {
                    window: WindowArg::Days30,
                    ..
                }
            })
        ));
    }

    #[test]
    fn test_delete_takes_yes_flag() {
        let cli = Cli::try_parse_from(["cvscan", "cv", "delete", "3", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Cv {
                command: CvCommands::Delete { id: 3, yes: true }
            })
        ));
    }
}
