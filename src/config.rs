use anyhow::{Context, Result, bail};
use clap::Args;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5001/api";

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Base URL of the analysis backend
    #[arg(long, global = true, env = "CVSCAN_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "CVSCAN_TIMEOUT", default_value = "30")]
    pub timeout: u64,

    /// Where the session and logs are kept
    #[arg(long, global = true, env = "CVSCAN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        let api_url = validate_api_url(&args.api_url)?;
        if args.timeout == 0 {
            bail!("Timeout must be at least one second");
        }
        let data_dir = match &args.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir(),
        };
        Ok(Self {
            api_url,
            timeout: Duration::from_secs(args.timeout),
            data_dir,
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("cvscan.log")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.data_dir.as_path(), self.export_dir().as_path()] {
            create_dir(dir)?;
        }
        Ok(())
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "cvscan") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        PathBuf::from(".cvscan")
    }
}

/// Only http(s) URLs are usable; the trailing slash is dropped.
pub fn validate_api_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid API URL: {}", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("API URL must use http or https: {}", raw);
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(api_url: &str, timeout: u64, data_dir: Option<PathBuf>) -> GlobalArgs {
        GlobalArgs {
            api_url: api_url.to_string(),
            timeout,
            data_dir,
        }
    }

    #[test]
    fn test_validate_api_url() {
        assert_eq!(validate_api_url(DEFAULT_API_URL).unwrap(), DEFAULT_API_URL);
        assert_eq!(
            validate_api_url("https://cv.example.com/api/").unwrap(),
            "https://cv.example.com/api"
        );
        assert!(validate_api_url("localhost:5001").is_err());
        assert!(validate_api_url("ftp://example.com").is_err());
        assert!(validate_api_url("not a url").is_err());
    }

    #[test]
    fn test_config_from_args() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_args(&args(DEFAULT_API_URL, 5, Some(dir.path().to_path_buf()))).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.log_path(), dir.path().join("cvscan.log"));

        config.ensure_dirs().unwrap();
        assert!(config.export_dir().is_dir());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Config::from_args(&args(DEFAULT_API_URL, 0, None)).is_err());
    }
}
