// Harness configuration
//
// Resolved once at process start from environment variables and validated
// eagerly, so a misconfigured run fails before any browser is launched.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Default base URL of the application under test
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default directory holding one persisted session file per role
pub const DEFAULT_STATE_DIR: &str = "playwright/.auth";

/// Default directory for screenshots and other failure artifacts
pub const DEFAULT_RESULTS_DIR: &str = "test-results";

/// Default bound for every wait, matching Playwright's standard timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Source of configuration values.
///
/// Implemented for the process environment and for plain maps, so tests can
/// inject values without mutating global state.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for HashMap<&'static str, &'static str> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.to_string())
    }
}

/// Browser engine to launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for BrowserKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "webkit" | "safari" => Ok(BrowserKind::Webkit),
            other => Err(Error::Config(format!(
                "E2E_BROWSER must be one of chromium, firefox, webkit (got '{}')",
                other
            ))),
        }
    }
}

/// Configuration shared by every suite in a run.
///
/// See [`HarnessConfig::from_env`] for the variables it reads.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub base_url: Url,
    pub state_dir: PathBuf,
    pub results_dir: PathBuf,
    pub browser: BrowserKind,
    pub headless: bool,
    pub timeout: Duration,
    pub slow_mo: Option<Duration>,
}

impl HarnessConfig {
    /// Reads configuration from the process environment.
    ///
    /// | variable | default |
    /// |---|---|
    /// | `E2E_BASE_URL` | `http://localhost:3000` |
    /// | `E2E_STATE_DIR` | `playwright/.auth` |
    /// | `E2E_RESULTS_DIR` | `test-results` |
    /// | `E2E_BROWSER` | `chromium` |
    /// | `E2E_HEADLESS` | `true` |
    /// | `E2E_TIMEOUT_MS` | `30000` |
    /// | `E2E_SLOW_MO_MS` | unset |
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the variable when a value is present
    /// but invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_source(&ProcessEnv)
    }

    /// Same as [`HarnessConfig::from_env`] with an injected source.
    pub fn from_source(env: &dyn EnvSource) -> Result<Self> {
        let base_url = non_empty(env, "E2E_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let base_url = Url::parse(&base_url).map_err(|e| {
            Error::Config(format!("E2E_BASE_URL '{}' is not a valid URL: {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "E2E_BASE_URL '{}' cannot be used as a base URL",
                base_url
            )));
        }

        let browser = match non_empty(env, "E2E_BROWSER") {
            Some(value) => value.parse()?,
            None => BrowserKind::default(),
        };

        let headless = match non_empty(env, "E2E_HEADLESS") {
            Some(value) => parse_bool("E2E_HEADLESS", &value)?,
            None => true,
        };

        let timeout = match non_empty(env, "E2E_TIMEOUT_MS") {
            Some(value) => Duration::from_millis(parse_millis("E2E_TIMEOUT_MS", &value)?),
            None => DEFAULT_TIMEOUT,
        };
        if timeout.is_zero() {
            return Err(Error::Config("E2E_TIMEOUT_MS must be greater than zero".into()));
        }

        let slow_mo = non_empty(env, "E2E_SLOW_MO_MS")
            .map(|value| parse_millis("E2E_SLOW_MO_MS", &value).map(Duration::from_millis))
            .transpose()?;

        Ok(Self {
            base_url,
            state_dir: non_empty(env, "E2E_STATE_DIR")
                .unwrap_or_else(|| DEFAULT_STATE_DIR.into())
                .into(),
            results_dir: non_empty(env, "E2E_RESULTS_DIR")
                .unwrap_or_else(|| DEFAULT_RESULTS_DIR.into())
                .into(),
            browser,
            headless,
            timeout,
            slow_mo,
        })
    }

    /// Configuration pointing at `base_url` with every other value defaulted.
    pub fn for_base_url(base_url: &str) -> Result<Self> {
        let mut env = HashMap::new();
        env.insert("E2E_BASE_URL".to_string(), base_url.to_string());
        Self::from_source(&env)
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins a route onto the base URL.
    ///
    /// Absolute URLs are returned unchanged.
    pub fn url(&self, route: &str) -> Result<String> {
        self.base_url
            .join(route)
            .map(String::from)
            .map_err(|e| Error::Config(format!("cannot join route '{}': {}", route, e)))
    }

    /// Origin of the base URL, as stored in Playwright storage state.
    pub fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }
}

fn non_empty(env: &dyn EnvSource, key: &str) -> Option<String> {
    env.var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{} must be a boolean (true/false/1/0/yes/no), got '{}'",
            key, value
        ))),
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value.parse::<u64>().map_err(|_| {
        Error::Config(format!(
            "{} must be a whole number of milliseconds, got '{}'",
            key, value
        ))
    })
}
