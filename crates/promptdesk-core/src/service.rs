//! Supervised service descriptions and lifecycle states.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Port the compiler backend listens on.
pub const DEFAULT_BACKEND_PORT: u16 = 8080;

/// Port the UI dev server listens on.
pub const DEFAULT_FRONTEND_PORT: u16 = 3000;

/// How long the backend may take to report healthy.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(90);

/// How long the frontend may take to report healthy.
pub const DEFAULT_FRONTEND_TIMEOUT: Duration = Duration::from_secs(120);

/// Interval between readiness polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Everything needed to launch and health-check one external process.
///
/// Constructed once at startup; the supervisor never mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    /// Human name used in logs and error messages ("Backend", "Frontend").
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Variables layered over the inherited environment.
    pub env: Vec<(String, String)>,
    pub health_url: String,
    pub readiness_timeout: Duration,
    /// Ports reclaimed before start and after shutdown.
    pub ports: Vec<u16>,
    /// What the user should do when this service fails to start.
    pub remediation: String,
    /// Launch through the platform shell (`sh -c` / `cmd /C`).
    pub shell: bool,
    /// Re-emit child stdout/stderr through the log.
    pub forward_output: bool,
}

impl ServiceSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            working_dir: PathBuf::from("."),
            env: Vec::new(),
            health_url: String::new(),
            readiness_timeout: DEFAULT_BACKEND_TIMEOUT,
            ports: Vec::new(),
            remediation: String::new(),
            shell: false,
            forward_output: false,
        }
    }

    /// The compiler backend (uvicorn) rooted at `<root>/core`.
    #[must_use]
    pub fn backend(root: &Path) -> Self {
        Self::new("Backend", "python")
            .with_args([
                "-m",
                "uvicorn",
                "api.main:app",
                "--host",
                "127.0.0.1",
                "--port",
                "8080",
            ])
            .with_working_dir(root.join("core"))
            .with_health_url(format!("http://127.0.0.1:{DEFAULT_BACKEND_PORT}/health"))
            .with_readiness_timeout(DEFAULT_BACKEND_TIMEOUT)
            .with_ports([DEFAULT_BACKEND_PORT])
            .with_remediation("Install the dependencies in core/requirements.txt.")
            .with_shell(true)
    }

    /// The UI dev server rooted at `<root>/core/web`.
    #[must_use]
    pub fn frontend(root: &Path) -> Self {
        Self::new("Frontend", "npm")
            .with_args(["run", "dev", "--", "--port", "3000"])
            .with_working_dir(root.join("core").join("web"))
            .with_health_url(format!("http://127.0.0.1:{DEFAULT_FRONTEND_PORT}"))
            .with_readiness_timeout(DEFAULT_FRONTEND_TIMEOUT)
            .with_ports([DEFAULT_FRONTEND_PORT])
            .with_remediation("Run npm install inside core/web.")
            .with_shell(true)
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_health_url(mut self, url: impl Into<String>) -> Self {
        self.health_url = url.into();
        self
    }

    #[must_use]
    pub const fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.ports = ports.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_remediation(mut self, hint: impl Into<String>) -> Self {
        self.remediation = hint.into();
        self
    }

    #[must_use]
    pub const fn with_shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    #[must_use]
    pub const fn with_forward_output(mut self, forward: bool) -> Self {
        self.forward_output = forward;
        self
    }

    /// Program and arguments joined into a single shell command line.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Prefix used when forwarding child output, e.g. `[web]`.
    #[must_use]
    pub fn log_prefix(&self) -> String {
        let base = self
            .working_dir
            .file_name()
            .map_or_else(|| self.name.clone(), |n| n.to_string_lossy().into_owned());
        format!("[{base}]")
    }
}

/// Lifecycle of one supervised service.
///
/// `NotStarted → Starting → Ready → Stopped`, or `Starting → Failed`.
/// `Failed` and `Stopped` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum ServiceState {
    NotStarted,
    Starting,
    Ready,
    Failed(String),
    Stopped,
}

impl ServiceState {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether moving from `self` to `next` is a legal single step.
    #[must_use]
    pub const fn can_transition_to(&self, next: &Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::Starting)
                | (Self::Starting, Self::Ready | Self::Failed(_))
                | (Self::Ready, Self::Stopped)
        )
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Starting => write!(f, "starting"),
            Self::Ready => write!(f, "ready"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_preset() {
        let spec = ServiceSpec::backend(Path::new("/opt/app"));
        assert_eq!(spec.working_dir, Path::new("/opt/app/core"));
        assert_eq!(spec.health_url, "http://127.0.0.1:8080/health");
        assert_eq!(spec.readiness_timeout, Duration::from_secs(90));
        assert_eq!(spec.ports, vec![8080]);
        assert!(spec.shell);
        assert_eq!(
            spec.command_line(),
            "python -m uvicorn api.main:app --host 127.0.0.1 --port 8080"
        );
    }

    #[test]
    fn frontend_preset_prefix() {
        let spec = ServiceSpec::frontend(Path::new("/opt/app"));
        assert_eq!(spec.readiness_timeout, Duration::from_secs(120));
        assert_eq!(spec.log_prefix(), "[web]");
    }

    #[test]
    fn transitions_never_skip_states() {
        use ServiceState::{Failed, NotStarted, Ready, Starting, Stopped};

        assert!(NotStarted.can_transition_to(&Starting));
        assert!(Starting.can_transition_to(&Ready));
        assert!(Starting.can_transition_to(&Failed("x".into())));
        assert!(Ready.can_transition_to(&Stopped));

        assert!(!NotStarted.can_transition_to(&Ready));
        assert!(!NotStarted.can_transition_to(&Stopped));
        assert!(!Failed("x".into()).can_transition_to(&Stopped));
        assert!(!Stopped.can_transition_to(&Starting));
    }
}
