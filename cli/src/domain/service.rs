//! Service identity, derived installation state, credential validation,
//! and unit-file rendering.

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::error::LifecycleError;

/// Fixed production identity of the managed service.
pub const SERVICE_NAME: &str = "panelbot";

/// Fixed remote source of the managed service.
pub const SERVICE_REPO: &str = "https://github.com/panelbot/panelbot.git";

/// Immutable identity of the one managed service.
///
/// Constructed once at startup and passed by reference to every component.
/// Changing any field means the old installation is a different entity;
/// there is no migration path by design.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// Service name; also the systemd unit base name.
    pub name: String,
    /// Git remote the local tree is cloned from.
    pub repo_url: String,
    /// Local tree root. The venv and config artifact live under it.
    pub install_dir: PathBuf,
    /// Directory holding the systemd unit file.
    pub unit_dir: PathBuf,
    /// Entry point relative to `install_dir`.
    pub entry_point: String,
    /// Dependency manifest relative to `install_dir`.
    pub manifest: String,
}

impl ServiceDescriptor {
    /// The production descriptor: `/opt/panelbot` supervised as
    /// `panelbot.service`.
    #[must_use]
    pub fn production() -> Self {
        Self {
            name: SERVICE_NAME.to_string(),
            repo_url: SERVICE_REPO.to_string(),
            install_dir: PathBuf::from("/opt").join(SERVICE_NAME),
            unit_dir: PathBuf::from("/etc/systemd/system"),
            entry_point: "bot.py".to_string(),
            manifest: "requirements.txt".to_string(),
        }
    }

    /// Full systemd unit name, e.g. `panelbot.service`.
    #[must_use]
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.name)
    }

    /// Path of the installed unit file.
    #[must_use]
    pub fn unit_path(&self) -> PathBuf {
        self.unit_dir.join(self.unit_name())
    }

    /// Root of the isolated runtime environment.
    #[must_use]
    pub fn venv_dir(&self) -> PathBuf {
        self.install_dir.join("venv")
    }

    /// Interpreter inside the isolated runtime environment.
    #[must_use]
    pub fn venv_python(&self) -> PathBuf {
        self.venv_dir().join("bin").join("python")
    }

    /// Package installer inside the isolated runtime environment.
    #[must_use]
    pub fn venv_pip(&self) -> PathBuf {
        self.venv_dir().join("bin").join("pip")
    }

    /// The config artifact holding credentials, referenced from the unit
    /// via `EnvironmentFile=`.
    #[must_use]
    pub fn env_file(&self) -> PathBuf {
        self.install_dir.join(".env")
    }

    /// Absolute path of the service entry point.
    #[must_use]
    pub fn entry_path(&self) -> PathBuf {
        self.install_dir.join(&self.entry_point)
    }

    /// Absolute path of the dependency manifest.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.install_dir.join(&self.manifest)
    }
}

/// Installation state derived from ground truth.
///
/// Never cached: every operation re-derives this from filesystem and
/// supervisor probes before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationState {
    /// No local tree.
    Absent,
    /// Tree present, runtime environment missing.
    Cloned,
    /// Runtime environment present, no unit installed.
    Provisioned,
    /// Unit installed, supervisor state unknown.
    Registered,
    /// Supervisor reports the unit active.
    Running,
    /// Supervisor reports the unit inactive or failed.
    Stopped,
}

impl InstallationState {
    /// Display string for the menu header.
    #[must_use]
    pub fn display(self) -> &'static str {
        match self {
            Self::Absent => "not installed",
            Self::Cloned => "source synced, not provisioned",
            Self::Provisioned => "provisioned, not registered",
            Self::Registered => "registered, state unknown",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

/// Operator-supplied secrets persisted by the config store.
///
/// The token is deliberately excluded from `Debug` output so credentials
/// can never leak through error context or logs.
#[derive(Clone)]
pub struct Credentials {
    /// Bearer token the service authenticates with.
    pub token: String,
    /// Numeric operator identity (may be negative for group chats).
    pub operator_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("operator_id", &self.operator_id)
            .finish()
    }
}

impl Credentials {
    /// Render the credentials as the `KEY=VALUE` artifact body.
    #[must_use]
    pub fn to_env_file(&self) -> String {
        format!("TOKEN={}\nADMIN_ID={}\n", self.token, self.operator_id)
    }
}

/// Validate a bearer token: must be non-blank after trimming.
///
/// # Errors
///
/// Returns `InvalidInput` for a blank token.
pub fn validate_token(raw: &str) -> Result<String, LifecycleError> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(LifecycleError::InvalidInput(
            "token must not be empty".to_string(),
        ));
    }
    Ok(token.to_string())
}

#[allow(clippy::expect_used)] // literal pattern, cannot fail
fn operator_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+$").expect("valid literal regex"))
}

/// Validate an operator identity: a signed integer, e.g. `42` or `-42`.
///
/// # Errors
///
/// Returns `InvalidInput` when the value is not a signed integer.
pub fn validate_operator_id(raw: &str) -> Result<String, LifecycleError> {
    let id = raw.trim();
    if !operator_id_pattern().is_match(id) {
        return Err(LifecycleError::InvalidInput(format!(
            "operator id must be a signed integer, got '{id}'"
        )));
    }
    Ok(id.to_string())
}

/// Render the systemd unit text for a descriptor.
///
/// Pure function of the descriptor: regenerated whole on every install so
/// the installed unit can never drift from current provisioning state.
/// Credentials are referenced only through `EnvironmentFile=`; rotating
/// them never requires re-registration.
#[must_use]
pub fn render_unit(desc: &ServiceDescriptor) -> String {
    format!(
        "[Unit]\n\
         Description={name} service\n\
         After=network-online.target\n\
         Wants=network-online.target\n\
         \n\
         [Service]\n\
         Type=simple\n\
         WorkingDirectory={workdir}\n\
         EnvironmentFile={env_file}\n\
         ExecStart={python} {entry}\n\
         Restart=always\n\
         RestartSec=5\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        name = desc.name,
        workdir = desc.install_dir.display(),
        env_file = desc.env_file().display(),
        python = desc.venv_python().display(),
        entry = desc.entry_path().display(),
    )
}
