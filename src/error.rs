use std::fmt;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

/// Failures raised by service adapters and the readiness poller.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A dependency has not produced its RPC descriptor yet.
    #[error("{service}: dependency {dependency} is not resolved")]
    DependencyUnresolved {
        service: String,
        dependency: &'static str,
    },

    /// A health probe failed in a way that is not a known transient condition.
    #[error("{service}: {message}")]
    ProbeFatal { service: String, message: String },

    /// The container is missing or has exited; never retried.
    #[error("{service}: {status}")]
    ContainerTerminal { service: String, status: String },

    #[error("service not found: {0}")]
    UnknownService(String),

    /// The service kind does not exist on the selected network.
    #[error("service {service} is not available on {network}")]
    Forbidden { service: String, network: String },
}

/// Failures of the wallet bootstrap calls against the gateway.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Gateway answered with a non-success status.
    #[error("[http {status}] {message}")]
    Rejected { status: u16, message: String },

    #[error("[http {status}] decode error: {reason}")]
    Undecodable { status: u16, reason: String },

    #[error("failed to create default password marker: {0}")]
    Marker(#[source] std::io::Error),
}

/// A command executed inside a container exited with a non-zero code.
#[derive(Error, Debug, Clone)]
#[error("command \"{command}\" exits with non-zero code {exit_code}: {}", .output.trim())]
pub struct ExecError {
    pub command: String,
    pub exit_code: i32,
    /// Combined stdout and stderr.
    pub output: String,
}

/// Lifecycle phase an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Gen,
    Pull,
    UpProxy,
    UpLayer2,
    UpXud,
    UpBoltz,
    StopBoltz,
    StopXud,
    StopLayer2,
    StopProxy,
    Down,
    FinalCleanup,
    BackupTo,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gen => "generate files",
            Self::Pull => "pull",
            Self::UpProxy => "up proxy",
            Self::UpLayer2 => "up layer2",
            Self::UpXud => "up xud",
            Self::UpBoltz => "up boltz",
            Self::StopBoltz => "stop boltz",
            Self::StopXud => "stop xud",
            Self::StopLayer2 => "stop layer2",
            Self::StopProxy => "stop proxy",
            Self::Down => "down",
            Self::FinalCleanup => "final cleanup",
            Self::BackupTo => "backup to",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Cancellation observed at a suspension point.
    #[error("interrupted")]
    Interrupted,

    #[error("no such container: {0}")]
    NoSuchContainer(String),

    #[error("{phase}: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<Error>,
    },

    #[error("[run] {command}: {message}")]
    Command { command: String, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap this error with the lifecycle phase it surfaced in.
    #[must_use]
    pub fn in_phase(self, phase: Phase) -> Self {
        Error::Phase {
            phase,
            source: Box::new(self),
        }
    }

    /// True when the error, or the error it wraps, is a cancellation.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        match self {
            Error::Interrupted => true,
            Error::Phase { source, .. } => source.is_interrupted(),
            _ => false,
        }
    }

    /// True when the container runtime reported the target as absent.
    #[must_use]
    pub fn is_no_such_container(&self) -> bool {
        match self {
            Error::NoSuchContainer(_) => true,
            Error::Phase { source, .. } => source.is_no_such_container(),
            _ => false,
        }
    }
}

/// Extension for tagging results with a lifecycle phase.
pub trait PhaseExt<T> {
    fn phase(self, phase: Phase) -> Result<T>;
}

impl<T> PhaseExt<T> for Result<T> {
    fn phase(self, phase: Phase) -> Result<T> {
        self.map_err(|err| err.in_phase(phase))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(Box::new(err))
    }
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        // dialoguer::Error wraps an IO error
        Error::Io(std::io::Error::other(err.to_string()))
    }
}
