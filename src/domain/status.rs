//! Service status ladder.
//!
//! Statuses are derived on demand from the container runtime and the
//! kind-specific health probe. They are never persisted and the ladder is not
//! monotonic: a service may fall back from `Ready` to `Starting...` after an
//! external restart.

use std::fmt;

/// Downward bias applied to every reported sync percentage.
///
/// Keeps an in-progress sync from rendering as `100.00%` before the daemon
/// reports completion.
pub const SYNC_PERCENT_BIAS: f64 = 0.005;

/// Percentage at which a sync is rendered as `99.99%` or above.
pub const NEARLY_SYNCED_PERCENT: f64 = 99.985;

/// Block-height progress of a syncing daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncProgress {
    current: u64,
    target: u64,
}

impl SyncProgress {
    /// Create progress from the current and target heights.
    ///
    /// A target below the current height is raised to the current height.
    #[must_use]
    pub fn new(current: u64, target: u64) -> Self {
        Self {
            current,
            target: target.max(current),
        }
    }

    #[must_use]
    pub const fn current(&self) -> u64 {
        self.current
    }

    #[must_use]
    pub const fn target(&self) -> u64 {
        self.target
    }

    /// Biased percentage, clamped at zero.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.target == 0 {
            return 0.0;
        }
        let raw = self.current as f64 / self.target as f64 * 100.0;
        if raw > SYNC_PERCENT_BIAS {
            raw - SYNC_PERCENT_BIAS
        } else {
            0.0
        }
    }

    /// True when the current height has reached a known, non-zero target.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.target > 0 && self.current >= self.target
    }

    /// True when the progress renders as at least `99.99%`.
    #[must_use]
    pub fn is_nearly_synced(&self) -> bool {
        self.is_complete() || self.percent() >= NEARLY_SYNCED_PERCENT
    }
}

impl fmt::Display for SyncProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Syncing {:.2}% ({}/{})",
            self.percent(),
            self.current,
            self.target
        )
    }
}

/// One rung of a service's status ladder.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    /// No container exists for the service.
    ContainerMissing,
    /// The container exists but has exited.
    ContainerExited,
    /// Any other coarse container state (`created`, `restarting`, ...).
    Container(String),
    Starting,
    Syncing(SyncProgress),
    /// Order-matching daemon has no key material yet.
    WalletMissing,
    WalletLocked,
    /// Order-matching daemon waits for the named dependencies.
    WaitingFor(Vec<String>),
    WaitingForChannels,
    Ready,
    /// The service is disabled in the current configuration.
    Disabled,
    /// Kind-specific free text.
    Other(String),
}

impl Status {
    /// Map a coarse container state reported by the runtime.
    #[must_use]
    pub fn from_container_state(state: &str) -> Self {
        match state {
            "exited" => Self::ContainerExited,
            other => Self::Container(other.to_string()),
        }
    }

    /// Missing and exited containers end a readiness poll with failure.
    #[must_use]
    pub const fn is_container_terminal(&self) -> bool {
        matches!(self, Self::ContainerMissing | Self::ContainerExited)
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainerMissing => f.write_str("Container missing"),
            Self::ContainerExited => f.write_str("Container exited"),
            Self::Container(state) => write!(f, "Container {state}"),
            Self::Starting => f.write_str("Starting..."),
            Self::Syncing(progress) => progress.fmt(f),
            Self::WalletMissing => f.write_str("Wallet missing. Create with xucli create/restore."),
            Self::WalletLocked => f.write_str("Wallet locked. Unlock with xucli unlock."),
            Self::WaitingFor(names) => write!(f, "Waiting for {}", names.join(", ")),
            Self::WaitingForChannels => f.write_str("Waiting for channels"),
            Self::Ready => f.write_str("Ready"),
            Self::Disabled => f.write_str("Disabled"),
            Self::Other(text) => f.write_str(text),
        }
    }
}
