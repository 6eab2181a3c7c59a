use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment phase, derived from the facts recorded on an
/// [`ArchiveDeployment`](crate::deployment::ArchiveDeployment).
///
/// Each variant fixes the five facets (verified, prepared, deployed, failed,
/// ready); the predicates below are the only way those facets are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentPhase {
    /// No verified source yet
    NotStarted,
    /// Source archive or expanded location is known
    Verified,
    /// Content, class loader, specifications, sniffers and owning module assigned
    Prepared,
    /// Owning module registered the deployment
    Deployed,
    /// Registration raised an error
    Failed,
    /// Application signalled it can serve requests
    Ready,
}

/// Observed facts a phase is resolved from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseFacts {
    pub verified: bool,
    pub prepared: bool,
    pub registered: bool,
    pub failed: bool,
    pub ready: bool,
}

impl DeploymentPhase {
    /// Resolve the phase from observed facts.
    ///
    /// Verification gates everything: a deployment whose source was cleared
    /// is `NotStarted` regardless of what happened before. Failure wins over
    /// registration and readiness once the deployment is prepared.
    pub fn resolve(facts: PhaseFacts) -> Self {
        if !facts.verified {
            return Self::NotStarted;
        }
        if !facts.prepared {
            return Self::Verified;
        }
        if facts.failed {
            return Self::Failed;
        }
        match (facts.registered, facts.ready) {
            (true, true) => Self::Ready,
            (true, false) => Self::Deployed,
            (false, _) => Self::Prepared,
        }
    }

    pub fn is_verified(&self) -> bool {
        !matches!(self, Self::NotStarted)
    }

    pub fn is_prepared(&self) -> bool {
        matches!(
            self,
            Self::Prepared | Self::Deployed | Self::Failed | Self::Ready
        )
    }

    pub fn is_deployed(&self) -> bool {
        matches!(self, Self::Deployed | Self::Ready)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Check if no further transition is expected without new input
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Ready)
    }
}

impl fmt::Display for DeploymentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Verified => write!(f, "verified"),
            Self::Prepared => write!(f, "prepared"),
            Self::Deployed => write!(f, "deployed"),
            Self::Failed => write!(f, "failed"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

impl std::str::FromStr for DeploymentPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "verified" => Ok(Self::Verified),
            "prepared" => Ok(Self::Prepared),
            "deployed" => Ok(Self::Deployed),
            "failed" => Ok(Self::Failed),
            "ready" => Ok(Self::Ready),
            _ => Err(format!("Invalid deployment phase: {s}")),
        }
    }
}

impl Default for DeploymentPhase {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// Lifecycle state of a [`ModuleScheduler`](crate::orchestration::ModuleScheduler)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// Created, no module set resolved yet
    NotInitialized,
    /// Module set resolved and the startup graph validated
    Ready,
    /// Every module in the graph started
    Running,
    /// Completion stack drained
    Stopped,
    /// A module failed to start; start re-reports the failure
    Failed,
}

impl SchedulerState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Check if a start attempt may run modules from this state
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Ready | Self::Stopped)
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "not_initialized"),
            Self::Ready => write!(f, "ready"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::NotInitialized
    }
}
