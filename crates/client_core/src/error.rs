use thiserror::Error;

/// Error raised by a transport collaborator. `Cancelled` is reported when the
/// cancellation token handed to the transport fired before a response arrived.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request cancelled")]
    Cancelled,
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl TransportError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server understood the request and reported a domain error.
    Application,
    /// Network, status or decoding failure.
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Result descriptor returned by every controller intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded { total_items: u64, message: String },
    Failed(FetchFailure),
    /// A newer intent replaced this one before its result could be committed.
    Superseded,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Superseded)
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Loaded { message, .. } => Some(message),
            Self::Failed(failure) => Some(&failure.message),
            Self::Superseded => None,
        }
    }
}

/// Result descriptor of a dialog action such as a delete confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub success: bool,
    pub aborted: bool,
    pub message: String,
}

impl ActionOutcome {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            aborted: false,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            aborted: false,
            message: message.into(),
        }
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self {
            success: false,
            aborted: true,
            message: message.into(),
        }
    }
}
