//! Unified Error Model
use thiserror::Error;

/// Allocation failures reported by an [`Executor`](crate::executor::Executor).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("worker limit reached ({0} live)")]
    WorkerLimit(usize),

    #[error("channel limit reached ({0} open)")]
    ChannelLimit(usize),

    #[error("no runtime available: {0}")]
    NoRuntime(String),
}

#[derive(Error, Debug)]
pub enum SieveError {
    #[error("RESOURCE/channel for candidate {candidate}: {source}")]
    ChannelCreation {
        candidate: u32,
        #[source]
        source: ResourceError,
    },

    #[error("RESOURCE/spawn for candidate {candidate}: {source}")]
    Spawn {
        candidate: u32,
        #[source]
        source: ResourceError,
    },

    #[error("WRITE/downstream closed while forwarding {candidate}")]
    DownstreamClosed { candidate: u32 },

    #[error("WRITE/output of prime {prime}: {source}")]
    Output {
        prime: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("PROTOCOL/{0}")]
    Protocol(String),

    #[error("CONFIG/{0}")]
    Config(String),

    #[error("WORKER/stage {prime} did not finish: {message}")]
    WorkerPanicked { prime: u32, message: String },
}

/// Coarse classification of a [`SieveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ResourceExhaustion,
    WriteFailure,
    ProtocolViolation,
    Config,
    WorkerPanic,
}

impl SieveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ChannelCreation { .. } | Self::Spawn { .. } => ErrorKind::ResourceExhaustion,
            Self::DownstreamClosed { .. } | Self::Output { .. } => ErrorKind::WriteFailure,
            Self::Protocol(_) => ErrorKind::ProtocolViolation,
            Self::Config(_) => ErrorKind::Config,
            Self::WorkerPanicked { .. } => ErrorKind::WorkerPanic,
        }
    }

    /// The candidate value that was in flight when the error occurred, if any.
    pub fn candidate(&self) -> Option<u32> {
        match self {
            Self::ChannelCreation { candidate, .. }
            | Self::Spawn { candidate, .. }
            | Self::DownstreamClosed { candidate } => Some(*candidate),
            Self::Output { prime, .. } | Self::WorkerPanicked { prime, .. } => Some(*prime),
            Self::Protocol(_) | Self::Config(_) => None,
        }
    }
}
