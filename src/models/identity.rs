//! Process identity: the `(job, rank)` pair assigned at admission.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ErrorCode;
use crate::{AppError, Result};

/// Identifier of a job, the set of processes launched together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u32);

impl JobId {
    /// Sentinel for an unassigned job.
    pub const INVALID: Self = Self(u32::MAX);
    /// Sentinel matching every job.
    pub const WILDCARD: Self = Self(u32::MAX - 1);

    /// Render the job for use as a session-directory component.
    ///
    /// # Errors
    ///
    /// Returns `ErrorCode::BadParam` for the invalid and wildcard sentinels,
    /// which never name a real directory.
    pub fn to_path_string(self) -> Result<String> {
        match self {
            Self::INVALID | Self::WILDCARD => Err(AppError::component(
                ErrorCode::BadParam,
                format!("job {self} cannot name a session directory"),
            )),
            Self(raw) => Ok(raw.to_string()),
        }
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::INVALID => f.write_str("INVALID"),
            Self::WILDCARD => f.write_str("WILDCARD"),
            Self(raw) => write!(f, "{raw}"),
        }
    }
}

/// Rank of a process within its job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(pub u32);

impl Rank {
    /// Sentinel for an unassigned rank.
    pub const INVALID: Self = Self(u32::MAX);
    /// Sentinel matching every rank.
    pub const WILDCARD: Self = Self(u32::MAX - 1);

    /// Render the rank for use as a session-directory component.
    ///
    /// # Errors
    ///
    /// Returns `ErrorCode::BadParam` for the invalid and wildcard sentinels.
    pub fn to_path_string(self) -> Result<String> {
        match self {
            Self::INVALID | Self::WILDCARD => Err(AppError::component(
                ErrorCode::BadParam,
                format!("rank {self} cannot name a session directory"),
            )),
            Self(raw) => Ok(raw.to_string()),
        }
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::INVALID => f.write_str("INVALID"),
            Self::WILDCARD => f.write_str("WILDCARD"),
            Self(raw) => write!(f, "{raw}"),
        }
    }
}

/// Immutable `(job, rank)` identity of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessIdentity {
    /// Owning job.
    pub job: JobId,
    /// Rank within the job.
    pub rank: Rank,
}

impl ProcessIdentity {
    /// Identity with both fields unassigned.
    pub const INVALID: Self = Self {
        job: JobId::INVALID,
        rank: Rank::INVALID,
    };

    /// Construct an identity from raw values.
    #[must_use]
    pub fn new(job: u32, rank: u32) -> Self {
        Self {
            job: JobId(job),
            rank: Rank(rank),
        }
    }

    /// The head node process always runs as rank 0 of job 0.
    #[must_use]
    pub fn hnp() -> Self {
        Self::new(0, 0)
    }

    /// Whether both fields hold real values.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !matches!(self.job, JobId::INVALID | JobId::WILDCARD)
            && !matches!(self.rank, Rank::INVALID | Rank::WILDCARD)
    }
}

impl Display for ProcessIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.job, self.rank)
    }
}

/// Parses `job.rank`, the form used in contact URIs and on the command line.
impl FromStr for ProcessIdentity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let (job, rank) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| AppError::Config(format!("identity `{s}` is not in job.rank form")))?;
        let job = job
            .parse::<u32>()
            .map_err(|err| AppError::Config(format!("invalid job in `{s}`: {err}")))?;
        let rank = rank
            .parse::<u32>()
            .map_err(|err| AppError::Config(format!("invalid rank in `{s}`: {err}")))?;
        Ok(Self::new(job, rank))
    }
}
