use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::EyenetError;

/// Experimental paradigm of an EEGEYENET recording.
///
/// The dataset ships two paradigms: the large-grid dots task and the
/// antisaccade task. The task determines both the catalog subset and the
/// archive naming convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Task {
    #[default]
    Dots,
    #[serde(rename = "AS")]
    #[value(name = "as")]
    Antisaccade,
}

impl Task {
    pub fn label(self) -> &'static str {
        match self {
            Task::Dots => "DOTS",
            Task::Antisaccade => "AS",
        }
    }

    /// Derive the task from the subject naming scheme.
    ///
    /// `EP*` subjects belong to the dots task; `A*` and `B*` subjects to the
    /// antisaccade task. Any other prefix is not part of the dataset.
    pub fn for_subject(subject: &SubjectId) -> Result<Task, EyenetError> {
        let id = subject.as_str();
        if id.starts_with("EP") {
            return Ok(Task::Dots);
        }
        if id.starts_with('A') || id.starts_with('B') {
            return Ok(Task::Antisaccade);
        }
        Err(EyenetError::UnknownTaskPrefix(id.to_string()))
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Task {
    type Err = EyenetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "DOTS" => Ok(Task::Dots),
            "AS" | "ANTISACCADE" => Ok(Task::Antisaccade),
            _ => Err(EyenetError::InvalidTask(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubjectId {
    type Err = EyenetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let is_valid = !normalized.is_empty()
            && normalized.len() <= 8
            && normalized.chars().all(|ch| ch.is_ascii_alphanumeric());
        if !is_valid {
            return Err(EyenetError::InvalidSubjectId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Run number within one subject's recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Run(u32);

impl Run {
    pub fn number(self) -> u32 {
        self.0
    }
}

impl From<u32> for Run {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Run {
    type Err = EyenetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| EyenetError::InvalidRun(value.to_string()))
    }
}
