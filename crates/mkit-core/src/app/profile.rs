//! TaskProfile - task configuration loaded from a JSON file.
//!
//! Every field is optional. A profile is applied on top of what the builder
//! already holds (see `TaskBuilder::apply_profile`).
//!
//! ```json
//! {
//!   "verbosity": 2,
//!   "output_filepath": "report.njson",
//!   "options": { "server": "ndt.example.org", "port": 3001 },
//!   "annotations": { "scope": "example" },
//!   "inputs": ["https://www.example.org/"]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::domain::settings::Scalar;
use crate::domain::task_kind::TaskKind;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskProfile {
    pub verbosity: Option<u64>,
    pub output_filepath: Option<String>,
    pub log_filepath: Option<String>,
    pub options: BTreeMap<String, Scalar>,
    pub annotations: BTreeMap<String, Scalar>,
    pub inputs: Vec<String>,
    pub input_filepaths: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("cannot read profile {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile")]
    Parse(#[from] serde_json::Error),

    #[error("task `{0}` does not take inputs")]
    InputsNotAccepted(TaskKind),
}

impl TaskProfile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }
}

impl FromStr for TaskProfile {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}
