// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::exec::Step;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [batch.deploy]
///
/// [[batch.deploy.step]]
/// id = "lib"
/// cmd = "git pull && make"
/// dir = "libs/core"
///
/// [[batch.deploy.step]]
/// id = "api"
/// cmd = "git pull && make deploy"
/// dir = "services/api"
/// upstream = "lib"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// All batches from `[batch.<name>]`. Keys are the batch names.
    #[serde(default)]
    pub batch: BTreeMap<String, BatchConfig>,
}

/// One `[batch.<name>]` section: an ordered list of steps.
///
/// The list order matters: it is the fallback execution order when the
/// dependency graph turns out to be cyclic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub step: Vec<StepConfig>,
}

/// One `[[batch.<name>.step]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    /// Unique step ID within the batch; also the dependency key.
    pub id: String,

    /// The command to execute.
    pub cmd: String,

    /// Working directory for the command, relative to where `repodag` runs.
    /// Typically the repository this step operates on.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Steps that must finish before this one. A single string or an array.
    #[serde(default)]
    pub upstream: OneOrMany,

    /// Steps that wait for this one. A single string or an array.
    #[serde(default)]
    pub downstream: OneOrMany,
}

/// A dependency reference that may be written as a scalar or an array in
/// TOML; both normalize to a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(id) => vec![id.clone()],
            OneOrMany::Many(ids) => ids.clone(),
        }
    }
}

impl StepConfig {
    /// Convert to the engine's step descriptor.
    pub fn to_step(&self) -> Step {
        Step {
            id: self.id.clone(),
            cmd: self.cmd.clone(),
            dir: self.dir.clone(),
            upstream: self.upstream.to_vec(),
            downstream: self.downstream.to_vec(),
        }
    }
}

impl BatchConfig {
    /// Engine step descriptors for this batch, in config order.
    pub fn to_steps(&self) -> Vec<Step> {
        self.step.iter().map(StepConfig::to_step).collect()
    }
}
