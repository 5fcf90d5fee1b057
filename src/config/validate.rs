// src/config/validate.rs

use std::collections::HashSet;

use anyhow::{anyhow, Result};
use tracing::warn;

use crate::config::model::{BatchConfig, ConfigFile};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one batch, and no batch is empty
/// - step IDs are unique within each batch
/// - no step depends on itself
///
/// Unknown `upstream`/`downstream` references only produce a warning; the
/// engine silently ignores them by contract. Cycles are also not checked
/// here — they are a runtime concern with defined fallback behaviour.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_batches(cfg)?;

    for (name, batch) in cfg.batch.iter() {
        validate_batch(name, batch)?;
    }

    Ok(())
}

fn ensure_has_batches(cfg: &ConfigFile) -> Result<()> {
    if cfg.batch.is_empty() {
        return Err(anyhow!(
            "config must contain at least one [batch.<name>] section"
        ));
    }
    Ok(())
}

fn validate_batch(name: &str, batch: &BatchConfig) -> Result<()> {
    if batch.step.is_empty() {
        return Err(anyhow!("batch '{}' has no steps", name));
    }

    let mut ids: HashSet<&str> = HashSet::new();
    for step in &batch.step {
        if !ids.insert(step.id.as_str()) {
            return Err(anyhow!(
                "batch '{}' has duplicate step ID '{}'",
                name,
                step.id
            ));
        }
    }

    for step in &batch.step {
        let deps: Vec<String> = step
            .upstream
            .to_vec()
            .into_iter()
            .chain(step.downstream.to_vec())
            .collect();

        for dep in &deps {
            if dep == &step.id {
                return Err(anyhow!(
                    "step '{}' in batch '{}' cannot depend on itself",
                    step.id,
                    name
                ));
            }
            if !ids.contains(dep.as_str()) {
                warn!(
                    batch = %name,
                    step = %step.id,
                    reference = %dep,
                    "dependency reference to unknown step; it will be ignored"
                );
            }
        }
    }

    Ok(())
}
