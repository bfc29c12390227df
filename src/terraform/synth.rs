//! Write a validated stack to disk as `cdk.tf.json`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::graph::{Stack, Waves};
use crate::error::{Result, StackError};

/// File name of the synthesized configuration inside the stack directory.
pub const CONFIG_FILE: &str = "cdk.tf.json";

/// Result of a synthesis run.
#[derive(Debug, Clone)]
pub struct SynthReport {
    pub config_path: PathBuf,
    pub block_count: usize,
    pub waves: Waves,
}

/// Directory the stack is written to: `<out_dir>/stacks/<stack>`.
pub fn stack_dir(out_dir: &Path, stack: &Stack) -> PathBuf {
    out_dir.join("stacks").join(stack.name())
}

/// Validate the stack and write its configuration and assets under `out_dir`.
pub fn synth(stack: &Stack, out_dir: &Path) -> Result<SynthReport> {
    let waves = stack.validate()?;

    let dir = stack_dir(out_dir, stack);
    fs::create_dir_all(&dir).map_err(|source| StackError::Write {
        path: dir.clone(),
        source,
    })?;

    let config_path = dir.join(CONFIG_FILE);
    let rendered =
        serde_json::to_string_pretty(&stack.to_json()).map_err(StackError::Render)?;
    write_file(&config_path, &rendered)?;

    for (relative, contents) in stack.assets() {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StackError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        write_file(&path, contents)?;
        debug!(asset = %path.display(), "Wrote asset");
    }

    info!(
        stack = stack.name(),
        path = %config_path.display(),
        blocks = stack.len(),
        waves = waves.len(),
        "Synthesized stack"
    );

    Ok(SynthReport {
        config_path,
        block_count: stack.len(),
        waves,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| StackError::Write {
        path: path.to_path_buf(),
        source,
    })
}
