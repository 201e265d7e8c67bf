pub mod token;
pub mod llm;
pub mod postprocess;
pub(crate) mod prompt_processing;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Write `text` to `path`, creating missing parent directories and replacing any existing file.
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}
