//! Output file placement for tools that write files.
//!
//! Relative paths are joined to a root directory; absolute paths are used as
//! given.  A confined root additionally refuses any path that resolves outside
//! it (e.g. `../../etc/passwd`).  Writes replace any existing file.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{AdapterError, Result};

/// Root directory for generated files.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
    confined: bool,
}

impl OutputDir {
    /// Relative paths land under `root`; everything else is written where the
    /// caller says.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: absolute_root(root.into()),
            confined: false,
        }
    }

    /// Like [`OutputDir::new`], but paths that escape `root` are refused.
    pub fn confined(root: impl Into<PathBuf>) -> Self {
        Self {
            root: absolute_root(root.into()),
            confined: true,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_confined(&self) -> bool {
        self.confined
    }

    /// Resolve `raw_path` against the root.  When confined, reject anything
    /// that escapes it.
    pub fn resolve(&self, raw_path: &str, tool_name: &str) -> Result<PathBuf> {
        if raw_path.trim().is_empty() {
            return Err(AdapterError::InvalidParams {
                tool_name: tool_name.to_string(),
                reason: "output path must not be empty".into(),
            });
        }

        let candidate = if Path::new(raw_path).is_absolute() {
            PathBuf::from(raw_path)
        } else {
            self.root.join(raw_path)
        };
        if !self.confined {
            return Ok(candidate);
        }

        let root = normalize_path(&self.root);
        if matches!(root.components().next(), Some(Component::ParentDir)) {
            return Err(AdapterError::InvalidParams {
                tool_name: tool_name.to_string(),
                reason: format!("output directory `{}` cannot be resolved", self.root.display()),
            });
        }

        let normalized = normalize_path(&candidate);
        if !normalized.starts_with(&root) || normalized == root {
            return Err(AdapterError::InvalidParams {
                tool_name: tool_name.to_string(),
                reason: format!(
                    "path `{raw_path}` resolves to `{}` which is outside the output directory `{}`",
                    normalized.display(),
                    root.display(),
                ),
            });
        }

        Ok(normalized)
    }

    /// Write `contents` to `raw_path`, creating parent directories and
    /// overwriting whatever was there.  Returns the resolved path.
    pub async fn write(
        &self,
        raw_path: &str,
        contents: impl AsRef<[u8]>,
        tool_name: &str,
    ) -> Result<PathBuf> {
        let full_path = self.resolve(raw_path, tool_name)?;
        self.write_resolved(&full_path, contents).await?;
        Ok(full_path)
    }

    /// Write to a path already returned by [`OutputDir::resolve`].
    pub async fn write_resolved(&self, full_path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = contents.as_ref();
        tokio::fs::write(full_path, contents).await?;
        debug!(path = %full_path.display(), bytes = contents.len(), "output written");
        Ok(())
    }
}

/// Canonical form when the directory exists, otherwise anchored at the
/// working directory and normalized.
fn absolute_root(root: PathBuf) -> PathBuf {
    if let Ok(canonical) = root.canonicalize() {
        return canonical;
    }
    let absolute = if root.is_absolute() {
        root
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(root),
            Err(_) => root,
        }
    };
    normalize_path(&absolute)
}

/// Resolve `.` and `..` lexically.  The target may not exist yet, so
/// `canonicalize()` is not an option.
fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `/..` is `/`.
                Some(Component::RootDir) => {}
                _ => components.push(component),
            },
            Component::CurDir => {}
            _ => components.push(component),
        }
    }
    components.iter().collect()
}
