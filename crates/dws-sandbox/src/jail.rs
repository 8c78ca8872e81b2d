// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Jail-directory path resolver.
//!
//! A [`PathJail`] is built once at startup and shared by handle; it never
//! changes afterwards. With a root configured, every path is forced inside
//! it: absolute paths already inside the root are used as-is, anything else
//! is treated as relative to the root. Without a root, only absolute paths
//! are accepted.
//!
//! Resolution is lexical first (no I/O), then the read/write variants touch
//! the filesystem to check existence, entry kind, symlink targets, and
//! writability.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use dws_core::PathError;
use tracing::debug;

/// The kind of filesystem entry a read expects to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    fn label(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

/// Resolves agent-supplied paths against an optional jail root.
#[derive(Debug, Clone, Default)]
pub struct PathJail {
    root: Option<PathBuf>,
}

impl PathJail {
    /// A jail with sandboxing disabled. All paths must be absolute.
    pub fn disabled() -> Self {
        Self { root: None }
    }

    /// Builds a jail rooted at `root`.
    ///
    /// `None` or an empty string disables the jail. Otherwise the directory
    /// is created (recursively) if missing and canonicalized.
    pub fn new(root: Option<&str>) -> Result<Self, PathError> {
        let Some(raw) = root.map(str::trim).filter(|r| !r.is_empty()) else {
            return Ok(Self::disabled());
        };

        let dir = std::path::absolute(raw).map_err(|source| PathError::Io {
            path: raw.to_string(),
            source,
        })?;
        std::fs::create_dir_all(&dir).map_err(|source| PathError::NotWritable {
            path: raw.to_string(),
            source,
        })?;
        let canonical = dir.canonicalize().map_err(|source| PathError::Io {
            path: raw.to_string(),
            source,
        })?;
        if !canonical.is_dir() {
            return Err(PathError::WrongKind {
                path: raw.to_string(),
                resolved: canonical,
                expected: EntryKind::Directory.label(),
            });
        }

        debug!(root = %canonical.display(), "sandbox jail configured");
        Ok(Self {
            root: Some(canonical),
        })
    }

    /// The canonical jail root, if sandboxing is enabled.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Whether a jail root is configured.
    pub fn is_enabled(&self) -> bool {
        self.root.is_some()
    }

    /// Lexically resolves `raw` to an absolute path without touching the disk.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        let path = Path::new(raw);

        let Some(root) = &self.root else {
            if !path.is_absolute() {
                return Err(PathError::AbsoluteRequired {
                    path: raw.to_string(),
                });
            }
            return Ok(normalize(path));
        };

        if path.is_absolute() {
            let normalized = normalize(path);
            if is_within(root, &normalized) {
                return Ok(normalized);
            }
        }

        let candidate = normalize(&root.join(strip_root(path)));
        if !is_within(root, &candidate) {
            return Err(PathError::OutsideSandbox {
                path: raw.to_string(),
                root: root.clone(),
            });
        }
        Ok(candidate)
    }

    /// Resolves `raw` for reading: the entry must exist and be of `kind`.
    ///
    /// Symlinks are followed for the containment check, so a link inside the
    /// jail pointing outside it is rejected. The returned path is the lexical
    /// resolution, not the symlink target.
    pub async fn resolve_for_read(&self, raw: &str, kind: EntryKind) -> Result<PathBuf, PathError> {
        let candidate = self.resolve(raw)?;

        let metadata = tokio::fs::metadata(&candidate)
            .await
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => PathError::NotFound {
                    path: raw.to_string(),
                    resolved: candidate.clone(),
                },
                _ => PathError::Io {
                    path: raw.to_string(),
                    source,
                },
            })?;

        let matches_kind = match kind {
            EntryKind::File => metadata.is_file(),
            EntryKind::Directory => metadata.is_dir(),
        };
        if !matches_kind {
            return Err(PathError::WrongKind {
                path: raw.to_string(),
                resolved: candidate,
                expected: kind.label(),
            });
        }

        self.check_real_location(raw, &candidate).await?;
        Ok(candidate)
    }

    /// Resolves `raw` for writing.
    ///
    /// The target need not exist, but must not be a directory. The parent
    /// directory is created if needed and probed for writability. Everything
    /// the probe created (probe file and any new directories) is removed
    /// before returning, so a rejected or abandoned write leaves no trace.
    pub async fn resolve_for_write(&self, raw: &str) -> Result<PathBuf, PathError> {
        let candidate = self.resolve(raw)?;

        if let Ok(metadata) = tokio::fs::metadata(&candidate).await
            && metadata.is_dir()
        {
            return Err(PathError::WrongKind {
                path: raw.to_string(),
                resolved: candidate,
                expected: EntryKind::File.label(),
            });
        }

        let parent = candidate
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| PathError::NotWritable {
                path: raw.to_string(),
                source: std::io::Error::new(ErrorKind::InvalidInput, "path has no parent directory"),
            })?
            .to_path_buf();

        let created = missing_ancestors(&parent).await;
        let probe = self.probe_parent(raw, &parent).await;
        remove_created(&created).await;
        probe?;

        debug!(path = %candidate.display(), "resolved output path");
        Ok(candidate)
    }

    /// Creates `parent`, checks it stays inside the jail, and writes then
    /// deletes a probe file in it.
    async fn probe_parent(&self, raw: &str, parent: &Path) -> Result<(), PathError> {
        let not_writable = |source| PathError::NotWritable {
            path: raw.to_string(),
            source,
        };

        tokio::fs::create_dir_all(parent).await.map_err(not_writable)?;
        self.check_real_location(raw, parent).await?;

        let probe = parent.join(format!(".dws-write-probe-{}", uuid::Uuid::new_v4()));
        tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&probe)
            .await
            .map_err(not_writable)?;
        tokio::fs::remove_file(&probe).await.map_err(not_writable)?;
        Ok(())
    }

    /// Rejects existing paths whose canonical location leaves the jail.
    async fn check_real_location(&self, raw: &str, existing: &Path) -> Result<(), PathError> {
        let Some(root) = &self.root else {
            return Ok(());
        };
        let real = tokio::fs::canonicalize(existing)
            .await
            .map_err(|source| PathError::Io {
                path: raw.to_string(),
                source,
            })?;
        if is_within(root, &real) {
            Ok(())
        } else {
            Err(PathError::OutsideSandbox {
                path: raw.to_string(),
                root: root.clone(),
            })
        }
    }
}

/// Collapses `.` and `..` components without consulting the filesystem.
///
/// `..` at the filesystem root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Drops any root or drive prefix so `path` can be joined under the jail.
fn strip_root(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect()
}

/// Computes the path from `from` to `to` (both absolute and normalized),
/// using `..` segments where `to` is not below `from`. Returns `to` itself
/// when the two live under different roots or drive prefixes.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();

    let anchored = |c: &[Component<'_>]| -> Vec<OsString> {
        c.iter()
            .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
            .map(|c| c.as_os_str().to_os_string())
            .collect()
    };
    if anchored(&from) != anchored(&to) {
        return to.iter().collect();
    }

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for component in &to[common..] {
        rel.push(component.as_os_str());
    }
    rel
}

/// True when `candidate` is `root` itself or lies below it.
fn is_within(root: &Path, candidate: &Path) -> bool {
    let rel = relative_path(root, candidate);
    let escapes = matches!(rel.components().next(), Some(Component::ParentDir));
    !escapes && !rel.is_absolute() && !rel.has_root()
}

/// Lists the ancestors of `dir` (including itself) that do not exist yet,
/// deepest first.
async fn missing_ancestors(dir: &Path) -> Vec<PathBuf> {
    let mut missing = Vec::new();
    for ancestor in dir.ancestors() {
        if ancestor.as_os_str().is_empty() || tokio::fs::try_exists(ancestor).await.unwrap_or(false)
        {
            break;
        }
        missing.push(ancestor.to_path_buf());
    }
    missing
}

/// Removes directories recorded by [`missing_ancestors`], deepest first.
async fn remove_created(dirs: &[PathBuf]) {
    for dir in dirs {
        if let Err(e) = tokio::fs::remove_dir(dir).await
            && e.kind() != ErrorKind::NotFound
        {
            debug!(dir = %dir.display(), error = %e, "could not remove probe directory");
            break;
        }
    }
}
