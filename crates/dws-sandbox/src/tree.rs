// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory listing rendered as an indented tree.
//!
//! Sibling entries are read concurrently. Hidden entries (leading `.`) are
//! skipped, symlinks are listed but never followed, and recursion stops at a
//! caller-supplied depth.

use std::path::{Path, PathBuf};

use dws_core::DwsError;
use futures::future::{BoxFuture, FutureExt, try_join_all};

use crate::jail::{EntryKind, PathJail};

/// Default recursion limit for [`build_tree`].
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// One entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub is_dir: bool,
    pub children: Vec<TreeNode>,
    /// Set when the directory has entries below the depth limit.
    pub truncated: bool,
}

impl TreeNode {
    /// Renders the node and its descendants with box-drawing connectors.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.label());
        self.render_children("", &mut out);
        out
    }

    fn label(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    fn render_children(&self, prefix: &str, out: &mut String) {
        let count = self.children.len();
        for (i, child) in self.children.iter().enumerate() {
            let last = i + 1 == count && !self.truncated;
            let (branch, indent) = if last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            out.push_str(prefix);
            out.push_str(branch);
            out.push_str(&child.label());
            out.push('\n');
            child.render_children(&format!("{prefix}{indent}"), out);
        }
        if self.truncated {
            out.push_str(prefix);
            out.push_str("└── ...\n");
        }
    }
}

/// Lists the jail-validated directory `raw` down to `max_depth` levels.
pub async fn build_tree(jail: &PathJail, raw: &str, max_depth: usize) -> Result<TreeNode, DwsError> {
    let dir = jail.resolve_for_read(raw, EntryKind::Directory).await?;
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());
    read_dir_node(dir, name, max_depth).await
}

fn read_dir_node(dir: PathBuf, name: String, depth_left: usize) -> BoxFuture<'static, Result<TreeNode, DwsError>> {
    async move {
        let entries = list_entries(&dir).await?;
        if depth_left == 0 {
            return Ok(TreeNode {
                name,
                is_dir: true,
                children: Vec::new(),
                truncated: !entries.is_empty(),
            });
        }

        let children = try_join_all(entries.into_iter().map(|(path, entry_name, is_dir)| {
            if is_dir {
                read_dir_node(path, entry_name, depth_left - 1)
            } else {
                async move {
                    Ok(TreeNode {
                        name: entry_name,
                        is_dir: false,
                        children: Vec::new(),
                        truncated: false,
                    })
                }
                .boxed()
            }
        }))
        .await?;

        Ok(TreeNode {
            name,
            is_dir: true,
            children,
            truncated: false,
        })
    }
    .boxed()
}

/// Visible entries of `dir` as `(path, name, is_dir)`, directories first,
/// then by name.
async fn list_entries(dir: &Path) -> Result<Vec<(PathBuf, String, bool)>, DwsError> {
    let io_err = |source| DwsError::Io {
        context: format!("Cannot list directory {}", dir.display()),
        source,
    };

    let mut reader = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(io_err)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        // file_type does not follow symlinks, so linked directories are leaves.
        let is_dir = entry.file_type().await.map_err(io_err)?.is_dir();
        entries.push((entry.path(), name, is_dir));
    }
    entries.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.1.cmp(&b.1)));
    Ok(entries)
}
