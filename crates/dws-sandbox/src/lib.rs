// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sandboxed path resolution for agent-supplied paths.
//!
//! [`PathJail`] turns untrusted path strings into absolute filesystem paths,
//! rejecting anything that escapes the configured jail directory.
//! [`tree`] renders a jail-validated directory listing.

pub mod jail;
pub mod tree;

pub use jail::{EntryKind, PathJail};
pub use tree::{TreeNode, build_tree};
