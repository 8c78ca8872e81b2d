// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File reference collection.
//!
//! [`ReferenceResolver`] walks an instruction graph, resolves every file or
//! URL field, replaces the field's value with a reference key, and builds a
//! [`ReferenceMap`] of what has to be sent alongside the instructions.
//!
//! URLs are keyed by their own text and never touched locally. Local paths
//! go through the [`PathJail`], are read eagerly, and are keyed by their
//! basename with every non-alphanumeric character replaced by `_`. The same
//! input referenced twice collapses to one entry.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use dws_core::DwsError;
use dws_sandbox::{EntryKind, PathJail};
use tracing::debug;

use crate::instructions::Instructions;

/// Where a referenced file's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// A local file, read into memory.
    Local { path: PathBuf, bytes: Vec<u8> },
    /// A remote document the service fetches itself.
    Url { url: String },
}

/// One deduplicated file reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    /// Multipart field name, or the URL itself.
    pub key: String,
    /// Upload file name (basename) or the URL.
    pub name: String,
    pub source: FileSource,
}

impl FileReference {
    pub fn is_url(&self) -> bool {
        matches!(self.source, FileSource::Url { .. })
    }
}

/// References collected for one request, keyed by reference key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMap {
    entries: BTreeMap<String, FileReference>,
}

impl ReferenceMap {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&FileReference> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileReference> {
        self.entries.values()
    }

    /// True when every reference is a URL (and there is at least one).
    pub fn all_urls(&self) -> bool {
        !self.entries.is_empty() && self.entries.values().all(FileReference::is_url)
    }

    /// Local references, in key order.
    pub fn local(&self) -> impl Iterator<Item = &FileReference> {
        self.entries.values().filter(|r| !r.is_url())
    }

    fn insert(&mut self, reference: FileReference) {
        self.entries.insert(reference.key.clone(), reference);
    }
}

/// Returns true for strings treated as remote references.
pub fn is_remote_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Derives a multipart-safe key from a file name.
pub fn sanitize_key(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Resolves file references for a single request.
pub struct ReferenceResolver<'a> {
    jail: &'a PathJail,
    map: ReferenceMap,
    /// Resolved local path or URL to the key already assigned to it.
    seen: HashMap<String, String>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(jail: &'a PathJail) -> Self {
        Self {
            jail,
            map: ReferenceMap::default(),
            seen: HashMap::new(),
        }
    }

    /// Resolves one file-or-URL string and returns its reference key.
    ///
    /// Failures are wrapped with `raw` so the caller can see which field
    /// was wrong.
    pub async fn resolve(&mut self, raw: &str) -> Result<String, DwsError> {
        if is_remote_url(raw) {
            if !self.seen.contains_key(raw) {
                self.seen.insert(raw.to_string(), raw.to_string());
                self.map.insert(FileReference {
                    key: raw.to_string(),
                    name: raw.to_string(),
                    source: FileSource::Url {
                        url: raw.to_string(),
                    },
                });
            }
            return Ok(raw.to_string());
        }

        self.resolve_local(raw)
            .await
            .map_err(|e| DwsError::reference(raw, e))
    }

    async fn resolve_local(&mut self, raw: &str) -> Result<String, DwsError> {
        let path = self.jail.resolve_for_read(raw, EntryKind::File).await?;
        let identity = path.to_string_lossy().into_owned();
        if let Some(key) = self.seen.get(&identity) {
            return Ok(key.clone());
        }

        let bytes = tokio::fs::read(&path).await.map_err(|source| DwsError::Io {
            context: format!("Cannot read {}", path.display()),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| identity.clone());
        let key = self.unique_key(sanitize_key(&name));

        debug!(key = %key, path = %path.display(), size = bytes.len(), "loaded local reference");
        self.seen.insert(identity, key.clone());
        self.map.insert(FileReference {
            key: key.clone(),
            name,
            source: FileSource::Local { path, bytes },
        });
        Ok(key)
    }

    /// Appends `_2`, `_3`, ... when different files share a sanitized name.
    fn unique_key(&self, base: String) -> String {
        if self.map.get(&base).is_none() {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if self.map.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Rewrites every file field in `instructions` to its reference key.
    ///
    /// Parts are visited first, then top-level actions. Per-part actions are
    /// not inspected.
    pub async fn collect(&mut self, instructions: &mut Instructions) -> Result<(), DwsError> {
        for part in &mut instructions.parts {
            if let Some(file) = part.file.as_mut() {
                *file = self.resolve(file).await?;
            }
        }
        for action in &mut instructions.actions {
            if let Some(file) = action.file_field_mut() {
                *file = self.resolve(file).await?;
            }
        }
        Ok(())
    }

    /// Consumes the resolver, failing when nothing was referenced.
    pub fn finish(self) -> Result<ReferenceMap, DwsError> {
        if self.map.is_empty() {
            return Err(DwsError::NoReferences);
        }
        Ok(self.map)
    }
}

/// Collects references for a build and returns them with the rewritten graph.
pub async fn collect_references(
    jail: &PathJail,
    mut instructions: Instructions,
) -> Result<(Instructions, ReferenceMap), DwsError> {
    let mut resolver = ReferenceResolver::new(jail);
    resolver.collect(&mut instructions).await?;
    Ok((instructions, resolver.finish()?))
}
