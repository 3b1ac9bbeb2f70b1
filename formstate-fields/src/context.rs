//! FieldsContext: loads collection schemas from disk.
//!
//! Collections live as YAML files under a `collections/` directory. Each file
//! is parsed, checked for structural problems, and indexed by slug.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::check::check_fields;
use crate::error::{FieldsError, Result};
use crate::types::CollectionDef;

/// Builder for `FieldsContext`. Created by `FieldsContext::open()`.
pub struct FieldsContextBuilder {
    root: PathBuf,
    strict: bool,
}

impl FieldsContextBuilder {
    /// Fail on unreadable or invalid collection files instead of skipping them.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Build the context: create directories and load collections from disk.
    pub async fn build(self) -> Result<FieldsContext> {
        let collections_dir = self.root.join("collections");
        fs::create_dir_all(&collections_dir).await?;

        let mut ctx = FieldsContext {
            root: self.root,
            collections: Vec::new(),
            slug_index: HashMap::new(),
        };
        ctx.load_collections(self.strict).await?;

        debug!(
            collections = ctx.collections.len(),
            root = %ctx.root.display(),
            "fields context opened"
        );

        Ok(ctx)
    }
}

/// Context for collection schemas.
///
/// Owns a directory on disk with the structure:
/// ```text
/// fields/
///   collections/    ← one .yaml per collection
/// ```
pub struct FieldsContext {
    root: PathBuf,
    collections: Vec<CollectionDef>,
    slug_index: HashMap<String, usize>,
}

impl FieldsContext {
    /// Open or create a fields directory. Returns a builder for optional configuration.
    ///
    /// ```rust,ignore
    /// let ctx = FieldsContext::open(path).build().await?;
    /// let posts = ctx.get_collection("posts")?;
    /// ```
    pub fn open(root: impl Into<PathBuf>) -> FieldsContextBuilder {
        FieldsContextBuilder {
            root: root.into(),
            strict: false,
        }
    }

    /// Get a collection by slug.
    pub fn get_collection(&self, slug: &str) -> Result<&CollectionDef> {
        self.slug_index
            .get(slug)
            .map(|&i| &self.collections[i])
            .ok_or_else(|| FieldsError::CollectionNotFound {
                slug: slug.to_string(),
            })
    }

    /// All collections, sorted by slug.
    pub fn all_collections(&self) -> &[CollectionDef] {
        &self.collections
    }

    /// The root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn load_collections(&mut self, strict: bool) -> Result<()> {
        let dir = self.root.join("collections");
        let mut entries = fs::read_dir(&dir).await?;
        let mut loaded = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml" | "yml")
            ) {
                continue;
            }
            match read_collection(&path).await {
                Ok(def) => loaded.push(def),
                Err(e) if strict => return Err(e),
                Err(e) => {
                    warn!(?path, %e, "skipping invalid collection definition");
                }
            }
        }

        loaded.sort_by(|a, b| a.slug.cmp(&b.slug));
        for def in loaded {
            if self.slug_index.contains_key(&def.slug) {
                if strict {
                    return Err(FieldsError::DuplicateCollection { slug: def.slug });
                }
                warn!(slug = %def.slug, "skipping duplicate collection slug");
                continue;
            }
            self.slug_index.insert(def.slug.clone(), self.collections.len());
            self.collections.push(def);
        }
        Ok(())
    }
}

async fn read_collection(path: &Path) -> Result<CollectionDef> {
    let content = fs::read_to_string(path).await?;
    let def: CollectionDef = serde_yaml_ng::from_str(&content)?;
    check_fields(&def.fields)?;
    Ok(def)
}
