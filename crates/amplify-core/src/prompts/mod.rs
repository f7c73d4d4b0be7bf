//! Externalized prompt templates with hot reload.
//!
//! A prompt directory holds `config.yaml`, which declares the categories,
//! and one YAML file per category. Templates are cached after the first read
//! and re-read when the file's modification time advances. Template bodies
//! are Tera templates with `{{ variable }}` placeholders.

mod template;

pub use template::{builtin, PromptTemplate, PHOTO_CATEGORY, YOUTUBE_CATEGORY};

use crate::error::PromptError;
use crate::types::Language;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

/// Metadata for one category in `config.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryInfo {
    /// File name relative to the prompt directory (defaults to `<category>.yaml`)
    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LibraryIndex {
    #[serde(default)]
    categories: BTreeMap<String, CategoryInfo>,
    #[serde(default)]
    settings: LibrarySettings,
}

#[derive(Debug, Default, Deserialize)]
struct LibrarySettings {
    hot_reload_enabled: Option<bool>,
}

struct CachedTemplate {
    template: Arc<PromptTemplate>,
    modified: Option<SystemTime>,
}

/// Loads and caches prompt templates from a directory.
pub struct PromptLibrary {
    dir: PathBuf,
    categories: BTreeMap<String, CategoryInfo>,
    hot_reload: bool,
    cache: RwLock<HashMap<String, CachedTemplate>>,
}

impl PromptLibrary {
    /// Open a prompt directory and load every declared category.
    ///
    /// `hot_reload` is combined with the directory's own
    /// `settings.hot_reload_enabled` flag; both must allow it.
    pub fn open(dir: &Path, hot_reload: bool) -> Result<Self, PromptError> {
        let index_path = dir.join("config.yaml");
        if !index_path.exists() {
            return Err(PromptError::NotFound(index_path));
        }
        let content = std::fs::read_to_string(&index_path).map_err(|e| PromptError::Load {
            path: index_path.clone(),
            message: e.to_string(),
        })?;
        let index: LibraryIndex =
            serde_yaml::from_str(&content).map_err(|e| PromptError::Load {
                path: index_path.clone(),
                message: e.to_string(),
            })?;

        let library = Self {
            dir: dir.to_path_buf(),
            hot_reload: hot_reload && index.settings.hot_reload_enabled.unwrap_or(true),
            categories: index.categories,
            cache: RwLock::new(HashMap::new()),
        };
        library.reload_all()?;

        tracing::info!(
            "Loaded {} prompt categories from {}",
            library.categories.len(),
            dir.display()
        );
        Ok(library)
    }

    /// Re-read every category file from disk.
    pub fn reload_all(&self) -> Result<(), PromptError> {
        for category in self.categories.keys() {
            let loaded = self.load_file(category)?;
            self.store(category, loaded);
        }
        Ok(())
    }

    /// Get a template, re-reading its file first if it changed on disk.
    ///
    /// A failed re-read keeps serving the cached version.
    pub fn get(&self, category: &str) -> Result<Arc<PromptTemplate>, PromptError> {
        let path = self.category_path(category)?;

        let cached = {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            cache
                .get(category)
                .map(|c| (Arc::clone(&c.template), c.modified))
        };

        match cached {
            Some((template, cached_mtime)) => {
                if self.hot_reload && modified_time(&path) > cached_mtime {
                    match self.load_file(category) {
                        Ok(loaded) => {
                            tracing::debug!("Reloaded prompt category '{category}'");
                            return Ok(self.store(category, loaded));
                        }
                        Err(e) => tracing::warn!(
                            "Prompt reload failed, keeping cached '{category}': {e}"
                        ),
                    }
                }
                Ok(template)
            }
            None => {
                let loaded = self.load_file(category)?;
                Ok(self.store(category, loaded))
            }
        }
    }

    /// All declared categories.
    pub fn list_categories(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }

    /// Metadata for a category.
    pub fn category_info(&self, category: &str) -> Result<&CategoryInfo, PromptError> {
        self.categories
            .get(category)
            .ok_or_else(|| PromptError::UnknownCategory(category.to_string()))
    }

    /// Whether `variables` covers everything the category's template declares.
    pub fn validate(&self, category: &str, variables: &[&str]) -> bool {
        match self.get(category) {
            Ok(template) => template
                .variables
                .iter()
                .all(|var| variables.contains(&var.as_str())),
            Err(_) => false,
        }
    }

    /// Whether the library declares `category`.
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    fn category_path(&self, category: &str) -> Result<PathBuf, PromptError> {
        let info = self.category_info(category)?;
        let file = info
            .file
            .clone()
            .unwrap_or_else(|| format!("{category}.yaml"));
        Ok(self.dir.join(file))
    }

    fn load_file(&self, category: &str) -> Result<CachedTemplate, PromptError> {
        let path = self.category_path(category)?;
        if !path.exists() {
            return Err(PromptError::NotFound(path));
        }
        // Read the timestamp before the content so a write racing the read
        // triggers another reload on the next access.
        let modified = modified_time(&path);
        let content = std::fs::read_to_string(&path).map_err(|e| PromptError::Load {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let template: PromptTemplate =
            serde_yaml::from_str(&content).map_err(|e| PromptError::Load {
                path: path.clone(),
                message: e.to_string(),
            })?;
        template.compile().map_err(|e| PromptError::Load {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(CachedTemplate {
            template: Arc::new(template),
            modified,
        })
    }

    fn store(&self, category: &str, loaded: CachedTemplate) -> Arc<PromptTemplate> {
        let template = Arc::clone(&loaded.template);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.insert(category.to_string(), loaded);
        template
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Produces the fully formatted prompt strings handed to providers.
///
/// Uses the prompt library when one is configured and declares the
/// category; otherwise the built-in templates.
#[derive(Clone, Default)]
pub struct PromptSet {
    library: Option<Arc<PromptLibrary>>,
}

impl PromptSet {
    /// Built-in templates only.
    pub fn builtin() -> Self {
        Self { library: None }
    }

    /// Prefer templates from `library`.
    pub fn with_library(library: Arc<PromptLibrary>) -> Self {
        Self {
            library: Some(library),
        }
    }

    /// Prompt for enhancing a story told about a photo.
    pub fn photo(&self, transcript: &str, language: Language) -> String {
        self.render(
            PHOTO_CATEGORY,
            &[("transcript", transcript), ("language_name", language.name())],
        )
    }

    /// Prompt for enhancing a summary of a video clip.
    pub fn youtube(&self, source_transcript: &str, summary: &str, language: Language) -> String {
        self.render(
            YOUTUBE_CATEGORY,
            &[
                ("source_transcript", source_transcript),
                ("transcript", summary),
                ("language_name", language.name()),
            ],
        )
    }

    fn render(&self, category: &str, vars: &[(&str, &str)]) -> String {
        if let Some(library) = self.library.as_ref().filter(|l| l.has_category(category)) {
            match library.get(category).and_then(|t| t.format(vars)) {
                Ok(prompt) => return prompt,
                Err(e) => {
                    tracing::warn!("Prompt '{category}' unusable, using built-in template: {e}");
                }
            }
        }
        // Built-in templates declare exactly the variables passed by the
        // methods above, so formatting cannot fail.
        builtin(category)
            .and_then(|t| t.format(vars).ok())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for PromptSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptSet")
            .field("library", &self.library.as_ref().map(|l| l.dir.clone()))
            .finish()
    }
}
