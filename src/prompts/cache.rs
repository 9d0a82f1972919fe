//! Prompt template cache
//!
//! Read-through cache over a `TemplateSource`, keyed by template id, plus
//! the industry scripts the same source serves. Callers own the instance
//! and pass it to whatever renders prompts.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::scripts::{script_file, GENERAL_SCRIPT, SCRIPTS_DIR};
use super::template::{render_template, TemplateId, TemplateVars};
use super::TemplateError;

/// Where template text comes from
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn load(&self, template: TemplateId) -> Result<String, TemplateError>;

    /// Industry script by file name; `None` when the source has no such file
    async fn load_script(&self, file: &'static str) -> Result<Option<String>, TemplateError>;
}

/// Templates read from a directory of markdown files
pub struct FsTemplateSource {
    root: PathBuf,
}

impl FsTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TemplateSource for FsTemplateSource {
    async fn load(&self, template: TemplateId) -> Result<String, TemplateError> {
        let path = self.root.join(template.path());
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(TemplateError::NotFound { template, path })
            }
            Err(source) => Err(TemplateError::Io { template, source }),
        }
    }

    async fn load_script(&self, file: &'static str) -> Result<Option<String>, TemplateError> {
        let path = self.root.join(SCRIPTS_DIR).join(file);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(TemplateError::ScriptIo { file, source }),
        }
    }
}

/// In-memory templates
#[derive(Debug, Default, Clone)]
pub struct StaticTemplateSource {
    templates: HashMap<TemplateId, String>,
    scripts: HashMap<String, String>,
}

impl StaticTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, template: TemplateId, text: impl Into<String>) -> Self {
        self.templates.insert(template, text.into());
        self
    }

    pub fn with_script(mut self, file: impl Into<String>, text: impl Into<String>) -> Self {
        self.scripts.insert(file.into(), text.into());
        self
    }
}

#[async_trait]
impl TemplateSource for StaticTemplateSource {
    async fn load(&self, template: TemplateId) -> Result<String, TemplateError> {
        self.templates
            .get(&template)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound {
                template,
                path: PathBuf::from(template.path()),
            })
    }

    async fn load_script(&self, file: &'static str) -> Result<Option<String>, TemplateError> {
        Ok(self.scripts.get(file).cloned())
    }
}

/// Read-through prompt cache
pub struct PromptCache {
    source: Arc<dyn TemplateSource>,
    entries: RwLock<HashMap<TemplateId, Arc<str>>>,
    scripts: RwLock<HashMap<&'static str, Arc<str>>>,
}

impl PromptCache {
    pub fn new(source: Arc<dyn TemplateSource>) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            scripts: RwLock::new(HashMap::new()),
        }
    }

    /// Cache over templates under `dir`
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FsTemplateSource::new(dir)))
    }

    /// Template text, loaded on first use
    pub async fn get(&self, template: TemplateId) -> Result<Arc<str>, TemplateError> {
        if let Some(text) = self.entries.read().await.get(&template) {
            return Ok(text.clone());
        }

        debug!(template = %template, "Prompt cache miss");
        let text: Arc<str> = self.source.load(template).await?.into();

        // A concurrent loader may have won; keep whichever landed first
        let mut entries = self.entries.write().await;
        Ok(entries.entry(template).or_insert(text).clone())
    }

    /// Load from the source again, replacing any cached text
    #[instrument(skip(self))]
    pub async fn reload(&self, template: TemplateId) -> Result<Arc<str>, TemplateError> {
        let text: Arc<str> = self.source.load(template).await?.into();
        self.entries.write().await.insert(template, text.clone());
        info!(template = %template, "Prompt template reloaded");
        Ok(text)
    }

    /// Drop one cached template; returns whether it was cached
    pub async fn invalidate(&self, template: TemplateId) -> bool {
        self.entries.write().await.remove(&template).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
        self.scripts.write().await.clear();
        debug!("Prompt cache cleared");
    }

    pub async fn is_cached(&self, template: TemplateId) -> bool {
        self.entries.read().await.contains_key(&template)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Sales script for `industry`, falling back to the general script.
    /// Blank scripts count as missing.
    pub async fn industry_script(&self, industry: &str) -> Result<Option<Arc<str>>, TemplateError> {
        let file = script_file(industry);
        if let Some(script) = self.script(file).await? {
            return Ok(Some(script));
        }
        if file == GENERAL_SCRIPT {
            return Ok(None);
        }
        debug!(industry, file, "No industry script, using general script");
        self.script(GENERAL_SCRIPT).await
    }

    /// Only found scripts are cached, so a script added later is picked up
    async fn script(&self, file: &'static str) -> Result<Option<Arc<str>>, TemplateError> {
        if let Some(text) = self.scripts.read().await.get(file) {
            return Ok(Some(text.clone()));
        }

        let Some(text) = self.source.load_script(file).await? else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        let text: Arc<str> = text.into();
        let mut scripts = self.scripts.write().await;
        Ok(Some(scripts.entry(file).or_insert(text).clone()))
    }

    /// Render the template for `vars`
    pub async fn render<V: TemplateVars>(&self, vars: &V) -> Result<String, TemplateError> {
        let text = self.get(V::TEMPLATE).await?;
        render_template(V::TEMPLATE, &text, &vars.values())
    }
}

impl std::fmt::Debug for PromptCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptCache").finish_non_exhaustive()
    }
}
