use super::Module;
use crate::classifier::sniffers::html::is_html_file;
use crate::classifier::Specification;
use crate::constants::{metadata, modules, sniffers};
use crate::deployment::ArchiveDeployment;
use crate::registry::{runtime_object, RuntimeObject, RuntimeObjectKey};
use anyhow::bail;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// HTML pages served per context root
#[derive(Debug, Default)]
pub struct StaticContentIndex {
    pages: RwLock<BTreeMap<String, Vec<String>>>,
}

impl StaticContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, context_root: &str, pages: Vec<String>) -> Option<Vec<String>> {
        self.pages.write().insert(context_root.to_string(), pages)
    }

    pub fn remove(&self, context_root: &str) -> Option<Vec<String>> {
        self.pages.write().remove(context_root)
    }

    pub fn pages(&self, context_root: &str) -> Option<Vec<String>> {
        self.pages.read().get(context_root).cloned()
    }

    /// Resolve a request path such as `/shop/index.html`
    pub fn resolve(&self, path: &str) -> Option<(String, String)> {
        let pages = self.pages.read();
        pages
            .iter()
            .filter(|(root, _)| {
                root.as_str() == "/"
                    || path == root.as_str()
                    || path.starts_with(&format!("{root}/"))
            })
            .max_by_key(|(root, _)| root.len())
            .and_then(|(root, files)| {
                let relative = path
                    .strip_prefix(root.as_str())
                    .unwrap_or(path)
                    .trim_start_matches('/');
                files
                    .iter()
                    .find(|f| f.as_str() == relative)
                    .map(|f| (root.clone(), f.clone()))
            })
    }

    pub fn context_roots(&self) -> Vec<String> {
        self.pages.read().keys().cloned().collect()
    }

    pub fn clear(&self) {
        self.pages.write().clear();
    }
}

/// Serves plain HTML deployments.
pub struct StaticContentModule {
    index: Arc<StaticContentIndex>,
}

impl StaticContentModule {
    pub fn new() -> Self {
        Self {
            index: Arc::new(StaticContentIndex::new()),
        }
    }

    pub fn index(&self) -> Arc<StaticContentIndex> {
        Arc::clone(&self.index)
    }
}

impl Default for StaticContentModule {
    fn default() -> Self {
        Self::new()
    }
}

fn html_pages(deployment: &ArchiveDeployment) -> Vec<String> {
    if let Some(pages) = deployment.metadata_value(metadata::HTML_PAGES) {
        return pages
            .split(',')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
    }
    deployment
        .content_manifest()
        .map(|m| {
            m.descriptors
                .iter()
                .filter(|d| is_html_file(&d.name))
                .map(|d| d.name.clone())
                .collect()
        })
        .unwrap_or_default()
}

impl Module for StaticContentModule {
    fn name(&self) -> &str {
        modules::STATIC_CONTENT
    }

    fn provided_specifications(&self) -> Vec<Specification> {
        vec![Specification::Html]
    }

    fn sniffer_type(&self) -> Option<&str> {
        Some(sniffers::HTML)
    }

    fn stop(&self) -> anyhow::Result<()> {
        self.index.clear();
        Ok(())
    }

    fn register_deployment(&self, deployment: &mut ArchiveDeployment) -> anyhow::Result<()> {
        let pages = html_pages(deployment);
        if pages.is_empty() {
            bail!("deployment {} has no HTML content", deployment.name());
        }

        let context_root = deployment.context_root().to_string();
        if self.index.pages(&context_root).is_some() {
            bail!("context root {context_root} is already serving static content");
        }

        deployment.set_metadata(metadata::STATIC_CONTENT_PAGES, pages.len().to_string());
        info!(
            deployment = deployment.name(),
            context_root = %context_root,
            pages = pages.len(),
            "Static content registered"
        );
        self.index.insert(&context_root, pages);
        Ok(())
    }

    fn unregister_deployment(&self, deployment: &ArchiveDeployment) -> anyhow::Result<()> {
        if self.index.remove(deployment.context_root()).is_some() {
            debug!(deployment = deployment.name(), "Static content removed");
        }
        Ok(())
    }

    fn exposed_runtime_object_types(&self) -> Vec<RuntimeObjectKey> {
        vec![RuntimeObjectKey::of::<StaticContentIndex>()]
    }

    fn get_runtime_object(&self, key: &RuntimeObjectKey) -> Option<RuntimeObject> {
        (*key == RuntimeObjectKey::of::<StaticContentIndex>())
            .then(|| runtime_object(Arc::clone(&self.index)))
    }
}
