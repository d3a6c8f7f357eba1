//! Default templates loaded from `<TEMPLATE_DIR>/<page_type>.json`.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use storefront_core::configuration::ConfigurationTree;
use storefront_core::error::CoreError;
use storefront_core::page_type::PageType;
use storefront_core::template::{builtin_template, TemplateProvider};

/// Reads a template file per page type, falling back to the built-in
/// template when the directory is unset, the file is missing, or the file
/// does not hold a valid tree.
#[derive(Debug, Clone, Default)]
pub struct FileTemplateProvider {
    dir: Option<PathBuf>,
}

impl FileTemplateProvider {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    async fn load(&self, page_type: PageType) -> Option<ConfigurationTree> {
        let path = self.dir.as_ref()?.join(format!("{}.json", page_type.as_str()));

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read template file");
                return None;
            }
        };

        let parsed = serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::Validation(format!("Invalid JSON: {e}")))
            .and_then(|value| ConfigurationTree::from_value(&value));
        match parsed {
            Ok(tree) => Some(tree),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring invalid template file",
                );
                None
            }
        }
    }
}

#[async_trait]
impl TemplateProvider for FileTemplateProvider {
    async fn default_template(&self, page_type: PageType) -> Result<ConfigurationTree, CoreError> {
        Ok(match self.load(page_type).await {
            Some(tree) => tree,
            None => builtin_template(page_type),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn no_directory_uses_builtin() {
        let provider = FileTemplateProvider::new(None);
        let tree = provider.default_template(PageType::Cart).await.unwrap();
        assert_eq!(tree, builtin_template(PageType::Cart));
    }

    #[tokio::test]
    async fn file_overrides_builtin_for_its_page_only() {
        let dir = tempfile::tempdir().unwrap();
        let custom = json!({
            "slots": {"banner": {"type": "text", "content": "Welcome"}},
            "rootSlots": ["banner"],
            "metadata": {}
        });
        std::fs::write(dir.path().join("homepage.json"), custom.to_string()).unwrap();

        let provider = FileTemplateProvider::new(Some(dir.path().to_path_buf()));
        let home = provider.default_template(PageType::Homepage).await.unwrap();
        assert_eq!(home.root_slots, vec!["banner".to_string()]);

        let cart = provider.default_template(PageType::Cart).await.unwrap();
        assert_eq!(cart, builtin_template(PageType::Cart));
    }

    #[tokio::test]
    async fn invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("cart.json"),
            json!({"slots": {}, "rootSlots": ["ghost"]}).to_string(),
        )
        .unwrap();
        std::fs::write(dir.path().join("product.json"), "not json").unwrap();

        let provider = FileTemplateProvider::new(Some(dir.path().to_path_buf()));
        assert_eq!(
            provider.default_template(PageType::Cart).await.unwrap(),
            builtin_template(PageType::Cart)
        );
        assert_eq!(
            provider.default_template(PageType::Product).await.unwrap(),
            builtin_template(PageType::Product)
        );
    }
}
