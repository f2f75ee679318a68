//! URL resolution for project documents and media assets

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::config::Endpoints;

use super::AssetDescriptor;

/// URLs recorded while a project loads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAssetMap {
    /// URL of the project document, once it has been resolved
    pub project_json: Option<String>,
    /// Asset id -> URL
    pub assets: BTreeMap<String, String>,
}

/// Builds fetch URLs and records every one it hands out.
///
/// One resolver belongs to one conversion job.
#[derive(Debug)]
pub struct AssetResolver {
    project_root: String,
    asset_root: String,
    resolved: Mutex<ResolvedAssetMap>,
}

impl AssetResolver {
    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            project_root: endpoints.project_root.clone(),
            asset_root: endpoints.asset_root.clone(),
            resolved: Mutex::new(ResolvedAssetMap::default()),
        }
    }

    /// URL of a project document: `<root><id>` or `<root><id>/<revision>`
    pub fn resolve_project_url(&self, descriptor: &AssetDescriptor) -> String {
        let mut parts = descriptor.asset_id.split('.');
        let mut url = self.project_root.clone();
        url.push_str(parts.next().unwrap_or_default());
        if let Some(revision) = parts.next().filter(|r| !r.is_empty()) {
            url.push('/');
            url.push_str(revision);
        }

        tracing::debug!(id = %descriptor.asset_id, %url, "resolved project");
        self.lock().project_json = Some(url.clone());
        url
    }

    /// URL of a media asset on the CDN
    pub fn resolve_asset_url(&self, descriptor: &AssetDescriptor) -> String {
        let url = format!(
            "{}internalapi/asset/{}.{}/get/",
            self.asset_root, descriptor.asset_id, descriptor.data_format
        );

        tracing::debug!(id = %descriptor.asset_id, %url, "resolved asset");
        self.lock()
            .assets
            .insert(descriptor.asset_id.clone(), url.clone());
        url
    }

    /// Copy of everything resolved so far
    pub fn resolved(&self) -> ResolvedAssetMap {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ResolvedAssetMap> {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetKind;

    fn resolver() -> AssetResolver {
        AssetResolver::new(&Endpoints::default())
    }

    #[test]
    fn test_project_url_single_part() {
        let url = resolver().resolve_project_url(&AssetDescriptor::project("123456789"));
        assert_eq!(url, "https://projects.scratch.mit.edu/123456789");
    }

    #[test]
    fn test_project_url_with_revision() {
        let url = resolver().resolve_project_url(&AssetDescriptor::project("123456789.0"));
        assert_eq!(url, "https://projects.scratch.mit.edu/123456789/0");
    }

    #[test]
    fn test_asset_url() {
        let descriptor = AssetDescriptor::new(AssetKind::ImageBitmap, "123456789", "png");
        let url = resolver().resolve_asset_url(&descriptor);
        assert_eq!(
            url,
            "https://cdn.assets.scratch.mit.edu/internalapi/asset/123456789.png/get/"
        );
    }

    #[test]
    fn test_resolutions_are_recorded() {
        let resolver = resolver();
        resolver.resolve_project_url(&AssetDescriptor::project("42"));
        resolver.resolve_asset_url(&AssetDescriptor::new(AssetKind::Sound, "abc", "wav"));
        resolver.resolve_asset_url(&AssetDescriptor::new(AssetKind::ImageVector, "def", "svg"));

        let resolved = resolver.resolved();
        assert_eq!(
            resolved.project_json.as_deref(),
            Some("https://projects.scratch.mit.edu/42")
        );
        assert_eq!(resolved.assets.len(), 2);
        assert!(resolved.assets["abc"].ends_with("abc.wav/get/"));
        assert!(resolved.assets["def"].ends_with("def.svg/get/"));
    }

    #[test]
    fn test_same_asset_recorded_once() {
        let resolver = resolver();
        let descriptor = AssetDescriptor::new(AssetKind::Sound, "abc", "wav");
        resolver.resolve_asset_url(&descriptor);
        resolver.resolve_asset_url(&descriptor);
        assert_eq!(resolver.resolved().assets.len(), 1);
    }

    #[test]
    fn test_custom_roots() {
        let endpoints = Endpoints {
            project_root: "http://localhost:8000/projects/".to_string(),
            asset_root: "http://localhost:8000/".to_string(),
            ..Endpoints::default()
        };
        let resolver = AssetResolver::new(&endpoints);
        assert_eq!(
            resolver.resolve_project_url(&AssetDescriptor::project("7")),
            "http://localhost:8000/projects/7"
        );
    }
}
