//! Storage handed to the runner for one conversion job

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::assets::{AssetDescriptor, AssetKind, AssetResolver};
use crate::error::FetchError;
use crate::fetch::{Fetcher, Resource};
use crate::progress::{LoadObserver, LoadedAsset};

/// Loads project resources over a [`Fetcher`], resolving URLs through an
/// [`AssetResolver`] and reporting to an optional [`LoadObserver`].
///
/// Loaded bytes are kept so the embed step does not download them twice.
pub struct WebStorage<'a> {
    fetcher: &'a dyn Fetcher,
    resolver: &'a AssetResolver,
    observer: Option<&'a dyn LoadObserver>,
    loaded: Mutex<HashMap<String, Arc<Resource>>>,
}

impl<'a> WebStorage<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, resolver: &'a AssetResolver) -> Self {
        Self {
            fetcher,
            resolver,
            observer: None,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Report every load to `observer`
    pub fn with_observer(mut self, observer: &'a dyn LoadObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Load one resource.
    ///
    /// The observer hears about the load before the request is made, and about
    /// its completion only if it succeeded.
    pub fn load(&self, descriptor: &AssetDescriptor) -> Result<Arc<Resource>, FetchError> {
        let url = match descriptor.kind {
            AssetKind::Project => self.resolver.resolve_project_url(descriptor),
            AssetKind::ImageVector | AssetKind::ImageBitmap | AssetKind::Sound => {
                self.resolver.resolve_asset_url(descriptor)
            }
        };

        if let Some(observer) = self.observer {
            observer.dispatched(descriptor);
        }

        let resource = Arc::new(self.fetcher.fetch(&url)?);

        if let Some(observer) = self.observer {
            observer.completed(LoadedAsset {
                descriptor,
                data: &resource.bytes,
            });
        }

        self.lock().insert(url, Arc::clone(&resource));
        Ok(resource)
    }

    /// Data URI for `url`, reusing bytes loaded earlier in this job
    pub fn embed(&self, url: &str) -> Result<String, FetchError> {
        let cached = self.lock().get(url).cloned();
        let resource = match cached {
            Some(resource) => resource,
            None => Arc::new(self.fetcher.fetch(url)?),
        };
        Ok(resource.to_data_uri(url))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Resource>>> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
