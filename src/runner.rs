//! Project runner: discovers and loads everything a project needs
//!
//! The runner only has to load a project through the storage it is given; the
//! storage records the URLs and bytes. [`ScratchRunner`] understands both the
//! Scratch 3 (`targets`) and Scratch 2 (`children`) project documents.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::Deserialize;

use crate::assets::{AssetDescriptor, AssetKind};
use crate::error::LoadError;
use crate::storage::WebStorage;

/// Loads a project by id through a job's storage
pub trait ProjectRunner: Send + Sync {
    /// Load the project and every asset it references.
    ///
    /// Returns once the workspace would be ready, i.e. after every load
    /// finished. The first failed load aborts.
    fn load_project(&self, id: &str, storage: &WebStorage<'_>) -> Result<(), LoadError>;
}

/// Runner that reads the project document itself
#[derive(Debug, Clone, Copy, Default)]
pub struct ScratchRunner;

impl ProjectRunner for ScratchRunner {
    fn load_project(&self, id: &str, storage: &WebStorage<'_>) -> Result<(), LoadError> {
        let project = storage.load(&AssetDescriptor::project(id))?;

        let document: ProjectDocument =
            serde_json::from_slice(&project.bytes).map_err(|source| LoadError::InvalidProject {
                id: id.to_string(),
                source,
            })?;
        let assets = document.assets();
        tracing::debug!(id, assets = assets.len(), "project document parsed");

        assets
            .par_iter()
            .try_for_each(|descriptor| storage.load(descriptor).map(drop))?;

        tracing::info!(id, "workspace ready");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProjectDocument {
    Sb3(Sb3Project),
    Sb2(Sb2Sprite),
}

#[derive(Debug, Deserialize)]
struct Sb3Project {
    targets: Vec<Sb3Target>,
}

#[derive(Debug, Deserialize)]
struct Sb3Target {
    #[serde(default)]
    costumes: Vec<Sb3Asset>,
    #[serde(default)]
    sounds: Vec<Sb3Asset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sb3Asset {
    asset_id: String,
    data_format: String,
}

/// The stage and every sprite share this shape in Scratch 2
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Sb2Sprite {
    costumes: Vec<Sb2Costume>,
    sounds: Vec<Sb2Sound>,
    children: Vec<Sb2Sprite>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Sb2Costume {
    #[serde(rename = "baseLayerMD5")]
    base_layer_md5: Option<String>,
    #[serde(rename = "textLayerMD5")]
    text_layer_md5: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Sb2Sound {
    md5: Option<String>,
}

impl ProjectDocument {
    /// Distinct media assets, in document order
    fn assets(&self) -> Vec<AssetDescriptor> {
        let mut found = Vec::new();
        match self {
            ProjectDocument::Sb3(project) => {
                for target in &project.targets {
                    found.extend(target.costumes.iter().map(|c| {
                        AssetDescriptor::new(
                            AssetKind::for_costume(&c.data_format),
                            &c.asset_id,
                            &c.data_format,
                        )
                    }));
                    found.extend(target.sounds.iter().map(|s| {
                        AssetDescriptor::new(AssetKind::Sound, &s.asset_id, &s.data_format)
                    }));
                }
            }
            ProjectDocument::Sb2(stage) => collect_sb2(stage, &mut found),
        }

        let mut seen = HashSet::new();
        found.retain(|d| seen.insert(d.asset_id.clone()));
        found
    }
}

fn collect_sb2(sprite: &Sb2Sprite, found: &mut Vec<AssetDescriptor>) {
    for costume in &sprite.costumes {
        let layers = [&costume.base_layer_md5, &costume.text_layer_md5];
        found.extend(
            layers
                .into_iter()
                .flatten()
                .filter_map(|md5| AssetDescriptor::from_md5ext(AssetKind::for_costume, md5)),
        );
    }
    found.extend(
        sprite
            .sounds
            .iter()
            .filter_map(|s| s.md5.as_deref())
            .filter_map(|md5| AssetDescriptor::from_md5ext(|_| AssetKind::Sound, md5)),
    );
    for child in &sprite.children {
        collect_sb2(child, found);
    }
}
