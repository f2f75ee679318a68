//! Project assets and where to fetch them

mod resolver;

pub use resolver::{AssetResolver, ResolvedAssetMap};

/// Category of a fetchable project resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// The project document itself
    Project,
    /// SVG costume
    ImageVector,
    /// Raster costume
    ImageBitmap,
    Sound,
}

impl AssetKind {
    /// Kind of a costume stored with the given file extension
    pub fn for_costume(data_format: &str) -> Self {
        if data_format.eq_ignore_ascii_case("svg") {
            AssetKind::ImageVector
        } else {
            AssetKind::ImageBitmap
        }
    }
}

/// One resource the runner asks storage to load
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetDescriptor {
    pub asset_id: String,
    pub data_format: String,
    pub kind: AssetKind,
}

impl AssetDescriptor {
    pub fn new(
        kind: AssetKind,
        asset_id: impl Into<String>,
        data_format: impl Into<String>,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            data_format: data_format.into(),
            kind,
        }
    }

    /// Descriptor for the project document with the given id
    pub fn project(id: impl Into<String>) -> Self {
        Self::new(AssetKind::Project, id, "json")
    }

    /// Split a `hash.ext` file name into a descriptor
    pub fn from_md5ext(kind_for: impl Fn(&str) -> AssetKind, md5ext: &str) -> Option<Self> {
        let (asset_id, data_format) = md5ext.rsplit_once('.')?;
        if asset_id.is_empty() || data_format.is_empty() {
            return None;
        }
        Some(Self::new(kind_for(data_format), asset_id, data_format))
    }
}
