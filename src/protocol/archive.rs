//! Tile-archive reader seam.
//!
//! Archive readers are collaborators with a callback-style interface: every
//! lookup takes a completion that is invoked with the result. The reader is
//! free to complete synchronously or later from an event callback.

use super::request::TileCoord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Completion handed to an archive lookup. Consumed on first call.
pub type Completion<T> = Box<dyn FnOnce(Result<T, ArchiveError>)>;

/// Errors reported by a tile archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    /// The archive has no tile at this coordinate.
    TileNotFound(TileCoord),
    /// The archive header or directory could not be decoded.
    Corrupt(String),
    /// Fetching archive bytes failed.
    Fetch(String),
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveError::TileNotFound(coord) => write!(f, "Tile not found: {}", coord),
            ArchiveError::Corrupt(msg) => write!(f, "Corrupt archive: {}", msg),
            ArchiveError::Fetch(msg) => write!(f, "Archive fetch failed: {}", msg),
        }
    }
}

impl std::error::Error for ArchiveError {}

/// Encoding of the tiles stored in an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileType {
    #[default]
    Unknown,
    Mvt,
    Png,
    Jpeg,
    Webp,
    Avif,
}

/// Archive-level metadata needed to describe the archive as a tile source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveHeader {
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// `[west, south, east, north]` in degrees.
    pub bounds: [f64; 4],
    /// `[lon, lat, zoom]`.
    pub center: [f64; 3],
    pub tile_type: TileType,
}

impl Default for ArchiveHeader {
    fn default() -> Self {
        Self {
            min_zoom: 0,
            max_zoom: 0,
            bounds: [-180.0, -85.051129, 180.0, 85.051129],
            center: [0.0, 0.0, 0.0],
            tile_type: TileType::Unknown,
        }
    }
}

/// Descriptive metadata stored alongside the tiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub attribution: Option<String>,
    /// Layer descriptions of a vector archive, passed through as stored.
    pub vector_layers: Vec<Value>,
}

impl ArchiveHeader {
    /// Builds the TileJSON document a renderer expects for this archive.
    ///
    /// Vector layers are only advertised for MVT archives.
    pub fn to_tilejson(&self, tiles_url: String, metadata: &ArchiveMetadata) -> TileJson {
        TileJson {
            tilejson: "3.0.0".to_string(),
            tiles: vec![tiles_url],
            minzoom: self.min_zoom,
            maxzoom: self.max_zoom,
            bounds: self.bounds,
            center: self.center,
            name: metadata.name.clone(),
            description: metadata.description.clone(),
            attribution: metadata.attribution.clone(),
            vector_layers: (self.tile_type == TileType::Mvt)
                .then(|| metadata.vector_layers.clone()),
        }
    }
}

/// TileJSON 3.0.0 description of a tile source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileJson {
    pub tilejson: String,
    pub tiles: Vec<String>,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub bounds: [f64; 4],
    pub center: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_layers: Option<Vec<Value>>,
}

/// A reader over a single tile archive.
///
/// Implementations must invoke each completion at most once; the `FnOnce`
/// bound enforces it.
pub trait TileArchive {
    /// Looks up the tile bytes at `coord`.
    fn get_tile(&self, coord: TileCoord, done: Completion<Vec<u8>>);

    /// Reads the archive header.
    fn get_header(&self, done: Completion<ArchiveHeader>);

    /// Reads the archive metadata. Archives without metadata report the default.
    fn get_metadata(&self, done: Completion<ArchiveMetadata>) {
        done(Ok(ArchiveMetadata::default()));
    }
}

/// An archive held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticArchive {
    header: ArchiveHeader,
    metadata: ArchiveMetadata,
    tiles: HashMap<TileCoord, Vec<u8>>,
}

impl StaticArchive {
    pub fn new(header: ArchiveHeader) -> Self {
        Self {
            header,
            metadata: ArchiveMetadata::default(),
            tiles: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: ArchiveMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_tile(mut self, coord: TileCoord, data: Vec<u8>) -> Self {
        self.insert(coord, data);
        self
    }

    pub fn insert(&mut self, coord: TileCoord, data: Vec<u8>) {
        self.tiles.insert(coord, data);
    }
}

impl TileArchive for StaticArchive {
    fn get_tile(&self, coord: TileCoord, done: Completion<Vec<u8>>) {
        match self.tiles.get(&coord) {
            Some(data) => done(Ok(data.clone())),
            None => done(Err(ArchiveError::TileNotFound(coord))),
        }
    }

    fn get_header(&self, done: Completion<ArchiveHeader>) {
        done(Ok(self.header.clone()));
    }

    fn get_metadata(&self, done: Completion<ArchiveMetadata>) {
        done(Ok(self.metadata.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_static_archive_lookup() {
        let archive =
            StaticArchive::default().with_tile(TileCoord::new(14, 100, 200), vec![1, 2, 3]);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        archive.get_tile(
            TileCoord::new(14, 100, 200),
            Box::new(move |r| sink.borrow_mut().push(r)),
        );
        let sink = seen.clone();
        archive.get_tile(
            TileCoord::new(14, 100, 201),
            Box::new(move |r| sink.borrow_mut().push(r)),
        );

        let seen = seen.borrow();
        assert_eq!(seen[0], Ok(vec![1, 2, 3]));
        assert_eq!(
            seen[1],
            Err(ArchiveError::TileNotFound(TileCoord::new(14, 100, 201)))
        );
    }

    fn metadata() -> ArchiveMetadata {
        ArchiveMetadata {
            name: Some("PLATEAU".into()),
            description: None,
            attribution: Some("3D都市モデル Project PLATEAU".into()),
            vector_layers: vec![serde_json::json!({
                "id": "PLATEAU",
                "fields": {"measuredHeight": "Number", "city": "String"}
            })],
        }
    }

    #[test]
    fn test_header_to_tilejson() {
        let header = ArchiveHeader {
            min_zoom: 14,
            max_zoom: 16,
            bounds: [139.5, 35.5, 140.0, 35.9],
            center: [139.7, 35.7, 15.0],
            tile_type: TileType::Mvt,
        };
        let tilejson = header.to_tilejson(
            "pmtiles://https://host/a.pmtiles/{z}/{x}/{y}".into(),
            &metadata(),
        );
        assert_eq!(tilejson.tilejson, "3.0.0");
        assert_eq!(tilejson.minzoom, 14);
        assert_eq!(tilejson.maxzoom, 16);
        assert_eq!(
            tilejson.tiles,
            vec!["pmtiles://https://host/a.pmtiles/{z}/{x}/{y}".to_string()]
        );
        assert_eq!(tilejson.name.as_deref(), Some("PLATEAU"));
        assert_eq!(
            tilejson.attribution.as_deref(),
            Some("3D都市モデル Project PLATEAU")
        );
        assert_eq!(tilejson.vector_layers, Some(metadata().vector_layers));

        let value = serde_json::to_value(&tilejson).unwrap();
        assert_eq!(value["vector_layers"][0]["id"], "PLATEAU");
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_raster_tilejson_has_no_vector_layers() {
        let header = ArchiveHeader {
            tile_type: TileType::Png,
            ..ArchiveHeader::default()
        };
        let tilejson = header.to_tilejson(
            "pmtiles://https://host/dem.pmtiles/{z}/{x}/{y}".into(),
            &metadata(),
        );
        assert_eq!(tilejson.vector_layers, None);
        assert_eq!(tilejson.name.as_deref(), Some("PLATEAU"));

        let bare = header.to_tilejson(String::new(), &ArchiveMetadata::default());
        let value = serde_json::to_value(&bare).unwrap();
        assert!(value.get("name").is_none());
        assert!(value.get("attribution").is_none());
    }
}
