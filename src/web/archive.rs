//! PMTiles archive reader backed by the `pmtiles` JS library.

use super::bindings::{get_f64, PmTiles};
use crate::protocol::{
    ArchiveError, ArchiveHeader, ArchiveMetadata, Completion, TileArchive, TileCoord, TileType,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};

pub struct PmtilesArchive {
    url: String,
    inner: PmTiles,
}

impl PmtilesArchive {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            inner: PmTiles::new(url),
        }
    }
}

fn tile_type(code: f64) -> TileType {
    match code as u8 {
        1 => TileType::Mvt,
        2 => TileType::Png,
        3 => TileType::Jpeg,
        4 => TileType::Webp,
        5 => TileType::Avif,
        _ => TileType::Unknown,
    }
}

fn parse_header(value: &JsValue) -> Result<ArchiveHeader, ArchiveError> {
    let field = |key: &str| {
        get_f64(value, key).ok_or_else(|| ArchiveError::Corrupt(format!("header has no {}", key)))
    };

    Ok(ArchiveHeader {
        min_zoom: field("minZoom")? as u8,
        max_zoom: field("maxZoom")? as u8,
        bounds: [
            field("minLon")?,
            field("minLat")?,
            field("maxLon")?,
            field("maxLat")?,
        ],
        center: [field("centerLon")?, field("centerLat")?, field("centerZoom")?],
        tile_type: tile_type(get_f64(value, "tileType").unwrap_or(0.0)),
    })
}

impl TileArchive for PmtilesArchive {
    fn get_tile(&self, coord: TileCoord, done: Completion<Vec<u8>>) {
        let promise = self.inner.get_zxy(coord.z, coord.x, coord.y);
        let url = self.url.clone();
        spawn_local(async move {
            let result = match JsFuture::from(promise).await {
                Ok(value) if value.is_undefined() || value.is_null() => {
                    Err(ArchiveError::TileNotFound(coord))
                }
                Ok(value) => js_sys::Reflect::get(&value, &JsValue::from_str("data"))
                    .map(|data| js_sys::Uint8Array::new(&data).to_vec())
                    .map_err(|e| ArchiveError::Corrupt(format!("{:?}", e))),
                Err(e) => Err(ArchiveError::Fetch(format!("{}: {:?}", url, e))),
            };
            done(result);
        });
    }

    fn get_header(&self, done: Completion<ArchiveHeader>) {
        let promise = self.inner.get_header();
        let url = self.url.clone();
        spawn_local(async move {
            let result = match JsFuture::from(promise).await {
                Ok(value) => parse_header(&value),
                Err(e) => Err(ArchiveError::Fetch(format!("{}: {:?}", url, e))),
            };
            done(result);
        });
    }

    fn get_metadata(&self, done: Completion<ArchiveMetadata>) {
        let promise = self.inner.get_metadata();
        let url = self.url.clone();
        spawn_local(async move {
            let result = match JsFuture::from(promise).await {
                Ok(value) if value.is_undefined() || value.is_null() => {
                    Ok(ArchiveMetadata::default())
                }
                Ok(value) => serde_wasm_bindgen::from_value(value)
                    .map_err(|e| ArchiveError::Corrupt(format!("metadata: {}", e))),
                Err(e) => Err(ArchiveError::Fetch(format!("{}: {:?}", url, e))),
            };
            done(result);
        });
    }
}
