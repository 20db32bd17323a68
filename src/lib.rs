#![warn(clippy::all)]

//! Point Cloud Map - a 3D web map of Tokyo.
//!
//! Composes a map scene out of GSI terrain, PLATEAU building footprints
//! served from a PMTiles archive, and a 3D Tiles point cloud drawn through an
//! interleaved overlay. The browser build drives MapLibre; the native build
//! records the composed scene so it can be inspected.

pub mod map;
pub mod overlay;
pub mod protocol;
pub mod state;
pub mod style;

#[cfg(target_arch = "wasm32")]
mod web;
