//! Tile request descriptors and custom-scheme URL decoding.

use super::ProtocolError;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

/// Scheme under which PMTiles archives are addressed.
pub const PMTILES_SCHEME: &str = "pmtiles";

/// Deepest zoom level a tile archive can address.
pub const MAX_TILE_ZOOM: u8 = 31;

/// Tile coordinate in ZXY scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Returns true if the coordinate lies inside the tile grid of its zoom level.
    pub fn is_valid(&self) -> bool {
        if self.z > MAX_TILE_ZOOM {
            return false;
        }
        let tiles_per_side = 1u64 << self.z;
        u64::from(self.x) < tiles_per_side && u64::from(self.y) < tiles_per_side
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Cancellation flag handed to the protocol handler with every request.
///
/// The renderer owns cancellation; handlers receive the signal but the
/// bridge never consults it.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    aborted: Rc<Cell<bool>>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the request as aborted. Visible through every clone of the signal.
    pub fn abort(&self) {
        self.aborted.set(true);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.get()
    }
}

/// A single tile fetch issued by the renderer.
#[derive(Debug, Clone)]
pub struct TileRequest {
    /// Full, scheme-prefixed URL (e.g. `pmtiles://https://host/a.pmtiles/14/100/200`).
    pub url: String,
    pub signal: AbortSignal,
}

impl TileRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            signal: AbortSignal::new(),
        }
    }

    pub fn with_signal(url: impl Into<String>, signal: AbortSignal) -> Self {
        Self {
            url: url.into(),
            signal,
        }
    }

    /// Scheme portion of the URL, if it has one.
    pub fn scheme(&self) -> Option<&str> {
        scheme_of(&self.url)
    }
}

/// Returns the scheme of `url` (the part before `://`).
pub fn scheme_of(url: &str) -> Option<&str> {
    url.split_once("://")
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.is_empty())
}

/// A decoded custom-scheme URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolUrl {
    /// `scheme://<archive-url>/<z>/<x>/<y>`
    Tile { archive_url: String, coord: TileCoord },
    /// `scheme://<archive-url>`, asking for the archive's TileJSON.
    TileJson { archive_url: String },
}

impl ProtocolUrl {
    /// Decodes `url`, which must start with `<scheme>://`.
    ///
    /// The last three path segments are read as `z/x/y` only when all three are
    /// purely numeric (a file extension on `y` is ignored); otherwise the whole
    /// remainder is taken as the archive URL of a TileJSON request.
    pub fn parse(url: &str, scheme: &str) -> Result<Self, ProtocolError> {
        let rest = url
            .strip_prefix(scheme)
            .and_then(|r| r.strip_prefix("://"))
            .ok_or_else(|| {
                ProtocolError::InvalidUrl(format!("expected {}:// prefix in {}", scheme, url))
            })?;

        if rest.is_empty() {
            return Err(ProtocolError::InvalidUrl(format!(
                "missing archive URL in {}",
                url
            )));
        }

        let mut segments = rest.rsplitn(4, '/');
        let y = segments.next().unwrap_or("");
        let x = segments.next().unwrap_or("");
        let z = segments.next().unwrap_or("");
        let archive = segments.next();

        let y = y.split_once('.').map_or(y, |(stem, _)| stem);

        let archive_url = match archive {
            Some(archive) if is_digits(z) && is_digits(x) && is_digits(y) => archive,
            _ => {
                return Ok(ProtocolUrl::TileJson {
                    archive_url: rest.to_string(),
                })
            }
        };

        if archive_url.is_empty() {
            return Err(ProtocolError::InvalidUrl(format!(
                "missing archive URL in {}",
                url
            )));
        }

        let out_of_range =
            || ProtocolError::InvalidUrl(format!("tile coordinate out of range in {}", url));
        let coord = TileCoord::new(
            z.parse().map_err(|_| out_of_range())?,
            x.parse().map_err(|_| out_of_range())?,
            y.parse().map_err(|_| out_of_range())?,
        );
        if !coord.is_valid() {
            return Err(out_of_range());
        }

        Ok(ProtocolUrl::Tile {
            archive_url: archive_url.to_string(),
            coord,
        })
    }

    pub fn archive_url(&self) -> &str {
        match self {
            ProtocolUrl::Tile { archive_url, .. } | ProtocolUrl::TileJson { archive_url } => {
                archive_url
            }
        }
    }
}

fn is_digits(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}
