//! Tile protocol bridge.
//!
//! Serves `pmtiles://` URLs to the renderer. Requests are decoded into an
//! archive URL plus tile coordinate, forwarded to a callback-style archive
//! reader, and handed back as futures.

mod archive;
mod bridge;
mod registry;
mod request;

pub use archive::{
    ArchiveError, ArchiveHeader, ArchiveMetadata, Completion, StaticArchive, TileArchive,
    TileJson, TileType,
};
pub use bridge::{
    callback_future, ArchiveFactory, Protocol, TileData, TileFuture, TileResponse,
};
pub use registry::{ProtocolHandler, ProtocolRegistry};
pub use request::{
    scheme_of, AbortSignal, ProtocolUrl, TileCoord, TileRequest, MAX_TILE_ZOOM, PMTILES_SCHEME,
};

/// Errors surfaced to the renderer for a protocol request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The URL could not be decoded into an archive request.
    InvalidUrl(String),
    /// No handler is registered for the URL's scheme.
    UnknownScheme(String),
    /// The archive reader reported a failure.
    Archive(ArchiveError),
    /// The archive reader dropped the request without answering.
    Cancelled,
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::InvalidUrl(msg) => write!(f, "Invalid tile URL: {}", msg),
            ProtocolError::UnknownScheme(scheme) => {
                write!(f, "No protocol registered for scheme: {}", scheme)
            }
            ProtocolError::Archive(e) => write!(f, "{}", e),
            ProtocolError::Cancelled => write!(f, "Tile request was dropped by the archive"),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Archive(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArchiveError> for ProtocolError {
    fn from(e: ArchiveError) -> Self {
        ProtocolError::Archive(e)
    }
}
