//! Callback-to-future bridge between tile archives and the renderer.
//!
//! The renderer awaits a future per tile; archive readers report through
//! completions. Each request gets its own one-shot channel, so in-flight
//! requests never share state and resolve independently.

use super::archive::{ArchiveError, Completion, TileArchive, TileJson};
use super::request::{ProtocolUrl, TileRequest, PMTILES_SCHEME};
use super::ProtocolError;
use futures_channel::oneshot;
use futures_util::future::{self, FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

/// Payload of a successful protocol response.
#[derive(Debug, Clone, PartialEq)]
pub enum TileData {
    /// Raw tile bytes, passed through undecoded.
    Bytes(Vec<u8>),
    /// Source description for a bare archive URL.
    TileJson(TileJson),
}

/// The `{data}` response shape the renderer expects.
#[derive(Debug, Clone, PartialEq)]
pub struct TileResponse {
    pub data: TileData,
}

impl TileResponse {
    pub fn bytes(data: Vec<u8>) -> Self {
        Self {
            data: TileData::Bytes(data),
        }
    }
}

/// Future returned for every protocol request.
pub type TileFuture = LocalBoxFuture<'static, Result<TileResponse, ProtocolError>>;

/// Runs a callback-style lookup and returns a future of its result.
///
/// `start` receives the completion and must hand it to the collaborator. If the
/// collaborator drops the completion without calling it, the future fails with
/// [`ProtocolError::Cancelled`].
pub fn callback_future<T: 'static>(
    start: impl FnOnce(Completion<T>),
) -> impl Future<Output = Result<T, ProtocolError>> {
    let (tx, rx) = oneshot::channel::<Result<T, ArchiveError>>();

    start(Box::new(move |result| {
        let _ = tx.send(result);
    }));

    rx.map(|received| match received {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ProtocolError::Archive(e)),
        Err(oneshot::Canceled) => Err(ProtocolError::Cancelled),
    })
}

/// Creates an archive reader for an archive URL.
pub type ArchiveFactory = Box<dyn Fn(&str) -> Rc<dyn TileArchive>>;

/// Protocol handler serving tiles out of tile archives.
///
/// Readers are created on first use of an archive URL and reused after that.
pub struct Protocol {
    scheme: String,
    factory: ArchiveFactory,
    archives: RefCell<HashMap<String, Rc<dyn TileArchive>>>,
}

impl Protocol {
    /// Creates a handler for the `pmtiles` scheme.
    pub fn new(factory: impl Fn(&str) -> Rc<dyn TileArchive> + 'static) -> Self {
        Self::with_scheme(PMTILES_SCHEME, factory)
    }

    pub fn with_scheme(
        scheme: impl Into<String>,
        factory: impl Fn(&str) -> Rc<dyn TileArchive> + 'static,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            factory: Box::new(factory),
            archives: RefCell::new(HashMap::new()),
        }
    }

    /// Number of archive readers created so far.
    pub fn archive_count(&self) -> usize {
        self.archives.borrow().len()
    }

    fn archive(&self, archive_url: &str) -> Rc<dyn TileArchive> {
        if let Some(archive) = self.archives.borrow().get(archive_url) {
            return archive.clone();
        }

        log::info!("Opening tile archive: {}", archive_url);
        let archive = (self.factory)(archive_url);
        self.archives
            .borrow_mut()
            .insert(archive_url.to_string(), archive.clone());
        archive
    }

    /// Serves one renderer request.
    ///
    /// Tile URLs resolve with the archive's bytes; bare archive URLs resolve
    /// with the archive's TileJSON. The request's abort signal is not consulted.
    pub fn tile(&self, request: &TileRequest) -> TileFuture {
        log::debug!("Tile request: {}", request.url);

        let parsed = match ProtocolUrl::parse(&request.url, &self.scheme) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Rejecting tile request: {}", e);
                return future::ready(Err(e)).boxed_local();
            }
        };

        match parsed {
            ProtocolUrl::Tile { archive_url, coord } => {
                let archive = self.archive(&archive_url);
                callback_future(move |done| archive.get_tile(coord, done))
                    .map(|result| result.map(TileResponse::bytes))
                    .boxed_local()
            }
            ProtocolUrl::TileJson { archive_url } => {
                let archive = self.archive(&archive_url);
                let tiles_url = format!("{}://{}/{{z}}/{{x}}/{{y}}", self.scheme, archive_url);
                let header = {
                    let archive = archive.clone();
                    callback_future(move |done| archive.get_header(done))
                };
                async move {
                    let header = header.await?;
                    let metadata = callback_future(move |done| archive.get_metadata(done)).await?;
                    Ok::<_, ProtocolError>(TileResponse {
                        data: TileData::TileJson(header.to_tilejson(tiles_url, &metadata)),
                    })
                }
                .boxed_local()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::archive::{ArchiveHeader, ArchiveMetadata, StaticArchive, TileType};
    use super::super::request::TileCoord;
    use super::*;
    use futures_util::future::join_all;
    use std::cell::Cell;

    /// Archive that parks completions until the test releases them.
    #[derive(Default)]
    struct DeferredArchive {
        pending: RefCell<Vec<(TileCoord, Completion<Vec<u8>>)>>,
        lookups: Cell<usize>,
    }

    impl DeferredArchive {
        fn release(&self, coord: TileCoord, result: Result<Vec<u8>, ArchiveError>) {
            let index = self
                .pending
                .borrow()
                .iter()
                .position(|(c, _)| *c == coord)
                .expect("no pending lookup for coordinate");
            let (_, done) = self.pending.borrow_mut().remove(index);
            done(result);
        }
    }

    impl TileArchive for DeferredArchive {
        fn get_tile(&self, coord: TileCoord, done: Completion<Vec<u8>>) {
            self.lookups.set(self.lookups.get() + 1);
            self.pending.borrow_mut().push((coord, done));
        }

        fn get_header(&self, done: Completion<ArchiveHeader>) {
            done(Ok(ArchiveHeader::default()));
        }
    }

    /// Archive that loses every completion.
    struct ForgetfulArchive;

    impl TileArchive for ForgetfulArchive {
        fn get_tile(&self, _coord: TileCoord, done: Completion<Vec<u8>>) {
            drop(done);
        }

        fn get_header(&self, done: Completion<ArchiveHeader>) {
            drop(done);
        }
    }

    fn static_protocol() -> Protocol {
        Protocol::new(|_url| {
            Rc::new(
                StaticArchive::new(ArchiveHeader {
                    min_zoom: 14,
                    max_zoom: 16,
                    bounds: [139.0, 35.0, 140.0, 36.0],
                    center: [139.74, 35.66, 15.0],
                    tile_type: TileType::Mvt,
                })
                .with_tile(TileCoord::new(14, 100, 200), vec![1, 2, 3])
                .with_metadata(ArchiveMetadata {
                    name: Some("buildings".into()),
                    attribution: Some("PLATEAU".into()),
                    vector_layers: vec![serde_json::json!({"id": "PLATEAU"})],
                    ..ArchiveMetadata::default()
                }),
            ) as Rc<dyn TileArchive>
        })
    }

    #[test]
    fn test_tile_resolves_with_bytes() {
        let protocol = static_protocol();
        let request = TileRequest::new("pmtiles://https://host/archive.pmtiles/14/100/200");

        let response = pollster::block_on(protocol.tile(&request)).unwrap();
        assert_eq!(response, TileResponse::bytes(vec![1, 2, 3]));
    }

    #[test]
    fn test_tile_not_found_rejects_with_archive_error() {
        let protocol = static_protocol();
        let request = TileRequest::new("pmtiles://https://host/archive.pmtiles/14/100/201");

        let err = pollster::block_on(protocol.tile(&request)).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::Archive(ArchiveError::TileNotFound(TileCoord::new(14, 100, 201)))
        );
    }

    #[test]
    fn test_tilejson_request() {
        let protocol = static_protocol();
        let request = TileRequest::new("pmtiles://https://host/archive.pmtiles");

        let response = pollster::block_on(protocol.tile(&request)).unwrap();
        match response.data {
            TileData::TileJson(tilejson) => {
                assert_eq!(
                    tilejson.tiles,
                    vec!["pmtiles://https://host/archive.pmtiles/{z}/{x}/{y}".to_string()]
                );
                assert_eq!((tilejson.minzoom, tilejson.maxzoom), (14, 16));
                assert_eq!(tilejson.name.as_deref(), Some("buildings"));
                assert_eq!(tilejson.attribution.as_deref(), Some("PLATEAU"));
                assert_eq!(
                    tilejson.vector_layers,
                    Some(vec![serde_json::json!({"id": "PLATEAU"})])
                );
            }
            other => panic!("expected TileJSON, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_url_never_reaches_archive() {
        let archive = Rc::new(DeferredArchive::default());
        let shared = archive.clone();
        let protocol = Protocol::new(move |_| shared.clone() as Rc<dyn TileArchive>);

        let request = TileRequest::new("pmtiles://https://host/a.pmtiles/1/5/0");
        let err = pollster::block_on(protocol.tile(&request)).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidUrl(_)));
        assert_eq!(archive.lookups.get(), 0);
    }

    #[test]
    fn test_dropped_completion_is_cancelled() {
        let protocol = Protocol::new(|_| Rc::new(ForgetfulArchive) as Rc<dyn TileArchive>);
        let request = TileRequest::new("pmtiles://https://host/a.pmtiles/0/0/0");
        let err = pollster::block_on(protocol.tile(&request)).unwrap_err();
        assert_eq!(err, ProtocolError::Cancelled);
    }

    #[test]
    fn test_archive_reader_reused_per_url() {
        let opened = Rc::new(Cell::new(0));
        let counter = opened.clone();
        let protocol = Protocol::new(move |_| {
            counter.set(counter.get() + 1);
            Rc::new(StaticArchive::default()) as Rc<dyn TileArchive>
        });

        for url in [
            "pmtiles://https://host/a.pmtiles/0/0/0",
            "pmtiles://https://host/a.pmtiles",
            "pmtiles://https://host/b.pmtiles/0/0/0",
        ] {
            let _ = pollster::block_on(protocol.tile(&TileRequest::new(url)));
        }

        assert_eq!(opened.get(), 2);
        assert_eq!(protocol.archive_count(), 2);
    }

    #[test]
    fn test_concurrent_requests_resolve_independently() {
        let archive = Rc::new(DeferredArchive::default());
        let shared = archive.clone();
        let protocol = Protocol::new(move |_| shared.clone() as Rc<dyn TileArchive>);

        let mut futures: Vec<TileFuture> = (0..10u32)
            .map(|i| {
                protocol.tile(&TileRequest::new(format!(
                    "pmtiles://https://host/a.pmtiles/14/{}/200",
                    i
                )))
            })
            .collect();

        assert_eq!(archive.lookups.get(), 10);
        for fut in futures.iter_mut() {
            assert!(fut.now_or_never().is_none());
        }

        // Settle one request; every other request stays pending.
        archive.release(TileCoord::new(14, 3, 200), Ok(vec![3]));
        for (i, fut) in futures.iter_mut().enumerate() {
            let polled = fut.now_or_never();
            if i == 3 {
                assert_eq!(polled, Some(Ok(TileResponse::bytes(vec![3]))));
            } else {
                assert!(polled.is_none(), "request {} settled early", i);
            }
        }

        // Settle the rest in reverse order, failing the even ones.
        let remaining: Vec<TileFuture> = futures
            .into_iter()
            .enumerate()
            .filter(|(i, _)| *i != 3)
            .map(|(_, f)| f)
            .collect();
        for i in (0..10u32).rev().filter(|i| *i != 3) {
            let coord = TileCoord::new(14, i, 200);
            if i % 2 == 0 {
                archive.release(coord, Err(ArchiveError::Fetch(format!("tile {}", i))));
            } else {
                archive.release(coord, Ok(vec![i as u8]));
            }
        }

        let results = pollster::block_on(join_all(remaining));
        let expected: Vec<u32> = (0..10).filter(|i| *i != 3).collect();
        for (i, result) in expected.into_iter().zip(results) {
            if i % 2 == 0 {
                assert_eq!(
                    result,
                    Err(ProtocolError::Archive(ArchiveError::Fetch(format!("tile {}", i))))
                );
            } else {
                assert_eq!(result, Ok(TileResponse::bytes(vec![i as u8])));
            }
        }
    }
}
