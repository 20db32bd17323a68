//! Custom URL scheme registry.
//!
//! The renderer resolves every URL whose scheme has a registered handler
//! through that handler instead of its own fetch machinery.

use super::bridge::{Protocol, TileFuture};
use super::request::TileRequest;
use super::ProtocolError;
use futures_util::future::{self, FutureExt};
use std::collections::HashMap;
use std::rc::Rc;

/// Something that can answer renderer requests for a URL scheme.
pub trait ProtocolHandler {
    fn handle(&self, request: &TileRequest) -> TileFuture;
}

impl ProtocolHandler for Protocol {
    fn handle(&self, request: &TileRequest) -> TileFuture {
        self.tile(request)
    }
}

impl<F> ProtocolHandler for F
where
    F: Fn(&TileRequest) -> TileFuture,
{
    fn handle(&self, request: &TileRequest) -> TileFuture {
        self(request)
    }
}

/// Scheme name to handler table.
#[derive(Default)]
pub struct ProtocolRegistry {
    handlers: HashMap<String, Rc<dyn ProtocolHandler>>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `scheme`, replacing any previous handler.
    pub fn register(&mut self, scheme: impl Into<String>, handler: Rc<dyn ProtocolHandler>) {
        let scheme = scheme.into();
        if self.handlers.insert(scheme.clone(), handler).is_some() {
            log::warn!("Replacing protocol handler for scheme: {}", scheme);
        } else {
            log::info!("Registered protocol handler for scheme: {}", scheme);
        }
    }

    /// Removes the handler for `scheme`. Returns true if one was registered.
    pub fn remove(&mut self, scheme: &str) -> bool {
        self.handlers.remove(scheme).is_some()
    }

    pub fn is_registered(&self, scheme: &str) -> bool {
        self.handlers.contains_key(scheme)
    }

    /// Routes `request` to the handler registered for its scheme.
    pub fn dispatch(&self, request: &TileRequest) -> TileFuture {
        let scheme = request.scheme().unwrap_or("");
        match self.handlers.get(scheme) {
            Some(handler) => handler.handle(request),
            None => {
                future::ready(Err(ProtocolError::UnknownScheme(scheme.to_string()))).boxed_local()
            }
        }
    }
}
