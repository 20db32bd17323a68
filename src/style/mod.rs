//! Typed map style declarations.
//!
//! Everything here serializes to the renderer's JSON style format, so the
//! same values drive the browser renderer and the native recording renderer.

mod color;
mod document;
mod expression;
mod layer;
mod sky;
mod source;

pub use color::{Color, ColorError};
pub use document::StyleDocument;
pub use expression::{EvaluationContext, Expression, ExpressionError};
pub use layer::{FillExtrusionPaint, LayerSpec, LayerType};
pub use sky::SkySpec;
pub use source::{DemEncoding, RasterDemSource, SourceSpec, TerrainSpec, VectorSource};

/// A declaration with a property value the renderer would reject.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleError {
    pub property: &'static str,
    pub reason: String,
}

impl StyleError {
    pub fn invalid(property: &'static str, reason: impl Into<String>) -> Self {
        Self {
            property,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for StyleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid {}: {}", self.property, self.reason)
    }
}

impl std::error::Error for StyleError {}
