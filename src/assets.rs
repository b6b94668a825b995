//! Collaborator seams for generated assets.
//!
//! The ledger never produces QR codes, barcodes, or normalized images
//! itself; it only discovers files at the canonical locations declared by
//! the [`AssetManifest`]. These traits are the seams the surrounding
//! application plugs its generators into.

use crate::error::Result;
use crate::store::AssetManifest;
use crate::types::ProductId;
use std::path::Path;

/// Produces the QR-code and barcode images for a product.
///
/// Implementations must write to `manifest.qr_path()` and
/// `manifest.barcode_path()`; the id is the value encoded into both.
pub trait AssetGenerator {
    fn generate(&self, id: &ProductId, manifest: &AssetManifest) -> Result<()>;
}

/// Converts an arbitrary uploaded image (including vendor camera formats)
/// into a canonical raster file at `target`.
///
/// The ledger asserts only that `target` exists afterwards.
pub trait ImageNormalizer {
    fn normalize(&self, source: &Path, target: &Path) -> Result<()>;
}

/// Generator for deployments where asset generation happens out of
/// process; reconciliation adopts whatever files show up later.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAssetGenerator;

impl AssetGenerator for NullAssetGenerator {
    fn generate(&self, _id: &ProductId, _manifest: &AssetManifest) -> Result<()> {
        Ok(())
    }
}

/// Normalizer that copies the source bytes verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct CopyImageNormalizer;

impl ImageNormalizer for CopyImageNormalizer {
    fn normalize(&self, source: &Path, target: &Path) -> Result<()> {
        std::fs::copy(source, target)?;
        Ok(())
    }
}
