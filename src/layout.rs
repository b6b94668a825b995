//! On-disk layout of the data directory.
//!
//! Every component receives a [`Layout`] explicitly instead of consulting
//! ambient process state; the layout is the single authority on where the
//! store, log, config, assets, and backups live.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Canonical file and directory names inside the data directory.
pub const STORE_FILE: &str = "inventory.csv";
pub const LOG_FILE: &str = "history.csv";
pub const CONFIG_FILE: &str = "config.json";
pub const MACHINE_ID_FILE: &str = "machine.id";
pub const LOGO_FILE: &str = "logo.png";
pub const PLACEHOLDER_FILE: &str = "placeholder.png";
pub const IMAGE_DIR: &str = "product_images";
pub const QR_DIR: &str = "qr_codes";
pub const BARCODE_DIR: &str = "barcodes";
pub const BACKUP_DIR: &str = "backups";

/// A minimal 1x1 PNG seeded as the shared placeholder when none exists,
/// so image references always resolve to a real file.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Installation-level configuration, persisted as JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub company_name: String,
    pub license_key: String,
}

/// Filesystem layout for one business location.
#[derive(Clone, Debug)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store_file(&self) -> PathBuf {
        self.root.join(STORE_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn machine_id_file(&self) -> PathBuf {
        self.root.join(MACHINE_ID_FILE)
    }

    pub fn logo_file(&self) -> PathBuf {
        self.root.join(LOGO_FILE)
    }

    pub fn placeholder_file(&self) -> PathBuf {
        self.root.join(PLACEHOLDER_FILE)
    }

    pub fn image_dir(&self) -> PathBuf {
        self.root.join(IMAGE_DIR)
    }

    pub fn qr_dir(&self) -> PathBuf {
        self.root.join(QR_DIR)
    }

    pub fn barcode_dir(&self) -> PathBuf {
        self.root.join(BARCODE_DIR)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(BACKUP_DIR)
    }

    /// Create the directory tree and seed the placeholder image.
    ///
    /// Idempotent; safe to call on every startup.
    pub fn bootstrap(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        for dir in [
            self.image_dir(),
            self.qr_dir(),
            self.barcode_dir(),
            self.backup_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }

        let placeholder = self.placeholder_file();
        if !placeholder.exists() {
            fs::write(&placeholder, PLACEHOLDER_PNG)?;
        }

        Ok(())
    }

    /// Load the installation config.
    ///
    /// `None` means first-run setup has not completed. An unreadable config
    /// is treated the same way rather than failing startup.
    pub fn load_config(&self) -> Result<Option<AppConfig>> {
        let path = self.config_file();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str(&raw) {
            Ok(config) => Ok(Some(config)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config file unreadable, treating as unconfigured");
                Ok(None)
            }
        }
    }

    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let encoded = serde_json::to_string(config)?;
        fs::write(self.config_file(), encoded)?;
        Ok(())
    }

    /// Stable per-installation machine id, minted on first use.
    ///
    /// Used by the license oracle's machine binding.
    pub fn machine_id(&self) -> Result<String> {
        let path = self.machine_id_file();
        if path.exists() {
            let id = fs::read_to_string(&path)?;
            let id = id.trim();
            if !id.is_empty() {
                return Ok(id.to_string());
            }
        }
        let id = uuid::Uuid::new_v4().simple().to_string();
        fs::write(&path, &id)?;
        Ok(id)
    }
}
