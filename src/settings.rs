//! Persisted default options and the quick presets.
//!
//! The core never reads settings on its own; the CLI owns a repository and
//! passes the loaded options down explicitly.

use crate::constants::{DEFAULT_SETTINGS_PATH, SETTINGS_ENV_VAR};
use crate::error::Result;
use crate::options::{ColorDepth, CompressionOptions, OutputFormat};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

pub trait SettingsRepository {
    /// Stored options merged over the defaults. A missing or unreadable
    /// store yields the defaults.
    fn load(&self) -> CompressionOptions;

    fn save(&self, options: &CompressionOptions) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// Options stored as pretty JSON on disk.
#[derive(Debug, Clone)]
pub struct FileSettingsRepository {
    path: PathBuf,
}

impl FileSettingsRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$PIC_COMPRESSOR_SETTINGS`, falling back to `.pic-compressor/settings.json`.
    pub fn default_path() -> PathBuf {
        std::env::var_os(SETTINGS_ENV_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSettingsRepository {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl SettingsRepository for FileSettingsRepository {
    fn load(&self) -> CompressionOptions {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no stored settings, using defaults");
                return CompressionOptions::default();
            }
        };

        CompressionOptions::from_json(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "ignoring unreadable settings file");
            CompressionOptions::default()
        })
    }

    fn save(&self, options: &CompressionOptions) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, options.to_json()?)?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps settings in process memory. For embedders that have no settings
/// file of their own.
#[derive(Debug, Default)]
pub struct MemorySettingsRepository {
    stored: Mutex<Option<CompressionOptions>>,
}

impl MemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsRepository for MemorySettingsRepository {
    fn load(&self) -> CompressionOptions {
        self.stored
            .lock()
            .ok()
            .and_then(|stored| stored.clone())
            .unwrap_or_default()
    }

    fn save(&self, options: &CompressionOptions) -> Result<()> {
        if let Ok(mut stored) = self.stored.lock() {
            *stored = Some(options.clone());
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut stored) = self.stored.lock() {
            *stored = None;
        }
        Ok(())
    }
}

/// Quick presets offered next to the manual settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    /// Web delivery: 1600px WebP at quality 78
    Web,
    /// Full-size PNG at quality 92
    Quality,
    /// 1200px JPEG at quality 65 with an 8-bit palette
    Smallest,
}

impl Preset {
    pub fn options(&self) -> CompressionOptions {
        match self {
            Preset::Web => {
                CompressionOptions::new(1600, OutputFormat::WebP, 78, 9, false, ColorDepth::ThirtyTwo)
            }
            Preset::Quality => {
                CompressionOptions::new(0, OutputFormat::Png, 92, 7, false, ColorDepth::ThirtyTwo)
            }
            Preset::Smallest => {
                CompressionOptions::new(1200, OutputFormat::Jpeg, 65, 9, true, ColorDepth::Eight)
            }
        }
    }
}
