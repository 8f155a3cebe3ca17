pub const DEFAULT_MAX_SIDE: u32 = 0;
pub const DEFAULT_QUALITY: u8 = 85;
pub const MIN_QUALITY: u8 = 10;
pub const MAX_QUALITY: u8 = 100;

pub const DEFAULT_PNG_LEVEL: u8 = 9;
pub const MIN_PNG_LEVEL: u8 = 0;
pub const MAX_PNG_LEVEL: u8 = 9;

/// libdeflater effort for each PNG level 0-9.
pub const LIBDEFLATER_LEVELS: [u8; 10] = [1, 2, 3, 4, 5, 6, 8, 10, 11, 12];
/// oxipng preset for each PNG level 0-9.
pub const OXIPNG_PRESETS: [u8; 10] = [0, 1, 1, 2, 2, 3, 4, 4, 5, 6];

pub const PALETTE_COLORS: u32 = 256;

pub const COMPRESSED_SUFFIX: &str = "-compressed";
pub const DEFAULT_OUTPUT_NAME: &str = "image.png";
pub const ARCHIVE_FILENAME: &str = "compressed-images.zip";
pub const ARCHIVE_MIME_TYPE: &str = "application/zip";

pub const MAX_BATCH_FILES: usize = 200;
pub const MAX_BATCH_MEMORY_MIB: u64 = 4096;
pub const MIN_AVAILABLE_MEMORY_MIB: u64 = 256;
pub const LARGE_IMAGE_THRESHOLD_MIB: f64 = 64.0;
pub const MAX_CONCURRENT_LARGE_IMAGES: usize = 2;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3030;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

pub const SETTINGS_ENV_VAR: &str = "PIC_COMPRESSOR_SETTINGS";
pub const DEFAULT_SETTINGS_PATH: &str = ".pic-compressor/settings.json";

pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "bmp", "tiff", "tif", "gif", "avif", "ico",
];

pub const PROGRESS_BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";
