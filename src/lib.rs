pub mod archive;
pub mod batch;
pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod estimate;
pub mod formats;
pub mod info;
pub mod logger;
pub mod options;
pub mod plan;
pub mod response;
pub mod selection;
pub mod server;
pub mod settings;
pub mod utils;

pub use batch::{derive_output_name, BatchExecutor, BatchReport, ProcessedOutput, SourceImage};
pub use codec::{Codec, ImageCodec};
pub use error::{CompressionError, Result};
pub use estimate::{estimate, estimate_ratio, Estimate};
pub use formats::{EffectiveFormat, ImageKind};
pub use options::{ColorDepth, CompressionOptions, OutputFormat};
pub use plan::{plan_transform, EncodeSpec, ImageMetadata, TransformPlan};
pub use response::CompressedResponse;
pub use settings::{FileSettingsRepository, MemorySettingsRepository, Preset, SettingsRepository};
