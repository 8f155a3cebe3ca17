use crate::options::{ColorDepth, CompressionOptions};
use crate::settings::Preset;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pic-compressor",
    about = "Batch image compression with resize, format conversion and palette reduction",
    long_about = "pic-compressor shrinks JPEG, PNG and WebP images by resizing, re-encoding and \
                  optionally reducing PNGs to a palette. One input produces one compressed file; \
                  several inputs are bundled into compressed-images.zip.",
    version,
    after_help = "EXAMPLES:\n  \
    pic-compressor compress photo.png -f jpeg -q 80\n  \
    pic-compressor compress ./shots -r -p web -o ./out\n  \
    pic-compressor estimate \"./shots/*.png\" -m 1600\n  \
    pic-compressor settings preset smallest\n  \
    pic-compressor serve --port 3030"
)]
pub struct Args {
    #[arg(long, global = true, help = "Only print errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, global = true, help = "Print per-file details and debug diagnostics")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Settings file (default: $PIC_COMPRESSOR_SETTINGS or .pic-compressor/settings.json)"
    )]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Compress one or more images",
        long_about = "Compress images with the saved settings, overridden by any option flags. \
                      A single surviving output is written as <name>-compressed.<ext>; two or more \
                      are written as one zip archive. Images that fail to decode are skipped."
    )]
    Compress {
        #[arg(
            required = true,
            help = "Input files, directories or glob patterns",
            long_help = "Each input can be a file, a directory or a glob expression. \
                         Duplicate files (same name, size and modification time) are skipped."
        )]
        inputs: Vec<String>,

        #[arg(
            short = 'o',
            long,
            help = "Output file or directory (default: current directory)"
        )]
        output: Option<PathBuf>,

        #[arg(short = 'r', long, help = "Process subdirectories recursively")]
        recursive: bool,

        #[arg(
            short = 'j',
            long,
            help = "Number of parallel workers (default: WORKERS or CPU count)"
        )]
        workers: Option<usize>,

        #[command(flatten)]
        options: OptionArgs,
    },

    #[command(
        about = "Predict the output size without compressing",
        long_about = "Apply the size model to the selected files and print the predicted output \
                      size and savings. No pixels are decoded."
    )]
    Estimate {
        #[arg(required = true, help = "Input files, directories or glob patterns")]
        inputs: Vec<String>,

        #[arg(short = 'r', long, help = "Process subdirectories recursively")]
        recursive: bool,

        #[arg(long, help = "Print the estimate as JSON")]
        json: bool,

        #[command(flatten)]
        options: OptionArgs,
    },

    #[command(
        about = "Show image metadata and the planned transform",
        long_about = "Probe an image and print its dimensions, detected format, the resize and \
                      encode steps the current options would apply, and the estimated output size."
    )]
    Info {
        #[arg(help = "Image file path to analyze")]
        input: PathBuf,

        #[command(flatten)]
        options: OptionArgs,
    },

    #[command(about = "Show, save or reset the default compression settings")]
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    #[command(
        about = "Run the HTTP compression API",
        long_about = "Serve POST /api/compress. Host, port, upload limit and workers come from \
                      HOST, PORT, MAX_UPLOAD_SIZE and WORKERS (a .env file is read if present); \
                      flags override them."
    )]
    Serve {
        #[arg(long, help = "Bind address (default: HOST or 127.0.0.1)")]
        host: Option<String>,

        #[arg(long, help = "Listen port (default: PORT or 3030)")]
        port: Option<u16>,

        #[arg(short = 'j', long, help = "Number of parallel workers per request")]
        workers: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    #[command(about = "Print the current settings as JSON")]
    Show,

    #[command(about = "Save option flags over the current settings")]
    Save {
        #[command(flatten)]
        options: OptionArgs,
    },

    #[command(about = "Replace the settings with a quick preset")]
    Preset {
        #[arg(value_enum)]
        preset: Preset,
    },

    #[command(about = "Restore the default settings")]
    Reset,
}

/// Option flags layered over the saved settings.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct OptionArgs {
    #[arg(
        short = 'p',
        long,
        value_enum,
        help = "Start from a preset instead of the saved settings"
    )]
    pub preset: Option<Preset>,

    #[arg(
        short = 'm',
        long,
        help = "Cap the longer side in pixels (0 disables resizing)"
    )]
    pub max_side: Option<u32>,

    #[arg(
        short = 'f',
        long,
        help = "Output format (png, jpeg, webp, original)",
        long_help = "Output format. `original` keeps the detected source format; any other \
                     unknown name also re-encodes in the source format with encoder defaults."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'q',
        long,
        allow_negative_numbers = true,
        help = "Quality 10-100, out-of-range values are clamped"
    )]
    pub quality: Option<i64>,

    #[arg(
        short = 'l',
        long,
        allow_negative_numbers = true,
        help = "PNG compression level 0-9, out-of-range values are clamped"
    )]
    pub png_level: Option<i64>,

    #[arg(long, overrides_with = "no_reduce_colors", help = "Reduce PNG output to a palette")]
    pub reduce_colors: bool,

    #[arg(long, overrides_with = "reduce_colors", help = "Keep full-color PNG output")]
    pub no_reduce_colors: bool,

    #[arg(
        short = 'd',
        long,
        value_enum,
        help = "Palette color depth; 8 caps the palette at 256 colors"
    )]
    pub color_depth: Option<ColorDepth>,
}

impl OptionArgs {
    /// Layers the flags over `base`, or over the preset when one is given.
    pub fn apply(&self, base: CompressionOptions) -> CompressionOptions {
        let mut options = self.preset.map(|preset| preset.options()).unwrap_or(base);

        if let Some(max_side) = self.max_side {
            options = options.with_max_side(max_side);
        }
        if let Some(format) = &self.format {
            options = options.with_output_format(format.as_str());
        }
        if let Some(quality) = self.quality {
            options = options.with_quality(quality);
        }
        if let Some(png_level) = self.png_level {
            options = options.with_png_level(png_level);
        }
        if self.reduce_colors {
            options = options.with_reduce_colors(true);
        } else if self.no_reduce_colors {
            options = options.with_reduce_colors(false);
        }
        if let Some(color_depth) = self.color_depth {
            options = options.with_color_depth(color_depth);
        }
        options
    }
}
