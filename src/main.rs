use anyhow::{bail, Context, Result};
use clap::Parser;
use pic_compressor::batch::{BatchExecutor, SourceImage};
use pic_compressor::cli::{Args, Commands, OptionArgs, SettingsAction};
use pic_compressor::codec::ImageCodec;
use pic_compressor::config::AppConfig;
use pic_compressor::estimate::estimate;
use pic_compressor::info::print_image_info;
use pic_compressor::options::CompressionOptions;
use pic_compressor::selection::{dedup_selection, SelectedFile};
use pic_compressor::settings::{FileSettingsRepository, SettingsRepository};
use pic_compressor::utils::{
    collect_image_files, create_progress_bar, format_file_size, print_compression_result,
};
use pic_compressor::{detail, logger, report, server};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.quiet, args.verbose);

    let repository = args
        .settings
        .clone()
        .map(FileSettingsRepository::new)
        .unwrap_or_default();

    match args.command {
        Commands::Compress {
            inputs,
            output,
            recursive,
            workers,
            options,
        } => {
            let options = options.apply(repository.load());
            let workers = workers.unwrap_or_else(|| AppConfig::from_env().batch.workers);
            compress(&inputs, output.as_deref(), recursive, workers, &options)?;
        }
        Commands::Estimate {
            inputs,
            recursive,
            json,
            options,
        } => {
            let options = options.apply(repository.load());
            print_estimate(&inputs, recursive, json, &options)?;
        }
        Commands::Info { input, options } => {
            let options = options.apply(repository.load());
            print_image_info(&ImageCodec, &input, &options)?;
        }
        Commands::Settings { action } => manage_settings(&repository, action)?,
        Commands::Serve {
            host,
            port,
            workers,
        } => {
            let mut config = AppConfig::from_env();
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(workers) = workers {
                config.batch.workers = workers.max(1);
            }

            let executor = BatchExecutor::new(ImageCodec, config.batch.workers);
            let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            runtime.block_on(server::serve(&config, executor))?;
        }
    }

    Ok(())
}

/// Expands every input, drops duplicate files and keeps input order.
fn select_files(inputs: &[String], recursive: bool) -> Result<Vec<SelectedFile>> {
    let mut selection = Vec::new();
    let mut skipped = 0;

    for input in inputs {
        let incoming = collect_image_files(input, recursive)?
            .iter()
            .map(|path| SelectedFile::from_path(path))
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("failed to read metadata for {}", input))?;
        let (merged, dropped) = dedup_selection(selection, incoming);
        selection = merged;
        skipped += dropped;
    }

    if skipped > 0 {
        report!("⚠️  Skipped {} duplicate file(s)", skipped);
    }
    if selection.is_empty() {
        bail!("No image files found in: {}", inputs.join(", "));
    }
    Ok(selection)
}

fn compress(
    inputs: &[String],
    output: Option<&Path>,
    recursive: bool,
    workers: usize,
    options: &CompressionOptions,
) -> Result<()> {
    let selection = select_files(inputs, recursive)?;
    report!("🔍 Found {} image(s) to compress", selection.len());
    debug!(?options, workers, "compressing");

    let images = selection
        .iter()
        .map(|file| {
            let name = file
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            fs::read(&file.path)
                .map(|bytes| SourceImage::new(name, bytes))
                .with_context(|| format!("failed to read {}", file.path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let progress = create_progress_bar(images.len() as u64);
    if logger::is_quiet() {
        progress.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    let executor = BatchExecutor::new(ImageCodec, workers).with_progress(progress.clone());
    let batch_report = executor.run(&images, options)?;
    progress.finish_and_clear();

    for output in &batch_report.outputs {
        detail!(
            "📄 {} -> {} ({} -> {})",
            output.original_name,
            output.filename,
            format_file_size(output.original_size as u64),
            format_file_size(output.bytes.len() as u64)
        );
    }
    for failure in &batch_report.failures {
        report!("❌ Skipped {}", failure);
    }
    let processed_input = batch_report.processed_input_bytes();
    let total_output = batch_report.total_output_bytes();
    let succeeded = batch_report.outputs.len();

    let response = batch_report.into_response()?;
    let destination = output_path(output, response.filename());
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    fs::write(&destination, response.bytes())
        .with_context(|| format!("failed to write {}", destination.display()))?;

    report!(
        "✅ Compressed {} of {} image(s) into {:?}",
        succeeded,
        images.len(),
        destination
    );
    print_compression_result(processed_input, total_output);
    Ok(())
}

/// An existing directory receives the derived filename; anything else is
/// used as the exact output path.
fn output_path(output: Option<&Path>, filename: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(filename),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(filename),
    }
}

fn print_estimate(
    inputs: &[String],
    recursive: bool,
    json: bool,
    options: &CompressionOptions,
) -> Result<()> {
    let selection = select_files(inputs, recursive)?;
    let total_bytes: u64 = selection
        .iter()
        .map(|file| fs::metadata(&file.path).map(|m| m.len()))
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .sum();
    let prediction = estimate(options, total_bytes, selection.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
        return Ok(());
    }

    report!("📦 {} file(s), {} total", selection.len(), format_file_size(total_bytes));
    report!(
        "📈 Estimated output: {}",
        format_file_size(prediction.estimated_size)
    );
    report!(
        "🎯 Estimated saving: {} ({}%)",
        format_file_size(prediction.saving_size),
        prediction.saving_rate
    );
    Ok(())
}

fn manage_settings(repository: &FileSettingsRepository, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            println!("{}", repository.load().to_json()?);
        }
        SettingsAction::Save { options } => {
            save_settings(repository, &options)?;
        }
        SettingsAction::Preset { preset } => {
            repository.save(&preset.options())?;
            report!("✅ Applied {:?} preset to {:?}", preset, repository.path());
        }
        SettingsAction::Reset => {
            repository.clear()?;
            report!("✅ Settings reset to defaults");
        }
    }
    Ok(())
}

fn save_settings(repository: &FileSettingsRepository, options: &OptionArgs) -> Result<()> {
    let updated = options.apply(repository.load());
    repository.save(&updated)?;
    report!("✅ Settings saved to {:?}", repository.path());
    Ok(())
}
