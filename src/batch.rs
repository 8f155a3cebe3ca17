use crate::archive;
use crate::codec::Codec;
use crate::constants::{
    ARCHIVE_FILENAME, COMPRESSED_SUFFIX, DEFAULT_OUTPUT_NAME, LARGE_IMAGE_THRESHOLD_MIB,
    MAX_BATCH_FILES, MAX_BATCH_MEMORY_MIB, MAX_CONCURRENT_LARGE_IMAGES, MIN_AVAILABLE_MEMORY_MIB,
};
use crate::error::{CompressionError, Result};
use crate::formats::{EffectiveFormat, ImageKind};
use crate::options::CompressionOptions;
use crate::plan::plan_transform;
use crate::response::CompressedResponse;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use tracing::{debug, warn};

/// A named, encoded input image. Never modified during processing.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessedOutput {
    pub original_name: String,
    /// `<base>-compressed.<ext>`, the name used for downloads and archive entries.
    pub filename: String,
    pub format: EffectiveFormat,
    pub original_size: usize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub name: String,
    pub reason: String,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

/// Everything a batch run produced, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outputs: Vec<ProcessedOutput>,
    pub failures: Vec<ItemFailure>,
    pub total_input_bytes: u64,
}

impl BatchReport {
    pub fn total_output_bytes(&self) -> u64 {
        self.outputs.iter().map(|o| o.bytes.len() as u64).sum()
    }

    /// Input bytes of the items that succeeded.
    pub fn processed_input_bytes(&self) -> u64 {
        self.outputs.iter().map(|o| o.original_size as u64).sum()
    }

    /// One output is returned as-is, two or more are zipped. Zero outputs is a
    /// whole-request failure, never an empty archive.
    pub fn into_response(self) -> Result<CompressedResponse> {
        let BatchReport {
            mut outputs,
            failures,
            ..
        } = self;

        match outputs.len() {
            0 => Err(CompressionError::AllItemsFailed {
                failed: failures.len(),
                first: failures
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            }),
            1 => {
                let output = outputs.remove(0);
                Ok(CompressedResponse::Single {
                    bytes: output.bytes,
                    format: output.format,
                    filename: output.filename,
                })
            }
            _ => Ok(CompressedResponse::Archive {
                bytes: archive::package(&outputs)?,
                filename: ARCHIVE_FILENAME.to_string(),
            }),
        }
    }
}

/// Runs the plan-and-encode pipeline over a batch on a bounded worker pool.
pub struct BatchExecutor<C: Codec> {
    codec: C,
    workers: usize,
    progress: Option<ProgressBar>,
}

impl<C: Codec> BatchExecutor<C> {
    pub fn new(codec: C, workers: usize) -> Self {
        Self {
            codec,
            workers: workers.max(1),
            progress: None,
        }
    }

    /// Ticks `progress` once per finished item.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Processes every image independently. Item failures are recorded in the
    /// report and never abort their siblings.
    pub fn run(&self, images: &[SourceImage], options: &CompressionOptions) -> Result<BatchReport> {
        if images.is_empty() {
            return Err(CompressionError::NoImagesSupplied);
        }

        let (estimated_memory_mib, large_image_count) = validate_batch_limits(images)?;
        let threads = self.parallelism(images.len(), large_image_count);
        debug!(
            files = images.len(),
            estimated_memory_mib,
            large_image_count,
            threads,
            "starting batch"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| CompressionError::WorkerPool(e.to_string()))?;

        let results: Vec<Result<ProcessedOutput>> = pool.install(|| {
            images
                .par_iter()
                .map(|image| {
                    let result = process_isolated(&self.codec, image, options);
                    if let Some(progress) = &self.progress {
                        progress.inc(1);
                    }
                    result
                })
                .collect()
        });

        let mut report = BatchReport {
            total_input_bytes: images.iter().map(|i| i.bytes.len() as u64).sum(),
            ..BatchReport::default()
        };
        for (image, result) in images.iter().zip(results) {
            match result {
                Ok(output) => report.outputs.push(output),
                Err(e) => {
                    warn!(name = %image.name, error = %e, "skipping image that failed to compress");
                    report.failures.push(ItemFailure {
                        name: image.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            succeeded = report.outputs.len(),
            failed = report.failures.len(),
            "batch finished"
        );
        Ok(report)
    }

    /// Runs the batch and shapes the result into a single file or an archive.
    pub fn compress(
        &self,
        images: &[SourceImage],
        options: &CompressionOptions,
    ) -> Result<CompressedResponse> {
        self.run(images, options)?.into_response()
    }

    fn parallelism(&self, total_files: usize, large_image_count: usize) -> usize {
        let baseline = self.workers.min(total_files).max(1);
        if large_image_count >= MAX_CONCURRENT_LARGE_IMAGES {
            baseline.min(MAX_CONCURRENT_LARGE_IMAGES)
        } else {
            baseline
        }
    }
}

/// Probe, plan and encode a single image.
pub fn process_image<C: Codec + ?Sized>(
    codec: &C,
    image: &SourceImage,
    options: &CompressionOptions,
) -> Result<ProcessedOutput> {
    let metadata = codec.probe(&image.bytes)?;
    let plan = plan_transform(&metadata, options);
    let format = plan.effective_format();
    debug!(name = %image.name, ?metadata, ?plan, "planned transform");

    let bytes = codec.encode(&image.bytes, &plan)?;
    Ok(ProcessedOutput {
        original_name: image.name.clone(),
        filename: derive_output_name(&image.name, format.clone()),
        format,
        original_size: image.bytes.len(),
        bytes,
    })
}

/// Like [`process_image`], but a panicking decoder only fails its own item.
fn process_isolated<C: Codec + ?Sized>(
    codec: &C,
    image: &SourceImage,
    options: &CompressionOptions,
) -> Result<ProcessedOutput> {
    panic::catch_unwind(AssertUnwindSafe(|| process_image(codec, image, options)))
        .unwrap_or_else(|_| {
            Err(CompressionError::UnsupportedFormat(format!(
                "codec panicked while processing {}",
                image.name
            )))
        })
}

/// `photo.PNG` + jpeg -> `photo-compressed.jpg`.
///
/// A custom format name is used verbatim as the extension. Only the last
/// extension is stripped. Empty names, or names that are all
/// extension, fall back to the default `image` base.
pub fn derive_output_name(original_name: &str, format: impl Into<EffectiveFormat>) -> String {
    let name = if original_name.is_empty() {
        DEFAULT_OUTPUT_NAME
    } else {
        original_name
    };

    let base = match strip_extension(name) {
        "" => strip_extension(DEFAULT_OUTPUT_NAME),
        base => base,
    };
    format!("{}{}.{}", base, COMPRESSED_SUFFIX, format.into().extension())
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(index) if index + 1 < name.len() && !name[index + 1..].contains('/') => &name[..index],
        _ => name,
    }
}

/// Estimates decoded memory for an encoded buffer, in MiB.
fn estimate_image_memory_usage(image: &SourceImage) -> f64 {
    let size_mib = image.bytes.len() as f64 / (1024.0 * 1024.0);
    let multiplier = image::guess_format(&image.bytes)
        .ok()
        .and_then(ImageKind::from_image_format)
        .map(|kind| kind.memory_multiplier())
        .unwrap_or(3.0);
    size_mib * multiplier
}

/// Rejects batches that are too many files or would not fit in memory.
///
/// Returns the estimated memory in MiB and how many images count as large.
pub fn validate_batch_limits(images: &[SourceImage]) -> Result<(f64, usize)> {
    if images.len() > MAX_BATCH_FILES {
        return Err(CompressionError::BatchFileLimitExceeded(
            images.len(),
            MAX_BATCH_FILES,
        ));
    }

    let mut total_memory_mib = 0.0;
    let mut large_image_count = 0;
    for image in images {
        let estimate = estimate_image_memory_usage(image);
        total_memory_mib += estimate;
        if estimate > LARGE_IMAGE_THRESHOLD_MIB {
            large_image_count += 1;
        }
    }

    let total_memory_mib_u64 = total_memory_mib.ceil() as u64;
    if total_memory_mib_u64 > MAX_BATCH_MEMORY_MIB {
        return Err(CompressionError::BatchMemoryLimitExceeded(
            total_memory_mib_u64,
            MAX_BATCH_MEMORY_MIB,
        ));
    }

    let mut sys =
        System::new_with_specifics(RefreshKind::new().with_memory(MemoryRefreshKind::new()));
    sys.refresh_memory();
    let available_mem_mib = sys.available_memory() / (1024 * 1024);
    // Some sandboxes report no memory at all; only enforce a real reading.
    if available_mem_mib > 0 && total_memory_mib_u64 + MIN_AVAILABLE_MEMORY_MIB > available_mem_mib
    {
        return Err(CompressionError::InsufficientMemory(
            total_memory_mib_u64,
            available_mem_mib,
        ));
    }

    Ok((total_memory_mib, large_image_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{EncodeSpec, ImageMetadata, TransformPlan};
    use std::io::{Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Accepts buffers starting with `ok:` and fakes a 100x50 JPEG.
    struct FakeCodec {
        encodes: AtomicUsize,
    }

    impl FakeCodec {
        fn new() -> Self {
            Self {
                encodes: AtomicUsize::new(0),
            }
        }
    }

    impl Codec for FakeCodec {
        fn probe(&self, bytes: &[u8]) -> Result<ImageMetadata> {
            if bytes.starts_with(b"ok:") {
                Ok(ImageMetadata {
                    width: 100,
                    height: 50,
                    format: Some(ImageKind::Jpeg),
                })
            } else {
                Err(CompressionError::UnsupportedFormat("corrupt".to_string()))
            }
        }

        fn encode(&self, bytes: &[u8], plan: &TransformPlan) -> Result<Vec<u8>> {
            self.encodes.fetch_add(1, Ordering::SeqCst);
            if bytes.ends_with(b"panic") {
                panic!("decoder blew up");
            }
            let tag = match plan.encode {
                EncodeSpec::Png(_) => "png",
                EncodeSpec::Jpeg { .. } => "jpeg",
                EncodeSpec::WebP { .. } => "webp",
                EncodeSpec::Passthrough { .. } => "passthrough",
            };
            Ok(format!("{}:{}", tag, bytes.len()).into_bytes())
        }
    }

    fn image(name: &str, bytes: &[u8]) -> SourceImage {
        SourceImage::new(name, bytes.to_vec())
    }

    fn executor() -> BatchExecutor<FakeCodec> {
        BatchExecutor::new(FakeCodec::new(), 4)
    }

    #[test]
    fn test_derive_output_name() {
        assert_eq!(
            derive_output_name("photo.PNG", ImageKind::Jpeg),
            "photo-compressed.jpg"
        );
        assert_eq!(
            derive_output_name("archive.tar.gz", ImageKind::Png),
            "archive.tar-compressed.png"
        );
        assert_eq!(
            derive_output_name("no_extension", ImageKind::WebP),
            "no_extension-compressed.webp"
        );
        assert_eq!(derive_output_name("", ImageKind::Png), "image-compressed.png");
        assert_eq!(derive_output_name(".png", ImageKind::Gif), "image-compressed.gif");
        assert_eq!(
            derive_output_name("dir.v2/shot", ImageKind::Png),
            "dir.v2/shot-compressed.png"
        );
        assert_eq!(derive_output_name("trailing.", ImageKind::Png), "trailing.-compressed.png");
    }

    #[test]
    fn test_run_preserves_input_order() {
        let images: Vec<_> = (0..12)
            .map(|i| image(&format!("img{}.jpg", i), format!("ok:{}", "x".repeat(i)).as_bytes()))
            .collect();
        let options = CompressionOptions::default();

        let report = executor().run(&images, &options).unwrap();
        let names: Vec<_> = report.outputs.iter().map(|o| o.original_name.clone()).collect();
        let expected: Vec<_> = images.iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, expected);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_run_isolates_failures() {
        let images = vec![
            image("a.png", b"ok:1"),
            image("broken.png", b"garbage"),
            image("c.png", b"ok:3"),
        ];
        let report = executor().run(&images, &CompressionOptions::default()).unwrap();

        assert_eq!(report.outputs.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "broken.png");
        assert_eq!(report.outputs[0].filename, "a-compressed.png");
        assert_eq!(report.outputs[1].filename, "c-compressed.png");
        assert_eq!(report.total_input_bytes, 4 + 7 + 4);
        assert_eq!(report.processed_input_bytes(), 8);
    }

    #[test]
    fn test_run_contains_codec_panics() {
        let images = vec![image("a.jpg", b"ok:fine"), image("b.jpg", b"ok:panic")];
        let report = executor().run(&images, &CompressionOptions::default()).unwrap();
        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.failures[0].name, "b.jpg");
    }

    #[test]
    fn test_run_rejects_empty_batch() {
        let result = executor().run(&[], &CompressionOptions::default());
        assert!(matches!(result, Err(CompressionError::NoImagesSupplied)));
    }

    #[test]
    fn test_failed_probe_never_encodes() {
        let executor = executor();
        let images = vec![image("bad.png", b"nope")];
        let _ = executor.run(&images, &CompressionOptions::default()).unwrap();
        assert_eq!(executor.codec().encodes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_single_output_is_returned_directly() {
        let images = vec![image("photo.PNG", b"ok:1")];
        let options = CompressionOptions::default().with_output_format("jpeg");
        let response = executor().compress(&images, &options).unwrap();

        match response {
            CompressedResponse::Single {
                bytes,
                format,
                filename,
            } => {
                assert_eq!(filename, "photo-compressed.jpg");
                assert_eq!(format, EffectiveFormat::Known(ImageKind::Jpeg));
                assert_eq!(bytes, b"jpeg:4".to_vec());
            }
            other => panic!("expected single file, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_format_keeps_requested_name() {
        let images = vec![image("photo.jpg", b"ok:1")];
        let options = CompressionOptions::default().with_output_format("heic");
        let output = process_image(executor().codec(), &images[0], &options).unwrap();

        assert_eq!(output.filename, "photo-compressed.heic");
        assert_eq!(output.format, EffectiveFormat::Custom("heic".to_string()));
        assert_eq!(output.bytes, b"passthrough:4".to_vec());

        let response = executor().compress(&images, &options).unwrap();
        assert_eq!(response.content_type(), "image/heic");
        assert_eq!(response.filename(), "photo-compressed.heic");
    }

    #[test]
    fn test_two_outputs_become_archive() {
        let images = vec![image("a.jpg", b"ok:1"), image("b.jpg", b"ok:2")];
        let options = CompressionOptions::default().with_output_format("original");
        let response = executor().compress(&images, &options).unwrap();

        match response {
            CompressedResponse::Archive { bytes, filename } => {
                assert_eq!(filename, "compressed-images.zip");
                let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
                assert_eq!(archive.len(), 2);
                let mut first = String::new();
                archive
                    .by_name("a-compressed.jpg")
                    .unwrap()
                    .read_to_string(&mut first)
                    .unwrap();
                assert_eq!(first, "jpeg:4");
            }
            other => panic!("expected archive, got {:?}", other),
        }
    }

    #[test]
    fn test_all_failures_is_request_error() {
        let images = vec![image("x.png", b"bad"), image("y.png", b"worse")];
        let result = executor().compress(&images, &CompressionOptions::default());
        match result {
            Err(CompressionError::AllItemsFailed { failed, first }) => {
                assert_eq!(failed, 2);
                assert!(first.starts_with("x.png"));
            }
            other => panic!("expected AllItemsFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_batch_limits_file_count() {
        let images: Vec<_> = (0..=MAX_BATCH_FILES)
            .map(|i| image(&format!("{}.png", i), b"ok:"))
            .collect();
        assert!(matches!(
            validate_batch_limits(&images),
            Err(CompressionError::BatchFileLimitExceeded(_, _))
        ));
    }

    #[test]
    fn test_validate_batch_limits_small_batch() {
        let images = vec![image("a.png", &[0u8; 2048])];
        let (memory, large) = validate_batch_limits(&images).unwrap();
        assert!(memory > 0.0);
        assert!(memory < 1.0);
        assert_eq!(large, 0);
    }

    #[test]
    fn test_parallelism_caps() {
        let executor = BatchExecutor::new(FakeCodec::new(), 8);
        assert_eq!(executor.parallelism(3, 0), 3);
        assert_eq!(executor.parallelism(20, 0), 8);
        assert_eq!(executor.parallelism(20, MAX_CONCURRENT_LARGE_IMAGES), 2);
        assert_eq!(BatchExecutor::new(FakeCodec::new(), 0).parallelism(5, 0), 1);
    }
}
