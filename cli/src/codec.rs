//! Codec backend for CONVERT: images are re-encoded in process, audio and
//! video are handed to ffmpeg.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sortql_core::{ConversionError, Converter, MediaKind};
use tokio::process::Command;
use tracing::debug;

const STDERR_TAIL: usize = 400;

pub struct MediaConverter {
	ffmpeg: PathBuf,
}

impl MediaConverter {
	/// Uses `SORTQL_FFMPEG` when set, otherwise `ffmpeg` from `PATH`.
	pub fn from_env() -> Self {
		let ffmpeg = std::env::var_os("SORTQL_FFMPEG").unwrap_or_else(|| OsString::from("ffmpeg"));
		Self::with_ffmpeg(ffmpeg)
	}

	pub fn with_ffmpeg(ffmpeg: impl Into<PathBuf>) -> Self {
		Self {
			ffmpeg: ffmpeg.into(),
		}
	}

	async fn convert_image(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
		let input = input.to_path_buf();
		let output = output.to_path_buf();

		tokio::task::spawn_blocking(move || {
			let mut decoded = image::open(&input).map_err(image_error)?;
			if drops_alpha(&output) {
				decoded = image::DynamicImage::ImageRgb8(decoded.to_rgb8());
			}
			decoded.save(&output).map_err(image_error)
		})
		.await
		.map_err(|e| ConversionError::Backend(e.to_string()))?
	}

	async fn convert_stream(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
		let result = Command::new(&self.ffmpeg)
			.arg("-y")
			.arg("-loglevel")
			.arg("error")
			.arg("-i")
			.arg(input)
			.arg(output)
			.output()
			.await?;

		if result.status.success() {
			return Ok(());
		}

		let stderr = String::from_utf8_lossy(&result.stderr);
		let stderr = stderr.trim();
		let start = stderr
			.char_indices()
			.rev()
			.nth(STDERR_TAIL)
			.map(|(i, _)| i)
			.unwrap_or(0);

		Err(ConversionError::Backend(format!(
			"{} exited with {}: {}",
			self.ffmpeg.display(),
			result.status,
			&stderr[start..]
		)))
	}
}

#[async_trait]
impl Converter for MediaConverter {
	async fn convert(
		&self,
		input: &Path,
		output: &Path,
		kind: MediaKind,
	) -> Result<(), ConversionError> {
		debug!(input = %input.display(), output = %output.display(), %kind, "Converting media");

		match kind {
			MediaKind::Image => self.convert_image(input, output).await,
			MediaKind::Audio | MediaKind::Video => self.convert_stream(input, output).await,
		}
	}
}

// The JPEG encoder rejects images with an alpha channel.
fn drops_alpha(output: &Path) -> bool {
	output
		.extension()
		.map(|ext| ext.to_string_lossy().to_ascii_lowercase())
		.is_some_and(|ext| ext == "jpg" || ext == "jpeg")
}

fn image_error(error: image::ImageError) -> ConversionError {
	match error {
		image::ImageError::IoError(e) => ConversionError::Io(e),
		image::ImageError::Unsupported(e) => ConversionError::Unsupported(e.to_string()),
		other => ConversionError::Backend(other.to_string()),
	}
}
