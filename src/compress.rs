use anyhow::{anyhow, Result};
use image::{DynamicImage, ImageFormat};
use oxipng::{optimize_from_memory, Deflater, Options as OxiOptions};
use tracing::{debug, info, warn};

use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::decode;
use crate::greedy::{greedy_compress, CompressOptions, CompressionReport};
use crate::raster::Raster;

/// How the encoded PNG is optimized before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngOptimization
{
	/// Write the plain PNG encoding.
	None,

	/// oxipng with libdeflate, a good balance of speed and size.
	Standard,

	/// oxipng with Zopfli - slower but smallest output.
	Zopfli,
}

/// Results of processing an image file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult
{
	/// The original file size in bytes.
	pub original_size: u64,

	/// The output file size in bytes.
	pub new_size: u64,

	/// Block counts from the compressor.
	pub report: CompressionReport,
}

impl ProcessingResult
{
	/// Original size divided by output size.
	pub fn ratio(&self) -> f64
	{
		if self.new_size == 0
		{
			0.0
		}
		else
		{
			self.original_size as f64 / self.new_size as f64
		}
	}

	/// Size reduction in percent (negative when the output grew).
	pub fn reduction_pct(&self) -> f64
	{
		if self.original_size == 0
		{
			0.0
		}
		else
		{
			(1.0 - (self.new_size as f64 / self.original_size as f64)) * 100.0
		}
	}
}

/// Compresses one image file into a PNG at `target_path`.
///
/// The source is decoded, low-variation blocks are flattened, and the result is encoded as PNG
/// and optionally optimized with oxipng. The source file is never modified.
///
/// Returns `None` when the target already exists and `force` is false.
pub fn compress_file(source_path: &Path, target_path: &Path, options: &CompressOptions, optimization: PngOptimization, force: bool) -> Result<Option<ProcessingResult>>
{
	if !force && target_path.exists()
	{
		warn!(target = %target_path.display(), "output already exists, skipping");
		return Ok(None);
	}

	// Get the original file size.
	let original_size: u64 = fs::metadata(source_path)
		.map_err(|e| anyhow!("Failed to get file metadata: {}", e))?
		.len();

	let raster: Raster = decode::load_image(source_path)?;
	let compressed = greedy_compress(&raster, options)?;
	let report: CompressionReport = compressed.report;

	let encoded: Vec<u8> = encode_png(compressed.raster)?;
	debug!(bytes = encoded.len(), "encoded PNG");

	let output_data: Vec<u8> = match optimization
	{
		PngOptimization::None => encoded,
		_ => optimize_png(&encoded, optimization)?,
	};

	fs::write(target_path, &output_data)
		.map_err(|e| anyhow!("Failed to write output file: {}", e))?;

	// Get the new file size.
	let new_size: u64 = fs::metadata(target_path)
		.map_err(|e| anyhow!("Failed to get output file metadata: {}", e))?
		.len();

	info!(
		source = %source_path.display(),
		target = %target_path.display(),
		original_size,
		new_size,
		flattened = report.flattened_blocks,
		total = report.total_blocks,
		flattened_ratio = report.flattened_ratio(),
		"compressed image"
	);

	Ok(Some(ProcessingResult
	{
		original_size,
		new_size,
		report,
	}))
}

/// Encode a raster as an 8-bit RGB PNG in memory.
pub fn encode_png(raster: Raster) -> Result<Vec<u8>>
{
	let img = DynamicImage::ImageRgb8(raster.into_rgb_image()?);

	let mut buffer: Vec<u8> = Vec::new();
	{
		let mut cursor = Cursor::new(&mut buffer);
		img.write_to(&mut cursor, ImageFormat::Png)
			.map_err(|e| anyhow!("Failed to encode PNG: {}", e))?;
	}

	Ok(buffer)
}

/// Lossless PNG optimization. Flattened blocks become long runs that deflate well.
fn optimize_png(png_data: &[u8], optimization: PngOptimization) -> Result<Vec<u8>>
{
	let mut options = OxiOptions::from_preset(2);
	options.strip = oxipng::StripChunks::Safe;
	options.optimize_alpha = true;
	options.interlace = None;
	options.bit_depth_reduction = true;
	options.color_type_reduction = true;
	options.palette_reduction = true;

	if optimization == PngOptimization::Zopfli
	{
		options.deflater = Deflater::Zopfli(Default::default());
	}

	let optimized: Vec<u8> = optimize_from_memory(png_data, &options)
		.map_err(|e| anyhow!("Failed to optimize PNG: {}", e))?;

	Ok(optimized)
}
