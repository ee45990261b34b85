use anyhow::{anyhow, Result};
use clap::Parser;
use rayon::prelude::*;
use std::sync::{Mutex, PoisonError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod blocks;
mod compress;
mod decode;
mod error;
mod greedy;
mod raster;
mod stats;
mod utils
{
	pub mod arg_utils;
	pub mod file_utils;
}
use compress::{compress_file, PngOptimization, ProcessingResult};
use utils::arg_utils::{Args, Mode, determine_mode};
use utils::file_utils::{is_image_file, find_images_in_dir, prepare_specific_files, ImageFile};


/// Shrink images by flattening near-uniform blocks before PNG optimization.
fn main() -> Result<()>
{
	init_logging();

	// Parse command line arguments.
	let args: Args = Args::parse();

	// Validate parameters and build the compressor options.
	let options = args.validate()?;
	let optimization: PngOptimization = args.optimization();

	// Determine the mode of operation.
	let mode: Mode = determine_mode(&args, is_image_file)?;

	// Print the processing settings with logical grouping.
	println!("Settings:");
	println!("----------------------------------------");

	// 1. Input/Output Parameters.
	println!("INPUT/OUTPUT:");
	match &mode
	{
		Mode::Directory(Some(dir)) => println!("  - Mode: Directory ({})", dir.display()),
		Mode::Directory(None) => println!("  - Mode: Directory (current)"),
		Mode::Files(files) => println!("  - Mode: Specific Files ({})", files.len()),
	}
	match &args.output
	{
		Some(dir) => println!("  - Output directory: {}", dir.display()),
		None => println!("  - Output directory: next to each source"),
	}
	println!("  - Overwrite existing outputs: {}", if args.force { "Yes" } else { "No" });

	// 2. Compression Parameters.
	println!("\nCOMPRESSION:");
	println!("  - Block size: {}x{}", options.block_size(), options.block_size());
	println!("  - Threshold: {:.2} (std deviation below {:.1})", options.threshold(), options.cutoff());

	// 3. PNG Optimization Parameters.
	println!("\nPNG OPTIMIZATION:");
	let optimization_desc = match optimization
	{
		PngOptimization::None => "Off (plain PNG encoding)",
		PngOptimization::Standard => "oxipng (libdeflate)",
		PngOptimization::Zopfli => "oxipng (Zopfli, slow)",
	};
	println!("  - {}", optimization_desc);
	println!("----------------------------------------");
	println!();

	// Create the output directory if needed.
	if let Some(dir) = &args.output
	{
		std::fs::create_dir_all(dir)
			.map_err(|e| anyhow!("Failed to create output directory '{}': {}", dir.display(), e))?;
	}

	// Discover image files to process.
	let image_files: Vec<ImageFile> = match mode
	{
		Mode::Directory(dir) =>
		{
			if let Some(d) = &dir
			{
				println!("Scanning directory '{}' for images...", d.display());
			}
			else
			{
				println!("Scanning current directory for images...");
			}

			find_images_in_dir(dir.as_deref(), args.output.as_deref())?
		},
		Mode::Files(files) => prepare_specific_files(&files, args.output.as_deref())?,
	};

	// Display discovered files.
	println!("Found {} images to process:", image_files.len());
	for file in &image_files
	{
		println!("  - {} -> {}", file.source_path.display(), file.target_path.display());
	}
	println!();

	println!("Processing files...");

	let total_files: usize = image_files.len();
	let processed: Mutex<usize> = Mutex::new(0);
	let results: Mutex<Vec<ProcessingResult>> = Mutex::new(Vec::new());
	let skipped: Mutex<Vec<String>> = Mutex::new(Vec::new());
	let errors: Mutex<Vec<(String, String)>> = Mutex::new(Vec::new());
	let force: bool = args.force;

	// Process each file in parallel.
	image_files.into_par_iter().for_each(|file|
	{
		let file_path_display: String = file.source_path.display().to_string();
		let outcome = compress_file(&file.source_path, &file.target_path, &options, optimization, force);

		// Update the progress counter.
		let current: usize =
		{
			let mut count = processed.lock().unwrap_or_else(PoisonError::into_inner);
			*count += 1;
			*count
		};

		match outcome
		{
			Ok(Some(result)) =>
			{
				println!("[{}/{}] Compressed: {} | {} -> {} ({:.1}% smaller, {:.1}x, {}/{} blocks flattened)", current, total_files, file_path_display, format_bytes(result.original_size), format_bytes(result.new_size), result.reduction_pct(), result.ratio(), result.report.flattened_blocks, result.report.total_blocks);
				results.lock().unwrap_or_else(PoisonError::into_inner).push(result);
			},
			Ok(None) =>
			{
				println!("[{}/{}] Skipped: {} (output {} already exists, use --force to overwrite)", current, total_files, file_path_display, file.target_path.display());
				skipped.lock().unwrap_or_else(PoisonError::into_inner).push(file_path_display);
			},
			Err(err) =>
			{
				tracing::error!(source = %file_path_display, "{:#}", err);
				eprintln!("[{}/{}] Error processing {}: {}", current, total_files, file_path_display, err);
				errors.lock().unwrap_or_else(PoisonError::into_inner).push((file_path_display, err.to_string()));
			},
		}
	});

	let results: Vec<ProcessingResult> = results.into_inner().unwrap_or_else(PoisonError::into_inner);
	let skipped: Vec<String> = skipped.into_inner().unwrap_or_else(PoisonError::into_inner);
	let errors: Vec<(String, String)> = errors.into_inner().unwrap_or_else(PoisonError::into_inner);

	print_summary(&results, skipped.len(), &errors);

	Ok(())
}

/// Install the tracing subscriber. Verbosity comes from `RUST_LOG`.
fn init_logging()
{
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "blockpress=warn".into()),
		)
		.with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
		.init();
}

/// Print the batch summary.
fn print_summary(results: &[ProcessingResult], skipped_count: usize, errors: &[(String, String)])
{
	println!("\n========================================");
	println!("COMPRESSION SUMMARY");
	println!("========================================");
	println!("Files compressed: {}", results.len());
	println!("Files skipped (output exists): {}", skipped_count);

	if !errors.is_empty()
	{
		println!("Files with errors: {}", errors.len());
		println!("\nErrors:");
		for (file, error) in errors
		{
			println!("  {}: {}", file, error);
		}
	}

	if results.is_empty()
	{
		println!("========================================");
		return;
	}

	let total_original_size: u64 = results.iter().map(|r| r.original_size).sum();
	let total_new_size: u64 = results.iter().map(|r| r.new_size).sum();
	let total_saved: u64 = total_original_size.saturating_sub(total_new_size);
	let total_saved_pct: f64 = if total_original_size > 0
	{
		(total_saved as f64 / total_original_size as f64) * 100.0
	}
	else
	{
		0.0
	};
	let total_ratio: f64 = if total_new_size > 0
	{
		total_original_size as f64 / total_new_size as f64
	}
	else
	{
		0.0
	};

	let total_blocks: usize = results.iter().map(|r| r.report.total_blocks).sum();
	let flattened_blocks: usize = results.iter().map(|r| r.report.flattened_blocks).sum();

	println!("\n----------------------------------------");
	println!("SIZE STATISTICS");
	println!("----------------------------------------");
	println!("Total original size:  {}", format_bytes(total_original_size));
	println!("Total final size:     {}", format_bytes(total_new_size));
	println!("Total space saved:    {} ({:.1}%)", format_bytes(total_saved), total_saved_pct);
	println!("Overall ratio:        {:.1}x", total_ratio);
	println!("Blocks flattened:     {}/{}", flattened_blocks, total_blocks);
	println!("========================================");
}

/// Formats file size in human-readable format.
fn format_bytes(size: u64) -> String
{
	if size < 1024
	{
		format!("{} B", size)
	}
	else if size < 1024 * 1024
	{
		format!("{:.1} KB", size as f64 / 1024.0)
	}
	else
	{
		format!("{:.2} MB", size as f64 / (1024.0 * 1024.0))
	}
}
