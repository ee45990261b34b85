use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::compress::PngOptimization;
use crate::greedy::{CompressOptions, DEFAULT_BLOCK_SIZE, DEFAULT_THRESHOLD};

/// Shrink images by flattening near-uniform blocks before PNG optimization.
#[derive(Debug, Parser)]
#[command(name = "blockpress", version, author, about)]
pub struct Args
{
	// 1. Input/Output Parameters.
	/// Image files to compress. If not provided, all images in --dir (or the current directory) are processed.
	pub files: Vec<PathBuf>,

	/// Directory to scan recursively for images.
	#[arg(short = 'D', long)]
	pub dir: Option<PathBuf>,

	/// Directory for compressed outputs. Defaults to next to each source file.
	#[arg(short, long)]
	pub output: Option<PathBuf>,

	/// Overwrite existing outputs instead of skipping them.
	#[arg(short = 'F', long)]
	pub force: bool,

	// 2. Compression Parameters.
	/// Block edge length in pixels.
	#[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE as i64, allow_negative_numbers = true)]
	pub block_size: i64,

	/// Flatten a block when any channel's standard deviation is below this fraction of 255 (0.0-1.0).
	#[arg(short, long, default_value_t = DEFAULT_THRESHOLD, allow_negative_numbers = true)]
	pub threshold: f64,

	// 3. PNG Optimization Parameters.
	/// Use the Zopfli deflater (much slower, slightly smaller files).
	#[arg(short = 'Z', long)]
	pub zopfli: bool,

	/// Write the plain PNG encoding without oxipng optimization.
	#[arg(short = 'n', long)]
	pub no_optimize: bool,
}

impl Args
{
	/// Validate parameter values and relationships.
	/// Returns the compressor options if all parameters are valid.
	pub fn validate(&self) -> Result<CompressOptions>
	{
		let options: CompressOptions = CompressOptions::from_signed(self.block_size, self.threshold)?;

		// Validate that zopfli and no-optimize are not both set.
		if self.zopfli && self.no_optimize
		{
			return Err(anyhow!("Cannot use --zopfli and --no-optimize together"));
		}

		if let Some(output) = &self.output
		{
			if output.exists() && !output.is_dir()
			{
				return Err(anyhow!("Output path '{}' is not a directory", output.display()));
			}
		}

		Ok(options)
	}

	/// The PNG optimization selected by the flags.
	pub fn optimization(&self) -> PngOptimization
	{
		if self.no_optimize
		{
			PngOptimization::None
		}
		else if self.zopfli
		{
			PngOptimization::Zopfli
		}
		else
		{
			PngOptimization::Standard
		}
	}
}

/// Enumeration representing the mode of operation.
#[derive(Debug, PartialEq, Eq)]
pub enum Mode
{
	Directory(Option<PathBuf>),
	Files(Vec<PathBuf>),
}

/// Determines the mode of operation based on the provided arguments.
pub fn determine_mode(args: &Args, is_image_file: fn(&Path) -> bool) -> Result<Mode>
{
	// If specific files are provided, they take precedence.
	if !args.files.is_empty()
	{
		let mut image_files: Vec<PathBuf> = Vec::new();

		for path in &args.files
		{
			if path.is_file() && is_image_file(path)
			{
				image_files.push(path.clone());
			}
			else
			{
				return Err(anyhow!("Input '{}' is not a supported image file.", path.display()));
			}
		}

		Ok(Mode::Files(image_files))
	}
	else // If no files are specified, use directory mode. Use the specified directory or default to current.
	{
		Ok(Mode::Directory(args.dir.clone()))
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::error::ConfigError;
	use crate::utils::file_utils::is_image_file;
	use pretty_assertions::assert_eq;

	fn parse(args: &[&str]) -> Args
	{
		Args::try_parse_from(std::iter::once("blockpress").chain(args.iter().copied())).expect("valid arguments")
	}

	#[test]
	fn test_defaults()
	{
		let args = parse(&[]);
		assert_eq!(args.block_size, 8);
		assert_eq!(args.threshold, 0.2);
		assert!(!args.force);
		assert_eq!(args.optimization(), PngOptimization::Standard);
		assert_eq!(args.validate().expect("valid"), CompressOptions::default());
	}

	#[test]
	fn test_short_and_long_flags()
	{
		let args = parse(&["-b", "16", "--threshold", "0.35", "-Z", "-o", "out", "a.png", "b.jpg"]);
		assert_eq!(args.block_size, 16);
		assert_eq!(args.threshold, 0.35);
		assert_eq!(args.optimization(), PngOptimization::Zopfli);
		assert_eq!(args.output, Some(PathBuf::from("out")));
		assert_eq!(args.files, vec![PathBuf::from("a.png"), PathBuf::from("b.jpg")]);
	}

	#[test]
	fn test_invalid_block_size_is_config_error()
	{
		for value in ["0", "-8"]
		{
			let error = parse(&["--block-size", value]).validate().expect_err("invalid block size");
			assert!(error.downcast_ref::<ConfigError>().is_some(), "{}", error);
		}
	}

	#[test]
	fn test_invalid_threshold_is_config_error()
	{
		let error = parse(&["-t", "1.2"]).validate().expect_err("invalid threshold");
		assert_eq!(error.downcast_ref::<ConfigError>(), Some(&ConfigError::InvalidThreshold(1.2)));

		assert!(parse(&["-t", "-0.5"]).validate().is_err());
	}

	#[test]
	fn test_conflicting_optimization_flags()
	{
		let args = parse(&["--zopfli", "--no-optimize"]);
		assert!(args.validate().is_err());
	}

	#[test]
	fn test_no_optimize()
	{
		assert_eq!(parse(&["-n"]).optimization(), PngOptimization::None);
	}

	#[test]
	fn test_directory_mode_without_files()
	{
		let args = parse(&["-D", "photos"]);
		assert_eq!(determine_mode(&args, is_image_file).expect("mode"), Mode::Directory(Some(PathBuf::from("photos"))));
	}

	#[test]
	fn test_files_mode_rejects_unsupported_input()
	{
		let dir = tempfile::tempdir().expect("temp dir");
		let image = dir.path().join("a.png");
		let text = dir.path().join("a.txt");
		std::fs::write(&image, b"").expect("write file");
		std::fs::write(&text, b"").expect("write file");

		let args = parse(&[image.to_str().expect("utf-8 path")]);
		assert_eq!(determine_mode(&args, is_image_file).expect("mode"), Mode::Files(vec![image.clone()]));

		let args = parse(&[image.to_str().expect("utf-8 path"), text.to_str().expect("utf-8 path")]);
		assert!(determine_mode(&args, is_image_file).is_err());
	}
}
