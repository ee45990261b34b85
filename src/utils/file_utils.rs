use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix given to every output file name.
pub const OUTPUT_PREFIX: &str = "compressed_";

/// Extensions decoded by the `image` crate.
const STANDARD_EXTENSIONS: [&str; 11] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff", "gif", "webp", "tga", "pnm", "ppm"];

/// Camera RAW extensions, decoded through `imagepipe`.
const RAW_EXTENSIONS: [&str; 10] = ["nef", "cr2", "cr3", "arw", "dng", "raf", "orf", "rw2", "pef", "srw"];

/// Represents an image file to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile
{
	pub source_path: PathBuf,
	pub target_path: PathBuf,
}

impl ImageFile
{
	fn new(source_path: PathBuf, output_dir: Option<&Path>) -> Self
	{
		let target_path: PathBuf = output_path_for(&source_path, output_dir);
		Self { source_path, target_path }
	}
}

/// Recursively find all files in a directory that match a predicate.
pub fn find_files_recursive<F>(directory: &Path, file_predicate: F) -> Result<Vec<PathBuf>>
where
	F: Fn(&Path) -> bool + Copy,
{
	let mut result: Vec<PathBuf> = Vec::new();
	collect_files_recursive(directory, &mut result, file_predicate)?;

	if result.is_empty()
	{
		return Err(anyhow!("No matching files found in the directory or subdirectories."));
	}

	// Stable order regardless of directory listing order.
	result.sort();
	Ok(result)
}

/// Internal helper function to collect files recursively.
fn collect_files_recursive<F>(dir: &Path, files: &mut Vec<PathBuf>, file_predicate: F) -> Result<()>
where
	F: Fn(&Path) -> bool + Copy,
{
	if !dir.is_dir()
	{
		return Err(anyhow!("Not a directory: {}", dir.display()));
	}

	for entry in std::fs::read_dir(dir)?
	{
		let entry = entry?;
		let path: PathBuf = entry.path();

		if path.is_dir()
		{
			// Keep going with the other directories.
			if let Err(e) = collect_files_recursive(&path, files, file_predicate)
			{
				warn!(path = %path.display(), "{:#}", e);
			}
		}
		else if file_predicate(&path)
		{
			files.push(path);
		}
	}

	Ok(())
}

/// Find all source images in a directory and its subdirectories.
/// Earlier outputs of this tool are left out.
pub fn find_images_in_dir(dir: Option<&Path>, output_dir: Option<&Path>) -> Result<Vec<ImageFile>>
{
	let directory: &Path = dir.unwrap_or_else(|| Path::new("."));
	let images: Vec<PathBuf> = find_files_recursive(directory, |path| is_image_file(path) && !is_compressed_output(path))?;

	assign_targets(images, output_dir)
}

/// Prepare a list of specific image files for processing.
/// A file listed more than once is processed once.
pub fn prepare_specific_files(files: &[PathBuf], output_dir: Option<&Path>) -> Result<Vec<ImageFile>>
{
	let mut seen: HashSet<&PathBuf> = HashSet::new();
	let sources: Vec<PathBuf> = files.iter()
		.filter(|path| seen.insert(*path))
		.cloned()
		.collect();

	assign_targets(sources, output_dir)
}

/// Pair every source with its output path.
///
/// Sources whose `compressed_<stem>.png` names coincide (`a.png` next to `a.bmp`, or two
/// `a.png` from different directories sharing one output directory) keep their extension
/// in the output name instead. Targets that still coincide are an error, so no two jobs
/// ever write the same file.
fn assign_targets(sources: Vec<PathBuf>, output_dir: Option<&Path>) -> Result<Vec<ImageFile>>
{
	let mut files: Vec<ImageFile> = sources.into_iter()
		.map(|path| ImageFile::new(path, output_dir))
		.collect();

	let mut counts: HashMap<PathBuf, usize> = HashMap::new();
	for file in &files
	{
		*counts.entry(file.target_path.clone()).or_insert(0) += 1;
	}

	for file in files.iter_mut().filter(|file| counts[&file.target_path] > 1)
	{
		file.target_path = qualified_output_path_for(&file.source_path, output_dir);
		debug!(source = %file.source_path.display(), target = %file.target_path.display(), "output name shared, keeping extension");
	}

	let mut owners: HashMap<&Path, &Path> = HashMap::new();
	for file in &files
	{
		if let Some(other) = owners.insert(&file.target_path, &file.source_path)
		{
			return Err(anyhow!("'{}' and '{}' would both be written to '{}'", other.display(), file.source_path.display(), file.target_path.display()));
		}
	}

	Ok(files)
}

/// Where the output for `source` is written: `compressed_<stem>.png`, next to the
/// source unless an output directory is given. The output is always PNG.
pub fn output_path_for(source: &Path, output_dir: Option<&Path>) -> PathBuf
{
	let stem: String = source.file_stem()
		.map(|stem| stem.to_string_lossy().into_owned())
		.unwrap_or_default();

	place_output(source, output_dir, format!("{}{}.png", OUTPUT_PREFIX, stem))
}

/// Output path that keeps the full source file name: `compressed_<name>.<ext>.png`.
fn qualified_output_path_for(source: &Path, output_dir: Option<&Path>) -> PathBuf
{
	let name: String = source.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_default();

	place_output(source, output_dir, format!("{}{}.png", OUTPUT_PREFIX, name))
}

fn place_output(source: &Path, output_dir: Option<&Path>, file_name: String) -> PathBuf
{
	match output_dir
	{
		Some(dir) => dir.join(file_name),
		None => source.with_file_name(file_name),
	}
}

fn extension_of(path: &Path) -> Option<String>
{
	path.extension().map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Checks if a file is a supported image (standard or RAW) by its extension.
pub fn is_image_file(path: &Path) -> bool
{
	extension_of(path)
		.map(|ext| STANDARD_EXTENSIONS.contains(&ext.as_str()) || RAW_EXTENSIONS.contains(&ext.as_str()))
		.unwrap_or(false)
}

/// Checks if a file is a camera RAW file by its extension.
pub fn is_raw_file(path: &Path) -> bool
{
	extension_of(path)
		.map(|ext| RAW_EXTENSIONS.contains(&ext.as_str()))
		.unwrap_or(false)
}

/// Checks if a file was written by this tool.
pub fn is_compressed_output(path: &Path) -> bool
{
	path.file_name()
		.map(|name| name.to_string_lossy().starts_with(OUTPUT_PREFIX))
		.unwrap_or(false)
}
