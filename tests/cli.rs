//! End-to-end tests for the blockpress binary.

use image::{Rgb, RgbImage};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::process::{Command, Output};

fn run(args: &[&str], cwd: &Path) -> Output
{
	Command::new(env!("CARGO_BIN_EXE_blockpress"))
		.args(args)
		.current_dir(cwd)
		.output()
		.expect("run blockpress")
}

/// 16x16 image: top half smooth gray noise, bottom half a hard checkerboard.
fn sample_image() -> RgbImage
{
	RgbImage::from_fn(16, 16, |x, y|
	{
		if y < 8
		{
			let v: u8 = 100 + ((x * 7 + y * 3) % 5) as u8;
			Rgb([v, v, v])
		}
		else if (x + y) % 2 == 0
		{
			Rgb([0, 0, 0])
		}
		else
		{
			Rgb([255, 255, 255])
		}
	})
}

#[test]
fn test_compresses_file_next_to_source()
{
	let dir = tempfile::tempdir().expect("temp dir");
	sample_image().save(dir.path().join("photo.png")).expect("write png");

	let output = run(&["photo.png", "--threshold", "0.2"], dir.path());
	assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("2/4 blocks flattened"), "stdout: {}", stdout);

	let compressed = image::open(dir.path().join("compressed_photo.png")).expect("output exists").to_rgb8();
	let original = sample_image();
	assert_eq!(compressed.dimensions(), original.dimensions());

	// Smooth top blocks become their truncated mean, the checkerboard stays intact.
	let top_left = *compressed.get_pixel(0, 0);
	assert!((0..8).all(|y| (0..8).all(|x| *compressed.get_pixel(x, y) == top_left)));
	assert!((8..16).all(|y| (0..16).all(|x| compressed.get_pixel(x, y) == original.get_pixel(x, y))));
}

#[test]
fn test_directory_mode_with_output_dir()
{
	let dir = tempfile::tempdir().expect("temp dir");
	let photos = dir.path().join("photos");
	std::fs::create_dir(&photos).expect("create dir");
	sample_image().save(photos.join("a.png")).expect("write png");
	sample_image().save(photos.join("b.bmp")).expect("write bmp");

	let output = run(&["--dir", "photos", "--output", "out", "--no-optimize"], dir.path());
	assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

	assert!(dir.path().join("out/compressed_a.png").is_file());
	assert!(dir.path().join("out/compressed_b.png").is_file());
}

#[test]
fn test_existing_output_is_skipped()
{
	let dir = tempfile::tempdir().expect("temp dir");
	sample_image().save(dir.path().join("photo.png")).expect("write png");
	std::fs::write(dir.path().join("compressed_photo.png"), b"previous").expect("write file");

	let output = run(&["photo.png"], dir.path());
	assert!(output.status.success());
	assert!(String::from_utf8_lossy(&output.stdout).contains("Skipped"));
	assert_eq!(std::fs::read(dir.path().join("compressed_photo.png")).expect("read"), b"previous");
}

#[test]
fn test_zero_block_size_fails_without_output()
{
	let dir = tempfile::tempdir().expect("temp dir");
	sample_image().save(dir.path().join("photo.png")).expect("write png");

	let output = run(&["photo.png", "--block-size", "0"], dir.path());

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("Block size must be a positive integer"));
	assert!(!dir.path().join("compressed_photo.png").exists());
}

#[test]
fn test_threshold_out_of_range_fails()
{
	let dir = tempfile::tempdir().expect("temp dir");
	sample_image().save(dir.path().join("photo.png")).expect("write png");

	let output = run(&["photo.png", "-t", "1.5"], dir.path());

	assert!(!output.status.success());
	assert!(!dir.path().join("compressed_photo.png").exists());
}

#[test]
fn test_same_stem_sources_write_separate_outputs()
{
	let dir = tempfile::tempdir().expect("temp dir");
	let photos = dir.path().join("photos");
	std::fs::create_dir(&photos).expect("create dir");
	RgbImage::from_pixel(8, 8, Rgb([255, 0, 0])).save(photos.join("a.png")).expect("write png");
	RgbImage::from_pixel(8, 8, Rgb([0, 0, 255])).save(photos.join("a.bmp")).expect("write bmp");

	for args in [&["--dir", "photos", "--no-optimize"][..], &["--dir", "photos", "--no-optimize", "--force"][..]]
	{
		let output = run(args, dir.path());
		assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

		let stdout = String::from_utf8_lossy(&output.stdout);
		assert!(!stdout.contains("Skipped"), "stdout: {}", stdout);
		assert!(stdout.contains("Files compressed: 2"), "stdout: {}", stdout);

		let red = image::open(photos.join("compressed_a.png.png")).expect("png output").to_rgb8();
		let blue = image::open(photos.join("compressed_a.bmp.png")).expect("bmp output").to_rgb8();
		assert_eq!(*red.get_pixel(3, 3), Rgb([255, 0, 0]));
		assert_eq!(*blue.get_pixel(3, 3), Rgb([0, 0, 255]));
		assert!(!photos.join("compressed_a.png").exists());
	}
}

#[test]
fn test_identical_names_into_one_output_dir_fail()
{
	let dir = tempfile::tempdir().expect("temp dir");
	for sub in ["x", "y"]
	{
		std::fs::create_dir(dir.path().join(sub)).expect("create dir");
		sample_image().save(dir.path().join(sub).join("a.png")).expect("write png");
	}

	let output = run(&["x/a.png", "y/a.png", "--output", "out"], dir.path());

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("would both be written"));
	assert!(!dir.path().join("out/compressed_a.png").exists());
	assert!(!dir.path().join("out/compressed_a.png.png").exists());
}
