use thiserror::Error;

/// Invalid compressor settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError
{
	#[error("Block size must be a positive integer, got {0}")]
	InvalidBlockSize(i64),

	#[error("Threshold must be between 0.0 and 1.0, got {0}")]
	InvalidThreshold(f64),
}

/// Raster data that does not match the H x W x 3 layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError
{
	#[error("Expected 3 color channels, got {0}")]
	ChannelCount(usize),

	#[error("Ragged raster shape: {height}x{width}")]
	Ragged { height: usize, width: usize },

	#[error("Sample buffer holds {actual} bytes, expected {expected}")]
	SampleCount { expected: usize, actual: usize },
}

/// Any error raised by the greedy compressor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompressError
{
	#[error("Configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("Shape error: {0}")]
	Shape(#[from] ShapeError),
}
