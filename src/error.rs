use thiserror::Error;

/// Errors that can occur during image tracing.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("invalid bitmap: {width}x{height}")]
    InvalidBitmap { width: u32, height: u32 },

    #[error("alphamax {0} outside [0.0, 2.0]")]
    AlphamaxOutOfRange(f64),

    #[error("turdsize {0} is negative")]
    NegativeTurdsize(i64),

    #[error("opttolerance {0} is negative")]
    NegativeOptTolerance(f64),

    #[error("stroke width {0} is negative")]
    NegativeStrokeWidth(f64),
}
