use clap::ValueEnum;

use crate::error::TraceError;

/// All conversion parameters in one struct.
/// Designed to be adjustable at runtime (editor sliders, CLI flags)
/// and cheap to clone per conversion.
#[derive(Debug, Clone)]
pub struct Config {
    // -- Binarization stage --
    /// Median blur kernel size (odd, >= 1). 1 disables the blur.
    pub blur_size: u32,
    /// Adaptive threshold block size (odd, >= 3).
    pub block_size: u32,
    /// Offset subtracted from the local mean before comparing.
    /// A pixel is foreground when its value exceeds mean - c_value.
    pub c_value: f32,
    /// Swap foreground and background after thresholding.
    pub invert: bool,

    // -- Tracing stage --
    /// Minimum enclosed pixel area for a contour to survive (speckle filter).
    pub turdsize: i64,
    /// Ambiguous-turn resolution at saddle points.
    pub turnpolicy: TurnPolicy,
    /// Corner threshold on the per-vertex smoothness measure, in [0.0, 2.0].
    /// 0 forces every vertex to a corner; higher values produce fewer,
    /// longer curves.
    pub alphamax: f64,
    /// Merge runs of curve segments where a single cubic fits.
    pub opticurve: bool,
    /// Maximum deviation allowed when merging curve segments, in pixels.
    pub opttolerance: f64,

    // -- Styling --
    /// Fill color for every emitted path.
    pub fill: String,
    /// Stroke color. Ignored when stroke_width is 0.
    pub stroke: String,
    /// Stroke width. 0 suppresses the stroke entirely.
    pub stroke_width: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blur_size: 7,
            block_size: 15,
            c_value: 4.0,
            invert: false,
            turdsize: 50,
            turnpolicy: TurnPolicy::Majority,
            alphamax: 0.5,
            opticurve: true,
            opttolerance: 0.2,
            fill: "#000000".to_string(),
            stroke: "#000000".to_string(),
            stroke_width: 0.0,
        }
    }
}

impl Config {
    /// Reject out-of-range parameters before any stage runs.
    ///
    /// The pipeline never clamps silently; normalizing values (e.g. forcing
    /// odd blur sizes) is the caller's job.
    pub fn validate(&self) -> Result<(), TraceError> {
        if !(0.0..=2.0).contains(&self.alphamax) {
            return Err(TraceError::AlphamaxOutOfRange(self.alphamax));
        }
        if self.turdsize < 0 {
            return Err(TraceError::NegativeTurdsize(self.turdsize));
        }
        if self.opttolerance < 0.0 {
            return Err(TraceError::NegativeOptTolerance(self.opttolerance));
        }
        if self.stroke_width < 0.0 {
            return Err(TraceError::NegativeStrokeWidth(self.stroke_width));
        }
        Ok(())
    }
}

/// Turn taken where a boundary walk meets a saddle point: a 2x2 block
/// whose diagonal pixels are foreground, so either turn direction is
/// geometrically valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TurnPolicy {
    /// Keep the traced color connected (joins diagonals on outer
    /// boundaries, splits them inside holes).
    Black,
    /// Mirror of `black`.
    White,
    /// Always turn left.
    Left,
    /// Always turn right.
    Right,
    /// Follow the local foreground majority around the saddle.
    Majority,
    /// Oppose the local foreground majority.
    Minority,
    /// Deterministic position-seeded choice.
    Random,
}
