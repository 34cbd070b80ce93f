use clap::Parser;
use img2svg::{Config, TurnPolicy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "img2svg", about = "Raster images to stylable SVG outlines")]
struct Cli {
    /// Input image path (PNG, JPEG, BMP)
    #[arg(short, long)]
    input: PathBuf,

    /// Output SVG path
    #[arg(short, long)]
    output: PathBuf,

    /// Median blur kernel size (forced odd; 1 = off)
    #[arg(long, default_value = "7")]
    blur: u32,

    /// Adaptive threshold block size (forced odd, min 3)
    #[arg(long, default_value = "15")]
    block_size: u32,

    /// Offset subtracted from the local mean during thresholding
    #[arg(long, default_value = "4", allow_hyphen_values = true)]
    c_value: f32,

    /// Minimum contour area in pixels (speckle filter)
    #[arg(long, default_value = "50")]
    turdsize: i64,

    /// Ambiguous-turn policy at saddle points
    #[arg(long, value_enum, default_value = "majority")]
    turnpolicy: TurnPolicy,

    /// Corner threshold (0.0-2.0); 0 = all corners, higher = smoother
    #[arg(long, default_value = "0.5")]
    alphamax: f64,

    /// Disable curve-run merging
    #[arg(long)]
    no_opticurve: bool,

    /// Curve merging tolerance in pixels
    #[arg(long, default_value = "0.2")]
    opttolerance: f64,

    /// Invert foreground/background before tracing
    #[arg(long)]
    invert: bool,

    /// Fill color
    #[arg(long, default_value = "#000000")]
    fill: String,

    /// Stroke color
    #[arg(long, default_value = "#000000")]
    stroke: String,

    /// Stroke width (0 = no stroke)
    #[arg(long, default_value = "0")]
    stroke_width: f64,
}

/// Force a kernel/block size to an odd value of at least `min`.
fn odd_at_least(size: u32, min: u32) -> u32 {
    let size = size.max(min);
    if size % 2 == 0 {
        size + 1
    } else {
        size
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config {
        blur_size: odd_at_least(cli.blur, 1),
        block_size: odd_at_least(cli.block_size, 3),
        c_value: cli.c_value,
        invert: cli.invert,
        turdsize: cli.turdsize,
        turnpolicy: cli.turnpolicy,
        alphamax: cli.alphamax,
        opticurve: !cli.no_opticurve,
        opttolerance: cli.opttolerance,
        fill: cli.fill,
        stroke: cli.stroke,
        stroke_width: cli.stroke_width,
    };

    eprintln!();
    eprintln!("  img2svg \u{00b7} {}", cli.input.display());
    eprintln!();

    // Pipeline (lib prints step-by-step progress to stderr)
    let svg = img2svg::convert(&cli.input, &config)?;
    std::fs::write(&cli.output, svg)?;

    eprintln!();
    eprintln!("  \u{2713} {}", cli.output.display());
    eprintln!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_forced_odd() {
        assert_eq!(odd_at_least(7, 1), 7);
        assert_eq!(odd_at_least(8, 1), 9);
        assert_eq!(odd_at_least(0, 1), 1);
        assert_eq!(odd_at_least(2, 3), 3);
        assert_eq!(odd_at_least(4, 3), 5);
    }
}
