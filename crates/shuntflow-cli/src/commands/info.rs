use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use shuntflow_core::consts::DEFAULT_FPS;
use shuntflow_core::io::{open_source, FrameSource};

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER file, image directory or single image
    pub input: PathBuf,

    /// Frame rate assumed when the source has no timestamps
    #[arg(long, default_value_t = DEFAULT_FPS)]
    pub fps: f64,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let source = open_source(&args.input, args.fps)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let info = source.info();

    println!("Source:      {}", info.name.display());
    println!("Kind:        {}", info.kind);
    match info.total_frames {
        Some(n) => println!("Frames:      {}", n),
        None => println!("Frames:      unknown"),
    }
    println!("Dimensions:  {}x{}", info.width, info.height);
    if let Some(duration) = info.duration_sec {
        println!("Duration:    {:.2} s", duration);
    }

    Ok(())
}
