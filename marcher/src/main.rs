//! # Marcher
//!
//! Entry point for the headless ray-marching driver.
//!
//! Builds the demo CSG scene, renders a fixed number of frames through the
//! [`render::FrameOrchestrator`] and optionally writes the last frame to a
//! PNG. With `--watch` the kernel is recompiled whenever the shader file
//! changes.

mod app;
mod watcher;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

/// Command line options for the marcher binary.
#[derive(Parser, Debug)]
#[command(name = "marcher", version, about = "Ray-march an animated CSG scene")]
pub struct Cli {
    /// Number of frames to render
    #[arg(long, default_value_t = 120)]
    pub frames: u32,

    /// Frame width in pixels
    #[arg(long, default_value_t = 320)]
    pub width: u32,

    /// Frame height in pixels
    #[arg(long, default_value_t = 240)]
    pub height: u32,

    /// Kernel source to compile instead of the embedded one
    #[arg(long)]
    pub shader: Option<PathBuf>,

    /// Recompile the kernel when the shader file changes
    #[arg(long, requires = "shader")]
    pub watch: bool,

    /// Write the last frame to this PNG file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Force the CPU mock backend
    #[arg(long)]
    pub no_gpu: bool,

    /// Scene light
    #[arg(long, value_enum, default_value_t = LightArg::Directional)]
    pub light: LightArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightArg {
    Directional,
    Point,
    None,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    app::run(&Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let cli = Cli::try_parse_from(["marcher"]).unwrap();
        assert_eq!(cli.frames, 120);
        assert_eq!((cli.width, cli.height), (320, 240));
        assert_eq!(cli.light, LightArg::Directional);
        assert!(!cli.watch && !cli.no_gpu);
    }

    #[test]
    fn watch_requires_a_shader_path() {
        assert!(Cli::try_parse_from(["marcher", "--watch"]).is_err());
        let cli = Cli::try_parse_from(["marcher", "--watch", "--shader", "k.wgsl", "--light", "none"])
            .unwrap();
        assert!(cli.watch);
        assert_eq!(cli.light, LightArg::None);
    }
}
