// Command line configuration

use std::path::PathBuf;

use clap::Parser;

use crate::engine::ShadingMode;

/// Real-time viewer for a single triangle mesh with switchable smooth/flat shading.
///
/// Controls: drag with the left mouse button to orbit, WASD to move,
/// F to toggle shading, F1 for the stats overlay, Esc to quit.
#[derive(Parser, Debug, Clone)]
#[command(name = "facet_view", version)]
pub struct ViewerConfig {
    /// Geometry file to load (v / f records, triangles only)
    #[arg(default_value = "horse.obj")]
    pub mesh: PathBuf,

    /// Window width in pixels
    #[arg(long, default_value_t = 700, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 700, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// Start in flat shading instead of smooth
    #[arg(long)]
    pub flat: bool,

    /// Degrees the light orbits per frame
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub light_step: f32,

    /// World units moved per frame while a direction key is held
    #[arg(long, default_value_t = 0.05)]
    pub move_step: f32,

    /// Show the stats overlay at startup
    #[arg(long)]
    pub overlay: bool,
}

impl ViewerConfig {
    pub fn initial_mode(&self) -> ShadingMode {
        if self.flat { ShadingMode::Flat } else { ShadingMode::Smooth }
    }
}
