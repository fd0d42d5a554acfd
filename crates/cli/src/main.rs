#![deny(unsafe_code)]
//! CLI binary for tilenoise.
//!
//! Subcommands:
//! - `render <profile.json>`: synthesize a 2D or 3D field, write PNG
//! - `preset <name>`: print a default profile using a shape preset
//! - `list`: print noise families and presets
//!
//! Logging goes through `env_logger`; set `RUST_LOG=info` (or `debug`) to see
//! per-slice progress and per-shape index ranges.

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use std::path::{Path, PathBuf};
use std::process;
use tilenoise_core::{NoiseFamily, NoiseProfile, Preset, ProfileLibrary};
use tilenoise_export::{render, snapshot, Dimensionality};

#[derive(Parser)]
#[command(name = "tilenoise", about = "Tileable shape-masked noise texture generator")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synthesize a profile and write a PNG.
    Render {
        /// Profile JSON file. Its file stem is its name in the library.
        profile: PathBuf,

        /// Directory of additional profiles for cellular lookups.
        #[arg(short, long)]
        library: Option<PathBuf>,

        /// Texture dimensionality (2 or 3). 3D output is a slice atlas.
        #[arg(short, long, default_value_t = 2)]
        dims: u8,

        /// Resolution tier override (0-3, 32 * 2^tier texels per axis).
        #[arg(short, long)]
        resolution: Option<u32>,

        /// Output file path.
        #[arg(short, long, default_value = "noise.png")]
        output: PathBuf,
    },
    /// Print a default profile built on a shape preset.
    Preset {
        /// Preset name (single, tiling-2d, tiling-3d).
        name: String,
    },
    /// List noise families and shape presets.
    List,
}

/// What a finished render produced.
#[derive(Debug)]
struct RenderSummary {
    name: String,
    width: usize,
    height: usize,
    depth: usize,
}

fn render_profile(
    profile_path: &Path,
    library_dir: Option<&Path>,
    dims: u8,
    resolution: Option<u32>,
    output: &Path,
) -> Result<RenderSummary, CliError> {
    let dims = Dimensionality::from_axes(dims).map_err(|e| CliError::Input(e.to_string()))?;
    let name = profile_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CliError::Input(format!("bad profile path: {}", profile_path.display())))?
        .to_owned();

    let mut profile = NoiseProfile::load(profile_path)?;
    if let Some(tier) = resolution {
        profile.resolution = tier;
    }
    let mut library = match library_dir {
        Some(dir) => ProfileLibrary::load_dir(dir)?,
        None => ProfileLibrary::new(),
    };
    library.insert(name.clone(), profile.clone());
    let evaluator = library.compile(&name)?;

    log::info!(
        "rendering '{name}' ({}, {}D, {} texels per axis)",
        profile.config.noise,
        dims.axes(),
        profile.texture_size()
    );
    let rendered = render(&profile, &evaluator, dims, |done, total| {
        log::info!("progress {done}/{total}");
        false
    })?;
    snapshot::write_png(&rendered.buffer, output)?;

    let [width, height, depth] = rendered.buffer.dims();
    Ok(RenderSummary {
        name,
        width,
        height,
        depth,
    })
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let families = NoiseFamily::list_names();
            let presets = Preset::list_names();
            if cli.json {
                let info = serde_json::json!({
                    "noise_families": families,
                    "presets": presets,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Noise families:");
                for name in &families {
                    println!("  {name}");
                }
                println!("Presets:");
                println!("  {}", presets.join(", "));
            }
        }
        Command::Preset { name } => {
            let preset = Preset::from_name(&name)?;
            println!("{}", NoiseProfile::from_preset(preset).to_json_pretty()?);
        }
        Command::Render {
            profile,
            library,
            dims,
            resolution,
            output,
        } => {
            let summary =
                render_profile(&profile, library.as_deref(), dims, resolution, &output)?;
            if cli.json {
                let info = serde_json::json!({
                    "profile": summary.name,
                    "width": summary.width,
                    "height": summary.height,
                    "depth": summary.depth,
                    "output": output.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "rendered {} ({}x{}x{}) -> {}",
                    summary.name,
                    summary.width,
                    summary.height,
                    summary.depth,
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
