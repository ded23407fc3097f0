use std::{path::PathBuf, process::ExitCode};

use clap::Parser;

use goldvox::{LEVELS, load_game_levels, logging};

/// Convert GoldSrc BSP levels into Teardown voxel scenes.
#[derive(Parser)]
#[command(name = "goldvox")]
struct Cli {
    /// Directory containing the `valve/maps/<name>.bsp` tree.
    game_path: PathBuf,

    /// Level names, or `all` for the whole campaign in order.
    #[arg(required = true)]
    levels: Vec<String>,

    /// Fuse faces into shared per-texture voxel volumes instead of one
    /// model per face.
    #[arg(long)]
    fuse: bool,
}

fn main() -> ExitCode {
    logging::ensure_logging_hooks();

    let cli = Cli::parse();

    let levels: Vec<String> = if cli.levels.len() == 1 && cli.levels[0] == "all" {
        LEVELS.iter().map(|&name| name.to_string()).collect()
    } else {
        cli.levels
    };

    let failed = load_game_levels(&cli.game_path, &levels, cli.fuse);

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
