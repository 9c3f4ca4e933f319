use std::fs::File;
use std::io::{self, BufReader, Error, ErrorKind, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{debug, info};
use serde_json::json;

use push_battle::{Board, Engine, EngineConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Suggests a move for the side to play", long_about = None)]
struct Args {
    /// JSON board snapshot; read from stdin when omitted
    #[arg(long)]
    board: Option<PathBuf>,
    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Search depth for every stage of the game
    #[arg(long)]
    depth: Option<u32>,
    #[arg(long)]
    no_cache: bool,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    let level = args.log_level.parse::<log::Level>()
        .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("{}: {}", e, args.log_level)))?;
    simple_logger::init_with_level(level)
        .map_err(|e| Error::new(ErrorKind::Other, format!("{}", e)))?;

    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(depth) = args.depth {
        config = config.with_fixed_depth(depth);
    }
    if args.no_cache {
        config.use_cache = false;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let board = read_board(args.board.as_deref())?;
    debug!("board:\n{}", board);
    info!("config: {:?}", config);

    let mut engine = Engine::new(board.current_player, config);
    let selected_move = engine.select_move(&board);
    info!("searched {} nodes in {} ms", engine.stats().nodes, engine.stats().time_ms);

    println!("{}", json!({ "move": selected_move }));
    Ok(())
}

fn read_config(path: &Path) -> Result<EngineConfig, Error> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn read_board(path: Option<&Path>) -> Result<Board, Error> {
    let mut raw = String::new();
    match path {
        Some(path) => { File::open(path)?.read_to_string(&mut raw)?; },
        None => { io::stdin().read_to_string(&mut raw)?; },
    }
    Ok(serde_json::from_str(&raw)?)
}
