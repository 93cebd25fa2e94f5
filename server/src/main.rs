use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::game::{load_maps, GameState};
use server::movement::SpeedProfile;
use server::network::Server;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = 9009)]
    port: u16,

    /// Directory holding map_<index>.csv files
    #[arg(short, long, default_value = "Maps")]
    maps_dir: PathBuf,

    /// Number of maps to load
    #[arg(long, default_value_t = 1)]
    map_count: usize,

    /// Default forward step lengths per class
    #[arg(long, value_enum, default_value_t = SpeedProfile::Differentiated)]
    speed_profile: SpeedProfile,

    /// Evict players silent for this many seconds
    #[arg(long)]
    idle_timeout: Option<u64>,

    /// Seed for spawn placement
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let maps = load_maps(&args.maps_dir, args.map_count)?;
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let game_state = GameState::new(maps, args.speed_profile, rng)?;

    let address = format!("{}:{}", args.host, args.port);
    let idle_timeout = args.idle_timeout.map(Duration::from_secs);
    let mut server = Server::new(&address, game_state, idle_timeout).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
