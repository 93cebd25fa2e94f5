use clap::Parser;
use client::network::Session;
use client::policy::EscapePolicy;
use log::info;
use shared::{ClassTag, GridWorld, MoveCommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:9009")]
    server: SocketAddr,

    /// Directory holding map_<index>.csv files, shared with the server
    #[arg(short, long, default_value = "Maps")]
    maps_dir: PathBuf,

    /// Local address to bind the bot's socket to
    #[arg(short, long, default_value = "127.0.0.1:0")]
    bind: String,
}

fn load_map(dir: &Path, index: usize) -> Result<GridWorld, Box<dyn std::error::Error>> {
    let path = dir.join(format!("map_{}.csv", index));
    info!("Loading map {}", path.display());
    Ok(GridWorld::load(path)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let session = Session::bind(&args.bind, args.server).await?;
    let policy = EscapePolicy::default();
    let mut map_index = 0;
    let mut world = load_map(&args.maps_dir, map_index)?;

    session.connect(ClassTag::Bot).await?;

    loop {
        tokio::select! {
            snapshot = session.recv_snapshot() => {
                let snapshot = snapshot?;
                if snapshot.map_index != map_index {
                    world = load_map(&args.maps_dir, snapshot.map_index)?;
                    map_index = snapshot.map_index;
                }
                if let Some(direction) = policy.decide(&world, &snapshot) {
                    session.send_move(MoveCommand::new(direction)).await?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                session.disconnect().await?;
                break;
            }
        }
    }

    Ok(())
}
