//! # Pursuit Simulation Client Library
//!
//! Client-side pieces for talking to the simulation server. The server is
//! authoritative and lockstepped, so a client's job is simple: send exactly
//! one move per epoch and wait for the next snapshot.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! [`network::Session`] owns the UDP socket:
//! - Connect as an agent or a bot
//! - Send moves with an optional magnitude and reward
//! - Request a respawn or disconnect
//! - Receive snapshots, own pose first, skipping anything malformed
//!
//! ### Policy Module (`policy`)
//! [`policy::EscapePolicy`] is the heuristic that drives bot-class players.
//! It scores the 24 radar sectors by how exposed they are to nearby agents
//! and how close the nearest wall is, then runs or turns accordingly.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Session;
//! use client::policy::EscapePolicy;
//! use shared::{ClassTag, GridWorld, MoveCommand};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let world = GridWorld::load("Maps/map_0.csv")?;
//!     let session = Session::bind("127.0.0.1:0", "127.0.0.1:9009".parse()?).await?;
//!     let policy = EscapePolicy::default();
//!
//!     session.connect(ClassTag::Bot).await?;
//!     loop {
//!         let snapshot = session.recv_snapshot().await?;
//!         if let Some(direction) = policy.decide(&world, &snapshot) {
//!             session.send_move(MoveCommand::new(direction)).await?;
//!         }
//!     }
//! }
//! ```

pub mod network;
pub mod policy;
