//! # Pursuit Simulation Server Library
//!
//! This library provides the authoritative server for a lockstep multi-agent
//! pursuit simulation. Learning agents and heuristic bots connect over UDP,
//! submit one move per epoch, and receive a personalised snapshot of every
//! player once the whole roster has moved.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The server holds the only copy of every player's pose. Clients send
//! movement intents; the server validates them against the active map and
//! decides the result.
//!
//! ### Connection Lifecycle
//! A player is identified by its UDP source endpoint:
//! - `cz` / `cb` registers an agent or a bot and re-spawns everyone
//! - `d` removes the player
//! - `r` re-spawns everyone without disconnecting
//! - Optionally, endpoints that stay silent for too long are evicted
//!
//! ### Lockstep Broadcasting
//! Time only advances when every registered player has reported a move since
//! the previous broadcast. At that point each player receives the full
//! roster with its own entry first, followed by the active map index.
//!
//! ## Architecture Design
//!
//! ### Single Owning Loop
//! [`network::Server::run`] owns the [`game::GameState`]. Socket reads and
//! writes happen in spawned tasks that exchange messages with the loop over
//! channels, so commands are applied strictly in arrival order and no state
//! is shared behind a lock.
//!
//! ### Fail-Closed Decoding
//! Each datagram decodes into one [`shared::Command`] or is dropped with a
//! warning. A misbehaving client can never stop the loop.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Map loading and command dispatch into the components below.
//!
//! ### Session Module (`session`)
//! The endpoint-keyed roster with readiness, last reward and liveness.
//!
//! ### Movement Module (`movement`)
//! Per-class step lengths, turning, and wall rejection.
//!
//! ### Spawn Module (`spawn`)
//! Bounded search for separated starting poses on free cells.
//!
//! ### Sync Module (`sync`)
//! The readiness barrier and per-recipient snapshot assembly.
//!
//! ### Network Module (`network`)
//! UDP socket tasks and the owning loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use server::game::{load_maps, GameState};
//! use server::movement::SpeedProfile;
//! use server::network::Server;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let maps = load_maps(Path::new("Maps"), 1)?;
//!     let game = GameState::new(maps, SpeedProfile::Differentiated, StdRng::from_entropy())?;
//!
//!     // No idle timeout: a silent client holds the barrier until it disconnects
//!     let mut server = Server::new("127.0.0.1:9009", game, None).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod game;
pub mod movement;
pub mod network;
pub mod session;
pub mod spawn;
pub mod sync;
