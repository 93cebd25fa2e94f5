//! Server network layer handling UDP communications and the owning loop

use crate::error::Result;
use crate::game::GameState;
use crate::sync::Outgoing;
use log::{debug, error, info, warn};
use shared::{Command, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// How often idle players are looked for when a timeout is configured.
const LIVENESS_SWEEP: Duration = Duration::from_secs(1);

/// Messages sent from network tasks to the owning loop
#[derive(Debug)]
pub enum ServerMessage {
    CommandReceived { command: Command, addr: SocketAddr },
    Shutdown,
}

/// Messages sent from the owning loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendDatagram { payload: String, addr: SocketAddr },
}

/// Owns the game state and multiplexes socket traffic into it.
///
/// Only [`Server::run`] ever touches [`GameState`]; the socket tasks talk to
/// it through channels, so commands are applied one at a time in arrival order.
pub struct Server {
    socket: Arc<UdpSocket>,
    game_state: GameState,
    idle_timeout: Option<Duration>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: Option<mpsc::UnboundedReceiver<GameMessage>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Server {
    pub async fn new(addr: &str, game_state: GameState, idle_timeout: Option<Duration>) -> Result<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            game_state,
            idle_timeout,
            server_tx,
            server_rx,
            game_tx,
            game_rx: Some(game_rx),
            tasks: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Handle that stops [`Server::run`] when sent [`ServerMessage::Shutdown`].
    pub fn shutdown_sender(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// Spawns task that continuously listens for incoming datagrams
    fn spawn_network_receiver(&mut self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        let handle = tokio::spawn(async move {
            let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match Command::decode(&buffer[..len]) {
                        Ok(command) => {
                            if let Err(e) = server_tx.send(ServerMessage::CommandReceived { command, addr }) {
                                error!("Failed to send command to main loop: {}", e);
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Dropping malformed datagram from {}: {}", addr, e);
                        }
                    },
                    Err(e) => {
                        error!("Error receiving datagram: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
        self.tasks.push(handle);
    }

    /// Spawns task that drains the outgoing datagram queue
    fn spawn_network_sender(&mut self) {
        let Some(mut game_rx) = self.game_rx.take() else {
            return;
        };
        let socket = Arc::clone(&self.socket);

        let handle = tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendDatagram { payload, addr } => {
                        if let Err(e) = socket.send_to(payload.as_bytes(), addr).await {
                            error!("Failed to send snapshot to {}: {}", addr, e);
                        }
                    }
                }
            }
        });
        self.tasks.push(handle);
    }

    /// Queues one broadcast, then tells the barrier it went out.
    fn dispatch(&mut self, outgoing: Vec<Outgoing>) {
        if outgoing.is_empty() {
            return;
        }

        for Outgoing { addr, snapshot } in outgoing {
            let payload = snapshot.encode();
            if payload.len() > MAX_DATAGRAM_SIZE {
                warn!(
                    "Snapshot for {} is {} bytes, over the {} byte limit; not sent",
                    addr,
                    payload.len(),
                    MAX_DATAGRAM_SIZE
                );
                continue;
            }
            if let Err(e) = self.game_tx.send(GameMessage::SendDatagram { payload, addr }) {
                error!("Failed to queue snapshot for {}: {}", addr, e);
            }
        }
        self.game_state.broadcast_sent();
    }

    /// Stops the socket tasks so nothing outlives [`Server::run`].
    async fn stop_tasks(&mut self) {
        for handle in self.tasks.drain(..) {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Main server loop; returns once a shutdown message arrives.
    pub async fn run(&mut self) -> Result<()> {
        self.spawn_network_receiver();
        self.spawn_network_sender();

        let mut sweep = interval(LIVENESS_SWEEP);
        let sweeping = self.idle_timeout.is_some();
        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::CommandReceived { command, addr }) => {
                            debug!("{} sent {:?}", addr, command);
                            let outgoing = self.game_state.handle(addr, command);
                            self.dispatch(outgoing);
                        }
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = sweep.tick(), if sweeping => {
                    if let Some(timeout) = self.idle_timeout {
                        let outgoing = self.game_state.evict_idle(timeout);
                        self.dispatch(outgoing);
                    }
                },
            }
        }

        self.stop_tasks().await;
        Ok(())
    }
}
