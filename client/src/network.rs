use log::{debug, info, warn};
use shared::{ClassTag, Command, MoveCommand, Snapshot, MAX_DATAGRAM_SIZE};
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// One client's conversation with the simulation server.
pub struct Session {
    socket: UdpSocket,
    server_addr: SocketAddr,
}

impl Session {
    pub async fn bind(local_addr: &str, server_addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(local_addr).await?;
        info!("Bound {} for server {}", socket.local_addr()?, server_addr);
        Ok(Self { socket, server_addr })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    async fn send(&self, command: &Command) -> io::Result<()> {
        let payload = command.encode();
        debug!("Sending {}", payload);
        self.socket.send_to(payload.as_bytes(), self.server_addr).await?;
        Ok(())
    }

    pub async fn connect(&self, class: ClassTag) -> io::Result<()> {
        info!("Connecting to {} as {:?}", self.server_addr, class);
        self.send(&Command::Connect { class }).await
    }

    pub async fn send_move(&self, command: MoveCommand) -> io::Result<()> {
        self.send(&Command::Move(command)).await
    }

    pub async fn reset(&self) -> io::Result<()> {
        self.send(&Command::Reset).await
    }

    pub async fn disconnect(&self) -> io::Result<()> {
        info!("Disconnecting from {}", self.server_addr);
        self.send(&Command::Disconnect).await
    }

    /// Waits for the next well-formed snapshot from the server.
    ///
    /// Datagrams from other endpoints and ones that fail to decode are skipped.
    pub async fn recv_snapshot(&self) -> io::Result<Snapshot> {
        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

        loop {
            let (len, addr) = self.socket.recv_from(&mut buffer).await?;
            if addr != self.server_addr {
                debug!("Ignoring datagram from {}", addr);
                continue;
            }
            match Snapshot::decode(&buffer[..len]) {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => warn!("Dropping malformed snapshot: {}", e),
            }
        }
    }
}
