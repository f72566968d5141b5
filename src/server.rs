//! DHCPv4 responder
//!
//! This module contains the network side of the server:
//! - Reply skeleton construction from a request
//! - Running the plugin chain over each request
//! - The receive loop, one task per datagram

use crate::{config::ServerConfig, error::PxeError, plugin::HandlerChain, v4::is_pxe_client};
use dhcproto::{v4, Decodable as _, Decoder, Encodable as _, Encoder};
use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::Arc,
};
use tokio::net::UdpSocket;

/// Addressing details every reply needs.
#[derive(Debug, Clone, Copy)]
pub struct ReplyContext {
    pub server_id: Option<Ipv4Addr>,
    pub broadcast_address: Ipv4Addr,
    pub server_port: u16,
    pub client_port: u16,
}

impl From<&ServerConfig> for ReplyContext {
    fn from(config: &ServerConfig) -> Self {
        Self {
            server_id: config.server_id,
            broadcast_address: config.broadcast_address,
            server_port: config.server_port,
            client_port: config.client_port,
        }
    }
}

/// Builds an empty ProxyDHCP reply for `req`.
///
/// DISCOVER is answered with OFFER, REQUEST and INFORM with ACK. The reply
/// carries no address (`yiaddr` stays `0.0.0.0`); plugins fill in the rest.
/// Address assignment belongs to another server, so only PXE clients are
/// answered, and a request naming a different server identifier is left alone.
///
/// # Arguments
/// * `req` - The decoded client request.
/// * `server_id` - This server's identifier (option 54), if configured.
///
/// # Returns
/// The reply skeleton, or `None` if the request must not be answered.
pub fn new_reply(req: &v4::Message, server_id: Option<Ipv4Addr>) -> Option<v4::Message> {
    if req.opcode() != v4::Opcode::BootRequest || !is_pxe_client(req) {
        return None;
    }

    if let Some(v4::DhcpOption::ServerIdentifier(requested)) =
        req.opts().get(v4::OptionCode::ServerIdentifier)
    {
        if Some(*requested) != server_id {
            tracing::debug!(
                "Request XID={:x} is for server {}, ignoring",
                req.xid(),
                requested
            );
            return None;
        }
    }

    let reply_type = match req.opts().get(v4::OptionCode::MessageType) {
        Some(v4::DhcpOption::MessageType(v4::MessageType::Discover)) => v4::MessageType::Offer,
        Some(v4::DhcpOption::MessageType(v4::MessageType::Request))
        | Some(v4::DhcpOption::MessageType(v4::MessageType::Inform)) => v4::MessageType::Ack,
        _ => return None,
    };

    let mut resp = v4::Message::default();
    resp.set_opcode(v4::Opcode::BootReply)
        .set_htype(req.htype())
        .set_xid(req.xid())
        .set_flags(req.flags())
        .set_giaddr(req.giaddr())
        .set_chaddr(req.chaddr());

    resp.opts_mut().insert(v4::DhcpOption::MessageType(reply_type));
    if let Some(server_id) = server_id {
        resp.opts_mut()
            .insert(v4::DhcpOption::ServerIdentifier(server_id));
    }
    Some(resp)
}

/// Where to send the reply: back to the relay if there is one, otherwise broadcast.
///
/// # Arguments
/// * `req` - The request being answered.
/// * `ctx` - Ports and broadcast address of this server.
///
/// # Returns
/// `giaddr:server_port` for relayed requests, `broadcast:client_port` otherwise.
pub fn reply_destination(req: &v4::Message, ctx: &ReplyContext) -> SocketAddr {
    let giaddr = req.giaddr();
    if giaddr.is_unspecified() {
        SocketAddrV4::new(ctx.broadcast_address, ctx.client_port).into()
    } else {
        SocketAddrV4::new(giaddr, ctx.server_port).into()
    }
}

/// Decodes a datagram, runs the chain and encodes the reply.
///
/// # Arguments
/// * `chain` - The handlers to run over the reply.
/// * `ctx` - Addressing details for the reply.
/// * `data` - The raw datagram as received.
///
/// # Returns
/// The encoded reply and its destination, `Ok(None)` for requests that are not
/// answered, or a `PxeError` if the datagram cannot be decoded or the reply
/// cannot be encoded.
pub fn handle_datagram(
    chain: &HandlerChain,
    ctx: &ReplyContext,
    data: &[u8],
) -> Result<Option<(Vec<u8>, SocketAddr)>, PxeError> {
    let req = v4::Message::decode(&mut Decoder::new(data)).map_err(|e| {
        tracing::debug!("Failed to decode DHCP message: {}", e);
        PxeError::Protocol(Box::new(e))
    })?;

    let Some(resp) = new_reply(&req, ctx.server_id) else {
        tracing::debug!("Ignoring message with XID={:x}", req.xid());
        return Ok(None);
    };

    let resp = chain.run(&req, resp);

    let mut buffer = Vec::new();
    let mut encoder = Encoder::new(&mut buffer);
    resp.encode(&mut encoder)
        .map_err(|e| PxeError::Protocol(Box::new(e)))?;
    Ok(Some((buffer, reply_destination(&req, ctx))))
}

pub struct DhcpServer {
    ctx: ReplyContext,
    socket: Arc<UdpSocket>,
    chain: Arc<HandlerChain>,
}

impl DhcpServer {
    /// Sets up all plugins, then binds the server socket.
    ///
    /// # Arguments
    /// * `config` - Interface, ports, server identifier and plugin list.
    ///
    /// # Returns
    /// A `Result` containing the ready server, or the first plugin setup or
    /// socket error.
    pub fn new(config: ServerConfig) -> Result<Self, PxeError> {
        let chain = HandlerChain::from_specs(&config.plugins)?;
        let socket =
            crate::network::bind_server_socket(&config.interface, config.server_port)?;

        tracing::info!(
            "Listening on {}:{} with plugins {:?}",
            config.interface,
            config.server_port,
            chain
        );

        Ok(Self {
            ctx: ReplyContext::from(&config),
            socket: Arc::new(socket),
            chain: Arc::new(chain),
        })
    }

    /// Serves requests until the socket fails.
    pub async fn run(&self) -> Result<(), PxeError> {
        let mut buf = [0u8; 1500];
        loop {
            let (len, peer) = self.socket.recv_from(&mut buf).await.map_err(|e| {
                tracing::error!("Socket receive error: {}", e);
                PxeError::Io(e)
            })?;
            tracing::debug!("Received {} bytes from {}", len, peer);

            let data = buf[..len].to_vec();
            let socket = Arc::clone(&self.socket);
            let chain = Arc::clone(&self.chain);
            let ctx = self.ctx;

            tokio::spawn(async move {
                match handle_datagram(&chain, &ctx, &data) {
                    Ok(Some((packet, dest))) => {
                        if let Err(e) = socket.send_to(&packet, dest).await {
                            tracing::warn!("Failed to send reply to {}: {}", dest, e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => tracing::debug!("Dropping datagram from {}: {}", peer, e),
                }
            });
        }
    }
}
