use std::io;
use thiserror::Error;
use tokio::net::UdpSocket as TokioUdpSocket;

/// Errors raised while preparing the server socket.
#[derive(Error, Debug)]
pub enum SocketError {
    #[error("Failed to create a new socket")]
    CreateSocket(#[source] io::Error),

    #[error("Failed to enable broadcast on socket")]
    SetBroadcast(#[source] io::Error),

    #[error("Failed to set SO_REUSEADDR on socket")]
    SetReuseAddress(#[source] io::Error),

    #[error("Failed to set SO_BINDTODEVICE on interface '{interface}'")]
    BindToDevice {
        interface: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to bind socket to port {port}")]
    BindSocket {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Failed to set socket to non-blocking mode")]
    SetNonBlocking(#[source] io::Error),

    #[error("Failed to convert socket to TokioUdpSocket")]
    ConvertToTokio(#[source] io::Error),

    #[allow(dead_code)]
    #[error("Binding to a specific device is not implemented on this platform")]
    NotImplemented,
}

/// Creates the DHCP server socket: `0.0.0.0:port`, restricted to `interface`.
///
/// Broadcast is enabled so replies can reach clients that have no address yet.
///
/// # Arguments
/// * `interface` - The name of the network interface (e.g., "eth0").
/// * `port` - The port number to bind the socket to, normally 67.
///
/// # Returns
/// A `Result` containing the configured `TokioUdpSocket` or a `SocketError`.
#[cfg(target_os = "linux")]
pub fn bind_server_socket(interface: &str, port: u16) -> Result<TokioUdpSocket, SocketError> {
    use socket2::{Domain, Protocol, Socket, Type};
    use std::{
        net::{Ipv4Addr, SocketAddrV4, UdpSocket as StdUdpSocket},
        os::fd::AsRawFd,
    };

    let socket =
        Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(SocketError::CreateSocket)?;

    socket.set_broadcast(true).map_err(SocketError::SetBroadcast)?;
    socket
        .set_reuse_address(true)
        .map_err(SocketError::SetReuseAddress)?;

    // SAFETY: the descriptor is owned by `socket` and the option value points
    // at `interface.len()` readable bytes.
    let ret = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_BINDTODEVICE,
            interface.as_ptr() as *const libc::c_void,
            interface.len() as libc::socklen_t,
        )
    };
    if ret < 0 {
        return Err(SocketError::BindToDevice {
            interface: interface.to_string(),
            source: io::Error::last_os_error(),
        });
    }

    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    socket
        .bind(&addr.into())
        .map_err(|source| SocketError::BindSocket { port, source })?;

    let std_socket: StdUdpSocket = socket.into();
    std_socket
        .set_nonblocking(true)
        .map_err(SocketError::SetNonBlocking)?;
    TokioUdpSocket::from_std(std_socket).map_err(SocketError::ConvertToTokio)
}

/// Fallback for non-Linux systems where `SO_BINDTODEVICE` is not available.
#[cfg(not(target_os = "linux"))]
pub fn bind_server_socket(_interface: &str, _port: u16) -> Result<TokioUdpSocket, SocketError> {
    Err(SocketError::NotImplemented)
}
