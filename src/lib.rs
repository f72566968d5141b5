//! # dhcp-pxe - PXE support for DHCPv4 servers
//!
//! A DHCPv4 handler that recognizes PXE boot clients and adds the options
//! their firmware needs to continue with boot-server discovery.
//!
//! ## Features
//!
//! - PXE client detection from the vendor class identifier (option 60)
//! - Option 43 vendor sub-option encoding (RFC 2132 §8.4, Intel PXE §3.2.3)
//! - Plugin-style handler chain over `dhcproto` messages
//! - A small ProxyDHCP-style responder built on Tokio
//!
//! ## Example
//!
//! ```rust
//! use dhcp_pxe::{plugin::{Flow, Handler4}, v4::PxeHandler};
//! use dhcproto::v4;
//!
//! let handler = PxeHandler::setup(&[]).unwrap();
//! let req = v4::Message::default();
//! let mut resp = v4::Message::default();
//! assert_eq!(handler.handle(&req, &mut resp), Flow::Continue);
//! ```

pub mod config;
pub mod error;
pub mod network;
pub mod plugin;
pub mod server;
pub mod tlv;
pub mod v4;

pub use config::{Args, PluginSpec, ServerConfig};
pub use error::PxeError;
pub use plugin::{Flow, Handler4, HandlerChain};
pub use server::DhcpServer;
