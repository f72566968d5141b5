use crate::network::SocketError;
use std::{error::Error as StdError, io};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PxeError {
    #[error("Malformed TLV data at offset {offset}: {reason}")]
    MalformedTlv { offset: usize, reason: &'static str },

    #[error("Option {code} payload of {len} bytes cannot be TLV encoded")]
    PayloadTooLong { code: u8, len: usize },

    #[error("Option code {0} is reserved and cannot carry a payload")]
    ReservedOptionCode(u8),

    #[error("Plugin setup failed: {0}")]
    Setup(String),

    #[error("Unknown plugin '{0}'")]
    UnknownPlugin(String),

    #[error("Invalid plugin specification '{0}'")]
    InvalidPluginSpec(String),

    #[error("Socket operation failed")]
    Socket(#[from] SocketError),

    #[error("I/O error")]
    Io(#[from] io::Error),

    #[error("DHCP protocol error")]
    Protocol(#[from] Box<dyn StdError + Send + Sync>),
}
