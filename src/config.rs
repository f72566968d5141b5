use crate::error::PxeError;
use clap::Parser;
use std::{net::Ipv4Addr, str::FromStr};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The network interface to serve on (e.g., 'eth0', 'lo')
    #[arg(short, long)]
    pub interface: String,

    /// UDP port to listen on
    #[arg(short, long, default_value_t = 67)]
    pub port: u16,

    /// Server identifier (option 54) to put in replies
    #[arg(long)]
    pub server_id: Option<Ipv4Addr>,

    /// Plugins to run, in order, as `name` or `name:arg1,arg2`
    #[arg(long = "plugin", default_value = "pxe")]
    pub plugins: Vec<PluginSpec>,
}

/// A plugin name plus its setup arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSpec {
    pub name: String,
    pub args: Vec<String>,
}

impl FromStr for PluginSpec {
    type Err = PxeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, args) = match s.split_once(':') {
            Some((name, args)) => (name, args.split(',').map(str::to_string).collect()),
            None => (s, Vec::new()),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(PxeError::InvalidPluginSpec(s.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            args,
        })
    }
}

pub struct ServerConfig {
    pub interface: String,
    pub server_port: u16,
    pub client_port: u16,
    pub server_id: Option<Ipv4Addr>,
    pub broadcast_address: Ipv4Addr,
    pub plugins: Vec<PluginSpec>,
}

impl ServerConfig {
    pub fn new(interface: String) -> Self {
        Self {
            interface,
            server_port: 67,
            client_port: 68,
            server_id: None,
            broadcast_address: Ipv4Addr::BROADCAST,
            plugins: vec![PluginSpec {
                name: "pxe".to_string(),
                args: Vec::new(),
            }],
        }
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            server_port: args.port,
            server_id: args.server_id,
            plugins: args.plugins,
            ..Self::new(args.interface)
        }
    }
}
