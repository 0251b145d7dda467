//! Network subsystem for the UDP control and stream sockets

pub mod udp;

pub use udp::{create_socket, is_timeout};
