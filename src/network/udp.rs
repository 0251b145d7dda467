//! UDP socket setup
//!
//! Sockets are configured through `socket2` and handed out as blocking
//! `std::net::UdpSocket`s with a read timeout, so every receive is a
//! bounded wait.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use crate::error::NetworkError;

/// Create a UDP socket bound to `addr`
///
/// An IPv6 address yields a dual-stack socket where the platform allows
/// it. `read_timeout` bounds every `recv_from`; `None` blocks forever.
pub fn create_socket(
    addr: SocketAddr,
    read_timeout: Option<Duration>,
) -> Result<UdpSocket, NetworkError> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| NetworkError::BindFailed(format!("{}: {}", addr, e)))?;

    if addr.is_ipv6() {
        // not fatal, some platforms pin this
        let _ = socket.set_only_v6(false);
    }

    socket
        .bind(&addr.into())
        .map_err(|e| NetworkError::BindFailed(format!("{}: {}", addr, e)))?;

    socket
        .set_read_timeout(read_timeout)
        .map_err(|e| NetworkError::BindFailed(format!("{}: {}", addr, e)))?;

    Ok(socket.into())
}

/// Whether a receive error only means the bounded wait elapsed
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_bind_ephemeral() {
        let socket = create_socket("127.0.0.1:0".parse().unwrap(), None).unwrap();
        assert_ne!(socket.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn test_bind_conflict() {
        let first = create_socket("127.0.0.1:0".parse().unwrap(), None).unwrap();
        let taken = first.local_addr().unwrap();

        let second = create_socket(taken, None);
        assert!(matches!(second, Err(NetworkError::BindFailed(_))));
    }

    #[test]
    fn test_receive_is_bounded() {
        let socket = create_socket(
            "127.0.0.1:0".parse().unwrap(),
            Some(Duration::from_millis(10)),
        )
        .unwrap();

        let mut buf = [0u8; 64];
        let started = Instant::now();
        let err = socket.recv_from(&mut buf).unwrap_err();
        assert!(is_timeout(&err));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
