// Reusable listener module
// Creates TCP listeners with address reuse so a restart can rebind immediately

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

/// Listen backlog queue size
const BACKLOG: i32 = 128;

/// Create a `TcpListener` with `SO_REUSEADDR` and optionally `SO_REUSEPORT`.
///
/// `SO_REUSEADDR` lets a restarted server bind a port whose previous
/// connections are still in `TIME_WAIT`. `SO_REUSEPORT` additionally allows
/// several live sockets on the same port and is only set when asked for.
///
/// Must be called from within a Tokio runtime.
///
/// # Arguments
///
/// * `addr` - The socket address to bind to
/// * `reuse_port` - Also enable `SO_REUSEPORT` (ignored where unsupported)
pub fn create_reusable_listener(
    addr: std::net::SocketAddr,
    reuse_port: bool,
) -> std::io::Result<TcpListener> {
    // Create socket with appropriate domain (IPv4 or IPv6)
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    socket.set_reuse_address(true)?;
    set_reuse_port(&socket, reuse_port)?;

    // Set non-blocking mode for async compatibility
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;

    // Convert socket2::Socket to std::net::TcpListener, then to tokio::net::TcpListener
    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

#[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
fn set_reuse_port(socket: &Socket, enabled: bool) -> std::io::Result<()> {
    if enabled {
        socket.set_reuse_port(true)?;
    }
    Ok(())
}

#[cfg(not(all(unix, not(any(target_os = "solaris", target_os = "illumos")))))]
fn set_reuse_port(_socket: &Socket, enabled: bool) -> std::io::Result<()> {
    if enabled {
        crate::logger::log_warning("SO_REUSEPORT is not supported on this platform, ignoring");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rebind_after_close() {
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap(), false).unwrap();
        let addr = listener.local_addr().unwrap();

        // Leave a connection behind so the port has TIME_WAIT state
        let client = tokio::net::TcpStream::connect(addr).await.unwrap();
        let (server_side, _) = listener.accept().await.unwrap();
        drop(server_side);
        drop(client);
        drop(listener);

        let rebound = create_reusable_listener(addr, false).unwrap();
        assert_eq!(rebound.local_addr().unwrap(), addr);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reuse_port_allows_second_listener() {
        let first = create_reusable_listener("127.0.0.1:0".parse().unwrap(), true).unwrap();
        let addr = first.local_addr().unwrap();
        let second = create_reusable_listener(addr, true).unwrap();
        assert_eq!(second.local_addr().unwrap(), addr);
    }

    // Windows lets SO_REUSEADDR sockets share a live port
    #[cfg(unix)]
    #[tokio::test]
    async fn test_port_in_use_without_reuse_port() {
        let first = create_reusable_listener("127.0.0.1:0".parse().unwrap(), false).unwrap();
        let addr = first.local_addr().unwrap();
        let err = create_reusable_listener(addr, false).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AddrInUse);
    }
}
