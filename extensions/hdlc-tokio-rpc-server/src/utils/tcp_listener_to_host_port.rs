use std::io::Result;
use std::net::IpAddr;
use tokio::net::TcpListener;

/// Host and port a bound listener accepts connections on.
pub fn tcp_listener_to_host_port(listener: &TcpListener) -> Result<(IpAddr, u16)> {
    let local_addr = listener.local_addr()?;

    Ok((local_addr.ip(), local_addr.port()))
}
