/// Connection state reported to a transport's state change handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcTransportState {
    Connected,
    Disconnected,
}
