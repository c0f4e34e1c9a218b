use crate::rpc::RpcCallEvent;

pub trait RpcEmit: FnMut(&[u8]) {}
impl<T: FnMut(&[u8])> RpcEmit for T {}

pub trait RpcCallEventHandler: FnMut(RpcCallEvent) + Send {}
impl<T: FnMut(RpcCallEvent) + Send> RpcCallEventHandler for T {}
