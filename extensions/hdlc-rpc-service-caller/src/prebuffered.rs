use crate::{RpcCallTarget, RpcServiceCallerInterface, error::RpcCallerError};
use hdlc_rpc_service::prebuffered::RpcMethodPrebuffered;

/// Trait for types that represent callable prebuffered RPC methods.
///
/// This allows downstream users to write
/// `T::call(&client, channel_id, input)` without dealing with IDs, encoding
/// or transport logic explicitly.
#[async_trait::async_trait]
pub trait RpcCallPrebuffered: RpcMethodPrebuffered + Sized + Send + Sync {
    async fn call<C: RpcServiceCallerInterface>(
        rpc_client: &C,
        channel_id: u32,
        input: Self::Input,
    ) -> Result<Self::Output, RpcCallerError>;
}

#[async_trait::async_trait]
impl<T> RpcCallPrebuffered for T
where
    T: RpcMethodPrebuffered + Send + Sync + 'static,
    T::Input: Send + 'static,
    T::Output: Send + 'static,
{
    async fn call<C: RpcServiceCallerInterface>(
        rpc_client: &C,
        channel_id: u32,
        input: Self::Input,
    ) -> Result<Self::Output, RpcCallerError> {
        let encoded = Self::encode_request(input)?;
        let response = rpc_client
            .call_unary(
                RpcCallTarget::new(channel_id, Self::SERVICE_ID, Self::METHOD_ID),
                encoded,
            )
            .await?;

        match response.payload {
            Some(payload) => Ok(Self::decode_response(&payload)?),
            None => Err(RpcCallerError::RemoteError {
                status: response.status,
            }),
        }
    }
}
