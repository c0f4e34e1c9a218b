mod call_handle;

mod call_target;
pub use call_target::*;

mod caller_interface;
pub use caller_interface::*;

pub mod error;

pub mod prebuffered;

mod streaming_call;
pub use streaming_call::*;

mod transport_state;
pub use transport_state::*;

mod with_dispatcher_trait;
pub use with_dispatcher_trait::*;
