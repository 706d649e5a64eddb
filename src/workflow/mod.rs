pub mod contact_ctx;
pub mod send_flow;

pub use contact_ctx::ContactCtx;
pub use send_flow::SendFlow;
