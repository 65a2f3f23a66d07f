//! Programmable fault-injection engine for the quay gateway.
//!
//! Integration tests install hooks against a session, then drive the gateway
//! into precise interleavings: pause one call on a barrier until another
//! signals it, force an error on the Nth call, branch on request fields.

pub mod barrier;
pub mod context;
pub mod counter;
pub mod error;
pub mod interceptor;
pub mod manager;
pub mod model;
pub mod registry;
pub mod runstate;
pub mod status;
pub mod value;

pub use barrier::Barrier;
pub use context::HooksContext;
pub use counter::Counter;
pub use error::HookError;
pub use interceptor::{HandlerFuture, HookInterceptor, RpcHandler};
pub use manager::HooksManager;
pub use model::{ComparisonOperator, Hook, HookAction, HookCondition, ValueRef};
pub use registry::HookRegistry;
pub use runstate::RunState;
pub use status::{Code, Status};
pub use value::FieldValue;
