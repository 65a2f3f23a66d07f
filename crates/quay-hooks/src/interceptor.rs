use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::context::HooksContext;
use crate::error::HookError;
use crate::runstate::RunState;
use crate::status::Status;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, Status>> + Send>>;

/// The captured downstream handler for an intercepted call.
pub type RpcHandler = Box<dyn FnOnce(CancellationToken, Value) -> HandlerFuture + Send>;

/// RPC middleware bound to one hooks session.
///
/// Dispatch selects the hook installed for the method selector and hands the
/// call to a fresh [`RunState`]; with no hook installed the downstream
/// handler runs untouched.
#[derive(Clone)]
pub struct HookInterceptor {
    context: Arc<HooksContext>,
}

impl HookInterceptor {
    pub fn new(context: Arc<HooksContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<HooksContext> {
        &self.context
    }

    pub async fn intercept(
        &self,
        ctx: &CancellationToken,
        selector: &str,
        request: Value,
        handler: RpcHandler,
    ) -> Result<Value, Status> {
        let Some(hook) = self.context.registry().first_match(selector) else {
            return handler(ctx.clone(), request).await;
        };

        debug!(selector, session = %self.context.id(), "dispatching hooked call");

        let run = RunState::new(self.context.clone(), handler, hook);
        run.run(ctx, request).await.map_err(HookError::into_status)
    }
}
