use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OwnedSemaphorePermit;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::context::HooksContext;
use crate::error::HookError;
use crate::interceptor::RpcHandler;
use crate::model::{Hook, HookAction, HookCondition, ValueRef};
use crate::status::Status;
use crate::value::{evaluate, FieldValue};

/// Per-invocation interpreter over a hook's action tree.
///
/// Execution state lives on this struct so stateful debugging information
/// about how hooks execute can be layered on later.
pub struct RunState {
    id: String,
    context: Arc<HooksContext>,
    handler: RpcHandler,
    hook: Arc<Hook>,
    permit: Option<OwnedSemaphorePermit>,
}

impl RunState {
    pub fn new(context: Arc<HooksContext>, handler: RpcHandler, hook: Arc<Hook>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            context,
            handler,
            hook,
            permit: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Execute the hook's action list under the session's run-slot, then fall
    /// through to the downstream handler when the actions produced neither a
    /// response nor an error.
    pub async fn run(mut self, ctx: &CancellationToken, request: Value) -> Result<Value, HookError> {
        self.permit = Some(self.context.acquire_run_slot(ctx).await?);

        let hook = self.hook.clone();
        let result = self.run_actions(ctx, &request, &hook.actions).await;

        // idempotent per invocation: a wait that failed mid-action has
        // already given the slot up
        self.permit.take();

        match result {
            Ok(Some(response)) => Ok(response),
            Ok(None) => {
                // purely observational hooks still want the real call to run
                let handler = self.handler;
                handler(ctx.clone(), request).await.map_err(HookError::from)
            }
            Err(err) => Err(err),
        }
    }

    /// Run a list of actions, failing on the first error but letting a later
    /// non-empty response overwrite an earlier one.
    async fn run_actions(
        &mut self,
        ctx: &CancellationToken,
        request: &Value,
        actions: &[HookAction],
    ) -> Result<Option<Value>, HookError> {
        let mut response_out = None;

        for action in actions {
            let response = self.run_action(ctx, request, action).await?;
            if response.is_some() {
                response_out = response;
            }
        }

        Ok(response_out)
    }

    fn run_action<'a>(
        &'a mut self,
        ctx: &'a CancellationToken,
        request: &'a Value,
        action: &'a HookAction,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Value>, HookError>> + Send + 'a>> {
        Box::pin(async move {
            match action {
                HookAction::If {
                    cond,
                    match_actions,
                    no_match,
                } => {
                    if self.check_conditions(request, cond)? {
                        self.run_actions(ctx, request, match_actions).await
                    } else {
                        self.run_actions(ctx, request, no_match).await
                    }
                }
                HookAction::Counter { counter_id, delta } => {
                    debug!(run_id = %self.id, counter_id = %counter_id, delta = *delta, "hook updating counter");
                    self.context.counter(counter_id).update(*delta);
                    Ok(None)
                }
                HookAction::WaitOnBarrier { barrier_id } => {
                    let barrier = self.context.barrier(barrier_id);
                    debug!(run_id = %self.id, barrier_id = %barrier_id, "hook waiting on barrier");

                    // release the run-slot while parked so other calls in the
                    // session can progress and reach their signalling actions
                    self.permit.take();
                    barrier.wait(ctx, &self.id).await?;
                    self.permit = Some(self.context.acquire_run_slot(ctx).await?);

                    debug!(run_id = %self.id, barrier_id = %barrier_id, "hook waited on barrier");
                    Ok(None)
                }
                HookAction::SignalBarrier {
                    barrier_id,
                    signal_all,
                } => {
                    debug!(run_id = %self.id, barrier_id = %barrier_id, signal_all = *signal_all, "hook signalling barrier");
                    let barrier = self.context.barrier(barrier_id);
                    if *signal_all {
                        barrier.signal_all(None);
                    } else {
                        barrier.try_signal_any(None);
                    }
                    Ok(None)
                }
                HookAction::SetResponse { value } => Ok(Some(value.clone())),
                HookAction::ReturnError {
                    code,
                    message,
                    details,
                } => {
                    let mut status = Status::new(*code, message.clone());
                    for detail in details {
                        status = status.with_detail(detail.clone());
                    }
                    Err(HookError::Status(status))
                }
            }
        })
    }

    /// AND over the condition list, short-circuiting on the first false.
    fn check_conditions(
        &self,
        request: &Value,
        conditions: &[HookCondition],
    ) -> Result<bool, HookError> {
        for condition in conditions {
            if !self.check_condition(request, condition)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn check_condition(&self, request: &Value, condition: &HookCondition) -> Result<bool, HookError> {
        let left = self.resolve_value_ref(request, &condition.left)?;
        let right = self.resolve_value_ref(request, &condition.right)?;
        Ok(evaluate(condition.op, &left, &right)?)
    }

    fn resolve_value_ref(&self, request: &Value, vref: &ValueRef) -> Result<FieldValue, HookError> {
        match vref {
            ValueRef::CounterValue { counter_id } => {
                Ok(FieldValue::Int(self.context.counter(counter_id).get()))
            }
            ValueRef::RequestField { path } => resolve_request_field(request, path),
            ValueRef::JsonValue { json } => {
                let value: Value = serde_json::from_str(json)?;
                Ok(FieldValue::from(&value))
            }
        }
    }
}

/// Dotted-path traversal against the request's declared fields. Missing
/// fields resolve to null; array indices are not supported in this version.
fn resolve_request_field(request: &Value, path: &str) -> Result<FieldValue, HookError> {
    let mut current = request;
    for segment in path.split('.') {
        if current.is_array() {
            return Err(HookError::UnsupportedPath(path.to_owned()));
        }
        match current.as_object().and_then(|fields| fields.get(segment)) {
            Some(next) => current = next,
            None => return Ok(FieldValue::Null),
        }
    }
    Ok(FieldValue::from(current))
}
