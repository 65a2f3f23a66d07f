use serde::{Deserialize, Serialize};

use crate::status::Code;

/// An ordered action list bound to the RPC method it intercepts.
///
/// Hooks are installed through the control plane and looked up at dispatch
/// time by `selector`, the fully-qualified method name
/// (e.g. `/quay.data.v1.DocumentService/Get`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hook {
    pub selector: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actions: Vec<HookAction>,
}

/// One imperative step within a hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HookAction {
    /// Branch on a condition list (AND, short-circuit).
    If {
        #[serde(default)]
        cond: Vec<HookCondition>,
        #[serde(default, rename = "match")]
        match_actions: Vec<HookAction>,
        #[serde(default)]
        no_match: Vec<HookAction>,
    },
    /// Apply a signed delta to a named counter.
    Counter { counter_id: String, delta: i64 },
    /// Park this invocation on a named barrier until signalled.
    WaitOnBarrier { barrier_id: String },
    /// Release one waiter (or all, when `signal_all`) from a named barrier.
    SignalBarrier {
        barrier_id: String,
        #[serde(default)]
        signal_all: bool,
    },
    /// Substitute the downstream response with a literal payload.
    SetResponse { value: serde_json::Value },
    /// Fail the call with a synthesized status.
    ReturnError {
        code: Code,
        #[serde(default)]
        message: String,
        #[serde(default)]
        details: Vec<serde_json::Value>,
    },
}

/// A single comparison; condition lists AND these together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookCondition {
    pub left: ValueRef,
    pub op: ComparisonOperator,
    pub right: ValueRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Equal,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

/// A scheme for resolving a runtime value during condition evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueRef {
    /// The current value of a named counter.
    CounterValue { counter_id: String },
    /// A dotted path into the intercepted request message.
    RequestField { path: String },
    /// An inline literal, decoded from JSON text at evaluation time.
    JsonValue { json: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_wire_format_round_trip() {
        let raw = r#"{
            "selector": "/quay.data.v1.DocumentService/Get",
            "actions": [
                {
                    "type": "if",
                    "cond": [
                        {
                            "left": {"type": "counter_value", "counter_id": "n"},
                            "op": "less_than",
                            "right": {"type": "json_value", "json": "3"}
                        }
                    ],
                    "match": [{"type": "counter", "counter_id": "n", "delta": 1}],
                    "no_match": [{"type": "return_error", "code": "RESOURCE_EXHAUSTED", "message": "spent"}]
                }
            ]
        }"#;

        let hook: Hook = serde_json::from_str(raw).unwrap();
        assert_eq!(hook.selector, "/quay.data.v1.DocumentService/Get");
        assert_eq!(hook.actions.len(), 1);

        let HookAction::If {
            cond,
            match_actions,
            no_match,
        } = &hook.actions[0]
        else {
            panic!("expected if action");
        };
        assert_eq!(cond.len(), 1);
        assert_eq!(cond[0].op, ComparisonOperator::LessThan);
        assert!(matches!(match_actions[0], HookAction::Counter { delta: 1, .. }));
        assert!(matches!(
            no_match[0],
            HookAction::ReturnError {
                code: Code::ResourceExhausted,
                ..
            }
        ));

        // survives a serialize/deserialize cycle unchanged
        let encoded = serde_json::to_string(&hook).unwrap();
        let decoded: Hook = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.actions.len(), hook.actions.len());
    }

    #[test]
    fn test_unknown_action_kind_is_rejected() {
        let raw = r#"{"selector": "/svc/Op", "actions": [{"type": "explode"}]}"#;
        assert!(serde_json::from_str::<Hook>(raw).is_err());
    }

    #[test]
    fn test_unknown_value_ref_is_rejected() {
        let raw = r#"{"type": "clock_value"}"#;
        assert!(serde_json::from_str::<ValueRef>(raw).is_err());
    }
}
