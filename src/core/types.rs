use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supervisor -> worker envelope.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Request {
    Call {
        method: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    Stop,
}

impl Request {
    pub fn call(method: &str, args: Vec<Value>) -> Self {
        Request::Call {
            method: method.to_string(),
            args,
        }
    }
}

/// Worker -> supervisor envelope. Readiness is `{ok: true, ready: true}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
}

impl Response {
    pub fn ready() -> Self {
        Self {
            ok: true,
            ready: Some(true),
            ..Self::default()
        }
    }

    pub fn success(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// The closed set of bot capabilities reachable over the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotMethod {
    AgentInfo,
    MakeGuess,
    ReceiveFeedback,
}

impl BotMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            BotMethod::AgentInfo => "agent_info",
            BotMethod::MakeGuess => "make_guess",
            BotMethod::ReceiveFeedback => "receive_feedback",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "agent_info" => Some(BotMethod::AgentInfo),
            "make_guess" => Some(BotMethod::MakeGuess),
            "receive_feedback" => Some(BotMethod::ReceiveFeedback),
            _ => None,
        }
    }
}

/// Forced termination report for timeout/stop paths.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KillReport {
    pub kill_sent: bool,
    pub group_kill: bool,
    pub reaped: bool,
    pub waited_ms: u64,
    pub notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_match_wire_contract() {
        let call = Request::call("make_guess", Vec::new());
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({"op": "call", "method": "make_guess", "args": []})
        );
        assert_eq!(
            serde_json::to_value(&Request::Stop).unwrap(),
            json!({"op": "stop"})
        );
    }

    #[test]
    fn call_without_args_decodes() {
        let req: Request =
            serde_json::from_value(json!({"op": "call", "method": "agent_info"})).unwrap();
        assert_eq!(req, Request::call("agent_info", Vec::new()));
    }

    #[test]
    fn unknown_op_is_rejected() {
        assert!(serde_json::from_value::<Request>(json!({"op": "dance"})).is_err());
    }

    #[test]
    fn responses_match_wire_contract() {
        assert_eq!(
            serde_json::to_value(Response::ready()).unwrap(),
            json!({"ok": true, "ready": true})
        );
        assert_eq!(
            serde_json::to_value(Response::failure("boom")).unwrap(),
            json!({"ok": false, "error": "boom"})
        );
        assert_eq!(
            serde_json::to_value(Response::success(json!(["R"]))).unwrap(),
            json!({"ok": true, "result": ["R"]})
        );
    }

    #[test]
    fn method_names_round_trip() {
        for method in [
            BotMethod::AgentInfo,
            BotMethod::MakeGuess,
            BotMethod::ReceiveFeedback,
        ] {
            assert_eq!(BotMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(BotMethod::parse("__init__"), None);
    }
}
