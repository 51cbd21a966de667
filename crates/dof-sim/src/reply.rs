use serde::Deserialize;
use serde_json::Value;

pub const STATUS_SUCCESS: &str = "success";

/// The JSON object a bridge script prints to report how its command went.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperationReply {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl OperationReply {
    /// Returns `None` when `output` is not a JSON object carrying a string `status`.
    pub fn parse(output: &str) -> Option<Self> {
        let trimmed = output.trim();
        if trimmed.is_empty() {
            return None;
        }
        // A struct derive also accepts sequences, so insist on an object first.
        match serde_json::from_str::<Value>(trimmed).ok()? {
            value @ Value::Object(_) => serde_json::from_value(value).ok(),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Joint state reported by `get_joint_states`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JointState {
    pub positions: Value,
    pub velocities: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(r#"{"status": "success", "message": "ok"}"#, true ; "success with message")]
    #[test_case(r#"{"status": "error", "message": "boom"}"#, false ; "error reply")]
    #[test_case("  {\"status\": \"success\", \"data\": []}\n", true ; "surrounding whitespace")]
    fn test_parse_status(raw: &str, success: bool) {
        let reply = OperationReply::parse(raw).unwrap();
        assert_eq!(reply.is_success(), success);
    }

    #[test_case("" ; "empty")]
    #[test_case("Robot Franka referenced from somewhere" ; "plain text")]
    #[test_case(r#"["not", "an", "object"]"# ; "array")]
    #[test_case(r#"["success", "done"]"# ; "array shaped like a reply")]
    #[test_case(r#"{"message": "no status"}"# ; "missing status")]
    #[test_case(r#"{"status": 1}"# ; "non-string status")]
    fn test_parse_rejects(raw: &str) {
        assert!(OperationReply::parse(raw).is_none());
    }

    #[test]
    fn test_data_and_fallback_message() {
        let reply =
            OperationReply::parse(r#"{"status": "success", "data": ["/World/Franka"]}"#).unwrap();
        assert_eq!(reply.data, Some(json!(["/World/Franka"])));
        assert_eq!(reply.message_or("fallback"), "fallback");
    }

    #[test]
    fn test_joint_state_from_data() {
        let reply = OperationReply::parse(
            r#"{"status": "success", "data": {"positions": [[0.1, 0.2]], "velocities": [[0.0, 0.0]]}}"#,
        )
        .unwrap();
        let state: JointState = serde_json::from_value(reply.data.unwrap()).unwrap();
        assert_eq!(state.positions, json!([[0.1, 0.2]]));
    }
}
