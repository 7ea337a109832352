use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::content::Content;

/// Session as returned by `GET /apps/{app}/users/{user}/sessions/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,

    #[serde(default)]
    pub app_name: String,

    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub state: Map<String, Value>,

    #[serde(default)]
    pub events: Vec<AdkEvent>,

    /// Seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<f64>,
}

impl Session {
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        let t = self.last_update_time?;
        if !t.is_finite() || t < 0.0 {
            return None;
        }
        let secs = t.trunc();
        let nanos = ((t - secs) * 1_000_000_000.0) as u32;
        DateTime::from_timestamp(secs as i64, nanos)
    }
}

/// One entry of a session history or a non-streaming run result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdkEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,

    #[serde(default)]
    pub author: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl AdkEvent {
    pub fn is_user(&self) -> bool {
        self.author == "user"
    }
}

/// Body of `POST /run` and `POST /run_sse`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub new_message: Content,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub streaming: bool,
}

/// Join the non-empty text parts of every non-user event with newlines
pub fn extract_agent_response(events: &[AdkEvent]) -> String {
    events
        .iter()
        .filter(|e| !e.is_user())
        .filter_map(|e| e.content.as_ref())
        .flat_map(|c| c.texts())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Part;

    #[test]
    fn test_session_deserialize_camel_case() {
        let json = r#"{
            "id": "s1",
            "appName": "basic_agent",
            "userId": "u1",
            "state": {"topic": "bgp"},
            "events": [],
            "lastUpdateTime": 1700000000.5
        }"#;

        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, "s1");
        assert_eq!(session.app_name, "basic_agent");
        assert_eq!(session.state.get("topic"), Some(&Value::from("bgp")));

        let updated = session.last_updated().unwrap();
        assert_eq!(updated.timestamp(), 1_700_000_000);
        assert_eq!(updated.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_session_minimal() {
        let session: Session = serde_json::from_str(r#"{"id":"s2"}"#).unwrap();
        assert!(session.events.is_empty());
        assert!(session.last_updated().is_none());
    }

    #[test]
    fn test_extract_agent_response_skips_user() {
        let events = vec![
            AdkEvent {
                author: "user".to_string(),
                content: Some(Content::user("question")),
                ..Default::default()
            },
            AdkEvent {
                author: "root_agent".to_string(),
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![
                        Part::text("first"),
                        Part::default(),
                        Part::text(""),
                        Part::text("second"),
                    ],
                }),
                ..Default::default()
            },
        ];

        assert_eq!(extract_agent_response(&events), "first\nsecond");
    }

    #[test]
    fn test_run_request_wire_shape() {
        let request = RunRequest {
            app_name: "basic_agent".to_string(),
            user_id: "u1".to_string(),
            session_id: "s1".to_string(),
            new_message: Content::user("hello"),
            streaming: true,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["appName"], "basic_agent");
        assert_eq!(value["streaming"], true);
        assert_eq!(value["newMessage"]["role"], "user");
        assert_eq!(value["newMessage"]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_run_request_omits_streaming_when_false() {
        let request = RunRequest {
            app_name: "a".to_string(),
            user_id: "u".to_string(),
            session_id: "s".to_string(),
            new_message: Content::user("x"),
            streaming: false,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("streaming").is_none());
    }
}
