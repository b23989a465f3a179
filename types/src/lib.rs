use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A captured email as stored and served by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: i64,
    pub message_id: String,
    pub subject: String,
    pub sender: String,
    pub timestamp: String,
    pub body: String,
    pub url: String,
    pub captured_at: DateTime<Utc>,
    pub annotations: String,
}

/// Payload submitted by the capture client.
///
/// `captured_at` stays textual here; the server parses it when persisting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    #[serde(default)]
    pub message_id: Option<String>,
    pub subject: String,
    pub sender: String,
    pub timestamp: String,
    pub body: String,
    pub url: String,
    pub captured_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationsUpdate {
    pub annotations: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_request_without_message_id() {
        let json = r#"{
            "subject": "Hi",
            "sender": "a@b.com",
            "timestamp": "2024-01-01T00:00:00Z",
            "body": "hello",
            "url": "http://x",
            "captured_at": "2024-01-01T00:00:00Z"
        }"#;

        let request: CaptureRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.message_id, None);
        assert_eq!(request.subject, "Hi");
    }

    #[test]
    fn test_capture_request_null_message_id() {
        let json = r#"{
            "message_id": null,
            "subject": "Hi",
            "sender": "a@b.com",
            "timestamp": "t",
            "body": "",
            "url": "",
            "captured_at": "2024-01-01T00:00:00Z"
        }"#;

        let request: CaptureRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.message_id, None);
    }

    #[test]
    fn test_capture_request_missing_subject_is_rejected() {
        let json = r#"{
            "sender": "a@b.com",
            "timestamp": "t",
            "body": "",
            "url": "",
            "captured_at": "2024-01-01T00:00:00Z"
        }"#;

        assert!(serde_json::from_str::<CaptureRequest>(json).is_err());
    }

    #[test]
    fn test_email_record_renders_captured_at_in_utc() {
        let record = EmailRecord {
            id: 1,
            message_id: "abc".to_string(),
            subject: "Hi".to_string(),
            sender: "a@b.com".to_string(),
            timestamp: "yesterday".to_string(),
            body: "hello".to_string(),
            url: "http://x".to_string(),
            captured_at: DateTime::from_timestamp(1_704_067_200, 0).unwrap(),
            annotations: String::new(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["captured_at"], "2024-01-01T00:00:00Z");
        assert_eq!(value["annotations"], "");
    }
}
