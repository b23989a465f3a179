use mailtrack_types::CaptureRequest;
use sha2::{Digest, Sha256};

/// Prefix marking a message id that was derived from content rather than
/// supplied by the client.
pub const GENERATED_PREFIX: &str = "gen_";

const GENERATED_HASH_LEN: usize = 16;

/// Returns the identity a capture is deduplicated on.
///
/// A non-empty client-supplied `message_id` is used verbatim. Otherwise the id
/// is derived from subject, sender and timestamp only, so two captures of the
/// same email from different URLs or with a re-rendered body collide.
pub fn resolve_message_id(request: &CaptureRequest) -> String {
    match request.message_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => derive_message_id(&request.subject, &request.sender, &request.timestamp),
    }
}

pub fn derive_message_id(subject: &str, sender: &str, timestamp: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{subject}-{sender}-{timestamp}").as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!("{GENERATED_PREFIX}{}", &digest[..GENERATED_HASH_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message_id: Option<&str>) -> CaptureRequest {
        CaptureRequest {
            message_id: message_id.map(str::to_string),
            subject: "Hi".to_string(),
            sender: "a@b.com".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            body: "hello".to_string(),
            url: "http://x".to_string(),
            captured_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_supplied_message_id_is_trusted() {
        assert_eq!(resolve_message_id(&request(Some("<abc@mail>"))), "<abc@mail>");
    }

    #[test]
    fn test_missing_or_empty_message_id_is_derived() {
        let derived = resolve_message_id(&request(None));
        assert_eq!(resolve_message_id(&request(Some(""))), derived);

        let suffix = derived.strip_prefix(GENERATED_PREFIX).unwrap();
        assert_eq!(suffix.len(), 16);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_derived_id_ignores_body_and_url() {
        let mut other = request(None);
        other.body = "a different body".to_string();
        other.url = "http://y".to_string();
        other.captured_at = "2025-06-01T12:00:00Z".to_string();

        assert_eq!(resolve_message_id(&request(None)), resolve_message_id(&other));
    }

    #[test]
    fn test_derived_id_depends_on_subject_sender_timestamp() {
        let base = derive_message_id("Hi", "a@b.com", "t");
        assert_ne!(base, derive_message_id("Hi!", "a@b.com", "t"));
        assert_ne!(base, derive_message_id("Hi", "c@d.com", "t"));
        assert_ne!(base, derive_message_id("Hi", "a@b.com", "t2"));
    }
}
