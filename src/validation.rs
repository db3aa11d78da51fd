use crate::constants::limits::MAX_TOPIC_LENGTH;
use crate::error::{Result, TransportError};

/// Validates an MQTT topic name (used for PUBLISH)
///
/// # Rules:
/// - Must have at least one character
/// - Must not contain null characters (U+0000)
/// - Must not exceed maximum string length when UTF-8 encoded
/// - Must not contain wildcard characters (+, #)
#[must_use]
pub fn is_valid_topic_name(topic: &str) -> bool {
    if !has_valid_length_and_chars(topic) {
        return false;
    }

    !topic.contains(['+', '#'])
}

/// Validates an MQTT topic filter (used for SUBSCRIBE and UNSUBSCRIBE)
///
/// # Rules:
/// - Must follow all topic name rules except wildcard usage
/// - Single-level wildcard (+) must occupy entire level
/// - Multi-level wildcard (#) must be last and occupy entire level
/// - Examples: sport/+/player, sport/tennis/#, +/tennis/#
#[must_use]
pub fn is_valid_topic_filter(filter: &str) -> bool {
    if !has_valid_length_and_chars(filter) {
        return false;
    }

    let levels: Vec<&str> = filter.split('/').collect();
    let last = levels.len() - 1;

    levels.iter().enumerate().all(|(i, level)| {
        if level.contains('#') && (i != last || *level != "#") {
            return false;
        }
        !(level.contains('+') && *level != "+")
    })
}

fn has_valid_length_and_chars(topic: &str) -> bool {
    !topic.is_empty() && topic.len() <= MAX_TOPIC_LENGTH && !topic.contains('\0')
}

/// Validates a topic name and returns an error if invalid
///
/// # Errors
///
/// Returns `TransportError::InvalidTopic` if the topic name:
/// - Is empty
/// - Exceeds maximum string length
/// - Contains null characters
/// - Contains wildcard characters (+, #)
pub fn validate_topic_name(topic: &str) -> Result<()> {
    if !is_valid_topic_name(topic) {
        return Err(TransportError::InvalidTopic(topic.to_string()));
    }
    Ok(())
}

/// Validates a topic filter and returns an error if invalid
///
/// # Errors
///
/// Returns `TransportError::InvalidTopic` if the topic filter:
/// - Is empty
/// - Exceeds maximum string length
/// - Contains null characters
/// - Has invalid wildcard usage
pub fn validate_topic_filter(filter: &str) -> Result<()> {
    if !is_valid_topic_filter(filter) {
        return Err(TransportError::InvalidTopic(filter.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_topic_names() {
        assert!(is_valid_topic_name("devices/d1/messages/events"));
        assert!(is_valid_topic_name("/"));
        assert!(is_valid_topic_name("a"));
        assert!(is_valid_topic_name("$iothub/twin/PATCH/properties/reported/"));
    }

    #[test]
    fn test_invalid_topic_names() {
        assert!(!is_valid_topic_name(""));
        assert!(!is_valid_topic_name("sport/+"));
        assert!(!is_valid_topic_name("sport/#"));
        assert!(!is_valid_topic_name("bad\0topic"));
        assert!(!is_valid_topic_name(&"a".repeat(MAX_TOPIC_LENGTH + 1)));
    }

    #[test]
    fn test_valid_topic_filters() {
        assert!(is_valid_topic_filter("sport/tennis/player1"));
        assert!(is_valid_topic_filter("sport/+/player1"));
        assert!(is_valid_topic_filter("sport/tennis/#"));
        assert!(is_valid_topic_filter("+/tennis/#"));
        assert!(is_valid_topic_filter("#"));
        assert!(is_valid_topic_filter("+"));
    }

    #[test]
    fn test_invalid_topic_filters() {
        assert!(!is_valid_topic_filter(""));
        assert!(!is_valid_topic_filter("sport/tennis#"));
        assert!(!is_valid_topic_filter("sport/#/player"));
        assert!(!is_valid_topic_filter("sport+/tennis"));
        assert!(!is_valid_topic_filter("bad\0filter"));
    }

    #[test]
    fn test_validate_returns_invalid_topic() {
        assert!(validate_topic_name("ok/topic").is_ok());
        assert!(validate_topic_filter("ok/+").is_ok());

        match validate_topic_filter("") {
            Err(TransportError::InvalidTopic(t)) => assert!(t.is_empty()),
            other => panic!("Expected InvalidTopic, got {other:?}"),
        }
        assert!(matches!(
            validate_topic_name("a/#"),
            Err(TransportError::InvalidTopic(_))
        ));
    }
}
