//! Contact form messages. Delivery is simulated by the caller; this module only
//! decides whether a message is acceptable.

use serde::Deserialize;

use crate::validate::require_min_chars;
use crate::ValidationError;

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_SUBJECT_CHARS: usize = 5;
pub const MIN_MESSAGE_CHARS: usize = 20;

/// A message sent through the contact form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactMessage {
    /// Check every field and report all failures at once, in form order.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = [
            require_min_chars("name", &self.name, MIN_NAME_CHARS),
            validate_email(&self.email),
            require_min_chars("subject", &self.subject, MIN_SUBJECT_CHARS),
            require_min_chars("message", &self.message, MIN_MESSAGE_CHARS),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Syntactic email check: `local@domain.tld`, no whitespace.
pub fn validate_email(s: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::new("email", "must be a valid email address");
    if s.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = s.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ContactMessage {
        ContactMessage {
            name: "Jo".into(),
            email: "jo@example.com".into(),
            subject: "Hello".into(),
            message: "I would like to talk about a project.".into(),
        }
    }

    #[test]
    fn accepts_valid_message() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn reports_every_failing_field_in_order() {
        let msg = ContactMessage {
            name: "J".into(),
            email: "nope".into(),
            subject: "Hi".into(),
            message: "short".into(),
        };
        let errs = msg.validate().unwrap_err();
        let fields: Vec<_> = errs.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email", "subject", "message"]);
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("a@.com").is_err());
        assert!(validate_email("a b@c.com").is_err());
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let msg: ContactMessage = serde_json::from_str(r#"{"name":"Jo"}"#).unwrap();
        assert_eq!(msg.email, "");
        assert!(msg.validate().is_err());
    }
}
