//! Validated contact value types: email addresses and E.164 phone numbers.
//!
//! Both types reject malformed input at construction, so entities holding
//! them never carry unvalidated strings. Stored representations deserialize
//! through the same checks.

use serde::{Deserialize, Serialize};

/// Validation failures for contact values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactError {
    #[error("please enter a valid email")]
    InvalidEmail,
    #[error("please enter a valid phone number")]
    InvalidPhone,
}

/// A syntactically valid email address.
///
/// Validation is deliberately shallow (local part, `@`, dotted domain);
/// actual control of the mailbox is proven by the OTP flow, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parse and normalise (trim, lowercase) an email address.
    pub fn parse(raw: &str) -> Result<Self, ContactError> {
        let trimmed = raw.trim().to_lowercase();
        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(ContactError::InvalidEmail);
        };
        if local.is_empty()
            || domain.is_empty()
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
            || trimmed.chars().any(char::is_whitespace)
        {
            return Err(ContactError::InvalidEmail);
        }
        Ok(Self(trimmed))
    }

    /// The normalised address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = ContactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A phone number normalised to E.164 (`+` followed by 8 to 15 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse a phone number, prefixing `default_country_code` (e.g. `+91`)
    /// when the input carries no country code of its own.
    pub fn parse(raw: &str, default_country_code: &str) -> Result<Self, ContactError> {
        let compact: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
            .collect();
        let normalised = if compact.starts_with('+') {
            compact
        } else {
            format!("{default_country_code}{compact}")
        };
        Self::validate(&normalised)?;
        Ok(Self(normalised))
    }

    fn validate(candidate: &str) -> Result<(), ContactError> {
        let Some(digits) = candidate.strip_prefix('+') else {
            return Err(ContactError::InvalidPhone);
        };
        if !(8..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ContactError::InvalidPhone);
        }
        Ok(())
    }

    /// The E.164 representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ContactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(&value)?;
        Ok(Self(value))
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a@x.com")]
    #[case("  First.Last@Example.ORG ")]
    fn accepts_reasonable_emails(#[case] raw: &str) {
        EmailAddress::parse(raw).expect("valid email");
    }

    #[rstest]
    #[case("")]
    #[case("no-at-sign")]
    #[case("@example.com")]
    #[case("name@")]
    #[case("name@nodot")]
    #[case("name@.com")]
    fn rejects_malformed_emails(#[case] raw: &str) {
        assert_eq!(
            EmailAddress::parse(raw),
            Err(ContactError::InvalidEmail),
            "{raw:?} should be rejected"
        );
    }

    #[test]
    fn email_is_lowercased() {
        let email = EmailAddress::parse("A@X.Com").expect("valid email");
        assert_eq!(email.as_str(), "a@x.com");
    }

    #[test]
    fn phone_gains_default_country_code() {
        let phone = PhoneNumber::parse("9876543210", "+91").expect("valid phone");
        assert_eq!(phone.as_str(), "+919876543210");
    }

    #[test]
    fn phone_keeps_explicit_country_code() {
        let phone = PhoneNumber::parse("+44 7700 900123", "+91").expect("valid phone");
        assert_eq!(phone.as_str(), "+447700900123");
    }

    #[rstest]
    #[case("12345")]
    #[case("+12ab3456789")]
    #[case("++919876543210")]
    fn rejects_malformed_phones(#[case] raw: &str) {
        assert_eq!(
            PhoneNumber::parse(raw, "+91"),
            Err(ContactError::InvalidPhone),
            "{raw:?} should be rejected"
        );
    }

    #[test]
    fn stored_phone_must_already_be_e164() {
        let err = PhoneNumber::try_from("9876543210".to_owned()).expect_err("missing plus");
        assert_eq!(err, ContactError::InvalidPhone);
    }
}
