use std::time::Duration;

use thiserror::Error;

/// Failures reported by the billing API boundary.
///
/// None of these ever leave the cost sampler: they are logged and turned into
/// the fallback value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BillingError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Cost data feature not enabled: {0}")]
    FeatureDisabled(String),

    #[error("Malformed billing response: {0}")]
    MalformedResponse(String),

    #[error("Billing API call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Billing API unavailable: {0}")]
    Unavailable(String),
}

impl BillingError {
    /// Maps an upstream error code (e.g. `AccessDeniedException`) onto the taxonomy.
    pub fn from_code(code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        let Some(code) = code else {
            return BillingError::Unavailable(message);
        };

        let detail = if message.is_empty() {
            code.to_string()
        } else {
            format!("{}: {}", code, message)
        };

        match code {
            c if c.starts_with("AccessDenied")
                || c.starts_with("UnrecognizedClient")
                || c.starts_with("ExpiredToken")
                || c == "InvalidClientTokenId"
                || c == "InvalidSignatureException"
                || c == "SignatureDoesNotMatch" =>
            {
                BillingError::Authentication(detail)
            }
            c if c == "LimitExceededException"
                || c.starts_with("Throttling")
                || c == "TooManyRequestsException" =>
            {
                BillingError::QuotaExceeded(detail)
            }
            c if c == "DataUnavailableException"
                || c.starts_with("OptInRequired")
                || c == "BillExpirationException" =>
            {
                BillingError::FeatureDisabled(detail)
            }
            _ => BillingError::Unavailable(detail),
        }
    }

    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            BillingError::Authentication(_) => "authentication",
            BillingError::QuotaExceeded(_) => "quota_exceeded",
            BillingError::FeatureDisabled(_) => "feature_disabled",
            BillingError::MalformedResponse(_) => "malformed_response",
            BillingError::Timeout(_) => "timeout",
            BillingError::Unavailable(_) => "unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_auth_codes() {
        for code in [
            "AccessDeniedException",
            "UnrecognizedClientException",
            "ExpiredTokenException",
            "InvalidClientTokenId",
        ] {
            let err = BillingError::from_code(Some(code), "nope");
            assert_eq!(err.kind(), "authentication", "code {}", code);
        }
    }

    #[test]
    fn classifies_quota_and_feature_codes() {
        assert_eq!(
            BillingError::from_code(Some("LimitExceededException"), "").kind(),
            "quota_exceeded"
        );
        assert_eq!(
            BillingError::from_code(Some("ThrottlingException"), "slow down").kind(),
            "quota_exceeded"
        );
        assert_eq!(
            BillingError::from_code(Some("DataUnavailableException"), "").kind(),
            "feature_disabled"
        );
    }

    #[test]
    fn unknown_or_missing_code_is_unavailable() {
        assert_eq!(
            BillingError::from_code(Some("SomethingNew"), "x"),
            BillingError::Unavailable("SomethingNew: x".into())
        );
        assert_eq!(
            BillingError::from_code(None, "dispatch failure"),
            BillingError::Unavailable("dispatch failure".into())
        );
    }

    #[test]
    fn message_carries_reason() {
        let err = BillingError::from_code(Some("AccessDeniedException"), "User is not authorized");
        assert!(err.to_string().contains("User is not authorized"));
    }
}
