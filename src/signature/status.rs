//! Server-reported signature statuses.

use serde::{Deserialize, Serialize};

/// Status of one receiver. Only ever set from a server response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiverStatus {
    #[default]
    Waiting,
    Sent,
    Viewed,
    Signed,
    Validated,
    NonValidated,
    Declined,
    Error,
    #[serde(other)]
    Unknown,
}

impl ReceiverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Sent => "sent",
            Self::Viewed => "viewed",
            Self::Signed => "signed",
            Self::Validated => "validated",
            Self::NonValidated => "nonvalidated",
            Self::Declined => "declined",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "waiting" => Self::Waiting,
            "sent" => Self::Sent,
            "viewed" => Self::Viewed,
            "signed" => Self::Signed,
            "validated" => Self::Validated,
            "nonvalidated" => Self::NonValidated,
            "declined" => Self::Declined,
            "error" => Self::Error,
            other => {
                tracing::warn!("Unknown receiver status '{}'", other);
                Self::Unknown
            }
        }
    }

    /// No further transition is expected.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Signed | Self::Validated | Self::NonValidated | Self::Declined | Self::Error
        )
    }
}

impl std::fmt::Display for ReceiverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a whole signature request.
///
/// `Void` and `Expired` are only reachable through administrative calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureStatus {
    #[default]
    Waiting,
    Sent,
    Viewed,
    Signed,
    Validated,
    NonValidated,
    Declined,
    Error,
    Completed,
    Void,
    Expired,
    #[serde(other)]
    Unknown,
}

impl SignatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Sent => "sent",
            Self::Viewed => "viewed",
            Self::Signed => "signed",
            Self::Validated => "validated",
            Self::NonValidated => "nonvalidated",
            Self::Declined => "declined",
            Self::Error => "error",
            Self::Completed => "completed",
            Self::Void => "void",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Void | Self::Expired | Self::Declined | Self::Error
        )
    }
}

impl std::fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receiver_status_parse() {
        assert_eq!(ReceiverStatus::parse("Viewed"), ReceiverStatus::Viewed);
        assert_eq!(
            ReceiverStatus::parse("nonvalidated"),
            ReceiverStatus::NonValidated
        );
        assert_eq!(ReceiverStatus::parse("teleported"), ReceiverStatus::Unknown);
        assert!(ReceiverStatus::Signed.is_final());
        assert!(!ReceiverStatus::Sent.is_final());
    }

    #[test]
    fn test_signature_status_serde() {
        let status: SignatureStatus = serde_json::from_str("\"void\"").unwrap();
        assert_eq!(status, SignatureStatus::Void);
        let status: SignatureStatus = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(status, SignatureStatus::Unknown);
        assert!(SignatureStatus::Expired.is_terminal());
    }
}
