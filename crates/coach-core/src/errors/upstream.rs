// ABOUTME: Classifies non-2xx responses from AI gateway, voice and push providers
// ABOUTME: Maps 429/402/other to AppError with per-endpoint localized messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use serde_json::json;

use super::{AppError, ErrorCode};

/// Maximum number of upstream body bytes kept in error details
const MAX_BODY_IN_DETAILS: usize = 512;

/// Outcome of an upstream call that returned a non-success status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// HTTP 429
    RateLimited,
    /// HTTP 402
    PaymentRequired,
    /// Any other non-2xx status
    Other {
        /// Upstream status code
        status: u16,
        /// Upstream body, possibly truncated
        body: String,
    },
}

/// User-facing messages attached to each upstream failure class
#[derive(Debug, Clone, Copy)]
pub struct UpstreamMessages {
    /// Shown on 429
    pub rate_limited: &'static str,
    /// Shown on 402
    pub payment_required: &'static str,
    /// Shown on any other failure
    pub other: &'static str,
}

impl UpstreamFailure {
    /// Classify an upstream status and body
    #[must_use]
    pub fn classify(status: u16, body: &str) -> Self {
        match status {
            429 => Self::RateLimited,
            402 => Self::PaymentRequired,
            _ => {
                let mut end = body.len().min(MAX_BODY_IN_DETAILS);
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                Self::Other {
                    status,
                    body: body[..end].to_owned(),
                }
            }
        }
    }

    /// Upstream status code this failure was built from
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::RateLimited => 429,
            Self::PaymentRequired => 402,
            Self::Other { status, .. } => *status,
        }
    }

    /// Convert into an `AppError` carrying the endpoint's localized message
    #[must_use]
    pub fn into_app_error(self, messages: &UpstreamMessages) -> AppError {
        match self {
            Self::RateLimited => AppError::new(ErrorCode::ExternalRateLimited, messages.rate_limited),
            Self::PaymentRequired => {
                AppError::new(ErrorCode::ExternalPaymentRequired, messages.payment_required)
            }
            Self::Other { status, body } => {
                AppError::new(ErrorCode::ExternalServiceError, messages.other)
                    .with_details(json!({ "upstream_status": status, "upstream_body": body }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGES: UpstreamMessages = UpstreamMessages {
        rate_limited: "slow down",
        payment_required: "pay up",
        other: "broken",
    };

    #[test]
    fn test_classify_known_statuses() {
        assert_eq!(UpstreamFailure::classify(429, ""), UpstreamFailure::RateLimited);
        assert_eq!(UpstreamFailure::classify(402, "x"), UpstreamFailure::PaymentRequired);
        assert!(matches!(
            UpstreamFailure::classify(500, "boom"),
            UpstreamFailure::Other { status: 500, .. }
        ));
    }

    #[test]
    fn test_into_app_error_uses_endpoint_messages() {
        let error = UpstreamFailure::RateLimited.into_app_error(&MESSAGES);
        assert_eq!(error.http_status(), 429);
        assert_eq!(error.message, "slow down");

        let error = UpstreamFailure::PaymentRequired.into_app_error(&MESSAGES);
        assert_eq!(error.http_status(), 402);
        assert_eq!(error.message, "pay up");

        let error = UpstreamFailure::classify(503, "down").into_app_error(&MESSAGES);
        assert_eq!(error.message, "broken");
        assert_eq!(error.context.details["upstream_status"], 503);
    }

    #[test]
    fn test_classify_truncates_on_char_boundary() {
        let body = "ñ".repeat(600);
        let failure = UpstreamFailure::classify(500, &body);
        assert!(matches!(
            &failure,
            UpstreamFailure::Other { body, .. } if body.len() <= MAX_BODY_IN_DETAILS
        ));
    }
}
