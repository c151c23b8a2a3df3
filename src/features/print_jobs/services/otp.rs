//! One-time passwords that release a job's files at the shop terminal

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::core::config::OtpConfig;

/// A freshly issued code with its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    Valid,
    Expired,
    Mismatch,
    /// No code stored, it was already used
    Consumed,
}

#[derive(Debug, Clone)]
pub struct OtpIssuer {
    ttl: Duration,
}

impl OtpIssuer {
    pub fn new(config: &OtpConfig) -> Self {
        Self { ttl: config.ttl }
    }

    /// Generate a 4-digit code valid until `now + ttl`
    pub fn issue(&self, now: DateTime<Utc>) -> Otp {
        let code: u16 = rand::rng().random_range(1000..=9999);
        Otp {
            code: format!("{:04}", code),
            expires_at: now + self.ttl,
        }
    }
}

/// Check a presented code against the stored one.
///
/// Expiry is checked before the code itself, so an expired job reports `Expired`
/// even when the wrong code was typed.
pub fn verify_otp(
    stored: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    presented: &str,
    now: DateTime<Utc>,
) -> OtpCheck {
    let (Some(stored), Some(expires_at)) = (stored, expires_at) else {
        return OtpCheck::Consumed;
    };

    if now > expires_at {
        return OtpCheck::Expired;
    }

    if stored.trim() != presented.trim() {
        return OtpCheck::Mismatch;
    }

    OtpCheck::Valid
}
