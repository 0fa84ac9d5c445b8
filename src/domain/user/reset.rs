//! Password reset state carried on the user record.
//!
//! `no reset pending` -> `issue` -> OTP pending -> `verify_otp` -> token active
//! -> `clear` (password replaced) -> no reset pending. Issuing again overwrites
//! whatever pair was outstanding.

use chrono::{DateTime, Duration, Utc};

pub const OTP_TTL_MINUTES: i64 = 10;
pub const TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordReset {
    pub otp: Option<String>,
    pub otp_expires: Option<DateTime<Utc>>,
    pub token: Option<String>,
    pub token_expires: Option<DateTime<Utc>>,
}

impl PasswordReset {
    pub fn issue(&mut self, otp: String, token: String, now: DateTime<Utc>) {
        self.otp = Some(otp);
        self.otp_expires = Some(now + Duration::minutes(OTP_TTL_MINUTES));
        self.token = Some(token);
        self.token_expires = Some(now + Duration::minutes(TOKEN_TTL_MINUTES));
    }

    pub fn otp_matches(&self, otp: &str, now: DateTime<Utc>) -> bool {
        match (&self.otp, self.otp_expires) {
            (Some(stored), Some(expires)) => stored == otp && expires > now,
            _ => false,
        }
    }

    pub fn token_valid(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.token, self.token_expires) {
            (Some(stored), Some(expires)) => stored == token && expires > now,
            _ => false,
        }
    }

    /// Clear the OTP and hand back the pending token, if any.
    pub fn verify_otp(&mut self) -> Option<String> {
        self.otp = None;
        self.otp_expires = None;
        self.token.clone()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_pending(&self) -> bool {
        self.otp.is_some() || self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_expires_after_ten_minutes() {
        let now = Utc::now();
        let mut reset = PasswordReset::default();
        reset.issue("123456".into(), "tok".into(), now);

        assert!(reset.otp_matches("123456", now + Duration::minutes(9)));
        assert!(!reset.otp_matches("123456", now + Duration::minutes(11)));
        assert!(!reset.otp_matches("654321", now));
    }

    #[test]
    fn token_outlives_otp() {
        let now = Utc::now();
        let mut reset = PasswordReset::default();
        reset.issue("123456".into(), "tok".into(), now);

        assert_eq!(reset.verify_otp().as_deref(), Some("tok"));
        assert!(reset.otp.is_none());
        assert!(reset.token_valid("tok", now + Duration::minutes(59)));
        assert!(!reset.token_valid("tok", now + Duration::minutes(61)));
    }

    #[test]
    fn reissue_invalidates_previous_pair() {
        let now = Utc::now();
        let mut reset = PasswordReset::default();
        reset.issue("111111".into(), "old".into(), now);
        reset.issue("222222".into(), "new".into(), now);
        assert!(!reset.otp_matches("111111", now));
        assert!(!reset.token_valid("old", now));
    }

    #[test]
    fn clear_ends_the_reset_and_spends_the_token() {
        let now = Utc::now();
        let mut reset = PasswordReset::default();
        assert!(!reset.is_pending());

        reset.issue("123456".into(), "tok".into(), now);
        assert!(reset.is_pending());
        reset.verify_otp();
        assert!(reset.is_pending());

        reset.clear();
        assert!(!reset.is_pending());
        assert!(!reset.token_valid("tok", now));
        assert_eq!(reset, PasswordReset::default());
    }
}
