//! User-facing notification text.
//!
//! Failure wording is generic. A rejected password and an unreachable server
//! read the same, and a malformed provider record reads as "not found".

use serde::{Deserialize, Serialize};

/// Display language for notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            "ar" | "ar-eg" => Ok(Self::Ar),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    LoginSucceeded,
    LoginFailed,
    LoginInProgress,
    InvalidCredentials,
    LoggedOut,
    SessionExpired,
    ProviderNotFound,
}

/// Localized text for a message key.
pub fn text(locale: Locale, key: MessageKey) -> &'static str {
    match (locale, key) {
        (Locale::En, MessageKey::LoginSucceeded) => "Signed in successfully",
        (Locale::En, MessageKey::LoginFailed) => "Sign-in failed. Please try again.",
        (Locale::En, MessageKey::LoginInProgress) => "A sign-in is already in progress",
        (Locale::En, MessageKey::InvalidCredentials) => {
            "Please enter your email and password"
        }
        (Locale::En, MessageKey::LoggedOut) => "You have been signed out",
        (Locale::En, MessageKey::SessionExpired) => {
            "Your session has expired. Please sign in again."
        }
        (Locale::En, MessageKey::ProviderNotFound) => "Provider not found",

        (Locale::Ar, MessageKey::LoginSucceeded) => "تم تسجيل الدخول بنجاح",
        (Locale::Ar, MessageKey::LoginFailed) => "فشل تسجيل الدخول. حاول مرة أخرى.",
        (Locale::Ar, MessageKey::LoginInProgress) => "جارٍ تسجيل الدخول بالفعل",
        (Locale::Ar, MessageKey::InvalidCredentials) => {
            "يرجى إدخال البريد الإلكتروني وكلمة المرور"
        }
        (Locale::Ar, MessageKey::LoggedOut) => "تم تسجيل الخروج",
        (Locale::Ar, MessageKey::SessionExpired) => {
            "انتهت صلاحية الجلسة. يرجى تسجيل الدخول مرة أخرى."
        }
        (Locale::Ar, MessageKey::ProviderNotFound) => "لم يتم العثور على مقدم الخدمة",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KEYS: &[MessageKey] = &[
        MessageKey::LoginSucceeded,
        MessageKey::LoginFailed,
        MessageKey::LoginInProgress,
        MessageKey::InvalidCredentials,
        MessageKey::LoggedOut,
        MessageKey::SessionExpired,
        MessageKey::ProviderNotFound,
    ];

    #[test]
    fn every_key_has_text_in_every_locale() {
        for locale in [Locale::En, Locale::Ar] {
            for key in ALL_KEYS {
                assert!(!text(locale, *key).is_empty(), "{locale:?} {key:?}");
            }
        }
    }

    #[test]
    fn locale_parses_region_tags() {
        assert_eq!("ar-EG".parse::<Locale>().unwrap(), Locale::Ar);
        assert_eq!(" EN ".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn default_locale_is_english() {
        assert_eq!(Locale::default(), Locale::En);
    }
}
