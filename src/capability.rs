//! Provider capability check.
//!
//! Turns a raw `UserProfile` into a validated `ProviderProfile`, checked in order:
//! 1. Role tag is a provider role → else NOT A PROVIDER
//! 2. Role tag equals the expected role → else ROLE MISMATCH
//! 3. `address` present and non-blank
//! 4. `phone` present and non-blank
//! 5. `isActive` present
//!
//! Closed-world: a record missing any required field is rejected whatever its
//! role tag says. Rejection reasons are for logs; users only see "not found".

use crate::models::{ProviderProfile, ProviderRole, Role, UserProfile};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Why a profile failed the capability check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("Role {0} is not a provider role")]
    NotAProvider(Role),
    #[error("Expected role {expected}, profile has {actual}")]
    RoleMismatch { expected: ProviderRole, actual: Role },
    #[error("Provider profile is missing required field `{0}`")]
    MissingField(&'static str),
}

/// A profile classified by what it can be trusted for.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifiedProfile {
    Patient(UserProfile),
    Provider(ProviderProfile),
    Admin(UserProfile),
    /// Provider role tag without the provider field set.
    Incomplete(UserProfile, CapabilityError),
}

// ═══════════════════════════════════════════════════════════
// Checks
// ═══════════════════════════════════════════════════════════

/// Validate `profile` as a provider of role `expected`.
pub fn verify_provider(
    profile: &UserProfile,
    expected: ProviderRole,
) -> Result<ProviderProfile, CapabilityError> {
    // Rule 1: provider role tag
    let actual = ProviderRole::try_from(profile.role).map_err(CapabilityError::NotAProvider)?;

    // Rule 2: matching role
    if actual != expected {
        return Err(CapabilityError::RoleMismatch {
            expected,
            actual: profile.role,
        });
    }

    // Rules 3-5: full provider field set
    let address = required_text(profile.address.as_deref(), "address")?;
    let phone = required_text(profile.phone.as_deref(), "phone")?;
    let is_active = profile
        .is_active
        .ok_or(CapabilityError::MissingField("isActive"))?;

    Ok(ProviderProfile {
        id: profile.id.clone(),
        role: actual,
        name: profile.name.clone(),
        address: address.to_string(),
        phone: phone.to_string(),
        is_active,
        specialty: profile.specialty.clone(),
    })
}

/// Total classification of any profile.
pub fn classify(profile: &UserProfile) -> VerifiedProfile {
    match ProviderRole::try_from(profile.role) {
        Ok(role) => match verify_provider(profile, role) {
            Ok(provider) => VerifiedProfile::Provider(provider),
            Err(reason) => VerifiedProfile::Incomplete(profile.clone(), reason),
        },
        Err(Role::Admin) => VerifiedProfile::Admin(profile.clone()),
        Err(_) => VerifiedProfile::Patient(profile.clone()),
    }
}

fn required_text<'a>(
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str, CapabilityError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(CapabilityError::MissingField(field))
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
