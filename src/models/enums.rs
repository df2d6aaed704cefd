use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Failure to parse one of the wire-level string enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field}: {value}")]
pub struct ParseEnumError {
    pub field: &'static str,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde goes through the same string forms so the wire format and
/// `FromStr` can never disagree.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name),
                        value: s.into(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(
    /// Account role carried by every user record.
    Role {
        Patient => "patient",
        Doctor => "doctor",
        Nurse => "nurse",
        Pharmacy => "pharmacy",
        Lab => "lab",
        Radiologist => "radiologist",
        Admin => "admin",
    }
);

str_enum!(
    /// Roles that offer care and must carry a full provider record.
    ProviderRole {
        Doctor => "doctor",
        Nurse => "nurse",
        Pharmacy => "pharmacy",
        Lab => "lab",
        Radiologist => "radiologist",
    }
);

str_enum!(RequestStatus {
    Pending => "pending",
    InProgress => "in_progress",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl Role {
    pub fn is_provider(&self) -> bool {
        ProviderRole::try_from(*self).is_ok()
    }
}

impl From<ProviderRole> for Role {
    fn from(role: ProviderRole) -> Self {
        match role {
            ProviderRole::Doctor => Role::Doctor,
            ProviderRole::Nurse => Role::Nurse,
            ProviderRole::Pharmacy => Role::Pharmacy,
            ProviderRole::Lab => Role::Lab,
            ProviderRole::Radiologist => Role::Radiologist,
        }
    }
}

impl TryFrom<Role> for ProviderRole {
    type Error = Role;

    fn try_from(role: Role) -> Result<Self, Self::Error> {
        match role {
            Role::Doctor => Ok(ProviderRole::Doctor),
            Role::Nurse => Ok(ProviderRole::Nurse),
            Role::Pharmacy => Ok(ProviderRole::Pharmacy),
            Role::Lab => Ok(ProviderRole::Lab),
            Role::Radiologist => Ok(ProviderRole::Radiologist),
            Role::Patient | Role::Admin => Err(role),
        }
    }
}
