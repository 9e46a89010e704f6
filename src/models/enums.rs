use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unknown token for a string-backed enum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for {field}: {value}")]
pub struct ParseEnumError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ScanKind {
    Label => "label",
    Prescription => "prescription",
});

str_enum!(DateClass {
    Manufacturing => "manufacturing",
    Expiry => "expiry",
    Other => "other",
});

str_enum!(ExpiryStatus {
    Expired => "expired",
    ExpiringSoon => "expiring_soon",
    Valid => "valid",
});

str_enum!(Recurrence {
    Daily => "daily",
    TwiceDaily => "twice_daily",
    ThreeTimesDaily => "three_times_daily",
    Weekly => "weekly",
    Custom => "custom",
});

impl Default for ScanKind {
    fn default() -> Self {
        Self::Label
    }
}
