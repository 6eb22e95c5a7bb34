//! Enumerated attributes shared by the kennel records.
//!
//! All of these are stored as lowercase text columns in the hosted store, so
//! they serialize as `snake_case` strings and round-trip through
//! [`Display`](std::fmt::Display) / [`FromStr`](std::str::FromStr).

use serde::{Deserialize, Serialize};

/// Generates `as_str`, `Display` and `FromStr` for a fieldless enum.
macro_rules! text_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stored text form.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", $label, ": {}"), s)),
                }
            }
        }
    };
}

/// Sex of a dog. Sires must be male and dams female.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

text_enum!(Gender, "gender", { Male => "male", Female => "female" });

/// Where a dog currently stands with respect to the kennel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DogStatus {
    /// Still in the kennel.
    #[default]
    Owned,
    /// Sold to a buyer.
    Sold,
    Deceased,
    /// Sold and later handed back.
    Returned,
}

text_enum!(DogStatus, "dog status", {
    Owned => "owned",
    Sold => "sold",
    Deceased => "deceased",
    Returned => "returned",
});

impl DogStatus {
    /// Whether the dog is physically kept (and fed, groomed, treated).
    #[must_use]
    pub const fn is_in_kennel(&self) -> bool {
        matches!(self, Self::Owned | Self::Returned)
    }
}

/// Category of a running cost booked against a dog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Medical,
    Food,
    Grooming,
    Other,
}

text_enum!(ExpenseCategory, "expense category", {
    Medical => "medical",
    Food => "food",
    Grooming => "grooming",
    Other => "other",
});

/// Kind of veterinary event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthRecordType {
    Vaccination,
    Checkup,
    Treatment,
}

text_enum!(HealthRecordType, "health record type", {
    Vaccination => "vaccination",
    Checkup => "checkup",
    Treatment => "treatment",
});
