//! Product categories and their storage partitions.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Category`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    /// The tag is not one of the recognized categories.
    #[error("unknown category: {0}")]
    Unknown(String),
}

/// Product category.
///
/// Every category owns exactly one independently persisted partition of the
/// cart. The declaration order is the render order of the aggregate cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Fight gear: gloves, wraps, guards.
    Equipment,
    /// Body care products.
    Cosmetic,
    /// Supplements and pharmacy goods.
    Pharma,
}

impl Category {
    /// All categories in aggregate order.
    pub const ALL: [Self; 3] = [Self::Equipment, Self::Cosmetic, Self::Pharma];

    /// Returns the wire tag stored in the `category` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equipment => "equipment",
            Self::Cosmetic => "cosmetic",
            Self::Pharma => "pharma",
        }
    }

    /// Returns the storage key of this category's partition.
    ///
    /// These keys are shared with every page of the site and must never change.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Equipment => "nosorogEquipmentCart",
            Self::Cosmetic => "nosorogCosmeticCart",
            Self::Pharma => "nosorogPharmaCart",
        }
    }

    /// Looks up the category whose partition lives under `key`.
    #[must_use]
    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.storage_key() == key)
    }

    /// Human-readable name shown next to a cart line.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Equipment => "Экипировка",
            Self::Cosmetic => "Косметика",
            Self::Pharma => "Аптека",
        }
    }

    /// Icon shown next to a cart line.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Equipment => "🥊",
            Self::Cosmetic => "🧼",
            Self::Pharma => "💊",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equipment" => Ok(Self::Equipment),
            "cosmetic" => Ok(Self::Cosmetic),
            "pharma" => Ok(Self::Pharma),
            _ => Err(CategoryError::Unknown(s.to_owned())),
        }
    }
}
