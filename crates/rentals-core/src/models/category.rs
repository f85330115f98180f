//! Listing categories

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of categories a listing can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Home,
    Garden,
    Education,
    Vehicles,
    Technology,
    Computers,
    Clothing,
    Sports,
    Electronics,
    Outdoors,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Category must be one of: {}.", Category::names().join(", "))]
pub struct ParseCategoryError;

impl Category {
    pub const ALL: [Self; 10] = [
        Self::Home,
        Self::Garden,
        Self::Education,
        Self::Vehicles,
        Self::Technology,
        Self::Computers,
        Self::Clothing,
        Self::Sports,
        Self::Electronics,
        Self::Outdoors,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Garden => "Garden",
            Self::Education => "Education",
            Self::Vehicles => "Vehicles",
            Self::Technology => "Technology",
            Self::Computers => "Computers",
            Self::Clothing => "Clothing",
            Self::Sports => "Sports",
            Self::Electronics => "Electronics",
            Self::Outdoors => "Outdoors",
        }
    }

    /// Wire names of every category, in declaration order.
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|category| category.as_str()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s.trim())
            .ok_or(ParseCategoryError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_exact_match() {
        assert_eq!("Garden".parse::<Category>(), Ok(Category::Garden));
        assert_eq!(" Outdoors ".parse::<Category>(), Ok(Category::Outdoors));
        assert!("garden".parse::<Category>().is_err());
        assert!("Unknown".parse::<Category>().is_err());
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_string(&Category::Technology).unwrap();
        assert_eq!(json, "\"Technology\"");
        let parsed: Category = serde_json::from_str("\"Vehicles\"").unwrap();
        assert_eq!(parsed, Category::Vehicles);
    }

    #[test]
    fn parse_error_lists_allowed_values() {
        let message = "Nope".parse::<Category>().unwrap_err().to_string();
        assert!(message.starts_with("Category must be one of: Home, Garden"));
        assert!(message.contains("Outdoors"));
    }
}
