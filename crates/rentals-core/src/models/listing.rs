//! Listing model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Category;
use crate::error::{Error, Result};

/// Opaque listing identifier.
///
/// Client-created ids are UUIDs; server-assigned ids may be anything non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    /// Create a new client-side listing id
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ListingId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("listing id cannot be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// A rental advertisement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub category: Category,
    /// Any integer; negative prices are accepted as-is
    pub price: i64,
    pub description: String,
    pub owner: String,
    /// `YYYY-MM-DD`, not checked for being a real or past date
    pub upload_date: String,
    pub location: String,
}

impl Listing {
    /// Check the text fields the server requires to be non-empty.
    pub fn validate(&self) -> Result<()> {
        validate_text_fields([
            ("title", self.title.as_str()),
            ("description", self.description.as_str()),
            ("owner", self.owner.as_str()),
            ("uploadDate", self.upload_date.as_str()),
            ("location", self.location.as_str()),
        ])
    }

    /// Apply the fields present in `patch`, keeping the id.
    pub fn apply_patch(&mut self, patch: ListingPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(owner) = patch.owner {
            self.owner = owner;
        }
        if let Some(upload_date) = patch.upload_date {
            self.upload_date = upload_date;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
    }
}

impl From<Listing> for ListingDraft {
    fn from(listing: Listing) -> Self {
        Self {
            id: Some(listing.id),
            title: listing.title,
            category: listing.category,
            price: listing.price,
            description: listing.description,
            owner: listing.owner,
            upload_date: listing.upload_date,
            location: listing.location,
        }
    }
}

/// A listing about to be created; the id is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ListingId>,
    pub title: String,
    pub category: Category,
    pub price: i64,
    pub description: String,
    pub owner: String,
    pub upload_date: String,
    pub location: String,
}

impl ListingDraft {
    /// Turn the draft into a listing, generating an id when none was given.
    #[must_use]
    pub fn into_listing(self) -> Listing {
        self.into_listing_with(ListingId::generate)
    }

    /// Turn the draft into a listing using `next_id` when none was given.
    pub fn into_listing_with(self, next_id: impl FnOnce() -> ListingId) -> Listing {
        Listing {
            id: self.id.unwrap_or_else(next_id),
            title: self.title,
            category: self.category,
            price: self.price,
            description: self.description,
            owner: self.owner,
            upload_date: self.upload_date,
            location: self.location,
        }
    }
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ListingPatch {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("title", self.title.as_deref()),
            ("description", self.description.as_deref()),
            ("owner", self.owner.as_deref()),
            ("uploadDate", self.upload_date.as_deref()),
            ("location", self.location.as_deref()),
        ];
        validate_text_fields(
            fields
                .into_iter()
                .filter_map(|(name, value)| value.map(|value| (name, value))),
        )
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.owner.is_none()
            && self.upload_date.is_none()
            && self.location.is_none()
    }
}

fn validate_text_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<()> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!("{name} must not be empty")));
        }
    }
    Ok(())
}
