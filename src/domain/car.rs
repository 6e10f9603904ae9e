//! Car listing domain model.

use im::OrdSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::Timestamp;
use super::user::UserId;

/// Maximum number of images a single listing may carry.
pub const MAX_CAR_IMAGES: usize = 10;

/// Unique identifier for a car listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CarId(Uuid);

impl CarId {
    /// Creates a `CarId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new time-ordered `CarId` (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for CarId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A tag for categorizing listings.
///
/// The tag name is trimmed and lower-cased on construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag(String);

impl Tag {
    /// Creates a new normalized `Tag`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self(name.trim().to_lowercase())
    }

    /// Returns the tag name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A car listing.
///
/// Images are URLs produced by an external media host; this service only
/// stores them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    /// Unique identifier for the listing.
    pub car_id: CarId,
    /// The user who created the listing.
    pub owner: UserId,
    /// Listing title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Image URLs, at most [`MAX_CAR_IMAGES`].
    pub images: Vec<String>,
    /// Tags, in name order.
    pub tags: OrdSet<Tag>,
    /// Timestamp when the listing was created.
    pub created_at: Timestamp,
    /// Timestamp when the listing was last updated.
    pub updated_at: Timestamp,
    /// Version number for optimistic locking.
    pub version: u64,
}

impl Car {
    /// Creates a listing with no description, images or tags.
    #[must_use]
    pub fn new(car_id: CarId, owner: UserId, title: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            car_id,
            owner,
            title: title.into(),
            description: None,
            images: Vec::new(),
            tags: OrdSet::new(),
            created_at: timestamp,
            updated_at: timestamp,
            version: 1,
        }
    }

    /// Returns a new listing with the given title.
    #[must_use]
    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }

    /// Returns a new listing with the given description.
    #[must_use]
    pub fn with_description(self, description: Option<String>) -> Self {
        Self {
            description,
            ..self
        }
    }

    /// Returns a new listing with the given images.
    #[must_use]
    pub fn with_images(self, images: Vec<String>) -> Self {
        Self { images, ..self }
    }

    /// Returns a new listing with the given tags.
    #[must_use]
    pub fn with_tags(self, tags: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
            ..self
        }
    }

    /// Returns a new listing with the updated timestamp.
    #[must_use]
    pub fn with_updated_at(self, timestamp: Timestamp) -> Self {
        Self {
            updated_at: timestamp,
            ..self
        }
    }

    /// Returns a new listing with an incremented version.
    ///
    /// # Panics
    ///
    /// Panics if the version number overflows `u64::MAX`.
    #[must_use]
    pub fn increment_version(self) -> Self {
        Self {
            version: self
                .version
                .checked_add(1)
                .expect("Version overflow: version number exceeded u64::MAX"),
            ..self
        }
    }

    /// Returns `true` if `user` created this listing.
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }

    /// Returns `true` if the keyword occurs in the title or description
    /// (case-insensitive), or equals one of the tags.
    #[must_use]
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(&needle))
            || self.tags.contains(&Tag::new(needle))
    }
}
