use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod display;

/// Where a record in the merged listing came from.
///
/// Never persisted: the store derives it every time it merges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Shipped with the built-in catalog
    Initial,
    /// Created or edited by an administrator
    Custom,
}

/// Availability of a listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Availability {
    #[default]
    AvailableNow,
    NotAvailable,
    /// Available from an ISO date (`YYYY-MM-DD`), possibly not yet confirmed
    Date {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
    },
}

/// Photo, floorplan or development picture attached to a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyMedia {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyMedia {
    pub fn new(url: impl Into<String>, title: &str, description: &str) -> Self {
        Self {
            url: url.into(),
            title: Some(title.to_string()),
            description: Some(description.to_string()),
        }
    }
}

/// Core property listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// URL-safe identifier, unique within the merged listing
    pub id: String,
    /// Primary photo (URL or data URI)
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcluster: Option<String>,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default)]
    pub sqft: u32,
    /// Free text, e.g. "AED 15,000,000"
    #[serde(default)]
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_price_per_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_details: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_map_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gallery_images: Vec<PropertyMedia>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub development_images: Vec<PropertyMedia>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub floorplans: Vec<PropertyMedia>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maids_room: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_visible() -> bool {
    true
}

impl Default for Property {
    fn default() -> Self {
        Self {
            id: String::new(),
            image: String::new(),
            name: String::new(),
            neighborhood: String::new(),
            subcluster: None,
            bedrooms: 0,
            bathrooms: 0,
            sqft: 0,
            price: String::new(),
            rent_price_per_year: None,
            price_details: None,
            labels: Vec::new(),
            description: String::new(),
            amenities: Vec::new(),
            features: Vec::new(),
            location_description: None,
            google_map_url: None,
            video_url: None,
            visible: true,
            gallery_images: Vec::new(),
            development_images: Vec::new(),
            floorplans: Vec::new(),
            availability: None,
            maids_room: None,
            source: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Property {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_custom(&self) -> bool {
        self.source == Some(Source::Custom)
    }

    /// The record as it is persisted: provenance removed.
    pub fn without_source(&self) -> Property {
        Property {
            source: None,
            ..self.clone()
        }
    }

    pub fn with_source(self, source: Source) -> Property {
        Property {
            source: Some(source),
            ..self
        }
    }

    /// Stamp edit timestamps before handing the record to the store.
    ///
    /// `createdAt` survives from the previous version when there is one.
    pub fn touch(&mut self, previous: Option<&Property>, now: DateTime<Utc>) {
        self.created_at = previous
            .and_then(|p| p.created_at)
            .or(self.created_at)
            .or(Some(now));
        self.updated_at = Some(now);
    }
}
