use crate::models::Property;
use serde::{Deserialize, Serialize};

/// Which listings an admin view shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityFilter {
    #[default]
    All,
    Visible,
    Hidden,
}

/// Search over the merged listing
#[derive(Debug, Clone, Default)]
pub struct PropertyQuery {
    /// Case-insensitive substring of name, neighborhood, subcluster or id
    pub search: Option<String>,
    pub visibility: VisibilityFilter,
}

impl PropertyQuery {
    pub fn matches(&self, property: &Property) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                [
                    Some(property.name.as_str()),
                    Some(property.neighborhood.as_str()),
                    property.subcluster.as_deref(),
                    Some(property.id.as_str()),
                ]
                .into_iter()
                .flatten()
                .any(|value| value.to_lowercase().contains(&term))
            }
        };

        let matches_visibility = match self.visibility {
            VisibilityFilter::All => true,
            VisibilityFilter::Visible => property.is_visible(),
            VisibilityFilter::Hidden => !property.is_visible(),
        };

        matches_search && matches_visibility
    }

    pub fn apply(&self, properties: Vec<Property>) -> Vec<Property> {
        properties.into_iter().filter(|p| self.matches(p)).collect()
    }
}

/// Counters shown above the admin table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListingStats {
    pub total: usize,
    pub visible: usize,
    pub hidden: usize,
    pub custom: usize,
}

impl ListingStats {
    pub fn from_properties(properties: &[Property]) -> Self {
        let visible = properties.iter().filter(|p| p.is_visible()).count();
        Self {
            total: properties.len(),
            visible,
            hidden: properties.len() - visible,
            custom: properties.iter().filter(|p| p.is_custom()).count(),
        }
    }
}
