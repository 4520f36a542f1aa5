use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// A restaurant branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub image: String,
}

/// Text fields of a location form; the image arrives separately.
#[derive(Debug, Clone, Default)]
pub struct LocationDraft {
    pub name: Option<String>,
    pub address: Option<String>,
}

impl LocationDraft {
    pub fn into_location(self, image: String) -> Result<Location, CatalogError> {
        let name = self.name.unwrap_or_default();
        let address = self.address.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(CatalogError::MissingField("Location name"));
        }
        if address.trim().is_empty() {
            return Err(CatalogError::MissingField("Location address"));
        }
        Ok(Location {
            name: name.trim().to_string(),
            address: address.trim().to_string(),
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_requires_name_and_address() {
        let draft = LocationDraft {
            name: Some("Downtown".to_string()),
            address: None,
        };
        assert_eq!(
            draft.into_location(String::new()),
            Err(CatalogError::MissingField("Location address"))
        );

        let draft = LocationDraft {
            name: Some(" Downtown ".to_string()),
            address: Some("1 Main St".to_string()),
        };
        let location = draft.into_location("https://cdn/loc.png".to_string()).unwrap();
        assert_eq!(location.name, "Downtown");
        assert_eq!(location.image, "https://cdn/loc.png");
    }
}
