use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// A menu category, keyed by its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
}

impl Category {
    pub fn new(name: &str) -> Result<Self, CatalogError> {
        let name = name.trim();
        validate_name(name)?;
        Ok(Self { name: name.to_string() })
    }
}

/// Category names double as document ids.
pub fn validate_name(name: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::MissingField("Category"));
    }
    if name.contains('/') {
        return Err(CatalogError::InvalidCategory(name.to_string()));
    }
    Ok(())
}
