use serde::{Deserialize, Serialize};

use crate::models::Site;

/// A watched product page. `url` is the identity key; `site` selects the classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub site: Site,
    pub name: String,
    pub url: String,
}

impl Product {
    pub fn new(site: Site, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            site,
            name: name.into(),
            url: url.into(),
        }
    }
}
