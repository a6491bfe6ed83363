//! Site-wide preferences stored as one JSON blob in the settings table.

use serde::{Deserialize, Serialize};

/// Name of the settings row that holds [`SitePreferences`].
pub const SITE_PREFS_KEY: &str = "site_prefs";

pub const DEFAULT_TITLE: &str = "Quill";
pub const DEFAULT_DESCRIPTION: &str = "Quill is a lightweight content management system";

/// Starter handlebars layout offered to editors who opt into a custom template.
pub const STARTER_TEMPLATE: &str = include_str!("../../templates/custom_starter.hbs");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitePreferences {
    pub title: String,
    pub description: String,
    /// Slug of the page served at `/`.
    #[serde(with = "string_or_false")]
    pub front: Option<String>,
    #[serde(rename = "templateDefault")]
    pub template_default: bool,
    #[serde(rename = "templateText", with = "string_or_false")]
    pub template_text: Option<String>,
}

impl Default for SitePreferences {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            front: None,
            template_default: true,
            template_text: Some(STARTER_TEMPLATE.to_string()),
        }
    }
}

impl SitePreferences {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The custom template to render with, if the site opted out of the
    /// built-in layout and supplied a non-blank one.
    pub fn custom_template(&self) -> Option<&str> {
        if self.template_default {
            return None;
        }
        self.template_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    pub fn is_front(&self, slug: &str) -> bool {
        self.front.as_deref() == Some(slug)
    }
}

/// `Option<String>` encoded as either a JSON string or `false`.
mod string_or_false {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Flag(bool),
        Null(()),
    }

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(text) => serializer.serialize_str(text),
            None => serializer.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) if !text.is_empty() => Some(text),
            Raw::Text(_) | Raw::Flag(_) | Raw::Null(()) => None,
        })
    }
}
