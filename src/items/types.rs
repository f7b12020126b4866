use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// CRM object type an item was built from.
///
/// Unknown tags are kept verbatim in `Other` and get generic fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemType {
    Contact,
    Company,
    Deal,
    Other(String),
}

impl ItemType {
    pub fn as_str(&self) -> &str {
        match self {
            ItemType::Contact => "Contact",
            ItemType::Company => "Company",
            ItemType::Deal => "Deal",
            ItemType::Other(tag) => tag,
        }
    }

    /// Path segment of the CRM object, shared by the API and the app deep links.
    pub fn object_path(&self) -> Option<&'static str> {
        match self {
            ItemType::Contact => Some("contacts"),
            ItemType::Company => Some("companies"),
            ItemType::Deal => Some("deals"),
            ItemType::Other(_) => None,
        }
    }

    pub fn default_display_name(&self) -> &'static str {
        match self {
            ItemType::Contact => "Unknown Contact",
            ItemType::Company => "Unknown Company",
            ItemType::Deal => "Unknown Deal",
            ItemType::Other(_) => "Unknown",
        }
    }
}

impl From<String> for ItemType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "Contact" => ItemType::Contact,
            "Company" => ItemType::Company,
            "Deal" => ItemType::Deal,
            _ => ItemType::Other(tag),
        }
    }
}

impl From<&str> for ItemType {
    fn from(tag: &str) -> Self {
        ItemType::from(tag.to_string())
    }
}

impl From<ItemType> for String {
    fn from(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CRM record in the uniform shape shared by all integrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub is_directory: bool,
    pub display_name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub source_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_parse() {
        assert_eq!(ItemType::from("Contact"), ItemType::Contact);
        assert_eq!(ItemType::from("Company"), ItemType::Company);
        assert_eq!(ItemType::from("Deal"), ItemType::Deal);
        assert_eq!(ItemType::from("Ticket"), ItemType::Other("Ticket".into()));
        // Tags are case-sensitive.
        assert_eq!(ItemType::from("contact"), ItemType::Other("contact".into()));
    }

    #[test]
    fn defaults_and_paths() {
        assert_eq!(ItemType::Contact.object_path(), Some("contacts"));
        assert_eq!(ItemType::Company.object_path(), Some("companies"));
        assert_eq!(ItemType::Deal.object_path(), Some("deals"));
        assert_eq!(ItemType::Other("Ticket".into()).object_path(), None);
        assert_eq!(ItemType::Other("Ticket".into()).default_display_name(), "Unknown");
    }

    #[test]
    fn item_serializes_type_as_plain_string() {
        let item = IntegrationItem {
            id: "101".into(),
            item_type: ItemType::Deal,
            is_directory: false,
            display_name: "Renewal".into(),
            created_at: None,
            modified_at: None,
            source_url: Some("https://app.hubspot.com/contacts/deals/101".into()),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "Deal");
        assert_eq!(json["is_directory"], false);
        assert!(json["created_at"].is_null());

        let other = IntegrationItem {
            item_type: ItemType::Other("Ticket".into()),
            ..item
        };
        let json = serde_json::to_value(&other).unwrap();
        assert_eq!(json["type"], "Ticket");
    }
}
