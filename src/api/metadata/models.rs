//! Read models for OptionSet metadata returned by the Web API

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `null` and a missing field both become `T::default()`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One label in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalizedLabel {
    #[serde(default)]
    pub label: String,
    pub language_code: i32,
}

/// Dataverse `Label` complex type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Label {
    #[serde(default, deserialize_with = "null_as_default")]
    pub localized_labels: Vec<LocalizedLabel>,
    #[serde(default)]
    pub user_localized_label: Option<LocalizedLabel>,
}

impl Label {
    /// Label text in exactly `language_code`
    pub fn label_for(&self, language_code: i32) -> Option<&str> {
        self.localized_labels
            .iter()
            .find(|l| l.language_code == language_code)
            .map(|l| l.label.as_str())
    }

    /// Best label for display: the requested language, then the user's, then any
    pub fn display(&self, language_code: i32) -> Option<&str> {
        self.label_for(language_code)
            .or_else(|| self.user_localized_label.as_ref().map(|l| l.label.as_str()))
            .or_else(|| self.localized_labels.first().map(|l| l.label.as_str()))
    }
}

/// One option of an option set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OptionMetadata {
    pub value: Option<i32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: Label,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Global or local option set definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OptionSetDef {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: Label,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<OptionMetadata>,
    #[serde(default)]
    pub option_set_type: Option<String>,
    #[serde(default)]
    pub is_custom_option_set: Option<bool>,
    #[serde(default)]
    pub metadata_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OptionSetDef {
    pub fn display_label(&self, language_code: i32) -> Option<&str> {
        self.display_name.display(language_code)
    }

    /// Case-insensitive substring match on the DisplayName in `language_code`
    pub fn display_name_contains(&self, text: &str, language_code: i32) -> bool {
        let needle = text.to_lowercase();
        self.display_name
            .localized_labels
            .iter()
            .any(|l| l.language_code == language_code && l.label.to_lowercase().contains(&needle))
    }
}

/// Picklist attribute with its option set expanded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PicklistAttributeDef {
    #[serde(default)]
    pub logical_name: String,
    #[serde(default)]
    pub option_set: Option<OptionSetDef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `{"value": [...]}` collection envelope
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optionset_def_from_api_shape() {
        let raw = json!({
            "@odata.context": "https://org.crm.dynamics.com/api/data/v9.2/$metadata#GlobalOptionSetDefinitions/$entity",
            "MetadataId": "7a2c5c2e-0000-0000-0000-000000000001",
            "Name": "new_phoneprefix",
            "IsCustomOptionSet": true,
            "OptionSetType": "Picklist",
            "DisplayName": {
                "LocalizedLabels": [
                    {"Label": "Phone Prefix", "LanguageCode": 1033, "IsManaged": false},
                    {"Label": "Vorwahl", "LanguageCode": 1031, "IsManaged": false}
                ],
                "UserLocalizedLabel": {"Label": "Phone Prefix", "LanguageCode": 1033}
            },
            "Options": [
                {"Value": 1, "Label": {"LocalizedLabels": [{"Label": "USA", "LanguageCode": 1033}], "UserLocalizedLabel": null}},
                {"Value": 49, "Label": null}
            ]
        });

        let def: OptionSetDef = serde_json::from_value(raw).unwrap();
        assert_eq!(def.name, "new_phoneprefix");
        assert_eq!(def.options.len(), 2);
        assert_eq!(def.options[0].value, Some(1));
        assert_eq!(def.options[0].label.label_for(1033), Some("USA"));
        assert_eq!(def.options[1].label, Label::default());
        assert_eq!(def.display_label(1031), Some("Vorwahl"));
        assert!(def.extra.contains_key("@odata.context"));
    }

    #[test]
    fn test_display_name_search_respects_language() {
        let def: OptionSetDef = serde_json::from_value(json!({
            "Name": "new_region",
            "DisplayName": {"LocalizedLabels": [{"Label": "Sales Region", "LanguageCode": 1033}]}
        }))
        .unwrap();

        assert!(def.display_name_contains("REGION", 1033));
        assert!(!def.display_name_contains("region", 1031));
        assert!(!def.display_name_contains("country", 1033));
    }

    #[test]
    fn test_label_display_fallbacks() {
        let label = Label {
            localized_labels: vec![LocalizedLabel {
                label: "Rot".to_string(),
                language_code: 1031,
            }],
            user_localized_label: None,
        };
        assert_eq!(label.display(1033), Some("Rot"));
        assert_eq!(Label::default().display(1033), None);
    }
}
