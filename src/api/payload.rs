//! Request bodies for the option value actions and for option set creation
//!
//! Everything here is a pure transformation from an [`OptionItem`] plus a
//! [`TargetRef`] into a serde-serializable body. The target is a closed enum,
//! so a payload carries either `OptionSetName` or the
//! `EntityLogicalName`/`AttributeLogicalName` pair, never both.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::constants::{odata_types, DEFAULT_LANGUAGE_CODE};

/// A single option: display label plus integer value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionItem {
    pub label: String,
    pub value: i32,
}

impl OptionItem {
    pub fn new(label: impl Into<String>, value: i32) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    /// Stand-in for response parts that have no matching input
    pub(crate) fn placeholder() -> Self {
        Self::new("?", -1)
    }
}

/// Which option set an operation addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRef {
    /// Global option set, by schema name
    Global { name: String },
    /// Local option set of a picklist attribute
    Local { entity: String, attribute: String },
}

impl TargetRef {
    pub fn global(name: impl Into<String>) -> Self {
        Self::Global { name: name.into() }
    }

    pub fn local(entity: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::Local {
            entity: entity.into(),
            attribute: attribute.into(),
        }
    }

    fn fields(&self) -> TargetFields<'_> {
        match self {
            Self::Global { name } => TargetFields::Global {
                option_set_name: name,
            },
            Self::Local { entity, attribute } => TargetFields::Local {
                entity_logical_name: entity,
                attribute_logical_name: attribute,
            },
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global { name } => write!(f, "{}", name),
            Self::Local { entity, attribute } => write!(f, "{}.{}", entity, attribute),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum TargetFields<'a> {
    Global {
        #[serde(rename = "OptionSetName")]
        option_set_name: &'a str,
    },
    Local {
        #[serde(rename = "EntityLogicalName")]
        entity_logical_name: &'a str,
        #[serde(rename = "AttributeLogicalName")]
        attribute_logical_name: &'a str,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct LocalizedLabelBody<'a> {
    label: &'a str,
    language_code: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LabelBody<'a> {
    localized_labels: [LocalizedLabelBody<'a>; 1],
}

impl<'a> LabelBody<'a> {
    fn single(label: &'a str, language_code: i32) -> Self {
        Self {
            localized_labels: [LocalizedLabelBody {
                label,
                language_code,
            }],
        }
    }
}

/// Body of `InsertOptionValue`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InsertPayload<'a> {
    label: LabelBody<'a>,
    value: i32,
    #[serde(flatten)]
    target: TargetFields<'a>,
}

/// Body of `UpdateOptionValue`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdatePayload<'a> {
    label: LabelBody<'a>,
    value: i32,
    /// Merge the label into the existing localized labels instead of replacing them
    merge_labels: bool,
    #[serde(flatten)]
    target: TargetFields<'a>,
}

/// Body of `DeleteOptionValue`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeletePayload<'a> {
    value: i32,
    #[serde(flatten)]
    target: TargetFields<'a>,
}

/// One entry of the `Options` array in a create body
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OptionMetadataBody<'a> {
    #[serde(rename = "@odata.type")]
    odata_type: &'static str,
    label: LabelBody<'a>,
    value: i32,
}

/// Kind of option set to create
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionSetType {
    #[default]
    Picklist,
    State,
    Status,
    Boolean,
}

/// Everything needed to create a brand-new global option set
#[derive(Debug, Clone)]
pub struct CreateOptionSetRequest {
    pub name: String,
    pub display_label: String,
    pub options: Vec<OptionItem>,
    pub is_custom: bool,
    pub option_set_type: OptionSetType,
}

impl CreateOptionSetRequest {
    pub fn new(name: impl Into<String>, display_label: impl Into<String>, options: Vec<OptionItem>) -> Self {
        Self {
            name: name.into(),
            display_label: display_label.into(),
            options,
            is_custom: true,
            option_set_type: OptionSetType::Picklist,
        }
    }

    pub fn is_custom(mut self, is_custom: bool) -> Self {
        self.is_custom = is_custom;
        self
    }

    pub fn option_set_type(mut self, option_set_type: OptionSetType) -> Self {
        self.option_set_type = option_set_type;
        self
    }
}

/// `POST GlobalOptionSetDefinitions` body
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateOptionSetBody<'a> {
    #[serde(rename = "@odata.type")]
    odata_type: &'static str,
    name: &'a str,
    display_name: LabelBody<'a>,
    is_custom_option_set: bool,
    option_set_type: OptionSetType,
    options: Vec<OptionMetadataBody<'a>>,
}

/// Builds request bodies in one label language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadBuilder {
    language_code: i32,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE_CODE)
    }
}

impl PayloadBuilder {
    pub fn new(language_code: i32) -> Self {
        Self { language_code }
    }

    pub fn language_code(&self) -> i32 {
        self.language_code
    }

    pub fn insert_payload<'a>(&self, item: &'a OptionItem, target: &'a TargetRef) -> InsertPayload<'a> {
        InsertPayload {
            label: LabelBody::single(&item.label, self.language_code),
            value: item.value,
            target: target.fields(),
        }
    }

    pub fn update_payload<'a>(
        &self,
        item: &'a OptionItem,
        target: &'a TargetRef,
        merge_labels: bool,
    ) -> UpdatePayload<'a> {
        UpdatePayload {
            label: LabelBody::single(&item.label, self.language_code),
            value: item.value,
            merge_labels,
            target: target.fields(),
        }
    }

    pub fn delete_payload<'a>(&self, item: &'a OptionItem, target: &'a TargetRef) -> DeletePayload<'a> {
        DeletePayload {
            value: item.value,
            target: target.fields(),
        }
    }

    pub fn option_metadata<'a>(&self, item: &'a OptionItem) -> OptionMetadataBody<'a> {
        OptionMetadataBody {
            odata_type: odata_types::OPTION_METADATA,
            label: LabelBody::single(&item.label, self.language_code),
            value: item.value,
        }
    }

    pub fn create_body<'a>(&self, request: &'a CreateOptionSetRequest) -> CreateOptionSetBody<'a> {
        CreateOptionSetBody {
            odata_type: odata_types::OPTION_SET_METADATA,
            name: &request.name,
            display_name: LabelBody::single(&request.display_label, self.language_code),
            is_custom_option_set: request.is_custom,
            option_set_type: request.option_set_type,
            options: request
                .options
                .iter()
                .map(|item| self.option_metadata(item))
                .collect(),
        }
    }
}
