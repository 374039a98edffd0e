//! API Constants and Configuration for the Dataverse Web API

use std::time::Duration;

/// Dataverse Web API version
pub const API_VERSION: &str = "v9.2";

/// Base API path for Dataverse
pub const API_BASE_PATH: &str = "/api/data";

/// Full API path with version
pub fn api_path() -> String {
    format!("{}/{}", API_BASE_PATH, API_VERSION)
}

/// Default Azure AD authority
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Default label language (English - United States)
pub const DEFAULT_LANGUAGE_CODE: i32 = 1033;

/// Seconds shaved off a token's lifetime before it is considered stale
pub const TOKEN_SAFETY_MARGIN_SECS: u64 = 60;

/// Lifetime assumed when the identity provider omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Batch endpoint for multi-operation requests
pub const BATCH_ENDPOINT: &str = "$batch";

/// Change set boundary inside every batch body.
///
/// Fixed on purpose: the outer boundary is unique per call, and payload JSON
/// never produces a line starting with `--`.
pub const CHANGESET_BOUNDARY: &str = "changeset_001";

/// Marker prefix of the server's changeset response boundary
pub const CHANGESET_RESPONSE_MARKER: &str = "--changesetresponse_";

/// OData type tags used in metadata bodies
pub mod odata_types {
    pub const OPTION_SET_METADATA: &str = "Microsoft.Dynamics.CRM.OptionSetMetadata";
    pub const OPTION_METADATA: &str = "Microsoft.Dynamics.CRM.OptionMetadata";
    pub const PICKLIST_ATTRIBUTE_METADATA: &str = "Microsoft.Dynamics.CRM.PicklistAttributeMetadata";
}

/// Unbound actions that change option values
pub mod actions {
    pub const INSERT_OPTION_VALUE: &str = "InsertOptionValue";
    pub const UPDATE_OPTION_VALUE: &str = "UpdateOptionValue";
    pub const DELETE_OPTION_VALUE: &str = "DeleteOptionValue";
}

/// Standard headers for Dataverse requests
pub mod headers {
    /// Content type for JSON requests
    pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

    /// Content type wrapping each changeset part
    pub const CONTENT_TYPE_HTTP: &str = "application/http";

    /// OData version header value (used for both OData-Version and OData-MaxVersion)
    pub const ODATA_VERSION: &str = "4.0";

    /// Prefer header asking the server to keep going after a failed changeset item
    pub const PREFER_CONTINUE_ON_ERROR: &str = "odata.continue-on-error";
}

/// HTTP methods for operations
pub mod methods {
    pub const POST: &str = "POST";
}

/// Per-call timeout ceilings
pub mod timeouts {
    use super::Duration;

    pub const TOKEN: Duration = Duration::from_secs(30);
    pub const SINGLE: Duration = Duration::from_secs(30);
    pub const LIST: Duration = Duration::from_secs(60);
    pub const CREATE: Duration = Duration::from_secs(60);
    pub const BATCH: Duration = Duration::from_secs(300);
}

/// Quote a value as an OData string key literal and percent-encode it for a URL path
pub fn key_literal(value: &str) -> String {
    let escaped = value.replace('\'', "''");
    format!("'{}'", urlencoding::encode(&escaped))
}

/// Build the token endpoint URL for a tenant
pub fn token_endpoint(authority_host: &str, tenant_id: &str) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        authority_host.trim_end_matches('/'),
        tenant_id
    )
}

/// Build the `.default` scope for an environment
pub fn default_scope(base_url: &str) -> String {
    format!("{}/.default", base_url)
}

/// Build the collection endpoint for global option sets
pub fn global_optionsets_endpoint(base_url: &str) -> String {
    format!("{}{}/GlobalOptionSetDefinitions", base_url, api_path())
}

/// Build the endpoint for a single global option set by schema name
pub fn global_optionset_endpoint(base_url: &str, name: &str) -> String {
    format!(
        "{}{}/GlobalOptionSetDefinitions(Name={})",
        base_url,
        api_path(),
        key_literal(name)
    )
}

/// Build the endpoint for a local picklist attribute with its option set expanded
pub fn local_optionset_endpoint(base_url: &str, entity: &str, attribute: &str) -> String {
    format!(
        "{}{}/EntityDefinitions(LogicalName={})/Attributes(LogicalName={})/{}?$expand=OptionSet",
        base_url,
        api_path(),
        key_literal(entity),
        key_literal(attribute),
        odata_types::PICKLIST_ATTRIBUTE_METADATA
    )
}

/// Build an unbound action endpoint URL
pub fn action_endpoint(base_url: &str, action: &str) -> String {
    format!("{}{}/{}", base_url, api_path(), action)
}

/// Build batch endpoint URL
pub fn batch_endpoint(base_url: &str) -> String {
    format!("{}{}/{}", base_url, api_path(), BATCH_ENDPOINT)
}
