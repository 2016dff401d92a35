//! Microsoft Graph response types
//!
//! Data structures for deserializing Graph v1.0 drive and driveItem
//! responses. Fields this crate does not interpret are kept in `extra`, so a
//! value serializes back to the JSON it was read from.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OneDriveError, Result};

/// Graph error code returned when an item path or id does not exist
pub const ITEM_NOT_FOUND: &str = "itemNotFound";

/// A document library (drive)
///
/// See: https://learn.microsoft.com/en-us/graph/api/resources/drive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveDescriptor {
    /// Drive ID
    pub id: String,

    pub description: String,

    /// Display name
    pub name: String,

    pub web_url: String,

    /// Identity set of the owning user or group
    pub owner: Value,

    /// Storage quota facet
    pub quota: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DriveDescriptor {
    pub(crate) const REQUIRED_FIELDS: &'static [&'static str] =
        &["id", "description", "name", "webUrl", "owner", "quota"];
}

/// Metadata of a single driveItem
///
/// See: https://learn.microsoft.com/en-us/graph/api/resources/driveitem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    /// Item ID
    pub id: String,

    pub name: String,

    pub web_url: String,

    /// Size in bytes (folders report the size of their contents)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date_time: Option<String>,

    /// Present on folders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<Value>,

    /// Present on files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceMetadata {
    pub(crate) const REQUIRED_FIELDS: &'static [&'static str] = &["id", "name", "webUrl"];

    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }

    pub fn is_file(&self) -> bool {
        self.file.is_some()
    }
}

/// One record of a delta feed
///
/// Records are not validated: deleted items in particular carry little more
/// than an id and the `deleted` facet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_reference: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<Value>,

    /// Present when the item was removed since the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DriveItem {
    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }

    pub fn is_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }
}

/// One page of `/root/delta`, or the aggregate of all pages
///
/// The aggregate returned by
/// [`DriveAccessor::fetch_delta`](crate::DriveAccessor::fetch_delta) carries
/// the final page's links and extra fields with `value` holding the records of
/// every page in fetch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaPage {
    pub value: Vec<DriveItem>,

    /// Full URL of the next page; absent on the last page
    #[serde(
        rename = "@odata.nextLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_link: Option<String>,

    /// Full URL to resume the feed from later; present on the last page
    #[serde(
        rename = "@odata.deltaLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub delta_link: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeltaPage {
    pub(crate) const REQUIRED_FIELDS: &'static [&'static str] = &["value"];

    pub fn has_next_page(&self) -> bool {
        self.next_link.is_some()
    }
}

/// Error body of a failed Graph request
///
/// See: https://learn.microsoft.com/en-us/graph/errors
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphErrorBody {
    pub code: String,

    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorBody,
}

impl GraphErrorBody {
    /// Extract the `error` object of a decoded response, if it has one
    pub fn from_response(response: &Value) -> Option<Self> {
        response.get("error")?;
        GraphErrorEnvelope::deserialize(response)
            .ok()
            .map(|envelope| envelope.error)
    }

    pub fn is_item_not_found(&self) -> bool {
        self.code == ITEM_NOT_FOUND
    }
}

/// Check that `response` is an object carrying every field in `required`
/// with a non-null value, then deserialize it.
pub(crate) fn parse_required<T: DeserializeOwned>(
    response: Value,
    required: &[&str],
    context: &str,
) -> Result<T> {
    let Some(object) = response.as_object() else {
        return Err(OneDriveError::ParseError(format!(
            "{}: expected a JSON object",
            context
        )));
    };

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|field| object.get(*field).map_or(true, Value::is_null))
        .collect();

    if !missing.is_empty() {
        return Err(OneDriveError::ParseError(format!(
            "{}: missing {}",
            context,
            missing.join(", ")
        )));
    }

    serde_json::from_value(response)
        .map_err(|e| OneDriveError::ParseError(format!("{}: {}", context, e)))
}
