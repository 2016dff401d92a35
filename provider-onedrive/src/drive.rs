//! Drive accessor
//!
//! Resolves SharePoint document libraries to drive ids, aggregates paginated
//! delta feeds and looks up item metadata by path or id.

use bridge_traits::http::HttpMethod;
use core_runtime::config::GraphConfig;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::connector::{GraphApi, GraphConnector};
use crate::error::{OneDriveError, Result};
use crate::types::{parse_required, DeltaPage, DriveDescriptor, GraphErrorBody, ResourceMetadata};

/// Upper bound on delta pages fetched by one [`DriveAccessor::fetch_delta`]
/// call, counting the first page
pub const MAX_DELTA_PAGES: usize = 100;

/// Read-only accessor for one drive
///
/// The selected drive id is plain state: set it with
/// [`with_drive_id`](Self::with_drive_id), [`set_drive_id`](Self::set_drive_id)
/// or [`select_drive`](Self::select_drive) and it is reused by every
/// item-level call. Changing it needs `&mut self`, so sharing an accessor
/// across tasks requires the caller to synchronize (or clone one per task).
///
/// Every operation issues its requests one after another; nothing runs in
/// the background.
#[derive(Clone)]
pub struct DriveAccessor {
    api: Arc<dyn GraphApi>,
    drive_id: Option<String>,
}

impl DriveAccessor {
    pub fn new(api: Arc<dyn GraphApi>) -> Self {
        Self {
            api,
            drive_id: None,
        }
    }

    /// Accessor backed by a [`GraphConnector`] for `config`
    pub fn from_config(config: GraphConfig) -> Self {
        Self::new(Arc::new(GraphConnector::new(config)))
    }

    pub fn with_drive_id(mut self, drive_id: impl Into<String>) -> Self {
        self.drive_id = Some(drive_id.into());
        self
    }

    pub fn set_drive_id(&mut self, drive_id: impl Into<String>) {
        self.drive_id = Some(drive_id.into());
    }

    pub fn drive_id(&self) -> Option<&str> {
        self.drive_id.as_deref()
    }

    fn require_drive_id(&self) -> Result<&str> {
        self.drive_id.as_deref().ok_or_else(|| {
            OneDriveError::InvalidParameters(
                "no drive selected; call set_drive_id or select_drive first".to_string(),
            )
        })
    }

    /// Fetch the drive description of a site's document library
    ///
    /// Without `library` the site's default drive is returned. With it, the
    /// site's drives are listed and the first one whose URL-decoded name
    /// equals `library` exactly is returned.
    ///
    /// # Errors
    ///
    /// - `InvalidParameters` if `site_id` is empty
    /// - `ParseError` if no drive is named `library`, or if the drive lacks
    ///   any of `id`, `description`, `name`, `webUrl`, `owner`, `quota`
    #[instrument(skip(self))]
    pub async fn resolve_drive(
        &self,
        site_id: &str,
        library: Option<&str>,
    ) -> Result<DriveDescriptor> {
        if site_id.is_empty() {
            return Err(OneDriveError::InvalidParameters(
                "site id is required".to_string(),
            ));
        }

        let response = match library.filter(|name| !name.is_empty()) {
            Some(library) => {
                let url = format!("/v1.0/sites/{}/drives", site_id);
                let drives = self.api.request(HttpMethod::Get, &url).await?;
                find_library(drives, library)
            }
            None => {
                let url = format!("/v1.0/sites/{}/drive", site_id);
                Some(self.api.request(HttpMethod::Get, &url).await?)
            }
        };

        // A library that matched nothing is reported like a malformed drive
        let response = response.unwrap_or(Value::Null);
        let drive: DriveDescriptor = parse_required(
            response,
            DriveDescriptor::REQUIRED_FIELDS,
            "sharepoint drive",
        )?;

        info!(drive_id = %drive.id, name = %drive.name, "Resolved drive");
        Ok(drive)
    }

    /// [`resolve_drive`](Self::resolve_drive) projected to the drive id
    #[instrument(skip(self))]
    pub async fn resolve_drive_id(&self, site_id: &str, library: Option<&str>) -> Result<String> {
        let drive = self.resolve_drive(site_id, library).await?;

        if drive.id.is_empty() {
            return Err(OneDriveError::ParseError(
                "sharepoint drive: empty id".to_string(),
            ));
        }

        Ok(drive.id)
    }

    /// Resolve a drive and make it the selected drive
    #[instrument(skip(self))]
    pub async fn select_drive(&mut self, site_id: &str, library: Option<&str>) -> Result<String> {
        let drive_id = self.resolve_drive_id(site_id, library).await?;
        self.drive_id = Some(drive_id.clone());
        Ok(drive_id)
    }

    /// Fetch every change of the selected drive since `token`
    ///
    /// `token` is inserted into the delta URL as given, so it must already be
    /// URL-encoded (e.g. `2021-09-29T20%3A00%3A00Z` or `latest`). Each
    /// `@odata.nextLink` is followed verbatim until a page has none or
    /// [`MAX_DELTA_PAGES`] pages have been fetched; reaching the cap is not an
    /// error, the last fetched page is treated as final.
    ///
    /// The result is the final page with `value` replaced by the records of
    /// all pages in fetch order.
    ///
    /// # Errors
    ///
    /// - `InvalidParameters` if `token` is `None` or no drive is selected
    /// - `ParseError` if any page lacks `value`
    #[instrument(skip(self, token), fields(drive_id = ?self.drive_id))]
    pub async fn fetch_delta(&self, token: Option<&str>) -> Result<DeltaPage> {
        let token = token.ok_or_else(|| {
            OneDriveError::InvalidParameters("delta token is required".to_string())
        })?;
        let drive_id = self.require_drive_id()?;

        let url = format!("/v1.0/drives/{}/root/delta?token={}", drive_id, token);
        let mut page = self.fetch_delta_page(&url).await?;
        let mut pages_fetched = 1;
        let mut records = Vec::new();

        while pages_fetched < MAX_DELTA_PAGES {
            let Some(next_link) = page.next_link.clone() else {
                break;
            };

            records.append(&mut page.value);
            page = self.fetch_delta_page(&next_link).await?;
            pages_fetched += 1;
        }

        if page.has_next_page() {
            warn!(
                pages = pages_fetched,
                "Delta page limit reached, returning partial change set"
            );
        }

        records.append(&mut page.value);
        page.value = records;

        info!(
            pages = pages_fetched,
            items = page.value.len(),
            "Fetched drive delta"
        );
        Ok(page)
    }

    async fn fetch_delta_page(&self, url: &str) -> Result<DeltaPage> {
        let response = self.api.request(HttpMethod::Get, url).await?;
        let page: DeltaPage = parse_required(response, DeltaPage::REQUIRED_FIELDS, "delta page")?;

        debug!(
            items = page.value.len(),
            has_next = page.has_next_page(),
            "Fetched delta page"
        );
        Ok(page)
    }

    /// Look up an item of the selected drive by path or by id
    ///
    /// `item_id` takes precedence when both are given. A leading `/` on
    /// `path` is dropped. Returns `Ok(None)` when Graph answers
    /// `itemNotFound`.
    ///
    /// # Errors
    ///
    /// - `InvalidParameters` if both `path` and `item_id` are `None`, or no
    ///   drive is selected
    /// - `ParseError` if the item lacks any of `id`, `name`, `webUrl`
    #[instrument(skip(self), fields(drive_id = ?self.drive_id))]
    pub async fn fetch_resource_metadata(
        &self,
        path: Option<&str>,
        item_id: Option<&str>,
    ) -> Result<Option<ResourceMetadata>> {
        let url = match (item_id, path) {
            (Some(item_id), _) => {
                format!("/v1.0/drives/{}/items/{}", self.require_drive_id()?, item_id)
            }
            (None, Some(path)) => format!(
                "/v1.0/drives/{}/root:/{}",
                self.require_drive_id()?,
                path.strip_prefix('/').unwrap_or(path)
            ),
            (None, None) => {
                return Err(OneDriveError::InvalidParameters(
                    "either a path or an item id is required".to_string(),
                ))
            }
        };

        let response = self.api.request(HttpMethod::Get, &url).await?;

        if let Some(error) = GraphErrorBody::from_response(&response) {
            if error.is_item_not_found() {
                debug!("Resource not found");
                return Ok(None);
            }
            warn!(code = %error.code, "Graph returned an error for resource lookup");
        }

        let metadata: ResourceMetadata = parse_required(
            response,
            ResourceMetadata::REQUIRED_FIELDS,
            "resource metadata",
        )?;
        Ok(Some(metadata))
    }

    /// Whether [`fetch_resource_metadata`](Self::fetch_resource_metadata)
    /// finds the item; its errors are returned unchanged
    #[instrument(skip(self))]
    pub async fn resource_exists(&self, path: Option<&str>, item_id: Option<&str>) -> Result<bool> {
        Ok(self
            .fetch_resource_metadata(path, item_id)
            .await?
            .is_some())
    }
}

/// Pick the first drive of a `/drives` collection whose decoded name equals
/// `library`
fn find_library(drives: Value, library: &str) -> Option<Value> {
    let Value::Object(mut collection) = drives else {
        return None;
    };
    let Some(Value::Array(candidates)) = collection.remove("value") else {
        return None;
    };

    candidates.into_iter().find(|drive| {
        drive
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| decode_name(name) == library)
    })
}

/// Form-style URL decoding: `+` is a space, then percent escapes.
/// Names that do not decode to UTF-8 compare as given.
fn decode_name(name: &str) -> String {
    let spaced = name.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::json;

    mock! {
        Graph {}

        #[async_trait]
        impl GraphApi for Graph {
            async fn request(&self, method: HttpMethod, url: &str) -> Result<Value>;
        }
    }

    fn drive_json(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "description": "",
            "name": name,
            "webUrl": format!("https://contoso.sharepoint.com/sites/team/{}", name),
            "driveType": "documentLibrary",
            "owner": { "group": { "displayName": "Team" } },
            "quota": { "used": 0 }
        })
    }

    fn accessor(mock_graph: MockGraph) -> DriveAccessor {
        DriveAccessor::new(Arc::new(mock_graph)).with_drive_id("drive-1")
    }

    #[test]
    fn test_decode_name() {
        assert_eq!(decode_name("Shared%20Documents"), "Shared Documents");
        assert_eq!(decode_name("Shared+Documents"), "Shared Documents");
        assert_eq!(decode_name("Reports"), "Reports");
        assert_eq!(decode_name("100%"), "100%");
    }

    #[test]
    fn test_find_library_is_exact_and_first_match() {
        let drives = json!({
            "value": [
                { "id": "a", "name": "reports" },
                { "id": "b", "name": "Reports" },
                { "id": "c", "name": "Reports" },
                { "id": "d" }
            ]
        });

        let found = find_library(drives.clone(), "Reports").unwrap();
        assert_eq!(found["id"], "b");
        assert!(find_library(drives, "Archive").is_none());
        assert!(find_library(json!({ "error": { "code": "accessDenied" } }), "Reports").is_none());
    }

    #[tokio::test]
    async fn test_resolve_default_drive() {
        let mut mock_graph = MockGraph::new();
        mock_graph
            .expect_request()
            .withf(|method, url| *method == HttpMethod::Get && url == "/v1.0/sites/site-1/drive")
            .times(1)
            .returning(|_, _| Ok(drive_json("drive-9", "Documents")));

        let drive = DriveAccessor::new(Arc::new(mock_graph))
            .resolve_drive("site-1", None)
            .await
            .unwrap();

        assert_eq!(drive.id, "drive-9");
        assert_eq!(serde_json::to_value(&drive).unwrap(), drive_json("drive-9", "Documents"));
    }

    #[tokio::test]
    async fn test_empty_library_name_uses_default_drive() {
        let mut mock_graph = MockGraph::new();
        mock_graph
            .expect_request()
            .withf(|_, url| url == "/v1.0/sites/site-1/drive")
            .times(1)
            .returning(|_, _| Ok(drive_json("drive-9", "Documents")));

        let id = DriveAccessor::new(Arc::new(mock_graph))
            .resolve_drive_id("site-1", Some(""))
            .await
            .unwrap();

        assert_eq!(id, "drive-9");
    }

    #[tokio::test]
    async fn test_resolve_library_by_decoded_name() {
        let mut mock_graph = MockGraph::new();
        mock_graph
            .expect_request()
            .withf(|method, url| *method == HttpMethod::Get && url == "/v1.0/sites/site-1/drives")
            .times(1)
            .returning(|_, _| {
                Ok(json!({
                    "value": [
                        drive_json("drive-1", "Documents"),
                        drive_json("drive-2", "Team%20Reports")
                    ]
                }))
            });

        let drive = DriveAccessor::new(Arc::new(mock_graph))
            .resolve_drive("site-1", Some("Team Reports"))
            .await
            .unwrap();

        assert_eq!(drive.id, "drive-2");
    }

    #[tokio::test]
    async fn test_resolve_library_without_match_is_parse_error() {
        let mut mock_graph = MockGraph::new();
        mock_graph
            .expect_request()
            .times(1)
            .returning(|_, _| Ok(json!({ "value": [drive_json("drive-1", "Documents")] })));

        let result = DriveAccessor::new(Arc::new(mock_graph))
            .resolve_drive("site-1", Some("documents"))
            .await;

        assert!(matches!(result, Err(OneDriveError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_resolve_drive_missing_quota_is_parse_error() {
        let mut mock_graph = MockGraph::new();
        mock_graph.expect_request().times(1).returning(|_, _| {
            let mut drive = drive_json("drive-1", "Documents");
            drive.as_object_mut().unwrap().remove("quota");
            Ok(drive)
        });

        let result = DriveAccessor::new(Arc::new(mock_graph))
            .resolve_drive_id("site-1", None)
            .await;

        assert!(matches!(result, Err(OneDriveError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_resolve_drive_requires_site() {
        let mut mock_graph = MockGraph::new();
        mock_graph.expect_request().times(0);

        let result = DriveAccessor::new(Arc::new(mock_graph))
            .resolve_drive("", None)
            .await;

        assert!(matches!(result, Err(OneDriveError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_select_drive_sets_drive_id() {
        let mut mock_graph = MockGraph::new();
        mock_graph
            .expect_request()
            .times(1)
            .returning(|_, _| Ok(drive_json("drive-7", "Documents")));

        let mut drives = DriveAccessor::new(Arc::new(mock_graph));
        assert_eq!(drives.drive_id(), None);

        let id = drives.select_drive("site-1", None).await.unwrap();
        assert_eq!(id, "drive-7");
        assert_eq!(drives.drive_id(), Some("drive-7"));
    }

    #[tokio::test]
    async fn test_fetch_delta_single_page() {
        let mut mock_graph = MockGraph::new();
        mock_graph
            .expect_request()
            .withf(|_, url| url == "/v1.0/drives/drive-1/root/delta?token=latest")
            .times(1)
            .returning(|_, _| {
                Ok(json!({
                    "value": [{ "id": "1" }, { "id": "2" }],
                    "@odata.deltaLink": "https://graph.microsoft.com/v1.0/drives/drive-1/root/delta?token=next"
                }))
            });

        let delta = accessor(mock_graph).fetch_delta(Some("latest")).await.unwrap();

        assert_eq!(delta.value.len(), 2);
        assert_eq!(
            delta.delta_link.as_deref(),
            Some("https://graph.microsoft.com/v1.0/drives/drive-1/root/delta?token=next")
        );
    }

    #[tokio::test]
    async fn test_fetch_delta_intermediate_page_without_value_is_parse_error() {
        let mut mock_graph = MockGraph::new();
        mock_graph
            .expect_request()
            .times(1)
            .returning(|_, _| Ok(json!({ "@odata.nextLink": "https://next.test/page2" })));

        let result = accessor(mock_graph).fetch_delta(Some("latest")).await;

        assert!(matches!(result, Err(OneDriveError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_fetch_delta_requires_token() {
        let mut mock_graph = MockGraph::new();
        mock_graph.expect_request().times(0);

        let result = accessor(mock_graph).fetch_delta(None).await;

        assert!(matches!(result, Err(OneDriveError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_fetch_delta_requires_drive() {
        let mut mock_graph = MockGraph::new();
        mock_graph.expect_request().times(0);

        let result = DriveAccessor::new(Arc::new(mock_graph))
            .fetch_delta(Some("latest"))
            .await;

        assert!(matches!(result, Err(OneDriveError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_metadata_by_path_strips_one_leading_slash() {
        let mut mock_graph = MockGraph::new();
        mock_graph
            .expect_request()
            .withf(|_, url| url == "/v1.0/drives/drive-1/root:/Reports/q1.xlsx")
            .times(1)
            .returning(|_, _| {
                Ok(json!({
                    "id": "item-1",
                    "name": "q1.xlsx",
                    "webUrl": "https://contoso.sharepoint.com/Reports/q1.xlsx",
                    "file": { "mimeType": "application/vnd.ms-excel" }
                }))
            });

        let metadata = accessor(mock_graph)
            .fetch_resource_metadata(Some("/Reports/q1.xlsx"), None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(metadata.id, "item-1");
        assert!(metadata.is_file());
    }

    #[tokio::test]
    async fn test_metadata_path_keeps_second_slash() {
        let mut mock_graph = MockGraph::new();
        mock_graph
            .expect_request()
            .withf(|_, url| url == "/v1.0/drives/drive-1/root://double")
            .times(1)
            .returning(|_, _| Ok(json!({ "error": { "code": "itemNotFound" } })));

        let metadata = accessor(mock_graph)
            .fetch_resource_metadata(Some("//double"), None)
            .await
            .unwrap();

        assert!(metadata.is_none());
    }

    #[tokio::test]
    async fn test_metadata_other_graph_error_is_parse_error() {
        let mut mock_graph = MockGraph::new();
        mock_graph
            .expect_request()
            .times(1)
            .returning(|_, _| Ok(json!({ "error": { "code": "accessDenied" } })));

        let result = accessor(mock_graph)
            .fetch_resource_metadata(None, Some("item-1"))
            .await;

        assert!(matches!(result, Err(OneDriveError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_metadata_requires_path_or_item_id() {
        let mut mock_graph = MockGraph::new();
        mock_graph.expect_request().times(0);

        let result = accessor(mock_graph).fetch_resource_metadata(None, None).await;

        assert!(matches!(result, Err(OneDriveError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_resource_exists_propagates_transport_error() {
        let mut mock_graph = MockGraph::new();
        mock_graph.expect_request().times(1).returning(|_, _| {
            Err(OneDriveError::Bridge(
                bridge_traits::BridgeError::OperationFailed("Request timed out".to_string()),
            ))
        });

        let result = accessor(mock_graph)
            .resource_exists(Some("a.txt"), None)
            .await;

        assert!(matches!(result, Err(OneDriveError::Bridge(_))));
    }

    #[derive(Clone, Default)]
    struct SpanNames(Arc<std::sync::Mutex<Vec<&'static str>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SpanNames {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.0.lock().unwrap().push(attrs.metadata().name());
        }
    }

    #[tokio::test]
    async fn test_operations_open_spans() {
        use tracing_subscriber::layer::SubscriberExt;

        let names = SpanNames::default();
        let subscriber = tracing_subscriber::registry().with(names.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut mock_graph = MockGraph::new();
        let mut responses = vec![
            drive_json("drive-3", "Documents"),
            json!({ "error": { "code": "itemNotFound" } }),
        ]
        .into_iter();
        mock_graph
            .expect_request()
            .times(2)
            .returning(move |_, _| Ok(responses.next().unwrap()));

        let mut drives = DriveAccessor::new(Arc::new(mock_graph));
        drives.select_drive("site-1", None).await.unwrap();
        assert!(!drives.resource_exists(Some("a.txt"), None).await.unwrap());

        let names = names.0.lock().unwrap().clone();
        for expected in [
            "select_drive",
            "resolve_drive_id",
            "resolve_drive",
            "resource_exists",
            "fetch_resource_metadata",
        ] {
            assert!(names.contains(&expected), "missing span {expected}: {names:?}");
        }
    }
}
