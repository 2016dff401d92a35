//! # OneDrive / SharePoint Provider
//!
//! Read-only access to document libraries through the Microsoft Graph API.
//!
//! ## Overview
//!
//! This module provides:
//! - Drive resolution from a SharePoint site id and optional library name
//! - Delta sync that follows `@odata.nextLink` pagination (bounded)
//! - Item metadata lookup by path or by item id, with "not found" as a value
//! - A narrow [`GraphApi`] seam so the logic runs against scripted fakes
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::GraphConfig;
//! use provider_onedrive::DriveAccessor;
//!
//! let config = GraphConfig::builder().access_token(token).build()?;
//! let mut drives = DriveAccessor::from_config(config);
//!
//! drives.select_drive("contoso.sharepoint.com,1234,5678", Some("Reports")).await?;
//! let delta = drives.fetch_delta(Some("latest")).await?;
//! let exists = drives.resource_exists(Some("/2024/summary.xlsx"), None).await?;
//! ```

pub mod connector;
pub mod drive;
pub mod error;
pub mod types;

pub use connector::{GraphApi, GraphConnector};
pub use drive::{DriveAccessor, MAX_DELTA_PAGES};
pub use error::{OneDriveError, Result};
pub use types::{DeltaPage, DriveDescriptor, DriveItem, GraphErrorBody, ResourceMetadata};
