//! Workspace umbrella crate.
//!
//! Exposes the drive accessor and its runtime support behind a single
//! dependency. Host applications can depend on `sitedrive` and enable the
//! documented features without wiring each workspace crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_runtime::{
    config::GraphConfig,
    logging::{init_logging, LogFormat, LogLevel, LoggingConfig},
};

#[cfg(feature = "desktop-shims")]
pub use provider_onedrive::{
    DeltaPage, DriveAccessor, DriveDescriptor, DriveItem, GraphApi, GraphConnector,
    OneDriveError, ResourceMetadata,
};
