//! Port definition for the external build-info provider.
//!
//! Manual triggers can carry build provenance inline (`master`, `job`,
//! `buildNumber`). When a provider is wired in, the handler resolves that
//! provenance to full build metadata before handing the pipeline on. The
//! provider is optional by design: call sites branch on presence, and a
//! missing provider simply skips enrichment.
//!
//! Infrastructure crates implement this trait; the domain only consumes the
//! contract. Lookup failures propagate unmodified as
//! [`BuildInfoError`](crate::errors::BuildInfoError); there is no fallback
//! and no retry at this layer.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::BuildInfoError;
use crate::types::BuildEvent;

/// Build metadata as returned by the provider.
///
/// Opaque to this crate: it is attached to the outgoing trigger verbatim.
pub type BuildInfo = Value;

/// External source of build metadata, keyed by a [`BuildEvent`].
#[async_trait]
pub trait BuildInfoService: Send + Sync {
    /// Fetches the metadata of the build the event identifies.
    async fn get_build_info(&self, event: &BuildEvent) -> Result<BuildInfo, BuildInfoError>;

    /// Fetches properties the build published to `property_file`.
    ///
    /// An absent or empty `property_file` yields an empty map without a
    /// lookup.
    async fn get_properties(
        &self,
        event: &BuildEvent,
        property_file: Option<&str>,
    ) -> Result<Map<String, Value>, BuildInfoError>;
}
