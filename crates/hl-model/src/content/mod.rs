use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ContentId, ISOLATION_ORIGIN_SUFFIX};

/// Full content record as returned by the content repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Stable content identifier.
    pub id: ContentId,
    /// User-facing name (file name).
    pub name: String,
    /// Raw document (HTML/JS).
    pub payload: String,
    /// Last modification time, milliseconds since the unix epoch.
    pub updated_at_ms: u64,
}

impl Content {
    /// Summary view without the payload.
    pub fn summary(&self) -> ContentSummary {
        ContentSummary {
            id: self.id,
            name: self.name.clone(),
            updated_at_ms: self.updated_at_ms,
        }
    }

    /// Materialization input for this content.
    pub fn load_spec(&self) -> LoadSpec {
        LoadSpec::for_content(self.id, self.name.clone(), self.payload.clone())
    }
}

/// Listing entry returned by the content repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub id: ContentId,
    pub name: String,
    pub updated_at_ms: u64,
}

/// Everything a rendering engine needs to materialize one content.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSpec {
    /// Name shown while the page has not reported its own title.
    pub display_name: String,
    /// Raw document to load.
    pub payload: String,
    /// Isolation origin the document is loaded under.
    pub origin: String,
}

impl LoadSpec {
    /// Build a spec whose origin is derived from `id`.
    ///
    /// ```
    /// use hl_model::{ContentId, LoadSpec};
    ///
    /// let spec = LoadSpec::for_content(ContentId::new(7), "clock.html", "<html></html>");
    /// assert_eq!(spec.origin, "https://app-7.hlaunch.local/");
    /// ```
    pub fn for_content(
        id: ContentId,
        display_name: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            payload: payload.into(),
            origin: Self::origin_for(id),
        }
    }

    /// Isolation origin of `id`.
    pub fn origin_for(id: ContentId) -> String {
        format!("https://app-{id}.{ISOLATION_ORIGIN_SUFFIX}/")
    }
}

impl fmt::Debug for LoadSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadSpec")
            .field("display_name", &self.display_name)
            .field("payload_len", &self.payload.len())
            .field("origin", &self.origin)
            .finish()
    }
}
