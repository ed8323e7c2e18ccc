//! Memoized asset cache.
//!
//! The host performs the actual I/O. The cache records what has been asked for,
//! hands out a request the first time a URL is seen, and settles each URL exactly
//! once: the first `resolve`/`fail` wins, later notifications are ignored.

use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Model,
    Texture,
    EnvironmentMap,
}

/// Ask the host to fetch `url`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRequest {
    pub url: String,
    pub kind: AssetKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshInfo {
    pub name: String,
}

impl MeshInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The parts of a loaded model the page cares about: its named meshes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAsset {
    pub meshes: Vec<MeshInfo>,
}

impl ModelAsset {
    pub fn with_meshes<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            meshes: names.into_iter().map(MeshInfo::named).collect(),
        }
    }

    pub fn has_mesh(&self, name: &str) -> bool {
        self.meshes.iter().any(|m| m.name == name)
    }
}

/// What the host hands back after a successful load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AssetPayload {
    Model(ModelAsset),
    Texture,
    EnvironmentMap,
}

impl AssetPayload {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetPayload::Model(_) => AssetKind::Model,
            AssetPayload::Texture => AssetKind::Texture,
            AssetPayload::EnvironmentMap => AssetKind::EnvironmentMap,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AssetState {
    Requested {
        kind: AssetKind,
    },
    Ready {
        kind: AssetKind,
        model: Option<Arc<ModelAsset>>,
    },
    Failed {
        kind: AssetKind,
        reason: String,
    },
}

impl AssetState {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetState::Requested { kind }
            | AssetState::Ready { kind, .. }
            | AssetState::Failed { kind, .. } => *kind,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, AssetState::Requested { .. })
    }
}

#[derive(Debug, Default)]
pub struct AssetCache {
    entries: HashMap<String, AssetState>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `url`. Returns a request only the first time the URL is
    /// seen; later calls are memoized no-ops.
    pub fn request(&mut self, url: &str, kind: AssetKind) -> Option<AssetRequest> {
        if let Some(existing) = self.entries.get(url) {
            if existing.kind() != kind {
                log::warn!(
                    "asset '{}' requested as {:?} but already known as {:?}",
                    url,
                    kind,
                    existing.kind()
                );
            }
            return None;
        }
        self.entries
            .insert(url.to_string(), AssetState::Requested { kind });
        Some(AssetRequest {
            url: url.to_string(),
            kind,
        })
    }

    /// Settle `url` as loaded. A payload of the wrong kind settles it as failed.
    /// Returns the new state, or `None` when the URL is unknown or already settled.
    pub fn resolve(&mut self, url: &str, payload: AssetPayload) -> Option<&AssetState> {
        let entry = self.entries.get_mut(url)?;
        if entry.is_settled() {
            log::debug!("asset '{}' already settled; ignoring load", url);
            return None;
        }
        let kind = entry.kind();
        *entry = if payload.kind() != kind {
            AssetState::Failed {
                kind,
                reason: format!("expected {:?}, got {:?}", kind, payload.kind()),
            }
        } else {
            let model = match payload {
                AssetPayload::Model(m) => Some(Arc::new(m)),
                _ => None,
            };
            AssetState::Ready { kind, model }
        };
        Some(&*entry)
    }

    pub fn fail(&mut self, url: &str, reason: impl Into<String>) -> Option<&AssetState> {
        let entry = self.entries.get_mut(url)?;
        if entry.is_settled() {
            return None;
        }
        *entry = AssetState::Failed {
            kind: entry.kind(),
            reason: reason.into(),
        };
        Some(&*entry)
    }

    pub fn state(&self, url: &str) -> Option<&AssetState> {
        self.entries.get(url)
    }

    pub fn model(&self, url: &str) -> Option<Arc<ModelAsset>> {
        match self.entries.get(url) {
            Some(AssetState::Ready { model, .. }) => model.clone(),
            _ => None,
        }
    }

    pub fn is_failed(&self, url: &str) -> bool {
        matches!(self.entries.get(url), Some(AssetState::Failed { .. }))
    }

    /// URLs still waiting on the host.
    pub fn pending(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries
            .iter()
            .filter(|(_, s)| !s.is_settled())
            .map(|(u, _)| u.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
