//! Content renderer types
//!
//! Identifiers, navigation actions and the change notifications a renderer emits.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;
use uuid::Uuid;

use crate::error::VisitFailure;

/// Identifier the renderer uses to attribute callbacks to a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisitId(Uuid);

impl VisitId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier posted by the content bridge
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for VisitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VisitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitAction {
    /// Push new state
    #[default]
    Advance,
    /// Re-display previously cached state
    Restore,
}

impl fmt::Display for VisitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitAction::Advance => f.write_str("advance"),
            VisitAction::Restore => f.write_str("restore"),
        }
    }
}

/// Callbacks scoped to a single visit
#[derive(Debug, Clone, PartialEq)]
pub enum VisitEvent {
    /// Full content load finished and the renderer can serve fast visits
    RendererInitialized,
    /// The visit started; `has_snapshot` is set when a cached snapshot exists
    Started { has_snapshot: bool },
    /// A restore visit was served from cache
    SnapshotRestored,
    /// A response was loaded into the renderer
    ResponseLoaded,
    RequestStarted,
    RequestFinished,
    RequestFailed(VisitFailure),
    /// The content never became ready
    PageLoadFailed,
    /// The visit completed
    Completed { restoration_identifier: Option<String> },
}

/// Change notification emitted by the content renderer
#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    /// The user activated a link inside the content
    ProposedNavigation { location: Url, action: VisitAction },
    /// The page was replaced outside the in-page transition path
    PageInvalidated,
    /// A script call into the content failed
    ScriptEvaluationFailed { message: String },
    /// A callback for one visit
    Visit { visit_id: VisitId, event: VisitEvent },
}

/// What triggered a renderer navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    LinkActivated,
    Reload,
    Other,
}

/// Navigation the renderer asks permission for
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationRequest {
    pub location: Url,
    pub kind: NavigationKind,
    pub main_frame: bool,
}

/// Answer to a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPolicy {
    Allow,
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_id_parse() {
        let id = VisitId::new();
        assert_eq!(VisitId::parse(&id.to_string()), Some(id));
        assert_eq!(VisitId::parse("not-a-visit"), None);
    }

    #[test]
    fn test_visit_action_serde() {
        let action: VisitAction = serde_json::from_str("\"restore\"").unwrap();
        assert_eq!(action, VisitAction::Restore);
        assert_eq!(serde_json::to_string(&VisitAction::Advance).unwrap(), "\"advance\"");
    }
}
