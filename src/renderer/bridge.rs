//! Script bridge messages
//!
//! The content running inside the renderer posts JSON messages of the form
//! `{"name": "visitStarted", "data": {...}}` to the bridge handler. This module
//! turns them into [`RendererEvent`]s.

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::VisitFailure;
use crate::renderer::types::{RendererEvent, VisitAction, VisitEvent, VisitId};
use crate::{Error, Result};

/// Message posted by the content bridge
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ScriptMessage {
    PageLoaded {
        #[serde(default)]
        restoration_identifier: Option<String>,
    },
    PageLoadFailed,
    ErrorRaised {
        error: String,
    },
    PageInvalidated,
    VisitProposed {
        location: String,
        #[serde(default)]
        action: VisitAction,
    },
    VisitStarted {
        identifier: String,
        #[serde(default)]
        has_cached_snapshot: bool,
    },
    VisitRequestStarted {
        identifier: String,
    },
    VisitRequestCompleted {
        identifier: String,
    },
    VisitRequestFailed {
        identifier: String,
        status_code: u16,
    },
    VisitRequestFinished {
        identifier: String,
    },
    VisitSnapshotRestored {
        identifier: String,
    },
    VisitRendered {
        identifier: String,
    },
    VisitCompleted {
        identifier: String,
        #[serde(default)]
        restoration_identifier: Option<String>,
    },
}

impl ScriptMessage {
    /// Parse a raw message body
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Convert into renderer events
    ///
    /// `pageLoaded` and `pageLoadFailed` carry no visit identifier; they belong to
    /// `cold_boot`, the pending cold boot visit, and are dropped when there is none.
    /// Both end that visit's request before reporting the outcome.
    pub fn into_events(self, cold_boot: Option<VisitId>) -> Result<Vec<RendererEvent>> {
        let events = match self {
            ScriptMessage::PageLoaded {
                restoration_identifier,
            } => match cold_boot {
                Some(visit_id) => vec![
                    RendererEvent::Visit {
                        visit_id,
                        event: VisitEvent::RequestFinished,
                    },
                    RendererEvent::Visit {
                        visit_id,
                        event: VisitEvent::RendererInitialized,
                    },
                    RendererEvent::Visit {
                        visit_id,
                        event: VisitEvent::Completed {
                            restoration_identifier,
                        },
                    },
                ],
                None => {
                    debug!("pageLoaded without a pending cold boot visit");
                    vec![]
                }
            },
            ScriptMessage::PageLoadFailed => match cold_boot {
                Some(visit_id) => vec![
                    RendererEvent::Visit {
                        visit_id,
                        event: VisitEvent::RequestFinished,
                    },
                    RendererEvent::Visit {
                        visit_id,
                        event: VisitEvent::PageLoadFailed,
                    },
                ],
                None => {
                    debug!("pageLoadFailed without a pending cold boot visit");
                    vec![]
                }
            },
            ScriptMessage::ErrorRaised { error } => {
                warn!("Content raised an error: {}", error);
                vec![]
            }
            ScriptMessage::PageInvalidated => vec![RendererEvent::PageInvalidated],
            ScriptMessage::VisitProposed { location, action } => {
                vec![RendererEvent::ProposedNavigation {
                    location: Url::parse(&location)?,
                    action,
                }]
            }
            ScriptMessage::VisitStarted {
                identifier,
                has_cached_snapshot,
            } => vec![visit_event(
                &identifier,
                VisitEvent::Started {
                    has_snapshot: has_cached_snapshot,
                },
            )?],
            ScriptMessage::VisitRequestStarted { identifier } => {
                vec![visit_event(&identifier, VisitEvent::RequestStarted)?]
            }
            ScriptMessage::VisitRequestCompleted { identifier } => {
                vec![visit_event(&identifier, VisitEvent::ResponseLoaded)?]
            }
            ScriptMessage::VisitRequestFailed {
                identifier,
                status_code,
            } => {
                let failure = if status_code == 0 {
                    VisitFailure::Transport("request failed without a response".to_string())
                } else {
                    VisitFailure::Status(status_code)
                };
                vec![visit_event(&identifier, VisitEvent::RequestFailed(failure))?]
            }
            ScriptMessage::VisitRequestFinished { identifier } => {
                vec![visit_event(&identifier, VisitEvent::RequestFinished)?]
            }
            ScriptMessage::VisitSnapshotRestored { identifier } => {
                vec![visit_event(&identifier, VisitEvent::SnapshotRestored)?]
            }
            ScriptMessage::VisitRendered { identifier } => {
                debug!("Visit {} rendered", identifier);
                vec![]
            }
            ScriptMessage::VisitCompleted {
                identifier,
                restoration_identifier,
            } => vec![visit_event(
                &identifier,
                VisitEvent::Completed {
                    restoration_identifier,
                },
            )?],
        };

        Ok(events)
    }
}

fn visit_event(identifier: &str, event: VisitEvent) -> Result<RendererEvent> {
    let visit_id = VisitId::parse(identifier)
        .ok_or_else(|| Error::bridge(format!("Invalid visit identifier: {}", identifier)))?;
    Ok(RendererEvent::Visit { visit_id, event })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_visit_started() {
        let id = VisitId::new();
        let body = format!(
            r#"{{"name":"visitStarted","data":{{"identifier":"{}","hasCachedSnapshot":true}}}}"#,
            id
        );

        let events = ScriptMessage::parse(&body).unwrap().into_events(None).unwrap();
        assert_eq!(
            events,
            vec![RendererEvent::Visit {
                visit_id: id,
                event: VisitEvent::Started { has_snapshot: true },
            }]
        );
    }

    #[test]
    fn test_request_failed_status_zero_is_transport() {
        let id = VisitId::new();
        let body = format!(
            r#"{{"name":"visitRequestFailed","data":{{"identifier":"{}","statusCode":0}}}}"#,
            id
        );

        let events = ScriptMessage::parse(&body).unwrap().into_events(None).unwrap();
        match &events[0] {
            RendererEvent::Visit {
                event: VisitEvent::RequestFailed(VisitFailure::Transport(_)),
                ..
            } => {}
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_request_failed_with_status() {
        let id = VisitId::new();
        let body = format!(
            r#"{{"name":"visitRequestFailed","data":{{"identifier":"{}","statusCode":404}}}}"#,
            id
        );

        let events = ScriptMessage::parse(&body).unwrap().into_events(None).unwrap();
        assert_eq!(
            events,
            vec![RendererEvent::Visit {
                visit_id: id,
                event: VisitEvent::RequestFailed(VisitFailure::Status(404)),
            }]
        );
    }

    #[test]
    fn test_page_loaded_targets_cold_boot() {
        let id = VisitId::new();
        let body = r#"{"name":"pageLoaded","data":{"restorationIdentifier":"r-1"}}"#;

        let events = ScriptMessage::parse(body).unwrap().into_events(Some(id)).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            RendererEvent::Visit {
                visit_id: id,
                event: VisitEvent::RequestFinished,
            }
        );
        assert_eq!(
            events[2],
            RendererEvent::Visit {
                visit_id: id,
                event: VisitEvent::Completed {
                    restoration_identifier: Some("r-1".to_string()),
                },
            }
        );
    }

    #[test]
    fn test_page_load_failed_ends_request_first() {
        let id = VisitId::new();
        let events = ScriptMessage::parse(r#"{"name":"pageLoadFailed"}"#)
            .unwrap()
            .into_events(Some(id))
            .unwrap();

        assert_eq!(
            events,
            vec![
                RendererEvent::Visit {
                    visit_id: id,
                    event: VisitEvent::RequestFinished,
                },
                RendererEvent::Visit {
                    visit_id: id,
                    event: VisitEvent::PageLoadFailed,
                },
            ]
        );
    }

    #[test]
    fn test_page_loaded_without_cold_boot_is_dropped() {
        let body = r#"{"name":"pageLoaded","data":{}}"#;
        let events = ScriptMessage::parse(body).unwrap().into_events(None).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_unit_messages_without_data() {
        assert_eq!(
            ScriptMessage::parse(r#"{"name":"pageInvalidated"}"#).unwrap(),
            ScriptMessage::PageInvalidated
        );
        assert_eq!(
            ScriptMessage::parse(r#"{"name":"pageLoadFailed"}"#).unwrap(),
            ScriptMessage::PageLoadFailed
        );
    }

    #[test]
    fn test_visit_proposed_defaults_to_advance() {
        let body = r#"{"name":"visitProposed","data":{"location":"https://example.com/next"}}"#;
        let events = ScriptMessage::parse(body).unwrap().into_events(None).unwrap();
        assert_eq!(
            events,
            vec![RendererEvent::ProposedNavigation {
                location: Url::parse("https://example.com/next").unwrap(),
                action: VisitAction::Advance,
            }]
        );
    }

    #[test]
    fn test_invalid_location_is_rejected() {
        let body = r#"{"name":"visitProposed","data":{"location":"not a url"}}"#;
        let result = ScriptMessage::parse(body).unwrap().into_events(None);
        assert!(matches!(result, Err(Error::InvalidLocation(_))));
    }

    #[test]
    fn test_invalid_identifier_is_rejected() {
        let body = r#"{"name":"visitCompleted","data":{"identifier":"nope"}}"#;
        let result = ScriptMessage::parse(body).unwrap().into_events(None);
        assert!(matches!(result, Err(Error::Bridge(_))));
    }

    #[test]
    fn test_unknown_message_is_serialization_error() {
        let result = ScriptMessage::parse(r#"{"name":"somethingElse"}"#);
        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
