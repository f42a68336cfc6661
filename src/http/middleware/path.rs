//! Path classification into service / version / endpoint labels.
//!
//! # Responsibilities
//! - Recognize API routes by their leading prefix segment
//! - Derive the service and version segments per [`ServicePosition`]
//! - Normalize numeric segments in the endpoint label to `{id}`
//!
//! # Design Decisions
//! - Only the logged labels change; the request path is never rewritten
//! - Non-API paths still get the last segment as a best-effort endpoint
//! - Pure string splitting, no regex

use crate::config::ServicePosition;

/// Placeholder substituted for all-digit segments in endpoint labels.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Labels derived from a request path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathLabels {
    pub service: Option<String>,
    pub version: Option<String>,
    pub endpoint: Option<String>,
}

/// Classifies request paths according to a fixed route layout.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    prefix: String,
    position: ServicePosition,
}

impl PathClassifier {
    pub fn new(prefix: impl Into<String>, position: ServicePosition) -> Self {
        Self {
            prefix: prefix.into(),
            position,
        }
    }

    pub fn classify(&self, path: &str) -> PathLabels {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if segments.len() < 3 || segments[0] != self.prefix {
            return PathLabels {
                service: None,
                version: None,
                endpoint: segments.last().map(|s| (*s).to_string()),
            };
        }

        match self.position {
            ServicePosition::AfterVersion => PathLabels {
                version: Some(segments[1].to_string()),
                service: Some(segments[2].to_string()),
                endpoint: Some(normalize(&segments[2..])),
            },
            ServicePosition::BeforeVersion => {
                let endpoint = if segments.len() > 3 {
                    normalize(&segments[3..])
                } else {
                    normalize(&segments[2..])
                };
                PathLabels {
                    service: Some(segments[1].to_string()),
                    version: Some(segments[2].to_string()),
                    endpoint: Some(endpoint),
                }
            }
        }
    }
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn normalize(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| if is_numeric(s) { ID_PLACEHOLDER } else { *s })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn after() -> PathClassifier {
        PathClassifier::new("api", ServicePosition::AfterVersion)
    }

    fn before() -> PathClassifier {
        PathClassifier::new("api", ServicePosition::BeforeVersion)
    }

    #[test]
    fn test_numeric_segments_are_normalized() {
        let labels = after().classify("/api/v1/users/42");
        assert_eq!(labels.version.as_deref(), Some("v1"));
        assert_eq!(labels.service.as_deref(), Some("users"));
        assert_eq!(labels.endpoint.as_deref(), Some("users/{id}"));

        let labels = after().classify("/api/v1/orders/7/items/0012/notes");
        assert_eq!(labels.endpoint.as_deref(), Some("orders/{id}/items/{id}/notes"));
    }

    #[test]
    fn test_mixed_segments_are_kept_verbatim() {
        let labels = after().classify("/api/v2/users/42a/-1");
        assert_eq!(labels.endpoint.as_deref(), Some("users/42a/-1"));
    }

    #[test]
    fn test_non_api_path_falls_back_to_last_segment() {
        let labels = after().classify("/notapi/x/y");
        assert_eq!(labels.service, None);
        assert_eq!(labels.version, None);
        assert_eq!(labels.endpoint.as_deref(), Some("y"));
    }

    #[test]
    fn test_short_api_path_is_unclassified() {
        let labels = after().classify("/api/v1/");
        assert_eq!(labels.service, None);
        assert_eq!(labels.version, None);
        assert_eq!(labels.endpoint.as_deref(), Some("v1"));
    }

    #[test]
    fn test_empty_path_has_no_endpoint() {
        assert_eq!(after().classify("/"), PathLabels::default());
        assert_eq!(after().classify(""), PathLabels::default());
    }

    #[test]
    fn test_repeated_slashes_are_ignored() {
        let labels = after().classify("//api//v1/orders//7/");
        assert_eq!(labels.endpoint.as_deref(), Some("orders/{id}"));
    }

    #[test]
    fn test_service_before_version() {
        let cases = [
            ("/api/service/v1/sample", Some("service"), Some("sample")),
            ("/api/service/v1", Some("service"), Some("v1")),
            ("/api/otherapp/v1/test/extra", Some("otherapp"), Some("test/extra")),
            ("/api/service/v1/users/42", Some("service"), Some("users/{id}")),
            ("/notapi/test/path", None, Some("path")),
        ];

        for (path, service, endpoint) in cases {
            let labels = before().classify(path);
            assert_eq!(labels.service.as_deref(), service, "service for {path}");
            assert_eq!(labels.endpoint.as_deref(), endpoint, "endpoint for {path}");
        }
    }

    #[test]
    fn test_custom_prefix() {
        let classifier = PathClassifier::new("svc", ServicePosition::AfterVersion);
        assert_eq!(classifier.classify("/svc/v1/a").service.as_deref(), Some("a"));
        assert_eq!(classifier.classify("/api/v1/a").service, None);
    }
}
