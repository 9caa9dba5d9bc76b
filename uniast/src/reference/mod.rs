//! Reference resolution façade
//!
//! ```text
//!     Converters never talk to the backend that knows what a reference means. They receive a
//!     [`ReferenceContext`], built once per conversion session from four injected services, and
//!     call its five functions. None of them fail: a service error is logged at debug level and
//!     turned into `None` (or into a best-effort string), so an unresolvable reference degrades
//!     the output instead of aborting the conversion.
//!
//!     Round-trip contract expected from the services, for every reference they produce:
//!
//!         parse_reference(serialize_reference(r), Some(r.entity_type())) == Some(r)
//!         parse_reference_from_url(get_url_from_reference(r)) == Some(r)
//!
//!     [`PathReferenceService`] is the default implementation, addressing documents by
//!     slash-separated paths.
//! ```

mod path;

pub use path::PathReferenceService;
pub(crate) use path::{decode_segment, encode_segment};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Kind of entity a reference points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Document,
    Attachment,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentReference {
    /// Enclosing spaces, outermost first
    pub space: Vec<String>,
    pub name: String,
}

impl DocumentReference {
    pub fn new<I, S>(space: I, name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            space: space.into_iter().map(Into::into).collect(),
            name: name.into(),
        }
    }

    /// Space segments followed by the document name.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.space
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentReference {
    pub document: DocumentReference,
    pub name: String,
}

/// Opaque identifier of a document or attachment. Converters carry it around but never
/// interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntityReference {
    Document(DocumentReference),
    Attachment(AttachmentReference),
}

impl EntityReference {
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityReference::Document(_) => EntityType::Document,
            EntityReference::Attachment(_) => EntityType::Attachment,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EntityReference::Document(doc) => &doc.name,
            EntityReference::Attachment(att) => &att.name,
        }
    }

    /// The document itself, or the document owning the attachment.
    pub fn document(&self) -> &DocumentReference {
        match self {
            EntityReference::Document(doc) => doc,
            EntityReference::Attachment(att) => &att.document,
        }
    }
}

/// Failure reported by a reference service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("invalid reference '{raw}': {reason}")]
    Invalid { raw: String, reason: String },
    #[error("'{0}' does not belong to this backend")]
    Foreign(String),
}

pub trait ReferenceParser: Send + Sync {
    fn parse(
        &self,
        raw: &str,
        entity_type: Option<EntityType>,
    ) -> Result<EntityReference, ReferenceError>;
}

pub trait ReferenceSerializer: Send + Sync {
    fn serialize(&self, reference: &EntityReference) -> Result<String, ReferenceError>;
}

pub trait UrlResolver: Send + Sync {
    fn parse_url(&self, url: &str) -> Result<EntityReference, ReferenceError>;
    fn url_for(&self, reference: &EntityReference) -> Result<String, ReferenceError>;
}

pub trait DisplayNameProvider: Send + Sync {
    fn display_name(&self, reference: &EntityReference) -> Option<String>;
}

/// The non-failing view converters use to handle references.
#[derive(Clone)]
pub struct ReferenceContext {
    parser: Arc<dyn ReferenceParser>,
    serializer: Arc<dyn ReferenceSerializer>,
    urls: Arc<dyn UrlResolver>,
    names: Arc<dyn DisplayNameProvider>,
}

impl ReferenceContext {
    pub fn new(
        parser: Arc<dyn ReferenceParser>,
        serializer: Arc<dyn ReferenceSerializer>,
        urls: Arc<dyn UrlResolver>,
        names: Arc<dyn DisplayNameProvider>,
    ) -> Self {
        Self {
            parser,
            serializer,
            urls,
            names,
        }
    }

    /// Build a context from a single value implementing every service.
    pub fn from_service<S>(service: S) -> Self
    where
        S: ReferenceParser + ReferenceSerializer + UrlResolver + DisplayNameProvider + 'static,
    {
        let service = Arc::new(service);
        Self {
            parser: service.clone(),
            serializer: service.clone(),
            urls: service.clone(),
            names: service,
        }
    }

    pub fn parse_reference(
        &self,
        raw: &str,
        entity_type: Option<EntityType>,
    ) -> Option<EntityReference> {
        match self.parser.parse(raw, entity_type) {
            Ok(reference) => Some(reference),
            Err(err) => {
                tracing::debug!(%raw, ?entity_type, error = %err, "reference did not parse");
                None
            }
        }
    }

    /// Serialize a reference, falling back to its bare name when the service refuses.
    pub fn serialize_reference(&self, reference: &EntityReference) -> String {
        self.serializer.serialize(reference).unwrap_or_else(|err| {
            tracing::debug!(?reference, error = %err, "reference did not serialize");
            reference.name().to_string()
        })
    }

    pub fn parse_reference_from_url(&self, url: &str) -> Option<EntityReference> {
        match self.urls.parse_url(url) {
            Ok(reference) => Some(reference),
            Err(err) => {
                tracing::debug!(%url, error = %err, "url is not an internal reference");
                None
            }
        }
    }

    pub fn get_url_from_reference(&self, reference: &EntityReference) -> Option<String> {
        match self.urls.url_for(reference) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::debug!(?reference, error = %err, "no url for reference");
                None
            }
        }
    }

    /// Human-readable name, defaulting to the entity name.
    pub fn get_display_name(&self, reference: &EntityReference) -> String {
        self.names
            .display_name(reference)
            .unwrap_or_else(|| reference.name().to_string())
    }

    /// Resolve a raw reference straight to a URL.
    pub(crate) fn url_for_raw(&self, raw: &str, entity_type: EntityType) -> Option<String> {
        self.parse_reference(raw, Some(entity_type))
            .and_then(|reference| self.get_url_from_reference(&reference))
    }
}

impl Default for ReferenceContext {
    fn default() -> Self {
        Self::from_service(PathReferenceService::default())
    }
}

impl fmt::Debug for ReferenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceContext").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectAll;

    impl ReferenceParser for RejectAll {
        fn parse(&self, raw: &str, _: Option<EntityType>) -> Result<EntityReference, ReferenceError> {
            Err(ReferenceError::Foreign(raw.to_string()))
        }
    }

    impl ReferenceSerializer for RejectAll {
        fn serialize(&self, reference: &EntityReference) -> Result<String, ReferenceError> {
            Err(ReferenceError::Foreign(reference.name().to_string()))
        }
    }

    impl UrlResolver for RejectAll {
        fn parse_url(&self, url: &str) -> Result<EntityReference, ReferenceError> {
            Err(ReferenceError::Foreign(url.to_string()))
        }

        fn url_for(&self, reference: &EntityReference) -> Result<String, ReferenceError> {
            Err(ReferenceError::Foreign(reference.name().to_string()))
        }
    }

    impl DisplayNameProvider for RejectAll {
        fn display_name(&self, _: &EntityReference) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_service_failures_become_fallbacks() {
        let ctx = ReferenceContext::from_service(RejectAll);
        let reference = EntityReference::Document(DocumentReference::new(["Main"], "Home"));

        assert_eq!(ctx.parse_reference("Main/Home", None), None);
        assert_eq!(ctx.parse_reference_from_url("http://x/Main/Home"), None);
        assert_eq!(ctx.get_url_from_reference(&reference), None);
        assert_eq!(ctx.serialize_reference(&reference), "Home");
        assert_eq!(ctx.get_display_name(&reference), "Home");
    }

    #[test]
    fn test_reference_json_shape() {
        let reference = EntityReference::Attachment(AttachmentReference {
            document: DocumentReference::new(["Sandbox"], "Page"),
            name: "logo.png".into(),
        });
        let json = serde_json::to_string(&reference).unwrap();
        assert_eq!(
            json,
            r#"{"type":"attachment","document":{"space":["Sandbox"],"name":"Page"},"name":"logo.png"}"#
        );
        assert_eq!(reference.entity_type(), EntityType::Attachment);
        assert_eq!(reference.document().name, "Page");
    }
}
