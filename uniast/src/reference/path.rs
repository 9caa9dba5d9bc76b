//! Path-addressed reference service.
//!
//! Documents are written `Space/Sub/Page`, attachments `attach:Space/Page@file.png`.
//! URLs live under a configurable base: `{base}/Space/Page` and
//! `{base}/Space/Page/attachments/file.png`, every segment percent-encoded.

use super::{
    AttachmentReference, DisplayNameProvider, DocumentReference, EntityReference, EntityType,
    ReferenceError, ReferenceParser, ReferenceSerializer, UrlResolver,
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

const ATTACHMENT_PREFIX: &str = "attach:";
const ATTACHMENTS_DIR: &str = "attachments";

/// Characters escaped inside one path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

pub(crate) fn decode_segment(segment: &str) -> Option<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathReferenceService {
    base_url: String,
}

impl PathReferenceService {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn parse_document(&self, raw: &str) -> Result<DocumentReference, ReferenceError> {
        let invalid = |reason: &str| ReferenceError::Invalid {
            raw: raw.to_string(),
            reason: reason.to_string(),
        };
        if raw.contains("://") {
            return Err(ReferenceError::Foreign(raw.to_string()));
        }
        if raw.contains('|') {
            return Err(invalid("'|' is not allowed"));
        }
        let mut segments: Vec<String> = raw.split('/').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(invalid("empty path segment"));
        }
        let name = segments.pop().ok_or_else(|| invalid("empty reference"))?;
        Ok(DocumentReference {
            space: segments,
            name,
        })
    }

    fn document_path(document: &DocumentReference) -> Result<String, ReferenceError> {
        let mut path = String::new();
        for (i, segment) in document.segments().enumerate() {
            if segment.is_empty() || segment.contains('/') || segment.contains('|') {
                return Err(ReferenceError::Invalid {
                    raw: segment.to_string(),
                    reason: "segment cannot be written as a path".to_string(),
                });
            }
            if i > 0 {
                path.push('/');
            }
            path.push_str(segment);
        }
        Ok(path)
    }
}

impl ReferenceParser for PathReferenceService {
    fn parse(
        &self,
        raw: &str,
        entity_type: Option<EntityType>,
    ) -> Result<EntityReference, ReferenceError> {
        let raw = raw.trim();
        let prefixed = raw.strip_prefix(ATTACHMENT_PREFIX);
        let wants_attachment = match (prefixed.is_some(), entity_type) {
            (true, Some(EntityType::Document)) => {
                return Err(ReferenceError::Invalid {
                    raw: raw.to_string(),
                    reason: "attachment reference where a document is expected".to_string(),
                })
            }
            (true, _) | (false, Some(EntityType::Attachment)) => true,
            (false, _) => false,
        };

        if !wants_attachment {
            return self.parse_document(raw).map(EntityReference::Document);
        }

        let body = prefixed.unwrap_or(raw);
        let (document, name) = body.rsplit_once('@').ok_or_else(|| ReferenceError::Invalid {
            raw: raw.to_string(),
            reason: "attachment references need '@'".to_string(),
        })?;
        if name.is_empty() {
            return Err(ReferenceError::Invalid {
                raw: raw.to_string(),
                reason: "empty attachment name".to_string(),
            });
        }
        Ok(EntityReference::Attachment(AttachmentReference {
            document: self.parse_document(document)?,
            name: name.to_string(),
        }))
    }
}

impl ReferenceSerializer for PathReferenceService {
    fn serialize(&self, reference: &EntityReference) -> Result<String, ReferenceError> {
        match reference {
            EntityReference::Document(doc) => Self::document_path(doc),
            EntityReference::Attachment(att) => {
                if att.name.is_empty() || att.name.contains('@') {
                    return Err(ReferenceError::Invalid {
                        raw: att.name.clone(),
                        reason: "attachment name cannot be written".to_string(),
                    });
                }
                Ok(format!(
                    "{ATTACHMENT_PREFIX}{}@{}",
                    Self::document_path(&att.document)?,
                    att.name
                ))
            }
        }
    }
}

impl UrlResolver for PathReferenceService {
    fn parse_url(&self, url: &str) -> Result<EntityReference, ReferenceError> {
        let foreign = || ReferenceError::Foreign(url.to_string());
        let rest = url.strip_prefix(self.base_url.as_str()).ok_or_else(foreign)?;
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let rest = rest.strip_prefix('/').ok_or_else(foreign)?;

        let segments = rest
            .split('/')
            .map(|s| decode_segment(s).filter(|s| !s.is_empty()))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(foreign)?;

        let count = segments.len();
        if count >= 3 && segments[count - 2] == ATTACHMENTS_DIR {
            let mut segments = segments;
            let name = segments.pop().ok_or_else(foreign)?;
            segments.pop();
            let doc_name = segments.pop().ok_or_else(foreign)?;
            return Ok(EntityReference::Attachment(AttachmentReference {
                document: DocumentReference {
                    space: segments,
                    name: doc_name,
                },
                name,
            }));
        }

        let mut segments = segments;
        let name = segments.pop().ok_or_else(foreign)?;
        Ok(EntityReference::Document(DocumentReference {
            space: segments,
            name,
        }))
    }

    fn url_for(&self, reference: &EntityReference) -> Result<String, ReferenceError> {
        let mut url = self.base_url.clone();
        for segment in reference.document().segments() {
            url.push('/');
            url.push_str(&encode_segment(segment));
        }
        if let EntityReference::Attachment(att) = reference {
            url.push('/');
            url.push_str(ATTACHMENTS_DIR);
            url.push('/');
            url.push_str(&encode_segment(&att.name));
        }
        Ok(url)
    }
}

impl DisplayNameProvider for PathReferenceService {
    fn display_name(&self, reference: &EntityReference) -> Option<String> {
        Some(reference.name().to_string())
    }
}
