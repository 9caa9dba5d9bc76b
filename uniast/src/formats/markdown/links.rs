//! Internal link serialization strategies.
//!
//! How an internal link is written in Markdown depends on where the document will
//! live, so the serializer delegates every internal link and image to an
//! [`InternalLinkSerializer`]:
//!
//! - [`WikiLinkSerializer`]: `[[caption|reference]]`, read back by the parser rules.
//! - [`FileSystemLinkSerializer`]: relative paths between document directories.
//! - [`RemoteLinkSerializer`]: absolute URLs built from an id looked up over HTTP.

use super::serializer::InlineMarkdown;
use crate::error::{ConversionError, Result};
use crate::ir::nodes::{LinkTarget, Text};
use crate::reference::{
    encode_segment, DocumentReference, EntityReference, EntityType, ReferenceContext,
};
use async_trait::async_trait;
use std::path::PathBuf;

/// The internal side of a [`LinkTarget`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InternalTarget<'a> {
    pub raw_reference: &'a str,
    pub parsed_reference: Option<&'a EntityReference>,
}

impl<'a> InternalTarget<'a> {
    pub fn from_link_target(target: &'a LinkTarget) -> Option<Self> {
        match target {
            LinkTarget::Internal {
                raw_reference,
                parsed_reference,
            } => Some(Self {
                raw_reference,
                parsed_reference: parsed_reference.as_ref(),
            }),
            LinkTarget::External { .. } => None,
        }
    }
}

#[async_trait]
pub trait InternalLinkSerializer: Send + Sync {
    /// Markdown for a link to `target` showing `content`.
    async fn serialize(
        &self,
        content: &[Text],
        target: InternalTarget<'_>,
        converter: &InlineMarkdown,
    ) -> Result<String>;

    /// Markdown for an image stored at `target`.
    async fn serialize_image(&self, target: InternalTarget<'_>, alt: Option<&str>) -> Result<String>;
}

/// Backslash-escape the characters that would let a reference or alt text be read as syntax.
pub(crate) fn escape_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '&' | '~' | '!' | '{' | '}' | '|' | '#'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `[[caption|reference]]` and `![[alt|reference]]`
#[derive(Debug, Clone, Copy, Default)]
pub struct WikiLinkSerializer;

#[async_trait]
impl InternalLinkSerializer for WikiLinkSerializer {
    async fn serialize(
        &self,
        content: &[Text],
        target: InternalTarget<'_>,
        converter: &InlineMarkdown,
    ) -> Result<String> {
        let reference = escape_inline(target.raw_reference);
        let caption = converter.convert_texts(content)?;
        let is_plain_reference = content.iter().all(|text| text.styles.is_plain())
            && content
                .iter()
                .map(|text| text.content.as_str())
                .collect::<String>()
                == target.raw_reference;
        if caption.is_empty() || is_plain_reference {
            Ok(format!("[[{reference}]]"))
        } else {
            Ok(format!("[[{caption}|{reference}]]"))
        }
    }

    async fn serialize_image(&self, target: InternalTarget<'_>, alt: Option<&str>) -> Result<String> {
        let reference = escape_inline(target.raw_reference);
        match alt.filter(|alt| !alt.is_empty()) {
            Some(alt) => Ok(format!("![[{}|{reference}]]", escape_inline(alt))),
            None => Ok(format!("![[{reference}]]")),
        }
    }
}

fn resolve(
    ctx: &ReferenceContext,
    target: InternalTarget<'_>,
    entity_type: EntityType,
) -> Result<EntityReference> {
    target
        .parsed_reference
        .cloned()
        .or_else(|| ctx.parse_reference(target.raw_reference, Some(entity_type)))
        .ok_or_else(|| ConversionError::UnresolvedReference(target.raw_reference.to_string()))
}

/// Relative paths between documents stored as directories.
///
/// Document `Space/Page` lives in directory `Space/Page/`, its attachments in
/// `Space/Page/attachments/`. Links are written relative to the directory of the
/// document being serialized.
#[derive(Debug, Clone)]
pub struct FileSystemLinkSerializer {
    ctx: ReferenceContext,
    current_document: DocumentReference,
}

impl FileSystemLinkSerializer {
    pub fn new(ctx: ReferenceContext, current_document: DocumentReference) -> Self {
        Self {
            ctx,
            current_document,
        }
    }

    fn directory(document: &DocumentReference) -> PathBuf {
        document.segments().map(encode_segment).collect()
    }

    /// Path from the current document's directory to `reference`.
    pub fn relative_path(&self, reference: &EntityReference) -> String {
        let mut target = Self::directory(reference.document());
        if let EntityReference::Attachment(attachment) = reference {
            target.push("attachments");
            target.push(encode_segment(&attachment.name));
        }
        let base = Self::directory(&self.current_document);
        let relative = pathdiff::diff_paths(&target, &base).unwrap_or(target);
        let parts: Vec<String> = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            ".".to_string()
        } else {
            parts.join("/")
        }
    }
}

#[async_trait]
impl InternalLinkSerializer for FileSystemLinkSerializer {
    async fn serialize(
        &self,
        content: &[Text],
        target: InternalTarget<'_>,
        converter: &InlineMarkdown,
    ) -> Result<String> {
        let reference = resolve(&self.ctx, target, EntityType::Document)?;
        let mut caption = converter.convert_texts(content)?;
        if caption.is_empty() {
            caption = escape_inline(&self.ctx.get_display_name(&reference));
        }
        Ok(format!("[{caption}]({})", self.relative_path(&reference)))
    }

    async fn serialize_image(&self, target: InternalTarget<'_>, alt: Option<&str>) -> Result<String> {
        let reference = resolve(&self.ctx, target, EntityType::Attachment)?;
        let alt = escape_inline(alt.unwrap_or_default());
        Ok(format!("![{alt}]({})", self.relative_path(&reference)))
    }
}

/// Looks up the stable identifier a remote backend assigns to a document.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    async fn document_id(&self, document: &DocumentReference) -> Result<String>;
}

/// Absolute URLs of the form `{web_url}/{id}` and `{web_url}/{id}/attachments/{file}`,
/// one metadata lookup per link.
pub struct RemoteLinkSerializer<C> {
    ctx: ReferenceContext,
    client: C,
    web_url: String,
}

impl<C: MetadataClient> RemoteLinkSerializer<C> {
    pub fn new(ctx: ReferenceContext, client: C, web_url: impl Into<String>) -> Self {
        let web_url = web_url.into().trim_end_matches('/').to_string();
        Self {
            ctx,
            client,
            web_url,
        }
    }

    async fn url_for(&self, reference: &EntityReference) -> Result<String> {
        let id = self.client.document_id(reference.document()).await?;
        let mut url = format!("{}/{}", self.web_url, encode_segment(&id));
        if let EntityReference::Attachment(attachment) = reference {
            url.push_str("/attachments/");
            url.push_str(&encode_segment(&attachment.name));
        }
        Ok(url)
    }
}

#[async_trait]
impl<C: MetadataClient> InternalLinkSerializer for RemoteLinkSerializer<C> {
    async fn serialize(
        &self,
        content: &[Text],
        target: InternalTarget<'_>,
        converter: &InlineMarkdown,
    ) -> Result<String> {
        let reference = resolve(&self.ctx, target, EntityType::Document)?;
        let url = self.url_for(&reference).await?;
        let mut caption = converter.convert_texts(content)?;
        if caption.is_empty() {
            caption = escape_inline(&self.ctx.get_display_name(&reference));
        }
        Ok(format!("[{caption}]({url})"))
    }

    async fn serialize_image(&self, target: InternalTarget<'_>, alt: Option<&str>) -> Result<String> {
        let reference = resolve(&self.ctx, target, EntityType::Attachment)?;
        let url = self.url_for(&reference).await?;
        Ok(format!("![{}]({url})", escape_inline(alt.unwrap_or_default())))
    }
}

#[cfg(feature = "remote-links")]
pub use http::HttpMetadataClient;

#[cfg(feature = "remote-links")]
mod http {
    use super::MetadataClient;
    use crate::error::{ConversionError, Result};
    use crate::reference::DocumentReference;
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::time::Duration;
    use url::Url;

    #[derive(Deserialize)]
    struct DocumentMetadata {
        id: String,
    }

    /// `GET {api_url}/documents/{space...}/{name}` answering `{"id": "..."}`.
    #[derive(Debug, Clone)]
    pub struct HttpMetadataClient {
        client: reqwest::Client,
        api_url: Url,
    }

    impl HttpMetadataClient {
        pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
            let api_url = Url::parse(api_url).map_err(|e| {
                ConversionError::SerializationError(format!("invalid api url '{api_url}': {e}"))
            })?;
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| ConversionError::SerializationError(e.to_string()))?;
            Ok(Self { client, api_url })
        }

        pub fn endpoint(&self, document: &DocumentReference) -> Result<Url> {
            let mut url = self.api_url.clone();
            url.path_segments_mut()
                .map_err(|_| {
                    ConversionError::SerializationError(format!(
                        "api url '{}' cannot hold a path",
                        self.api_url
                    ))
                })?
                .pop_if_empty()
                .push("documents")
                .extend(document.segments());
            Ok(url)
        }
    }

    #[async_trait]
    impl MetadataClient for HttpMetadataClient {
        async fn document_id(&self, document: &DocumentReference) -> Result<String> {
            let url = self.endpoint(document)?;
            let lookup_error = |message: String| ConversionError::LinkLookup {
                reference: document.segments().collect::<Vec<_>>().join("/"),
                message,
            };
            tracing::debug!(%url, "looking up document metadata");

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| lookup_error(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(lookup_error(format!("server answered {status}")));
            }
            let metadata: DocumentMetadata = response
                .json()
                .await
                .map_err(|e| lookup_error(e.to_string()))?;
            Ok(metadata.id)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_endpoint_encodes_segments() {
            let client =
                HttpMetadataClient::new("https://api.test/v1/", Duration::from_secs(1)).unwrap();
            let url = client
                .endpoint(&DocumentReference::new(["My Space"], "Page?"))
                .unwrap();
            assert_eq!(
                url.as_str(),
                "https://api.test/v1/documents/My%20Space/Page%3F"
            );
        }

        #[test]
        fn test_rejects_invalid_api_url() {
            assert!(HttpMetadataClient::new("not a url", Duration::from_secs(1)).is_err());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::nodes::TextStyles;
    use crate::reference::AttachmentReference;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn document(space: &[&str], name: &str) -> EntityReference {
        EntityReference::Document(DocumentReference::new(space.iter().copied(), name))
    }

    fn target<'a>(raw: &'a str, parsed: Option<&'a EntityReference>) -> InternalTarget<'a> {
        InternalTarget {
            raw_reference: raw,
            parsed_reference: parsed,
        }
    }

    #[tokio::test]
    async fn test_wiki_links() {
        let wiki = WikiLinkSerializer;
        let converter = InlineMarkdown;
        let bold = TextStyles {
            bold: true,
            ..Default::default()
        };
        let caption = vec![Text {
            content: "Home".into(),
            styles: bold,
        }];
        assert_eq!(
            wiki.serialize(&caption, target("Main/Home", None), &converter)
                .await
                .unwrap(),
            "[[**Home**|Main/Home]]"
        );
        assert_eq!(
            wiki.serialize(&[Text::plain("Main/Home")], target("Main/Home", None), &converter)
                .await
                .unwrap(),
            "[[Main/Home]]"
        );
        assert_eq!(
            wiki.serialize_image(target("attach:Main/Home@a.png", None), Some("logo"))
                .await
                .unwrap(),
            "![[logo|attach:Main/Home@a.png]]"
        );
        assert_eq!(
            wiki.serialize_image(target("a_b.png", None), None)
                .await
                .unwrap(),
            r"![[a\_b.png]]"
        );
    }

    #[tokio::test]
    async fn test_filesystem_relative_paths() {
        let fs = FileSystemLinkSerializer::new(
            ReferenceContext::default(),
            DocumentReference::new(["Space", "Sub"], "Page"),
        );
        let sibling = document(&["Space", "Sub"], "Other Page");
        assert_eq!(fs.relative_path(&sibling), "../Other%20Page");

        let attachment = EntityReference::Attachment(AttachmentReference {
            document: DocumentReference::new(["Space", "Sub"], "Page"),
            name: "logo.png".into(),
        });
        assert_eq!(fs.relative_path(&attachment), "attachments/logo.png");

        let far = document(&["Elsewhere"], "Home");
        let link = fs
            .serialize(&[Text::plain("go")], target("Elsewhere/Home", Some(&far)), &InlineMarkdown)
            .await
            .unwrap();
        assert_eq!(link, "[go](../../../Elsewhere/Home)");
    }

    #[tokio::test]
    async fn test_filesystem_resolves_raw_reference_or_fails() {
        let fs = FileSystemLinkSerializer::new(
            ReferenceContext::default(),
            DocumentReference::new(["Space"], "Page"),
        );
        let image = fs
            .serialize_image(target("Space/Page@a b.png", None), Some("pic"))
            .await
            .unwrap();
        assert_eq!(image, "![pic](attachments/a%20b.png)");

        let err = fs
            .serialize(&[], target("", None), &InlineMarkdown)
            .await
            .unwrap_err();
        assert_eq!(err, ConversionError::UnresolvedReference(String::new()));
    }

    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataClient for CountingClient {
        async fn document_id(&self, document: &DocumentReference) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("id-{}", document.name))
        }
    }

    #[tokio::test]
    async fn test_remote_links_use_looked_up_ids() {
        let remote = RemoteLinkSerializer::new(
            ReferenceContext::default(),
            CountingClient {
                calls: AtomicUsize::new(0),
            },
            "https://docs.test/d/",
        );
        let home = document(&["Main"], "Home");
        let link = remote
            .serialize(&[], target("Main/Home", Some(&home)), &InlineMarkdown)
            .await
            .unwrap();
        assert_eq!(link, "[Home](https://docs.test/d/id-Home)");

        let image = remote
            .serialize_image(target("attach:Main/Home@x.png", None), None)
            .await
            .unwrap();
        assert_eq!(image, "![](https://docs.test/d/id-Home/attachments/x.png)");
        assert_eq!(remote.client.calls.load(Ordering::SeqCst), 2);
    }
}
