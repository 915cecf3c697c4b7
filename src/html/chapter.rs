//! Chapter markup preparation using lol_html for streaming HTML processing
//!
//! Chapter documents come out of the archive as complete XHTML files. Before
//! they are embedded in the reader page they are:
//! 1. Unwrapped from `html`/`head`/`body` and stripped of `title`/`meta`
//! 2. Sanitized (scripts, embedded documents, `base`, forms, event handlers,
//!    `srcdoc` and `javascript:` URLs)
//! 3. Given server URLs for resources and in-book links

use lol_html::html_content::Element;
use lol_html::{element, rewrite_str, HandlerResult, RewriteStrSettings};

use crate::epub::{parent_dir, resolve_href};

/// Route prefix serving book resources
pub const RESOURCE_PREFIX: &str = "/resources";

/// Route resolving in-book links
pub const JUMP_PATH: &str = "/jump";

/// Elements dropped together with their content
const REMOVED_ELEMENTS: &[&str] = &[
    "title", "meta", "base", "script", "iframe", "frame", "frameset", "object", "embed", "applet",
];

/// Attributes that may carry a `javascript:` URL
const URL_ATTRIBUTES: &[&str] = &["href", "src", "xlink:href", "action", "formaction"];

/// Errors during chapter rewriting
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("HTML rewrite failed: {0}")]
    RewriteError(String),
}

/// Prepare raw chapter markup for embedding in the reader page.
///
/// `chapter_href` is the archive path of the chapter; relative URLs are
/// resolved against its directory.
pub fn prepare_chapter(html: &str, chapter_href: &str) -> Result<String, RewriteError> {
    let base_dir = parent_dir(chapter_href);

    let mut handlers = Vec::new();

    // Keep the content, drop the document shell and any forms
    for tag in ["html", "head", "body", "form"] {
        handlers.push(element!(tag, |el| {
            el.remove_and_keep_content();
            Ok(())
        }));
    }
    for tag in REMOVED_ELEMENTS {
        handlers.push(element!(*tag, |el| {
            el.remove();
            Ok(())
        }));
    }

    handlers.extend([
        element!("*", |el| {
            strip_unsafe_attributes(el);
            Ok(())
        }),
        element!("img[src]", |el| {
            rewrite_attribute(el, "src", |url| resource_url(base_dir, url))?;
            Ok(())
        }),
        element!("source[src]", |el| {
            rewrite_attribute(el, "src", |url| resource_url(base_dir, url))?;
            Ok(())
        }),
        element!("image", |el| {
            for attr in ["xlink:href", "href"] {
                rewrite_attribute(el, attr, |url| resource_url(base_dir, url))?;
            }
            Ok(())
        }),
        element!("link[href]", |el| {
            rewrite_attribute(el, "href", |url| resource_url(base_dir, url))?;
            Ok(())
        }),
        element!("a[href]", |el| {
            rewrite_attribute(el, "href", |url| jump_url(base_dir, url))?;
            Ok(())
        }),
    ]);

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| RewriteError::RewriteError(e.to_string()))
}

/// Remove event handlers, inline documents and `javascript:` URLs
fn strip_unsafe_attributes(el: &mut Element) {
    let unsafe_names: Vec<String> = el
        .attributes()
        .iter()
        .map(|attr| attr.name())
        .filter(|name| name.starts_with("on") || name == "srcdoc")
        .collect();
    for name in unsafe_names {
        el.remove_attribute(&name);
    }

    for &attr in URL_ATTRIBUTES {
        if let Some(value) = el.get_attribute(attr) {
            if value.trim().to_lowercase().starts_with("javascript:") {
                el.remove_attribute(attr);
            }
        }
    }
}

fn rewrite_attribute(
    el: &mut Element,
    attr: &str,
    rewrite: impl Fn(&str) -> Option<String>,
) -> HandlerResult {
    if let Some(value) = el.get_attribute(attr) {
        if let Some(rewritten) = rewrite(&value) {
            el.set_attribute(attr, &rewritten)?;
        }
    }
    Ok(())
}

/// URLs pointing outside the book are left alone
fn is_external(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || url.starts_with('#') || url.starts_with("//") {
        return true;
    }
    // A scheme is a colon before any path separator
    match (url.find(':'), url.find('/')) {
        (Some(colon), Some(slash)) => colon < slash,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Server URL for a resource referenced from the chapter
pub fn resource_url(base_dir: &str, url: &str) -> Option<String> {
    if is_external(url) {
        return None;
    }
    let resolved = resolve_href(base_dir, url.trim());
    let path = resolved
        .split(['#', '?'])
        .next()
        .unwrap_or(&resolved)
        .to_string();
    let encoded: Vec<String> = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    Some(format!("{}/{}", RESOURCE_PREFIX, encoded.join("/")))
}

/// Server URL following an in-book link
pub fn jump_url(base_dir: &str, url: &str) -> Option<String> {
    if is_external(url) {
        return None;
    }
    let resolved = resolve_href(base_dir, url.trim());
    Some(format!("{}?target={}", JUMP_PATH, urlencoding::encode(&resolved)))
}
