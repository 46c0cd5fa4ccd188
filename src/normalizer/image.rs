//! Cover image lookup inside HTML fragments.
//!
//! A single forward scan: find the first `<img` tag, then a `src="..."`
//! attribute inside that tag. Malformed markup is not repaired; if the first
//! tag has no usable `src`, there is no image.

use html_escape::decode_html_entities;
use url::Url;

const IMG_TAG: &str = "<img";
const SRC_ATTR: &str = "src=\"";

/// Return the `src` of the first `<img>` tag in `html`.
///
/// Relative values resolve against `base` when one is given.
pub fn first_img_src(html: &str, base: Option<&Url>) -> Option<Url> {
    let start = find_img_tag(html)?;
    let tag = &html[start + IMG_TAG.len()..];
    let tag = match tag.find('>') {
        Some(end) => &tag[..end],
        None => tag,
    };

    let value = find_src_value(tag)?;
    resolve(&decode_html_entities(value), base)
}

/// Parse a URL the way item fields are parsed: absolute, or joined onto `base`.
pub fn resolve(raw: &str, base: Option<&Url>) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(raw).ok(),
        Err(_) => None,
    }
}

fn find_img_tag(html: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(pos) = html[offset..].find(IMG_TAG) {
        let at = offset + pos;
        match html[at + IMG_TAG.len()..].chars().next() {
            Some(c) if c.is_whitespace() || c == '/' || c == '>' => return Some(at),
            Some(_) => offset = at + IMG_TAG.len(),
            None => return None,
        }
    }
    None
}

// `src=` must start an attribute, so `data-src="..."` is skipped.
fn find_src_value(tag: &str) -> Option<&str> {
    let mut offset = 0;
    while let Some(pos) = tag[offset..].find(SRC_ATTR) {
        let at = offset + pos;
        let boundary = tag[..at]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace());
        let rest = &tag[at + SRC_ATTR.len()..];
        if boundary {
            let end = rest.find('"')?;
            return Some(&rest[..end]);
        }
        offset = at + SRC_ATTR.len();
    }
    None
}
