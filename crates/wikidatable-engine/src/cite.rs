//! Citation rendering.
//!
//! Two output forms: a structured `{{cite web}}` template when a real title
//! is known, and a minimal `[url] (published {{date|…}})` form otherwise.

use url::Url;
use wikidatable_core::Reference;
use wikidatable_wikidata::CitationMetadataResolver;

/// Code points that break citation templates (CS1 "invisible character" errors).
const INVISIBLE_CHARS: &[char] = &[
    '\u{00A0}', '\u{00AD}', '\u{FFFD}', '\u{200A}', '\u{200B}', '\u{200D}', '\u{0009}', '\u{0010}',
    '\u{0013}', '\u{007F}',
];

const UNKNOWN_SOURCE: &str = "an unknown source";

pub struct CitationFormatter {
    metadata: CitationMetadataResolver,
}

impl CitationFormatter {
    pub fn new(metadata: CitationMetadataResolver) -> Self {
        Self { metadata }
    }

    /// The `<ref>` block for a marker, or `None` when there is no primary
    /// reference (the REFSLOT is then left alone).
    ///
    /// Ratio markers cite both references; a missing secondary reference is
    /// named as an unknown source.
    pub async fn format(
        &self,
        reference: Option<&Reference>,
        is_ratio: bool,
        secondary: Option<&Reference>,
    ) -> Option<String> {
        let primary = self.cite(reference?).await;

        let body = if is_ratio {
            let second = match secondary {
                Some(r) => self.cite(r).await,
                None => UNKNOWN_SOURCE.to_string(),
            };
            format!("Calculated from {} and {}", primary, second)
        } else {
            primary
        };

        Some(format!("<ref>{}.</ref>", body))
    }

    /// One reference, metadata filled in first.
    pub async fn cite(&self, reference: &Reference) -> String {
        let mut reference = reference.clone();
        self.metadata.fill(&mut reference).await;
        render_citation(&reference)
    }
}

/// Renders one reference without any lookups.
pub fn render_citation(reference: &Reference) -> String {
    let field = |f: &Option<String>| f.clone().unwrap_or_default();

    let Some(url) = &reference.url else {
        let mut out = field(&reference.title);
        push_dates(&mut out, reference);
        return out;
    };

    match &reference.title {
        Some(title) if !looks_like_url(title) => format!(
            "{{{{cite web|url={}|title={}|date={}|access-date={}|language={}|website={}}}}}",
            url,
            sanitize(title),
            field(&reference.published),
            field(&reference.retrieved),
            field(&reference.language),
            sanitize(&field(&reference.website)),
        ),
        _ => {
            let mut out = format!("[{}]", url);
            push_dates(&mut out, reference);
            out
        }
    }
}

fn push_dates(out: &mut String, reference: &Reference) {
    if let Some(published) = &reference.published {
        out.push_str(&format!(" (published {{{{date|{}}}}})", published));
    }
    if let Some(retrieved) = &reference.retrieved {
        out.push_str(&format!(" (retrieved {{{{date|{}}}}})", retrieved));
    }
}

/// A title that is itself an absolute URL carries no information.
fn looks_like_url(title: &str) -> bool {
    Url::parse(title).map(|u| !u.cannot_be_a_base()).unwrap_or(false)
}

/// Escapes pipes and strips invisible characters for use inside a template.
pub fn sanitize(s: &str) -> String {
    s.replace('|', "{{!}}")
        .chars()
        .filter(|c| !INVISIBLE_CHARS.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_escapes_pipes_and_strips_invisibles() {
        assert_eq!(sanitize("A|B\u{00A0}C"), "A{{!}}BC");
        let all: String = INVISIBLE_CHARS.iter().collect();
        assert_eq!(sanitize(&format!("x{}y|z", all)), "xy{{!}}z");
    }

    #[test]
    fn structured_form_has_fixed_field_order() {
        let mut r = Reference::default()
            .with_url("http://x")
            .with_title("Census | 2021")
            .with_published("2020-01-01")
            .with_retrieved("March 2021");
        r.language = Some("en".into());
        r.website = Some("Office\u{200B} for Stats".into());
        assert_eq!(
            render_citation(&r),
            "{{cite web|url=http://x|title=Census {{!}} 2021|date=2020-01-01|access-date=March 2021|language=en|website=Office for Stats}}"
        );
    }

    #[test]
    fn structured_form_leaves_missing_fields_blank() {
        let r = Reference::default().with_url("http://x").with_title("T");
        assert_eq!(
            render_citation(&r),
            "{{cite web|url=http://x|title=T|date=|access-date=|language=|website=}}"
        );
    }

    #[test]
    fn minimal_form_when_title_missing_or_url() {
        let r = Reference::default()
            .with_url("http://x")
            .with_published("2020-01-01")
            .with_retrieved("2021");
        assert_eq!(
            render_citation(&r),
            "[http://x] (published {{date|2020-01-01}}) (retrieved {{date|2021}})"
        );

        let r = Reference::default()
            .with_url("http://x")
            .with_title("https://example.org/page")
            .with_retrieved("2021-05-05");
        assert_eq!(render_citation(&r), "[http://x] (retrieved {{date|2021-05-05}})");
    }

    #[test]
    fn minimal_form_without_url_uses_title() {
        let r = Reference::default()
            .with_title("World Bank")
            .with_published("2019");
        assert_eq!(render_citation(&r), "World Bank (published {{date|2019}})");
    }

    #[test]
    fn titles_with_colons_are_not_urls() {
        assert!(!looks_like_url("Note: population"));
        assert!(!looks_like_url("Census 2021"));
        assert!(looks_like_url("http://example.org/x"));
    }
}
