use anyhow::Result;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{element_text, first_text, selector, DetailSelectors};

static MAILTO: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href^="mailto:"]"#).expect("mailto selector"));

/// Optional sections of a detail page; each is independent of the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detail {
    pub bio: Option<String>,
    pub office: Option<String>,
    pub email: Option<String>,
    pub interests: Vec<String>,
}

pub struct DetailParser {
    bio: Selector,
    office: Selector,
    email: Selector,
    interests: Selector,
}

impl DetailParser {
    pub fn new(selectors: &DetailSelectors) -> Result<Self> {
        Ok(Self {
            bio: selector(&selectors.bio)?,
            office: selector(&selectors.office)?,
            email: selector(&selectors.email)?,
            interests: selector(&selectors.interests)?,
        })
    }

    pub fn parse(&self, html: &str) -> Detail {
        let doc = Html::parse_document(html);
        let root = doc.root_element();
        Detail {
            bio: first_text(root, &self.bio),
            office: first_text(root, &self.office),
            email: root.select(&self.email).find_map(email_of),
            interests: root.select(&self.interests).filter_map(element_text).collect(),
        }
    }
}

/// Prefer a `mailto:` target (on the element or inside it) over visible text,
/// which is often obfuscated as "name [at] host".
fn email_of(el: ElementRef<'_>) -> Option<String> {
    let href = el
        .value()
        .attr("href")
        .filter(|h| h.starts_with("mailto:"))
        .or_else(|| el.select(&MAILTO).find_map(|a| a.value().attr("href")));

    href.and_then(|h| {
        let addr = h.trim_start_matches("mailto:");
        let addr = addr.split('?').next().unwrap_or_default().trim();
        (!addr.is_empty()).then(|| addr.to_string())
    })
    .or_else(|| element_text(el))
}
