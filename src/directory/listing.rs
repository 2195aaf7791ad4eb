use anyhow::Result;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;
use url::Url;

use super::{element_text, first_text, selector, ListingSelectors};

/// What the listing page says about one person.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingEntry {
    pub name: Option<String>,
    pub link: Option<Url>,
    pub position_1: Option<String>,
    pub position_2: Option<String>,
    pub affiliation: Option<String>,
    pub image: Option<Url>,
}

pub struct ListingParser {
    record: Selector,
    name: Selector,
    link: Selector,
    position: Selector,
    affiliation: Selector,
    image: Selector,
}

impl ListingParser {
    pub fn new(selectors: &ListingSelectors) -> Result<Self> {
        Ok(Self {
            record: selector(&selectors.record)?,
            name: selector(&selectors.name)?,
            link: selector(&selectors.link)?,
            position: selector(&selectors.position)?,
            affiliation: selector(&selectors.affiliation)?,
            image: selector(&selectors.image)?,
        })
    }

    /// One entry per record block, in page order. Relative links resolve against `base`.
    pub fn parse(&self, html: &str, base: &Url) -> Vec<ListingEntry> {
        let doc = Html::parse_document(html);
        doc.select(&self.record)
            .map(|block| self.parse_block(block, base))
            .collect()
    }

    fn parse_block(&self, block: ElementRef<'_>, base: &Url) -> ListingEntry {
        let link_el = block
            .select(&self.link)
            .find(|a| a.value().attr("href").is_some());

        let name = first_text(block, &self.name).or_else(|| link_el.and_then(element_text));
        let link = link_el
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve(base, href));

        let mut positions = block.select(&self.position).filter_map(element_text);
        let position_1 = positions.next();
        let position_2 = positions.next();

        let image = block
            .select(&self.image)
            .find_map(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
            .and_then(|src| resolve(base, src));

        trace!(?name, ?link, "parsed listing block");
        ListingEntry {
            name,
            link,
            position_1,
            position_2,
            affiliation: first_text(block, &self.affiliation),
            image,
        }
    }
}

fn resolve(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    base.join(href).ok()
}
