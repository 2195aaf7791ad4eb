// src/directory/mod.rs

pub mod detail;
pub mod listing;

pub use detail::{Detail, DetailParser};
pub use listing::{ListingEntry, ListingParser};

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::text::non_empty;

/// CSS selectors for the listing page. `record` picks one block per person;
/// the rest are evaluated inside each block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    pub record: String,
    pub name: String,
    pub link: String,
    pub position: String,
    pub affiliation: String,
    pub image: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            record: "div.faculty-card".into(),
            name: ".faculty-name".into(),
            link: "a[href]".into(),
            position: ".faculty-title".into(),
            affiliation: ".faculty-affiliation".into(),
            image: "img".into(),
        }
    }
}

/// CSS selectors for a person's detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    pub bio: String,
    pub office: String,
    pub email: String,
    pub interests: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            bio: ".faculty-bio".into(),
            office: ".faculty-office".into(),
            email: ".faculty-email".into(),
            interests: ".faculty-interests li".into(),
        }
    }
}

/// One output line of the directory CSV. `None` is written as an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FacultyRow {
    pub name: Option<String>,
    pub profile_link: Option<String>,
    pub position_1: Option<String>,
    pub position_2: Option<String>,
    pub affiliation: Option<String>,
    pub bio: Option<String>,
    pub office: Option<String>,
    pub email: Option<String>,
    pub interests: Option<String>,
    pub image: Option<String>,
}

impl FacultyRow {
    pub const HEADER: [&'static str; 10] = [
        "name",
        "profile_link",
        "position_1",
        "position_2",
        "affiliation",
        "bio",
        "office",
        "email",
        "interests",
        "image",
    ];

    pub fn new(entry: &ListingEntry, detail: Option<&Detail>, image: Option<String>) -> Self {
        let detail = detail.cloned().unwrap_or_default();
        Self {
            name: entry.name.clone(),
            profile_link: entry.link.as_ref().map(|u| u.to_string()),
            position_1: entry.position_1.clone(),
            position_2: entry.position_2.clone(),
            affiliation: entry.affiliation.clone(),
            bio: detail.bio,
            office: detail.office,
            email: detail.email,
            interests: if detail.interests.is_empty() {
                None
            } else {
                Some(detail.interests.join("; "))
            },
            image,
        }
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid CSS selector {:?}: {:?}", css, e))
}

/// Whitespace-normalised text of an element, `None` when blank.
pub(crate) fn element_text(el: ElementRef<'_>) -> Option<String> {
    non_empty(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first match of `sel` under `el`.
pub(crate) fn first_text(el: ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel).find_map(element_text)
}
