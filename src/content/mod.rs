use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use spdlog::warn;

use crate::text_utils::{parse_post_date, split_tags};

pub mod highlighter;
pub mod markdown_renderer;
pub mod post_list;

/// Heading levels that carry post metadata instead of body content
pub const TITLE_LEVEL: u8 = 1;
pub const DATE_LEVEL: u8 = 2;
pub const SUBTITLE_LEVEL: u8 = 3;
pub const TAGS_LEVEL: u8 = 6;

/// Posts with this tag get their own page and nothing else
pub const DRAFT_TAG: &str = "draft";
/// Left out of the frequent tags, still listed in the tag index
pub const EXTERNAL_TAG: &str = "external";

/// Output of a single markdown render: the body plus the first heading of each
/// level, keyed by level.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rendered {
    pub body: String,
    pub metadata: BTreeMap<u8, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Path relative to the posts directory, reused for the output file
    pub file_name: PathBuf,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub tags: Vec<String>,
    pub body: String,
}

impl Post {
    pub fn is_draft(&self) -> bool {
        self.tags.iter().any(|t| t == DRAFT_TAG)
    }

    pub fn published(&self) -> Result<NaiveDate> {
        parse_post_date(&self.date)
            .with_context(|| format!("Invalid date in {}", self.file_name.display()))
    }

    pub fn link(&self) -> String {
        link_of(&self.file_name)
    }
}

/// A source file without title and date headings. Published as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticPage {
    pub file_name: PathBuf,
    pub body: String,
}

impl StaticPage {
    pub fn link(&self) -> String {
        link_of(&self.file_name)
    }

    /// File stem, used as the page label
    pub fn stem(&self) -> String {
        self.file_name.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceDocument {
    Post(Post),
    Page(StaticPage),
}

impl SourceDocument {
    pub fn from_rendered(file_name: PathBuf, rendered: Rendered) -> SourceDocument {
        let Rendered { body, mut metadata } = rendered;

        let missing: Vec<u8> = [TITLE_LEVEL, DATE_LEVEL].into_iter()
            .filter(|level| !metadata.contains_key(level))
            .collect();
        if !missing.is_empty() {
            warn!("{} has no heading of level {:?}, publishing it as a static page", file_name.display(), missing);
            return SourceDocument::Page(StaticPage { file_name, body });
        }

        let mut take = |level: u8| metadata.remove(&level).unwrap_or_default();
        let title = take(TITLE_LEVEL);
        let date = take(DATE_LEVEL);
        let subtitle = take(SUBTITLE_LEVEL);
        let tags = split_tags(&take(TAGS_LEVEL));

        SourceDocument::Post(Post {
            file_name,
            title,
            subtitle,
            date,
            tags,
            body,
        })
    }
}

/// Path with forward slashes, as used in URLs
fn link_of(file_name: &std::path::Path) -> String {
    file_name.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
