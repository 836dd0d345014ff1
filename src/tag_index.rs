use std::cmp::Reverse;
use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;

use crate::content::{Post, DRAFT_TAG, EXTERNAL_TAG};

/// What listings need to know about a post
#[derive(Debug, Clone, PartialEq)]
pub struct PostSummary {
    pub link: String,
    pub title: String,
    /// Date as written in the post
    pub date: String,
    pub published: NaiveDate,
    pub tags: Vec<String>,
}

impl PostSummary {
    pub fn from_post(post: &Post) -> Result<PostSummary> {
        Ok(PostSummary {
            link: post.link(),
            title: post.title.clone(),
            date: post.date.clone(),
            published: post.published()?,
            tags: post.tags.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagCount<'a> {
    pub tag: &'a str,
    pub count: usize,
}

/// Published posts grouped by tag
#[derive(Default)]
pub struct TagIndex {
    posts: BTreeMap<String, Vec<PostSummary>>,
}

impl TagIndex {
    pub fn new() -> TagIndex {
        TagIndex::default()
    }

    /// Files the post under each of its tags. Drafts are ignored.
    pub fn add(&mut self, summary: &PostSummary) {
        if summary.tags.iter().any(|t| t == DRAFT_TAG) {
            return;
        }
        for tag in &summary.tags {
            self.posts.entry(tag.clone()).or_default().push(summary.clone());
        }
    }

    pub fn count(&self, tag: &str) -> usize {
        self.posts.get(tag).map(Vec::len).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.posts.keys().filter(|t| t.as_str() != DRAFT_TAG).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most used tags, highest count first and ties broken by name descending.
    pub fn frequent(&self, limit: usize) -> Vec<TagCount> {
        let mut counts: Vec<TagCount> = self.counts()
            .filter(|tc| tc.tag != EXTERNAL_TAG)
            .collect();
        counts.sort_by_key(|tc| Reverse((tc.count, tc.tag)));
        counts.truncate(limit);
        counts
    }

    /// Every tag, highest count first, then by name.
    pub fn ranking(&self) -> Vec<TagCount> {
        let mut counts: Vec<TagCount> = self.counts().collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.tag.cmp(b.tag)));
        counts
    }

    /// Tags in name order with their posts, newest first
    pub fn tags(&self) -> Vec<(&str, Vec<&PostSummary>)> {
        self.posts.iter()
            .filter(|(tag, _)| tag.as_str() != DRAFT_TAG)
            .map(|(tag, posts)| {
                let mut posts: Vec<&PostSummary> = posts.iter().collect();
                posts.sort_by(|a, b| b.published.cmp(&a.published));
                (tag.as_str(), posts)
            })
            .collect()
    }

    fn counts(&self) -> impl Iterator<Item=TagCount<'_>> + '_ {
        self.posts.iter()
            .filter(|(tag, _)| tag.as_str() != DRAFT_TAG)
            .map(|(tag, posts)| TagCount { tag: tag.as_str(), count: posts.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(link: &str, date: (i32, u32, u32), tags: &[&str]) -> PostSummary {
        PostSummary {
            link: link.to_string(),
            title: link.to_uppercase(),
            date: String::new(),
            published: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn index_with_counts(counts: &[(&str, usize)]) -> TagIndex {
        let mut index = TagIndex::new();
        for (tag, count) in counts {
            for i in 0..*count {
                index.add(&summary(&format!("{}-{}", tag, i), (2020, 1, 1), &[*tag]));
            }
        }
        index
    }

    fn names<'a>(counts: &[TagCount<'a>]) -> Vec<&'a str> {
        counts.iter().map(|tc| tc.tag).collect()
    }

    #[test]
    fn test_frequent_tie_break() {
        let index = index_with_counts(&[("a", 5), ("b", 5), ("c", 3)]);
        let frequent = index.frequent(20);
        assert_eq!(names(&frequent), ["b", "a", "c"]);
        assert_eq!(frequent[0].count, 5);
        assert_eq!(frequent[2].count, 3);
    }

    #[test]
    fn test_frequent_skips_external_and_limits() {
        let index = index_with_counts(&[("external", 9), ("go", 4), ("rust", 2), ("sql", 1)]);
        assert_eq!(names(&index.frequent(2)), ["go", "rust"]);
        assert_eq!(index.count("external"), 9);
    }

    #[test]
    fn test_ranking_keeps_external() {
        let index = index_with_counts(&[("external", 9), ("go", 4), ("b", 1), ("a", 1)]);
        assert_eq!(names(&index.ranking()), ["external", "go", "a", "b"]);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_drafts_are_not_indexed() {
        let mut index = TagIndex::new();
        index.add(&summary("draft.html", (2022, 1, 10), &["go", "draft"]));
        index.add(&summary("post.html", (2021, 1, 10), &["go"]));
        assert_eq!(index.count("go"), 1);
        assert_eq!(index.count("draft"), 0);
        assert!(index.frequent(20).iter().all(|tc| tc.tag != "draft"));
    }

    #[test]
    fn test_tag_posts_newest_first() {
        let mut index = TagIndex::new();
        index.add(&summary("old.html", (2019, 6, 1), &["go"]));
        index.add(&summary("new.html", (2023, 3, 5), &["go", "sql"]));
        index.add(&summary("mid.html", (2021, 12, 25), &["go"]));

        let tags = index.tags();
        assert_eq!(tags.len(), 2);
        let (tag, posts) = &tags[0];
        assert_eq!(*tag, "go");
        let links: Vec<&str> = posts.iter().map(|p| p.link.as_str()).collect();
        assert_eq!(links, ["new.html", "mid.html", "old.html"]);
        assert_eq!(tags[1].0, "sql");
    }

    #[test]
    fn test_empty_index() {
        let index = TagIndex::new();
        assert!(index.is_empty());
        assert!(index.frequent(20).is_empty());
        assert!(index.ranking().is_empty());
    }
}
