use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Format of the date header in posts, e.g. `March 5, 2023`
pub const POST_DATE_FORMAT: &str = "%B %d, %Y";

pub fn parse_post_date(buf: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(buf.trim(), POST_DATE_FORMAT)
        .with_context(|| format!("Unable to parse date '{}', expected e.g. 'March 5, 2023'", buf))
}

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// File name fragment for a tag: spaces and slashes become dashes
pub fn tag_slug(tag: &str) -> String {
    tag.replace([' ', '/'], "-")
}

pub fn heading_id(text: &str) -> String {
    text.to_lowercase().replace(' ', "-")
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest
pub fn title_case(text: &str) -> String {
    let mut res = String::with_capacity(text.len());
    let mut prev_is_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_alpha {
                res.extend(c.to_lowercase());
            } else {
                res.extend(c.to_uppercase());
            }
            prev_is_alpha = true;
        } else {
            res.push(c);
            prev_is_alpha = false;
        }
    }
    res
}

/// Splits the raw tag header on commas, dropping blanks and repeats
pub fn split_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = vec![];
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
