use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use markdown::{CompileOptions, Options};
use regex::Regex;

lazy_static! {
    static ref PARAGRAPH_OPEN: Regex = Regex::new(r"<p(\s[^>]*)?>").unwrap();
    static ref ANCHOR_OPEN: Regex = Regex::new(r"<a(\s[^>]*)?>").unwrap();
    static ref STYLE_ATTR: Regex = Regex::new(r#"\sstyle\s*=\s*"[^"]*""#).unwrap();
    static ref CLICKTRACKING_ATTR: Regex = Regex::new(r#"\sclicktracking\s*=\s*"[^"]*""#).unwrap();
}

/// Turns a markdown newsletter into HTML that renders well in mail clients:
/// paragraphs get spacing and links opt out of click tracking.
pub fn markdown_to_email_html(md: &str) -> Result<String> {
    let options = Options {
        compile: CompileOptions {
            allow_dangerous_html: true,
            ..CompileOptions::default()
        },
        ..Options::default()
    };
    let html = markdown::to_html_with_options(md.trim(), &options)
        .map_err(|e| anyhow!("Error converting markdown: {}", e.reason))?;

    let html = PARAGRAPH_OPEN.replace_all(&html, |caps: &regex::Captures| {
        let attrs = without_attribute(caps.get(1).map_or("", |m| m.as_str()), &STYLE_ATTR);
        format!(r#"<p{} style="margin-bottom: 10px;">"#, attrs)
    });
    let html = ANCHOR_OPEN.replace_all(&html, |caps: &regex::Captures| {
        let attrs = without_attribute(caps.get(1).map_or("", |m| m.as_str()), &CLICKTRACKING_ATTR);
        format!(r#"<a{} clicktracking="off">"#, attrs)
    });

    Ok(html.into_owned())
}

/// Drops the attribute matched by `attr` so it can be set again
fn without_attribute(attrs: &str, attr: &Regex) -> String {
    attr.replace_all(attrs, "").into_owned()
}
