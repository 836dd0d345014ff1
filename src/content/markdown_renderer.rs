use std::collections::BTreeMap;

use anyhow::{Context, Result};
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::content::highlighter::Highlighter;
use crate::content::{Rendered, TAGS_LEVEL};
use crate::text_utils::heading_id;

/// Converts post markdown to HTML. The first heading of each level is taken
/// out of the body and returned as metadata; level 6 headings never reach the
/// body. Fenced code goes through the [`Highlighter`].
pub struct MarkdownRenderer<'a> {
    highlighter: &'a Highlighter,
}

enum Capture<'e> {
    Heading(u8, Vec<Event<'e>>),
    Code(Option<String>, String),
}

impl<'a> MarkdownRenderer<'a> {
    pub fn new(highlighter: &'a Highlighter) -> MarkdownRenderer<'a> {
        MarkdownRenderer { highlighter }
    }

    pub fn render(&self, source: &str) -> Result<Rendered> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let mut metadata: BTreeMap<u8, String> = BTreeMap::new();
        let mut events: Vec<Event> = Vec::new();
        let mut capture: Option<Capture> = None;

        for event in Parser::new_ext(source, options) {
            capture = match (capture, event) {
                (None, Event::Start(Tag::Heading { level, .. })) => {
                    Some(Capture::Heading(level_number(level), vec![]))
                }
                (None, Event::Start(Tag::CodeBlock(kind))) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    Some(Capture::Code(lang, String::new()))
                }
                (None, event) => {
                    events.push(event);
                    None
                }

                (Some(Capture::Heading(level, inner)), Event::End(TagEnd::Heading(_))) => {
                    let mut text = String::new();
                    html::push_html(&mut text, inner.into_iter());
                    if let Some(heading) = Self::heading(&mut metadata, level, text) {
                        events.push(Event::Html(CowStr::from(heading)));
                    }
                    None
                }
                (Some(Capture::Heading(level, mut inner)), event) => {
                    inner.push(event);
                    Some(Capture::Heading(level, inner))
                }

                (Some(Capture::Code(lang, code)), Event::End(TagEnd::CodeBlock)) => {
                    let code = code.trim_end_matches('\n');
                    let highlighted = self.highlighter.highlight(code, lang.as_deref())
                        .with_context(|| format!("Error highlighting code block ({})", lang.as_deref().unwrap_or("no language")))?;
                    events.push(Event::Html(CowStr::from(highlighted)));
                    None
                }
                (Some(Capture::Code(lang, mut code)), Event::Text(text)) => {
                    code.push_str(&text);
                    Some(Capture::Code(lang, code))
                }
                (Some(capture @ Capture::Code(..)), _) => Some(capture),
            };
        }

        let mut body = String::new();
        html::push_html(&mut body, events.into_iter());

        Ok(Rendered { body, metadata })
    }

    /// Records the first heading of a level as metadata. Returns the markup to
    /// emit for headings that stay in the body.
    fn heading(metadata: &mut BTreeMap<u8, String>, level: u8, text: String) -> Option<String> {
        if !metadata.contains_key(&level) {
            metadata.insert(level, text);
            return None;
        }
        if level == TAGS_LEVEL {
            return None;
        }
        Some(format!("<h{level} id=\"{id}\">{text}</h{level}>\n", level = level, id = heading_id(&text), text = text))
    }
}

fn level_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
