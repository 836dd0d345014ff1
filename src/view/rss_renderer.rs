use std::io::Cursor;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/* Example
<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel>
  <title>Notes on software development</title>
  <link>https://notes.eatonphil.com/</link>
  <description>Notes on software development</description>
  <language>en</language>
  <managingEditor>me@eatonphil.com (Phil Eaton)</managingEditor>
  <item>
    <guid isPermaLink="false">https://notes.eatonphil.com/writing-a-tiny-database.html</guid>
    <title>Writing a tiny database</title>
    <link>https://notes.eatonphil.com/writing-a-tiny-database.html</link>
    <pubDate>Sun, 5 Mar 2023 00:00:00 +0000</pubDate>
    <content:encoded><![CDATA[<p>Let's build a key-value store.</p>]]></content:encoded>
  </item>
</channel>
</rss>
*/

pub struct FeedEntry<'a> {
    /// Absolute URL, also used as the guid
    pub url: String,
    pub title: &'a str,
    pub published: NaiveDate,
    pub content: &'a str,
}

pub struct RssChannel<'a> {
    pub ch_title: &'a str,
    pub ch_link: &'a str,
    pub ch_desc: &'a str,
    pub language: &'a str,
    pub author: &'a str,
    pub email: &'a str,
}

impl<'a> RssChannel<'a> {
    /// Items are written in the given order, callers pass them newest first
    pub fn render(&self, entries: &[FeedEntry]) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        rss.push_attribute(("xmlns:content", "http://purl.org/rss/1.0/modules/content/"));
        writer.write_event(Event::Start(rss))?;

        writer.write_event(Event::Start(BytesStart::new("channel")))?;
        push_text(&mut writer, "title", self.ch_title)?;
        push_text(&mut writer, "link", self.ch_link)?;
        push_text(&mut writer, "description", self.ch_desc)?;
        push_text(&mut writer, "language", self.language)?;
        push_text(&mut writer, "managingEditor", &format!("{} ({})", self.email, self.author))?;

        for entry in entries {
            writer.write_event(Event::Start(BytesStart::new("item")))?;

            let mut guid = BytesStart::new("guid");
            guid.push_attribute(("isPermaLink", "false"));
            writer.write_event(Event::Start(guid))?;
            writer.write_event(Event::Text(BytesText::new(entry.url.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new("guid")))?;

            push_text(&mut writer, "title", entry.title)?;
            push_text(&mut writer, "link", entry.url.as_str())?;
            push_text(&mut writer, "pubDate", &pub_date(&entry.published)?)?;
            push_cdata(&mut writer, "content:encoded", entry.content)?;

            writer.write_event(Event::End(BytesEnd::new("item")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        Ok(writer.into_inner().into_inner())
    }
}

/// Midnight UTC of the post date, RFC 2822
fn pub_date(date: &NaiveDate) -> Result<String> {
    let midnight = date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid publication date {}", date))?;
    Ok(Utc.from_utc_datetime(&midnight).to_rfc2822())
}

fn push_text(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn push_cdata(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    if text.contains("]]>") {
        let new_text = text.replace("]]>", "]] >");
        writer.write_event(Event::CData(BytesCData::new(&new_text)))?;
    } else {
        writer.write_event(Event::CData(BytesCData::new(text)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
