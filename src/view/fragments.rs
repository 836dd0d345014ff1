use anyhow::{anyhow, Result};
use chrono::Datelike;
use ramhorns::Template;

use crate::tag_index::{PostSummary, TagCount};
use crate::text_utils::tag_slug;

const TAG_BADGES: &str = r#"<div class="tags">{{#tags}}<a href="/tags/{{{slug}}}.html" class="tag">{{{name}}}</a>{{/tags}}</div>"#;

const FREQUENT_TAGS: &str = r#"{{#tags}}<a href="/tags/{{{slug}}}.html" class="tag">{{{name}}} ({{count}})</a>{{/tags}}"#;

const TAG_INDEX: &str = r#"<div class="tags">{{#tags}}<a href="/tags/{{{slug}}}.html" class="tag {{#common}}tag--common{{/common}}">{{{name}}} ({{count}})</a>{{/tags}}</div>"#;

const HOME_PAGE: &str = r#"
<div class="fp-section fp-section--tags">
  <h2 class="fp-h2">Frequent</h2>
  <div class="tags">
    {{{frequent_tags}}}
  </div>
  <small><a href="/tags/">View all</a></small>
</div>

<div class="fp-section fp-section--notes">
  {{#years}}
  <h3>{{year}}</h3>
  {{#posts}}
  <div class="summary">
    <div class="summary-subtitle">{{{date}}}</div>
    <a href="/{{{link}}}">{{{title}}}</a>
    {{{tags}}}
  </div>
  {{/posts}}
  {{/years}}
</div>
"#;

const TAG_PAGE: &str = r#"
<div class="summary">
  <h1>{{{tag}}}</h1>
  <div class="summary-subtitle">Tag</div>
</div>
{{#posts}}
<div class="summary">
  <a href="/{{{link}}}">{{{title}}}</a>
  <div class="summary-subtitle">{{{date}}}</div>
</div>
{{/posts}}
"#;

#[derive(ramhorns::Content)]
struct ViewTag<'a> {
    name: &'a str,
    slug: String,
    count: usize,
    common: bool,
}

#[derive(ramhorns::Content)]
struct ViewTags<'a> {
    tags: Vec<ViewTag<'a>>,
}

#[derive(ramhorns::Content)]
struct ViewPost<'a> {
    link: &'a str,
    title: &'a str,
    date: &'a str,
    tags: String,
}

#[derive(ramhorns::Content)]
struct ViewYear<'a> {
    year: i32,
    posts: Vec<ViewPost<'a>>,
}

#[derive(ramhorns::Content)]
struct HomePage<'a> {
    frequent_tags: &'a str,
    years: Vec<ViewYear<'a>>,
}

#[derive(ramhorns::Content)]
struct TagPage<'a> {
    tag: &'a str,
    posts: Vec<ViewPost<'a>>,
}

/// Post listing for one year of the home page
#[derive(Debug, PartialEq)]
pub struct YearGroup<'a> {
    pub year: i32,
    pub posts: Vec<&'a PostSummary>,
}

/// Splits posts sorted newest first into runs of the same year. A new group,
/// and so a new heading, starts whenever the year differs from the previous post.
pub fn group_by_year<'a>(posts: &[&'a PostSummary]) -> Vec<YearGroup<'a>> {
    let mut groups: Vec<YearGroup> = vec![];
    let mut prev_year: Option<i32> = None;
    for post in posts {
        let year = post.published.year();
        if prev_year != Some(year) {
            groups.push(YearGroup { year, posts: vec![] });
            prev_year = Some(year);
        }
        if let Some(group) = groups.last_mut() {
            group.posts.push(post);
        }
    }
    groups
}

/// Small HTML pieces shared by the generated pages
pub struct Fragments {
    tag_badges: Template<'static>,
    frequent_tags: Template<'static>,
    tag_index: Template<'static>,
    home_page: Template<'static>,
    tag_page: Template<'static>,
}

impl Fragments {
    pub fn new() -> Result<Fragments> {
        Ok(Fragments {
            tag_badges: compile("tag badges", TAG_BADGES)?,
            frequent_tags: compile("frequent tags", FREQUENT_TAGS)?,
            tag_index: compile("tag index", TAG_INDEX)?,
            home_page: compile("home page", HOME_PAGE)?,
            tag_page: compile("tag page", TAG_PAGE)?,
        })
    }

    /// Links to the tag pages of a post. Empty when the post has no tags.
    pub fn tag_badges(&self, tags: &[String]) -> String {
        if tags.is_empty() {
            return String::new();
        }
        let tags = tags.iter()
            .map(|t| view_tag(t, 0, false))
            .collect();
        self.tag_badges.render(&ViewTags { tags })
    }

    pub fn frequent_tags(&self, frequent: &[TagCount]) -> String {
        let tags = frequent.iter()
            .map(|tc| view_tag(tc.tag, tc.count, false))
            .collect();
        self.frequent_tags.render(&ViewTags { tags })
    }

    /// Every tag with its count, the first `common_limit` ones marked as common
    pub fn tag_index(&self, ranking: &[TagCount], common_limit: usize) -> String {
        let tags = ranking.iter()
            .enumerate()
            .map(|(i, tc)| view_tag(tc.tag, tc.count, i < common_limit))
            .collect();
        self.tag_index.render(&ViewTags { tags })
    }

    /// `posts` must be sorted newest first
    pub fn home_page(&self, frequent_tags: &str, posts: &[&PostSummary]) -> String {
        let years = group_by_year(posts).into_iter()
            .map(|group| ViewYear {
                year: group.year,
                posts: group.posts.into_iter().map(|p| self.view_post(p)).collect(),
            })
            .collect();
        self.home_page.render(&HomePage { frequent_tags, years })
    }

    pub fn tag_page(&self, tag: &str, posts: &[&PostSummary]) -> String {
        let posts = posts.iter().map(|p| self.view_post(p)).collect();
        self.tag_page.render(&TagPage { tag, posts })
    }

    fn view_post<'a>(&self, post: &'a PostSummary) -> ViewPost<'a> {
        ViewPost {
            link: post.link.as_str(),
            title: post.title.as_str(),
            date: post.date.as_str(),
            tags: self.tag_badges(&post.tags),
        }
    }
}

fn view_tag(name: &str, count: usize, common: bool) -> ViewTag {
    ViewTag {
        name,
        slug: tag_slug(name),
        count,
        common,
    }
}

fn compile(name: &str, src: &'static str) -> Result<Template<'static>> {
    Template::new(src).map_err(|e| anyhow!("Error parsing {} template: {}", name, e))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn summary(link: &str, date: &str, published: (i32, u32, u32), tags: &[&str]) -> PostSummary {
        PostSummary {
            link: link.to_string(),
            title: format!("Title of {}", link),
            date: date.to_string(),
            published: NaiveDate::from_ymd_opt(published.0, published.1, published.2).unwrap(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_tag_badges() {
        let f = Fragments::new().unwrap();
        let html = f.tag_badges(&["go".to_string(), "web servers".to_string(), "c/c++".to_string()]);
        assert_eq!(html, concat!(
            r#"<div class="tags">"#,
            r#"<a href="/tags/go.html" class="tag">go</a>"#,
            r#"<a href="/tags/web-servers.html" class="tag">web servers</a>"#,
            r#"<a href="/tags/c-c++.html" class="tag">c/c++</a>"#,
            "</div>",
        ));
        assert_eq!(f.tag_badges(&[]), "");
    }

    #[test]
    fn test_frequent_tags() {
        let f = Fragments::new().unwrap();
        let html = f.frequent_tags(&[TagCount { tag: "go", count: 5 }, TagCount { tag: "sql", count: 2 }]);
        assert_eq!(html, r#"<a href="/tags/go.html" class="tag">go (5)</a><a href="/tags/sql.html" class="tag">sql (2)</a>"#);
    }

    #[test]
    fn test_tag_index_marks_common_tags() {
        let f = Fragments::new().unwrap();
        let html = f.tag_index(&[TagCount { tag: "go", count: 5 }, TagCount { tag: "sql", count: 2 }], 1);
        assert!(html.contains(r#"class="tag tag--common">go (5)</a>"#));
        assert!(html.contains(r#"class="tag ">sql (2)</a>"#));
    }

    #[test]
    fn test_group_by_year() {
        let a = summary("a.html", "March 5, 2022", (2022, 3, 5), &[]);
        let b = summary("b.html", "January 1, 2022", (2022, 1, 1), &[]);
        let c = summary("c.html", "December 25, 2021", (2021, 12, 25), &[]);
        let groups = group_by_year(&[&a, &b, &c]);
        assert_eq!(groups, vec![
            YearGroup { year: 2022, posts: vec![&a, &b] },
            YearGroup { year: 2021, posts: vec![&c] },
        ]);
        assert!(group_by_year(&[]).is_empty());
    }

    #[test]
    fn test_home_page_year_headings() {
        let f = Fragments::new().unwrap();
        let a = summary("a.html", "March 5, 2022", (2022, 3, 5), &["go"]);
        let b = summary("b.html", "January 1, 2022", (2022, 1, 1), &[]);
        let c = summary("c.html", "December 25, 2021", (2021, 12, 25), &[]);
        let html = f.home_page("FREQUENT", &[&a, &b, &c]);

        assert_eq!(html.matches("<h3>2022</h3>").count(), 1);
        assert_eq!(html.matches("<h3>2021</h3>").count(), 1);
        let pos = |needle: &str| html.find(needle).unwrap();
        assert!(pos("<h3>2022</h3>") < pos("Title of a.html"));
        assert!(pos("Title of b.html") < pos("<h3>2021</h3>"));
        assert!(pos("<h3>2021</h3>") < pos("Title of c.html"));
        assert!(html.contains(r#"<a href="/a.html">Title of a.html</a>"#));
        assert!(html.contains(r#"<a href="/tags/go.html" class="tag">go</a>"#));
        assert!(html.contains("FREQUENT"));
        assert!(html.contains(r#"<a href="/tags/">View all</a>"#));
    }

    #[test]
    fn test_tag_page() {
        let f = Fragments::new().unwrap();
        let a = summary("a.html", "March 5, 2022", (2022, 3, 5), &["go"]);
        let c = summary("c.html", "December 25, 2021", (2021, 12, 25), &["go"]);
        let html = f.tag_page("go", &[&a, &c]);
        assert!(html.contains("<h1>go</h1>"));
        assert!(html.find("Title of a.html").unwrap() < html.find("Title of c.html").unwrap());
        assert!(html.contains(r#"<div class="summary-subtitle">December 25, 2021</div>"#));
    }
}
