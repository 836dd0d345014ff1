use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use spdlog::info;

use crate::config::{Asset, SiteConfig};
use crate::content::highlighter::Highlighter;
use crate::content::markdown_renderer::MarkdownRenderer;
use crate::content::post_list::PostList;
use crate::content::{Post, SourceDocument, StaticPage};
use crate::tag_index::{PostSummary, TagIndex};
use crate::text_utils::{tag_slug, title_case};
use crate::view::fragments::Fragments;
use crate::view::page_renderer::{PageRenderer, PageVars};
use crate::view::rss_renderer::{FeedEntry, RssChannel};
use crate::view::sitemap_renderer::{render_sitemap, robots_txt, SitemapEntry};

/// Unhides the feedback block on published posts
pub const FEEDBACK_STYLE: &str = "<style>.feedback{display:initial;}</style>";

const ALL_TOPICS: &str = "All Topics";
const HIDE_ON_INDEX: &str = "hide-on-index";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BuildReport {
    pub posts: usize,
    pub static_pages: usize,
    pub drafts: usize,
    pub tags: usize,
}

struct Published {
    post: Post,
    summary: PostSummary,
}

struct SiteWriter<'a> {
    cfg: &'a SiteConfig,
    pages: PageRenderer<'a>,
    fragments: Fragments,
}

/// Regenerates the whole output directory from the posts directory
pub fn build_site(cfg: &SiteConfig) -> Result<BuildReport> {
    let template = read_file(&cfg.paths.template)?;
    let mail = read_file(&cfg.paths.mail_snippet)?;
    let writer = SiteWriter {
        cfg,
        pages: PageRenderer::new(&template, mail)?,
        fragments: Fragments::new()?,
    };

    let highlighter = Highlighter::new(&cfg.highlight)?;
    let renderer = MarkdownRenderer::new(&highlighter);
    let post_list = PostList {
        root_dir: cfg.paths.posts_dir.clone(),
        extension: cfg.paths.post_extension.clone(),
    };

    let mut report = BuildReport::default();
    let mut published: Vec<Published> = vec![];
    let mut index = TagIndex::new();

    for relative in post_list.retrieve_files()? {
        match post_list.load(&relative, &renderer)? {
            SourceDocument::Page(page) => {
                writer.write_static_page(&page)?;
                report.static_pages += 1;
            }
            SourceDocument::Post(post) if post.is_draft() => {
                writer.write_draft(&post)?;
                report.drafts += 1;
            }
            SourceDocument::Post(post) => {
                let summary = PostSummary::from_post(&post)?;
                index.add(&summary);
                published.push(Published { post, summary });
            }
        }
    }

    let frequent_tags = writer.fragments.frequent_tags(&index.frequent(cfg.site.frequent_tag_limit));
    for p in &published {
        writer.write_post(&p.post, &frequent_tags)?;
    }

    // Oldest first, ties keep the listing order
    published.sort_by(|a, b| a.summary.published.cmp(&b.summary.published));

    writer.write_home(&frequent_tags, &published)?;
    copy_assets(&cfg.assets, &cfg.paths.output_dir)?;
    writer.write_feed(&published)?;
    writer.write_sitemap(&published)?;
    writer.write_tags(&index)?;

    report.posts = published.len();
    report.tags = index.len();
    Ok(report)
}

impl<'a> SiteWriter<'a> {
    fn output(&self, relative: &str) -> std::path::PathBuf {
        self.cfg.paths.output_dir.join(relative)
    }

    fn write_static_page(&self, page: &StaticPage) -> Result<()> {
        let link = page.link();
        let label = title_case(&page.stem());
        let full_url = self.cfg.site.page_url(&link);
        self.pages.write(&self.output(&link), &PageVars {
            post: &page.body,
            title: "",
            subtitle: "",
            real_subtitle: "",
            tag: &label,
            tags: "",
            frequent_tags: "",
            full_url: &full_url,
            hide_on_index: "",
            meta: "",
            mail: self.pages.mail(),
        })
    }

    /// Drafts get their own page only, reachable by direct link
    fn write_draft(&self, post: &Post) -> Result<()> {
        info!("Skipping {} from listings, it is a draft", post.file_name.display());
        self.write_post_page(post, &post.body, "")
    }

    fn write_post(&self, post: &Post, frequent_tags: &str) -> Result<()> {
        let body = format!("{}{}", post.body, FEEDBACK_STYLE);
        self.write_post_page(post, &body, frequent_tags)
    }

    fn write_post_page(&self, post: &Post, body: &str, frequent_tags: &str) -> Result<()> {
        let link = post.link();
        let full_url = self.cfg.site.page_url(&link);
        let tags = self.fragments.tag_badges(&post.tags);
        let real_subtitle = if post.subtitle.is_empty() {
            String::new()
        } else {
            format!("<div class='realsubtitle'>{}</div>", post.subtitle)
        };
        self.pages.write(&self.output(&link), &PageVars {
            post: body,
            title: &post.title,
            subtitle: &post.date,
            real_subtitle: &real_subtitle,
            tag: &post.title,
            tags: &tags,
            frequent_tags,
            full_url: &full_url,
            hide_on_index: "",
            meta: "",
            mail: self.pages.mail(),
        })
    }

    fn write_home(&self, frequent_tags: &str, published: &[Published]) -> Result<()> {
        info!("Writing home page with {} posts", published.len());
        let newest_first: Vec<&PostSummary> = published.iter().rev().map(|p| &p.summary).collect();
        let home = self.fragments.home_page(frequent_tags, &newest_first);
        let site = &self.cfg.site;
        let full_url = site.root_url();
        self.pages.write(&self.output("index.html"), &PageVars {
            post: &home,
            title: "",
            subtitle: "",
            real_subtitle: "",
            tag: &site.title,
            tags: "",
            frequent_tags: "",
            full_url: &full_url,
            hide_on_index: HIDE_ON_INDEX,
            meta: &site.meta,
            mail: self.pages.mail(),
        })
    }

    fn write_feed(&self, published: &[Published]) -> Result<()> {
        let site = &self.cfg.site;
        let root_url = site.root_url();
        let entries: Vec<FeedEntry> = published.iter().rev()
            .map(|p| FeedEntry {
                url: site.page_url(&p.summary.link),
                title: &p.post.title,
                published: p.summary.published,
                content: &p.post.body,
            })
            .collect();
        let channel = RssChannel {
            ch_title: &site.title,
            ch_link: &root_url,
            ch_desc: &site.title,
            language: &site.language,
            author: &site.author,
            email: &site.email,
        };
        let xml = channel.render(&entries).context("Error rendering rss feed")?;
        write_output(&self.output("rss.xml"), &xml)
    }

    fn write_sitemap(&self, published: &[Published]) -> Result<()> {
        let site = &self.cfg.site;
        let entries: Vec<SitemapEntry> = published.iter()
            .map(|p| SitemapEntry {
                loc: site.page_url(&p.summary.link),
                last_modified: p.summary.published,
            })
            .collect();
        let xml = render_sitemap(&entries).context("Error rendering sitemap")?;
        write_output(&self.output("sitemap.xml"), &xml)?;
        write_output(&self.output("robots.txt"), robots_txt(&site.page_url("sitemap.xml")).as_bytes())
    }

    fn write_tags(&self, index: &TagIndex) -> Result<()> {
        let site = &self.cfg.site;
        let listing = self.fragments.tag_index(&index.ranking(), site.frequent_tag_limit);
        let full_url = site.page_url("tags/");
        self.pages.write(&self.output("tags/index.html"), &PageVars {
            post: &listing,
            title: ALL_TOPICS,
            subtitle: "",
            real_subtitle: "",
            tag: ALL_TOPICS,
            tags: "",
            frequent_tags: "",
            full_url: &full_url,
            hide_on_index: HIDE_ON_INDEX,
            meta: "",
            mail: self.pages.mail(),
        })?;

        for (tag, posts) in index.tags() {
            let relative = format!("tags/{}.html", tag_slug(tag));
            let page = self.fragments.tag_page(tag, &posts);
            let full_url = site.page_url(&relative);
            self.pages.write(&self.output(&relative), &PageVars {
                post: &page,
                title: "",
                subtitle: "",
                real_subtitle: "",
                tag: &site.title,
                tags: "",
                frequent_tags: "",
                full_url: &full_url,
                hide_on_index: "",
                meta: "",
                mail: self.pages.mail(),
            })?;
        }
        Ok(())
    }
}

/// Copies each asset into the output directory and into its mirrors
fn copy_assets(assets: &[Asset], output_dir: &Path) -> Result<()> {
    for asset in assets {
        let file_name = asset.file.file_name()
            .ok_or_else(|| anyhow!("Asset {} has no file name", asset.file.display()))?;
        for dir in std::iter::once(output_dir).chain(asset.mirrors.iter().map(|m| m.as_path())) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Error creating directory {}", dir.display()))?;
            let target = dir.join(file_name);
            fs::copy(&asset.file, &target)
                .with_context(|| format!("Error copying {} to {}", asset.file.display(), target.display()))?;
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Error reading {}", path.display()))
}

fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Error writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::test_data::{DRAFT_MD, MAIL_SNIPPET, OLDER_MD, PAGE_MD, POST_MD, TEMPLATE};

    use super::*;

    struct Site {
        dir: tempfile::TempDir,
        cfg: SiteConfig,
    }

    impl Site {
        fn read(&self, relative: &str) -> String {
            fs::read_to_string(self.cfg.paths.output_dir.join(relative)).unwrap()
        }

        fn exists(&self, relative: &str) -> bool {
            self.cfg.paths.output_dir.join(relative).exists()
        }
    }

    fn setup(posts: &[(&str, &str)]) -> Site {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("posts").join("drafts")).unwrap();
        for (name, content) in posts {
            fs::write(root.join("posts").join(name), content).unwrap();
        }
        fs::write(root.join("template.html"), TEMPLATE).unwrap();
        fs::write(root.join("mail.html"), MAIL_SNIPPET).unwrap();
        fs::write(root.join("style.css"), "body { color: black; }").unwrap();

        let mut cfg = SiteConfig::default();
        cfg.site.base_url = "https://notes.example.com".to_string();
        cfg.assets = vec![Asset {
            file: PathBuf::from("style.css"),
            mirrors: vec![PathBuf::from("home")],
        }];
        let cfg = cfg.resolve_paths(root).unwrap();
        Site { dir, cfg }
    }

    fn full_site() -> (Site, BuildReport) {
        let site = setup(&[
            ("tiny-db.html", POST_MD),
            ("learning-go.html", OLDER_MD),
            ("drafts/half-baked.html", DRAFT_MD),
            ("books.html", PAGE_MD),
            ("notes.txt", "not a post"),
        ]);
        let report = build_site(&site.cfg).unwrap();
        (site, report)
    }

    #[test]
    fn test_report() {
        let (_site, report) = full_site();
        assert_eq!(report, BuildReport { posts: 2, static_pages: 1, drafts: 1, tags: 3 });
    }

    #[test]
    fn test_post_page() {
        let (site, _) = full_site();
        let page = site.read("tiny-db.html");
        assert!(page.contains("<h1>Writing a tiny database</h1>"));
        assert!(page.contains("<title>Writing a tiny database</title>"));
        assert_eq!(page.matches("March 5, 2023").count(), 1);
        assert!(page.contains("<div class='realsubtitle'>Storage engines from scratch</div>"));
        assert!(page.contains(r#"<a href="/tags/databases.html" class="tag">databases</a>"#));
        assert!(page.contains(r#"class="tag">go (2)</a>"#));
        assert!(page.contains(FEEDBACK_STYLE));
        assert!(page.contains(r#"href="https://notes.example.com/tiny-db.html""#));
        assert!(page.contains(MAIL_SNIPPET));
        assert!(!page.contains("databases, go"));
    }

    #[test]
    fn test_draft_only_gets_its_page() {
        let (site, _) = full_site();
        let draft = site.read("drafts/half-baked.html");
        assert!(draft.contains("<h1>Half-baked idea</h1>"));
        assert!(!draft.contains(FEEDBACK_STYLE));

        assert!(!site.read("index.html").contains("Half-baked"));
        assert!(!site.read("tags/go.html").contains("Half-baked"));
        assert!(!site.read("tags/index.html").contains("draft"));
        assert!(!site.read("rss.xml").contains("Half-baked"));
        assert!(!site.read("sitemap.xml").contains("half-baked"));
        assert!(!site.exists("tags/draft.html"));
    }

    #[test]
    fn test_static_page_fallback() {
        let (site, _) = full_site();
        let page = site.read("books.html");
        assert!(page.contains("<title>Books</title>"));
        assert!(page.contains("<li>Database Internals</li>"));
        assert!(!site.read("index.html").contains("books.html"));
        assert!(!site.exists("notes.txt"));
    }

    #[test]
    fn test_home_page() {
        let (site, _) = full_site();
        let home = site.read("index.html");
        let pos = |needle: &str| home.find(needle).unwrap();
        assert!(pos("<h3>2023</h3>") < pos("Writing a tiny database"));
        assert!(pos("Writing a tiny database") < pos("<h3>2021</h3>"));
        assert!(pos("<h3>2021</h3>") < pos("Learning Go"));
        assert!(home.contains("<title>Notes on software development</title>"));
        assert!(home.contains(r#"<body class="hide-on-index">"#));
        assert!(home.contains("google-site-verification"));
        assert!(home.contains(r#"class="tag">go (2)</a>"#));
        assert!(!home.contains("external ("));
    }

    #[test]
    fn test_feed_sitemap_and_robots() {
        let (site, _) = full_site();
        let rss = site.read("rss.xml");
        assert!(rss.find("tiny-db.html").unwrap() < rss.find("learning-go.html").unwrap());
        assert!(rss.contains("<pubDate>Sun, 5 Mar 2023 00:00:00 +0000</pubDate>"));
        assert!(rss.contains("<title>Notes on software development</title>"));
        assert!(!rss.contains(FEEDBACK_STYLE));

        let sitemap = site.read("sitemap.xml");
        assert!(sitemap.contains("<lastmod>2023-03-05</lastmod>"));
        assert!(sitemap.contains("<loc>https://notes.example.com/learning-go.html</loc>"));
        assert!(sitemap.find("learning-go.html").unwrap() < sitemap.find("tiny-db.html").unwrap());

        assert!(site.read("robots.txt").ends_with("Sitemap: https://notes.example.com/sitemap.xml"));
    }

    #[test]
    fn test_tag_pages() {
        let (site, _) = full_site();
        let all = site.read("tags/index.html");
        assert!(all.contains("<title>All Topics</title>"));
        assert!(all.contains(r#"<a href="/tags/go.html" class="tag tag--common">go (2)</a>"#));
        assert!(all.contains("external (1)"));

        let go = site.read("tags/go.html");
        assert!(go.contains("<h1>go</h1>"));
        assert!(go.find("Writing a tiny database").unwrap() < go.find("Learning Go").unwrap());
        assert!(site.exists("tags/databases.html"));
        assert!(site.exists("tags/external.html"));
    }

    #[test]
    fn test_assets_are_mirrored() {
        let (site, _) = full_site();
        assert!(site.exists("style.css"));
        assert!(site.dir.path().join("home").join("style.css").exists());
    }

    #[test]
    fn test_assembly_and_untagged_code_blocks() {
        let post = "# Hello from the kernel\n\n## April 2, 2024\n\n###### assembly\n\n\
            ```assembly\n_start:\n    mov rax, 60\n    syscall\n```\n\n\
            ```\n#include <stdio.h>\nint main() { return 0; }\n```\n";
        let site = setup(&[("exit.html", post)]);
        build_site(&site.cfg).unwrap();
        let page = site.read("exit.html");
        assert!(page.contains("syscall"));
        assert!(page.contains("<span style="));
        assert!(page.contains("stdio.h"));
    }

    #[test]
    fn test_bad_date_is_fatal() {
        let site = setup(&[("broken.html", "# Broken\n\n## Someday soon\n\ntext\n")]);
        let err = build_site(&site.cfg).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("broken.html"));
        assert!(msg.contains("Someday soon"));
    }

    #[test]
    fn test_missing_template() {
        let site = setup(&[]);
        fs::remove_file(&site.cfg.paths.template).unwrap();
        assert!(build_site(&site.cfg).is_err());
    }
}
