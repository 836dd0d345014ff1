use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Paths {
    pub posts_dir: PathBuf,
    pub output_dir: PathBuf,
    pub template: PathBuf,
    pub mail_snippet: PathBuf,
    /// Extension of the files picked up from `posts_dir`, without the dot
    pub post_extension: String,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            posts_dir: PathBuf::from("posts"),
            output_dir: PathBuf::from("docs"),
            template: PathBuf::from("template.html"),
            mail_snippet: PathBuf::from("mail.html"),
            post_extension: "html".to_string(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Site {
    pub base_url: String,
    pub title: String,
    pub author: String,
    pub email: String,
    pub language: String,
    /// Extra `<meta>` markup, only injected in the home page
    pub meta: String,
    pub frequent_tag_limit: usize,
}

impl Default for Site {
    fn default() -> Self {
        Site {
            base_url: "https://notes.eatonphil.com/".to_string(),
            title: "Notes on software development".to_string(),
            author: "Phil Eaton".to_string(),
            email: "me@eatonphil.com".to_string(),
            language: "en".to_string(),
            meta: r#"<meta name="google-site-verification" content="s-Odt0Dj7WZzEk6hLV28wLyR5LeGQFoopUV3IDNO6bM" />"#.to_string(),
            frequent_tag_limit: 20,
        }
    }
}

impl Site {
    /// Base URL, always ending with a slash
    pub fn root_url(&self) -> String {
        if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        }
    }

    /// Absolute URL of a page, given its path relative to the output directory
    pub fn page_url(&self, relative: &str) -> String {
        format!("{}{}", self.root_url(), relative.trim_start_matches('/'))
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Highlight {
    pub theme: String,
    /// Fence languages renamed before the syntax lookup
    pub aliases: BTreeMap<String, String>,
}

impl Default for Highlight {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert("assembly".to_string(), "nasm".to_string());
        Highlight {
            theme: "InspiredGitHub".to_string(),
            aliases,
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Asset {
    pub file: PathBuf,
    /// Directories that receive an extra copy of the file
    #[serde(default)]
    pub mirrors: Vec<PathBuf>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Log {
    pub level: LogLevel,
    #[serde(default)]
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SiteConfig {
    pub paths: Paths,
    pub site: Site,
    pub highlight: Highlight,
    pub assets: Vec<Asset>,
    pub log: Option<Log>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            paths: Paths::default(),
            site: Site::default(),
            highlight: Highlight::default(),
            assets: vec![Asset {
                file: PathBuf::from("style.css"),
                mirrors: ["../lists", "../letters", "../home"].iter().map(PathBuf::from).collect(),
            }],
            log: None,
        }
    }
}

impl SiteConfig {
    /// Makes every relative path relative to `base_dir` and expands `${exe_dir}`
    pub fn resolve_paths(mut self, base_dir: &Path) -> io::Result<SiteConfig> {
        self.paths.posts_dir = resolve_path(base_dir, self.paths.posts_dir)?;
        self.paths.output_dir = resolve_path(base_dir, self.paths.output_dir)?;
        self.paths.template = resolve_path(base_dir, self.paths.template)?;
        self.paths.mail_snippet = resolve_path(base_dir, self.paths.mail_snippet)?;

        let mut assets = Vec::with_capacity(self.assets.len());
        for asset in self.assets {
            let file = resolve_path(base_dir, asset.file)?;
            let mirrors = asset.mirrors.into_iter()
                .map(|m| resolve_path(base_dir, m))
                .collect::<io::Result<Vec<_>>>()?;
            assets.push(Asset { file, mirrors });
        }
        self.assets = assets;

        if let Some(mut log) = self.log {
            log.location = match log.location {
                Some(location) => Some(resolve_path(base_dir, location)?),
                None => None,
            };
            self.log = Some(log);
        }

        Ok(self)
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub sender: String,
    pub display_name: String,
    /// Name of the environment variable holding the SMTP password
    pub password_env: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        MailConfig {
            server: "mail.privateemail.com".to_string(),
            port: 587,
            sender: "phil@eatonphil.com".to_string(),
            display_name: "Phil Eaton".to_string(),
            password_env: "NPP".to_string(),
        }
    }
}

impl MailConfig {
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.display_name, self.sender)
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct MailSettings {
    pub mail: MailConfig,
    pub log: Option<Log>,
}

fn resolve_path(base_dir: &Path, path: PathBuf) -> io::Result<PathBuf> {
    let path = parse_path(path)?;
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(base_dir.join(path))
    }
}

fn parse_path(path: PathBuf) -> io::Result<PathBuf> {
    if !path.starts_with("${exe_dir}") {
        return Ok(path);
    }

    let cur_exe = env::current_exe()?;
    let exe_dir = cur_exe.parent()
        .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "Executable has no parent directory"))?;
    let rest = path.strip_prefix("${exe_dir}")
        .map_err(|e| io::Error::new(ErrorKind::InvalidInput, e.to_string()))?;
    Ok(exe_dir.join(rest))
}

pub fn parse_config<T: DeserializeOwned>(cfg_content: &str) -> io::Result<T> {
    match toml::from_str::<T>(cfg_content) {
        Ok(cfg) => Ok(cfg),
        Err(e) => Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    }
}

pub fn read_config<T: DeserializeOwned>(cfg_path: &Path) -> io::Result<T> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}

/// Reads a site configuration and resolves its paths against the file's directory
pub fn read_site_config(cfg_path: &Path) -> io::Result<SiteConfig> {
    let cfg: SiteConfig = read_config(cfg_path)?;
    let base_dir = match cfg_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    cfg.resolve_paths(&base_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg: SiteConfig = parse_config("").unwrap();
        assert_eq!(cfg.paths.posts_dir, PathBuf::from("posts"));
        assert_eq!(cfg.paths.output_dir, PathBuf::from("docs"));
        assert_eq!(cfg.paths.post_extension, "html");
        assert_eq!(cfg.site.frequent_tag_limit, 20);
        assert_eq!(cfg.highlight.aliases.get("assembly").map(String::as_str), Some("nasm"));
        assert_eq!(cfg.assets.len(), 1);
        assert_eq!(cfg.assets[0].mirrors.len(), 3);
        assert!(cfg.log.is_none());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r##"
[paths]
posts_dir = "content"

[site]
base_url = "https://example.com"
title = "Example"

[[assets]]
file = "main.css"

[log]
level = "Debug"
"##;
        let cfg: SiteConfig = parse_config(toml_str).unwrap();
        assert_eq!(cfg.paths.posts_dir, PathBuf::from("content"));
        assert_eq!(cfg.paths.output_dir, PathBuf::from("docs"));
        assert_eq!(cfg.site.title, "Example");
        assert_eq!(cfg.site.author, "Phil Eaton");
        assert_eq!(cfg.assets, vec![Asset { file: PathBuf::from("main.css"), mirrors: vec![] }]);
        assert!(matches!(cfg.log.map(|l| l.level), Some(LogLevel::Debug)));
    }

    #[test]
    fn test_page_url() {
        let mut site = Site::default();
        site.base_url = "https://example.com".to_string();
        assert_eq!(site.page_url("hello.html"), "https://example.com/hello.html");
        assert_eq!(site.page_url("/tags/go.html"), "https://example.com/tags/go.html");
        site.base_url = "https://example.com/".to_string();
        assert_eq!(site.page_url("hello.html"), "https://example.com/hello.html");
    }

    #[test]
    fn test_resolve_paths() {
        let cfg = SiteConfig::default().resolve_paths(Path::new("/srv/notes")).unwrap();
        assert_eq!(cfg.paths.posts_dir, PathBuf::from("/srv/notes/posts"));
        assert_eq!(cfg.paths.template, PathBuf::from("/srv/notes/template.html"));
        assert_eq!(cfg.assets[0].file, PathBuf::from("/srv/notes/style.css"));
        assert_eq!(cfg.assets[0].mirrors[0], PathBuf::from("/srv/notes/../lists"));
    }

    #[test]
    fn test_sample_config() {
        let sample = include_str!("../res/notesmith.toml");
        let cfg: SiteConfig = parse_config(sample).unwrap();
        assert_eq!(cfg.site.base_url, "https://notes.eatonphil.com/");
        assert_eq!(cfg.assets[0].mirrors.len(), 3);
        let settings: MailSettings = parse_config(sample).unwrap();
        assert_eq!(settings.mail.password_env, "NPP");
    }

    #[test]
    fn test_mail_settings() {
        let settings: MailSettings = parse_config("[mail]\nport = 2525\n").unwrap();
        assert_eq!(settings.mail.port, 2525);
        assert_eq!(settings.mail.server, "mail.privateemail.com");
        assert_eq!(settings.mail.from_header(), "Phil Eaton <phil@eatonphil.com>");
    }
}
