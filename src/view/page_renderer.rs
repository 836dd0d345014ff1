use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ramhorns::Template;

/// Values for every placeholder of the page template. There is no `Default`:
/// each page states all of them, empty or not.
#[derive(ramhorns::Content)]
pub struct PageVars<'a> {
    pub post: &'a str,
    pub title: &'a str,
    pub subtitle: &'a str,
    pub real_subtitle: &'a str,
    /// Page label, ends up in `<title>`
    pub tag: &'a str,
    pub tags: &'a str,
    pub frequent_tags: &'a str,
    pub full_url: &'a str,
    pub hide_on_index: &'a str,
    pub meta: &'a str,
    pub mail: &'a str,
}

pub struct PageRenderer<'a> {
    template: Template<'a>,
    mail: String,
}

impl<'a> PageRenderer<'a> {
    pub fn new(page_tpl_src: &'a str, mail: String) -> Result<PageRenderer<'a>> {
        let template = Template::new(page_tpl_src)
            .map_err(|e| anyhow!("Error parsing page template: {}", e))?;

        Ok(PageRenderer {
            template,
            mail,
        })
    }

    /// Mail signup markup shared by every page
    pub fn mail(&self) -> &str {
        self.mail.as_str()
    }

    pub fn render(&self, vars: &PageVars) -> String {
        self.template.render(vars)
    }

    pub fn write(&self, path: &Path, vars: &PageVars) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Error creating directory {}", parent.display()))?;
        }
        fs::write(path, self.render(vars))
            .with_context(|| format!("Error writing {}", path.display()))
    }
}
