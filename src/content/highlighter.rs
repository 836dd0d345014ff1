use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::{SyntaxDefinition, SyntaxReference, SyntaxSet};

use crate::config::Highlight;

/// Bundled on top of the syntect defaults, which have no assembly syntax
const NASM_SYNTAX: &str = include_str!("../../res/syntaxes/nasm.sublime-syntax");

lazy_static! {
    /// Syntax token and the markers that vote for it when a block has no language.
    /// Each marker that matches anywhere in the block counts once.
    static ref CONTENT_MARKERS: Vec<(&'static str, Vec<Regex>)> = vec![
        ("c", markers(&[r#"(?m)^\s*#include\s*[<"]"#, r"\bint\s+main\s*\(", r"\bprintf\s*\(", r"\b(?:malloc|free|sizeof)\s*\(", r"\bstruct\s+\w+\s*\{"])),
        ("rs", markers(&[r"\bfn\s+\w+", r"\blet\s+mut\b", r"\bimpl\b", r"\bpub\s+(?:fn|struct|enum)\b", r"\w+!\(", r"->\s*(?:Result|Option|Self)\b"])),
        ("go", markers(&[r"(?m)^package\s+\w+", r"\bfunc\s", r":=", r"\bfmt\.\w+\(", r"\berr\s*!=\s*nil\b"])),
        ("py", markers(&[r"(?m)^\s*def\s+\w+\s*\(.*\)\s*:", r"(?m)^\s*(?:from\s+\w+\s+)?import\s+\w+", r"\bself\.", r"(?m)^\s*(?:if|for|while|class)\b.*:\s*$", r"\bprint\("])),
        ("js", markers(&[r"\b(?:const|let|var)\s+\w+\s*=", r"=>", r"\bfunction\s*\w*\s*\(", r"\bconsole\.log\(", r"\brequire\(|\bexport\s"])),
        ("java", markers(&[r"\bpublic\s+(?:static\s+)?(?:class|void)\b", r"\bSystem\.out\.", r"\bprivate\s+\w+\s+\w+;"])),
        ("sql", markers(&[r"(?i)\bselect\b[\s\S]*\bfrom\b", r"(?i)\bcreate\s+table\b", r"(?i)\binsert\s+into\b", r"(?i)\bwhere\b"])),
        ("sh", markers(&[r"(?m)^\s*\$\s", r"(?m)^\s*(?:sudo|cd|ls|git|cargo|make|export|curl|apt|brew)\s", r"\becho\s"])),
        ("nasm", markers(&[r"(?im)^\s*(?:mov|push|pop|syscall|lea|xor)\s", r"(?i)\b(?:eax|ebx|rax|rbx|rdi|rsi|rsp|rbp)\b", r"(?im)^\s*section\s+\.\w+"])),
        ("json", markers(&[r"^\s*[\{\[]", r#""\w+"\s*:\s*"#])),
    ];
}

fn markers(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

/// Best scoring syntax token for an untagged block, if any marker matched.
/// Earlier entries win ties.
fn guess_token(code: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for (token, markers) in CONTENT_MARKERS.iter() {
        let score = markers.iter().filter(|m| m.is_match(code)).count();
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((token, score));
        }
    }
    best.map(|(token, _)| token)
}

pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
    aliases: BTreeMap<String, String>,
}

impl Highlighter {
    pub fn new(config: &Highlight) -> Result<Highlighter> {
        let mut builder = SyntaxSet::load_defaults_newlines().into_builder();
        let nasm = SyntaxDefinition::load_from_str(NASM_SYNTAX, true, Some("nasm"))
            .context("Error loading the NASM syntax")?;
        builder.add(nasm);
        let syntaxes = builder.build();

        // remove() hands back an owned Theme
        let theme = ThemeSet::load_defaults()
            .themes
            .remove(&config.theme)
            .ok_or_else(|| anyhow!("Unknown highlighting theme \"{}\"", config.theme))?;

        Ok(Highlighter {
            syntaxes,
            theme,
            aliases: config.aliases.clone(),
        })
    }

    /// Highlights a code block. Without a language, the syntax is guessed from
    /// a shebang or modeline, then from markers over the whole block, and
    /// falls back to plain text. An unknown language is an error.
    pub fn highlight(&self, code: &str, language: Option<&str>) -> Result<String> {
        let syntax = self.find_syntax(code, language)?;
        Ok(highlighted_html_for_string(code, &self.syntaxes, syntax, &self.theme)?)
    }

    fn find_syntax(&self, code: &str, language: Option<&str>) -> Result<&SyntaxReference> {
        match language {
            Some(lang) => {
                let token = self.aliases.get(lang).map(String::as_str).unwrap_or(lang);
                self.syntaxes.find_syntax_by_token(token).ok_or_else(|| {
                    if token == lang {
                        anyhow!("No syntax found for language \"{}\"", lang)
                    } else {
                        anyhow!("No syntax found for language \"{}\" (requested as \"{}\")", token, lang)
                    }
                })
            }
            None => {
                let guessed = code.lines().next()
                    .and_then(|line| self.syntaxes.find_syntax_by_first_line(line))
                    .or_else(|| guess_token(code).and_then(|token| self.syntaxes.find_syntax_by_token(token)));
                Ok(guessed.unwrap_or_else(|| self.syntaxes.find_syntax_plain_text()))
            }
        }
    }
}
