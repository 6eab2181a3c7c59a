use crate::classifier::{Sniffer, Specification};
use crate::constants::{metadata, sniffers};
use std::collections::BTreeMap;

const WELCOME_FILES: [&str; 2] = ["index.html", "index.htm"];

pub fn is_html_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

/// Detects static HTML content; never loads classes.
#[derive(Debug, Default)]
pub struct HtmlSniffer {
    pages: Vec<String>,
}

impl HtmlSniffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn welcome_file(&self) -> Option<&str> {
        WELCOME_FILES
            .iter()
            .find_map(|w| self.pages.iter().find(|p| p.as_str() == *w))
            .or_else(|| self.pages.iter().min())
            .map(String::as_str)
    }
}

impl Sniffer for HtmlSniffer {
    fn name(&self) -> &str {
        sniffers::HTML
    }

    fn detected_specifications(&self) -> Vec<Specification> {
        vec![Specification::Html]
    }

    fn is_fast_detection(&self) -> bool {
        true
    }

    fn detects_classes(&self) -> bool {
        false
    }

    fn triggered_by_descriptor(&mut self, name: &str, _content: &str) -> bool {
        if !is_html_file(name) {
            return false;
        }
        self.pages.push(name.to_string());
        true
    }

    fn deployment_data(&self) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        if let Some(welcome) = self.welcome_file() {
            data.insert(metadata::HTML_WELCOME_FILE.to_string(), welcome.to_string());
            data.insert(metadata::HTML_PAGES.to_string(), self.pages.join(","));
        }
        data
    }
}
