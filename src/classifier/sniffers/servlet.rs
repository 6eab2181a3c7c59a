use crate::classifier::{ClassDescriptor, Sniffer, Specification};
use crate::constants::{archive, metadata, sniffers};
use std::collections::BTreeMap;

const COMPONENT_ANNOTATIONS: [&str; 3] = ["WebServlet", "WebFilter", "WebListener"];

/// Detects servlet applications from `WEB-INF/web.xml` or annotated
/// servlet components.
#[derive(Debug, Default)]
pub struct ServletSniffer {
    descriptor: Option<String>,
    version: Option<String>,
    components: Vec<String>,
}

impl ServletSniffer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Value of the `version` attribute on the `<web-app>` element
fn web_app_version(content: &str) -> Option<String> {
    let start = content.find("<web-app")?;
    let tag_end = content[start..].find('>')? + start;
    let tag = &content[start..tag_end];
    let attr = tag.find("version=")? + "version=".len();
    let rest = &tag[attr..];
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    let end = value.find(quote)?;
    Some(value[..end].to_string())
}

impl Sniffer for ServletSniffer {
    fn name(&self) -> &str {
        sniffers::SERVLET
    }

    fn detected_specifications(&self) -> Vec<Specification> {
        vec![Specification::Servlet]
    }

    fn is_fast_detection(&self) -> bool {
        true
    }

    fn triggered_by_class(&mut self, class: &ClassDescriptor) -> bool {
        let is_component = COMPONENT_ANNOTATIONS
            .iter()
            .any(|a| class.has_annotation(a))
            || class.extends("HttpServlet");
        if is_component {
            self.components.push(class.name.clone());
        }
        is_component
    }

    fn triggered_by_descriptor(&mut self, name: &str, content: &str) -> bool {
        if name != archive::WEB_XML {
            return false;
        }
        self.descriptor = Some(name.to_string());
        self.version = web_app_version(content);
        true
    }

    fn deployment_data(&self) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        if let Some(descriptor) = &self.descriptor {
            data.insert(metadata::SERVLET_DESCRIPTOR.to_string(), descriptor.clone());
        }
        if let Some(version) = &self.version {
            data.insert(metadata::SERVLET_VERSION.to_string(), version.clone());
        }
        if !self.components.is_empty() {
            data.insert(
                metadata::SERVLET_COMPONENTS.to_string(),
                self.components.join(","),
            );
        }
        data
    }
}
