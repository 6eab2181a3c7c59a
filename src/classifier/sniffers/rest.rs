use crate::classifier::{ClassDescriptor, Sniffer, Specification};
use crate::constants::{metadata, sniffers};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct RestSniffer {
    application_class: Option<String>,
    application_path: Option<String>,
    resources: Vec<String>,
}

impl RestSniffer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sniffer for RestSniffer {
    fn name(&self) -> &str {
        sniffers::REST
    }

    fn detected_specifications(&self) -> Vec<Specification> {
        vec![Specification::Rest]
    }

    fn triggered_by_class(&mut self, class: &ClassDescriptor) -> bool {
        let application_path = class
            .annotation("ApplicationPath")
            .map(|a| a.value().unwrap_or_default().to_string());

        if application_path.is_some() || class.extends("Application") {
            self.application_class = Some(class.name.clone());
            if application_path.is_some() {
                self.application_path = application_path;
            }
            return true;
        }

        if class.has_annotation("Path") {
            self.resources.push(class.name.clone());
            return true;
        }

        false
    }

    fn deployment_data(&self) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        if let Some(class) = &self.application_class {
            data.insert(metadata::REST_APPLICATION_CLASS.to_string(), class.clone());
        }
        if let Some(path) = &self.application_path {
            data.insert(metadata::REST_APPLICATION_PATH.to_string(), path.clone());
        }
        if !self.resources.is_empty() {
            data.insert(metadata::REST_RESOURCES.to_string(), self.resources.join(","));
        }
        data
    }
}
