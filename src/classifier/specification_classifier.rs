//! # Specification Classifier
//!
//! Runs an archive's content through a fresh set of sniffers and reports
//! which of them triggered, the union of their specification tags and the
//! merged deployment metadata.
//!
//! Fast-detection sniffers see the descriptor files first. Sniffers that
//! did not trigger there and can inspect classes are then offered every
//! class in the manifest; a class that cannot be loaded is skipped and the
//! pass continues. When no sniffer is left for the class pass the class
//! loader is never touched.

use super::class_loader::ClassLoader;
use super::sniffer::{Sniffer, SnifferReport};
use super::specification::Specification;
use crate::deployment::ContentManifest;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Outcome of one classification run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    /// Triggered sniffers, in the order they were supplied
    pub triggered: Vec<SnifferReport>,
    pub specifications: BTreeSet<Specification>,
    pub metadata: BTreeMap<String, String>,
    /// Classes the loader could not produce
    pub skipped_classes: Vec<String>,
}

impl ClassificationResult {
    pub fn is_empty(&self) -> bool {
        self.triggered.is_empty()
    }

    pub fn triggered_names(&self) -> Vec<&str> {
        self.triggered.iter().map(|r| r.name.as_str()).collect()
    }
}

struct Candidate {
    sniffer: Box<dyn Sniffer>,
    class_hits: Vec<String>,
    descriptor_hits: Vec<String>,
}

impl Candidate {
    fn triggered(&self) -> bool {
        !self.class_hits.is_empty() || !self.descriptor_hits.is_empty()
    }

    fn into_report(self) -> SnifferReport {
        SnifferReport {
            name: self.sniffer.name().to_string(),
            specifications: self.sniffer.detected_specifications(),
            data: self.sniffer.deployment_data(),
            class_hits: self.class_hits,
            descriptor_hits: self.descriptor_hits,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SpecificationClassifier;

impl SpecificationClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(
        &self,
        manifest: &ContentManifest,
        loader: &dyn ClassLoader,
        sniffers: Vec<Box<dyn Sniffer>>,
    ) -> ClassificationResult {
        let mut candidates: Vec<Candidate> = sniffers
            .into_iter()
            .map(|sniffer| Candidate {
                sniffer,
                class_hits: Vec::new(),
                descriptor_hits: Vec::new(),
            })
            .collect();

        for candidate in candidates
            .iter_mut()
            .filter(|c| c.sniffer.is_fast_detection())
        {
            for descriptor in &manifest.descriptors {
                if candidate
                    .sniffer
                    .triggered_by_descriptor(&descriptor.name, &descriptor.content)
                {
                    candidate.descriptor_hits.push(descriptor.name.clone());
                }
            }
        }

        let mut skipped_classes = Vec::new();
        let wants_classes = candidates
            .iter()
            .any(|c| c.sniffer.detects_classes() && !c.triggered());

        if wants_classes {
            let class_pass: Vec<bool> = candidates
                .iter()
                .map(|c| c.sniffer.detects_classes() && !c.triggered())
                .collect();

            for class_name in &manifest.classes {
                let class = match loader.load_class(class_name) {
                    Ok(class) => class,
                    Err(error) => {
                        warn!(class = %class_name, error = %error, "Skipping class during classification");
                        skipped_classes.push(class_name.clone());
                        continue;
                    }
                };

                for (candidate, _) in candidates
                    .iter_mut()
                    .zip(&class_pass)
                    .filter(|(_, in_pass)| **in_pass)
                {
                    if candidate.sniffer.triggered_by_class(&class) {
                        candidate.class_hits.push(class.name.clone());
                    }
                }
            }
        } else {
            debug!("No sniffer needs classes, skipping class pass");
        }

        let mut result = ClassificationResult {
            skipped_classes,
            ..ClassificationResult::default()
        };

        for candidate in candidates.into_iter().filter(Candidate::triggered) {
            let report = candidate.into_report();
            result
                .specifications
                .extend(report.specifications.iter().cloned());
            for (key, value) in &report.data {
                if let Some(previous) = result.metadata.insert(key.clone(), value.clone()) {
                    if previous != *value {
                        debug!(key = %key, sniffer = %report.name, "Deployment metadata overwritten");
                    }
                }
            }
            result.triggered.push(report);
        }

        debug!(
            triggered = ?result.triggered_names(),
            specifications = result.specifications.len(),
            skipped = result.skipped_classes.len(),
            "Classification complete"
        );
        result
    }
}
