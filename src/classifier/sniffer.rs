use super::class_descriptor::ClassDescriptor;
use super::specification::Specification;
use serde::Serialize;
use std::collections::BTreeMap;

/// Detector bound to one or more specification tags.
///
/// A sniffer accumulates state across a single classification run: every
/// class or descriptor that triggers it may add deployment metadata. Fresh
/// instances are created for each run, so implementations need not be
/// shareable between threads.
pub trait Sniffer: Send {
    /// Sniffer type identifier, matching `Module::sniffer_type`
    fn name(&self) -> &str;

    fn detected_specifications(&self) -> Vec<Specification>;

    /// Whether this sniffer can decide from descriptor files alone
    fn is_fast_detection(&self) -> bool {
        false
    }

    /// Whether this sniffer wants to see loaded classes
    fn detects_classes(&self) -> bool {
        true
    }

    fn triggered_by_class(&mut self, _class: &ClassDescriptor) -> bool {
        false
    }

    fn triggered_by_descriptor(&mut self, _name: &str, _content: &str) -> bool {
        false
    }

    /// Metadata collected while triggering
    fn deployment_data(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// What a triggered sniffer contributed to a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnifferReport {
    pub name: String,
    pub specifications: Vec<Specification>,
    pub class_hits: Vec<String>,
    pub descriptor_hits: Vec<String>,
    pub data: BTreeMap<String, String>,
}

impl SnifferReport {
    pub fn trigger_count(&self) -> usize {
        self.class_hits.len() + self.descriptor_hits.len()
    }
}
