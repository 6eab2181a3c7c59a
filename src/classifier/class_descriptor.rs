use std::collections::BTreeMap;

/// Runtime-visible annotation on a class, with its string-valued elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub name: String,
    pub values: BTreeMap<String, String>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// The `value` element, which annotations like `@Path("/x")` set implicitly
    pub fn value(&self) -> Option<&str> {
        self.values.get("value").map(String::as_str)
    }
}

/// What the classifier knows about one loaded class.
///
/// Names use dotted binary form (`com.example.Hello`, `jakarta.ws.rs.Path`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub name: String,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub annotations: Vec<Annotation>,
}

fn simple_name(name: &str) -> &str {
    name.rsplit(['.', '$']).next().unwrap_or(name)
}

fn name_matches(candidate: &str, wanted: &str) -> bool {
    if wanted.contains('.') {
        candidate == wanted
    } else {
        simple_name(candidate) == wanted
    }
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(Annotation::new(annotation));
        self
    }

    /// Add an annotation carrying a single `value` element
    pub fn with_annotation_value(
        mut self,
        annotation: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let mut annotation = Annotation::new(annotation);
        annotation.values.insert("value".to_string(), value.into());
        self.annotations.push(annotation);
        self
    }

    /// Simple (unqualified) class name
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// Find an annotation by simple name (`Path`) or fully-qualified
    /// name (`jakarta.ws.rs.Path`).
    pub fn annotation(&self, annotation: &str) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|a| name_matches(&a.name, annotation))
    }

    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotation(annotation).is_some()
    }

    pub fn extends(&self, superclass: &str) -> bool {
        self.superclass
            .as_deref()
            .is_some_and(|s| name_matches(s, superclass))
    }

    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| name_matches(i, interface))
    }
}
