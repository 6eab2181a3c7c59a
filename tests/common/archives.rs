//! On-disk archive fixtures: `.war` files and expanded directories with
//! real class files.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Writes just enough of the JVM class-file format for the class reader:
/// names, superclass, interfaces and runtime-visible annotations with an
/// optional string `value`.
#[derive(Default)]
pub struct ClassBytes {
    pool: Vec<Vec<u8>>,
    name: String,
    superclass: Option<String>,
    interfaces: Vec<String>,
    annotations: Vec<(String, Option<String>)>,
    value_nesting: usize,
}

impl ClassBytes {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            superclass: Some("java.lang.Object".to_string()),
            ..Self::default()
        }
    }

    pub fn extends(mut self, name: &str) -> Self {
        self.superclass = Some(name.to_string());
        self
    }

    pub fn implements(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn annotated(mut self, name: &str, value: Option<&str>) -> Self {
        self.annotations
            .push((name.to_string(), value.map(str::to_string)));
        self
    }

    /// Wrap annotation values in `levels` single-element arrays
    pub fn value_nesting(mut self, levels: usize) -> Self {
        self.value_nesting = levels;
        self
    }

    fn utf8(&mut self, value: &str) -> u16 {
        let mut entry = vec![1];
        entry.extend_from_slice(&(value.len() as u16).to_be_bytes());
        entry.extend_from_slice(value.as_bytes());
        self.pool.push(entry);
        self.pool.len() as u16
    }

    fn class_ref(&mut self, dotted: &str) -> u16 {
        let name = self.utf8(&dotted.replace('.', "/"));
        let mut entry = vec![7];
        entry.extend_from_slice(&name.to_be_bytes());
        self.pool.push(entry);
        self.pool.len() as u16
    }

    pub fn build(mut self) -> Vec<u8> {
        let name = self.name.clone();
        let this_class = self.class_ref(&name);
        let super_class = match self.superclass.clone() {
            Some(superclass) => self.class_ref(&superclass),
            None => 0,
        };
        let interfaces: Vec<u16> = self
            .interfaces
            .clone()
            .iter()
            .map(|i| self.class_ref(i))
            .collect();

        let mut attribute = Vec::new();
        if !self.annotations.is_empty() {
            let attribute_name = self.utf8("RuntimeVisibleAnnotations");
            let mut body = (self.annotations.len() as u16).to_be_bytes().to_vec();
            for (annotation, value) in self.annotations.clone() {
                let type_index = self.utf8(&format!("L{};", annotation.replace('.', "/")));
                body.extend_from_slice(&type_index.to_be_bytes());
                match value {
                    Some(value) => {
                        let element = self.utf8("value");
                        let value = self.utf8(&value);
                        body.extend_from_slice(&1u16.to_be_bytes());
                        body.extend_from_slice(&element.to_be_bytes());
                        for _ in 0..self.value_nesting {
                            body.push(b'[');
                            body.extend_from_slice(&1u16.to_be_bytes());
                        }
                        body.push(b's');
                        body.extend_from_slice(&value.to_be_bytes());
                    }
                    None => body.extend_from_slice(&0u16.to_be_bytes()),
                }
            }
            attribute.extend_from_slice(&attribute_name.to_be_bytes());
            attribute.extend_from_slice(&(body.len() as u32).to_be_bytes());
            attribute.extend_from_slice(&body);
        }

        let mut out = 0xCAFE_BABEu32.to_be_bytes().to_vec();
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&61u16.to_be_bytes());
        out.extend_from_slice(&((self.pool.len() + 1) as u16).to_be_bytes());
        for entry in &self.pool {
            out.extend_from_slice(entry);
        }
        out.extend_from_slice(&0x0021u16.to_be_bytes());
        out.extend_from_slice(&this_class.to_be_bytes());
        out.extend_from_slice(&super_class.to_be_bytes());
        out.extend_from_slice(&(interfaces.len() as u16).to_be_bytes());
        for index in interfaces {
            out.extend_from_slice(&index.to_be_bytes());
        }
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        let attribute_count: u16 = if attribute.is_empty() { 0 } else { 1 };
        out.extend_from_slice(&attribute_count.to_be_bytes());
        out.extend_from_slice(&attribute);
        out
    }
}

pub fn class_entry(name: &str) -> String {
    format!("WEB-INF/classes/{}.class", name.replace('.', "/"))
}

/// Archive content described as entry path -> bytes
#[derive(Default)]
pub struct WarContent {
    entries: Vec<(String, Vec<u8>)>,
}

impl WarContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, class: ClassBytes) -> Self {
        let path = class_entry(&class.name);
        self.entries.push((path, class.build()));
        self
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.entries
            .push((path.to_string(), content.as_bytes().to_vec()));
        self
    }

    /// Write as a zip archive named `file_name` inside `dir`
    pub fn write_war(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        let file = fs::File::create(&path).expect("create war");
        let mut zip = ZipWriter::new(file);
        for (name, bytes) in &self.entries {
            zip.start_file(name.as_str(), SimpleFileOptions::default())
                .expect("start entry");
            zip.write_all(bytes).expect("write entry");
        }
        zip.finish().expect("finish war");
        path
    }

    /// Write as an expanded directory named `dir_name` inside `dir`
    pub fn write_expanded(&self, dir: &Path, dir_name: &str) -> PathBuf {
        let root = dir.join(dir_name);
        for (name, bytes) in &self.entries {
            let path = root.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent");
            }
            fs::write(&path, bytes).expect("write file");
        }
        root
    }
}

/// JAX-RS application with one resource and one plain class
pub fn rest_war() -> WarContent {
    WarContent::new()
        .class(
            ClassBytes::new("com.example.Api")
                .extends("jakarta.ws.rs.core.Application")
                .annotated("jakarta.ws.rs.ApplicationPath", Some("/api")),
        )
        .class(
            ClassBytes::new("com.example.Orders").annotated("jakarta.ws.rs.Path", Some("/orders")),
        )
        .class(ClassBytes::new("com.example.Order").implements("java.io.Serializable"))
        .file("WEB-INF/lib/jackson.jar", "not really a jar")
}

/// Static site, no classes
pub fn html_war() -> WarContent {
    WarContent::new()
        .file("index.html", "<h1>Welcome</h1>")
        .file("about.html", "<p>About</p>")
}

/// Servlet application declared through `web.xml` and an annotated servlet
pub fn servlet_war() -> WarContent {
    WarContent::new()
        .file(
            "WEB-INF/web.xml",
            r#"<web-app xmlns="https://jakarta.ee/xml/ns/jakartaee" version="6.0"></web-app>"#,
        )
        .class(
            ClassBytes::new("com.example.HelloServlet")
                .extends("jakarta.servlet.http.HttpServlet")
                .annotated("jakarta.servlet.annotation.WebServlet", Some("/hello")),
        )
}
