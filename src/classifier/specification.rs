use serde::{Deserialize, Serialize};
use std::fmt;

/// Technology capability a module can serve or a sniffer can detect
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Specification {
    Servlet,
    Rest,
    Html,
    Jsp,
    WebSocket,
    /// Tag contributed by a collaborator module outside the built-in set
    Custom(String),
}

impl Specification {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Servlet => "SERVLET",
            Self::Rest => "REST",
            Self::Html => "HTML",
            Self::Jsp => "JSP",
            Self::WebSocket => "WEBSOCKET",
            Self::Custom(tag) => tag,
        }
    }
}

impl fmt::Display for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Specification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Specification tag cannot be empty".to_string());
        }
        Ok(match trimmed.to_ascii_uppercase().as_str() {
            "SERVLET" => Self::Servlet,
            "REST" => Self::Rest,
            "HTML" => Self::Html,
            "JSP" => Self::Jsp,
            "WEBSOCKET" => Self::WebSocket,
            _ => Self::Custom(trimmed.to_string()),
        })
    }
}
