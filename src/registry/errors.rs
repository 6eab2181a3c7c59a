use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Module already registered: {0}")]
    DuplicateModule(String),

    #[error("Sniffer already registered: {0}")]
    DuplicateSniffer(String),

    #[error("Invalid module name {name:?}: {reason}")]
    InvalidModuleName { name: String, reason: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;
