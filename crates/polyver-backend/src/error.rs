use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Language identifier is invalid: {identifier:?}")]
    InvalidIdentifier { identifier: String },

    #[error("Language identifier is reserved for a built-in language: {identifier}")]
    ReservedIdentifier { identifier: String },

    #[error("A language with identifier {identifier} is already registered")]
    DuplicateIdentifier { identifier: String },

    #[error("Language not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Built-in language cannot be removed: {identifier}")]
    BuiltInRemoval { identifier: String },

    #[error("Built-in language cannot be edited: {identifier}")]
    BuiltInModification { identifier: String },
}

impl RegistryError {
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::InvalidIdentifier { identifier }
            | Self::ReservedIdentifier { identifier }
            | Self::DuplicateIdentifier { identifier }
            | Self::NotFound { identifier }
            | Self::BuiltInRemoval { identifier }
            | Self::BuiltInModification { identifier } => identifier,
        }
    }
}
