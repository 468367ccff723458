//! Error types for the conversion engine

use thiserror::Error;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while converting
#[derive(Debug, Error)]
pub enum Error {
    /// The container factory cannot produce an instance for this type
    #[error("Unsupported destination shape: {0}")]
    UnsupportedShape(String),

    /// The top-level destination token cannot be converted into
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// A required argument was null
    #[error("Required argument is null: {0}")]
    NullArgument(&'static str),

    /// No handler converts a value into a slot that cannot hold null
    #[error("No conversion from {from} to {to}")]
    NoConversion { from: String, to: String },

    /// A class name that is not in the registry
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// Name lookup of an enum constant failed
    #[error("No enum constant {class}.{constant}")]
    UnknownEnumConstant { class: String, constant: String },

    /// Member access refused by the configured access capability
    #[error("Cannot access {member}: {reason}")]
    Access { member: String, reason: String },

    /// A class could not be instantiated
    #[error("Cannot instantiate {class}: {reason}")]
    Instantiation { class: String, reason: String },

    /// A handler failed while converting a field pair
    #[error("Handler {handler} failed converting {source_field} into {destination_field}")]
    Handler {
        handler: &'static str,
        source_field: String,
        destination_field: String,
        #[source]
        cause: Box<Error>,
    },

    /// A user-supplied function, constructor or factory method failed
    #[error("Callback failed: {0}")]
    Callback(#[from] anyhow::Error),

    /// Settings could not be read
    #[error("Settings error: {0}")]
    Settings(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// The innermost error beneath any handler wrapping.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Handler { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_handler_chain() {
        let inner = Error::UnknownEnumConstant {
            class: "Status".into(),
            constant: "DELETED".into(),
        };
        let wrapped = Error::Handler {
            handler: "outer",
            source_field: "a".into(),
            destination_field: "b".into(),
            cause: Box::new(Error::Handler {
                handler: "inner",
                source_field: "c".into(),
                destination_field: "d".into(),
                cause: Box::new(inner),
            }),
        };
        assert!(matches!(
            wrapped.root_cause(),
            Error::UnknownEnumConstant { .. }
        ));
        assert!(wrapped.to_string().contains("outer"));
    }
}
