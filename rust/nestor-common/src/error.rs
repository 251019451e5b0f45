use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns `true` if the error reports a record or projection that does not
    /// conform to the schema.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self.kind(), ErrorKind::SchemaMismatch { .. })
    }

    /// Returns `true` if the error reports a read past the end of a column.
    pub fn is_store_underrun(&self) -> bool {
        matches!(self.kind(), ErrorKind::StoreUnderrun { .. })
    }

    /// Returns `true` if the error reports a malformed schema tree.
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration { .. })
    }

    pub fn schema_mismatch(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::SchemaMismatch {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn store_underrun(column: impl Into<String>, position: u64, len: u64) -> Error {
        Error(
            ErrorKind::StoreUnderrun {
                column: column.into(),
                position,
                len,
            }
            .into(),
        )
    }

    pub fn configuration(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Configuration {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("schema mismatch for '{element}': {message}")]
    SchemaMismatch { element: String, message: String },

    #[error("column '{column}' underrun: position {position} is past the end ({len} rows)")]
    StoreUnderrun {
        column: String,
        position: u64,
        len: u64,
    },

    #[error("invalid schema configuration: {message}")]
    Configuration { message: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid storage format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(_: std::convert::Infallible) -> Self {
        Error::invalid_arg("conversion", "infallible")
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};

    #[test]
    fn test_error_kinds() {
        let err = Error::schema_mismatch("name.url", "expected string");
        assert!(err.is_schema_mismatch());
        assert_eq!(
            err.to_string(),
            "schema mismatch for 'name.url': expected string"
        );

        let err = Error::store_underrun("links.forward", 3, 3);
        assert!(err.is_store_underrun());
        assert!(matches!(
            err.into_kind(),
            ErrorKind::StoreUnderrun { position: 3, .. }
        ));

        assert!(Error::configuration("cycle").is_configuration());
    }
}
