use std::error;
use std::fmt;

/// Result type for relay operations using [`RelayError`] as the error type.
pub type RelayResult<T> = Result<T, RelayError>;

/// Main error type for relay operations.
///
/// A [`RelayError`] is either a single error, optionally carrying a dynamic
/// detail, or an aggregation of several errors collected from independent
/// task runners.
#[derive(Debug, Clone)]
pub struct RelayError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    WithDescriptionAndDetail(ErrorKind, &'static str, String),
    Many(Vec<RelayError>),
}

/// Categories of errors raised while polling, encoding and publishing rows.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    // Row source errors
    SourceConnectionFailed,
    SourceQueryFailed,
    SourceDecodeFailed,
    QueryLoadFailed,

    // Checkpoint errors
    CheckpointReadFailed,
    CheckpointWriteFailed,

    // Encoding errors
    SchemaNotFound,
    SchemaRegistryFailed,
    InvalidSchema,
    SerializationError,
    DeserializationError,

    // Publishing errors
    PublishFailed,
    DeliveryFailed,
    PublisherClosed,

    // Task & workflow errors
    UnsupportedTask,
    TaskRunnerPanic,
    InvalidState,

    // Configuration errors
    ConfigError,

    // Data & IO errors
    ConversionError,
    IoError,

    Unknown,
}

impl RelayError {
    /// Creates a [`RelayError`] containing multiple aggregated errors.
    pub fn many(errors: Vec<RelayError>) -> RelayError {
        RelayError {
            repr: ErrorRepr::Many(errors),
        }
    }

    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For multiple errors, returns the kind of the first error or [`ErrorKind::Unknown`]
    /// if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => kind,
            ErrorRepr::Many(ref errors) => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error, flattening aggregates.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => vec![kind],
            ErrorRepr::Many(ref errors) => errors
                .iter()
                .flat_map(|err| err.kinds())
                .collect::<Vec<_>>(),
        }
    }

    /// Returns the dynamic detail of this error or of the first aggregated error having one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::WithDescriptionAndDetail(_, _, ref detail) => Some(detail.as_str()),
            ErrorRepr::Many(ref errors) => errors.iter().find_map(|e| e.detail()),
            _ => None,
        }
    }
}

impl PartialEq for RelayError {
    fn eq(&self, other: &RelayError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::WithDescription(kind_a, _), ErrorRepr::WithDescription(kind_b, _)) => {
                kind_a == kind_b
            }
            (
                ErrorRepr::WithDescriptionAndDetail(kind_a, _, _),
                ErrorRepr::WithDescriptionAndDetail(kind_b, _, _),
            ) => kind_a == kind_b,
            (ErrorRepr::Many(errors_a), ErrorRepr::Many(errors_b)) => {
                errors_a.len() == errors_b.len()
                    && errors_a.iter().zip(errors_b.iter()).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.repr {
            ErrorRepr::WithDescription(kind, desc) => write!(f, "{kind:?}: {desc}"),
            ErrorRepr::WithDescriptionAndDetail(kind, desc, ref detail) => {
                write!(f, "{kind:?}: {desc} -> {detail}")
            }
            ErrorRepr::Many(ref errors) => match errors.as_slice() {
                [] => write!(f, "Multiple errors occurred (empty)"),
                [error] => fmt::Display::fmt(error, f),
                errors => {
                    write!(f, "Multiple errors occurred ({} total):", errors.len())?;
                    for (i, error) in errors.iter().enumerate() {
                        write!(f, "\n  {}: {}", i + 1, error)?;
                    }
                    Ok(())
                }
            },
        }
    }
}

impl error::Error for RelayError {}

impl From<(ErrorKind, &'static str)> for RelayError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> RelayError {
        RelayError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

impl From<(ErrorKind, &'static str, String)> for RelayError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> RelayError {
        RelayError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, desc, detail),
        }
    }
}

/// Aggregates a vector of errors, as collected when joining task runners.
impl<E> From<Vec<E>> for RelayError
where
    E: Into<RelayError>,
{
    fn from(errors: Vec<E>) -> RelayError {
        RelayError {
            repr: ErrorRepr::Many(errors.into_iter().map(Into::into).collect()),
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> RelayError {
        RelayError::from((ErrorKind::IoError, "I/O error occurred", err.to_string()))
    }
}

/// Maps [`serde_json::Error`] by category, registry payloads are the only JSON the relay reads.
impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> RelayError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        RelayError::from((kind, description, err.to_string()))
    }
}

impl From<chrono::ParseError> for RelayError {
    fn from(err: chrono::ParseError) -> RelayError {
        RelayError::from((
            ErrorKind::ConversionError,
            "Chrono parse failed",
            err.to_string(),
        ))
    }
}

/// Classifies [`sqlx::Error`] into connection, decode and query failures.
impl From<sqlx::Error> for RelayError {
    fn from(err: sqlx::Error) -> RelayError {
        let (kind, description) = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut => (
                ErrorKind::SourceConnectionFailed,
                "Database connection failed",
            ),
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => (ErrorKind::SourceDecodeFailed, "Row decoding failed"),
            _ => (ErrorKind::SourceQueryFailed, "Database operation failed"),
        };

        RelayError::from((kind, description, err.to_string()))
    }
}

impl From<apache_avro::Error> for RelayError {
    fn from(err: apache_avro::Error) -> RelayError {
        RelayError::from((
            ErrorKind::SerializationError,
            "Avro encoding failed",
            err.to_string(),
        ))
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> RelayError {
        let kind = if err.is_decode() {
            ErrorKind::DeserializationError
        } else {
            ErrorKind::SchemaRegistryFailed
        };

        RelayError::from((kind, "Schema registry request failed", err.to_string()))
    }
}

#[cfg(feature = "kafka")]
impl From<rdkafka::error::KafkaError> for RelayError {
    fn from(err: rdkafka::error::KafkaError) -> RelayError {
        RelayError::from((
            ErrorKind::PublishFailed,
            "Kafka operation failed",
            err.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bail, relay_error};

    #[test]
    fn test_simple_error_creation() {
        let err = RelayError::from((ErrorKind::CheckpointReadFailed, "Checkpoint read failed"));
        assert_eq!(err.kind(), ErrorKind::CheckpointReadFailed);
        assert_eq!(err.detail(), None);
        assert_eq!(err.kinds(), vec![ErrorKind::CheckpointReadFailed]);
    }

    #[test]
    fn test_error_with_detail() {
        let err = RelayError::from((
            ErrorKind::SourceQueryFailed,
            "Row query failed",
            "relation \"users\" does not exist".to_string(),
        ));
        assert_eq!(err.kind(), ErrorKind::SourceQueryFailed);
        assert_eq!(err.detail(), Some("relation \"users\" does not exist"));
    }

    #[test]
    fn test_multiple_errors() {
        let errors = vec![
            RelayError::from((ErrorKind::TaskRunnerPanic, "Runner panicked")),
            RelayError::from((ErrorKind::PublishFailed, "Publish failed")),
        ];
        let multi_err = RelayError::many(errors);

        assert_eq!(multi_err.kind(), ErrorKind::TaskRunnerPanic);
        assert_eq!(
            multi_err.kinds(),
            vec![ErrorKind::TaskRunnerPanic, ErrorKind::PublishFailed]
        );
        assert_eq!(multi_err.detail(), None);
    }

    #[test]
    fn test_empty_multiple_errors() {
        let multi_err = RelayError::many(vec![]);
        assert_eq!(multi_err.kind(), ErrorKind::Unknown);
        assert_eq!(multi_err.kinds(), vec![]);
    }

    #[test]
    fn test_error_equality_ignores_description() {
        let err1 = RelayError::from((ErrorKind::DeliveryFailed, "Broker rejected message"));
        let err2 = RelayError::from((ErrorKind::DeliveryFailed, "Message timed out"));
        let err3 = RelayError::from((ErrorKind::PublishFailed, "Queue full"));

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }

    #[test]
    fn test_error_display() {
        let err = relay_error!(
            ErrorKind::QueryLoadFailed,
            "Failed to open query file",
            "queries/user.sql"
        );
        let display_str = format!("{err}");
        assert!(display_str.contains("QueryLoadFailed"));
        assert!(display_str.contains("Failed to open query file"));
        assert!(display_str.contains("queries/user.sql"));
    }

    #[test]
    fn test_single_aggregated_error_displays_directly() {
        let err = RelayError::from(vec![RelayError::from((
            ErrorKind::InvalidState,
            "Pipeline already started",
        ))]);

        assert_eq!(format!("{err}"), "InvalidState: Pipeline already started");
    }

    #[test]
    fn test_multiple_errors_display() {
        let multi_err = RelayError::many(vec![
            RelayError::from((ErrorKind::SchemaNotFound, "Subject not found")),
            RelayError::from((ErrorKind::SerializationError, "Encoding failed")),
        ]);
        let display_str = format!("{multi_err}");
        assert!(display_str.contains("Multiple errors"));
        assert!(display_str.contains("2 total"));
    }

    #[test]
    fn test_bail_macro() {
        fn unsupported() -> RelayResult<()> {
            bail!(
                ErrorKind::UnsupportedTask,
                "Unsupported record type",
                "invoice"
            );
        }

        let err = unsupported().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedTask);
        assert_eq!(err.detail(), Some("invoice"));
    }

    #[test]
    fn test_sqlx_error_classification() {
        let err = RelayError::from(sqlx::Error::ColumnNotFound("country_code".to_string()));
        assert_eq!(err.kind(), ErrorKind::SourceDecodeFailed);

        let err = RelayError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), ErrorKind::SourceConnectionFailed);

        let err = RelayError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::SourceQueryFailed);
    }

    #[test]
    fn test_json_error_classification() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err = RelayError::from(json_err);
        assert_eq!(err.kind(), ErrorKind::DeserializationError);
        assert!(err.detail().unwrap().contains("expected"));
    }
}
