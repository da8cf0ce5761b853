//! Error types for entity API
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

use sea_orm::error::DbErr;

/// Errors while reading or writing notification rows.
/// Two broad categories:
///  * Errors related to data. Ex DbErr::RecordNotFound
///  * Errors related to interactions with the database itself. Ex DbErr::Conn
#[derive(Debug, PartialEq)]
pub struct Error {
    // Underlying error emitted from seaORM internals
    pub source: Option<DbErr>,
    pub error_kind: EntityApiErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityApiErrorKind {
    // An id or filter that can never match a row
    InvalidQueryTerm,
    RecordNotFound,
    RecordNotUpdated,
    // A row was rejected by a constraint
    ValidationError,
    // Connection, pool or statement failures
    SystemError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Entity API Error ({:?}): {source}", self.error_kind),
            None => write!(f, "Entity API Error ({:?})", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        let error_kind = match &err {
            DbErr::RecordNotFound(_) => EntityApiErrorKind::RecordNotFound,
            DbErr::RecordNotUpdated => EntityApiErrorKind::RecordNotUpdated,
            DbErr::RecordNotInserted => EntityApiErrorKind::ValidationError,
            _ => EntityApiErrorKind::SystemError,
        };

        Error {
            source: Some(err),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rows_are_classified_as_not_found() {
        let err = Error::from(DbErr::RecordNotFound("notification".to_string()));
        assert_eq!(err.error_kind, EntityApiErrorKind::RecordNotFound);
        assert!(err.to_string().contains("notification"));
    }

    #[test]
    fn connection_failures_are_system_errors() {
        let err = Error::from(DbErr::Custom("pool timed out".to_string()));
        assert_eq!(err.error_kind, EntityApiErrorKind::SystemError);
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn unchanged_updates_are_reported() {
        let err = Error::from(DbErr::RecordNotUpdated);
        assert_eq!(err.error_kind, EntityApiErrorKind::RecordNotUpdated);
    }
}
