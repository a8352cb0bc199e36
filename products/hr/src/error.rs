use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub type HrResult<T> = Result<T, HrError>;

#[derive(Debug, Error)]
pub enum HrError {
    #[error("employee {0} not found")]
    NotFound(String),
    #[error("employee {0} already exists")]
    Conflict(String),
    #[error("invalid employee data: {0}")]
    InvalidInput(String),
    #[error("database unavailable: {0}")]
    Unavailable(#[source] DbErr),
    #[error("database error: {0}")]
    Database(#[source] DbErr),
}

impl HrError {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            HrError::NotFound(_) => "NOT_FOUND",
            HrError::Conflict(_) => "CONFLICT",
            HrError::InvalidInput(_) => "INVALID_INPUT",
            HrError::Unavailable(_) => "UNAVAILABLE",
            HrError::Database(_) => "INTERNAL",
        }
    }

    /// True for failures caused by the caller rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            HrError::NotFound(_) | HrError::Conflict(_) | HrError::InvalidInput(_)
        )
    }

    /// Classify a write failure, turning a unique violation on the primary key
    /// into [`HrError::Conflict`].
    pub(crate) fn from_write(err: DbErr, employee_id: &str) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
            return HrError::Conflict(employee_id.to_string());
        }
        err.into()
    }
}

impl From<DbErr> for HrError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => HrError::Unavailable(err),
            other => HrError::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn connection_errors_map_to_unavailable() {
        let err: HrError = DbErr::Conn(RuntimeErr::Internal("refused".into())).into();
        assert_eq!(err.code(), "UNAVAILABLE");
        assert!(!err.is_client_error());
    }

    #[test]
    fn other_errors_are_internal() {
        let err = HrError::from_write(DbErr::Custom("boom".into()), "E1");
        assert!(matches!(err, HrError::Database(_)));
        assert_eq!(err.code(), "INTERNAL");
    }

    #[test]
    fn messages_name_the_employee() {
        assert_eq!(
            HrError::Conflict("E7".into()).to_string(),
            "employee E7 already exists"
        );
        assert!(HrError::NotFound("E7".into()).is_client_error());
    }
}
