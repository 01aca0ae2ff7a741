use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use sqlx::{error::ErrorKind, postgres::PgDatabaseError};
use tracing::{error, warn};

const GENERIC_SERVER_ERROR: &str = "Server đang gặp sự cố. Vui lòng thử lại sau.";

/// Why a request could not be authenticated. Every variant is a 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("Không có quyền truy cập, yêu cầu đăng nhập.")]
    MissingCredentials,
    #[error("Phiên đăng nhập đã hết hạn, vui lòng đăng nhập lại.")]
    TokenExpired,
    #[error("Token không hợp lệ.")]
    TokenMalformed,
    #[error("Xác thực thất bại.")]
    Failed,
    #[error("Người dùng không tồn tại.")]
    UserGone,
    #[error("Username hoặc password không đúng")]
    InvalidCredentials,
}

/// Store-level failure, classified once from the driver error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate value '{value}' for field '{field}'")]
    Duplicate { field: String, value: String },
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("malformed identifier: {0}")]
    Cast(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            // invalid_text_representation, e.g. a bad uuid literal
            if db.code().as_deref() == Some("22P02") {
                return StoreError::Cast(db.message().to_string());
            }
            let detail = db
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(|pg| pg.detail())
                .map(str::to_owned);
            match db.kind() {
                ErrorKind::UniqueViolation => {
                    let (field, value) = detail
                        .as_deref()
                        .and_then(parse_duplicate_key)
                        .unwrap_or_else(|| {
                            (db.constraint().unwrap_or("unknown").to_string(), String::new())
                        });
                    return StoreError::Duplicate { field, value };
                }
                ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    return StoreError::Constraint(
                        detail.unwrap_or_else(|| db.message().to_string()),
                    );
                }
                _ => {}
            }
        }
        StoreError::Database(e)
    }
}

/// Pulls `(field, value)` out of a Postgres detail such as
/// `Key (username)=(admin) already exists.`
fn parse_duplicate_key(detail: &str) -> Option<(String, String)> {
    lazy_static! {
        static ref DUPLICATE_KEY_RE: Regex =
            Regex::new(r"Key \((?P<field>[^)]+)\)=\((?P<value>.*)\) already exists").unwrap();
    }
    let caps = DUPLICATE_KEY_RE.captures(detail)?;
    Some((caps["field"].to_string(), caps["value"].to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("ID dự án không hợp lệ.")]
    InvalidIdentifier,
    #[error(transparent)]
    Unauthenticated(#[from] AuthFailure),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(String),
    #[error("Giá trị '{value}' của trường '{field}' đã tồn tại.")]
    Conflict { field: String, value: String },
    #[error("Dữ liệu không hợp lệ: {}", .0.join(". "))]
    ValidationFailed(Vec<String>),
    /// Store-level constraint violation; the driver detail stays out of the
    /// public message.
    #[error("Dữ liệu không hợp lệ: dữ liệu liên kết không tồn tại hoặc thiếu trường bắt buộc.")]
    ConstraintViolated(String),
    #[error("Lỗi Server Nội bộ")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::InvalidIdentifier
            | AppError::Conflict { .. }
            | AppError::ValidationFailed(_)
            | AppError::ConstraintViolated(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message including internal detail; only ever shown in development.
    fn detailed_message(&self) -> String {
        match self {
            AppError::Internal(e) => format!("{e:#}"),
            AppError::ConstraintViolated(detail) => format!("{self} ({detail})"),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate { field, value } => AppError::Conflict { field, value },
            StoreError::Constraint(detail) => AppError::ConstraintViolated(detail),
            StoreError::Cast(_) => AppError::InvalidIdentifier,
            StoreError::Database(sqlx::Error::RowNotFound) => {
                AppError::NotFound("Không tìm thấy tài nguyên".into())
            }
            StoreError::Database(e) => AppError::Internal(e.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::InvalidIdentifier
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Full error detail riding along on the response, consumed by
/// [`expose_error_details`] when verbose errors are enabled.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
    pub stack: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }

        let report = ErrorReport {
            message: self.detailed_message(),
            stack: format!("{self:?}"),
        };
        let message = if status.is_server_error() {
            GENERIC_SERVER_ERROR.to_string()
        } else {
            self.to_string()
        };

        let mut res = (status, Json(ErrorBody { message, stack: None })).into_response();
        res.extensions_mut().insert(report);
        res
    }
}

/// Response mapper installed in development mode: swaps the public error
/// envelope for the detailed message plus stack.
pub async fn expose_error_details(mut res: Response) -> Response {
    let Some(report) = res.extensions_mut().remove::<ErrorReport>() else {
        return res;
    };
    let status = res.status();
    (
        status,
        Json(ErrorBody {
            message: report.message,
            stack: Some(report.stack),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidIdentifier.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(AuthFailure::TokenExpired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden("no").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Conflict { field: "username".into(), value: "a".into() }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_are_remapped() {
        let dup = AppError::from(StoreError::Duplicate {
            field: "username".into(),
            value: "admin".into(),
        });
        assert_eq!(dup.to_string(), "Giá trị 'admin' của trường 'username' đã tồn tại.");

        let cast = AppError::from(StoreError::Cast("bad uuid".into()));
        assert!(matches!(cast, AppError::InvalidIdentifier));

        let missing = AppError::from(StoreError::Database(sqlx::Error::RowNotFound));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let other = AppError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_messages_are_joined() {
        let err = AppError::ValidationFailed(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Dữ liệu không hợp lệ: a. b");
    }

    #[test]
    fn duplicate_key_detail_is_parsed() {
        let parsed = parse_duplicate_key("Key (username)=(admin) already exists.");
        assert_eq!(parsed, Some(("username".into(), "admin".into())));
        assert_eq!(parse_duplicate_key("something else"), None);
    }

    /// Driver error with a settable SQLSTATE, kind and constraint name.
    #[derive(Debug)]
    struct FakeDbError {
        code: Option<&'static str>,
        kind: ErrorKind,
        constraint: Option<&'static str>,
        message: &'static str,
    }

    impl FakeDbError {
        fn new(code: &'static str, kind: ErrorKind, message: &'static str) -> sqlx::Error {
            sqlx::Error::from(FakeDbError { code: Some(code), kind, constraint: None, message })
        }
    }

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.message)
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            self.code.map(std::borrow::Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> ErrorKind {
            match self.kind {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::NotNullViolation => ErrorKind::NotNullViolation,
                ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    #[test]
    fn bad_uuid_literal_is_a_cast_error() {
        let err = StoreError::from(FakeDbError::new(
            "22P02",
            ErrorKind::Other,
            "invalid input syntax for type uuid: \"abc\"",
        ));
        assert!(matches!(&err, StoreError::Cast(msg) if msg.contains("uuid")));
        assert!(matches!(AppError::from(err), AppError::InvalidIdentifier));
    }

    #[test]
    fn unique_violation_without_parsable_detail_falls_back_to_constraint_name() {
        let err = StoreError::from(sqlx::Error::from(FakeDbError {
            code: Some("23505"),
            kind: ErrorKind::UniqueViolation,
            constraint: Some("users_username_key"),
            message: "duplicate key value violates unique constraint",
        }));
        match &err {
            StoreError::Duplicate { field, value } => {
                assert_eq!(field, "users_username_key");
                assert_eq!(value, "");
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
        assert_eq!(AppError::from(err).status(), StatusCode::BAD_REQUEST);

        let unnamed = StoreError::from(FakeDbError::new(
            "23505",
            ErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint",
        ));
        assert!(matches!(unnamed, StoreError::Duplicate { ref field, .. } if field == "unknown"));
    }

    #[test]
    fn integrity_violations_become_constraint_errors() {
        let cases = [
            ("23503", ErrorKind::ForeignKeyViolation, "violates foreign key constraint"),
            ("23502", ErrorKind::NotNullViolation, "null value in column \"title\""),
            ("23514", ErrorKind::CheckViolation, "violates check constraint"),
        ];
        for (code, kind, message) in cases {
            let err = StoreError::from(FakeDbError::new(code, kind, message));
            assert!(
                matches!(&err, StoreError::Constraint(detail) if detail == message),
                "{code}: {err:?}"
            );
            let app = AppError::from(err);
            assert_eq!(app.status(), StatusCode::BAD_REQUEST);
            assert!(!app.to_string().contains(message));
        }
    }

    #[test]
    fn other_database_errors_stay_internal() {
        let err = StoreError::from(FakeDbError::new(
            "40P01",
            ErrorKind::Other,
            "deadlock detected",
        ));
        assert!(matches!(err, StoreError::Database(sqlx::Error::Database(_))));
        assert_eq!(AppError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);

        let timeout = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(timeout, StoreError::Database(sqlx::Error::PoolTimedOut)));
    }

    #[tokio::test]
    async fn constraint_detail_only_shows_in_development() {
        let detail = "Key (user_id)=(42) is not present in table \"users\".";
        let public = AppError::from(StoreError::Constraint(detail.into())).into_response();
        assert_eq!(public.status(), StatusCode::BAD_REQUEST);
        let body = body_json(public).await;
        assert!(!body["message"].as_str().unwrap().contains("Key ("));

        let res = AppError::from(StoreError::Constraint(detail.into())).into_response();
        let body = body_json(expose_error_details(res).await).await;
        assert!(body["message"].as_str().unwrap().contains(detail));
    }

    #[tokio::test]
    async fn server_errors_hide_internal_detail() {
        let res = AppError::Internal(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(res).await;
        assert_eq!(body["message"], GENERIC_SERVER_ERROR);
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn client_errors_keep_their_message() {
        let res = AppError::NotFound("Không tìm thấy dự án.".into()).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = body_json(res).await;
        assert_eq!(body["message"], "Không tìm thấy dự án.");
    }

    #[tokio::test]
    async fn development_mapper_adds_stack_and_real_message() {
        let res = AppError::Internal(anyhow::anyhow!("connection refused")).into_response();
        let res = expose_error_details(res).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(res).await;
        assert_eq!(body["message"], "connection refused");
        assert!(body["stack"].as_str().unwrap().contains("Internal"));
    }

    #[tokio::test]
    async fn development_mapper_leaves_success_untouched() {
        let res = (StatusCode::OK, "hello").into_response();
        let res = expose_error_details(res).await;
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }
}
