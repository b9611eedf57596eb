//! 공통 에러 타입
//!
//! Padlock 엔진 전체에서 사용되는 에러 타입을 정의합니다.
//! 모든 에러는 즉시 실패하는 검증 에러이며 재시도 대상이 아닙니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Padlock 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Lookup Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("there is no permission named `{permission}` for guard `{guard}`")]
    PermissionDoesNotExist { permission: String, guard: String },

    #[error("there is no role named `{role}` for guard `{guard}`")]
    RoleDoesNotExist { role: String, guard: String },

    #[error("a `{name}` permission already exists for guard `{guard}`")]
    PermissionAlreadyExists { name: String, guard: String },

    #[error("a `{name}` role already exists for guard `{guard}`")]
    RoleAlreadyExists { name: String, guard: String },

    #[error("resource type `{class}` is not registered")]
    ClassDoesNotExist { class: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Assignment Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("the given role or permission uses guard `{given}`, expected one of [{}]", .expected.join(", "))]
    GuardDoesNotMatch { given: String, expected: Vec<String> },

    #[error("strict mode: permission assignment requires an explicit target")]
    StrictModeRestriction,

    #[error("permission `{permission}` is not assigned at pivot ({to_id}, {to_type})")]
    PermissionNotAssigned {
        permission: String,
        to_id: String,
        to_type: String,
    },

    #[error("holder `{holder_type}` is not persisted yet; stage the grant and commit it after saving")]
    ActorNotPersisted { holder_type: String },

    #[error("staged grant belongs to `{expected}`, not `{actual}`")]
    HolderMismatch { expected: String, actual: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Argument Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("too many arguments: got {given}, at most {max} allowed")]
    TooManyArguments { given: usize, max: usize },

    #[error("invalid argument at position {position}: {reason}")]
    InvalidArgument { position: usize, reason: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Backend / IO Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("store error: {message}")]
    Store { message: String },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP 상태 코드로 변환 (미들웨어 어댑터용)
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::TooManyArguments { .. }
            | Error::InvalidArgument { .. }
            | Error::ClassDoesNotExist { .. }
            | Error::StrictModeRestriction
            | Error::Yaml(_)
            | Error::Json(_) => 400,

            // 403 Forbidden
            Error::GuardDoesNotMatch { .. } => 403,

            // 404 Not Found
            Error::PermissionDoesNotExist { .. }
            | Error::RoleDoesNotExist { .. }
            | Error::PermissionNotAssigned { .. } => 404,

            // 409 Conflict
            Error::PermissionAlreadyExists { .. }
            | Error::RoleAlreadyExists { .. }
            | Error::ActorNotPersisted { .. }
            | Error::HolderMismatch { .. } => 409,

            // 500 Internal Server Error
            _ => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::PermissionDoesNotExist { .. } => "PERMISSION_DOES_NOT_EXIST",
            Error::RoleDoesNotExist { .. } => "ROLE_DOES_NOT_EXIST",
            Error::PermissionAlreadyExists { .. } => "PERMISSION_ALREADY_EXISTS",
            Error::RoleAlreadyExists { .. } => "ROLE_ALREADY_EXISTS",
            Error::ClassDoesNotExist { .. } => "CLASS_DOES_NOT_EXIST",
            Error::GuardDoesNotMatch { .. } => "GUARD_DOES_NOT_MATCH",
            Error::StrictModeRestriction => "STRICT_MODE_RESTRICTION",
            Error::PermissionNotAssigned { .. } => "PERMISSION_NOT_ASSIGNED",
            Error::ActorNotPersisted { .. } => "ACTOR_NOT_PERSISTED",
            Error::HolderMismatch { .. } => "HOLDER_MISMATCH",
            Error::TooManyArguments { .. } => "TOO_MANY_ARGUMENTS",
            Error::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Error::Store { .. } => "STORE_ERROR",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }

    /// 권한이 존재하지 않아서 발생한 에러인지 여부
    ///
    /// `check_permission_to`, `has_any_permission`은 이 에러만 `false`로 낮춥니다.
    pub fn is_missing_permission(&self) -> bool {
        matches!(self, Error::PermissionDoesNotExist { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_mismatch_message() {
        let err = Error::GuardDoesNotMatch {
            given: "api".to_string(),
            expected: vec!["web".to_string(), "admin".to_string()],
        };

        let msg = err.to_string();
        assert!(msg.contains("`api`"), "got: {msg}");
        assert!(msg.contains("[web, admin]"), "got: {msg}");
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.code(), "GUARD_DOES_NOT_MATCH");
    }

    #[test]
    fn test_missing_permission_classification() {
        let missing = Error::PermissionDoesNotExist {
            permission: "edit-post".to_string(),
            guard: "web".to_string(),
        };
        let unassigned = Error::PermissionNotAssigned {
            permission: "edit-post".to_string(),
            to_id: "5".to_string(),
            to_type: "blog::Post".to_string(),
        };

        assert!(missing.is_missing_permission());
        assert!(!unassigned.is_missing_permission());
        assert_eq!(missing.status_code(), 404);
        assert_eq!(unassigned.code(), "PERMISSION_NOT_ASSIGNED");
    }
}
