//! Padlock 설정
//!
//! `padlock.yaml`(또는 JSON)을 파싱하고, `PADLOCK_*` 환경변수로 덮어씁니다.
//! 모든 필드에 기본값이 있으므로 빈 문서도 유효한 설정입니다.
//!
//! ```yaml
//! default_guard: web
//! revoke_recursion: false
//! strict:
//!   permission_assignment: false
//! cache:
//!   enabled: true
//! resource_types: ["blog::Post", "blog::Comment"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 전체 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadlockConfig {
    /// guard 이름이 없는 actor에 적용되는 기본 guard
    pub default_guard: String,

    /// revoke 요청에 recursive 플래그가 없을 때의 기본값
    pub revoke_recursion: bool,

    /// strict 모드 설정
    pub strict: StrictConfig,

    /// 캐시 설정
    pub cache: CacheConfig,

    /// 문자열 인자를 리소스 타입으로 판별하는 구분자
    pub type_separator: String,

    /// 타입 문자열 target으로 허용되는 리소스 타입 목록
    pub resource_types: Vec<String>,

    /// 관계형 테이블 이름
    pub table_names: TableNames,

    /// 관계형 컬럼 이름
    pub column_names: ColumnNames,
}

impl Default for PadlockConfig {
    fn default() -> Self {
        Self {
            default_guard: "web".to_string(),
            revoke_recursion: false,
            strict: StrictConfig::default(),
            cache: CacheConfig::default(),
            type_separator: "::".to_string(),
            resource_types: Vec::new(),
            table_names: TableNames::default(),
            column_names: ColumnNames::default(),
        }
    }
}

/// strict 모드
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrictConfig {
    /// true면 모든 권한 부여에 target이 필요
    pub permission_assignment: bool,
}

/// 캐시 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// false면 매 조회마다 store를 읽음
    pub enabled: bool,

    /// 외부 캐시 백엔드용 키 prefix
    pub prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "padlock.permission.cache".to_string(),
        }
    }
}

/// 테이블 이름
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub roles: String,
    pub permissions: String,
    pub model_has_permissions: String,
    pub model_has_roles: String,
    pub role_has_permissions: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            roles: "roles".to_string(),
            permissions: "permissions".to_string(),
            model_has_permissions: "model_has_permissions".to_string(),
            model_has_roles: "model_has_roles".to_string(),
            role_has_permissions: "role_has_permissions".to_string(),
        }
    }
}

/// 컬럼 이름
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// actor id 컬럼
    pub model_morph_key: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            model_morph_key: "model_id".to_string(),
        }
    }
}

impl PadlockConfig {
    /// YAML 문자열에서 파싱
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// JSON 문자열에서 파싱
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 파일에서 로드 (`.json`이면 JSON, 그 외는 YAML)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// 환경변수로 덮어쓰기
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// 임의의 lookup 함수로 덮어쓰기
    ///
    /// 파싱할 수 없는 값은 무시하고 기존 값을 유지합니다.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(guard) = lookup("PADLOCK_DEFAULT_GUARD").filter(|v| !v.trim().is_empty()) {
            self.default_guard = guard.trim().to_string();
        }

        self.revoke_recursion = lookup("PADLOCK_REVOKE_RECURSION")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(self.revoke_recursion);

        self.strict.permission_assignment = lookup("PADLOCK_STRICT_PERMISSION_ASSIGNMENT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(self.strict.permission_assignment);

        self.cache.enabled = lookup("PADLOCK_CACHE_ENABLED")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(self.cache.enabled);

        if let Some(types) = lookup("PADLOCK_RESOURCE_TYPES") {
            self.resource_types.extend(
                types
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            );
        }

        self
    }
}
