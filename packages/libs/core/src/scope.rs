//! Pivot 스코핑
//!
//! grant 대상(target)을 정규화된 `(to_id, to_type)` pivot으로 변환하고,
//! 조회/회수 시 pivot 매칭 규칙을 제공합니다.
//!
//! | 입력 | to_id | to_type |
//! |------|-------|---------|
//! | 저장된 엔티티 | 엔티티 id | 엔티티 타입 |
//! | 저장되지 않은 엔티티 | `*` | 엔티티 타입 |
//! | 타입 이름 | `*` | 타입 이름 |
//! | 없음 | `*` | `*` |

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 와일드카드 값
pub const WILDCARD: &str = "*";

/// grant edge의 스코프 `(to_id, to_type)`
///
/// `(구체 id, "*")` 조합은 만들 수 없습니다. 타입이 `*`이면 id도 `*`로 정규화됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "PivotRow", into = "PivotRow")]
pub struct Pivot {
    to_id: String,
    to_type: String,
}

/// 직렬화용 원시 row (역직렬화 시 불변식 정규화)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PivotRow {
    to_id: String,
    to_type: String,
}

impl From<PivotRow> for Pivot {
    fn from(row: PivotRow) -> Self {
        Pivot::instance(row.to_id, row.to_type)
    }
}

impl From<Pivot> for PivotRow {
    fn from(pivot: Pivot) -> Self {
        PivotRow {
            to_id: pivot.to_id,
            to_type: pivot.to_type,
        }
    }
}

impl Default for Pivot {
    fn default() -> Self {
        Self::any()
    }
}

impl Pivot {
    /// `(*, *)`: 모든 대상
    pub fn any() -> Self {
        Self {
            to_id: WILDCARD.to_string(),
            to_type: WILDCARD.to_string(),
        }
    }

    /// `(*, type)`: 해당 타입의 모든 인스턴스
    pub fn of_type(to_type: impl Into<String>) -> Self {
        Self {
            to_id: WILDCARD.to_string(),
            to_type: to_type.into(),
        }
    }

    /// `(id, type)`: 특정 인스턴스
    pub fn instance(to_id: impl Into<String>, to_type: impl Into<String>) -> Self {
        let to_type = to_type.into();
        if to_type == WILDCARD {
            return Self::any();
        }
        Self {
            to_id: to_id.into(),
            to_type,
        }
    }

    pub fn to_id(&self) -> &str {
        &self.to_id
    }

    pub fn to_type(&self) -> &str {
        &self.to_type
    }

    pub fn is_any(&self) -> bool {
        self.to_type == WILDCARD
    }

    pub fn is_type_wide(&self) -> bool {
        self.to_id == WILDCARD
    }

    /// 저장된 pivot(self)이 요청 pivot을 허용하는지
    ///
    /// 저장된 값이 `*`인 축은 어떤 요청 값과도 매칭되고, 나머지는 정확히 같아야 합니다.
    pub fn covers(&self, requested: &Pivot) -> bool {
        (self.to_id == WILDCARD || self.to_id == requested.to_id)
            && (self.to_type == WILDCARD || self.to_type == requested.to_type)
    }
}

/// 권한 대상이 될 수 있는 호스트 엔티티
pub trait Resource {
    /// 타입 이름 (예: `blog::Post`)
    fn resource_type(&self) -> &str;

    /// 저장된 경우 id, 아직 저장되지 않았으면 `None`
    fn resource_id(&self) -> Option<String>;
}

/// 엔티티 참조
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub type_name: String,
    pub id: Option<String>,
}

impl ResourceRef {
    /// 저장된 엔티티
    pub fn persisted(type_name: impl Into<String>, id: impl ToString) -> Self {
        Self {
            type_name: type_name.into(),
            id: Some(id.to_string()),
        }
    }

    /// 저장되지 않은 엔티티
    pub fn unsaved(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: None,
        }
    }

    /// `Resource` 구현체에서 생성
    pub fn of<R: Resource + ?Sized>(resource: &R) -> Self {
        Self {
            type_name: resource.resource_type().to_string(),
            id: resource.resource_id(),
        }
    }
}

/// 요청에 지정된 권한 대상
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// 타입 이름 문자열 (레지스트리에 등록된 타입이어야 함)
    Type(String),
    /// 엔티티 (저장 여부에 따라 id 스코프 결정)
    Entity(ResourceRef),
}

impl From<ResourceRef> for Target {
    fn from(resource: ResourceRef) -> Self {
        Target::Entity(resource)
    }
}

impl From<&ResourceRef> for Target {
    fn from(resource: &ResourceRef) -> Self {
        Target::Entity(resource.clone())
    }
}

/// 타입 문자열 target으로 허용되는 리소스 타입 집합
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    known: BTreeSet<String>,
}

impl TypeRegistry {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn register(&mut self, type_name: impl Into<String>) -> bool {
        self.known.insert(type_name.into())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        type_name == WILDCARD || self.known.contains(type_name)
    }

    /// target을 pivot으로 변환
    pub fn resolve(&self, target: Option<&Target>) -> Result<Pivot> {
        match target {
            None => Ok(Pivot::any()),
            Some(Target::Type(type_name)) => {
                if !self.contains(type_name) {
                    return Err(Error::ClassDoesNotExist {
                        class: type_name.clone(),
                    });
                }
                Ok(Pivot::of_type(type_name.as_str()))
            }
            Some(Target::Entity(resource)) if resource.type_name == WILDCARD => {
                Err(Error::InvalidArgument {
                    position: 1,
                    reason: "resource type cannot be a wildcard".to_string(),
                })
            }
            Some(Target::Entity(resource)) => Ok(match &resource.id {
                Some(id) => Pivot::instance(id.as_str(), resource.type_name.as_str()),
                None => Pivot::of_type(resource.type_name.as_str()),
            }),
        }
    }
}

/// 회수 시 edge를 고르는 pivot 조건
///
/// `None`인 축은 제한하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotConstraint<'a> {
    pub to_type: Option<&'a str>,
    pub to_id: Option<&'a str>,
}

impl PivotConstraint<'_> {
    pub fn matches(&self, pivot: &Pivot) -> bool {
        self.to_type.map_or(true, |t| pivot.to_type() == t)
            && self.to_id.map_or(true, |id| pivot.to_id() == id)
    }
}

/// 회수 요청의 edge 매칭 규칙
///
/// | 요청 pivot | recursive | 비-recursive |
/// |------------|-----------|--------------|
/// | `(*, *)` | 모든 edge | `(*, *)` edge만 |
/// | `(*, type)` | 해당 타입 edge 전부 | `(*, type)` edge만 |
/// | `(id, type)` | 정확히 일치 | 정확히 일치 |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokeFilter {
    pivot: Pivot,
    recursive: bool,
}

impl RevokeFilter {
    pub fn new(pivot: Pivot, recursive: bool) -> Self {
        Self { pivot, recursive }
    }

    pub fn pivot(&self) -> &Pivot {
        &self.pivot
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn constraint(&self) -> PivotConstraint<'_> {
        if self.pivot.is_any() {
            if self.recursive {
                PivotConstraint { to_type: None, to_id: None }
            } else {
                PivotConstraint {
                    to_type: Some(WILDCARD),
                    to_id: Some(WILDCARD),
                }
            }
        } else if self.pivot.is_type_wide() {
            PivotConstraint {
                to_type: Some(self.pivot.to_type()),
                to_id: if self.recursive { None } else { Some(WILDCARD) },
            }
        } else {
            PivotConstraint {
                to_type: Some(self.pivot.to_type()),
                to_id: Some(self.pivot.to_id()),
            }
        }
    }

    pub fn matches(&self, edge_pivot: &Pivot) -> bool {
        self.constraint().matches(edge_pivot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::new(["blog::Post", "blog::Comment"])
    }

    #[test]
    fn test_pivot_invariant() {
        let pivot = Pivot::instance("5", WILDCARD);
        assert_eq!(pivot, Pivot::any());
        assert_eq!(pivot.to_id(), WILDCARD);

        let parsed: Pivot = serde_json::from_str(r#"{"to_id":"9","to_type":"*"}"#).unwrap();
        assert_eq!(parsed, Pivot::any());
    }

    #[test]
    fn test_resolve_table() {
        let registry = registry();

        let persisted = Target::from(ResourceRef::persisted("blog::Post", 5));
        assert_eq!(
            registry.resolve(Some(&persisted)).unwrap(),
            Pivot::instance("5", "blog::Post")
        );

        let unsaved = Target::from(ResourceRef::unsaved("blog::Post"));
        assert_eq!(
            registry.resolve(Some(&unsaved)).unwrap(),
            Pivot::of_type("blog::Post")
        );

        let type_name = Target::Type("blog::Comment".to_string());
        assert_eq!(
            registry.resolve(Some(&type_name)).unwrap(),
            Pivot::of_type("blog::Comment")
        );

        assert_eq!(registry.resolve(None).unwrap(), Pivot::any());
    }

    #[test]
    fn test_resolve_unknown_type() {
        let target = Target::Type("blog::Missing".to_string());
        let err = registry().resolve(Some(&target)).unwrap_err();
        assert!(matches!(err, Error::ClassDoesNotExist { class } if class == "blog::Missing"));
    }

    #[test]
    fn test_wildcard_entity_rejected() {
        let registry = registry();
        for resource in [
            ResourceRef::persisted(WILDCARD, 5),
            ResourceRef::unsaved(WILDCARD),
        ] {
            let err = registry.resolve(Some(&Target::from(resource))).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument { position: 1, .. }));
        }
    }

    #[test]
    fn test_covers_is_wildcard_tolerant() {
        let post5 = Pivot::instance("5", "blog::Post");

        assert!(Pivot::any().covers(&post5));
        assert!(Pivot::of_type("blog::Post").covers(&post5));
        assert!(post5.covers(&post5));
        assert!(!post5.covers(&Pivot::instance("7", "blog::Post")));
        // 구체 pivot은 와일드카드 요청을 만족시키지 않음
        assert!(!post5.covers(&Pivot::any()));
        assert!(!Pivot::of_type("blog::Comment").covers(&post5));
    }

    #[test]
    fn test_revoke_filter_any() {
        let recursive = RevokeFilter::new(Pivot::any(), true);
        let strict = RevokeFilter::new(Pivot::any(), false);
        let post5 = Pivot::instance("5", "blog::Post");

        assert!(recursive.matches(&post5));
        assert!(recursive.matches(&Pivot::any()));
        assert!(!strict.matches(&post5));
        assert!(!strict.matches(&Pivot::of_type("blog::Post")));
        assert!(strict.matches(&Pivot::any()));
    }

    #[test]
    fn test_revoke_filter_type() {
        let recursive = RevokeFilter::new(Pivot::of_type("blog::Post"), true);
        let strict = RevokeFilter::new(Pivot::of_type("blog::Post"), false);

        assert!(recursive.matches(&Pivot::of_type("blog::Post")));
        assert!(recursive.matches(&Pivot::instance("5", "blog::Post")));
        assert!(!recursive.matches(&Pivot::instance("5", "blog::Comment")));
        assert!(strict.matches(&Pivot::of_type("blog::Post")));
        assert!(!strict.matches(&Pivot::instance("5", "blog::Post")));
    }

    #[test]
    fn test_revoke_filter_instance_is_exact() {
        let filter = RevokeFilter::new(Pivot::instance("5", "blog::Post"), true);

        assert!(filter.matches(&Pivot::instance("5", "blog::Post")));
        assert!(!filter.matches(&Pivot::of_type("blog::Post")));
        assert!(!filter.matches(&Pivot::any()));
    }
}
