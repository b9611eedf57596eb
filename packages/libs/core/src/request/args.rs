//! 위치 인자 정규화
//!
//! 최대 4개의 느슨한 인자를 다음 규칙으로 [`PermissionRequest`]에 배치합니다.
//!
//! - 0번: 권한 지정 (이름, 파이프 문자열, id, 객체, 또는 이들의 목록)
//! - 이후: 엔티티 → target, 타입 구분자를 포함한 문자열 → 타입 target,
//!   그 외 문자열 → guard, bool → recursive (각각 처음 나온 값만 사용)
//! - recursive가 없으면 `fallback_recursion`

use crate::error::{Error, Result};
use crate::model::{Permission, PermissionId};
use crate::scope::{ResourceRef, Target};

use super::{split_pipe, PermissionRef, PermissionRequest};

/// 허용되는 최대 인자 수
pub const MAX_ARGUMENTS: usize = 4;

/// 느슨한 위치 인자
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Str(String),
    Id(PermissionId),
    Permission(Permission),
    List(Vec<Arg>),
    Entity(ResourceRef),
    Flag(bool),
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl From<PermissionId> for Arg {
    fn from(value: PermissionId) -> Self {
        Arg::Id(value)
    }
}

impl From<Permission> for Arg {
    fn from(value: Permission) -> Self {
        Arg::Permission(value)
    }
}

impl From<ResourceRef> for Arg {
    fn from(value: ResourceRef) -> Self {
        Arg::Entity(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Flag(value)
    }
}

impl<T: Into<Arg>> From<Vec<T>> for Arg {
    fn from(values: Vec<T>) -> Self {
        Arg::List(values.into_iter().map(Into::into).collect())
    }
}

/// 위치 인자 목록을 요청으로 정규화
///
/// # Arguments
/// * `args` - 위치 인자 (최대 [`MAX_ARGUMENTS`]개)
/// * `type_separator` - 문자열을 타입 target으로 판별하는 구분자 (예: `::`)
/// * `fallback_recursion` - recursive 인자가 없을 때의 값
pub fn normalize(
    args: Vec<Arg>,
    type_separator: &str,
    fallback_recursion: bool,
) -> Result<PermissionRequest> {
    if args.len() > MAX_ARGUMENTS {
        return Err(Error::TooManyArguments {
            given: args.len(),
            max: MAX_ARGUMENTS,
        });
    }

    let mut request = PermissionRequest::default();
    let mut args = args.into_iter().enumerate();

    if let Some((position, spec)) = args.next() {
        request.permissions = permission_spec(position, spec)?;
    }

    for (position, arg) in args {
        match arg {
            Arg::Entity(resource) => {
                if request.target.is_none() {
                    request.target = Some(Target::Entity(resource));
                }
            }
            Arg::Str(value) => {
                if !type_separator.is_empty() && value.contains(type_separator) {
                    if request.target.is_none() {
                        request.target = Some(Target::Type(value));
                    }
                } else if request.guard.is_none() {
                    request.guard = Some(value);
                }
            }
            Arg::Flag(flag) => {
                if request.recursive.is_none() {
                    request.recursive = Some(flag);
                }
            }
            Arg::Id(_) | Arg::Permission(_) | Arg::List(_) => {
                return Err(Error::InvalidArgument {
                    position,
                    reason: "permissions must be the first argument".to_string(),
                });
            }
        }
    }

    request.recursive.get_or_insert(fallback_recursion);
    Ok(request)
}

/// 0번 인자를 권한 목록으로 변환
fn permission_spec(position: usize, spec: Arg) -> Result<Vec<PermissionRef>> {
    match spec {
        Arg::Str(value) => Ok(split_pipe(&value).into_iter().map(PermissionRef::Name).collect()),
        Arg::Id(id) => Ok(vec![PermissionRef::Id(id)]),
        Arg::Permission(permission) => Ok(vec![PermissionRef::Object(permission)]),
        Arg::List(items) => {
            let mut permissions = Vec::with_capacity(items.len());
            flatten_list(position, items, &mut permissions)?;
            Ok(permissions)
        }
        Arg::Entity(_) | Arg::Flag(_) => Err(Error::InvalidArgument {
            position,
            reason: "expected a permission name, id, object or list".to_string(),
        }),
    }
}

/// 목록 원소는 파이프 분리하지 않고 중첩 목록은 평탄화
fn flatten_list(position: usize, items: Vec<Arg>, out: &mut Vec<PermissionRef>) -> Result<()> {
    for item in items {
        match item {
            Arg::Str(name) => out.push(PermissionRef::Name(name)),
            Arg::Id(id) => out.push(PermissionRef::Id(id)),
            Arg::Permission(permission) => out.push(PermissionRef::Object(permission)),
            Arg::List(nested) => flatten_list(position, nested, out)?,
            Arg::Entity(_) | Arg::Flag(_) => {
                return Err(Error::InvalidArgument {
                    position,
                    reason: "permission lists may only hold names, ids or objects".to_string(),
                });
            }
        }
    }
    Ok(())
}
