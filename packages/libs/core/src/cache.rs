//! 권한 캐시
//!
//! holder별로 로드된 grant edge와 role을 스냅샷으로 캐시합니다.
//! 변경(grant/revoke/sync/role 변경)이 성공하면 해당 holder 항목은 반드시 무효화됩니다.
//! TTL은 없으며, 오래된 값을 읽는 것은 버그입니다.
//!
//! # 구현체
//!
//! - [`MemoryCache`]: 프로세스 내 맵. 로드를 write lock 안에서 수행하므로
//!   동시에 일어난 무효화보다 오래된 스냅샷이 나중에 저장되는 일이 없습니다.
//! - [`NullCache`]: 캐시하지 않음 (`cache.enabled = false`)

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{GrantEdge, Holder, Role};

/// 캐시 키 (guard + holder)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub guard: String,
    pub holder: Holder,
}

impl CacheKey {
    pub fn new(guard: impl Into<String>, holder: Holder) -> Self {
        Self {
            guard: guard.into(),
            holder,
        }
    }

    /// 외부 캐시 서비스용 문자열 키
    pub fn render(&self, prefix: &str) -> String {
        format!("{}.{}.{}", prefix, self.guard, self.holder)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.guard, self.holder)
    }
}

/// holder의 로드된 연관 관계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderSnapshot {
    /// 직접 grant edge
    pub grants: Vec<GrantEdge>,

    /// 보유 role (role holder는 항상 비어 있음)
    pub roles: Vec<Role>,
}

/// 스냅샷 로더
pub type SnapshotLoader<'a> = dyn Fn() -> Result<HolderSnapshot> + 'a;

/// 권한 캐시 백엔드
pub trait PermissionCache: Send + Sync + fmt::Debug {
    /// 캐시된 스냅샷을 돌려주거나, 없으면 로드해서 저장
    fn get_or_load(&self, key: &CacheKey, load: &SnapshotLoader<'_>) -> Result<Arc<HolderSnapshot>>;

    /// holder의 모든 guard 항목 무효화
    fn forget(&self, holder: &Holder);

    /// 전체 무효화
    fn flush(&self);

    /// 저장된 항목 수
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 메모리 캐시
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, Arc<HolderSnapshot>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PermissionCache for MemoryCache {
    fn get_or_load(&self, key: &CacheKey, load: &SnapshotLoader<'_>) -> Result<Arc<HolderSnapshot>> {
        if let Some(snapshot) = self.entries.read().get(key) {
            return Ok(Arc::clone(snapshot));
        }

        let mut entries = self.entries.write();
        // 다른 스레드가 먼저 로드했을 수 있음
        if let Some(snapshot) = entries.get(key) {
            return Ok(Arc::clone(snapshot));
        }

        let snapshot = Arc::new(load()?);
        tracing::debug!(key = %key, grants = snapshot.grants.len(), "permission cache loaded");
        entries.insert(key.clone(), Arc::clone(&snapshot));
        Ok(snapshot)
    }

    fn forget(&self, holder: &Holder) {
        self.entries.write().retain(|key, _| key.holder != *holder);
    }

    fn flush(&self) {
        self.entries.write().clear();
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// 캐시하지 않는 백엔드
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl PermissionCache for NullCache {
    fn get_or_load(&self, _key: &CacheKey, load: &SnapshotLoader<'_>) -> Result<Arc<HolderSnapshot>> {
        Ok(Arc::new(load()?))
    }

    fn forget(&self, _holder: &Holder) {}

    fn flush(&self) {}

    fn len(&self) -> usize {
        0
    }
}
