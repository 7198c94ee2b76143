//! 메모리 기반 협력자 -- 오프라인 렌더링과 테스트용

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tracing::debug;

use logforward_core::api::{ClusterLogForwarder, ForwarderStatus};
use logforward_core::error::StoreError;
use logforward_core::store::{
    AccessReviewer, ConfigMap, ObjectStore, RenderedConfig, Secret, ServiceAccount,
    SubjectAccessReview,
};

use crate::error::CompilerError;

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_owned(), name.to_owned())
}

/// 네임스페이스/이름으로 색인한 오브젝트 스토어
#[derive(Debug, Default)]
pub struct MemoryStore {
    forwarders: RwLock<BTreeMap<Key, ClusterLogForwarder>>,
    secrets: RwLock<BTreeMap<Key, Secret>>,
    config_maps: RwLock<BTreeMap<Key, ConfigMap>>,
    service_accounts: RwLock<BTreeMap<Key, ServiceAccount>>,
    rendered: RwLock<BTreeMap<Key, RenderedConfig>>,
    statuses: RwLock<BTreeMap<Key, ForwarderStatus>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forwarder(mut self, forwarder: ClusterLogForwarder) -> Self {
        let k = key(forwarder.namespace(), forwarder.name());
        self.forwarders.get_mut().insert(k, forwarder);
        self
    }

    pub fn with_secret(mut self, namespace: &str, secret: Secret) -> Self {
        let k = key(namespace, &secret.name);
        self.secrets.get_mut().insert(k, secret);
        self
    }

    pub fn with_config_map(mut self, namespace: &str, config_map: ConfigMap) -> Self {
        let k = key(namespace, &config_map.name);
        self.config_maps.get_mut().insert(k, config_map);
        self
    }

    pub fn with_service_account(mut self, namespace: &str, name: &str) -> Self {
        let account = ServiceAccount {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
        };
        self.service_accounts.get_mut().insert(key(namespace, name), account);
        self
    }

    /// 디렉토리에서 시크릿과 컨피그맵을 읽어 들입니다.
    ///
    /// ```text
    /// <dir>/secrets/<name>/<key>
    /// <dir>/configmaps/<name>/<key>
    /// ```
    ///
    /// 없는 하위 디렉토리는 건너뜁니다.
    pub fn load_dir(mut self, dir: &Path, namespace: &str) -> Result<Self, CompilerError> {
        for (name, data) in read_objects(&dir.join("secrets"))? {
            debug!(secret = %name, keys = data.len(), "loaded secret");
            let k = key(namespace, &name);
            self.secrets.get_mut().insert(k, Secret { name, data });
        }
        for (name, data) in read_objects(&dir.join("configmaps"))? {
            debug!(config_map = %name, keys = data.len(), "loaded configmap");
            let k = key(namespace, &name);
            self.config_maps.get_mut().insert(k, ConfigMap { name, data });
        }
        Ok(self)
    }

    /// 이후 모든 호출이 `StoreError::Request`로 실패하게 합니다.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Request("store unavailable".to_owned()));
        }
        Ok(())
    }

    /// 마지막으로 기록된 렌더링 결과
    pub async fn rendered(&self, namespace: &str, name: &str) -> Option<RenderedConfig> {
        self.rendered.read().await.get(&key(namespace, name)).cloned()
    }

    /// 마지막으로 기록된 상태
    pub async fn status(&self, namespace: &str, name: &str) -> Option<ForwarderStatus> {
        self.statuses.read().await.get(&key(namespace, name)).cloned()
    }
}

fn read_objects(dir: &Path) -> Result<BTreeMap<String, BTreeMap<String, String>>, CompilerError> {
    let mut objects = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(objects);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let mut data = BTreeMap::new();
        for file in std::fs::read_dir(entry.path())? {
            let file = file?;
            if file.file_type()?.is_file() {
                let value = std::fs::read_to_string(file.path())?;
                data.insert(file.file_name().to_string_lossy().into_owned(), value);
            }
        }
        objects.insert(entry.file_name().to_string_lossy().into_owned(), data);
    }
    Ok(objects)
}

impl ObjectStore for MemoryStore {
    async fn get_forwarder(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ClusterLogForwarder>, StoreError> {
        self.check()?;
        Ok(self.forwarders.read().await.get(&key(namespace, name)).cloned())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        self.check()?;
        Ok(self.secrets.read().await.get(&key(namespace, name)).cloned())
    }

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, StoreError> {
        self.check()?;
        Ok(self.config_maps.read().await.get(&key(namespace, name)).cloned())
    }

    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccount>, StoreError> {
        self.check()?;
        Ok(self.service_accounts.read().await.get(&key(namespace, name)).cloned())
    }

    async fn put_config(&self, config: RenderedConfig) -> Result<(), StoreError> {
        self.check()?;
        let k = key(&config.namespace, &config.name);
        self.rendered.write().await.insert(k, config);
        Ok(())
    }

    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: ForwarderStatus,
    ) -> Result<(), StoreError> {
        self.check()?;
        let k = key(namespace, name);
        if let Some(forwarder) = self.forwarders.write().await.get_mut(&k) {
            forwarder.status = status.clone();
        }
        self.statuses.write().await.insert(k, status);
        Ok(())
    }
}

/// 고정된 입력 유형만 허용하는 리뷰어
#[derive(Debug, Clone, Default)]
pub struct StaticReviewer {
    allow_all: bool,
    allowed: BTreeSet<String>,
}

impl StaticReviewer {
    pub fn allow_all() -> Self {
        Self {
            allow_all: true,
            allowed: BTreeSet::new(),
        }
    }

    pub fn allowing<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow_all: false,
            allowed: types.into_iter().map(Into::into).collect(),
        }
    }
}

impl AccessReviewer for StaticReviewer {
    async fn review(&self, review: SubjectAccessReview) -> Result<bool, StoreError> {
        Ok(self.allow_all || self.allowed.contains(&review.name))
    }
}
