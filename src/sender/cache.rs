use super::application::ApplicationApi;
use super::error::ApiError;
use crate::domain::Application;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Name-indexed copy of the remote application list.
///
/// Entries are never evicted one by one; the cache is cleared and refilled
/// as a whole.
#[derive(Debug, Default, Clone)]
pub struct ApplicationCache {
    entries: HashMap<String, Application>,
}

impl ApplicationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Application> {
        self.entries.get(name)
    }

    /// All cached applications, sorted by name.
    pub fn get_all(&self) -> Vec<Application> {
        let mut all: Vec<_> = self.entries.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn insert(&mut self, application: Application) {
        self.entries.insert(application.name.clone(), application);
    }

    pub fn extend(&mut self, applications: impl IntoIterator<Item = Application>) {
        for application in applications {
            self.insert(application);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Caching decorator over any [`ApplicationApi`].
///
/// One mutex guards the cache for the whole of each operation, so a
/// check-then-create cannot race another caller on the same client.
#[derive(Debug)]
pub struct CachedApplicationApi<A> {
    inner: A,
    cache: Mutex<ApplicationCache>,
}

impl<A: ApplicationApi> CachedApplicationApi<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            cache: Mutex::new(ApplicationCache::new()),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn cached(&self) -> Vec<Application> {
        self.cache.lock().await.get_all()
    }

    async fn refresh(&self, cache: &mut ApplicationCache) -> Result<Vec<Application>, ApiError> {
        cache.clear();
        let applications = self.inner.get_applications().await?;
        cache.extend(applications.iter().cloned());
        debug!("Application cache refreshed with {} entries", cache.len());
        Ok(applications)
    }

    async fn lookup(
        &self,
        cache: &mut ApplicationCache,
        name: &str,
    ) -> Result<Option<Application>, ApiError> {
        if let Some(application) = cache.get(name) {
            return Ok(Some(application.clone()));
        }

        debug!("Application {name} not cached, refreshing");
        self.refresh(cache).await?;
        Ok(cache.get(name).cloned())
    }
}

#[async_trait]
impl<A: ApplicationApi> ApplicationApi for CachedApplicationApi<A> {
    async fn get_applications(&self) -> Result<Vec<Application>, ApiError> {
        let mut cache = self.cache.lock().await;
        if !cache.is_empty() {
            return Ok(cache.get_all());
        }
        self.refresh(&mut cache).await
    }

    async fn get_application_by_name(&self, name: &str) -> Result<Option<Application>, ApiError> {
        let mut cache = self.cache.lock().await;
        self.lookup(&mut cache, name).await
    }

    async fn create_application(&self, name: &str) -> Result<Application, ApiError> {
        let mut cache = self.cache.lock().await;
        if let Some(existing) = self.lookup(&mut cache, name).await? {
            return Ok(existing);
        }

        let created = self.inner.create_application(name).await?;
        cache.insert(created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::application::MockApplicationApi;
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn app(name: &str) -> Application {
        Application::new(Uuid::new_v4(), name)
    }

    #[test]
    fn test_get_all_is_sorted_by_name() {
        let mut cache = ApplicationCache::new();
        cache.extend([app("web"), app("api"), app("db")]);
        let names: Vec<_> = cache.get_all().into_iter().map(|a| a.name).collect();
        assert_eq!(names, ["api", "db", "web"]);
    }

    #[tokio::test]
    async fn test_populates_once_then_serves_hits() {
        let svc = app("svc");
        let listed = vec![svc.clone()];

        let mut mock = MockApplicationApi::new();
        mock.expect_get_applications()
            .times(1)
            .returning(move || Ok(listed.clone()));

        let cached = CachedApplicationApi::new(mock);
        assert_eq!(cached.get_applications().await.unwrap(), vec![svc.clone()]);
        assert_eq!(
            cached.get_application_by_name("svc").await.unwrap(),
            Some(svc.clone())
        );
        assert_eq!(cached.get_applications().await.unwrap(), vec![svc]);
    }

    #[tokio::test]
    async fn test_miss_refreshes_exactly_once() {
        let mut mock = MockApplicationApi::new();
        mock.expect_get_applications()
            .times(1)
            .returning(|| Ok(vec![app("other")]));

        let cached = CachedApplicationApi::new(mock);
        assert_eq!(cached.get_application_by_name("svc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_is_skipped_when_application_exists() {
        let svc = app("svc");
        let listed = vec![svc.clone()];

        let mut mock = MockApplicationApi::new();
        mock.expect_get_applications()
            .times(1)
            .returning(move || Ok(listed.clone()));
        mock.expect_create_application().never();

        let cached = CachedApplicationApi::new(mock);
        assert_eq!(cached.create_application("svc").await.unwrap(), svc);
    }

    #[tokio::test]
    async fn test_second_create_hits_the_cache() {
        let created = app("svc");
        let returned = created.clone();

        let mut mock = MockApplicationApi::new();
        mock.expect_get_applications()
            .times(1)
            .returning(|| Ok(Vec::new()));
        mock.expect_create_application()
            .with(eq("svc"))
            .times(1)
            .returning(move |_| Ok(returned.clone()));

        let cached = CachedApplicationApi::new(mock);
        let first = cached.create_application("svc").await.unwrap();
        let second = cached.create_application("svc").await.unwrap();
        assert_eq!(first.id, created.id);
        assert_eq!(second.id, created.id);
    }

    #[tokio::test]
    async fn test_refresh_failure_propagates() {
        let mut mock = MockApplicationApi::new();
        mock.expect_get_applications().times(1).returning(|| {
            Err(ApiError::Auth {
                reason: "expired".to_string(),
            })
        });

        let cached = CachedApplicationApi::new(mock);
        assert!(matches!(
            cached.get_application_by_name("svc").await,
            Err(ApiError::Auth { .. })
        ));
    }
}
