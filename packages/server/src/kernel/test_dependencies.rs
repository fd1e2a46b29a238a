// TestDependencies - in-memory stores for testing
//
// Mirror the Postgres stores closely enough for handler and engine tests:
// records with stored geometry are ranked "natively", everything else goes
// through the fallback path.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::ServerDeps;
use crate::common::pagination::{Page, PageRequest};
use crate::domains::aba_centers::{AbaCenter, AbaCenterInput, AbaCenterSearch, AbaCenterStore};
use crate::domains::auth::{JwtService, PermissionGate};
use crate::domains::locations::{calculate_distance, Coordinate, CoordinateExtractor, DistanceUnit};
use crate::domains::providers::{Provider, ProviderStore};
use crate::domains::regional_centers::{RegionalCenter, RegionalCenterStore};
use crate::domains::resources::{Resource, ResourceInput, ResourceStore};
use crate::domains::search::{
    rank, AttributeFilters, Locatable, ProximityStore, Ranked, StoreError,
};
use crate::domains::users::{User, UserStore};

/// Secret used by [`TestDependencies`] to sign and verify tokens
pub const TEST_JWT_SECRET: &str = "test_secret_key";

/// Geometry a store could index natively (both typed columns present)
pub trait StoredGeometry {
    fn stored_geometry(&self) -> Option<Coordinate>;
}

impl StoredGeometry for Resource {
    fn stored_geometry(&self) -> Option<Coordinate> {
        Coordinate::new(self.latitude?, self.longitude?).ok()
    }
}

impl StoredGeometry for RegionalCenter {
    fn stored_geometry(&self) -> Option<Coordinate> {
        Coordinate::new(self.latitude?, self.longitude?).ok()
    }
}

impl StoredGeometry for Provider {
    fn stored_geometry(&self) -> Option<Coordinate> {
        CoordinateExtractor::extract(self.location_source()).ok()
    }
}

// =============================================================================
// In-memory store
// =============================================================================

pub struct InMemoryStore<T> {
    records: Arc<Mutex<Vec<T>>>,
    native_geometry: bool,
}

impl<T: Clone> InMemoryStore<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            native_geometry: true,
        }
    }

    /// Route every record through the fallback path
    pub fn without_native_geometry(mut self) -> Self {
        self.native_geometry = false;
        self
    }

    pub fn records(&self) -> Vec<T> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T> ProximityStore<T> for InMemoryStore<T>
where
    T: StoredGeometry + Locatable + Clone + Send + Sync + 'static,
{
    async fn find_within_radius(
        &self,
        origin: Coordinate,
        radius_meters: f64,
        filters: &AttributeFilters,
    ) -> Result<Vec<Ranked<T>>, StoreError> {
        if !self.native_geometry {
            return Ok(Vec::new());
        }

        let mut ranked: Vec<Ranked<T>> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.matches(filters))
            .filter_map(|record| {
                let geometry = record.stored_geometry()?;
                let distance = calculate_distance(origin, geometry, DistanceUnit::Meters);
                (distance <= radius_meters).then(|| Ranked {
                    record: record.clone(),
                    distance,
                })
            })
            .collect();
        rank(&mut ranked);
        Ok(ranked)
    }

    async fn find_without_geometry(&self, filters: &AttributeFilters) -> Result<Vec<T>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| !self.native_geometry || record.stored_geometry().is_none())
            .filter(|record| record.matches(filters))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore<Resource> {
    async fn list(&self) -> Result<Vec<Resource>, StoreError> {
        Ok(self.records())
    }

    async fn get(&self, id: &str) -> Result<Option<Resource>, StoreError> {
        Ok(self.records.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, input: ResourceInput) -> Result<Resource, StoreError> {
        let resource = Resource::from_input(Resource::new_id(), input, Utc::now());
        self.records.lock().unwrap().push(resource.clone());
        Ok(resource)
    }

    async fn update(&self, id: &str, input: ResourceInput) -> Result<Option<Resource>, StoreError> {
        let mut records = self.records.lock().unwrap();
        let Some(existing) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        let mut updated = Resource::from_input(existing.id.clone(), input, Utc::now());
        updated.created_at = existing.created_at;
        *existing = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}

#[async_trait]
impl RegionalCenterStore for InMemoryStore<RegionalCenter> {
    async fn list(&self) -> Result<Vec<RegionalCenter>, StoreError> {
        Ok(self.records())
    }

    async fn get(&self, id: i32) -> Result<Option<RegionalCenter>, StoreError> {
        Ok(self.records.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn search(
        &self,
        filters: &AttributeFilters,
        page: PageRequest,
    ) -> Result<Page<RegionalCenter>, StoreError> {
        let matches: Vec<RegionalCenter> = self
            .records()
            .into_iter()
            .filter(|center| center.matches(filters))
            .collect();
        Ok(Page::from_matches(matches, page))
    }
}

#[async_trait]
impl AbaCenterStore for InMemoryStore<AbaCenter> {
    async fn list(&self) -> Result<Vec<AbaCenter>, StoreError> {
        let mut centers = self.records();
        centers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(centers)
    }

    async fn get(&self, id: Uuid) -> Result<Option<AbaCenter>, StoreError> {
        Ok(self.records.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn search(&self, criteria: &AbaCenterSearch) -> Result<Vec<AbaCenter>, StoreError> {
        Ok(AbaCenterStore::list(self)
            .await?
            .into_iter()
            .filter(|center| criteria.matches(center))
            .collect())
    }

    async fn create(&self, input: AbaCenterInput) -> Result<AbaCenter, StoreError> {
        let center = AbaCenter::from_input(Uuid::new_v4(), input, Utc::now());
        self.records.lock().unwrap().push(center.clone());
        Ok(center)
    }

    async fn update(
        &self,
        id: Uuid,
        input: AbaCenterInput,
    ) -> Result<Option<AbaCenter>, StoreError> {
        let mut records = self.records.lock().unwrap();
        let Some(existing) = records.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        let mut updated = AbaCenter::from_input(id, input, Utc::now());
        updated.created_at = existing.created_at;
        *existing = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|c| c.id != id);
        Ok(records.len() < before)
    }
}

#[async_trait]
impl ProviderStore for InMemoryStore<Provider> {
    async fn list(&self) -> Result<Vec<Provider>, StoreError> {
        Ok(self.records())
    }

    async fn get(&self, id: i32) -> Result<Option<Provider>, StoreError> {
        Ok(self.records.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }
}

#[async_trait]
impl UserStore for InMemoryStore<User> {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.records())
    }

    async fn get(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.records.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }
}

// =============================================================================
// Unavailable store
// =============================================================================

/// Fails every call, as a store with a dead connection would
pub struct UnavailableStore;

fn unavailable() -> StoreError {
    StoreError::Backend(anyhow!("connection refused"))
}

#[async_trait]
impl<T: Send + 'static> ProximityStore<T> for UnavailableStore {
    async fn find_within_radius(
        &self,
        _origin: Coordinate,
        _radius_meters: f64,
        _filters: &AttributeFilters,
    ) -> Result<Vec<Ranked<T>>, StoreError> {
        Err(unavailable())
    }

    async fn find_without_geometry(&self, _filters: &AttributeFilters) -> Result<Vec<T>, StoreError> {
        Err(unavailable())
    }
}

#[async_trait]
impl ResourceStore for UnavailableStore {
    async fn list(&self) -> Result<Vec<Resource>, StoreError> {
        Err(unavailable())
    }

    async fn get(&self, _id: &str) -> Result<Option<Resource>, StoreError> {
        Err(unavailable())
    }

    async fn create(&self, _input: ResourceInput) -> Result<Resource, StoreError> {
        Err(unavailable())
    }

    async fn update(
        &self,
        _id: &str,
        _input: ResourceInput,
    ) -> Result<Option<Resource>, StoreError> {
        Err(unavailable())
    }

    async fn delete(&self, _id: &str) -> Result<bool, StoreError> {
        Err(unavailable())
    }
}

#[async_trait]
impl RegionalCenterStore for UnavailableStore {
    async fn list(&self) -> Result<Vec<RegionalCenter>, StoreError> {
        Err(unavailable())
    }

    async fn get(&self, _id: i32) -> Result<Option<RegionalCenter>, StoreError> {
        Err(unavailable())
    }

    async fn search(
        &self,
        _filters: &AttributeFilters,
        _page: PageRequest,
    ) -> Result<Page<RegionalCenter>, StoreError> {
        Err(unavailable())
    }
}

#[async_trait]
impl AbaCenterStore for UnavailableStore {
    async fn list(&self) -> Result<Vec<AbaCenter>, StoreError> {
        Err(unavailable())
    }

    async fn get(&self, _id: Uuid) -> Result<Option<AbaCenter>, StoreError> {
        Err(unavailable())
    }

    async fn search(&self, _criteria: &AbaCenterSearch) -> Result<Vec<AbaCenter>, StoreError> {
        Err(unavailable())
    }

    async fn create(&self, _input: AbaCenterInput) -> Result<AbaCenter, StoreError> {
        Err(unavailable())
    }

    async fn update(
        &self,
        _id: Uuid,
        _input: AbaCenterInput,
    ) -> Result<Option<AbaCenter>, StoreError> {
        Err(unavailable())
    }

    async fn delete(&self, _id: Uuid) -> Result<bool, StoreError> {
        Err(unavailable())
    }
}

#[async_trait]
impl ProviderStore for UnavailableStore {
    async fn list(&self) -> Result<Vec<Provider>, StoreError> {
        Err(unavailable())
    }

    async fn get(&self, _id: i32) -> Result<Option<Provider>, StoreError> {
        Err(unavailable())
    }
}

#[async_trait]
impl UserStore for UnavailableStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Err(unavailable())
    }

    async fn get(&self, _id: i32) -> Result<Option<User>, StoreError> {
        Err(unavailable())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Builder for [`ServerDeps`] over in-memory stores
pub struct TestDependencies {
    pub resources: Arc<dyn ResourceStore>,
    pub regional_centers: Arc<dyn RegionalCenterStore>,
    pub aba_centers: Arc<dyn AbaCenterStore>,
    pub providers: Arc<dyn ProviderStore>,
    pub users: Arc<dyn UserStore>,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            resources: Arc::new(InMemoryStore::<Resource>::new(Vec::new())),
            regional_centers: Arc::new(InMemoryStore::<RegionalCenter>::new(Vec::new())),
            aba_centers: Arc::new(InMemoryStore::<AbaCenter>::new(Vec::new())),
            providers: Arc::new(InMemoryStore::<Provider>::new(Vec::new())),
            users: Arc::new(InMemoryStore::<User>::new(Vec::new())),
        }
    }

    pub fn with_resources(mut self, store: impl ResourceStore + 'static) -> Self {
        self.resources = Arc::new(store);
        self
    }

    pub fn with_regional_centers(mut self, store: impl RegionalCenterStore + 'static) -> Self {
        self.regional_centers = Arc::new(store);
        self
    }

    pub fn with_aba_centers(mut self, store: impl AbaCenterStore + 'static) -> Self {
        self.aba_centers = Arc::new(store);
        self
    }

    pub fn with_providers(mut self, store: impl ProviderStore + 'static) -> Self {
        self.providers = Arc::new(store);
        self
    }

    pub fn with_users(mut self, store: impl UserStore + 'static) -> Self {
        self.users = Arc::new(store);
        self
    }

    /// Every store fails
    pub fn unavailable() -> Self {
        Self {
            resources: Arc::new(UnavailableStore),
            regional_centers: Arc::new(UnavailableStore),
            aba_centers: Arc::new(UnavailableStore),
            providers: Arc::new(UnavailableStore),
            users: Arc::new(UnavailableStore),
        }
    }

    pub fn into_server_deps(self) -> ServerDeps {
        ServerDeps::new(
            self.resources,
            self.regional_centers,
            self.aba_centers,
            self.providers,
            self.users,
            PermissionGate::new(JwtService::new(TEST_JWT_SECRET, None)),
        )
    }
}
