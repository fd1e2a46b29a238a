//! Server dependencies (using traits for testability)
//!
//! Handlers reach persistence and token verification only through this
//! container; nothing is global.

use sqlx::PgPool;
use std::sync::Arc;

use crate::domains::aba_centers::{AbaCenterStore, PgAbaCenterStore};
use crate::domains::auth::PermissionGate;
use crate::domains::providers::{PgProviderStore, ProviderStore};
use crate::domains::regional_centers::{PgRegionalCenterStore, RegionalCenterStore};
use crate::domains::resources::{PgResourceStore, ResourceStore};
use crate::domains::search::ProximitySearchEngine;
use crate::domains::users::{PgUserStore, UserStore};

#[derive(Clone)]
pub struct ServerDeps {
    pub resources: Arc<dyn ResourceStore>,
    pub regional_centers: Arc<dyn RegionalCenterStore>,
    pub aba_centers: Arc<dyn AbaCenterStore>,
    pub providers: Arc<dyn ProviderStore>,
    pub users: Arc<dyn UserStore>,
    pub gate: Arc<PermissionGate>,
    /// Present when backed by Postgres; the health check pings it
    pub db_pool: Option<PgPool>,
}

impl ServerDeps {
    /// Create new ServerDeps with the given stores
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        regional_centers: Arc<dyn RegionalCenterStore>,
        aba_centers: Arc<dyn AbaCenterStore>,
        providers: Arc<dyn ProviderStore>,
        users: Arc<dyn UserStore>,
        gate: PermissionGate,
    ) -> Self {
        Self {
            resources,
            regional_centers,
            aba_centers,
            providers,
            users,
            gate: Arc::new(gate),
            db_pool: None,
        }
    }

    /// Postgres-backed stores sharing one pool
    pub fn postgres(pool: PgPool, gate: PermissionGate) -> Self {
        let mut deps = Self::new(
            Arc::new(PgResourceStore::new(pool.clone())),
            Arc::new(PgRegionalCenterStore::new(pool.clone())),
            Arc::new(PgAbaCenterStore::new(pool.clone())),
            Arc::new(PgProviderStore::new(pool.clone())),
            Arc::new(PgUserStore::new(pool.clone())),
            gate,
        );
        deps.db_pool = Some(pool);
        deps
    }

    pub fn resource_search(&self) -> ProximitySearchEngine<dyn ResourceStore> {
        ProximitySearchEngine::new(self.resources.clone())
    }

    pub fn regional_center_search(&self) -> ProximitySearchEngine<dyn RegionalCenterStore> {
        ProximitySearchEngine::new(self.regional_centers.clone())
    }

    pub fn provider_search(&self) -> ProximitySearchEngine<dyn ProviderStore> {
        ProximitySearchEngine::new(self.providers.clone())
    }
}
