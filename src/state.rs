use std::sync::Arc;

use crate::config::{AppConfig, SessionConfig, VisitStoreKind};
use crate::gateway::{Gateway, HttpUpstream, Upstream, UpstreamError};
use crate::store::{MemoryVisitStore, UpstreamVisitStore, VisitStore};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    // Arc<dyn Trait> so tests can inject a fake store
    pub visits: Arc<dyn VisitStore>,
    pub session: Arc<SessionConfig>,
    pub upstream_configured: bool,
}

impl AppState {
    pub fn new(upstream: Arc<dyn Upstream>, session: SessionConfig, visits: VisitStoreKind) -> Self {
        let gateway = Gateway::new(upstream, session.cookie_name.clone());
        let visits: Arc<dyn VisitStore> = match visits {
            VisitStoreKind::Upstream => Arc::new(UpstreamVisitStore::new(gateway.clone())),
            VisitStoreKind::Memory => Arc::new(MemoryVisitStore::new()),
        };
        Self {
            gateway,
            visits,
            session: Arc::new(session),
            upstream_configured: true,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, UpstreamError> {
        let upstream = HttpUpstream::new(&config.upstream)?;
        let mut state = Self::new(Arc::new(upstream), config.session.clone(), config.visits);
        state.upstream_configured = config.upstream.base_url.is_some();
        Ok(state)
    }

    pub fn with_visit_store(mut self, visits: Arc<dyn VisitStore>) -> Self {
        self.visits = visits;
        self
    }
}
