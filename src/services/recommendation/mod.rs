use crate::algorithms::Recommender;
use crate::config::Config;
use crate::error::{RecommenderError, Result};
use crate::models::*;
use crate::services::session::{InMemorySessionStore, Session, SessionStore};
use crate::utils::stats::{summarize, DatasetSummary};
use crate::utils::validation::resolve_limit;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Compile, query and summarise over sessions held in a [`SessionStore`].
///
/// Fitting and summarising share one process-wide lock so at most one of
/// them runs at a time. Queries read an immutable fitted model and never
/// take the lock.
pub struct RecommendationService {
    config: Arc<Config>,
    sessions: Arc<dyn SessionStore>,
    compute_lock: Mutex<()>,
}

impl RecommendationService {
    pub fn new(config: Arc<Config>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            config,
            sessions,
            compute_lock: Mutex::new(()),
        }
    }

    pub fn in_memory(config: Arc<Config>) -> Self {
        let sessions = Arc::new(InMemorySessionStore::new(&config.sessions));
        Self::new(config, sessions)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn create_session(&self, dataset: Dataset) -> SessionInfo {
        let session_id = Uuid::new_v4();
        let session = Session::new(dataset);
        let info = SessionInfo {
            session_id,
            columns: session.dataset.columns().to_vec(),
            rows: session.dataset.len(),
            created_at: session.created_at,
        };

        self.sessions.put(session_id, Arc::new(session));
        info!("Created session {} with {} rows", session_id, info.rows);
        info
    }

    /// Fits a fresh recommender on the session's dataset, replacing any
    /// previously compiled one. A failed fit leaves the session untouched.
    ///
    /// A session closed or expired while the fit runs stays gone; the
    /// compile then reports it as unknown.
    pub fn compile(&self, session_id: Uuid, spec: CompileSpec) -> Result<CompileSummary> {
        let _guard = self.compute_lock.lock();
        let session = self.session(&session_id)?;

        let mut recommender = Recommender::new(spec, &self.config);
        let summary = recommender.fit(&session.dataset)?;

        let compiled = Arc::new(session.with_recommender(recommender));
        if !self.sessions.replace(&session_id, &session, compiled) {
            warn!("Session {} went away while compiling", session_id);
            return Err(RecommenderError::unknown("session", session_id.to_string()));
        }

        info!("Session {} compiled a {} model", session_id, summary.algorithm);
        Ok(summary)
    }

    pub fn recommend(
        &self,
        session_id: Uuid,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse> {
        let limit = resolve_limit(request.limit, &self.config.recommendation)?;
        let session = self.session(&session_id)?;
        let recommender = session
            .recommender
            .as_ref()
            .ok_or(RecommenderError::NotFitted)?;

        Ok(RecommendationResponse {
            session_id,
            recommendations: recommender.recommend(&request.query, limit)?,
            generated_at: Utc::now(),
        })
    }

    pub fn summary(&self, session_id: Uuid) -> Result<DatasetSummary> {
        let session = self.session(&session_id)?;
        let _guard = self.compute_lock.lock();
        Ok(summarize(&session.dataset))
    }

    pub fn close_session(&self, session_id: Uuid) -> Result<()> {
        match self.sessions.evict(&session_id) {
            Some(_) => {
                info!("Closed session {}", session_id);
                Ok(())
            }
            None => Err(RecommenderError::unknown("session", session_id.to_string())),
        }
    }

    pub fn sweep_expired(&self) -> usize {
        self.sessions.evict_expired()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn session(&self, session_id: &Uuid) -> Result<Arc<Session>> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| RecommenderError::unknown("session", session_id.to_string()))
    }
}
