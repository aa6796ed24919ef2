use axum::extract::FromRef;

use crate::persona::PersonaStore;
use crate::recommendation::RecommendationService;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedRecommendationService = Arc<RecommendationService>;
pub type GuardedPersonaStore = Arc<PersonaStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub recommendation_service: GuardedRecommendationService,
    pub personas: GuardedPersonaStore,
    pub hash: String,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedRecommendationService {
    fn from_ref(input: &ServerState) -> Self {
        input.recommendation_service.clone()
    }
}

impl FromRef<ServerState> for GuardedPersonaStore {
    fn from_ref(input: &ServerState) -> Self {
        input.personas.clone()
    }
}
