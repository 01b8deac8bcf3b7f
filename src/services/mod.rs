//! Business logic services

pub mod accounts;
pub mod assistant;
pub mod catalog;
pub mod circulation;
pub mod stats;

use crate::{config::AssistantConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub accounts: accounts::AccountService,
    pub catalog: catalog::CatalogService,
    pub circulation: circulation::CirculationService,
    pub assistant: assistant::AssistantService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, assistant_config: AssistantConfig) -> Self {
        Self {
            accounts: accounts::AccountService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            circulation: circulation::CirculationService::new(repository.clone()),
            assistant: assistant::AssistantService::new(repository.clone(), assistant_config),
            stats: stats::StatsService::new(repository),
        }
    }
}
