use axum::extract::FromRef;

use crate::blacklist::BlacklistSource;
use crate::gateway::CacheGateway;
use crate::pipeline::TrackPipeline;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedPipeline = Arc<TrackPipeline>;
pub type GuardedGateway = Arc<CacheGateway>;
pub type GuardedBlacklistSource = Arc<dyn BlacklistSource>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub pipeline: GuardedPipeline,
    pub gateway: GuardedGateway,
    pub blacklist: GuardedBlacklistSource,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        pipeline: GuardedPipeline,
        gateway: GuardedGateway,
        blacklist: GuardedBlacklistSource,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            hash: env!("GIT_HASH").to_owned(),
            pipeline,
            gateway,
            blacklist,
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedPipeline {
    fn from_ref(input: &ServerState) -> Self {
        input.pipeline.clone()
    }
}

impl FromRef<ServerState> for GuardedGateway {
    fn from_ref(input: &ServerState) -> Self {
        input.gateway.clone()
    }
}

impl FromRef<ServerState> for GuardedBlacklistSource {
    fn from_ref(input: &ServerState) -> Self {
        input.blacklist.clone()
    }
}
