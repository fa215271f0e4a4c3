use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;

use crate::{
    api,
    config::Config,
    observability::Telemetry,
    store::{CorpusDao, PgCorpusDao},
    tagmap::TagMapService,
};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    service: TagMapService,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn config(&self) -> &Config {
        &self.registry.config
    }

    pub(crate) fn service(&self) -> &TagMapService {
        &self.registry.service
    }
}

impl ComponentRegistry {
    /// 構成情報と依存をまとめて初期化し、アプリケーションの共有レジストリを構築する。
    ///
    /// 接続プールは遅延接続なので、DB が落ちていても起動はできる（ready プローブで検知）。
    ///
    /// # Errors
    /// Telemetry の初期化や接続プールの構成が失敗した場合はエラーを返す。
    pub fn build(config: Config) -> Result<Self> {
        let telemetry = Telemetry::new(&config.tracing_settings())?;
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections())
            .min_connections(config.db_min_connections())
            .acquire_timeout(config.db_acquire_timeout())
            .idle_timeout(Some(config.db_idle_timeout()))
            .max_lifetime(Some(config.db_max_lifetime()))
            .test_before_acquire(true)
            .connect_lazy(config.db_dsn())
            .context("failed to configure corpus db connection pool")?;
        let dao: Arc<dyn CorpusDao> = Arc::new(PgCorpusDao::new(pool));
        Ok(Self::assemble(config, telemetry, dao))
    }

    /// 任意のコーパスアクセサでレジストリを組み立てる。トレーシングは初期化しない。
    ///
    /// # Errors
    /// メトリクス登録に失敗した場合はエラーを返す。
    pub fn with_dao(config: Config, dao: Arc<dyn CorpusDao>) -> Result<Self> {
        let telemetry = Telemetry::metrics_only()?;
        Ok(Self::assemble(config, telemetry, dao))
    }

    fn assemble(config: Config, telemetry: Telemetry, dao: Arc<dyn CorpusDao>) -> Self {
        let service = TagMapService::new(dao, telemetry.metrics_arc());
        Self {
            config: Arc::new(config),
            telemetry,
            service,
        }
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    let state = AppState::new(registry);
    api::router(state)
}
