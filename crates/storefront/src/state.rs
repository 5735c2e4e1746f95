//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::rag::{KnowledgeBase, RagError};
use crate::services::tcs::{TcsClient, TcsError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("TCS client: {0}")]
    Tcs(#[from] TcsError),
    #[error("knowledge corpus: {0}")]
    Knowledge(#[from] RagError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    tcs: TcsClient,
    knowledge: KnowledgeBase,
}

impl AppState {
    /// Create the application state, loading the knowledge corpus from
    /// `config.rag_corpus_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus cannot be loaded or the TCS client
    /// cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let knowledge = KnowledgeBase::load(&config.rag_corpus_path)?;
        Self::with_knowledge(config, pool, knowledge)
    }

    /// Create the application state with an already-built corpus.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCS client cannot be built.
    pub fn with_knowledge(
        config: StorefrontConfig,
        pool: PgPool,
        knowledge: KnowledgeBase,
    ) -> Result<Self, StateError> {
        let tcs = TcsClient::new(&config.tcs)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tcs,
                knowledge,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the TCS tracking client.
    #[must_use]
    pub fn tcs(&self) -> &TcsClient {
        &self.inner.tcs
    }

    /// Get a reference to the knowledge corpus.
    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.inner.knowledge
    }
}
