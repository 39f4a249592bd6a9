//! Per-conversation session
//!
//! A session owns one knowledge store, one context window, and the two
//! memory engines, all sharing a single oracle handle. Sessions are
//! independent: concurrent conversations each construct their own, and
//! nothing is shared process-wide.
//!
//! The caller drives one turn as: `add_turn` -> `retrieve` -> `learn` ->
//! compose the reply (outside this crate) -> `save`.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::memory::{ContextWindow, IngestionEngine, RetrievalEngine};
use crate::oracle::Oracle;
use crate::store::{ConvoStarter, KnowledgeStore};

/// One user's conversation session.
pub struct Session {
    id: Uuid,
    store: KnowledgeStore,
    snapshot_path: PathBuf,
    context: ContextWindow,
    retrieval: RetrievalEngine,
    ingestion: IngestionEngine,
}

impl Session {
    /// Open a session from configuration, loading the store from the
    /// configured snapshot path.
    ///
    /// Fails only when the snapshot cannot be read or is corrupt; every
    /// later irregularity degrades inside the engines.
    pub fn new(config: &Config, oracle: Arc<dyn Oracle>) -> Result<Self> {
        let store = KnowledgeStore::load(&config.store.snapshot_path)?;
        Ok(Self::with_store(
            store,
            config.store.snapshot_path.clone(),
            oracle,
            config.context.byte_budget,
        ))
    }

    /// Build a session around an already-loaded store.
    pub fn with_store(
        store: KnowledgeStore,
        snapshot_path: PathBuf,
        oracle: Arc<dyn Oracle>,
        context_budget: usize,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(session = %id, oracle = oracle.name(), "Session opened");
        Self {
            id,
            store,
            snapshot_path,
            context: ContextWindow::new(context_budget, oracle.clone()),
            retrieval: RetrievalEngine::new(oracle.clone()),
            ingestion: IngestionEngine::new(oracle),
        }
    }

    /// Session identifier, for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The user's name from bio data, if set.
    pub fn user_name(&self) -> Option<&str> {
        self.store.bio("name")
    }

    /// Conversation-starter context for seeding the first turn's prompt.
    pub fn convo_starter(&self) -> &ConvoStarter {
        self.store.convo_starter()
    }

    /// Read access to the knowledge store.
    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Mutable access to the knowledge store (bootstrap, bio setup).
    pub fn store_mut(&mut self) -> &mut KnowledgeStore {
        &mut self.store
    }

    /// Compress the latest turn into the context window.
    pub async fn add_turn(&mut self, actor: &str, raw_text: &str) {
        self.context.add_turn(actor, raw_text).await;
    }

    /// The "conversation so far" string for prompt building.
    pub fn render_context(&self) -> String {
        self.context.render()
    }

    /// Recall facts relevant to the contextualized query.
    pub async fn retrieve(&self, contextualized_query: &str) -> String {
        let recalled = self.retrieval.recall(&self.store, contextualized_query).await;
        debug!(
            session = %self.id,
            lines = recalled.lines().filter(|l| !l.is_empty()).count(),
            "Recall complete"
        );
        recalled
    }

    /// Learn new facts from the turn; returns the continuity trailer for
    /// the last change applied, if any.
    pub async fn learn(
        &mut self,
        contextualized_query: &str,
        recalled_text: &str,
    ) -> Option<String> {
        let trailer = self
            .ingestion
            .learn(&mut self.store, contextualized_query, recalled_text)
            .await;
        if let Some(t) = &trailer {
            debug!(session = %self.id, trailer = %t, "Learned");
        }
        trailer
    }

    /// Persist the store snapshot to the session's snapshot path.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.snapshot_path)
    }
}
