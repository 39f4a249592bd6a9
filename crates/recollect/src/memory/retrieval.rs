//! Fact retrieval over the knowledge hierarchy
//!
//! Two-round oracle protocol:
//! 1. Domain selection: the oracle narrows the registered domains to the
//!    ones relevant to the query.
//! 2. Subfield selection: per surviving domain, the oracle picks the
//!    subfields worth recalling, and their values are emitted as
//!    `domain:term:value` lines.
//!
//! Retrieval never fails the caller: an unavailable oracle or a missing
//! tagged block degrades that round to an empty selection, and the result
//! is simply a shorter (possibly empty) recalled-context string.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::memory::prompts::{DOMAIN_SELECT_PROMPT, SUBFIELD_SELECT_PROMPT, SYSTEM_INSTRUCTION};
use crate::oracle::{Oracle, extract_block};
use crate::store::KnowledgeStore;

/// Sampling temperature for both selection rounds. Selection wants
/// stable, list-shaped output, not creativity.
const SELECTION_TEMPERATURE: f32 = 0.2;

/// Engine for the two-round recall protocol.
pub struct RetrievalEngine {
    oracle: Arc<dyn Oracle>,
}

impl RetrievalEngine {
    /// Create a new retrieval engine on a shared oracle handle.
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Recall facts relevant to a contextualized query.
    ///
    /// Returns the newline join of `domain:term:value` lines in round-2
    /// emission order: domain groups as the oracle returned them, terms
    /// within a group in oracle order, duplicates preserved. Empty when
    /// nothing was selected or the oracle was unavailable.
    pub async fn recall(&self, store: &KnowledgeStore, query: &str) -> String {
        let domains = self.select_domains(store, query).await;
        if domains.is_empty() {
            debug!("Round 1 selected no domains");
            return String::new();
        }

        let selections = self.select_subfields(store, query, &domains).await;

        let mut recalled: Vec<String> = Vec::new();
        for (domain, terms) in selections {
            if !store.has_domain(&domain) {
                debug!("Discarding unregistered domain from round 2: {}", domain);
                continue;
            }
            for term in terms {
                match store.fact(&domain, &term) {
                    Some(value) if !value.is_empty() => {
                        recalled.push(format!("{domain}:{term}:{value}"));
                    }
                    _ => {}
                }
            }
        }

        recalled.join("\n")
    }

    /// Round 1: ask the oracle which registered domains matter.
    async fn select_domains(&self, store: &KnowledgeStore, query: &str) -> Vec<String> {
        let domain_names = store.domain_names();
        if domain_names.is_empty() {
            return Vec::new();
        }

        let prompt = DOMAIN_SELECT_PROMPT
            .replace("{query}", query)
            .replace("{domains}", &domain_names.join("\n"));

        let Some(payload) = self.round(&prompt).await else {
            return Vec::new();
        };

        payload
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| {
                let known = store.has_domain(line);
                if !known {
                    debug!("Discarding unregistered domain from round 1: {}", line);
                }
                known
            })
            .map(str::to_string)
            .collect()
    }

    /// Round 2: per domain, ask the oracle which subfields to pull.
    ///
    /// Returns `(domain, terms)` pairs in oracle emission order.
    async fn select_subfields(
        &self,
        store: &KnowledgeStore,
        query: &str,
        domains: &[String],
    ) -> Vec<(String, Vec<String>)> {
        let catalog: Vec<String> = domains
            .iter()
            .map(|d| format!("{d} | {}", store.subfield_names(d).join(", ")))
            .collect();

        let prompt = SUBFIELD_SELECT_PROMPT
            .replace("{query}", query)
            .replace("{catalog}", &catalog.join("\n"));

        let Some(payload) = self.round(&prompt).await else {
            return Vec::new();
        };

        payload
            .lines()
            .filter_map(|line| {
                let (domain, terms) = line.split_once('|')?;
                let terms: Vec<String> = terms
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect();
                Some((domain.trim().to_string(), terms))
            })
            .collect()
    }

    /// One oracle call, degraded to `None` on failure or a missing block.
    async fn round(&self, prompt: &str) -> Option<String> {
        match self
            .oracle
            .complete(prompt, SYSTEM_INSTRUCTION, SELECTION_TEMPERATURE)
            .await
        {
            Ok(reply) => extract_block(&reply, "keys"),
            Err(e) => {
                warn!("Oracle {} unavailable for recall: {}", self.oracle.name(), e);
                None
            }
        }
    }
}
