//! Fact ingestion from conversation
//!
//! Orchestrates the learning flow: one extraction round that proposes new
//! domains and raw facts, domain creation, grouping of facts by target
//! domain, and one merge-planning round per domain whose changes are
//! applied to the store.
//!
//! Like retrieval, ingestion never fails the caller. An unavailable
//! oracle means nothing is learned this turn; a single bad line is
//! skipped, never the batch.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::memory::prompts::{EXTRACT_PROMPT, MERGE_PROMPT, SYSTEM_INSTRUCTION};
use crate::oracle::{Oracle, extract_block};
use crate::store::{FactMode, KnowledgeStore};

/// Sampling temperature for both ingestion rounds.
const EXTRACTION_TEMPERATURE: f32 = 0.2;

/// One parsed line of the round-2 merge plan.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedChange {
    mode: FactMode,
    subfield: String,
    fact: String,
}

/// Engine for the two-round learning protocol.
pub struct IngestionEngine {
    oracle: Arc<dyn Oracle>,
}

impl IngestionEngine {
    /// Create a new ingestion engine on a shared oracle handle.
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Learn new facts from the latest turn.
    ///
    /// `query` is the running conversation summary plus the user's last
    /// interaction; `recalled` is what retrieval just produced, passed to
    /// the oracle as already known. Returns a `domain:subfield:fact`
    /// trailer for the last applied change, or `None` when nothing was
    /// applied.
    pub async fn learn(
        &self,
        store: &mut KnowledgeStore,
        query: &str,
        recalled: &str,
    ) -> Option<String> {
        let reply = match self
            .oracle
            .complete(
                &EXTRACT_PROMPT
                    .replace("{query}", query)
                    .replace("{recalled}", recalled)
                    .replace("{domains}", &store.domain_names().join("\n")),
                SYSTEM_INSTRUCTION,
                EXTRACTION_TEMPERATURE,
            )
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    "Oracle {} unavailable for extraction: {}",
                    self.oracle.name(),
                    e
                );
                return None;
            }
        };

        // New domains first, so their facts survive the registration check
        for line in block_lines(&reply, "new") {
            let (name, description) = line.split_once('|').unwrap_or((line.as_str(), ""));
            store.add_domain(name, description.trim());
        }

        let grouped = group_facts(store, block_lines(&reply, "fact"));

        let mut trailer = None;
        for (domain, facts) in grouped {
            for change in self.plan_merge(store, &domain, &facts).await {
                match store.upsert_fact(&domain, &change.subfield, &change.fact, change.mode) {
                    Ok(()) => {
                        trailer = Some(format!("{domain}:{}:{}", change.subfield, change.fact));
                    }
                    Err(e) => warn!("Dropping change for {}: {}", domain, e),
                }
            }
        }

        trailer
    }

    /// Round 2: ask the oracle how one domain's pending facts map onto
    /// its subfields. Returns the applicable changes in emission order.
    async fn plan_merge(
        &self,
        store: &KnowledgeStore,
        domain: &str,
        facts: &[String],
    ) -> Vec<PlannedChange> {
        let prompt = MERGE_PROMPT
            .replace("{domain}", domain)
            .replace("{subfields}", &store.subfield_names(domain).join(", "))
            .replace("{facts}", &facts.join("\n"));

        let reply = match self
            .oracle
            .complete(&prompt, SYSTEM_INSTRUCTION, EXTRACTION_TEMPERATURE)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    "Oracle {} unavailable for merge of {}: {}",
                    self.oracle.name(),
                    domain,
                    e
                );
                return Vec::new();
            }
        };

        block_lines(&reply, "ans")
            .iter()
            .filter_map(|line| parse_change_line(line))
            .collect()
    }
}

/// Non-empty trimmed lines of one tagged block; empty when absent.
fn block_lines(reply: &str, tag: &str) -> Vec<String> {
    extract_block(reply, tag)
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Group fact lines by target domain, dropping lines without a `|` and
/// facts whose domain is unregistered. First-seen domain order and
/// arrival order within a domain are both preserved.
fn group_facts(store: &KnowledgeStore, lines: Vec<String>) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for line in lines {
        let Some((domain, fact)) = line.split_once('|') else {
            debug!("Dropping fact line without a domain: {}", line);
            continue;
        };
        let domain = domain.trim();
        let fact = fact.trim();
        if !store.has_domain(domain) {
            debug!("Dropping fact for unregistered domain: {}", domain);
            continue;
        }
        match grouped.iter_mut().find(|(d, _)| d == domain) {
            Some((_, facts)) => facts.push(fact.to_string()),
            None => grouped.push((domain.to_string(), vec![fact.to_string()])),
        }
    }
    grouped
}

/// Parse one `Add/Alter | subfield | "fact"` line.
///
/// A line that does not split into exactly three fields, or whose action
/// token is neither `add` nor `alter`, is skipped with a warning; the
/// rest of the batch is unaffected.
fn parse_change_line(line: &str) -> Option<PlannedChange> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() != 3 {
        warn!("Skipping malformed change line: {}", line);
        return None;
    }
    let (action, subfield, fact) = (fields[0], fields[1], fields[2]);

    let mode = match action.to_lowercase().as_str() {
        "add" => FactMode::Add,
        "alter" => FactMode::Alter,
        other => {
            warn!("Skipping change line with unknown action {:?}: {}", other, line);
            return None;
        }
    };

    let fact = fact
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(fact);

    Some(PlannedChange {
        mode,
        subfield: subfield.to_string(),
        fact: fact.to_string(),
    })
}
