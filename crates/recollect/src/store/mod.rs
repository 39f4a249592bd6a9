//! Hierarchical knowledge store
//!
//! Holds the per-user knowledge base: named top-level domains, each with
//! an always-present `general` summary and a map of subfield facts, plus
//! read-only bio data and the conversation-starter context used to seed a
//! session's first turn. The whole store loads from and saves to a single
//! JSON snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::{RecollectError, Result};

/// The snapshot sections that must all be present at load time.
const REQUIRED_SECTIONS: [&str; 4] = ["fields_info", "bio_data", "data", "convo_starter"];

/// A top-level knowledge domain.
///
/// Serializes as one flat JSON object: the `general` summary sits beside
/// the subfield entries, so `"general"` is a reserved key and never
/// appears in `subfields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Domain-level synopsis, always present (possibly empty)
    pub general: String,
    /// Subfield name -> fact text
    #[serde(flatten)]
    pub subfields: BTreeMap<String, String>,
}

impl Domain {
    fn new(general: String) -> Self {
        Self {
            general,
            subfields: BTreeMap::new(),
        }
    }
}

/// Conversation-starter context, read-only after load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvoStarter {
    /// Standing summary of the user
    pub general_info: String,
    /// Summary of the previous session
    pub prev_context: String,
}

/// How a fact lands in an existing domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactMode {
    /// Create the subfield, or append to it when it already exists
    Add,
    /// Overwrite the subfield regardless of prior existence
    Alter,
}

/// Outcome of [`KnowledgeStore::add_domain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainOutcome {
    /// The domain was newly registered
    Created,
    /// The domain already existed; the description was appended to `general`
    Existed,
}

/// On-disk snapshot layout. All four sections are required.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    fields_info: BTreeMap<String, u64>,
    bio_data: BTreeMap<String, String>,
    data: BTreeMap<String, Domain>,
    convo_starter: ConvoStarter,
}

/// The hierarchical fact database for one user.
///
/// Invariants: the registry's key set always equals the data's key set
/// (domains are created together and never deleted), and every domain has
/// a `general` entry. The registry value is a mutation counter bumped only
/// by structural change (a new subfield); nothing reads it for policy.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeStore {
    registry: BTreeMap<String, u64>,
    data: BTreeMap<String, Domain>,
    bio: BTreeMap<String, String>,
    starter: ConvoStarter,
}

impl KnowledgeStore {
    /// Create an empty store (no domains, no bio data).
    pub fn empty() -> Self {
        Self {
            registry: BTreeMap::new(),
            data: BTreeMap::new(),
            bio: BTreeMap::new(),
            starter: ConvoStarter::default(),
        }
    }

    /// Parse a store from a serialized snapshot.
    ///
    /// Fails with [`RecollectError::CorruptSnapshot`] when a required
    /// top-level section is absent or the registry disagrees with the
    /// domain data about which domains exist.
    pub fn from_snapshot(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| RecollectError::CorruptSnapshot(format!("not valid JSON: {e}")))?;

        for section in REQUIRED_SECTIONS {
            if value.get(section).is_none() {
                return Err(RecollectError::CorruptSnapshot(format!(
                    "missing section `{section}`"
                )));
            }
        }

        let snapshot: Snapshot = serde_json::from_value(value)
            .map_err(|e| RecollectError::CorruptSnapshot(e.to_string()))?;

        let registry_keys: Vec<&String> = snapshot.fields_info.keys().collect();
        let data_keys: Vec<&String> = snapshot.data.keys().collect();
        if registry_keys != data_keys {
            return Err(RecollectError::CorruptSnapshot(
                "registry out of step with domain data".to_string(),
            ));
        }

        Ok(Self {
            registry: snapshot.fields_info,
            data: snapshot.data,
            bio: snapshot.bio_data,
            starter: snapshot.convo_starter,
        })
    }

    /// Load a store from a snapshot file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_snapshot(&raw)
    }

    /// Serialize the full store into one snapshot value.
    pub fn snapshot(&self) -> Result<String> {
        let snapshot = Snapshot {
            fields_info: self.registry.clone(),
            bio_data: self.bio.clone(),
            data: self.data.clone(),
            convo_starter: self.starter.clone(),
        };
        serde_json::to_string_pretty(&snapshot)
            .map_err(|e| RecollectError::Serialization(e.to_string()))
    }

    /// Persist the store, atomically replacing any previous snapshot.
    ///
    /// Writes a sibling temp file and renames it over the target, so a
    /// crash mid-write leaves the previous snapshot intact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.snapshot()?)?;
        std::fs::rename(&tmp, path)?;
        debug!("Snapshot saved to {}", path.display());
        Ok(())
    }

    /// Look up a bio attribute. `None` means "not set".
    pub fn bio(&self, field: &str) -> Option<&str> {
        self.bio.get(field).map(String::as_str)
    }

    /// Set a bio attribute. Bootstrap only; retrieval and ingestion never
    /// call this.
    pub fn set_bio(&mut self, field: &str, value: &str) {
        self.bio.insert(field.to_string(), value.to_string());
    }

    /// Conversation-starter context for seeding a session's first turn.
    pub fn convo_starter(&self) -> &ConvoStarter {
        &self.starter
    }

    /// Registered domain names, in stable order.
    pub fn domain_names(&self) -> Vec<&str> {
        self.registry.keys().map(String::as_str).collect()
    }

    /// Whether `name` is a registered domain.
    pub fn has_domain(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// The mutation counter for a domain, if registered.
    pub fn registry_count(&self, name: &str) -> Option<u64> {
        self.registry.get(name).copied()
    }

    /// A domain's `general` summary, if registered.
    pub fn general(&self, domain: &str) -> Option<&str> {
        self.data.get(domain).map(|d| d.general.as_str())
    }

    /// Subfield names of a domain, excluding the `general` summary.
    pub fn subfield_names(&self, domain: &str) -> Vec<&str> {
        self.data
            .get(domain)
            .map(|d| d.subfields.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The fact stored under `domain`/`term`, if any. The `general`
    /// summary is not addressable here.
    pub fn fact(&self, domain: &str, term: &str) -> Option<&str> {
        self.data
            .get(domain)
            .and_then(|d| d.subfields.get(term))
            .map(String::as_str)
    }

    /// Register a domain, or extend an existing one's `general` summary.
    ///
    /// Names are trimmed of surrounding whitespace before comparison. A
    /// new domain starts with registry count 1 and `general` set to
    /// `general_text`. For an existing domain, a non-empty `general_text`
    /// is appended newline-joined.
    pub fn add_domain(&mut self, name: &str, general_text: &str) -> DomainOutcome {
        let name = name.trim();

        if let Some(domain) = self.data.get_mut(name) {
            if !general_text.is_empty() {
                if domain.general.is_empty() {
                    domain.general = general_text.to_string();
                } else {
                    domain.general.push('\n');
                    domain.general.push_str(general_text);
                }
            }
            return DomainOutcome::Existed;
        }

        debug!("Registering new domain: {}", name);
        self.registry.insert(name.to_string(), 1);
        self.data
            .insert(name.to_string(), Domain::new(general_text.to_string()));
        DomainOutcome::Created
    }

    /// Create, append to, or overwrite one fact slot.
    ///
    /// `Add` creates the subfield (bumping the domain's mutation counter)
    /// or appends to it verbatim; callers supply their own separating
    /// punctuation. `Alter` overwrites unconditionally and never touches
    /// the counter. The reserved subfield `general` routes to the domain
    /// summary and is not a structural change.
    pub fn upsert_fact(
        &mut self,
        domain: &str,
        subfield: &str,
        fact_text: &str,
        mode: FactMode,
    ) -> Result<()> {
        let entry = self
            .data
            .get_mut(domain)
            .ok_or_else(|| RecollectError::UnknownDomain(domain.to_string()))?;

        if subfield == "general" {
            match mode {
                FactMode::Add => entry.general.push_str(fact_text),
                FactMode::Alter => entry.general = fact_text.to_string(),
            }
            return Ok(());
        }

        match mode {
            FactMode::Add => {
                if let Some(existing) = entry.subfields.get_mut(subfield) {
                    existing.push_str(fact_text);
                } else {
                    entry
                        .subfields
                        .insert(subfield.to_string(), fact_text.to_string());
                    *self.registry.entry(domain.to_string()).or_insert(0) += 1;
                }
            }
            FactMode::Alter => {
                entry
                    .subfields
                    .insert(subfield.to_string(), fact_text.to_string());
            }
        }

        Ok(())
    }
}
