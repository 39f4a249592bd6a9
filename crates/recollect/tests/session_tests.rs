//! Integration tests for the session turn cycle
//!
//! Drives a full turn against scripted oracle replies:
//! add_turn -> retrieve -> learn -> save -> reload, asserting on the
//! persisted knowledge rather than on engine internals.

use std::sync::Arc;

use recollect::config::Config;
use recollect::session::Session;
use recollect::store::{FactMode, KnowledgeStore};
use recollect::testing::{FailingOracle, ScriptedOracle};

fn seeded_store() -> KnowledgeStore {
    let mut store = KnowledgeStore::empty();
    store.set_bio("name", "Ishaan");
    store.set_bio("preferred_language", "English");
    store.add_domain("family", "Lives with his parents");
    store
        .upsert_fact("family", "sister", "Aadya", FactMode::Add)
        .unwrap();
    store.add_domain("health", "Reports good health");
    store
        .upsert_fact("health", "mood", "ok", FactMode::Add)
        .unwrap();
    store
}

// =============================================================================
// Full turn: compress, recall, learn, persist
// =============================================================================

#[tokio::test]
async fn test_full_turn_updates_window_store_and_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge.json");
    seeded_store().save(&path).unwrap();

    let mut config = Config::default();
    config.store.snapshot_path = path.clone();
    config.context.byte_budget = 500;

    let oracle = Arc::new(ScriptedOracle::new([
        // Turn compression
        "<context>Ishaan's sister Aadya just turned 13</context>",
        // Retrieval round 1: domains
        "<keys>\nfamily\n</keys>",
        // Retrieval round 2: subfields
        "<keys>\nfamily | sister\n</keys>",
        // Ingestion round 1: extraction
        "<fact>\nfamily | sister Aadya turned 13 on 2026-08-07\n</fact>",
        // Ingestion round 2: merge plan for family
        "<ans>\nAlter | sister | \"Aadya, turned 13 on 2026-08-07\"\n</ans>",
    ]));

    let mut session = Session::new(&config, oracle.clone()).unwrap();
    assert_eq!(session.user_name(), Some("Ishaan"));

    session
        .add_turn("Ishaan", "My sister Aadya turned 13 today!")
        .await;
    assert_eq!(
        session.render_context(),
        "Ishaan:Ishaan's sister Aadya just turned 13"
    );

    let query = format!(
        "Summary of conversation so far:\n{}\n\nUser's last interaction: My sister Aadya turned 13 today!",
        session.render_context()
    );

    let recalled = session.retrieve(&query).await;
    assert_eq!(recalled, "family:sister:Aadya");

    let trailer = session.learn(&query, &recalled).await;
    assert_eq!(
        trailer,
        Some("family:sister:Aadya, turned 13 on 2026-08-07".to_string())
    );

    session.save().unwrap();

    // All five scripted rounds were consumed in order
    assert_eq!(oracle.remaining(), 0);

    // The persisted snapshot carries the merged fact
    let reloaded = KnowledgeStore::load(&path).unwrap();
    assert_eq!(
        reloaded.fact("family", "sister"),
        Some("Aadya, turned 13 on 2026-08-07")
    );
    assert_eq!(reloaded.bio("name"), Some("Ishaan"));
}

// =============================================================================
// Total oracle failure: the turn degrades, the conversation continues
// =============================================================================

#[tokio::test]
async fn test_turn_with_unavailable_oracle_degrades_gracefully() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge.json");
    seeded_store().save(&path).unwrap();

    let mut config = Config::default();
    config.store.snapshot_path = path.clone();

    let mut session = Session::new(&config, Arc::new(FailingOracle)).unwrap();

    session.add_turn("Ishaan", "hello again").await;
    assert_eq!(session.render_context(), "");

    let recalled = session.retrieve("hello again").await;
    assert_eq!(recalled, "");

    let trailer = session.learn("hello again", &recalled).await;
    assert_eq!(trailer, None);

    // Nothing was learned and the snapshot still round-trips
    session.save().unwrap();
    let reloaded = KnowledgeStore::load(&path).unwrap();
    assert_eq!(reloaded.fact("family", "sister"), Some("Aadya"));
    assert_eq!(reloaded.fact("health", "mood"), Some("ok"));
}

// =============================================================================
// Learning can introduce domains that later turns recall from
// =============================================================================

#[tokio::test]
async fn test_learned_domain_is_recallable_next_turn() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge.json");
    seeded_store().save(&path).unwrap();

    let mut config = Config::default();
    config.store.snapshot_path = path;

    let oracle = Arc::new(ScriptedOracle::new([
        // Turn 1 learn: new domain plus one fact
        "<new>\nwork | Ishaan's job and career\n</new>\n<fact>\nwork | started at a robotics startup\n</fact>",
        "<ans>\nAdd | employer | \"a robotics startup\"\n</ans>",
        // Turn 2 retrieve: the new domain is offered and selected
        "<keys>\nwork\n</keys>",
        "<keys>\nwork | employer\n</keys>",
    ]));

    let mut session = Session::new(&config, oracle).unwrap();

    let trailer = session.learn("I started at a robotics startup", "").await;
    assert_eq!(trailer, Some("work:employer:a robotics startup".to_string()));
    assert_eq!(session.store().registry_count("work"), Some(2));

    let recalled = session.retrieve("how's the new job?").await;
    assert_eq!(recalled, "work:employer:a robotics startup");
}
