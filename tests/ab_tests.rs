//! A/B explorer integration tests
//!
//! File-backed persistence, stickiness and the permanent winner lock.

use hero::ab::{AbExplorer, AbState, FileStore, KeyValueStore, Variant, AB_STORAGE_KEY};
use hero::analytics::{self, MemorySink};
use hero::{Intent, Personalizer};

fn explorer(path: &std::path::Path, min_sample_size: u64) -> AbExplorer {
    AbExplorer::new(Box::new(FileStore::new(path))).with_min_sample_size(min_sample_size)
}

// =============================================================================
// Persistence
// =============================================================================

mod persistence_tests {
    use super::*;

    #[test]
    fn test_assignment_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ab-state.json");

        let first = explorer(&path, 100).with_seed(42).assign_variant(Intent::Compare);
        for seed in 0..10 {
            let mut reopened = explorer(&path, 100).with_seed(seed);
            assert_eq!(reopened.assign_variant(Intent::Compare), first);
        }
    }

    #[test]
    fn test_state_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ab-state.json");

        let mut ab = explorer(&path, 100);
        ab.record_impression(Intent::Budget, Variant::B);
        ab.record_click(Intent::Budget, Variant::B);

        let store = FileStore::new(&path);
        let raw = store.get(AB_STORAGE_KEY).unwrap().unwrap();
        let state: AbState = serde_json::from_str(&raw).unwrap();
        assert_eq!(state.impressions[&Intent::Budget].b, 1);
        assert_eq!(state.clicks[&Intent::Budget].b, 1);
        assert!(state.winners.is_empty());
    }

    #[test]
    fn test_unwritable_location_degrades() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the state file should be
        let path = dir.path().join("state");
        std::fs::create_dir(&path).unwrap();

        let mut ab = explorer(&path, 1);
        let _ = ab.assign_variant(Intent::UseCase);
        assert_eq!(ab.record_impression(Intent::UseCase, Variant::A), None);
        assert_eq!(ab.winner(Intent::UseCase), None);
    }
}

// =============================================================================
// Winner lock
// =============================================================================

mod winner_tests {
    use super::*;

    #[test]
    fn test_winner_locked_and_permanent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ab-state.json");
        let mut ab = explorer(&path, 20);

        for i in 0..19 {
            let variant = if i % 2 == 0 { Variant::A } else { Variant::B };
            assert_eq!(ab.record_impression(Intent::Compare, variant), None);
            if variant == Variant::A && i < 6 {
                ab.record_click(Intent::Compare, Variant::A);
            }
        }
        assert_eq!(ab.record_impression(Intent::Compare, Variant::B), Some(Variant::A));

        // B now performs far better; the lock holds across instances
        let mut later = explorer(&path, 20);
        for _ in 0..200 {
            later.record_impression(Intent::Compare, Variant::B);
            later.record_click(Intent::Compare, Variant::B);
        }
        assert_eq!(later.winner(Intent::Compare), Some(Variant::A));
        assert_eq!(later.assign_variant(Intent::Compare), Variant::A);
    }

    #[test]
    fn test_interrupted_write_keeps_winner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ab-state.json");
        let mut first = explorer(&path, 2);
        first.record_impression(Intent::Compare, Variant::A);
        assert_eq!(first.record_impression(Intent::Compare, Variant::B), Some(Variant::A));

        // Another process died between writing its temp file and renaming it
        std::fs::write(dir.path().join(".ab-state.json.dead.tmp"), "{\"hero.ab.st").unwrap();

        let mut second = explorer(&path, 2);
        second.record_impression(Intent::Budget, Variant::B);
        assert_eq!(second.winner(Intent::Compare), Some(Variant::A));
        assert_eq!(first.winner(Intent::Compare), Some(Variant::A));
    }

    #[cfg(unix)]
    #[test]
    fn test_concurrent_reader_sees_complete_state() {
        use std::io::Read;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ab-state.json");
        let mut first = explorer(&path, 2);
        first.record_impression(Intent::Compare, Variant::A);
        first.record_impression(Intent::Compare, Variant::A);

        // Reader opens the document, then a writer replaces it
        let mut reader = std::fs::File::open(&path).unwrap();
        explorer(&path, 2).record_impression(Intent::Budget, Variant::B);

        let mut raw = String::new();
        reader.read_to_string(&mut raw).unwrap();
        let entries: std::collections::BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        let state: AbState = serde_json::from_str(&entries[AB_STORAGE_KEY]).unwrap();
        assert_eq!(state.winners[&Intent::Compare], Variant::A);
    }

    #[test]
    fn test_winner_is_per_intent() {
        let dir = tempfile::tempdir().unwrap();
        let mut ab = explorer(&dir.path().join("ab.json"), 2);
        ab.record_impression(Intent::BuyNow, Variant::A);
        ab.record_impression(Intent::BuyNow, Variant::B);

        assert!(ab.winner(Intent::BuyNow).is_some());
        assert_eq!(ab.winner(Intent::Budget), None);

        let status = ab.status().unwrap();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].intent, Intent::BuyNow);
    }

    #[test]
    fn test_pipeline_declares_winner() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MemorySink::new();
        let mut p = Personalizer::builtin()
            .with_sink(Box::new(sink.clone()))
            .with_ab(explorer(&dir.path().join("ab.json"), 5).with_seed(9));

        let mut variants = Vec::new();
        for _ in 0..8 {
            variants.push(p.personalize_override(Intent::Budget).variant.unwrap());
            p.record_cta_click();
        }

        // The served variant is the only one with clicks, so it wins the lock
        assert!(variants.iter().all(|v| *v == variants[0]));
        assert_eq!(sink.count(analytics::AB_WINNER_DECLARED), 1);
        assert_eq!(p.ab().unwrap().winner(Intent::Budget), Some(variants[0]));
    }
}
