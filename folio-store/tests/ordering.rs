use std::sync::Arc;

use folio_store::{
    CollectionLocks, DocumentStore, JsonFileStore, MemoryStore, OrderedCollection, OrderingError,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn navbar() -> (Arc<dyn DocumentStore>, OrderedCollection) {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let ordered = OrderedCollection::new(store.clone(), "navbar");
    (store, ordered)
}

async fn insert(ordered: &OrderedCollection, title: &str, position: Option<i64>) -> String {
    let doc = ordered
        .insert(json!({ "title": title, "url": format!("/{title}") }), position)
        .await
        .unwrap();
    doc["_id"].as_str().unwrap().to_string()
}

/// `(title, position)` pairs in list order.
async fn layout(ordered: &OrderedCollection) -> Vec<(String, i64)> {
    ordered
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|d| {
            (
                d["title"].as_str().unwrap_or_default().to_string(),
                d["position"].as_i64().unwrap(),
            )
        })
        .collect()
}

fn expect(pairs: &[(&str, i64)]) -> Vec<(String, i64)> {
    pairs.iter().map(|(t, p)| (t.to_string(), *p)).collect()
}

#[tokio::test]
async fn insert_move_delete_scenario() {
    let (_, ordered) = navbar();
    insert(&ordered, "A", Some(0)).await;
    insert(&ordered, "B", Some(1)).await;
    let c = insert(&ordered, "C", Some(2)).await;

    let d = insert(&ordered, "D", Some(1)).await;
    assert_eq!(
        layout(&ordered).await,
        expect(&[("A", 0), ("D", 1), ("B", 2), ("C", 3)])
    );

    ordered.reposition(&c, Some(0), json!({})).await.unwrap();
    assert_eq!(
        layout(&ordered).await,
        expect(&[("C", 0), ("A", 1), ("D", 2), ("B", 3)])
    );

    let removed = ordered.delete(&d).await.unwrap();
    assert_eq!(removed["title"], "D");
    assert_eq!(
        layout(&ordered).await,
        expect(&[("C", 0), ("A", 1), ("B", 2)])
    );
}

#[tokio::test]
async fn insert_at_front_of_empty_collection() {
    let (_, ordered) = navbar();

    insert(&ordered, "X", Some(0)).await;
    assert_eq!(layout(&ordered).await, expect(&[("X", 0)]));

    let y = insert(&ordered, "Y", Some(0)).await;
    assert_eq!(layout(&ordered).await, expect(&[("Y", 0), ("X", 1)]));

    ordered.delete(&y).await.unwrap();
    assert_eq!(layout(&ordered).await, expect(&[("X", 0)]));
}

#[tokio::test]
async fn omitted_position_appends() {
    let (_, ordered) = navbar();
    insert(&ordered, "first", None).await;
    insert(&ordered, "second", None).await;

    assert_eq!(
        layout(&ordered).await,
        expect(&[("first", 0), ("second", 1)])
    );
}

#[tokio::test]
async fn moving_down_shifts_the_records_in_between_up() {
    let (_, ordered) = navbar();
    let a = insert(&ordered, "A", None).await;
    insert(&ordered, "B", None).await;
    insert(&ordered, "C", None).await;
    insert(&ordered, "D", None).await;

    let moved = ordered
        .reposition(&a, Some(2), json!({ "title": "A2", "position": 99 }))
        .await
        .unwrap();

    assert_eq!(moved["position"], 2);
    assert_eq!(moved["title"], "A2");
    assert_eq!(
        layout(&ordered).await,
        expect(&[("B", 0), ("C", 1), ("A2", 2), ("D", 3)])
    );
}

#[tokio::test]
async fn reposition_to_current_position_changes_nothing() {
    let (_, ordered) = navbar();
    insert(&ordered, "A", None).await;
    let b = insert(&ordered, "B", None).await;
    insert(&ordered, "C", None).await;
    let before = layout(&ordered).await;

    ordered.reposition(&b, Some(1), json!({})).await.unwrap();
    ordered.reposition(&b, None, json!({})).await.unwrap();

    assert_eq!(layout(&ordered).await, before);
}

#[tokio::test]
async fn unknown_ids_fail_without_shifting() {
    let (store, ordered) = navbar();
    insert(&ordered, "A", None).await;
    insert(&ordered, "B", None).await;
    let revision = store.revision("navbar").await.unwrap();

    let err = ordered.reposition("ghost", Some(0), json!({})).await.unwrap_err();
    assert!(matches!(err, OrderingError::NotFound { .. }));

    let err = ordered.delete("ghost").await.unwrap_err();
    assert!(matches!(err, OrderingError::NotFound { .. }));

    assert_eq!(store.revision("navbar").await.unwrap(), revision);
    assert_eq!(layout(&ordered).await, expect(&[("A", 0), ("B", 1)]));
}

#[tokio::test]
async fn out_of_range_positions_are_rejected() {
    let (store, ordered) = navbar();
    let a = insert(&ordered, "A", None).await;
    insert(&ordered, "B", None).await;

    let err = ordered
        .insert(json!({ "title": "far" }), Some(3))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderingError::InvalidPosition { position: 3, max: 2 }
    ));

    let err = ordered.insert(json!({ "title": "neg" }), Some(-1)).await.unwrap_err();
    assert!(matches!(err, OrderingError::InvalidPosition { .. }));

    let err = ordered.reposition(&a, Some(2), json!({})).await.unwrap_err();
    assert!(matches!(
        err,
        OrderingError::InvalidPosition { position: 2, max: 1 }
    ));

    assert_eq!(store.count("navbar").await.unwrap(), 2);
}

#[tokio::test]
async fn concurrent_inserts_stay_dense() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let locks = CollectionLocks::new();

    let mut handles = Vec::new();
    for i in 0..32 {
        // A fresh manager per task, sharing only the store and the locks.
        let ordered = OrderedCollection::new(store.clone(), "banner").with_locks(locks.clone());
        handles.push(tokio::spawn(async move {
            ordered
                .insert(json!({ "title": format!("slide-{i}") }), Some(0))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let ordered = OrderedCollection::new(store, "banner");
    let positions: Vec<i64> = layout(&ordered).await.into_iter().map(|(_, p)| p).collect();
    assert_eq!(positions, (0..32).collect::<Vec<i64>>());
}

#[tokio::test]
async fn batch_pinned_to_stale_revision_is_refused() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let ordered = OrderedCollection::new(store.clone(), "navbar");
    let id = insert(&ordered, "A", None).await;

    let stale = store.revision("navbar").await.unwrap();
    store
        .insert_one("navbar", json!({ "title": "sneaky", "position": 1 }))
        .await
        .unwrap();

    let batch = folio_store::WriteBatch::new()
        .expect_revision(stale)
        .update(id, json!({ "title": "late" }));
    let err = store.commit("navbar", batch).await.unwrap_err();
    assert!(matches!(err, folio_store::StoreError::RevisionMismatch { .. }));
}

#[tokio::test]
async fn json_file_store_keeps_ordering_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("folio.json");

    {
        let store: Arc<dyn DocumentStore> = Arc::new(JsonFileStore::open(&path).await.unwrap());
        let ordered = OrderedCollection::new(store, "navbar");
        insert(&ordered, "Home", None).await;
        insert(&ordered, "About", Some(0)).await;
    }

    let store: Arc<dyn DocumentStore> = Arc::new(JsonFileStore::open(&path).await.unwrap());
    let ordered = OrderedCollection::new(store, "navbar");
    assert_eq!(
        layout(&ordered).await,
        expect(&[("About", 0), ("Home", 1)])
    );
}

#[tokio::test]
async fn prechecks_match_the_locked_range_checks() {
    let (store, ordered) = navbar();
    ordered.check_insert(Some(0)).await.unwrap();
    assert!(matches!(
        ordered.check_move(Some(0)).await,
        Err(OrderingError::InvalidPosition { position: 0, max: -1 })
    ));

    insert(&ordered, "A", None).await;
    insert(&ordered, "B", None).await;
    let revision = store.revision("navbar").await.unwrap();

    ordered.check_insert(None).await.unwrap();
    ordered.check_insert(Some(2)).await.unwrap();
    assert!(matches!(
        ordered.check_insert(Some(3)).await,
        Err(OrderingError::InvalidPosition { position: 3, max: 2 })
    ));

    ordered.check_move(Some(1)).await.unwrap();
    assert!(matches!(
        ordered.check_move(Some(2)).await,
        Err(OrderingError::InvalidPosition { position: 2, max: 1 })
    ));

    assert_eq!(store.revision("navbar").await.unwrap(), revision);
}

#[derive(Clone, Debug)]
enum Op {
    Insert { at_pct: f64, append: bool },
    Move { pick_pct: f64, to_pct: f64 },
    Delete { pick_pct: f64 },
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0.0..=1.0f64, any::<bool>()).prop_map(|(at_pct, append)| Op::Insert { at_pct, append }),
        (0.0..=1.0f64, 0.0..=1.0f64).prop_map(|(pick_pct, to_pct)| Op::Move { pick_pct, to_pct }),
        (0.0..=1.0f64).prop_map(|pick_pct| Op::Delete { pick_pct }),
    ]
}

fn scale(pct: f64, len: usize) -> usize {
    ((pct * len as f64) as usize).min(len)
}

/// Applies `op` to the collection and to a plain `Vec` model of titles.
async fn apply(ordered: &OrderedCollection, model: &mut Vec<String>, op: &Op, seq: usize) {
    match op {
        Op::Insert { at_pct, append } => {
            let title = format!("r{seq}");
            let at = scale(*at_pct, model.len());
            let position = if *append { None } else { Some(at as i64) };
            ordered
                .insert(json!({ "title": title.clone() }), position)
                .await
                .unwrap();
            if *append {
                model.push(title);
            } else {
                model.insert(at, title);
            }
        }
        Op::Move { pick_pct, to_pct } => {
            if model.is_empty() {
                return;
            }
            let from = scale(*pick_pct, model.len() - 1);
            let to = scale(*to_pct, model.len() - 1);
            let id = id_of(ordered, &model[from]).await;
            ordered
                .reposition(&id, Some(to as i64), json!({}))
                .await
                .unwrap();
            let title = model.remove(from);
            model.insert(to, title);
        }
        Op::Delete { pick_pct } => {
            if model.is_empty() {
                return;
            }
            let at = scale(*pick_pct, model.len() - 1);
            let id = id_of(ordered, &model[at]).await;
            ordered.delete(&id).await.unwrap();
            model.remove(at);
        }
    }
}

async fn id_of(ordered: &OrderedCollection, title: &str) -> String {
    ordered
        .list()
        .await
        .unwrap()
        .into_iter()
        .find(|d| d["title"] == Value::from(title))
        .and_then(|d| d["_id"].as_str().map(str::to_string))
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// After every op the positions are exactly 0..N and the order matches
    /// a plain Vec receiving the same inserts, moves and removals.
    #[test]
    fn positions_stay_dense_and_ordered(ops in prop::collection::vec(arbitrary_op(), 1..40)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let (_, ordered) = navbar();
            let mut model: Vec<String> = Vec::new();

            for (seq, op) in ops.iter().enumerate() {
                apply(&ordered, &mut model, op, seq).await;

                let listed = layout(&ordered).await;
                let positions: Vec<i64> = listed.iter().map(|(_, p)| *p).collect();
                let titles: Vec<String> = listed.into_iter().map(|(t, _)| t).collect();

                assert_eq!(positions, (0..model.len() as i64).collect::<Vec<_>>());
                assert_eq!(titles, model);
            }
        });
    }
}
