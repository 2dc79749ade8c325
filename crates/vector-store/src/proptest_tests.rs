//! Property checks for ranking and filtering over random stores.

use proptest::prelude::*;

use crate::{MetadataFilter, Metric, VectorStore, metadata};

const DIM: usize = 8;

fn arb_vector() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-10.0_f32..10.0, DIM)
}

fn arb_metric() -> impl Strategy<Value = Metric> {
    prop::sample::select(Metric::ALL.to_vec())
}

/// Store of `n` entries keyed `k0..kn`, each tagged with `group = i % 3`.
fn arb_store() -> impl Strategy<Value = VectorStore> {
    prop::collection::vec(arb_vector(), 0..40).prop_map(|vectors| {
        let mut store = VectorStore::new();
        for (i, v) in vectors.into_iter().enumerate() {
            store
                .insert(format!("k{i}"), v, Some(metadata([("group", i % 3)])))
                .unwrap();
        }
        store
    })
}

proptest! {
    #[test]
    fn result_count_is_min_of_k_and_len(store in arb_store(), q in arb_vector(), k in 0_usize..50, metric in arb_metric()) {
        let hits = store.search(&q, k, metric, None).unwrap();
        prop_assert_eq!(hits.len(), k.min(store.len()));
    }

    #[test]
    fn results_are_sorted_descending(store in arb_store(), q in arb_vector(), metric in arb_metric()) {
        let hits = store.search(&q, store.len(), metric, None).unwrap();
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score, "{:?}", pair);
        }
    }

    #[test]
    fn top_k_is_a_prefix_of_full_ranking(store in arb_store(), q in arb_vector(), k in 0_usize..10) {
        let all = store.search(&q, store.len(), Metric::Cosine, None).unwrap();
        let top = store.search(&q, k, Metric::Cosine, None).unwrap();
        prop_assert_eq!(&all[..top.len()], &top[..]);
    }

    #[test]
    fn filtered_search_only_returns_matching_keys(
        store in arb_store(),
        q in arb_vector(),
        group in 0_usize..3,
        k in 0_usize..50,
    ) {
        let filter = MetadataFilter::new().with("group", group);
        let allowed = store.filter_by_metadata(&filter);
        let ranked = store.search(&q, store.len(), Metric::Euclidean, Some(&filter)).unwrap();
        prop_assert_eq!(ranked.len(), allowed.len());

        let hits = store.search(&q, k, Metric::Euclidean, Some(&filter)).unwrap();
        prop_assert_eq!(hits.len(), k.min(allowed.len()));
        prop_assert_eq!(&ranked[..hits.len()], &hits[..]);
        for hit in &hits {
            prop_assert!(allowed.contains(&hit.key));
        }
    }
}
