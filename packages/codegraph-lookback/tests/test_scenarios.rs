//! Resolution scenarios over in-memory collaborators
//!
//! Covers exact-match priority, root restriction, the self-boundary
//! short-circuit, nearest-wins, the boundary exemption and cancellation.

use codegraph_lookback::config::LookbackPolicy;
use codegraph_lookback::error::{ErrorKind, NotFoundReason};
use codegraph_lookback::infrastructure::HistoryCalls;
use codegraph_lookback::{
    InMemoryHistory, InMemoryVersionStore, RepoRevision, ResolveContext, Resolution, TreeEntry,
    VersionResolver,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const PATH: &str = "src/lib.rs";

struct Fixture {
    history: Arc<InMemoryHistory>,
    store: Arc<InMemoryVersionStore>,
    resolver: VersionResolver,
}

/// Linear history `c0..c{commits-1}`; `PATH` modified at `touched`
fn fixture(commits: usize, touched: &[usize], records: &[usize], limit: usize) -> Fixture {
    let touches: Vec<(usize, &str)> = touched.iter().map(|i| (*i, PATH)).collect();
    let history = Arc::new(InMemoryHistory::linear("repo", commits, &touches));
    let store = Arc::new(InMemoryVersionStore::new());
    for i in records {
        store.insert("repo", &format!("c{}", i));
    }
    let resolver = VersionResolver::new(
        history.clone(),
        store.clone(),
        LookbackPolicy::with_limit(limit),
    );
    Fixture {
        history,
        store,
        resolver,
    }
}

fn entry(head: &str, path: &str) -> TreeEntry {
    TreeEntry::new(RepoRevision::new("repo", head), path)
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenario A: nearest record wins
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_nearest_record_wins_over_boundary() {
    // H = c9, M = c4 (5 behind), records at M and H-2
    let f = fixture(10, &[4], &[4, 7], 250);

    let got = f
        .resolver
        .resolve_version(&entry("c9", PATH), &ResolveContext::new())
        .await
        .unwrap();

    assert_eq!(
        got,
        Resolution::LookbackHit {
            commit_id: "c7".into(),
            distance: 2
        }
    );
    assert_eq!(f.store.calls().has_versions, 1);
    assert_eq!(
        f.store.calls().last_batch,
        vec!["c9", "c8", "c7", "c6", "c5", "c4"]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenario B: boundary exempt from the lookback bound
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_boundary_found_beyond_bound() {
    // bound 3, M = c0 is 10 commits behind H = c10, only record at M
    let f = fixture(11, &[0], &[0], 3);

    let got = f
        .resolver
        .resolve_version(&entry("c10", PATH), &ResolveContext::new())
        .await
        .unwrap();

    assert_eq!(
        got,
        Resolution::LookbackHit {
            commit_id: "c0".into(),
            distance: 10
        }
    );
    // Interior scan stopped at 3 commits; M checked anyway
    assert_eq!(f.store.calls().last_batch, vec!["c10", "c9", "c8", "c0"]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenario C: no history for path
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_untouched_path_stops_after_history_lookup() {
    let f = fixture(5, &[], &[0, 1, 2], 250);

    let err = f
        .resolver
        .resolve_version(&entry("c4", "docs/missing.md"), &ResolveContext::new())
        .await
        .unwrap_err();

    assert_eq!(
        err.not_found_reason(),
        Some(&NotFoundReason::NoHistoryForPath)
    );
    let history = f.history.calls();
    assert_eq!(history.last_commit_touching, 1);
    assert_eq!(history.list_commits, 0);
    assert_eq!(history.count_commits, 0);
    assert_eq!(f.store.calls().has_versions, 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenario D / P2: root restriction
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_root_without_exact_record_is_not_found() {
    for root in ["", ".", "./"] {
        let f = fixture(5, &[0, 3], &[0, 1, 2, 3], 250);

        let err = f
            .resolver
            .resolve_version(&entry("c4", root), &ResolveContext::new())
            .await
            .unwrap_err();

        assert_eq!(
            err.not_found_reason(),
            Some(&NotFoundReason::NoVersionForRoot),
            "root spelled {:?}",
            root
        );
        assert_eq!(f.store.calls().has_versions, 0);
        assert_eq!(f.history.calls().last_commit_touching, 0);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// P1: exact-match priority
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_exact_match_ignores_path_and_bound() {
    for path in ["", PATH, "never/touched.rs"] {
        let f = fixture(5, &[4], &[4, 3], 1);

        let got = f
            .resolver
            .resolve_version(&entry("c4", path), &ResolveContext::new())
            .await
            .unwrap();

        assert_eq!(
            got,
            Resolution::Exact {
                commit_id: "c4".into()
            }
        );
        assert_eq!(got.distance(), 0);
        assert_eq!(f.history.calls(), HistoryCalls::default());
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// P3: self-boundary short-circuit
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_path_modified_at_head_skips_enumeration() {
    let f = fixture(5, &[1, 4], &[0, 1, 2, 3], 250);

    let err = f
        .resolver
        .resolve_version(&entry("c4", PATH), &ResolveContext::new())
        .await
        .unwrap_err();

    assert_eq!(err.not_found_reason(), Some(&NotFoundReason::BoundaryIsHead));
    assert_eq!(f.history.calls().list_commits, 0);
    assert_eq!(f.store.calls().has_versions, 0);
}

#[tokio::test]
async fn test_directory_boundary_follows_children() {
    // src/ last touched at c2 via src/lib.rs
    let f = fixture(6, &[2], &[3], 250);

    let got = f
        .resolver
        .resolve_version(&entry("c5", "src"), &ResolveContext::new())
        .await
        .unwrap();

    assert_eq!(got.commit_id(), "c3");
    assert_eq!(got.distance(), 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// Merge histories
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_side_branch_commits_are_not_candidates() {
    //   a <- b ------ d (merge, takes x.rs from c)
    //    \- c (x.rs) -/
    let history = Arc::new(InMemoryHistory::new("repo"));
    history.add_commit("a", &[], &["x.rs"]);
    history.add_commit("b", &["a"], &["y.rs"]);
    history.add_commit("c", &["a"], &["x.rs"]);
    history.add_commit("d", &["b", "c"], &[]);

    // b still carries a's x.rs and must never be served for d
    let store = Arc::new(InMemoryVersionStore::new());
    store.insert("repo", "b");
    let resolver = VersionResolver::new(history, store.clone(), LookbackPolicy::default());

    let err = resolver
        .resolve_version(&entry("d", "x.rs"), &ResolveContext::new())
        .await
        .unwrap_err();

    assert_eq!(
        err.not_found_reason(),
        Some(&NotFoundReason::NoVersionInWindow {
            candidates: 2,
            versions: 0
        })
    );
    assert_eq!(store.calls().last_batch, vec!["d", "c"]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenario E: cancellation and deadlines
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_cancellation_mid_resolution() {
    let f = fixture(10, &[4], &[4], 250);
    f.store.stall_batches();

    let token = CancellationToken::new();
    let ctx = ResolveContext::with_cancellation(token.clone());

    let store = f.store.clone();
    let canceller = tokio::spawn(async move {
        // Wait until the batch check is in flight
        while store.calls().has_versions == 0 {
            tokio::task::yield_now().await;
        }
        token.cancel();
    });

    let err = f
        .resolver
        .resolve_version(&entry("c9", PATH), &ctx)
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(!err.is_not_found());
    assert_eq!(f.history.calls().last_commit_touching, 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_mid_resolution() {
    let f = fixture(10, &[4], &[4], 250);
    f.store.stall_batches();

    let ctx = ResolveContext::new().with_timeout(Duration::from_secs(2));
    let err = f
        .resolver
        .resolve_version(&entry("c9", PATH), &ctx)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    assert_eq!(f.store.calls().has_versions, 1);
}

#[tokio::test]
async fn test_upstream_failure_is_not_not_found() {
    let f = fixture(10, &[4], &[4], 250);
    f.store.fail_with("connection reset");

    let err = f
        .resolver
        .resolve_version(&entry("c9", PATH), &ResolveContext::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert!(err.to_string().contains("repo@c9:src/lib.rs"));
}
