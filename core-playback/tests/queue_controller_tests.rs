//! Queue installation, pagination and add-endpoint behaviour.

mod common;

use bridge_traits::CatalogItem;
use common::{next_event, numbered, track, tracks, FailingPages, FakeCatalog, GatedQueue, Harness};
use core_playback::{
    EngineState, InsertPosition, ListQueue, PlaybackEngine, PlaybackError, ResolvedSource,
    TransitionReason,
};
use core_runtime::events::{CoreEvent, QueueEvent};
use std::sync::Arc;

// ============================================================================
// Installation
// ============================================================================

#[tokio::test]
async fn test_play_queue_installs_and_starts() {
    let h = Harness::start();
    let mut rx = h.events.subscribe();

    h.install(tracks(&["a", "b", "c"]), 2).await;

    assert_eq!(h.engine.ids(), vec!["a", "b", "c"]);
    assert_eq!(h.engine.seeks(), vec![2]);
    assert_eq!(h.engine.prepare_count(), 1);
    assert!(h.engine.play_when_ready());

    let event = next_event(&mut rx, |e| matches!(e, CoreEvent::Queue(QueueEvent::Installed { .. }))).await;
    assert_eq!(
        event,
        CoreEvent::Queue(QueueEvent::Installed {
            generation: 1,
            item_count: 3,
            start_index: 2,
        })
    );
}

#[tokio::test]
async fn test_start_index_zero_does_not_seek() {
    let h = Harness::start();
    h.install(tracks(&["a", "b"]), 0).await;

    assert!(h.engine.seeks().is_empty());
}

#[tokio::test]
async fn test_replaced_installation_never_installs() {
    let h = Harness::start();
    let controller = h.session.controller();
    let slow = GatedQueue::new(tracks(&["old1", "old2"]), Vec::new());

    let first = controller.play_queue(slow.clone()).await.unwrap();
    controller
        .play_queue(Arc::new(ListQueue::new(tracks(&["new"]), 0)))
        .await
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    slow.release();
    first.await.unwrap().unwrap();

    assert_eq!(h.engine.ids(), vec!["new"]);
    assert_eq!(controller.generation().await, 2);
}

#[tokio::test]
async fn test_second_play_queue_drops_first_page() {
    let h = Harness::start();
    let controller = h.session.controller();
    let first = GatedQueue::new(numbered(3), vec![tracks(&["late1", "late2"])]);

    let install = controller.play_queue(first.clone()).await.unwrap();
    first.release();
    install.await.unwrap().unwrap();

    let page = controller
        .on_item_transition(TransitionReason::Auto)
        .await
        .expect("page fetch should start");

    h.install(tracks(&["x", "y"]), 0).await;
    first.release();
    page.await.unwrap();

    assert_eq!(h.engine.ids(), vec!["x", "y"]);
    assert_eq!(controller.tracks().await, tracks(&["x", "y"]));
}

#[tokio::test]
async fn test_installed_items_resolve_lazily() {
    let h = Harness::start();
    h.library.mark_downloaded("a");
    h.install(tracks(&["a", "b"]), 0).await;
    assert_eq!(h.catalog.playback_calls(), 0);

    let local = h.engine.item_at(0).await.unwrap().resolve_source().await.unwrap();
    assert_eq!(
        local,
        ResolvedSource::LocalFile {
            path: "/downloads/a".into()
        }
    );
    assert_eq!(h.catalog.playback_calls(), 0);

    let remote = h.engine.item_at(1).await.unwrap();
    remote.resolve_source().await.unwrap();
    let again = remote.resolve_source().await.unwrap();
    assert_eq!(again.location(), "https://cdn/b/high");
    assert_eq!(h.catalog.playback_calls(), 1);
}

#[tokio::test]
async fn test_metered_session_streams_lowest_bitrate() {
    let h = Harness::start_with(FakeCatalog::new(), true);
    h.install(tracks(&["a"]), 0).await;

    let source = h.engine.item_at(0).await.unwrap().resolve_source().await.unwrap();
    assert_eq!(
        source,
        ResolvedSource::RemoteStream {
            url: "https://cdn/a/low".into(),
            bitrate: 48_000
        }
    );
}

#[tokio::test]
async fn test_refused_install_leaves_queue_empty() {
    let h = Harness::start();
    let controller = h.session.controller();
    let mut rx = h.events.subscribe();
    h.engine.reject_installs(true);

    let err = controller
        .play_queue(Arc::new(ListQueue::new(tracks(&["a", "b", "c"]), 0)))
        .await
        .unwrap()
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, PlaybackError::Engine(_)));
    assert!(h.engine.ids().is_empty());
    assert!(controller.tracks().await.is_empty());
    assert_eq!(controller.describe(2).await, None);
    assert!(matches!(
        controller.move_item(2, 0).await,
        Err(PlaybackError::CommandRejected(_))
    ));
    next_event(&mut rx, |e| matches!(e, CoreEvent::Queue(QueueEvent::PaginationFailed { .. }))).await;

    h.engine.reject_installs(false);
    h.install(tracks(&["a"]), 0).await;
    assert_eq!(controller.tracks().await, tracks(&["a"]));
}

// ============================================================================
// Pagination
// ============================================================================

async fn paged_harness() -> Harness {
    let h = Harness::start();
    h.session
        .controller()
        .play_queue(Arc::new(ListQueue::paged(numbered(20), 0, 10)))
        .await
        .unwrap()
        .await
        .unwrap()
        .unwrap();
    h
}

#[tokio::test]
async fn test_no_page_while_enough_entries_remain() {
    let h = paged_harness().await;
    let controller = h.session.controller();

    h.engine.set_current(4); // 6 remaining
    assert!(controller
        .on_item_transition(TransitionReason::Auto)
        .await
        .is_none());
    assert_eq!(controller.len().await, 10);
}

#[tokio::test]
async fn test_page_appended_when_few_entries_remain() {
    let h = paged_harness().await;
    let controller = h.session.controller();
    let mut rx = h.events.subscribe();

    h.engine.set_current(5); // 5 remaining
    controller
        .on_item_transition(TransitionReason::Auto)
        .await
        .expect("page fetch should start")
        .await
        .unwrap();

    assert_eq!(h.engine.ids().len(), 20);
    assert_eq!(h.engine.ids()[10], "t10");
    assert_eq!(h.engine.current_index().await, Some(5));
    assert!(h.engine.seeks().is_empty());

    let event = next_event(&mut rx, |e| matches!(e, CoreEvent::Queue(QueueEvent::PageAppended { .. }))).await;
    assert_eq!(
        event,
        CoreEvent::Queue(QueueEvent::PageAppended {
            generation: 1,
            added: 10,
            total: 20,
        })
    );

    // Provider exhausted
    h.engine.set_current(18);
    assert!(controller
        .on_item_transition(TransitionReason::Auto)
        .await
        .is_none());
}

#[tokio::test]
async fn test_repeat_and_idle_do_not_page() {
    let h = paged_harness().await;
    let controller = h.session.controller();
    h.engine.set_current(9);

    assert!(controller
        .on_item_transition(TransitionReason::Repeat)
        .await
        .is_none());

    h.engine.set_state(EngineState::Idle);
    assert!(controller
        .on_item_transition(TransitionReason::Seek)
        .await
        .is_none());
    assert_eq!(controller.len().await, 10);
}

#[tokio::test]
async fn test_one_fetch_at_a_time() {
    let h = Harness::start();
    let controller = h.session.controller();
    let queue = GatedQueue::new(numbered(2), vec![tracks(&["p1"]), tracks(&["p2"])]);

    let install = controller.play_queue(queue.clone()).await.unwrap();
    queue.release();
    install.await.unwrap().unwrap();

    let page = controller
        .on_item_transition(TransitionReason::Auto)
        .await
        .expect("first fetch");
    assert!(controller
        .on_item_transition(TransitionReason::Auto)
        .await
        .is_none());

    queue.release();
    page.await.unwrap();
    assert_eq!(h.engine.ids(), vec!["t0", "t1", "p1"]);
}

#[tokio::test]
async fn test_pagination_failure_keeps_queue() {
    let h = Harness::start();
    let controller = h.session.controller();
    let mut rx = h.events.subscribe();

    controller
        .play_queue(Arc::new(FailingPages {
            initial: numbered(3),
        }))
        .await
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    controller
        .on_item_transition(TransitionReason::Auto)
        .await
        .expect("fetch should start")
        .await
        .unwrap();

    assert_eq!(h.engine.ids().len(), 3);
    let event = next_event(&mut rx, |e| matches!(e, CoreEvent::Queue(QueueEvent::PaginationFailed { .. }))).await;
    assert_eq!(event.description(), "Queue pagination failed");
}

// ============================================================================
// Add endpoint
// ============================================================================

#[tokio::test]
async fn test_add_song_after_current_on_empty_queue() {
    let h = Harness::start();
    let added = h
        .session
        .controller()
        .handle_add_endpoint(InsertPosition::AfterCurrent, CatalogItem::Song(track("s")))
        .await
        .unwrap();

    assert_eq!(added, 1);
    assert_eq!(h.engine.ids(), vec!["s"]);
    assert_eq!(h.engine.prepare_count(), 1);
}

#[tokio::test]
async fn test_add_album_expands_listing() {
    let catalog = FakeCatalog::new().with_grouping("OLAK1", tracks(&["x1", "x2"]));
    let h = Harness::start_with(catalog, false);
    h.install(tracks(&["a", "b", "c"]), 0).await;
    h.engine.set_current(1);

    let album = CatalogItem::Album {
        id: "MPRE1".into(),
        title: "Album".into(),
        playlist_id: "OLAK1".into(),
    };
    let added = h
        .session
        .controller()
        .handle_add_endpoint(InsertPosition::AfterCurrent, album)
        .await
        .unwrap();

    assert_eq!(added, 2);
    assert_eq!(h.engine.ids(), vec!["a", "b", "x1", "x2", "c"]);
    assert_eq!(h.engine.current_index().await, Some(1));
}

#[tokio::test]
async fn test_add_playlist_at_end() {
    let catalog = FakeCatalog::new().with_grouping("PL1", tracks(&["p1"]));
    let h = Harness::start_with(catalog, false);
    h.install(tracks(&["a", "b"]), 0).await;

    let playlist = CatalogItem::Playlist {
        id: "PL1".into(),
        title: "Mix".into(),
    };
    h.session
        .controller()
        .handle_add_endpoint(InsertPosition::AtEnd, playlist)
        .await
        .unwrap();

    assert_eq!(h.engine.ids(), vec!["a", "b", "p1"]);
}

#[tokio::test]
async fn test_add_artist_is_noop() {
    let h = Harness::start();
    h.install(tracks(&["a"]), 0).await;
    let prepared = h.engine.prepare_count();

    let artist = CatalogItem::Artist {
        id: "UC1".into(),
        title: "Artist".into(),
    };
    let added = h
        .session
        .controller()
        .handle_add_endpoint(InsertPosition::AtEnd, artist)
        .await
        .unwrap();

    assert_eq!(added, 0);
    assert_eq!(h.engine.ids(), vec!["a"]);
    assert_eq!(h.engine.prepare_count(), prepared);
}

#[tokio::test]
async fn test_unknown_grouping_is_catalog_error() {
    let h = Harness::start();
    let playlist = CatalogItem::Playlist {
        id: "missing".into(),
        title: "Gone".into(),
    };

    let err = h
        .session
        .controller()
        .handle_add_endpoint(InsertPosition::AtEnd, playlist)
        .await
        .unwrap_err();

    assert!(matches!(err, PlaybackError::Catalog(_)));
    assert!(h.engine.ids().is_empty());
}

#[tokio::test]
async fn test_refused_page_is_retried_not_lost() {
    let h = Harness::start();
    let controller = h.session.controller();
    controller
        .play_queue(Arc::new(ListQueue::paged(numbered(9), 0, 3)))
        .await
        .unwrap()
        .await
        .unwrap()
        .unwrap();
    let mut rx = h.events.subscribe();
    h.engine.reject_next_adds(1);

    controller
        .on_item_transition(TransitionReason::Auto)
        .await
        .expect("first fetch")
        .await
        .unwrap();
    assert_eq!(h.engine.ids().len(), 3);
    assert_eq!(controller.len().await, 3);
    next_event(&mut rx, |e| matches!(e, CoreEvent::Queue(QueueEvent::PaginationFailed { .. }))).await;

    controller
        .on_item_transition(TransitionReason::Auto)
        .await
        .expect("refused page retried")
        .await
        .unwrap();
    assert_eq!(controller.len().await, 6);

    h.engine.set_current(3);
    controller
        .on_item_transition(TransitionReason::Auto)
        .await
        .expect("next page")
        .await
        .unwrap();

    let expected: Vec<String> = (0..9).map(|i| format!("t{}", i)).collect();
    assert_eq!(h.engine.ids(), expected);
    assert_eq!(controller.tracks().await, numbered(9));
    assert!(controller
        .on_item_transition(TransitionReason::Auto)
        .await
        .is_none());
}

#[tokio::test]
async fn test_listing_for_replaced_queue_is_dropped() {
    let catalog = FakeCatalog::gated().with_grouping("PL1", tracks(&["p1", "p2"]));
    let h = Harness::start_with(catalog, false);
    h.install(tracks(&["a"]), 0).await;

    let controller = h.session.controller().clone();
    let playlist = CatalogItem::Playlist {
        id: "PL1".into(),
        title: "Mix".into(),
    };
    let add = tokio::spawn(async move {
        controller
            .handle_add_endpoint(InsertPosition::AtEnd, playlist)
            .await
    });
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }

    h.install(tracks(&["x"]), 0).await;
    h.catalog.open_gate();

    assert_eq!(add.await.unwrap().unwrap(), 0);
    assert_eq!(h.engine.ids(), vec!["x"]);
    assert_eq!(h.session.controller().tracks().await, tracks(&["x"]));
}
