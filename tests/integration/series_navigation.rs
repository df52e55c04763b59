use crate::common::*;
use playback_session::player::EngineEvent;
use playback_session::services::FolderSeriesResolver;
use playback_session::session::{LoadRequest, Notice, SessionEvent};
use playback_session::utils::SessionError;
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn test_navigation_stops_at_both_ends() {
    let fx = three_episodes();
    let mut s = TestSessionBuilder::new().spawn();

    s.handle
        .load(LoadRequest::new(fx.episode(2)).with_siblings(fx.episodes.clone()))
        .await
        .unwrap();

    assert!(!s.handle.next_episode().await.unwrap());
    let snap = s.snapshot().await;
    assert_eq!(snap.series_index, Some(2));
    assert!(!snap.has_next);
    assert_eq!(s.engine.load_count(), 1);
    assert!(
        s.drain_events()
            .contains(&SessionEvent::Notice(Notice::NoMoreEpisodes))
    );

    assert!(s.handle.previous_episode().await.unwrap());
    assert!(s.handle.previous_episode().await.unwrap());
    let snap = s.snapshot().await;
    assert_eq!(snap.session.video, fx.episode(0));
    assert_eq!(snap.series_index, Some(0));
    assert!(!snap.has_previous);
    assert!(snap.has_next);

    assert!(!s.handle.previous_episode().await.unwrap());
    assert_eq!(s.snapshot().await.series_index, Some(0));
    assert_eq!(s.engine.load_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_episode_changes_are_announced() {
    let fx = three_episodes();
    let mut s = TestSessionBuilder::new().spawn();

    s.handle
        .load(LoadRequest::new(fx.episode(0)).with_siblings(fx.episodes.clone()))
        .await
        .unwrap();
    s.handle.next_episode().await.unwrap();

    let changes: Vec<_> = s
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::EpisodeChanged { .. }))
        .collect();
    assert_eq!(
        changes,
        vec![
            SessionEvent::EpisodeChanged {
                video: fx.episode(0),
                has_previous: false,
                has_next: true,
            },
            SessionEvent::EpisodeChanged {
                video: fx.episode(1),
                has_previous: true,
                has_next: true,
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_standalone_video_has_no_neighbours() {
    let fx = single_video();
    let mut s = TestSessionBuilder::new().spawn();
    s.handle.load(LoadRequest::new(fx.episode(0))).await.unwrap();

    let snap = s.snapshot().await;
    assert_eq!(snap.series_len, 0);
    assert_eq!(snap.series_index, None);
    assert!(!s.handle.next_episode().await.unwrap());
    assert!(!s.handle.previous_episode().await.unwrap());

    let notices = s
        .drain_events()
        .into_iter()
        .filter(|e| *e == SessionEvent::Notice(Notice::NoMoreEpisodes))
        .count();
    assert_eq!(notices, 2);
}

#[tokio::test(start_paused = true)]
async fn test_folder_resolver_orders_siblings_naturally() {
    let fx = series_dir(&["Show - 10.mkv", "Show - 2.mkv", "Show - 1.mkv", "notes.txt"]);
    let s = TestSessionBuilder::new()
        .with_resolver(Arc::new(FolderSeriesResolver::default()))
        .spawn();

    s.handle
        .load(LoadRequest::new(fx.episode(1)))
        .await
        .unwrap();

    let snap = s.snapshot().await;
    assert_eq!(snap.series_len, 3);
    assert_eq!(snap.series_index, Some(1));

    assert!(s.handle.next_episode().await.unwrap());
    assert_eq!(s.snapshot().await.session.video, fx.episode(0));
}

#[tokio::test(start_paused = true)]
async fn test_switch_keeps_navigated_list() {
    let fx = three_episodes();
    let s = TestSessionBuilder::new()
        .with_resolver(Arc::new(StaticSeries(vec![fx.episode(0), fx.episode(1)])))
        .spawn();

    s.handle
        .load(LoadRequest::new(fx.episode(0)).with_siblings(fx.episodes.clone()))
        .await
        .unwrap();
    s.handle.next_episode().await.unwrap();

    // The explicit three-item list survives the switch, not the resolver's
    let snap = s.snapshot().await;
    assert_eq!(snap.series_len, 3);
    assert!(snap.has_next);
}

#[tokio::test(start_paused = true)]
async fn test_episode_switch_persists_and_discards_old_events() {
    let fx = three_episodes();
    let s = TestSessionBuilder::new().spawn();

    s.handle
        .load(LoadRequest::new(fx.episode(0)).with_siblings(fx.episodes.clone()))
        .await
        .unwrap();
    s.emit(EngineEvent::FileLoaded).await;
    s.progress(600.0, 1400.0).await;
    s.handle.next_episode().await.unwrap();
    settle(1).await;

    let stored = s.stores.positions.stored(&fx.episode(0)).unwrap();
    assert_eq!(stored.position, 600.0);
    assert_eq!(stored.duration, 1400.0);
    let history = s.stores.history.entry(&fx.episode(0)).unwrap();
    assert_eq!(history.position_ms, 600_000);
}

#[tokio::test(start_paused = true)]
async fn test_failed_switch_keeps_cursor() {
    let fx = three_episodes();
    let s = TestSessionBuilder::new().spawn();

    s.handle
        .load(LoadRequest::new(fx.episode(0)).with_siblings(fx.episodes.clone()))
        .await
        .unwrap();
    std::fs::remove_file(fx.path("Show - 02.mkv")).unwrap();

    assert!(matches!(
        s.handle.next_episode().await,
        Err(SessionError::IdentifierResolution(_))
    ));

    let snap = s.snapshot().await;
    assert_eq!(snap.session.video, fx.episode(0));
    assert_eq!(snap.session.token, 1);
    assert_eq!(snap.series_index, Some(0));
    assert!(!snap.has_previous);
    assert!(snap.has_next);
    assert_eq!(s.engine.load_count(), 1);

    // Retrying still targets the missing episode rather than skipping it
    touch(&fx.path("Show - 02.mkv"));
    assert!(s.handle.next_episode().await.unwrap());
    let snap = s.snapshot().await;
    assert_eq!(snap.session.video, fx.episode(1));
    assert_eq!(snap.series_index, Some(1));
}
