use crate::common::*;
use playback_session::models::SessionState;
use playback_session::player::EngineEvent;
use playback_session::session::{LoadRequest, SessionEvent};
use playback_session::utils::SessionError;

#[tokio::test(start_paused = true)]
async fn test_teardown_persists_and_destroys_engine() {
    let fx = single_video();
    let video = fx.episode(0);
    let s = TestSessionBuilder::new().spawn();

    s.handle.load(LoadRequest::new(video.clone())).await.unwrap();
    s.emit(EngineEvent::FileLoaded).await;
    s.progress(200.0, 1400.0).await;

    s.handle.teardown().await.unwrap();

    // The worker is drained before teardown returns
    let stored = s.stores.positions.stored(&video).unwrap();
    assert_eq!(stored.position, 200.0);
    assert_eq!(s.stores.history.entry(&video).unwrap().position_ms, 200_000);
    assert_eq!(s.engine.calls().last(), Some(&EngineCall::Destroy));
    assert_eq!(s.snapshot().await.session.state, SessionState::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_is_idempotent() {
    let fx = single_video();
    let s = TestSessionBuilder::new().spawn();
    s.handle.load(LoadRequest::new(fx.episode(0))).await.unwrap();
    s.emit(EngineEvent::FileLoaded).await;
    s.progress(30.0, 1400.0).await;

    s.handle.teardown().await.unwrap();
    s.handle.teardown().await.unwrap();

    let destroys = s
        .engine
        .calls()
        .into_iter()
        .filter(|call| *call == EngineCall::Destroy)
        .count();
    assert_eq!(destroys, 1);
    assert_eq!(s.stores.positions.writes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_commands_after_teardown_fail() {
    let fx = single_video();
    let s = TestSessionBuilder::new().spawn();
    s.handle.load(LoadRequest::new(fx.episode(0))).await.unwrap();
    s.handle.teardown().await.unwrap();

    assert!(matches!(
        s.handle.seek_to(1.0).await,
        Err(SessionError::SessionDestroyed)
    ));
    assert!(matches!(
        s.handle.load(LoadRequest::new(fx.episode(0))).await,
        Err(SessionError::SessionDestroyed)
    ));
    assert!(matches!(
        s.handle.next_episode().await,
        Err(SessionError::SessionDestroyed)
    ));
    assert!(matches!(
        s.handle.set_overlay_visible(false).await,
        Err(SessionError::SessionDestroyed)
    ));
    assert_eq!(s.engine.load_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_events_after_teardown() {
    let fx = single_video();
    let video = fx.episode(0);
    let builder = TestSessionBuilder::new();
    builder.stores().positions.insert(&video, 300.0, 1400.0);
    let mut s = builder.spawn();

    s.handle.load(LoadRequest::new(video)).await.unwrap();
    s.emit(EngineEvent::FileLoaded).await;
    s.handle.teardown().await.unwrap();

    let events = s.drain_events();
    assert_eq!(
        events.last(),
        Some(&SessionEvent::StateChanged(SessionState::Destroyed))
    );

    // Pending prompt deadline, skip grace and preference timers are gone
    settle(10_000).await;
    s.engine.emit(EngineEvent::ProgressUpdate {
        position: 301.0,
        duration: 1400.0,
    });
    assert_eq!(s.snapshot().await.session.position, 300.0);
    assert!(s.drain_events().is_empty());
    assert!(
        !s.engine
            .calls()
            .iter()
            .any(|call| matches!(call, EngineCall::BorderStyle(_) | EngineCall::Chapters))
    );
}

#[tokio::test(start_paused = true)]
async fn test_dropping_every_handle_tears_down() {
    let fx = single_video();
    let video = fx.episode(0);
    let s = TestSessionBuilder::new().spawn();
    s.handle.load(LoadRequest::new(video.clone())).await.unwrap();
    s.emit(EngineEvent::FileLoaded).await;
    s.progress(90.0, 1400.0).await;

    let TestSession {
        handle,
        engine,
        stores,
        ..
    } = s;
    drop(handle);
    settle(10).await;

    assert_eq!(engine.calls().last(), Some(&EngineCall::Destroy));
    assert_eq!(stores.positions.stored(&video).unwrap().position, 90.0);
}

#[tokio::test(start_paused = true)]
async fn test_destroyed_controller_still_answers_snapshots() {
    let s = TestSessionBuilder::new().spawn();
    let other = s.handle.clone();

    s.handle.teardown().await.unwrap();
    drop(s);

    other.teardown().await.unwrap();
    let snap = other.snapshot().await.unwrap();
    assert_eq!(snap.session.state, SessionState::Destroyed);
}
