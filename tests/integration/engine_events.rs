use crate::common::*;
use playback_session::models::SessionState;
use playback_session::player::EngineEvent;
use playback_session::session::{LoadRequest, Notice, SessionEvent};
use playback_session::utils::SessionError;

async fn playing_session() -> (SeriesDir, TestSession) {
    let fx = single_video();
    let s = TestSessionBuilder::new().spawn();
    s.handle.load(LoadRequest::new(fx.episode(0))).await.unwrap();
    s.emit(EngineEvent::FileLoaded).await;
    (fx, s)
}

#[tokio::test(start_paused = true)]
async fn test_stuck_position_flags_buffering() {
    let (_fx, mut s) = playing_session().await;

    s.progress(10.0, 600.0).await;
    settle(150).await;
    let snap = s.progress(10.0, 600.0).await;
    assert!(!snap.buffering);

    settle(100).await;
    let snap = s.progress(10.0, 600.0).await;
    assert!(snap.buffering);
    assert_eq!(snap.session.state, SessionState::Stalled);

    let snap = s.progress(10.5, 600.0).await;
    assert!(!snap.buffering);
    assert_eq!(snap.session.state, SessionState::Playing);

    let buffering: Vec<bool> = s
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::BufferingChanged(flag) => Some(flag),
            _ => None,
        })
        .collect();
    assert_eq!(buffering, vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_paused_playback_never_stalls() {
    let (_fx, s) = playing_session().await;

    s.progress(10.0, 600.0).await;
    s.emit(EngineEvent::PlaybackStateChanged { is_playing: false })
        .await;
    settle(1_000).await;
    let snap = s.progress(10.0, 600.0).await;

    assert!(!snap.buffering);
    assert_eq!(snap.session.state, SessionState::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_engine_buffering_report_overrides_heuristic() {
    let (_fx, s) = playing_session().await;
    s.progress(10.0, 600.0).await;

    let snap = s
        .emit(EngineEvent::BufferingStateChanged { is_buffering: true })
        .await;
    assert!(snap.buffering);
    assert_eq!(snap.session.state, SessionState::Stalled);

    let snap = s
        .emit(EngineEvent::BufferingStateChanged {
            is_buffering: false,
        })
        .await;
    assert!(!snap.buffering);
    assert_eq!(snap.session.state, SessionState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_events_from_previous_load_are_ignored() {
    let fx = three_episodes();
    let s = TestSessionBuilder::new().spawn();

    s.handle
        .load(LoadRequest::new(fx.episode(0)).with_siblings(fx.episodes.clone()))
        .await
        .unwrap();
    s.emit(EngineEvent::FileLoaded).await;
    s.progress(100.0, 1400.0).await;

    assert!(s.handle.next_episode().await.unwrap());
    assert_eq!(s.engine.load_count(), 2);

    let old = s.engine.sink(0);
    assert_eq!(old.token(), 1);
    old.emit(EngineEvent::ProgressUpdate {
        position: 999.0,
        duration: 1400.0,
    });
    old.emit(EngineEvent::EndOfFile);
    old.emit(EngineEvent::Error {
        message: "late".into(),
    });

    let snap = s.snapshot().await;
    assert_eq!(snap.session.token, 2);
    assert_eq!(snap.session.video, fx.episode(1));
    assert_eq!(snap.session.position, 0.0);
    assert_eq!(snap.session.state, SessionState::Loading);
}

#[tokio::test(start_paused = true)]
async fn test_runtime_error_recovers_on_progress() {
    let (_fx, mut s) = playing_session().await;
    s.progress(5.0, 600.0).await;

    let snap = s
        .emit(EngineEvent::Error {
            message: "decoder hiccup".into(),
        })
        .await;
    assert_eq!(
        snap.session.state,
        SessionState::Error("decoder hiccup".into())
    );
    assert!(s.drain_events().contains(&SessionEvent::Notice(Notice::EngineError(
        "decoder hiccup".into()
    ))));

    let snap = s.progress(5.5, 600.0).await;
    assert_eq!(snap.session.state, SessionState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_engine_rejecting_load_is_fatal_for_that_load() {
    let fx = single_video();
    let mut s = TestSessionBuilder::new().spawn();
    s.engine.fail_next_load("no decoder");

    let result = s.handle.load(LoadRequest::new(fx.episode(0))).await;
    assert!(matches!(result, Err(SessionError::EngineInit(_))));

    let snap = s.snapshot().await;
    assert_eq!(snap.session.state, SessionState::Error("no decoder".into()));
    assert!(matches!(
        s.handle.seek_to(10.0).await,
        Err(SessionError::EngineInit(_))
    ));
    assert!(
        s.drain_events()
            .contains(&SessionEvent::Notice(Notice::LoadFailed("no decoder".into())))
    );

    // A fresh load starts over
    s.handle.load(LoadRequest::new(fx.episode(0))).await.unwrap();
    let snap = s.snapshot().await;
    assert_eq!(snap.session.token, 2);
    assert_eq!(snap.session.state, SessionState::Loading);
    let snap = s.emit(EngineEvent::FileLoaded).await;
    assert_eq!(snap.session.state, SessionState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_end_of_file_clears_stored_position() {
    let fx = single_video();
    let video = fx.episode(0);
    let builder = TestSessionBuilder::new();
    builder.stores().positions.insert(&video, 300.0, 1400.0);
    let s = builder.spawn();

    s.handle.load(LoadRequest::new(video.clone())).await.unwrap();
    s.emit(EngineEvent::FileLoaded).await;
    s.progress(1399.0, 1400.0).await;
    let snap = s.emit(EngineEvent::EndOfFile).await;
    assert_eq!(snap.session.state, SessionState::Ended);
    assert!(snap.resume_prompt.is_none());

    s.handle.teardown().await.unwrap();
    assert!(s.stores.positions.stored(&video).is_none());
    assert!(s.stores.history.entry(&video).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_overlay_follows_playback() {
    let (fx, s) = playing_session().await;

    assert_eq!(
        s.overlay.calls(),
        vec![
            OverlayCall::Load {
                video: fx.episode(0),
                path: None,
            },
            OverlayCall::SetSpeed(1.0),
            OverlayCall::Resume,
        ]
    );

    s.progress(100.0, 1400.0).await;
    s.emit(EngineEvent::PlaybackStateChanged { is_playing: false })
        .await;
    s.emit(EngineEvent::PlaybackStateChanged { is_playing: true })
        .await;

    s.handle.seek_to(200.0).await.unwrap();
    assert_eq!(s.snapshot().await.session.state, SessionState::Seeking);
    let snap = s.progress(200.25, 1400.0).await;
    assert_eq!(snap.session.state, SessionState::Playing);

    s.handle.set_speed(1.5).await.unwrap();

    assert_eq!(
        s.overlay.calls()[3..].to_vec(),
        vec![
            OverlayCall::Pause,
            OverlayCall::Resume,
            OverlayCall::SeekTo(200_250),
            OverlayCall::SetSpeed(1.5),
        ]
    );
    assert!(s.engine.calls().contains(&EngineCall::SeekTo {
        position: 200.0,
        precise: true
    }));
}

#[tokio::test(start_paused = true)]
async fn test_seek_is_clamped_to_duration() {
    let (_fx, s) = playing_session().await;
    s.progress(100.0, 1400.0).await;

    s.handle.seek_to(5_000.0).await.unwrap();
    s.handle.seek_to(-3.0).await.unwrap();

    assert_eq!(s.engine.seeks(), vec![1400.0, 0.0]);
}

#[tokio::test(start_paused = true)]
async fn test_commands_before_load_are_rejected() {
    let s = TestSessionBuilder::new().spawn();

    assert!(matches!(
        s.handle.seek_to(10.0).await,
        Err(SessionError::Engine(_))
    ));
    assert!(s.handle.set_speed(2.0).await.is_err());
    assert!(s.engine.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_speed_is_rejected() {
    let (_fx, s) = playing_session().await;

    assert!(s.handle.set_speed(0.0).await.is_err());
    assert!(s.handle.set_speed(f64::NAN).await.is_err());
    assert!(
        !s.engine
            .calls()
            .iter()
            .any(|call| matches!(call, EngineCall::SetSpeed(_)))
    );
}

#[tokio::test(start_paused = true)]
async fn test_speed_and_aspect_survive_episode_switch() {
    let fx = three_episodes();
    let s = TestSessionBuilder::new().spawn();
    s.handle
        .load(LoadRequest::new(fx.episode(0)).with_siblings(fx.episodes.clone()))
        .await
        .unwrap();
    s.emit(EngineEvent::FileLoaded).await;

    s.handle.set_speed(1.25).await.unwrap();
    s.handle
        .set_aspect_mode(playback_session::player::AspectMode::Ratio16_9)
        .await
        .unwrap();
    s.handle.next_episode().await.unwrap();

    let snap = s.snapshot().await;
    assert_eq!(snap.session.speed, 1.25);
    assert_eq!(
        snap.session.aspect_mode,
        playback_session::player::AspectMode::Ratio16_9
    );
}

#[tokio::test(start_paused = true)]
async fn test_shader_chain_applied_once_on_surface_ready() {
    let fx = single_video();
    let s = TestSessionBuilder::new()
        .with_config(|config| {
            config.engine.shader_chain = vec!["a.glsl".into(), "b.glsl".into()];
        })
        .spawn();
    s.handle.load(LoadRequest::new(fx.episode(0))).await.unwrap();

    s.emit(EngineEvent::SurfaceReady).await;
    s.emit(EngineEvent::SurfaceReady).await;

    let chains: Vec<_> = s
        .engine
        .calls()
        .into_iter()
        .filter(|call| matches!(call, EngineCall::SetShaderChain(_)))
        .collect();
    assert_eq!(
        chains,
        vec![EngineCall::SetShaderChain(vec![
            "a.glsl".into(),
            "b.glsl".into()
        ])]
    );
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_file_loaded_is_ignored() {
    let (_fx, s) = playing_session().await;
    s.emit(EngineEvent::FileLoaded).await;

    let loads = s
        .overlay
        .calls()
        .into_iter()
        .filter(|call| matches!(call, OverlayCall::Load { .. }))
        .count();
    assert_eq!(loads, 1);
}
