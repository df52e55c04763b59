use crate::common::*;
use playback_session::models::SessionState;
use playback_session::player::EngineEvent;
use playback_session::session::{LoadRequest, Notice, SessionEvent};
use playback_session::utils::SessionError;

#[tokio::test(start_paused = true)]
async fn test_stored_position_shows_prompt_until_deadline() {
    let fx = single_video();
    let video = fx.episode(0);
    let builder = TestSessionBuilder::new();
    builder.stores().positions.insert(&video, 120.0, 1440.0);
    let mut s = builder.spawn();

    s.handle.load(LoadRequest::new(video.clone())).await.unwrap();
    assert_eq!(s.engine.loads(), vec![(video.as_str().to_string(), 120.0)]);

    let snap = s.snapshot().await;
    let prompt = snap.resume_prompt.expect("prompt should be visible");
    assert_eq!(prompt.stored_position, 120.0);
    assert_eq!(snap.session.position, 120.0);
    assert_eq!(snap.session.state, SessionState::Loading);

    let snap = s.emit(EngineEvent::FileLoaded).await;
    assert_eq!(snap.session.state, SessionState::AwaitingResumeDecision);
    assert!(snap.session.playing);

    settle(4_900).await;
    assert!(s.snapshot().await.resume_prompt.is_some());

    settle(200).await;
    let snap = s.snapshot().await;
    assert!(snap.resume_prompt.is_none());
    assert_eq!(snap.session.state, SessionState::Playing);

    // Letting the prompt lapse keeps the stored position untouched
    assert_eq!(s.stores.positions.writes(), 0);
    assert_eq!(s.stores.positions.stored(&video).unwrap().position, 120.0);

    let events = s.drain_events();
    assert!(events.contains(&SessionEvent::ResumePromptShown {
        stored_position: 120.0
    }));
    assert!(events.contains(&SessionEvent::ResumePromptHidden));
}

#[tokio::test(start_paused = true)]
async fn test_short_stored_content_starts_from_zero() {
    let fx = single_video();
    let video = fx.episode(0);
    let builder = TestSessionBuilder::new();
    builder.stores().positions.insert(&video, 12.0, 20.0);
    let mut s = builder.spawn();

    s.handle.load(LoadRequest::new(video.clone())).await.unwrap();

    assert_eq!(s.engine.loads(), vec![(video.as_str().to_string(), 0.0)]);
    assert!(s.snapshot().await.resume_prompt.is_none());
    assert!(
        !s.drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::ResumePromptShown { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_position_at_threshold_is_not_offered() {
    let fx = single_video();
    let video = fx.episode(0);
    let builder = TestSessionBuilder::new();
    builder.stores().positions.insert(&video, 5.0, 1440.0);
    let s = builder.spawn();

    s.handle.load(LoadRequest::new(video.clone())).await.unwrap();

    assert_eq!(s.engine.loads()[0].1, 0.0);
    assert!(s.snapshot().await.resume_prompt.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_confirm_restart_clears_position_and_seeks_to_zero() {
    let fx = single_video();
    let video = fx.episode(0);
    let builder = TestSessionBuilder::new();
    builder.stores().positions.insert(&video, 300.0, 1440.0);
    let s = builder.spawn();

    s.handle.load(LoadRequest::new(video.clone())).await.unwrap();
    s.emit(EngineEvent::FileLoaded).await;
    s.handle.confirm_restart().await.unwrap();
    settle(1).await;

    assert_eq!(s.engine.seeks(), vec![0.0]);
    assert!(s.stores.positions.stored(&video).is_none());

    let snap = s.snapshot().await;
    assert!(snap.resume_prompt.is_none());
    assert_eq!(snap.session.state, SessionState::Seeking);
    assert_eq!(snap.session.position, 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_keeps_stored_position() {
    let fx = single_video();
    let video = fx.episode(0);
    let builder = TestSessionBuilder::new();
    builder.stores().positions.insert(&video, 300.0, 1440.0);
    let s = builder.spawn();

    s.handle.load(LoadRequest::new(video.clone())).await.unwrap();
    s.emit(EngineEvent::FileLoaded).await;
    s.handle.dismiss_resume_prompt().await.unwrap();
    settle(1).await;

    let snap = s.snapshot().await;
    assert!(snap.resume_prompt.is_none());
    assert_eq!(snap.session.state, SessionState::Playing);
    assert!(s.engine.seeks().is_empty());
    assert!(s.stores.positions.stored(&video).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_stored_duration_rechecked_on_first_progress() {
    let fx = single_video();
    let video = fx.episode(0);
    let builder = TestSessionBuilder::new();
    builder.stores().positions.insert(&video, 42.0, 0.0);
    let s = builder.spawn();

    s.handle.load(LoadRequest::new(video.clone())).await.unwrap();
    assert_eq!(s.engine.loads()[0].1, 42.0);
    assert!(s.snapshot().await.resume_prompt.is_some());

    s.emit(EngineEvent::FileLoaded).await;
    let snap = s.progress(42.0, 25.0).await;

    assert_eq!(s.engine.seeks(), vec![0.0]);
    assert!(snap.resume_prompt.is_none());
    assert_eq!(snap.session.state, SessionState::Seeking);

    // The next progress completes the seek and mirrors it to the overlay
    let snap = s.progress(0.1, 25.0).await;
    assert_eq!(snap.session.state, SessionState::Playing);
    assert!(s.overlay.calls().contains(&OverlayCall::SeekTo(100)));
}

#[tokio::test(start_paused = true)]
async fn test_long_content_keeps_resume_on_first_progress() {
    let fx = single_video();
    let video = fx.episode(0);
    let builder = TestSessionBuilder::new();
    builder.stores().positions.insert(&video, 42.0, 0.0);
    let s = builder.spawn();

    s.handle.load(LoadRequest::new(video.clone())).await.unwrap();
    s.emit(EngineEvent::FileLoaded).await;
    let snap = s.progress(42.0, 1440.0).await;

    assert!(s.engine.seeks().is_empty());
    assert!(snap.resume_prompt.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_missing_file_fails_without_touching_engine() {
    let mut s = TestSessionBuilder::new().spawn();

    let result = s
        .handle
        .load(LoadRequest::new("/definitely/not/here/ep1.mkv"))
        .await;
    assert!(matches!(result, Err(SessionError::IdentifierResolution(_))));

    let result = s.handle.load(LoadRequest::new("   ")).await;
    assert!(matches!(result, Err(SessionError::IdentifierResolution(_))));

    assert!(s.engine.calls().is_empty());
    let snap = s.snapshot().await;
    assert_eq!(snap.session.token, 0);
    assert_eq!(snap.session.state, SessionState::Idle);

    let notices = s
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::Notice(Notice::LoadFailed(_))))
        .count();
    assert_eq!(notices, 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_resolution_leaves_active_session_alone() {
    let fx = single_video();
    let s = TestSessionBuilder::new().spawn();

    s.handle.load(LoadRequest::new(fx.episode(0))).await.unwrap();
    s.emit(EngineEvent::FileLoaded).await;
    s.progress(10.0, 600.0).await;

    let result = s
        .handle
        .load(LoadRequest::new(fx.path("missing.mkv").to_string_lossy().to_string()))
        .await;
    assert!(result.is_err());

    let snap = s.snapshot().await;
    assert_eq!(snap.session.token, 1);
    assert_eq!(snap.session.video, fx.episode(0));
    assert_eq!(snap.session.state, SessionState::Playing);
    assert_eq!(s.engine.load_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_file_url_resolves_to_local_path() {
    let fx = single_video();
    let path = fx.path("movie.mkv");
    let url = url::Url::from_file_path(&path).unwrap().to_string();
    let s = TestSessionBuilder::new().spawn();

    s.handle.load(LoadRequest::new(url)).await.unwrap();

    assert_eq!(s.engine.loads()[0].0, path.to_string_lossy());
    assert!(!s.snapshot().await.session.is_remote);
}
