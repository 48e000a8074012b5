//! Transition serialization under concurrent callers

mod helpers;

use helpers::{fast_timings, TestPlayer};
use musicshell_player::playback::TransportStatus;
use std::time::{Duration, Instant};

fn impatient_player(titles: &[&str]) -> TestPlayer {
    let mut timings = fast_timings();
    timings.play_lock_timeout_ms = 50;
    timings.stop_lock_timeout_ms = 50;
    let player = TestPlayer::with_timings(titles, timings);
    player.devices.set_init_delay(Duration::from_millis(300));
    player
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transport_keeps_one_reader_open() {
    let player = TestPlayer::new(&["a", "b", "c"]);
    player.devices.set_init_delay(Duration::from_millis(5));

    let mut handles = Vec::new();
    for i in 0..40 {
        let controller = player.controller.clone();
        handles.push(tokio::spawn(async move {
            match i % 5 {
                0 => controller.play().await,
                1 => controller.stop().await,
                2 => controller.next().await,
                3 => controller.previous().await,
                _ => controller.pause(),
            }
        }));
    }

    for handle in handles {
        let status = handle.await.unwrap();
        assert!(
            !matches!(status, TransportStatus::Failed(_)),
            "unexpected failure: {}",
            status
        );
    }

    assert_eq!(player.stats().max_open_readers(), 1);
    assert!(player.controller.current_index() < 3);

    player.controller.stop().await;
    assert_eq!(player.stats().open_readers(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lock_timeout_reports_busy() {
    let player = impatient_player(&["a", "b"]);

    let controller = player.controller.clone();
    let slow_play = tokio::spawn(async move { controller.play().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stop = player.controller.stop().await;
    let next = player.controller.next().await;

    assert_eq!(stop, TransportStatus::Busy);
    assert_eq!(next, TransportStatus::Busy);
    assert_eq!(stop.to_string(), "Player is busy, please retry.");

    let played = slow_play.await.unwrap();
    assert_eq!(played, TransportStatus::Playing("a".to_string()));
    assert_eq!(player.controller.current_index(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pause_and_queries_do_not_wait_for_transitions() {
    let player = impatient_player(&["a", "b"]);

    let controller = player.controller.clone();
    let slow_play = tokio::spawn(async move { controller.play().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    assert_eq!(player.controller.pause(), TransportStatus::Paused);
    assert_eq!(player.controller.list_songs().await.unwrap(), vec!["a", "b"]);
    assert_eq!(player.controller.song_info(1).await.unwrap().title, "b");
    assert!(started.elapsed() < Duration::from_millis(200));

    slow_play.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dispose_during_transition() {
    let player = impatient_player(&["a", "b"]);

    let controller = player.controller.clone();
    let slow_play = tokio::spawn(async move { controller.play().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    player.controller.dispose().await;
    let _ = slow_play.await.unwrap();

    assert!(player.controller.is_disposed());
    assert_eq!(player.controller.next().await, TransportStatus::ShutDown);
    assert_eq!(player.stats().open_readers(), 0);
    assert_eq!(player.stats().created(), player.stats().disposed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pause_does_not_wait_for_device_teardown() {
    let player = TestPlayer::new(&["a", "b"]);
    player.controller.play().await;
    player.devices.set_dispose_delay(Duration::from_millis(400));

    let controller = player.controller.clone();
    let stopping = tokio::spawn(async move { controller.stop().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let controller = player.controller.clone();
    let started = Instant::now();
    let status = tokio::task::spawn_blocking(move || controller.pause())
        .await
        .unwrap();

    assert_eq!(status, TransportStatus::Paused);
    assert!(
        started.elapsed() < Duration::from_millis(200),
        "pause blocked for {:?}",
        started.elapsed()
    );
    assert_eq!(stopping.await.unwrap(), TransportStatus::Stopped);
    assert_eq!(player.stats().open_readers(), 0);
}
