mod common;

use common::{recorder, settle, wait_for_state, Script};
use load_lifecycle::prelude::*;

#[tokio::test(start_paused = true)]
async fn first_load_renders_and_notifies_the_value() {
    common::init_logging();
    let script = Script::<i32>::new();
    let (seen, on_value_changed) = recorder();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .on_value_changed(on_value_changed)
        .build()
        .unwrap();
    assert_eq!(controller.state(), LoadState::Init);
    assert_eq!(controller.view(), LoadView::Empty);

    controller.start();
    wait_for_state(&controller, LoadState::Loading).await;
    assert_eq!(controller.view(), LoadView::Loading);
    assert_eq!(script.calls(), 1);

    script.resolve(42);
    wait_for_state(&controller, LoadState::Loaded).await;
    assert_eq!(controller.view(), LoadView::Loaded(42));
    assert_eq!(*seen.lock().unwrap(), vec![42]);
}

#[tokio::test]
async fn building_without_fetch_fails() {
    let result = LoadController::<i32>::builder()
        .stale_data_is_error(true)
        .build();
    assert!(matches!(result, Err(Error::MissingFetch)));
}

#[tokio::test(start_paused = true)]
async fn refresh_with_equal_value_renders_and_notifies_nothing() {
    let script = Script::<i32>::new();
    let (seen, on_value_changed) = recorder();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .on_value_changed(on_value_changed)
        .build()
        .unwrap();
    controller.start();
    script.resolve(42);
    wait_for_state(&controller, LoadState::Loaded).await;

    let mut view = controller.subscribe_view();
    view.borrow_and_update();

    controller.reload();
    wait_for_state(&controller, LoadState::Refreshing).await;
    assert_eq!(controller.view(), LoadView::Loaded(42));
    script.resolve(42);
    wait_for_state(&controller, LoadState::Loaded).await;
    settle().await;
    assert!(!view.has_changed().unwrap());
    assert_eq!(*seen.lock().unwrap(), vec![42]);

    controller.reload();
    wait_for_state(&controller, LoadState::Refreshing).await;
    script.resolve(43);
    wait_for_state(&controller, LoadState::Loaded).await;
    assert!(view.has_changed().unwrap());
    assert_eq!(controller.view(), LoadView::Loaded(43));
    assert_eq!(*seen.lock().unwrap(), vec![42, 43]);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_stale_value_by_default() {
    let script = Script::<i32>::new();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .build()
        .unwrap();
    controller.start();
    script.resolve(42);
    wait_for_state(&controller, LoadState::Loaded).await;

    controller.reload();
    script.fail("network down");
    wait_for_state(&controller, LoadState::Stale).await;
    assert_eq!(controller.view(), LoadView::Loaded(42));

    // Stale values can be refreshed like loaded ones
    controller.reload();
    wait_for_state(&controller, LoadState::Refreshing).await;
    assert_eq!(script.calls(), 3);
    script.resolve(43);
    wait_for_state(&controller, LoadState::Loaded).await;
    assert_eq!(controller.view(), LoadView::Loaded(43));
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_renders_error_when_stale_data_is_error() {
    let script = Script::<i32>::new();
    let (seen, on_value_changed) = recorder();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .stale_data_is_error(true)
        .on_value_changed(on_value_changed)
        .build()
        .unwrap();
    controller.start();
    script.resolve(42);
    wait_for_state(&controller, LoadState::Loaded).await;

    controller.reload();
    script.fail("network down");
    wait_for_state(&controller, LoadState::Stale).await;
    assert_eq!(
        controller.view(),
        LoadView::Error(FetchError::failed("network down"))
    );

    // Same value again: the view recovers but the value is not notified twice
    controller.reload();
    script.resolve(42);
    wait_for_state(&controller, LoadState::Loaded).await;
    assert_eq!(controller.view(), LoadView::Loaded(42));
    assert_eq!(*seen.lock().unwrap(), vec![42]);
}

#[tokio::test(start_paused = true)]
async fn stale_data_is_error_can_be_switched_at_runtime() {
    let script = Script::<i32>::new();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .build()
        .unwrap();
    controller.start();
    script.resolve(1);
    wait_for_state(&controller, LoadState::Loaded).await;

    controller.set_stale_data_is_error(true);
    controller.reload();
    script.fail("boom");
    wait_for_state(&controller, LoadState::Stale).await;
    assert_eq!(controller.view(), LoadView::Error(FetchError::failed("boom")));
}

#[tokio::test(start_paused = true)]
async fn first_load_failure_renders_error_and_can_be_retried() {
    let script = Script::<i32>::new();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .build()
        .unwrap();
    controller.start();
    script.fail("boom");
    wait_for_state(&controller, LoadState::Error).await;
    assert_eq!(controller.view(), LoadView::Error(FetchError::failed("boom")));

    controller.reload();
    wait_for_state(&controller, LoadState::Loading).await;
    // No placeholder when retrying, the error stays until something replaces it
    assert_eq!(controller.view(), LoadView::Error(FetchError::failed("boom")));
    script.resolve(7);
    wait_for_state(&controller, LoadState::Loaded).await;
    assert_eq!(controller.view(), LoadView::Loaded(7));
}

#[tokio::test(start_paused = true)]
async fn reload_while_fetching_is_ignored() {
    let script = Script::<i32>::new();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .build()
        .unwrap();
    controller.start();
    controller.reload();
    controller.start();
    settle().await;
    assert_eq!(controller.state(), LoadState::Loading);
    assert_eq!(script.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelling_first_load_ends_in_error() {
    let script = Script::<i32>::new();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .build()
        .unwrap();
    controller.start();
    wait_for_state(&controller, LoadState::Loading).await;

    controller.cancel();
    wait_for_state(&controller, LoadState::Error).await;
    assert!(script.token(0).is_cancelled());
    assert_eq!(controller.view(), LoadView::Loading);

    // Nothing left to cancel
    controller.cancel();
    settle().await;
    assert_eq!(controller.state(), LoadState::Error);
}

#[tokio::test(start_paused = true)]
async fn cancelling_refresh_ends_in_stale() {
    let script = Script::<i32>::new();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .build()
        .unwrap();
    controller.start();
    script.resolve(42);
    wait_for_state(&controller, LoadState::Loaded).await;

    controller.reload();
    wait_for_state(&controller, LoadState::Refreshing).await;
    controller.cancel();
    wait_for_state(&controller, LoadState::Stale).await;
    assert!(script.token(1).is_cancelled());
    // Superseded as soon as the refresh started
    assert!(script.token(0).is_cancelled());
    assert_eq!(controller.view(), LoadView::Loaded(42));
}

#[tokio::test(start_paused = true)]
async fn reload_key_changes_force_a_fetch() {
    let script = Script::<i32>::new();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .reload_key("alice")
        .build()
        .unwrap();
    controller.start();
    script.resolve(1);
    wait_for_state(&controller, LoadState::Loaded).await;

    controller.set_reload_key("alice");
    settle().await;
    assert_eq!(script.calls(), 1);
    assert_eq!(controller.state(), LoadState::Loaded);

    controller.set_reload_key("bob");
    wait_for_state(&controller, LoadState::Refreshing).await;
    assert_eq!(script.calls(), 2);
    script.resolve(2);
    wait_for_state(&controller, LoadState::Loaded).await;
    assert_eq!(controller.view(), LoadView::Loaded(2));
}

#[tokio::test(start_paused = true)]
async fn first_reload_key_triggers_loading() {
    let script = Script::<i32>::new();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .build()
        .unwrap();
    controller.set_reload_key(1u32);
    wait_for_state(&controller, LoadState::Loading).await;
    assert_eq!(script.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn dispose_cancels_in_flight_fetch_and_silences_everything() {
    let script = Script::<i32>::new();
    let (seen, on_value_changed) = recorder();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .on_value_changed(on_value_changed)
        .build()
        .unwrap();
    controller.start();
    wait_for_state(&controller, LoadState::Loading).await;

    controller.dispose().await;
    assert_eq!(controller.state(), LoadState::Disposed);
    assert!(controller.is_disposed());
    assert!(script.token(0).is_cancelled());

    script.resolve(42);
    controller.reload();
    controller.cancel();
    controller.set_period(Some(std::time::Duration::from_millis(10)));
    settle().await;
    assert_eq!(controller.state(), LoadState::Disposed);
    assert_eq!(controller.view(), LoadView::Loading);
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(script.calls(), 1);

    // Idempotent
    controller.dispose().await;
    assert!(controller.is_disposed());
}

#[tokio::test(start_paused = true)]
async fn concurrent_dispose_calls_all_return() {
    let script = Script::<i32>::new();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .build()
        .unwrap();
    let other = controller.clone();
    controller.start();

    tokio::join!(controller.dispose(), other.dispose());
    assert!(controller.is_disposed());
    assert!(other.is_disposed());
}

#[tokio::test(start_paused = true)]
async fn dispose_before_start_leaves_init() {
    let script = Script::<i32>::new();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .build()
        .unwrap();
    controller.dispose().await;
    assert!(controller.is_disposed());
    assert_eq!(script.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_disposes() {
    let script = Script::<i32>::new();
    let controller = LoadController::builder()
        .fetch(script.fetch())
        .build()
        .unwrap();
    let state = controller.subscribe_state();
    controller.start();
    wait_for_state(&controller, LoadState::Loading).await;

    drop(controller);
    settle().await;
    assert_eq!(*state.borrow(), LoadState::Disposed);
    assert!(script.token(0).is_cancelled());
}
