//! Lifecycle behaviour against mocked hardware.

use gpio_camera::capture::{CaptureConfig, MockCamera};
use gpio_camera::gpio::{Direction, EdgeTrigger, MockGpioHandle, MockPeripheralManager};
use gpio_camera::lifecycle::{Controller, StaticPermission, Startup};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Rig {
    controller: Controller,
    gpio: MockGpioHandle,
    camera_requests: Arc<AtomicUsize>,
    permission_requests: Arc<AtomicUsize>,
}

fn rig(permission: StaticPermission) -> Rig {
    rig_with(permission, CaptureConfig::with_dimensions(16, 8))
}

fn rig_with(permission: StaticPermission, capture: CaptureConfig) -> Rig {
    let peripherals = MockPeripheralManager::new();
    let gpio = peripherals.handle();
    let camera = MockCamera::new(capture);
    let camera_requests = camera.request_counter();
    let permission_requests = permission.request_counter();
    let controller = Controller::new(Box::new(permission), Box::new(peripherals), Box::new(camera))
        .with_button_pin("BCM21");
    Rig {
        controller,
        gpio,
        camera_requests,
        permission_requests,
    }
}

#[test]
fn denied_permission_opens_nothing() {
    let mut rig = rig(StaticPermission::denied());

    let startup = rig.controller.on_create().unwrap();

    assert_eq!(startup, Startup::PermissionRequested);
    assert_eq!(rig.gpio.open_count(), 0);
    assert!(!rig.controller.worker_started());
    assert_eq!(rig.permission_requests.load(Ordering::SeqCst), 1);
}

#[test]
fn granted_permission_opens_one_falling_edge_input() {
    let mut rig = rig(StaticPermission::granted());

    let startup = rig.controller.on_create().unwrap();

    assert_eq!(startup, Startup::Started);
    assert!(rig.controller.worker_started());
    assert_eq!(rig.gpio.opened(), vec!["BCM21".to_string()]);
    assert_eq!(rig.gpio.direction(), Some(Direction::In));
    assert_eq!(rig.gpio.edge_trigger(), Some(EdgeTrigger::Falling));
    assert!(rig.gpio.has_callback());
    assert_eq!(rig.permission_requests.load(Ordering::SeqCst), 0);

    rig.controller.on_destroy();
    rig.controller.join_worker().unwrap();
}

#[test]
fn late_grant_runs_setup() {
    let mut rig = rig(StaticPermission::denied());
    assert_eq!(rig.controller.on_create().unwrap(), Startup::PermissionRequested);

    let startup = rig.controller.on_request_permissions_result(true).unwrap();

    assert_eq!(startup, Startup::Started);
    assert!(rig.controller.worker_started());
    assert_eq!(rig.gpio.open_count(), 1);

    rig.controller.on_destroy();
    rig.controller.join_worker().unwrap();
}

#[test]
fn late_denial_opens_nothing() {
    let mut rig = rig(StaticPermission::denied());
    rig.controller.on_create().unwrap();

    let startup = rig.controller.on_request_permissions_result(false).unwrap();

    assert_eq!(startup, Startup::PermissionDenied);
    assert_eq!(rig.gpio.open_count(), 0);
    assert!(!rig.controller.worker_started());
}

#[test]
fn destroy_closes_button_once() {
    let mut rig = rig(StaticPermission::granted());
    rig.controller.on_create().unwrap();

    rig.controller.on_destroy();
    rig.controller.on_destroy();

    assert_eq!(rig.gpio.close_count(), 1);
    assert!(!rig.controller.button_open());
    rig.controller.join_worker().unwrap();
}

#[test]
fn destroy_clears_handle_when_close_fails() {
    let mut rig = rig(StaticPermission::granted());
    rig.controller.on_create().unwrap();
    rig.gpio.fail_close(true);

    rig.controller.on_destroy();

    assert_eq!(rig.gpio.close_count(), 1);
    assert!(!rig.controller.button_open());
    assert_eq!(rig.controller.stats().errors(), 1);
    rig.controller.join_worker().unwrap();
}

#[test]
fn edges_after_destroy_unregister_callback() {
    let mut rig = rig(StaticPermission::granted());
    rig.controller.on_create().unwrap();
    let gpio = rig.gpio.clone();

    rig.controller.on_destroy();
    rig.controller.join_worker().unwrap();

    // The line was closed, so there is nothing left to fire.
    assert!(!gpio.fire_edge());
    assert_eq!(rig.camera_requests.load(Ordering::SeqCst), 0);
}

#[test]
fn manual_capture_requests_picture() {
    let mut rig = rig(StaticPermission::granted());
    rig.controller.on_create().unwrap();

    rig.controller.request_capture().unwrap();
    rig.controller.on_destroy();
    rig.controller.join_worker().unwrap();

    assert_eq!(rig.camera_requests.load(Ordering::SeqCst), 1);
}

#[test]
fn oversized_capture_is_reported_and_worker_survives() {
    let capture = CaptureConfig::with_dimensions(70_000, 70_000);
    let mut rig = rig_with(StaticPermission::granted(), capture);

    assert_eq!(rig.controller.on_create().unwrap(), Startup::Started);
    // Camera initialization was refused and reported.
    assert_eq!(rig.controller.stats().errors(), 1);

    assert!(rig.gpio.fire_edge());
    assert!(rig.gpio.fire_edge());
    rig.controller.on_destroy();
    rig.controller.join_worker().unwrap();

    assert_eq!(rig.camera_requests.load(Ordering::SeqCst), 2);
    assert_eq!(rig.controller.stats().errors(), 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn every_edge_requests_one_picture(edges in 0usize..24) {
        let mut rig = rig(StaticPermission::granted());
        rig.controller.on_create().unwrap();

        for _ in 0..edges {
            prop_assert!(rig.gpio.fire_edge());
        }
        rig.controller.on_destroy();
        rig.controller.join_worker().unwrap();

        prop_assert_eq!(rig.camera_requests.load(Ordering::SeqCst), edges);
        prop_assert_eq!(rig.controller.stats().button_edges(), edges as u64);
    }
}
