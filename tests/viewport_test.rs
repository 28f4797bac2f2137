use approx::assert_relative_eq;
use cgmath::Deg;
use stage_ngin::{
    camera::Projection,
    host::{EventRouter, ListenerKind, ListenerRegistry, SurfaceId},
    viewport::{SurfaceSize, ViewportResizeBinder},
};

use crate::common::test_utils::RecordingGpu;

mod common;

const SURFACE: SurfaceId = SurfaceId(7);

fn lens() -> Projection {
    Projection::new(1, 1, Deg(45.0), 0.1, 1000.0)
}

#[test]
fn should_match_aspect_and_keep_field_of_view() {
    let mut gpu = RecordingGpu::new();
    let mut projection = lens();
    let fovy = projection.fovy;
    let binder = ViewportResizeBinder::new(SURFACE, 2.0);

    binder.apply(SurfaceSize::new(800.0, 600.0), &mut projection, &mut gpu);

    assert_relative_eq!(projection.aspect, 800.0 / 600.0);
    assert_eq!(projection.fovy, fovy);
    assert_eq!(gpu.resizes(), vec![(800, 600)]);

    binder.apply(SurfaceSize::new(300.0, 900.0), &mut projection, &mut gpu);
    assert_relative_eq!(projection.aspect, 1.0 / 3.0);
    assert_eq!(projection.fovy, fovy);
}

#[test]
fn should_cap_pixel_ratio() {
    let mut gpu = RecordingGpu::new();
    let mut projection = lens();
    let binder = ViewportResizeBinder::new(SURFACE, 2.0);

    binder.apply(
        SurfaceSize::new(400.0, 300.0).with_scale_factor(3.0),
        &mut projection,
        &mut gpu,
    );
    binder.apply(
        SurfaceSize::new(400.0, 300.0).with_scale_factor(1.5),
        &mut projection,
        &mut gpu,
    );

    assert_eq!(gpu.resizes(), vec![(800, 600), (600, 450)]);
    assert_relative_eq!(projection.aspect, 4.0 / 3.0);
}

#[test]
fn should_keep_exact_aspect_under_fractional_pixel_ratio() {
    let mut gpu = RecordingGpu::new();
    let mut projection = lens();
    let binder = ViewportResizeBinder::new(SURFACE, 2.0);

    binder.apply(
        SurfaceSize::new(801.0, 600.0).with_scale_factor(1.5),
        &mut projection,
        &mut gpu,
    );

    // 1201.5 rounds to a whole buffer pixel, the lens keeps 801 / 600
    assert_eq!(gpu.resizes().len(), 1);
    assert_eq!(gpu.resizes()[0].1, 900);
    assert_relative_eq!(projection.aspect, 801.0 / 600.0);
}

#[test]
fn should_never_size_below_one_pixel() {
    assert_eq!(SurfaceSize::new(0.0, 0.0).physical(2.0), (1, 1));
    assert_eq!(SurfaceSize::new(-5.0, 10.0).physical(2.0), (1, 10));
    // a collapsed element never poisons the lens
    let mut projection = lens();
    projection.resize(0.0, 600.0);
    assert_relative_eq!(projection.aspect, 1.0);
    projection.resize(f64::NAN, 600.0);
    assert_relative_eq!(projection.aspect, 1.0);
}

#[test]
fn should_bind_one_listener_and_unbind_idempotently() {
    let mut router = EventRouter::new();
    let mut binder = ViewportResizeBinder::new(SURFACE, 2.0);

    binder.bind(&mut router);
    binder.bind(&mut router);

    assert!(binder.is_bound());
    assert_eq!(router.listener_count(ListenerKind::Resize), 1);
    assert!(router.is_listening(SURFACE, ListenerKind::Resize));
    assert!(!router.is_listening(SurfaceId(8), ListenerKind::Resize));

    binder.unbind(&mut router);
    binder.unbind(&mut router);

    assert!(!binder.is_bound());
    assert!(router.is_empty());
}
