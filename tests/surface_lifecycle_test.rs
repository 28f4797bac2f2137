use approx::assert_relative_eq;
use rand::{SeedableRng, rngs::StdRng};
use stage_ngin::{
    EngineConfig, ModelKind, SurfaceMount,
    error::EngineError,
    host::{ListenerKind, ListenerRegistry, SurfaceId},
    pipelines::ProgramKind,
    scroll::{Easing, RegionBounds, ScrollTrigger, StyleProperty, Timeline, Tween},
    viewport::SurfaceSize,
};

use crate::common::test_utils::{GpuCall, TestHost};

mod common;

const SURFACE: SurfaceId = SurfaceId(1);

fn mount(test_host: &mut TestHost, kind: ModelKind) -> SurfaceMount {
    let mut rng = StdRng::seed_from_u64(7);
    SurfaceMount::mount(
        SURFACE,
        kind,
        &EngineConfig::default(),
        SurfaceSize::new(800.0, 600.0),
        &mut test_host.host(),
        &mut rng,
    )
}

/// Advances the clock and delivers every due frame. Returns the frames drawn.
fn tick(test_host: &mut TestHost, mount: &mut SurfaceMount, secs: f32) -> usize {
    test_host.clock.advance(secs);
    let due = test_host.frames.take_due();
    let mut host = test_host.host();
    due.into_iter()
        .filter(|request| mount.on_frame(*request, &mut host))
        .count()
}

#[test]
fn should_acquire_everything_on_mount() {
    let mut test_host = TestHost::new();

    let mount = mount(&mut test_host, ModelKind::Globe);

    assert!(mount.is_live());
    assert_eq!(mount.kind(), ModelKind::Globe);
    assert!(mount.program(ProgramKind::Globe).is_some());
    assert!(mount.program(ProgramKind::Points).is_some());
    assert_eq!(test_host.gpu.created_programs(), 2);
    assert_eq!(test_host.gpu.resizes(), vec![(800, 600)]);
    assert_eq!(test_host.listeners.len(), 2);
    assert!(test_host.listeners.is_listening(SURFACE, ListenerKind::Resize));
    assert!(test_host.listeners.is_listening(SURFACE, ListenerKind::Scroll));
    assert_eq!(test_host.frames.pending(), 1);
    assert_relative_eq!(mount.scene().unwrap().projection.aspect, 800.0 / 600.0);
}

#[test]
fn should_pass_absolute_time_to_programs() {
    let mut test_host = TestHost::new();
    let mut mount = mount(&mut test_host, ModelKind::Globe);

    assert_eq!(tick(&mut test_host, &mut mount, 2.0), 1);

    let frame = test_host.gpu.last_frame().expect("a frame was rendered");
    assert_eq!(frame.draws.len(), 2);
    for kind in [ProgramKind::Globe, ProgramKind::Points] {
        let program = mount.program(kind).unwrap();
        let time = frame.uniform_f32(program, "time").expect("time bound");
        assert_relative_eq!(time, 2.0, epsilon = 1e-5);
    }

    assert_eq!(tick(&mut test_host, &mut mount, 0.5), 1);
    let program = mount.program(ProgramKind::Globe).unwrap();
    let time = test_host.gpu.last_frame().unwrap().uniform_f32(program, "time");
    assert_relative_eq!(time.unwrap(), 2.5, epsilon = 1e-5);
    assert_eq!(mount.stats().renders, 2);
}

#[test]
fn should_write_material_overrides_next_to_base_values() {
    let mut test_host = TestHost::new();
    let mut mount = mount(&mut test_host, ModelKind::Globe);

    tick(&mut test_host, &mut mount, 1.0);

    let globe = mount.program(ProgramKind::Globe).unwrap();
    let frame = test_host.gpu.last_frame().unwrap();
    assert_relative_eq!(frame.uniform_f32(globe, "rim").unwrap(), 0.6);
    assert_relative_eq!(frame.uniform_f32(globe, "opacity").unwrap(), 0.5);
}

#[test]
fn should_release_in_reverse_on_dispose() {
    let mut test_host = TestHost::new();
    let mut mount = mount(&mut test_host, ModelKind::Trophy);
    tick(&mut test_host, &mut mount, 0.1);
    let stale = mount.pending_frame().expect("loop is running");
    let before_dispose = test_host.gpu.calls.len();

    mount.dispose(&mut test_host.host());

    assert!(!mount.is_live());
    assert!(test_host.listeners.is_empty());
    assert_eq!(test_host.frames.pending(), 0);
    assert!(test_host.gpu.programs.is_empty());
    assert!(test_host.gpu.buffers.is_empty());

    let released = &test_host.gpu.calls[before_dispose..];
    let last_buffer = released
        .iter()
        .rposition(|c| matches!(c, GpuCall::ReleaseBuffer(_)))
        .expect("buffers released");
    let first_program = released
        .iter()
        .position(|c| matches!(c, GpuCall::ReleaseProgram(_)))
        .expect("programs released");
    assert!(last_buffer < first_program);

    let renders = test_host.gpu.frames.len();
    assert!(!mount.on_frame(stale, &mut test_host.host()));
    assert_eq!(tick(&mut test_host, &mut mount, 1.0), 0);
    assert_eq!(test_host.gpu.frames.len(), renders);
}

#[test]
fn should_dispose_once() {
    let mut test_host = TestHost::new();
    let mut mount = mount(&mut test_host, ModelKind::GiftBox);
    mount.dispose(&mut test_host.host());
    let calls = test_host.gpu.calls.len();

    let reverted = mount.dispose(&mut test_host.host());

    assert!(reverted.is_empty());
    assert_eq!(test_host.gpu.calls.len(), calls);
}

#[test]
fn should_stay_blank_without_context() {
    let mut test_host = TestHost::new();
    let mut rng = StdRng::seed_from_u64(7);

    let mut mount = SurfaceMount::mount(
        SURFACE,
        ModelKind::Trophy,
        &EngineConfig::default(),
        SurfaceSize::new(800.0, 600.0),
        &mut test_host.host_without_gpu(),
        &mut rng,
    );

    assert!(!mount.is_live());
    assert!(mount.scene().is_none());
    assert_eq!(test_host.listeners.len(), 1);
    assert!(test_host.listeners.is_listening(SURFACE, ListenerKind::Scroll));
    assert_eq!(test_host.frames.pending(), 0);

    mount.on_pointer_enter();
    assert!(!mount.hover_flag().get());
    mount.on_resize(SurfaceSize::new(10.0, 10.0), &mut test_host.host());
    assert!(test_host.gpu.calls.is_empty());
    assert!(mount.dispose(&mut test_host.host()).is_empty());
    assert!(test_host.listeners.is_empty());
}

#[test]
fn should_keep_scroll_regions_and_particles_without_context() {
    let mut test_host = TestHost::new();
    let mut rng = StdRng::seed_from_u64(7);
    let mut mount = SurfaceMount::mount(
        SURFACE,
        ModelKind::BackgroundPlane,
        &EngineConfig::default(),
        SurfaceSize::new(800.0, 600.0),
        &mut test_host.host_without_gpu(),
        &mut rng,
    );
    assert!(!mount.is_live());
    assert_eq!(mount.particles().len(), 30);

    let timeline = Timeline::new().tween(
        Tween::new(".hero", StyleProperty::Opacity, 0.0, 1.0, 1.0).eased(Easing::Linear),
    );
    let region = mount
        .scroll()
        .register("hero", ScrollTrigger::at("top 70%").unwrap(), timeline);
    mount
        .scroll()
        .set_bounds(
            region,
            RegionBounds {
                top: 1000.0,
                height: 500.0,
            },
        )
        .unwrap();
    mount.scroll().on_scroll(400.0, 1000.0);
    assert!(mount.is_animating());

    for _ in 0..10 {
        mount.tick(0.5);
    }

    assert_relative_eq!(mount.scroll().progress(region).unwrap(), 1.0);
    assert!(!mount.is_animating());
    let mutations = mount.take_mutations();
    assert_eq!(mutations.len(), 2);
    assert_relative_eq!(mutations[1].value, 1.0);

    let reverted = mount.dispose(&mut test_host.host());
    assert_eq!(reverted.len(), 1);
    assert!(mount.particles().is_empty());
    assert!(test_host.listeners.is_empty());
}

#[test]
fn should_give_everything_back_when_strict_mount_fails() {
    let mut test_host = TestHost::new();
    let mut rng = StdRng::seed_from_u64(7);

    let result = SurfaceMount::try_mount(
        SURFACE,
        ModelKind::BackgroundPlane,
        &EngineConfig::default(),
        SurfaceSize::new(800.0, 600.0),
        &mut test_host.host_without_gpu(),
        &mut rng,
    );

    assert!(matches!(result, Err(EngineError::ContextUnavailable(_))));
    assert!(test_host.listeners.is_empty());
}

#[test]
fn should_release_partial_allocations_when_a_program_fails() {
    let mut test_host = TestHost::new();
    test_host.gpu.program_limit = Some(1);

    let mount = mount(&mut test_host, ModelKind::Globe);

    assert!(!mount.is_live());
    assert_eq!(test_host.gpu.created_programs(), 1);
    assert!(test_host.gpu.programs.is_empty());
    assert!(test_host.gpu.buffers.is_empty());
    assert_eq!(test_host.listeners.len(), 1);
    assert!(test_host.listeners.is_listening(SURFACE, ListenerKind::Scroll));
    assert_eq!(test_host.frames.pending(), 0);
}

#[test]
fn should_pulse_light_while_hovered() {
    let mut test_host = TestHost::new();
    let mut mount = mount(&mut test_host, ModelKind::Trophy);
    assert_eq!(test_host.listeners.listener_count(ListenerKind::PointerEnter), 1);
    assert_eq!(test_host.listeners.listener_count(ListenerKind::PointerLeave), 1);

    tick(&mut test_host, &mut mount, 1.0);
    let standard = mount.program(ProgramKind::Standard).unwrap();
    let idle = test_host.gpu.last_frame().unwrap().uniform_f32(standard, "intensity");
    assert_relative_eq!(idle.unwrap(), 2.0);

    mount.on_pointer_enter();
    tick(&mut test_host, &mut mount, 1.0);
    let standard = mount.program(ProgramKind::Standard).unwrap();
    let hovered = test_host.gpu.last_frame().unwrap().uniform_f32(standard, "intensity");
    assert_relative_eq!(hovered.unwrap(), 3.0 + 6.0f32.sin(), epsilon = 1e-4);

    mount.on_pointer_leave();
    assert!(!mount.hover_flag().get());
}

#[test]
fn should_follow_surface_resizes() {
    let mut test_host = TestHost::new();
    let mut mount = mount(&mut test_host, ModelKind::Globe);

    mount.on_resize(
        SurfaceSize::new(1024.0, 512.0).with_scale_factor(3.0),
        &mut test_host.host(),
    );
    tick(&mut test_host, &mut mount, 0.1);

    assert_eq!(test_host.gpu.resizes(), vec![(800, 600), (2048, 1024)]);
    assert_relative_eq!(mount.scene().unwrap().projection.aspect, 2.0);
    let globe = mount.program(ProgramKind::Globe).unwrap();
    let width = test_host.gpu.last_frame().unwrap().uniform_f32(globe, "resolution");
    assert_relative_eq!(width.unwrap(), 2048.0);
}

#[test]
fn should_drive_scroll_regions_from_the_frame_loop() {
    let mut test_host = TestHost::new();
    let mut mount = mount(&mut test_host, ModelKind::Globe);
    let timeline = Timeline::new().tween(
        Tween::new(".stats", StyleProperty::Opacity, 0.0, 1.0, 1.0).eased(Easing::Linear),
    );
    let region = mount
        .scroll()
        .register("stats", ScrollTrigger::at("top 70%").unwrap(), timeline);
    let fallback = mount.register_region("cta", Timeline::new());
    mount
        .scroll()
        .set_bounds(
            region,
            RegionBounds {
                top: 1000.0,
                height: 500.0,
            },
        )
        .unwrap();

    // the default "top 80%" region has no bounds yet and stays put
    mount.scroll().on_scroll(400.0, 1000.0);
    tick(&mut test_host, &mut mount, 0.5);
    assert_eq!(
        mount.scroll().state(fallback),
        Some(stage_ngin::scroll::RegionState::Before)
    );

    let mutations = mount.take_mutations();
    assert_eq!(mutations.len(), 1);
    assert_relative_eq!(mutations[0].value, 0.5, epsilon = 1e-5);
    assert!(mount.take_mutations().is_empty());

    let reverted = mount.dispose(&mut test_host.host());
    assert_eq!(reverted.len(), 1);
    assert_relative_eq!(reverted[0].value, 0.0);
    assert!(mount.scroll().is_empty());
}

#[test]
fn should_float_particles_and_parallax_behind_hero() {
    let mut test_host = TestHost::new();
    let mut mount = mount(&mut test_host, ModelKind::BackgroundPlane);

    assert_eq!(mount.particles().len(), 30);
    assert!(test_host.listeners.is_listening(SURFACE, ListenerKind::PointerMove));
    assert_eq!(mount.parallax(), Some([0.0, 0.0]));

    mount.on_pointer_move(1000.0, 0.0, (1000.0, 500.0));
    tick(&mut test_host, &mut mount, 2.0);

    let [x, y] = mount.parallax().unwrap();
    assert_relative_eq!(x, 10.0);
    assert_relative_eq!(y, -10.0);

    mount.dispose(&mut test_host.host());
    assert!(mount.particles().is_empty());
    assert!(test_host.listeners.is_empty());
}
