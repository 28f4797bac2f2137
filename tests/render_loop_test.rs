use approx::assert_relative_eq;
use stage_ngin::{
    host::{FrameQueue, FrameScheduler},
    render_loop::{HoverFlag, RenderLoop},
};

use crate::common::test_utils::ManualClock;

mod common;

/// Delivers every due frame and counts the ones the loop wants drawn.
fn pump(render_loop: &mut RenderLoop, frames: &mut FrameQueue, clock: &ManualClock) -> usize {
    let mut drawn = 0;
    for request in frames.take_due() {
        if let Some(elapsed) = render_loop.on_frame(request, frames, clock) {
            render_loop.record_render(elapsed);
            drawn += 1;
        }
    }
    drawn
}

#[test]
fn should_request_a_frame_on_start() {
    let mut frames = FrameQueue::new();
    let clock = ManualClock::new();
    let mut render_loop = RenderLoop::new();

    render_loop.start(&mut frames, &clock);

    assert!(render_loop.is_running());
    assert_eq!(frames.pending(), 1);
    assert_eq!(render_loop.pending().map(|r| frames.is_pending(r)), Some(true));
}

#[test]
fn should_draw_once_per_frame_with_absolute_time() {
    let mut frames = FrameQueue::new();
    let clock = ManualClock::new();
    clock.advance(3.0);
    let mut render_loop = RenderLoop::new();
    render_loop.start(&mut frames, &clock);

    clock.advance(0.5);
    assert_eq!(pump(&mut render_loop, &mut frames, &clock), 1);
    clock.advance(1.0);
    assert_eq!(pump(&mut render_loop, &mut frames, &clock), 1);

    let stats = render_loop.stats();
    assert_eq!(stats.renders, 2);
    assert_relative_eq!(stats.last_elapsed.as_secs_f32(), 1.5, epsilon = 1e-4);
    // the next frame is already requested
    assert_eq!(frames.pending(), 1);
}

#[test]
fn should_not_render_after_stop() {
    let mut frames = FrameQueue::new();
    let clock = ManualClock::new();
    let mut render_loop = RenderLoop::new();
    render_loop.start(&mut frames, &clock);
    pump(&mut render_loop, &mut frames, &clock);
    let rendered = render_loop.stats().renders;

    render_loop.stop(&mut frames);

    assert_eq!(frames.pending(), 0);
    for _ in 0..5 {
        clock.advance(0.016);
        assert_eq!(pump(&mut render_loop, &mut frames, &clock), 0);
    }
    assert_eq!(render_loop.stats().renders, rendered);
    assert!(!render_loop.is_running());
}

#[test]
fn should_stop_idempotently() {
    let mut frames = FrameQueue::new();
    let mut render_loop = RenderLoop::new();

    // never started
    render_loop.stop(&mut frames);
    render_loop.start(&mut frames, &ManualClock::new());
    render_loop.stop(&mut frames);
    render_loop.stop(&mut frames);

    assert!(!render_loop.is_running());
    assert_eq!(frames.pending(), 0);
}

#[test]
fn should_ignore_second_start() {
    let mut frames = FrameQueue::new();
    let clock = ManualClock::new();
    let mut render_loop = RenderLoop::new();

    render_loop.start(&mut frames, &clock);
    clock.advance(1.0);
    render_loop.start(&mut frames, &clock);

    assert_eq!(frames.pending(), 1);
    pump(&mut render_loop, &mut frames, &clock);
    assert_relative_eq!(render_loop.stats().last_elapsed.as_secs_f32(), 1.0, epsilon = 1e-4);
}

#[test]
fn should_ignore_stale_requests() {
    let mut frames = FrameQueue::new();
    let clock = ManualClock::new();
    let mut render_loop = RenderLoop::new();
    render_loop.start(&mut frames, &clock);
    let foreign = frames.request_frame();

    let drawn = render_loop.on_frame(foreign, &mut frames, &clock);

    assert!(drawn.is_none());
    assert_eq!(render_loop.stats().renders, 0);
}

#[test]
fn should_share_hover_flag_between_clones() {
    let flag = HoverFlag::new();
    let reader = flag.clone();

    assert!(!reader.get());
    flag.set(true);
    assert!(reader.get());
}
