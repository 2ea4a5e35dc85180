//! End-to-end sweep tests: sim backend + sim clock through the full
//! sample → debounce → pattern → dispatch pipeline.

use linewatch_engine::{
    EngineError, EventKind, LineMode, Pattern, ScanEngine,
};
use linewatch_hal::clock::SimClock;
use linewatch_hal::sim::{SimBackend, SimHandle};
use linewatch_hal::traits::{LineId, Tick};
use std::sync::{Arc, Mutex};

type Engine = ScanEngine<SimBackend, SimClock, 8>;
type EventLog = Arc<Mutex<Vec<(LineId, EventKind, Tick)>>>;

fn engine() -> (Engine, SimHandle, SimClock) {
    let hal = SimBackend::new();
    let handle = hal.handle();
    let clock = SimClock::new();
    let engine = ScanEngine::new(hal, clock.clone(), 10);
    (engine, handle, clock)
}

fn logging_handler(log: &EventLog) -> linewatch_engine::Handler {
    let sink = Arc::clone(log);
    Box::new(move |ctx| sink.lock().unwrap().push((ctx.line, ctx.kind, ctx.tick)))
}

#[test]
fn bounce_rejection_then_clean_edge_with_priority_ordering() {
    let (mut engine, handle, clock) = engine();
    engine.configure_line(2, LineMode::Input).unwrap();
    engine.set_debounce(2, 50).unwrap();
    engine.configure_line(1, LineMode::Input).unwrap();
    engine.set_debounce(1, 50).unwrap();

    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    // slot 2 outranks slot 1 despite the higher id
    engine.enable_handler(2, logging_handler(&log), 0).unwrap();
    engine.enable_handler(1, logging_handler(&log), 1).unwrap();

    // ten alternating samples, 10 ticks apart: all bounce, no edges
    for i in 1..=10u32 {
        handle.set_input(2, i % 2 == 1);
        clock.advance(10);
        engine.step();
    }
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(engine.slot_status(2).unwrap().bounce_count, 10);
    assert_eq!(engine.state(2), Ok(false));

    // settle well past the debounce interval
    clock.advance(60);
    engine.step();

    // both lines go high together and stay there
    handle.set_input(1, true);
    handle.set_input(2, true);
    for _ in 0..6 {
        clock.advance(10);
        engine.step();
    }

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    // one Rising each, slot 2 (priority 0) dispatched first
    assert_eq!(log[0].0, 2);
    assert_eq!(log[0].1, EventKind::Rising);
    assert_eq!(log[1].0, 1);
    assert_eq!(log[1].1, EventKind::Rising);
    // simultaneous commit: same tick on both
    assert_eq!(log[0].2, log[1].2);
    assert_eq!(engine.slot_status(2).unwrap().bounce_count, 10);
    assert_eq!(engine.status().queue_overflows, 0);
}

#[test]
fn pattern_match_raises_once_per_entry_into_match() {
    let (mut engine, handle, clock) = engine();
    engine.configure_line(0, LineMode::Input).unwrap();
    engine.set_pattern(0, Pattern::timed(0b0101, 500)).unwrap();

    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    engine.enable_handler(0, logging_handler(&log), 0).unwrap();

    // oldest-to-newest 0,1,0,1 leaves the window at 0b0101
    for sample in [false, true, false, true] {
        handle.set_input(0, sample);
        clock.advance(1);
        engine.step();
    }
    assert_eq!(engine.slot_status(0).unwrap().match_count, 1);

    // window slides off the pattern: no re-fire
    handle.set_input(0, true);
    clock.advance(1);
    engine.step();
    assert_eq!(engine.slot_status(0).unwrap().match_count, 1);

    // drive it back into the pattern for a second match
    for sample in [false, true, false, true] {
        handle.set_input(0, sample);
        clock.advance(1);
        engine.step();
    }
    assert_eq!(engine.slot_status(0).unwrap().match_count, 2);

    let pattern_events = log
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, kind, _)| *kind == EventKind::PatternMatched)
        .count();
    assert_eq!(pattern_events, 2);
}

#[test]
fn slow_sampling_misses_the_timing_window() {
    let (mut engine, handle, clock) = engine();
    engine.configure_line(0, LineMode::Input).unwrap();
    engine.set_pattern(0, Pattern::timed(0b0101, 500)).unwrap();

    // same bits, but 200 ticks apart: the match completes 600 ticks after
    // the first sample entered the window
    for sample in [false, true, false, true] {
        handle.set_input(0, sample);
        clock.advance(200);
        engine.step();
    }
    assert_eq!(engine.slot_status(0).unwrap().match_count, 0);
}

#[test]
fn composite_pattern_over_three_lines() {
    let (mut engine, handle, clock) = engine();
    for id in 0..3u8 {
        engine.configure_line(id, LineMode::Input).unwrap();
    }
    // line0 high, line1 low, line2 high
    engine
        .set_pattern(0, Pattern::composite(0b101, 0b0111))
        .unwrap();

    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    engine.enable_handler(0, logging_handler(&log), 0).unwrap();

    handle.set_input(0, true);
    handle.set_input(2, true);
    clock.advance(1);
    engine.step();

    assert_eq!(engine.slot_status(0).unwrap().match_count, 1);
    let log = log.lock().unwrap();
    assert!(
        log.iter()
            .any(|(line, kind, _)| *line == 0 && *kind == EventKind::PatternMatched)
    );
}

#[test]
fn unconfigured_lines_stay_invisible_to_queries() {
    let (engine, _handle, _clock) = engine();
    assert_eq!(engine.state(5), Err(EngineError::NotConfigured(5)));
    assert!(engine.events(5).is_err());
    assert!(engine.slot_status(5).is_err());
}
