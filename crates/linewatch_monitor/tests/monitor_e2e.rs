//! End-to-end monitor test: TOML config → sim backend → engine → I/O.
//!
//! Holds a SimHandle onto the backend before boxing it, so the test can
//! drive inputs and observe outputs while the engine owns the backend.

use linewatch_engine::EventKind;
use linewatch_hal::sim::SimBackend;
use linewatch_monitor::{MonitorConfig, build_engine};
use std::sync::{Arc, Mutex};

const CONFIG: &str = r#"
[mode]
type = "sim"

[runtime]
cycle_time_ms = 1

[lines.inputs]
button = 1

[lines.outputs]
led = 0

[edges]
button = "rising"
"#;

#[test]
fn button_press_reaches_the_handler_and_led_is_driven() {
    let config = MonitorConfig::from_toml(CONFIG).unwrap();
    let backend = SimBackend::new();
    let handle = backend.handle();
    let mut engine = build_engine(&config, Box::new(backend)).unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    engine
        .enable_handler(
            1,
            Box::new(move |ctx| sink.lock().unwrap().push((ctx.line, ctx.kind))),
            config.priority_of("button"),
        )
        .unwrap();

    // idle sweeps: nothing raised
    engine.run_cycles(3);
    assert!(events.lock().unwrap().is_empty());

    // press the button (no debounce configured: commits on the next sweep)
    handle.set_input(1, true);
    engine.run_cycles(2);
    {
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], (1, EventKind::Rising));
    }

    // release: falling edge is filtered by the rising-only subscription
    handle.set_input(1, false);
    engine.run_cycles(2);
    assert_eq!(events.lock().unwrap().len(), 1);

    // drive the LED through the engine and observe it on the sim side
    engine.write(0, true).unwrap();
    assert_eq!(handle.output(0), Some(true));
    engine.write(0, false).unwrap();
    assert_eq!(handle.output(0), Some(false));

    assert_eq!(engine.status().queue_overflows, 0);
    assert_eq!(engine.status().hardware_faults, 0);
}

#[test]
fn injected_fault_is_counted_not_fatal() {
    let config = MonitorConfig::from_toml(CONFIG).unwrap();
    let backend = SimBackend::new();
    let handle = backend.handle();
    let mut engine = build_engine(&config, Box::new(backend)).unwrap();

    handle.set_fault(1, true);
    engine.run_cycles(5);
    let status = engine.status();
    assert_eq!(status.cycle_count, 5);
    assert_eq!(status.hardware_faults, 5);
    // degraded sample reads low
    assert_eq!(engine.state(1), Ok(false));
}
