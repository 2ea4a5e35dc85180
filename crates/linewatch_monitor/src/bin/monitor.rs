use linewatch_monitor::{MonitorConfig, build_engine, create_backend};
use log::info;
use std::sync::atomic::AtomicBool;

fn usage() -> ! {
    eprintln!(
        "Usage: monitor <monitor.toml> [cycles]\n\
         \n\
         Examples:\n\
           cargo run -p linewatch_monitor --bin monitor -- config/monitor_sim.toml\n\
           cargo run -p linewatch_monitor --bin monitor -- config/monitor_sim.toml 500\n\
         \n\
         Notes:\n\
         - cycles overrides [runtime] max_cycles; 0 means sweep forever.\n\
         - Always forces configured outputs LOW on exit (best effort)."
    );
    std::process::exit(2)
}

fn parse_u64(s: &str, name: &str) -> u64 {
    s.parse::<u64>().unwrap_or_else(|_| {
        eprintln!("Invalid {name}: {s}");
        usage()
    })
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| usage());
    let cycles_override = args.next().map(|s| parse_u64(&s, "cycles"));

    let config = MonitorConfig::from_file(&config_path)
        .unwrap_or_else(|e| panic!("failed to load monitor config: {e}"));
    let backend = create_backend(&config).expect("failed to create I/O backend");
    let mut engine = build_engine(&config, backend).expect("failed to build engine");

    // log every validated event on the named inputs
    for (name, &id) in &config.lines.inputs {
        let line_name = name.clone();
        engine
            .enable_handler(
                id,
                Box::new(move |ctx| {
                    info!(
                        "{line_name} (line {}): {:?} at tick {}",
                        ctx.line, ctx.kind, ctx.tick
                    );
                }),
                config.priority_of(name),
            )
            .expect("configured line vanished from table");
    }

    let cycles = cycles_override.unwrap_or(config.runtime.max_cycles);
    if cycles == 0 {
        // no stop signal wired up; runs until the process is killed
        static STOP: AtomicBool = AtomicBool::new(false);
        engine.run_realtime(&STOP);
    } else {
        engine.run_cycles(cycles);
    }

    let status = engine.status();
    println!(
        "cycles: {}  hardware faults: {}  queue overflows: {}  dropped dispatches: {}",
        status.cycle_count,
        status.hardware_faults,
        status.queue_overflows,
        status.dropped_dispatches
    );
    for (name, &id) in &config.lines.inputs {
        if let Ok(s) = engine.slot_status(id) {
            println!(
                "{name}: state {}  bounces {}  pattern matches {}",
                s.state as u8, s.bounce_count, s.match_count
            );
        }
    }

    // Best-effort fail-safe.
    for &id in config.lines.outputs.values() {
        let _ = engine.write(id, false);
    }
    let _ = engine.hal.flush_outputs();
}
