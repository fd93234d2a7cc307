//! Binary entry point for the Sable UCI engine.

extern crate sable_engine;

use sable_engine::consts;
use sable_engine::threads;
use sable_engine::uci::Uci;

fn main() {
    consts::init_globals();
    threads::set_num_threads(consts::DEFAULT_THREADS);

    println!("Sable 0.1.0 by The Sable Authors");

    let mut uci = Uci::new();

    // `sable bench [depth]` runs the benchmark and exits.
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("bench") {
        let depth = args.get(2).and_then(|d| d.parse::<i64>().ok()).unwrap_or(13);
        uci.handle_command(&format!("bench {}", depth));
        return;
    }

    uci.main_loop();
}
