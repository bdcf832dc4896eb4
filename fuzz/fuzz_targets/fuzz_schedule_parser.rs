#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // The schedule record is read at boot from flash that may be corrupt in
    // arbitrary ways; parsing must reject garbage without panicking.
    let _ = irrigator_config::parse_schedule(data);
});
