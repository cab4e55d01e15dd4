//! Fuzz test for discovery document parsing
//!
//! Arbitrary bytes fed to the client and server list parsers must produce
//! an error or records, never a panic. Parsed records then go through
//! ranking, which must skip whatever is malformed.

#![no_main]

use libfuzzer_sys::fuzz_target;
use netsonde_discovery::{Coordinates, parse_client, parse_servers, rank};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let origin = parse_client(s)
            .map(|client| client.origin)
            .unwrap_or(Coordinates::new(0.0, 0.0));

        if let Ok(records) = parse_servers(s) {
            let ranked = rank(origin, &records);
            assert!(ranked.len() <= records.len());
            assert!(ranked.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }
});
