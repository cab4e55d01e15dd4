//! Fuzz test for upload endpoint host extraction

#![no_main]

use libfuzzer_sys::fuzz_target;
use netsonde_core::SelectedServer;
use netsonde_discovery::upload_host;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some(host) = upload_host(s) {
            assert!(!host.is_empty());
            // Hosts feed straight into request URLs
            let server = SelectedServer::new(host, 0.0);
            let _ = server.host_without_port();
            assert!(server.base_url().starts_with("http://"));
        }
    }
});
