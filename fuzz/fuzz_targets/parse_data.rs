#![no_main]

use endpoint::{Endpoint, EndpointConfig, MetavoxelClient, MetavoxelSession, PeerId};
use libfuzzer_sys::fuzz_target;
use metavoxel::MetavoxelLod;

fuzz_target!(|data: &[u8]| {
    let config = EndpointConfig::for_testing();
    let mut client = Endpoint::new(
        PeerId::new(1),
        MetavoxelClient::new(MetavoxelLod::new([1.0, 2.0, 3.0], 0.5)),
        Vec::new(),
        config.clone(),
    );
    let mut server = Endpoint::new(PeerId::new(2), MetavoxelSession::default(), Vec::new(), config);

    // Split input into length-prefixed frames and feed both roles.
    let mut idx = 0usize;
    while idx < data.len() && idx < 4096 {
        let len = (data[idx] as usize % 200).saturating_add(1);
        idx += 1;
        let end = (idx + len).min(data.len());
        let frame = &data[idx..end];
        idx = end;

        let _ = client.parse_data(frame);
        let _ = server.parse_data(frame);
        let _ = client.update();
        let _ = server.update();

        // Baselines stay defined whatever arrives.
        assert!(!client.receive_records().is_empty());
        assert!(!server.send_records().is_empty());
    }
});
