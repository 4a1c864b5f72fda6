#![no_main]
use libfuzzer_sys::fuzz_target;
use npy_archive::ArrayHeader;

fuzz_target!(|data: &[u8]| {
    let from_slice = ArrayHeader::from_bytes(data);
    let from_stream = ArrayHeader::read_from(&mut &data[..]);

    // Both decoders must agree on success and header length
    match (from_slice, from_stream) {
        (Ok((a, len_a)), Ok((b, len_b))) => {
            assert_eq!(a, b);
            assert_eq!(len_a, len_b);
        }
        (Err(_), Err(_)) => {}
        (a, b) => panic!("decoders disagree: {:?} vs {:?}", a.is_ok(), b.is_ok()),
    }
});
