#![no_main]
use libfuzzer_sys::fuzz_target;
use npy_archive::{list_archive, load_archive, save_archive_member, SaveMode};

fuzz_target!(|data: &[u8]| {
    let dir = match tempfile::tempdir() {
        Ok(d) => d,
        Err(_) => return,
    };
    let path = dir.path().join("fuzz.npz");
    if std::fs::write(&path, data).is_err() {
        return;
    }

    // None of these may panic on arbitrary bytes
    let _ = load_archive(&path);
    let _ = list_archive(&path);
    if save_archive_member(&path, "extra", &[1u8, 2, 3], &[3], SaveMode::Append).is_ok() {
        let _ = load_archive(&path);
        let _ = list_archive(&path);
    }
});
