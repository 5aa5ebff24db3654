#![allow(clippy::pedantic)]
mod common;

use std::fs;

use common::{BlobBuilder, literal_tile};
use lerc1::decode;
use lerc1::logger::set_log_file;

#[test]
fn record_size_mismatch_is_logged_not_fatal() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("logs").join("lerc1.log");
    set_log_file(&path).expect("log file");

    let blob = BlobBuilder::new(1, 2)
        .declared_bytes(3)
        .tile(literal_tile(&[1.0, 2.0]))
        .build();
    let decoded = decode(&blob).expect("mismatch is not an error");
    assert_eq!(decoded.grid.values(), &[1.0, 2.0]);

    let clean = BlobBuilder::new(1, 1).tile(literal_tile(&[1.0])).build();
    decode(&clean).expect("clean blob decodes");

    let log = fs::read_to_string(&path).expect("read log");
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 1, "only the mismatch is logged: {log}");
    assert_eq!(
        lines[0],
        "warning: lerc1 blob at offset 0: tile stream used 9 bytes, data record declares 3"
    );
}
