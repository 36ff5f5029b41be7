//! Reference scenarios for commits, growth and size framing.

use crate::common::*;
use strata_journal::prelude::*;

#[test]
fn commit_with_two_record_types_roundtrips() {
    let mut codec = RecordCodec::new(ledger_registry());
    let mut buf = GrowableBuffer::new(64).unwrap();

    let info = TransactionCommitInfo::new(42, 1000)
        .with_commit(deposit(7, 250))
        .with_commit(memo("opening deposit"));
    codec.encode_commit_info(&mut buf, &info).unwrap();

    buf.flip();
    let decoded = codec.decode_commit_info(&mut buf).unwrap();

    assert_eq!(decoded.transaction_id, 42);
    assert_eq!(decoded.time, 1000);
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded.commit_as::<Deposit>(0), Some(&deposit(7, 250)));
    assert_eq!(decoded.commit_as::<Memo>(1), Some(&memo("opening deposit")));
}

#[test]
fn commit_header_layout() {
    let mut codec = RecordCodec::new(ledger_registry());
    let mut buf = GrowableBuffer::new(64).unwrap();
    codec
        .encode_commit(&mut buf, 42, 1000, &[Box::new(deposit(1, 1)) as AnyMessage])
        .unwrap();

    let bytes = buf.written();
    assert_eq!(&bytes[0..8], &42i64.to_be_bytes());
    assert_eq!(&bytes[8..16], &1000i64.to_be_bytes());
    assert_eq!(&bytes[16..20], &1i32.to_be_bytes());
    assert_eq!(&bytes[20..24], &(DEPOSIT_ID as i32).to_be_bytes());
    assert_eq!(&bytes[24..28], &16i32.to_be_bytes());
    assert_eq!(bytes.len(), strata_journal::limits::COMMIT_HEADER_LEN + 8 + 16);
}

#[test]
fn growth_from_sixteen_bytes() {
    let mut buf = GrowableBuffer::new(16).unwrap();
    let payload: Vec<u8> = (0..1000u32).map(|i| (i * 31 % 251) as u8).collect();

    buf.write_bytes(&payload).unwrap();
    assert_eq!(buf.capacity(), 1024);
    assert_eq!(buf.length(), 1000);

    buf.flip();
    assert_eq!(buf.read_bytes(1000).unwrap(), payload);
}

#[test]
fn second_write_size_without_mark_fails() {
    let mut buf = GrowableBuffer::new(16).unwrap();
    buf.mark_size().unwrap();
    buf.write_i64(5).unwrap();
    buf.write_size().unwrap();

    let err = buf.write_size().unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));

    buf.flip();
    assert_eq!(buf.read_i32().unwrap(), 8);
    assert_eq!(buf.read_i64().unwrap(), 5);
}

#[test]
fn snapshot_roundtrips_unframed() {
    let mut codec = RecordCodec::new(ledger_registry());
    let mut buf = GrowableBuffer::new(16).unwrap();
    let snapshot = LedgerSnapshot {
        as_of: 42,
        balances: (0..20).map(|a| (a, a as i64 * 100)).collect(),
    };

    codec.encode_snapshot(&mut buf, &snapshot).unwrap();
    // No type id or length in front of a snapshot.
    assert_eq!(&buf.written()[0..8], &42u64.to_le_bytes());

    buf.flip();
    let decoded: LedgerSnapshot = codec.decode_snapshot_as(&mut buf).unwrap();
    assert_eq!(decoded, snapshot);
}
