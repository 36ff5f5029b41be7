//! Both buffer backends behind the same codec.

use crate::common::*;
use strata_journal::prelude::*;

#[test]
fn pooled_snapshot_reads_back_on_growable() {
    let mut codec = RecordCodec::new(ledger_registry());
    let pool = BufferPool::new(&BufferConfig::for_testing()).unwrap();
    let snapshot = LedgerSnapshot {
        as_of: 7,
        balances: vec![(1, -3), (2, 99)],
    };

    let mut pooled = pool.acquire(32);
    codec.encode_snapshot(&mut pooled, &snapshot).unwrap();
    let bytes = pooled.written().to_vec();
    pooled.release();
    assert_eq!(pool.free_regions(), 1);

    let mut growable = GrowableBuffer::wrap(bytes);
    let decoded: LedgerSnapshot = codec.decode_snapshot_as(&mut growable).unwrap();
    assert_eq!(decoded, snapshot);
}

#[test]
fn growable_commit_copies_into_pooled() {
    let mut codec = RecordCodec::new(ledger_registry());
    let mut growable = GrowableBuffer::new(16).unwrap();
    let info = TransactionCommitInfo::new(1, 2).with_commit(memo("copied"));
    codec.encode_commit_info(&mut growable, &info).unwrap();
    growable.flip();

    let mut pooled = PooledBuffer::with_capacity(8);
    pooled.write_from_buffer(&mut growable).unwrap();
    assert_eq!(growable.remaining(), 0);

    // Framed decoding needs a framed buffer; hand the bytes back to one.
    let mut reader = GrowableBuffer::wrap(pooled.read_remaining().unwrap());
    let decoded = codec.decode_commit_info(&mut reader).unwrap();
    assert_eq!(decoded.commit_as::<Memo>(0), Some(&memo("copied")));
}

#[test]
fn pooled_buffer_ignores_size_framing() {
    let mut pooled = PooledBuffer::with_capacity(8);
    pooled.mark_size().unwrap();
    pooled.write_i32(3).unwrap();
    pooled.write_size().unwrap();

    assert_eq!(pooled.size_mark_position(), None);
    assert_eq!(pooled.written(), &3i32.to_be_bytes());
    assert!(matches!(
        pooled.limit_next(4),
        Err(Error::UnsupportedCapability { .. })
    ));
}

#[test]
fn configured_growable_respects_max_capacity() {
    let config = BufferConfig::for_testing()
        .with_initial_capacity(16)
        .with_max_capacity(64);
    let mut codec = RecordCodec::new(ledger_registry());
    let mut buf = GrowableBuffer::with_config(&config).unwrap();

    let big = Memo {
        author: "x".repeat(40),
        text: "y".repeat(40),
        tags: Vec::new(),
    };
    let err = codec.encode_record(&mut buf, &big).unwrap_err();
    match err {
        Error::CodecFailure { source, .. } => {
            assert!(matches!(*source, Error::GrowthFailure { max: 64, .. }))
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(buf.writer_position(), 0);

    codec.encode_record(&mut buf, &deposit(1, 1)).unwrap();
}
