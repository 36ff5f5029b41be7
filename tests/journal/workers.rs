//! One codec per worker over a shared registry.

use crate::common::*;
use std::thread;
use strata_journal::prelude::*;

#[test]
fn workers_share_one_registry() {
    let registry = ledger_registry();
    let fingerprint = registry.fingerprint();

    let handles: Vec<_> = (0..4u64)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut codec = RecordCodec::new(registry);
                let mut buf = GrowableBuffer::new(32).unwrap();
                for txn in 0..25u64 {
                    let info = TransactionCommitInfo::new(worker * 1000 + txn, txn)
                        .with_commit(deposit(worker, txn as i64))
                        .with_commit(memo(&format!("w{}-t{}", worker, txn)));
                    codec.encode_commit_info(&mut buf, &info).unwrap();
                }
                buf.written().to_vec()
            })
        })
        .collect();

    let journals: Vec<Vec<u8>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(registry.fingerprint(), fingerprint);

    let mut codec = RecordCodec::new(registry);
    for (worker, journal) in journals.into_iter().enumerate() {
        let worker = worker as u64;
        let mut buf = GrowableBuffer::wrap(journal);
        for txn in 0..25u64 {
            let info = codec.decode_commit_info(&mut buf).unwrap();
            assert_eq!(info.transaction_id, worker * 1000 + txn);
            assert_eq!(info.commit_as::<Deposit>(0), Some(&deposit(worker, txn as i64)));
            assert_eq!(
                info.commit_as::<Memo>(1).map(|m| m.text.as_str()),
                Some(format!("w{}-t{}", worker, txn).as_str())
            );
        }
        assert!(!buf.is_available().unwrap());
    }
}

#[test]
fn codec_moves_between_threads() {
    let mut codec = RecordCodec::new(ledger_registry());
    let mut buf = GrowableBuffer::new(16).unwrap();
    codec.encode_record(&mut buf, &deposit(5, 50)).unwrap();

    let (codec, buf) = thread::spawn(move || {
        let mut codec = codec;
        let mut buf = buf;
        buf.flip();
        let decoded = codec.decode_record(&mut buf).unwrap();
        assert_eq!(decoded.downcast_ref::<Deposit>(), Some(&deposit(5, 50)));
        (codec, buf)
    })
    .join()
    .unwrap();

    assert_eq!(codec.serializer_type(), strata_journal::codec::SERIALIZER_TYPE);
    assert_eq!(buf.remaining(), 0);
}
