//! Record codec: typed messages in, framed records out.
//!
//! `RecordCodec` pairs the shared [`TypeRegistry`] with a per-worker
//! [`ZeroCopyAdapter`]. Framed operations (records, batches, commit infos)
//! backpatch lengths and bound payload reads with windows, so they need a
//! [`FramedBuffer`]. Snapshots are unframed and work on any [`Buffer`].
//!
//! A codec is `Send` but not `Sync`. Give each worker its own, built from a
//! clone of the same `Arc<TypeRegistry>`.

use crate::adapter::ZeroCopyAdapter;
use crate::codec::{AnyMessage, DynSchema, Message};
use crate::format::record::{read_count, write_count, RecordHeader};
use crate::format::TransactionCommitInfo;
use crate::registry::{TypeRegistry, SNAPSHOT_TYPE_ID};
use std::any::Any;
use std::sync::Arc;
use strata_buffer::{Buffer, FramedBuffer};
use strata_core::{Error, Result};
use tracing::{debug, trace};

/// Identifies this codec family; stored alongside journals it wrote.
pub const SERIALIZER_TYPE: u32 = 0x5354_524A;

/// Encoder/decoder for journal records.
#[derive(Debug)]
pub struct RecordCodec {
    registry: Arc<TypeRegistry>,
    adapter: ZeroCopyAdapter,
}

impl RecordCodec {
    /// Codec over a shared registry.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        RecordCodec {
            registry,
            adapter: ZeroCopyAdapter::new(),
        }
    }

    /// The registry this codec routes through.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Always [`SERIALIZER_TYPE`].
    pub fn serializer_type(&self) -> u32 {
        SERIALIZER_TYPE
    }

    /// Whether `T` can be encoded.
    pub fn is_registered<T: Any>(&self) -> bool {
        self.registry.is_registered::<T>()
    }

    /// Write one record: type id, backpatched length, payload.
    ///
    /// On any failure the partial record is rolled back and the buffer is
    /// left where the record started.
    pub fn encode_record<B: FramedBuffer>(
        &mut self,
        buffer: &mut B,
        message: &dyn Message,
    ) -> Result<()> {
        let entry = self.registry.resolve(message)?;
        let type_id = entry.id();
        let start = buffer.writer_position();

        let framed = write_framed(&mut self.adapter, buffer, type_id, entry.schema(), message);

        match framed {
            Ok(payload_start) => {
                trace!(
                    target: "strata::codec",
                    type_id,
                    len = buffer.writer_position() - payload_start,
                    "Encoded record"
                );
                Ok(())
            }
            Err(e) => {
                // Drop any outstanding placeholder before rewinding.
                if buffer.size_mark_position().is_some() {
                    let _ = buffer.write_size();
                }
                buffer.set_writer_position(start)?;
                Err(e)
            }
        }
    }

    /// Read one record.
    ///
    /// The payload is read inside a window of exactly its length; the schema
    /// must consume all of it. The window is closed before returning,
    /// whatever the outcome.
    pub fn decode_record<B: FramedBuffer>(&mut self, buffer: &mut B) -> Result<AnyMessage> {
        let header = RecordHeader::read_from(buffer)?;
        let entry = self
            .registry
            .get(header.type_id)
            .ok_or(Error::UnknownTypeId {
                type_id: header.type_id,
            })?;

        buffer.limit_next(header.length)?;
        let payload_start = buffer.reader_position();
        let decoded = {
            let mut input = self.adapter.input(buffer);
            entry.schema().merge_dyn(&mut input).and_then(|message| {
                if input.is_empty() {
                    Ok(message)
                } else {
                    Err(Error::Malformed(format!(
                        "schema {} left {} of {} payload bytes unread",
                        entry.name(),
                        input.remaining(),
                        header.length
                    )))
                }
            })
        };
        buffer.reset_next_limit()?;

        decoded.map_err(|source| Error::codec(header.type_id, payload_start, source))
    }

    /// Write a count followed by each record.
    pub fn encode_batch<B: FramedBuffer>(
        &mut self,
        buffer: &mut B,
        messages: &[AnyMessage],
    ) -> Result<()> {
        write_count(buffer, messages.len())?;
        for message in messages {
            self.encode_record(buffer, &**message)?;
        }
        Ok(())
    }

    /// Read a count followed by that many records.
    pub fn decode_batch<B: FramedBuffer>(&mut self, buffer: &mut B) -> Result<Vec<AnyMessage>> {
        let count = read_count(buffer)?;
        // A corrupt count must not drive a huge allocation.
        let mut messages = Vec::with_capacity(count.min(buffer.remaining() / RecordHeader::LEN));
        for _ in 0..count {
            messages.push(self.decode_record(buffer)?);
        }
        Ok(messages)
    }

    /// Write a commit envelope from its parts.
    pub fn encode_commit<B: FramedBuffer>(
        &mut self,
        buffer: &mut B,
        transaction_id: u64,
        time: u64,
        commits: &[AnyMessage],
    ) -> Result<()> {
        buffer.write_i64(transaction_id as i64)?;
        buffer.write_i64(time as i64)?;
        self.encode_batch(buffer, commits)?;
        debug!(
            target: "strata::codec",
            transaction_id,
            records = commits.len(),
            "Encoded commit"
        );
        Ok(())
    }

    /// Write a commit envelope.
    pub fn encode_commit_info<B: FramedBuffer>(
        &mut self,
        buffer: &mut B,
        info: &TransactionCommitInfo,
    ) -> Result<()> {
        self.encode_commit(buffer, info.transaction_id, info.time, &info.commits)
    }

    /// Read a commit envelope.
    pub fn decode_commit_info<B: FramedBuffer>(
        &mut self,
        buffer: &mut B,
    ) -> Result<TransactionCommitInfo> {
        let transaction_id = buffer.read_i64()? as u64;
        let time = buffer.read_i64()? as u64;
        let commits = self.decode_batch(buffer)?;
        debug!(
            target: "strata::codec",
            transaction_id,
            records = commits.len(),
            "Decoded commit"
        );
        Ok(TransactionCommitInfo {
            transaction_id,
            time,
            commits,
        })
    }

    /// Write the snapshot message with no framing.
    pub fn encode_snapshot(
        &mut self,
        buffer: &mut dyn Buffer,
        snapshot: &dyn Message,
    ) -> Result<()> {
        let schema = self
            .registry
            .snapshot_schema()
            .ok_or(Error::UnregisteredType {
                type_name: snapshot.type_name(),
            })?;
        let start = buffer.writer_position();
        let written = schema.write_dyn(&mut self.adapter.output(buffer), snapshot);
        written.map_err(|source| Error::codec(SNAPSHOT_TYPE_ID, start, source))?;
        debug!(
            target: "strata::codec",
            name = schema.name(),
            len = buffer.writer_position() - start,
            "Encoded snapshot"
        );
        Ok(())
    }

    /// Read the snapshot message.
    ///
    /// The schema reads until it is done; with no framing there is nothing
    /// to check it against.
    pub fn decode_snapshot(&mut self, buffer: &mut dyn Buffer) -> Result<AnyMessage> {
        let schema = self.registry.snapshot_schema().ok_or_else(|| {
            Error::InvalidState("no snapshot schema is registered".to_string())
        })?;
        let start = buffer.reader_position();
        let decoded = schema
            .merge_dyn(&mut self.adapter.input(buffer))
            .map_err(|source| Error::codec(SNAPSHOT_TYPE_ID, start, source))?;
        debug!(
            target: "strata::codec",
            name = schema.name(),
            len = buffer.reader_position().saturating_sub(start),
            "Decoded snapshot"
        );
        Ok(decoded)
    }

    /// Read the snapshot message as a `T`.
    pub fn decode_snapshot_as<T: Any>(&mut self, buffer: &mut dyn Buffer) -> Result<T> {
        let snapshot = self.decode_snapshot(buffer)?;
        let found = (*snapshot).type_name();
        snapshot
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| {
                Error::InvalidState(format!(
                    "snapshot is a {}, not a {}",
                    found,
                    std::any::type_name::<T>()
                ))
            })
    }
}

/// Type id, size placeholder, payload, backpatch. Returns the payload start.
fn write_framed<B: FramedBuffer>(
    adapter: &mut ZeroCopyAdapter,
    buffer: &mut B,
    type_id: u32,
    schema: &dyn DynSchema,
    message: &dyn Message,
) -> Result<usize> {
    buffer.write_i32(type_id as i32)?;
    buffer.mark_size()?;
    let payload_start = buffer.writer_position();
    schema
        .write_dyn(&mut adapter.output(buffer), message)
        .map_err(|source| Error::codec(type_id, payload_start, source))?;
    buffer.write_size()?;
    Ok(payload_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{Input, Output};
    use crate::codec::{BincodeSchema, FnSchema};
    use serde::{Deserialize, Serialize};
    use strata_buffer::{BufferConfig, GrowableBuffer, PooledBuffer};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Deposit {
        account: u64,
        amount: i64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Ledger {
        balances: Vec<(u64, i64)>,
    }

    /// Writes an i32 but claims to read an i16.
    struct Lossy;

    fn registry() -> Arc<TypeRegistry> {
        let mut registry = TypeRegistry::new();
        registry
            .register_with_id(0x10, BincodeSchema::<Deposit>::new("bank.Deposit"))
            .unwrap();
        registry
            .register_with_id(0x11, BincodeSchema::<Note>::new("bank.Note"))
            .unwrap();
        registry
            .register_with_id(
                0x12,
                FnSchema::new(
                    "test.Lossy",
                    |out: &mut Output<'_>, _: &Lossy| out.write_i32(1),
                    |input: &mut Input<'_>| input.read_i16().map(|_| Lossy),
                ),
            )
            .unwrap();
        registry
            .register_snapshot(BincodeSchema::<Ledger>::new("bank.Ledger"))
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn test_record_layout() {
        let mut codec = RecordCodec::new(registry());
        let mut buf = GrowableBuffer::new(4).unwrap();
        codec
            .encode_record(&mut buf, &Deposit { account: 1, amount: 2 })
            .unwrap();

        let bytes = buf.written();
        assert_eq!(&bytes[0..4], &[0, 0, 0, 0x10]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 16]);
        assert_eq!(bytes.len(), 8 + 16);
    }

    #[test]
    fn test_record_roundtrip() {
        let mut codec = RecordCodec::new(registry());
        let mut buf = GrowableBuffer::new(4).unwrap();
        let note = Note {
            text: "opening balance".into(),
        };
        codec.encode_record(&mut buf, &note).unwrap();
        buf.flip();

        let decoded = codec.decode_record(&mut buf).unwrap();
        assert_eq!(decoded.downcast_ref::<Note>(), Some(&note));
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_unregistered_type() {
        let mut codec = RecordCodec::new(registry());
        let mut buf = GrowableBuffer::new(16).unwrap();
        let err = codec.encode_record(&mut buf, &42u8).unwrap_err();
        assert!(matches!(err, Error::UnregisteredType { type_name: "u8" }));
        assert_eq!(buf.writer_position(), 0);
    }

    #[test]
    fn test_unknown_type_id() {
        let mut codec = RecordCodec::new(registry());
        let mut buf = GrowableBuffer::new(16).unwrap();
        buf.write_i32(0x99).unwrap();
        buf.write_i32(0).unwrap();
        buf.flip();
        let err = codec.decode_record(&mut buf).unwrap_err();
        assert!(matches!(err, Error::UnknownTypeId { type_id: 0x99 }));
    }

    #[test]
    fn test_trailing_payload_is_malformed() {
        let mut codec = RecordCodec::new(registry());
        let mut buf = GrowableBuffer::new(16).unwrap();
        codec.encode_record(&mut buf, &Lossy).unwrap();
        buf.write_i32(77).unwrap();
        buf.flip();

        let err = codec.decode_record(&mut buf).unwrap_err();
        match err {
            Error::CodecFailure {
                type_id, source, ..
            } => {
                assert_eq!(type_id, 0x12);
                assert!(matches!(*source, Error::Malformed(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Window closed: the bytes after the record are readable again.
        assert_eq!(buf.limit(), 16);
    }

    #[test]
    fn test_short_payload_is_codec_failure() {
        let mut codec = RecordCodec::new(registry());
        let mut buf = GrowableBuffer::new(16).unwrap();
        buf.write_i32(0x10).unwrap();
        buf.write_i32(3).unwrap();
        buf.write_bytes(&[1, 2, 3]).unwrap();
        buf.write_i32(5).unwrap();
        buf.flip();

        let err = codec.decode_record(&mut buf).unwrap_err();
        assert!(matches!(err, Error::CodecFailure { type_id: 0x10, position: 8, .. }));
        assert_eq!(buf.limit(), 15);
    }

    #[test]
    fn test_failed_encode_rolls_back() {
        let mut registry = TypeRegistry::new();
        registry
            .register_with_id(
                1,
                FnSchema::new(
                    "test.Failing",
                    |out: &mut Output<'_>, _: &u16| {
                        out.write_i64(0)?;
                        Err(Error::Malformed("refused".into()))
                    },
                    |input: &mut Input<'_>| input.read_i16().map(|v| v as u16),
                ),
            )
            .unwrap();
        registry
            .register_with_id(2, BincodeSchema::<Deposit>::new("bank.Deposit"))
            .unwrap();
        let mut codec = RecordCodec::new(Arc::new(registry));

        let mut buf = GrowableBuffer::new(64).unwrap();
        buf.write_i32(-1).unwrap();
        let err = codec.encode_record(&mut buf, &9u16).unwrap_err();
        assert!(matches!(err, Error::CodecFailure { type_id: 1, position: 12, .. }));
        assert_eq!(buf.writer_position(), 4);
        assert_eq!(buf.size_mark_position(), None);

        codec
            .encode_record(&mut buf, &Deposit { account: 3, amount: 4 })
            .unwrap();
        assert_eq!(buf.writer_position(), 4 + 8 + 16);
    }

    #[test]
    fn test_failed_header_rolls_back() {
        let mut codec = RecordCodec::new(registry());
        let config = BufferConfig::new()
            .with_initial_capacity(8)
            .with_max_capacity(8);
        let mut buf = GrowableBuffer::with_config(&config).unwrap();
        buf.write_i16(7).unwrap();

        // Type id fits, the size placeholder does not.
        let err = codec
            .encode_record(&mut buf, &Deposit { account: 1, amount: 2 })
            .unwrap_err();
        assert!(matches!(err, Error::GrowthFailure { max: 8, .. }));
        assert_eq!(buf.writer_position(), 2);
        assert_eq!(buf.size_mark_position(), None);
        assert_eq!(buf.written(), &[0, 7]);
    }

    #[test]
    fn test_batch_preserves_order() {
        let mut codec = RecordCodec::new(registry());
        let mut buf = GrowableBuffer::new(8).unwrap();
        let batch: Vec<AnyMessage> = vec![
            Box::new(Note { text: "a".into() }),
            Box::new(Deposit { account: 1, amount: -5 }),
            Box::new(Note { text: "b".into() }),
        ];
        codec.encode_batch(&mut buf, &batch).unwrap();
        buf.flip();

        let decoded = codec.decode_batch(&mut buf).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].downcast_ref::<Note>().unwrap().text, "a");
        assert_eq!(decoded[1].downcast_ref::<Deposit>().unwrap().amount, -5);
        assert_eq!(decoded[2].downcast_ref::<Note>().unwrap().text, "b");
    }

    #[test]
    fn test_empty_batch() {
        let mut codec = RecordCodec::new(registry());
        let mut buf = GrowableBuffer::new(8).unwrap();
        codec.encode_batch(&mut buf, &[]).unwrap();
        assert_eq!(buf.written(), &[0, 0, 0, 0]);
        buf.flip();
        assert!(codec.decode_batch(&mut buf).unwrap().is_empty());
    }

    #[test]
    fn test_negative_count_is_malformed() {
        let mut codec = RecordCodec::new(registry());
        let mut buf = GrowableBuffer::new(8).unwrap();
        buf.write_i32(-3).unwrap();
        buf.flip();
        assert!(matches!(codec.decode_batch(&mut buf), Err(Error::Malformed(_))));
    }

    #[test]
    fn test_commit_info_roundtrip() {
        let mut codec = RecordCodec::new(registry());
        let mut buf = GrowableBuffer::new(8).unwrap();
        let info = TransactionCommitInfo::new(u64::MAX, 1000)
            .with_commit(Deposit { account: 9, amount: 100 });
        codec.encode_commit_info(&mut buf, &info).unwrap();
        assert_eq!(&buf.written()[0..8], &[0xFF; 8]);
        buf.flip();

        let decoded = codec.decode_commit_info(&mut buf).unwrap();
        assert_eq!(decoded.transaction_id, u64::MAX);
        assert_eq!(decoded.time, 1000);
        assert_eq!(
            decoded.commit_as::<Deposit>(0),
            Some(&Deposit { account: 9, amount: 100 })
        );
    }

    #[test]
    fn test_snapshot_on_pooled_buffer() {
        let mut codec = RecordCodec::new(registry());
        let mut buf = PooledBuffer::with_capacity(8);
        let ledger = Ledger {
            balances: vec![(1, 10), (2, -20)],
        };
        codec.encode_snapshot(&mut buf, &ledger).unwrap();

        let decoded: Ledger = codec.decode_snapshot_as(&mut buf).unwrap();
        assert_eq!(decoded, ledger);
    }

    #[test]
    fn test_snapshot_wrong_type() {
        let mut codec = RecordCodec::new(registry());
        let mut buf = GrowableBuffer::new(8).unwrap();
        let err = codec
            .encode_snapshot(&mut buf, &Deposit { account: 1, amount: 1 })
            .unwrap_err();
        assert!(matches!(err, Error::CodecFailure { type_id: 0, .. }));

        codec
            .encode_snapshot(&mut buf, &Ledger { balances: vec![] })
            .unwrap();
        buf.flip();
        let err = codec.decode_snapshot_as::<Deposit>(&mut buf).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_snapshot_without_schema() {
        let mut codec = RecordCodec::new(Arc::new(TypeRegistry::new()));
        let mut buf = GrowableBuffer::new(8).unwrap();
        assert!(matches!(
            codec.encode_snapshot(&mut buf, &Ledger { balances: vec![] }),
            Err(Error::UnregisteredType { .. })
        ));
        assert!(matches!(
            codec.decode_snapshot(&mut buf),
            Err(Error::InvalidState(_))
        ));
    }
}
