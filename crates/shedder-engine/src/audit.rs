//! Append-only record of applied actions.

use std::sync::Arc;

use shedder_cards::Card;
use shedder_protocol::{ActionKind, PlayerId};

/// Entries per sealed chunk.
const CHUNK_LEN: usize = 64;

/// One applied action, in the order it was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// 1-based, contiguous.
    pub seq: u64,
    pub player_id: PlayerId,
    pub kind: ActionKind,
    pub card: Option<Card>,
}

/// The audit log of a session.
///
/// Full chunks are frozen behind `Arc`s and shared between a session and
/// every snapshot taken of it, so cloning copies at most one partial
/// chunk no matter how long the game runs.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    sealed: Arc<Vec<Arc<[AuditEntry]>>>,
    tail: Vec<AuditEntry>,
    len: usize,
}

impl AuditLog {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entry at `index`, oldest first.
    pub fn get(&self, index: usize) -> Option<&AuditEntry> {
        let sealed_len = self.sealed.len() * CHUNK_LEN;
        if index < sealed_len {
            Some(&self.sealed[index / CHUNK_LEN][index % CHUNK_LEN])
        } else {
            self.tail.get(index - sealed_len)
        }
    }

    pub fn last(&self) -> Option<&AuditEntry> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &AuditEntry> {
        self.sealed
            .iter()
            .flat_map(|chunk| chunk.iter())
            .chain(self.tail.iter())
    }

    pub(crate) fn push(&mut self, entry: AuditEntry) {
        self.tail.push(entry);
        self.len += 1;
        if self.tail.len() == CHUNK_LEN {
            let chunk: Arc<[AuditEntry]> = std::mem::take(&mut self.tail).into();
            // Copies only the chunk pointers, and only when a snapshot
            // still shares them.
            Arc::make_mut(&mut self.sealed).push(chunk);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(seq: u64) -> AuditEntry {
        AuditEntry {
            seq,
            player_id: PlayerId::new("a"),
            kind: ActionKind::DrawCard,
            card: None,
        }
    }

    fn log_of(n: u64) -> AuditLog {
        let mut log = AuditLog::default();
        for seq in 1..=n {
            log.push(entry(seq));
        }
        log
    }

    #[test]
    fn test_iter_spans_sealed_chunks_in_order() {
        let log = log_of(3 * CHUNK_LEN as u64 + 5);
        let seqs: Vec<u64> = log.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, (1..=3 * CHUNK_LEN as u64 + 5).collect::<Vec<_>>());
        assert_eq!(log.len(), 3 * CHUNK_LEN + 5);
    }

    #[test]
    fn test_get_and_last_across_chunk_boundary() {
        let log = log_of(CHUNK_LEN as u64 + 1);
        assert_eq!(log.get(0).unwrap().seq, 1);
        assert_eq!(log.get(CHUNK_LEN - 1).unwrap().seq, CHUNK_LEN as u64);
        assert_eq!(log.get(CHUNK_LEN).unwrap().seq, CHUNK_LEN as u64 + 1);
        assert!(log.get(CHUNK_LEN + 1).is_none());
        assert_eq!(log.last().unwrap().seq, CHUNK_LEN as u64 + 1);
        assert!(AuditLog::default().last().is_none());
    }

    #[test]
    fn test_clone_shares_sealed_chunks() {
        let log = log_of(2 * CHUNK_LEN as u64 + 3);
        let snapshot = log.clone();
        assert!(Arc::ptr_eq(&log.sealed, &snapshot.sealed));
        assert_eq!(snapshot.tail.len(), 3);
    }

    #[test]
    fn test_push_after_clone_leaves_snapshot_untouched() {
        let mut log = log_of(CHUNK_LEN as u64 - 1);
        let snapshot = log.clone();
        log.push(entry(CHUNK_LEN as u64));
        log.push(entry(CHUNK_LEN as u64 + 1));

        assert_eq!(snapshot.len(), CHUNK_LEN - 1);
        assert_eq!(snapshot.iter().count(), CHUNK_LEN - 1);
        assert_eq!(log.len(), CHUNK_LEN + 1);
        // The chunk sealed after the clone is not visible to it.
        assert!(snapshot.sealed.is_empty());
        assert_eq!(log.sealed.len(), 1);
    }
}
