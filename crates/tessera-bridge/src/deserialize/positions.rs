use tessera_ast::{Position, SourceLocation};
use tessera_heap::HeapView;

use super::fault::ProtocolFault;

/// Bytes per position record: start line, start column, end line, end column.
pub const POSITION_RECORD_SIZE: u32 = 16;

/// The position buffer, indexed by location index.
///
/// The declared count is authoritative: indices at or past it are rejected
/// before any memory is touched.
#[derive(Debug, Clone, Copy)]
pub struct PositionTable<'h> {
    heap: HeapView<'h>,
    base: u32,
    count: u32,
}

impl<'h> PositionTable<'h> {
    pub fn new(heap: HeapView<'h>, base: u32, count: u32) -> Result<Self, ProtocolFault> {
        heap.check_aligned("position buffer", base, 4)?;
        heap.bytes(base, count as usize * POSITION_RECORD_SIZE as usize)?;
        Ok(Self { heap, base, count })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn get(&self, index: u32) -> Result<SourceLocation, ProtocolFault> {
        if index >= self.count {
            return Err(ProtocolFault::PositionOutOfBounds {
                index,
                count: self.count,
            });
        }
        let addr = index
            .checked_mul(POSITION_RECORD_SIZE)
            .and_then(|offset| self.base.checked_add(offset))
            .ok_or(ProtocolFault::PositionOutOfBounds {
                index,
                count: self.count,
            })?;
        let [start_line, start_column, end_line, end_column] = self.heap.read_words::<4>(addr)?;
        let loc = SourceLocation::new(
            Position::new(start_line, start_column),
            Position::new(end_line, end_column),
        );
        if start_line == 0 || end_line == 0 || !loc.is_ordered() {
            return Err(ProtocolFault::InvalidPosition {
                index,
                start_line,
                start_column,
                end_line,
                end_column,
            });
        }
        Ok(loc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(words: &[[u32; 4]]) -> Vec<u8> {
        words.iter().flatten().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn reads_records_by_index() {
        let bytes = records(&[[1, 0, 1, 5], [1, 4, 1, 5]]);
        let table = PositionTable::new(HeapView::new(&bytes), 0, 2).unwrap();
        let second = table.get(1).unwrap();
        assert_eq!(second.start, Position::new(1, 4));
        assert_eq!(second.end, Position::new(1, 5));
    }

    #[test]
    fn index_at_count_is_rejected_even_if_memory_follows() {
        let bytes = records(&[[1, 0, 1, 1], [1, 0, 1, 1]]);
        let table = PositionTable::new(HeapView::new(&bytes), 0, 1).unwrap();
        assert_eq!(
            table.get(1),
            Err(ProtocolFault::PositionOutOfBounds { index: 1, count: 1 })
        );
    }

    #[test]
    fn declared_count_must_fit_in_the_heap() {
        let bytes = records(&[[1, 0, 1, 1]]);
        assert!(matches!(
            PositionTable::new(HeapView::new(&bytes), 0, 2),
            Err(ProtocolFault::Heap(_))
        ));
        assert!(matches!(
            PositionTable::new(HeapView::new(&bytes), 2, 0),
            Err(ProtocolFault::Heap(_))
        ));
    }

    #[test]
    fn reversed_or_zero_line_records_are_invalid() {
        let bytes = records(&[[2, 0, 1, 0], [0, 0, 0, 1]]);
        let table = PositionTable::new(HeapView::new(&bytes), 0, 2).unwrap();
        assert!(matches!(table.get(0), Err(ProtocolFault::InvalidPosition { index: 0, .. })));
        assert!(matches!(table.get(1), Err(ProtocolFault::InvalidPosition { index: 1, .. })));
    }
}
