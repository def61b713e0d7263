//! Composite datasets: collections of grids that are written as one logical dataset.
//!
//! A [`MultiPieceDataSet`] holds the pieces of a single partitioned dataset, usually one per
//! worker. A [`MultiBlockDataSet`] is a tree of blocks, where each block is a grid, a
//! multi-piece dataset, or another multi-block dataset. Slots can be left empty, in which
//! case they keep their index in the written file but carry no data.

use crate::prelude::*;

#[derive(Debug, Clone, Default, PartialEq)]
/// The pieces of one partitioned dataset
pub struct MultiPieceDataSet {
    pieces: Vec<Option<UnstructuredGrid>>,
}

impl MultiPieceDataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// a dataset with `n` empty piece slots
    pub fn with_pieces(n: usize) -> Self {
        let mut data = Self::new();
        data.set_number_of_pieces(n);
        data
    }

    /// grow or shrink the number of piece slots. New slots are empty
    pub fn set_number_of_pieces(&mut self, n: usize) {
        self.pieces.resize(n, None);
    }

    /// put a grid in slot `index`, growing the slot list when needed
    pub fn set_piece(&mut self, index: usize, grid: UnstructuredGrid) {
        if index >= self.pieces.len() {
            self.set_number_of_pieces(index + 1);
        }
        self.pieces[index] = Some(grid);
    }

    pub fn piece(&self, index: usize) -> Option<&UnstructuredGrid> {
        self.pieces.get(index).and_then(Option::as_ref)
    }

    pub fn number_of_pieces(&self) -> usize {
        self.pieces.len()
    }

    /// every slot, in order, including empty ones
    pub fn pieces(&self) -> &[Option<UnstructuredGrid>] {
        &self.pieces
    }
}

impl FromIterator<UnstructuredGrid> for MultiPieceDataSet {
    fn from_iter<I: IntoIterator<Item = UnstructuredGrid>>(iter: I) -> Self {
        Self {
            pieces: iter.into_iter().map(Some).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, From)]
/// A single entry of a [`MultiBlockDataSet`]
pub enum Block {
    Grid(UnstructuredGrid),
    MultiPiece(MultiPieceDataSet),
    MultiBlock(MultiBlockDataSet),
}

#[derive(Debug, Clone, Default, PartialEq)]
struct BlockSlot {
    name: Option<String>,
    block: Option<Block>,
}

#[derive(Debug, Clone, Default, PartialEq)]
/// An ordered, optionally named, list of blocks
pub struct MultiBlockDataSet {
    blocks: Vec<BlockSlot>,
}

impl MultiBlockDataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// grow or shrink the number of block slots. New slots are empty
    pub fn set_number_of_blocks(&mut self, n: usize) {
        self.blocks.resize(n, BlockSlot::default());
    }

    /// put a block in slot `index`, growing the slot list when needed
    pub fn set_block<B: Into<Block>>(&mut self, index: usize, block: B) {
        self.ensure_slot(index);
        self.blocks[index].block = Some(block.into());
    }

    pub fn set_block_name<T: Into<String>>(&mut self, index: usize, name: T) {
        self.ensure_slot(index);
        self.blocks[index].name = Some(name.into());
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index).and_then(|slot| slot.block.as_ref())
    }

    pub fn block_name(&self, index: usize) -> Option<&str> {
        self.blocks.get(index).and_then(|slot| slot.name.as_deref())
    }

    pub fn number_of_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// every slot in order as `(index, name, block)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&str>, Option<&Block>)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, slot)| (i, slot.name.as_deref(), slot.block.as_ref()))
    }

    fn ensure_slot(&mut self, index: usize) {
        if index >= self.blocks.len() {
            self.set_number_of_blocks(index + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pieces_grow_on_demand() {
        let mut mp = MultiPieceDataSet::with_pieces(2);
        assert_eq!(mp.number_of_pieces(), 2);
        assert!(mp.piece(0).is_none());

        mp.set_piece(3, UnstructuredGrid::new());
        assert_eq!(mp.number_of_pieces(), 4);
        assert!(mp.piece(3).is_some());
        assert!(mp.piece(2).is_none());

        mp.set_number_of_pieces(1);
        assert_eq!(mp.pieces().len(), 1);
    }

    #[test]
    fn blocks_keep_names_and_gaps() {
        let mut mb = MultiBlockDataSet::new();
        mb.set_number_of_blocks(1);
        mb.set_block(0, MultiPieceDataSet::with_pieces(3));
        mb.set_block_name(2, "late");

        assert_eq!(mb.number_of_blocks(), 3);
        assert!(matches!(mb.block(0), Some(Block::MultiPiece(_))));
        assert!(mb.block(1).is_none());
        assert_eq!(mb.block_name(2), Some("late"));

        let names: Vec<_> = mb.iter().map(|(i, name, _)| (i, name)).collect();
        assert_eq!(names, vec![(0, None), (1, None), (2, Some("late"))]);
    }

    #[test]
    fn collect_pieces() {
        let mp: MultiPieceDataSet = (0..3).map(|_| UnstructuredGrid::new()).collect();
        assert_eq!(mp.number_of_pieces(), 3);
        assert!(mp.pieces().iter().all(Option::is_some));
    }
}
