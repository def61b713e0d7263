use crate::prelude::*;

/// The vtk cell type ids used in the `types` array of a `<Cells>` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellType {
    Vertex = 1,
    PolyVertex = 2,
    Line = 3,
    Triangle = 5,
    Quad = 9,
    Tetra = 10,
    Hexahedron = 12,
}

impl CellType {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Vertex),
            2 => Some(Self::PolyVertex),
            3 => Some(Self::Line),
            5 => Some(Self::Triangle),
            9 => Some(Self::Quad),
            10 => Some(Self::Tetra),
            12 => Some(Self::Hexahedron),
            _ => None,
        }
    }
}

/// Cell connectivity in the layout of the vtk xml format: point ids of every cell back to
/// back in `connectivity`, and the end of each cell in `offsets`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cells {
    pub connectivity: Vec<i64>,
    pub offsets: Vec<i64>,
    pub types: Vec<CellType>,
}

impl Cells {
    pub fn new() -> Self {
        Self::default()
    }

    /// append a cell made of the given point ids
    pub fn push(&mut self, cell_type: CellType, point_ids: &[i64]) {
        self.connectivity.extend_from_slice(point_ids);
        self.offsets.push(self.connectivity.len() as i64);
        self.types.push(cell_type);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// the point ids of the `i`th cell
    ///
    /// `None` when the cell does not exist, or when `offsets` does not describe it
    pub fn cell(&self, i: usize) -> Option<(CellType, &[i64])> {
        let cell_type = *self.types.get(i)?;
        let start = match i.checked_sub(1) {
            Some(previous) => usize::try_from(*self.offsets.get(previous)?).ok()?,
            None => 0,
        };
        let end = usize::try_from(*self.offsets.get(i)?).ok()?;
        Some((cell_type, self.connectivity.get(start..end)?))
    }

    /// the `types` array as it is written to a file
    pub(crate) fn type_ids(&self) -> Vec<u8> {
        self.types.iter().map(|t| t.id()).collect()
    }
}
