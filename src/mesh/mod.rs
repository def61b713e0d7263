//! # Mesh Information
//!
//! An [`UnstructuredGrid`] is the unit that is written to a single `.vtu` file (a "piece").
//! It holds the point positions, any number of point data arrays, and the cells that
//! connect the points. A grid with no cells is valid: vtk will still read the points and
//! their data.
//!
//! Several grids are grouped into a larger dataset with the containers in
//! [data](`crate::data`), and written with [`PUnstructuredGridWriter`](crate::PUnstructuredGridWriter)
//! or [`MultiBlockWriter`](crate::MultiBlockWriter).

mod cells;
mod unstructured;

pub use cells::{CellType, Cells};
pub use unstructured::UnstructuredGrid;
