//! Parallel writing of VTK XML unstructured grids.
//!
//! `pvtk` writes [`UnstructuredGrid`] pieces to `.vtu` files, groups pieces under a
//! `.pvtu` summary ([`PUnstructuredGridWriter`]) or a `.vtm` multi-block index
//! ([`MultiBlockWriter`]), and writes the pieces themselves from a rayon worker pool.
//! Every piece goes to its own file so the workers never share a writer.
//!
//! The [`demo`] module holds the program shipped as the `parallel-vtk-writer` binary:
//! one single-point grid per worker, written in one of three container layouts.

pub mod array;
pub mod data;
pub mod demo;
pub mod mesh;
pub mod multiblock;
pub mod parallel;
pub mod parse;
pub mod prelude;
mod traits;
mod utils;
mod write_vtk;

pub use traits::Array;
pub use traits::Numeric;
pub use traits::Precision;

pub use array::DataArray;
pub use data::{Block, MultiBlockDataSet, MultiPieceDataSet};
pub use mesh::{CellType, Cells, UnstructuredGrid};

pub use multiblock::MultiBlockWriter;
pub use parallel::{piece_file_name, write_pieces, write_pvtu, PUnstructuredGridWriter};
pub use write_vtk::{write_appended_dataarray_header, write_inline_dataarray, Encoding};
pub use write_vtk::{write_vtu, write_vtu_file};

pub use parse::read_vtu;
pub use parse::ParseError;

pub use ndarray;

pub use quick_xml::writer::Writer;

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Error while parsing VTK xml: {0}")]
    Parse(#[from] parse::ParseError),
    #[error("Could not write XML data to file: `{0}`")]
    XmlWrite(#[from] quick_xml::Error),
    #[error("Array shape is inconsistent: `{0}`")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Array `{name}` has {expected} components, got a tuple with {actual}")]
    ComponentMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("Point array `{name}` has {actual} tuples but the grid has {expected} points")]
    TupleCountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("Cell references point {id} but the grid only has {points} points")]
    PointIdOutOfRange { id: i64, points: usize },
    #[error("Writer expected {expected} pieces, got {actual}")]
    PieceCountMismatch { expected: usize, actual: usize },
    #[error("There are no pieces to write")]
    NoPieces,
    #[error("Piece {index} does not carry the same point arrays as piece 0")]
    InconsistentPieces { index: usize },
    #[error("Could not start the worker pool: `{0}`")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
