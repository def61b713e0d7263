//! Common traits and types that are useful for working with `pvtk`
#![allow(unused_imports)]

pub use crate::array::DataArray;
pub use crate::data::{Block, MultiBlockDataSet, MultiPieceDataSet};
pub use crate::mesh::{CellType, Cells, UnstructuredGrid};
pub use crate::traits::{Array, Numeric, Precision};
pub use crate::write_vtk::Encoding;
pub use crate::Writer;

pub(crate) use crate::Error;
pub(crate) use std::io::Write;

pub(crate) use crate::{traits, write_vtk};

pub(crate) use derive_more::{Constructor, Display, From};

pub(crate) use ndarray::{Array2, ArrayView1};

pub(crate) use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
