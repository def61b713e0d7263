//! The `parallel-vtk-writer` program: one single-point grid per worker, written as
//! per-piece files, a multi-piece dataset, or a multi-block dataset.

use crate::prelude::*;
use crate::{MultiBlockWriter, PUnstructuredGridWriter};

use log::info;
use std::path::{Path, PathBuf};

/// name of the summary written in [`Mode::Unstructured`], pieces are `Cells_{i}.vtu`
pub const UNSTRUCTURED_FILE: &str = "Cells.pvtu";
/// name of the summary written in [`Mode::MultiPiece`]
pub const MULTI_PIECE_FILE: &str = "multi-piece-data.pvtu";
/// name of the dataset written in [`Mode::MultiBlock`], the index gets a `.vtm` extension
pub const MULTI_BLOCK_FILE: &str = "multi-block-data";

/// The container layout the grids are written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// flat per-piece `.vtu` files plus a `.pvtu` summary
    #[default]
    Unstructured,
    /// a multi-piece dataset written as a `.pvtu` summary and its pieces
    MultiPiece,
    /// a multi-block dataset wrapping a multi-piece dataset, written as a `.vtm` index
    MultiBlock,
}

impl Mode {
    /// pick the mode from the command line argument. Only the first character is
    /// looked at, and anything unknown (or nothing at all) selects per-piece files
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg.and_then(|arg| arg.chars().next()) {
            Some('P') => Self::MultiPiece,
            Some('B') => Self::MultiBlock,
            _ => Self::Unstructured,
        }
    }
}

/// Everything the program needs to run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub mode: Mode,
    pub encoding: Encoding,
    /// directory all files are written to, created if missing
    pub output_dir: PathBuf,
    /// size of the worker pool, 0 for one worker per logical core
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            encoding: Encoding::default(),
            output_dir: PathBuf::from("."),
            threads: 0,
        }
    }
}

/// Build `n` grids. Grid `i` holds the single point `(0, 0, 10 i)` and a `diameter`
/// of `5 ((i % 5) + 1)`
pub fn build_grids(n: usize) -> Result<Vec<UnstructuredGrid>, Error> {
    (0..n)
        .map(|i| {
            let mut grid = UnstructuredGrid::new();

            let mut position = DataArray::new("position", 3);
            position.insert_next_tuple(&[0., 0., 10. * i as f64])?;
            grid.set_points(position)?;

            let mut diameter = DataArray::new("diameter", 1);
            diameter.insert_next_tuple(&[5. * ((i % 5) + 1) as f64])?;
            grid.add_point_array(diameter)?;

            Ok(grid)
        })
        .collect()
}

/// write every grid to `Cells_{i}.vtu` in parallel, and a `Cells.pvtu` summary
/// that references all of them
pub fn write_unstructured_grids(
    dir: &Path,
    grids: &[UnstructuredGrid],
    encoding: Encoding,
) -> Result<Vec<PathBuf>, Error> {
    info!("WriteUnstructuredGrids");

    let mut writer = PUnstructuredGridWriter::new(dir.join(UNSTRUCTURED_FILE));
    writer
        .set_number_of_pieces(grids.len())
        .set_encoding(encoding);
    writer.write(grids)
}

fn multi_piece(grids: Vec<UnstructuredGrid>) -> MultiPieceDataSet {
    let mut mp = MultiPieceDataSet::with_pieces(grids.len());
    for (i, grid) in grids.into_iter().enumerate() {
        mp.set_piece(i, grid);
    }
    mp
}

/// group the grids in a multi-piece dataset and write it as `multi-piece-data.pvtu`
pub fn write_multi_piece_data_set(
    dir: &Path,
    grids: Vec<UnstructuredGrid>,
    encoding: Encoding,
) -> Result<Vec<PathBuf>, Error> {
    info!("WriteMultiPieceDataSet");

    let n = grids.len();
    let mp = multi_piece(grids);

    let mut writer = PUnstructuredGridWriter::new(dir.join(MULTI_PIECE_FILE));
    writer.set_number_of_pieces(n).set_encoding(encoding);
    writer.write_multi_piece(&mp)
}

/// put a multi-piece dataset of the grids in block 0 of a multi-block dataset and
/// write it as `multi-block-data.vtm`
pub fn write_multi_block_data_set(
    dir: &Path,
    grids: Vec<UnstructuredGrid>,
    encoding: Encoding,
) -> Result<Vec<PathBuf>, Error> {
    info!("WriteMultiBlockDataSet");

    let mut mb = MultiBlockDataSet::new();
    mb.set_number_of_blocks(1);
    mb.set_block(0, multi_piece(grids));

    let mut writer = MultiBlockWriter::new(dir.join(MULTI_BLOCK_FILE));
    writer.set_encoding(encoding);
    writer.write(&mb)
}

/// Run the program: start the worker pool, build one grid per worker, and write them in
/// the configured layout. Returns the paths of every file written
pub fn run(config: &Config) -> Result<Vec<PathBuf>, Error> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;

    std::fs::create_dir_all(&config.output_dir)?;

    pool.install(|| {
        let workers = rayon::current_num_threads();
        info!("{workers} workers, {:?} encoding", config.encoding);

        let grids = build_grids(workers)?;
        let dir = config.output_dir.as_path();

        match config.mode {
            Mode::Unstructured => write_unstructured_grids(dir, &grids, config.encoding),
            Mode::MultiPiece => write_multi_piece_data_set(dir, grids, config.encoding),
            Mode::MultiBlock => write_multi_block_data_set(dir, grids, config.encoding),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_from_first_character() {
        assert_eq!(Mode::from_arg(None), Mode::Unstructured);
        assert_eq!(Mode::from_arg(Some("")), Mode::Unstructured);
        assert_eq!(Mode::from_arg(Some("U")), Mode::Unstructured);
        assert_eq!(Mode::from_arg(Some("P")), Mode::MultiPiece);
        assert_eq!(Mode::from_arg(Some("Pieces")), Mode::MultiPiece);
        assert_eq!(Mode::from_arg(Some("B")), Mode::MultiBlock);
        assert_eq!(Mode::from_arg(Some("b")), Mode::Unstructured);
        assert_eq!(Mode::from_arg(Some("X")), Mode::Unstructured);
    }

    #[test]
    fn one_point_per_grid() {
        let grids = build_grids(7).unwrap();
        assert_eq!(grids.len(), 7);

        for (i, grid) in grids.iter().enumerate() {
            assert_eq!(grid.number_of_points(), 1);
            assert_eq!(grid.number_of_cells(), 0);
            assert_eq!(
                grid.points().tuple(0).unwrap().to_vec(),
                vec![0., 0., 10. * i as f64]
            );
        }

        let diameters: Vec<f64> = grids
            .iter()
            .map(|grid| grid.point_array("diameter").unwrap()[[0, 0]])
            .collect();
        assert_eq!(diameters, vec![5., 10., 15., 20., 25., 5., 10.]);
    }

    #[test]
    fn no_workers_no_grids() {
        assert!(build_grids(0).unwrap().is_empty());
    }
}
