//! Writing of [`MultiBlockDataSet`]s as a `.vtm` index plus a directory of `.vtu` pieces.
//!
//! For a writer created with the file name `out/result` the layout on disk is:
//!
//! ```text
//! out/result.vtm
//! out/result/result_0.vtu        <- a grid block
//! out/result/result_1_0.vtu      <- piece 0 of a multi-piece block
//! out/result/result_1_1.vtu      <- piece 1 of a multi-piece block
//! ```
//!
//! The number after the name counts the leaves (grids and multi-piece datasets) of the
//! block tree in document order.

use crate::parallel::write_pieces;
use crate::prelude::*;
use crate::write_vtk::start_vtk_file;

use log::info;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Writes a multi-block dataset: all pieces in parallel, then the `.vtm` index
#[derive(Debug, Clone)]
pub struct MultiBlockWriter {
    file_name: PathBuf,
    encoding: Encoding,
}

/// a leaf grid found while walking the block tree
struct Leaf<'a> {
    /// path relative to the directory of the `.vtm`, as written to the `file` attribute
    source: String,
    grid: &'a UnstructuredGrid,
}

impl MultiBlockWriter {
    /// `file_name` may be given with or without the `.vtm` extension
    pub fn new<P: Into<PathBuf>>(file_name: P) -> Self {
        Self {
            file_name: file_name.into(),
            encoding: Encoding::default(),
        }
    }

    pub fn set_encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    /// the path of the `.vtm` index
    pub fn vtm_path(&self) -> PathBuf {
        match self.file_name.extension() {
            Some(ext) if ext == "vtm" => self.file_name.clone(),
            _ => {
                let mut path = OsString::from(self.file_name.as_os_str());
                path.push(".vtm");
                PathBuf::from(path)
            }
        }
    }

    /// write every piece, then the index. Returns the paths of every file written
    pub fn write(&self, data: &MultiBlockDataSet) -> Result<Vec<PathBuf>, Error> {
        let vtm_path = self.vtm_path();
        let stem = vtm_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("data"));
        let dir = vtm_path.parent().unwrap_or_else(|| Path::new(""));

        let mut index = Vec::new();
        let leaves = write_vtm(&mut index, data, &stem)?;

        let jobs: Vec<(PathBuf, &UnstructuredGrid)> = leaves
            .iter()
            .map(|leaf| (dir.join(&leaf.source), leaf.grid))
            .collect();

        if !jobs.is_empty() {
            std::fs::create_dir_all(dir.join(&stem))?;
        }
        write_pieces(&jobs, self.encoding)?;

        info!("Write {}", vtm_path.display());
        std::fs::write(&vtm_path, index)?;

        let mut written: Vec<PathBuf> = jobs.into_iter().map(|(path, _)| path).collect();
        written.push(vtm_path);
        Ok(written)
    }
}

/// Write the `vtkMultiBlockDataSet` index for `data`, with pieces named after `stem`.
/// Returns the grids that the index refers to, in document order
fn write_vtm<'a, W: Write>(
    writer: W,
    data: &'a MultiBlockDataSet,
    stem: &str,
) -> Result<Vec<Leaf<'a>>, Error> {
    let mut writer = Writer::new_with_indent(writer, b' ', 2);

    start_vtk_file(&mut writer, "vtkMultiBlockDataSet")?;
    writer.write_event(Event::Start(BytesStart::new("vtkMultiBlockDataSet")))?;

    let mut leaves = Vec::new();
    let mut leaf_count = 0;
    write_blocks(&mut writer, data, stem, &mut leaf_count, &mut leaves)?;

    writer.write_event(Event::End(BytesEnd::new("vtkMultiBlockDataSet")))?;
    writer.write_event(Event::End(BytesEnd::new("VTKFile")))?;

    Ok(leaves)
}

fn write_blocks<'a, W: Write>(
    writer: &mut Writer<W>,
    data: &'a MultiBlockDataSet,
    stem: &str,
    leaf_count: &mut usize,
    leaves: &mut Vec<Leaf<'a>>,
) -> Result<(), Error> {
    for (index, name, block) in data.iter() {
        let index = index.to_string();
        let mut attributes = vec![("index", index.as_str())];
        if let Some(name) = name {
            attributes.push(("name", name));
        }

        match block {
            None => {
                writer.write_event(Event::Empty(
                    BytesStart::new("DataSet").with_attributes(attributes),
                ))?;
            }
            Some(Block::Grid(grid)) => {
                let source = format!("{stem}/{stem}_{leaf_count}.vtu");
                *leaf_count += 1;

                attributes.push(("file", source.as_str()));
                writer.write_event(Event::Empty(
                    BytesStart::new("DataSet").with_attributes(attributes),
                ))?;

                leaves.push(Leaf { source, grid });
            }
            Some(Block::MultiPiece(pieces)) => {
                writer.write_event(Event::Start(
                    BytesStart::new("Piece").with_attributes(attributes),
                ))?;

                for (piece, grid) in pieces.pieces().iter().enumerate() {
                    let piece_index = piece.to_string();
                    let mut dataset = BytesStart::new("DataSet")
                        .with_attributes([("index", piece_index.as_str())]);

                    let source = grid
                        .as_ref()
                        .map(|_| format!("{stem}/{stem}_{leaf_count}_{piece}.vtu"));
                    if let Some(source) = &source {
                        dataset.push_attribute(("file", source.as_str()));
                    }
                    writer.write_event(Event::Empty(dataset))?;

                    if let (Some(source), Some(grid)) = (source, grid) {
                        leaves.push(Leaf { source, grid });
                    }
                }
                *leaf_count += 1;

                writer.write_event(Event::End(BytesEnd::new("Piece")))?;
            }
            Some(Block::MultiBlock(inner)) => {
                writer.write_event(Event::Start(
                    BytesStart::new("Block").with_attributes(attributes),
                ))?;
                write_blocks(writer, inner, stem, leaf_count, leaves)?;
                writer.write_event(Event::End(BytesEnd::new("Block")))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> MultiBlockDataSet {
        let mut inner = MultiBlockDataSet::new();
        inner.set_block(0, UnstructuredGrid::new());

        let mut pieces = MultiPieceDataSet::with_pieces(3);
        pieces.set_piece(0, UnstructuredGrid::new());
        pieces.set_piece(2, UnstructuredGrid::new());

        let mut mb = MultiBlockDataSet::new();
        mb.set_block(0, pieces);
        mb.set_block_name(0, "particles");
        mb.set_block(1, inner);
        mb.set_number_of_blocks(3);
        mb
    }

    #[test]
    fn index_layout() {
        let data = nested();
        let mut out = Vec::new();
        let leaves = write_vtm(&mut out, &data, "result").unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains(r#"<VTKFile type="vtkMultiBlockDataSet""#));
        assert!(out.contains(r#"<Piece index="0" name="particles">"#));
        assert!(out.contains(r#"<DataSet index="0" file="result/result_0_0.vtu"/>"#));
        assert!(out.contains(r#"<DataSet index="1"/>"#));
        assert!(out.contains(r#"<DataSet index="2" file="result/result_0_2.vtu"/>"#));
        assert!(out.contains(r#"<Block index="1">"#));
        assert!(out.contains(r#"<DataSet index="0" file="result/result_1.vtu"/>"#));
        assert!(out.contains(r#"<DataSet index="2"/>"#));

        let sources: Vec<_> = leaves.iter().map(|leaf| leaf.source.as_str()).collect();
        assert_eq!(
            sources,
            vec![
                "result/result_0_0.vtu",
                "result/result_0_2.vtu",
                "result/result_1.vtu"
            ]
        );
    }

    #[test]
    fn vtm_extension_is_added_once() {
        assert_eq!(
            MultiBlockWriter::new("out/multi-block-data").vtm_path(),
            PathBuf::from("out/multi-block-data.vtm")
        );
        assert_eq!(
            MultiBlockWriter::new("a.vtm").vtm_path(),
            PathBuf::from("a.vtm")
        );
    }
}
