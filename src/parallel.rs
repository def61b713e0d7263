//! Parallel writing of the pieces of a dataset, and the `.pvtu` summary that ties them
//! together.
//!
//! Every piece is written to its own `.vtu` file by a rayon worker. Pieces share no state,
//! so the only coordination is waiting for all of them before the summary is written.

use crate::prelude::*;
use crate::write_vtk::{start_vtk_file, write_vtu_file};

use log::{debug, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// the conventional file name of piece `index` of a dataset called `prefix`
pub fn piece_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}_{index}.vtu")
}

/// Write every grid to its own file, one rayon task per file.
///
/// All pieces are attempted even if one fails. The first error (in piece order)
/// is returned.
pub fn write_pieces<P>(jobs: &[(P, &UnstructuredGrid)], encoding: Encoding) -> Result<(), Error>
where
    P: AsRef<Path> + Sync,
{
    let results: Vec<Result<(), Error>> = jobs
        .par_iter()
        .with_max_len(1)
        .map(|(path, grid)| {
            debug!(
                "worker {:?} writes {}",
                rayon::current_thread_index(),
                path.as_ref().display()
            );
            write_vtu_file(path, grid, encoding)
        })
        .collect();

    results.into_iter().collect()
}

/// Write the `PUnstructuredGrid` summary of a dataset. The array layout is taken from
/// `layout`, and one `<Piece>` is written per entry of `sources`
pub fn write_pvtu<W, S>(writer: W, layout: &UnstructuredGrid, sources: &[S]) -> Result<(), Error>
where
    W: Write,
    S: AsRef<str>,
{
    let mut writer = Writer::new_with_indent(writer, b' ', 2);

    start_vtk_file(&mut writer, "PUnstructuredGrid")?;

    writer.write_event(Event::Start(
        BytesStart::new("PUnstructuredGrid").with_attributes([("GhostLevel", "0")]),
    ))?;

    writer.write_event(Event::Start(BytesStart::new("PPointData")))?;
    for array in layout.point_data() {
        write_pdataarray(
            &mut writer,
            array.name(),
            array.number_of_components(),
            Precision::Float64,
        )?;
    }
    writer.write_event(Event::End(BytesEnd::new("PPointData")))?;

    writer.write_event(Event::Empty(BytesStart::new("PCellData")))?;

    writer.write_event(Event::Start(BytesStart::new("PPoints")))?;
    write_pdataarray(&mut writer, layout.points().name(), 3, Precision::Float64)?;
    writer.write_event(Event::End(BytesEnd::new("PPoints")))?;

    writer.write_event(Event::Start(BytesStart::new("PCells")))?;
    write_pdataarray(&mut writer, "connectivity", 1, Precision::Int64)?;
    write_pdataarray(&mut writer, "offsets", 1, Precision::Int64)?;
    write_pdataarray(&mut writer, "types", 1, Precision::UInt8)?;
    writer.write_event(Event::End(BytesEnd::new("PCells")))?;

    for source in sources {
        writer.write_event(Event::Empty(
            BytesStart::new("Piece").with_attributes([("Source", source.as_ref())]),
        ))?;
    }

    writer.write_event(Event::End(BytesEnd::new("PUnstructuredGrid")))?;
    writer.write_event(Event::End(BytesEnd::new("VTKFile")))?;

    Ok(())
}

fn write_pdataarray<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    components: usize,
    precision: Precision,
) -> Result<(), Error> {
    let components = components.to_string();

    writer.write_event(Event::Empty(BytesStart::new("PDataArray").with_attributes([
        ("type", precision.to_str()),
        ("NumberOfComponents", components.as_str()),
        ("Name", name),
    ])))?;

    Ok(())
}

/// Writes the pieces of an unstructured dataset in parallel, followed by a `.pvtu` summary.
///
/// Piece `i` of a summary `dir/name.pvtu` is written to `dir/name_i.vtu`.
#[derive(Debug, Clone)]
pub struct PUnstructuredGridWriter {
    file_name: PathBuf,
    number_of_pieces: Option<usize>,
    encoding: Encoding,
}

impl PUnstructuredGridWriter {
    pub fn new<P: Into<PathBuf>>(file_name: P) -> Self {
        Self {
            file_name: file_name.into(),
            number_of_pieces: None,
            encoding: Encoding::default(),
        }
    }

    /// the number of pieces the writer expects. When unset, every piece given to
    /// `write` is accepted
    pub fn set_number_of_pieces(&mut self, n: usize) -> &mut Self {
        self.number_of_pieces = Some(n);
        self
    }

    pub fn set_encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    /// write one piece per grid, then the summary. Returns the paths of every file written
    pub fn write(&self, grids: &[UnstructuredGrid]) -> Result<Vec<PathBuf>, Error> {
        let slots: Vec<Option<&UnstructuredGrid>> = grids.iter().map(Some).collect();
        self.write_slots(&slots)
    }

    /// write the pieces of a multi-piece dataset, then the summary. Empty slots
    /// keep their index but write no file
    pub fn write_multi_piece(&self, data: &MultiPieceDataSet) -> Result<Vec<PathBuf>, Error> {
        let slots: Vec<Option<&UnstructuredGrid>> =
            data.pieces().iter().map(Option::as_ref).collect();
        self.write_slots(&slots)
    }

    fn write_slots(&self, slots: &[Option<&UnstructuredGrid>]) -> Result<Vec<PathBuf>, Error> {
        if let Some(expected) = self.number_of_pieces {
            if expected != slots.len() {
                return Err(Error::PieceCountMismatch {
                    expected,
                    actual: slots.len(),
                });
            }
        }

        let layout = check_consistent_pieces(slots)?;

        let stem = self
            .file_name
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("data"));
        let dir = self.file_name.parent().unwrap_or_else(|| Path::new(""));

        let mut sources = Vec::new();
        let mut jobs = Vec::new();
        for (index, grid) in slots.iter().enumerate() {
            if let Some(grid) = grid {
                let source = piece_file_name(&stem, index);
                jobs.push((dir.join(&source), *grid));
                sources.push(source);
            }
        }

        write_pieces(&jobs, self.encoding)?;

        info!("Write {}", self.file_name.display());
        let file = std::fs::File::create(&self.file_name)?;
        let mut writer = std::io::BufWriter::new(file);
        write_pvtu(&mut writer, layout, sources.as_slice())?;
        writer.flush()?;

        let mut written: Vec<PathBuf> = jobs.into_iter().map(|(path, _)| path).collect();
        written.push(self.file_name.clone());
        Ok(written)
    }
}

/// every piece must have the same point arrays as the first one, which is returned
fn check_consistent_pieces<'a>(
    slots: &[Option<&'a UnstructuredGrid>],
) -> Result<&'a UnstructuredGrid, Error> {
    let mut present = slots
        .iter()
        .enumerate()
        .filter_map(|(index, grid)| grid.map(|grid| (index, grid)));

    let (_, first) = present.next().ok_or(Error::NoPieces)?;
    let layout = first.point_layout();

    for (index, grid) in present {
        if grid.point_layout() != layout || grid.points().name() != first.points().name() {
            return Err(Error::InconsistentPieces { index });
        }
    }

    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(arrays: &[&str]) -> UnstructuredGrid {
        let mut grid = UnstructuredGrid::new();
        grid.set_points(DataArray::from_tuples("position", &[[0., 0., 0.]]))
            .unwrap();
        for name in arrays {
            grid.add_point_array(DataArray::from_tuples(*name, &[[1.]]))
                .unwrap();
        }
        grid
    }

    #[test]
    fn piece_names() {
        assert_eq!(piece_file_name("Cells", 3), "Cells_3.vtu");
    }

    #[test]
    fn summary_lists_every_source() {
        let mut out = Vec::new();
        write_pvtu(&mut out, &grid_with(&["diameter"]), &["a_0.vtu", "a_1.vtu"]).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains(r#"<VTKFile type="PUnstructuredGrid""#));
        assert!(out.contains(r#"<PUnstructuredGrid GhostLevel="0">"#));
        assert!(out.contains(
            r#"<PDataArray type="Float64" NumberOfComponents="1" Name="diameter"/>"#
        ));
        assert!(out.contains(
            r#"<PDataArray type="Float64" NumberOfComponents="3" Name="position"/>"#
        ));
        assert!(out.contains(r#"<Piece Source="a_0.vtu"/>"#));
        assert!(out.contains(r#"<Piece Source="a_1.vtu"/>"#));
    }

    #[test]
    fn pieces_must_agree_on_arrays() {
        let a = grid_with(&["diameter"]);
        let b = grid_with(&["radius"]);
        let err = check_consistent_pieces(&[Some(&a), None, Some(&b)]).unwrap_err();
        assert!(matches!(err, Error::InconsistentPieces { index: 2 }));

        assert!(matches!(
            check_consistent_pieces(&[None, None]).unwrap_err(),
            Error::NoPieces
        ));
    }

    #[test]
    fn every_piece_is_attempted() {
        let dir = tempfile::tempdir().unwrap();
        let grid = grid_with(&["diameter"]);

        // piece 1 has no directory to go to, piece 3 names an existing directory
        let jobs = vec![
            (dir.path().join("a_0.vtu"), &grid),
            (dir.path().join("missing").join("a_1.vtu"), &grid),
            (dir.path().join("a_2.vtu"), &grid),
            (dir.path().to_path_buf(), &grid),
            (dir.path().join("a_4.vtu"), &grid),
        ];

        let err = write_pieces(&jobs, Encoding::Ascii).unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected an io error, got {other}"),
        }

        for name in ["a_0.vtu", "a_2.vtu", "a_4.vtu"] {
            assert!(dir.path().join(name).is_file(), "{name} was not written");
        }
    }

    #[test]
    fn piece_count_is_checked_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = PUnstructuredGridWriter::new(dir.path().join("Cells.pvtu"));
        writer.set_number_of_pieces(3);

        let err = writer.write(&[grid_with(&[])]).unwrap_err();
        assert!(matches!(
            err,
            Error::PieceCountMismatch {
                expected: 3,
                actual: 1
            }
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
