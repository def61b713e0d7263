use crate::prelude::*;

use log::{debug, info};
use std::path::Path;

/// version written to the `VTKFile` element of every file
pub(crate) const VTK_FILE_VERSION: &str = "1.0";

/// how the data arrays of a piece are stored in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// inline, whitespace separated numbers
    Ascii,
    /// inline, base64 encoded little endian bytes
    Base64,
    /// raw little endian bytes in the `<AppendedData>` section at the end of the file
    #[default]
    Binary,
}

impl Encoding {
    /// value of the `format` attribute of a `<DataArray>`
    pub(crate) fn to_str(&self) -> &'static str {
        match &self {
            Self::Ascii => "ascii",
            Self::Base64 => "binary",
            Self::Binary => "appended",
        }
    }
}

/// Write a single unstructured grid piece (a `.vtu` file) to a `Writer`
pub fn write_vtu<W: Write>(
    writer: W,
    grid: &UnstructuredGrid,
    encoding: Encoding,
) -> Result<(), Error> {
    let mut writer = Writer::new_with_indent(writer, b' ', 2);

    start_vtk_file(&mut writer, "UnstructuredGrid")?;

    writer.write_event(Event::Start(BytesStart::new("UnstructuredGrid")))?;

    let number_of_points = grid.number_of_points().to_string();
    let number_of_cells = grid.number_of_cells().to_string();
    writer.write_event(Event::Start(BytesStart::new("Piece").with_attributes([
        ("NumberOfPoints", number_of_points.as_str()),
        ("NumberOfCells", number_of_cells.as_str()),
    ])))?;

    let connectivity = grid.cells().connectivity.as_slice();
    let offsets = grid.cells().offsets.as_slice();
    let types = grid.cells().type_ids();

    // with appended data only the headers (and their offsets) are written here, the
    // raw bytes follow in the same order after the xml tree
    let mut offset = 0;

    writer.write_event(Event::Start(BytesStart::new("PointData")))?;
    for array in grid.point_data() {
        debug!("Write point data {}", array.name());
        write_dataarray(&mut writer, array, array.name(), encoding, &mut offset)?;
    }
    writer.write_event(Event::End(BytesEnd::new("PointData")))?;

    writer.write_event(Event::Empty(BytesStart::new("CellData")))?;

    writer.write_event(Event::Start(BytesStart::new("Points")))?;
    let points = grid.points();
    write_dataarray(&mut writer, points, points.name(), encoding, &mut offset)?;
    writer.write_event(Event::End(BytesEnd::new("Points")))?;

    writer.write_event(Event::Start(BytesStart::new("Cells")))?;
    write_dataarray(&mut writer, connectivity, "connectivity", encoding, &mut offset)?;
    write_dataarray(&mut writer, offsets, "offsets", encoding, &mut offset)?;
    write_dataarray(&mut writer, types.as_slice(), "types", encoding, &mut offset)?;
    writer.write_event(Event::End(BytesEnd::new("Cells")))?;

    writer.write_event(Event::End(BytesEnd::new("Piece")))?;
    writer.write_event(Event::End(BytesEnd::new("UnstructuredGrid")))?;

    if encoding == Encoding::Binary {
        appended_binary_header_start(&mut writer)?;

        for array in grid.point_data() {
            array.write_binary(&mut writer)?;
        }
        points.write_binary(&mut writer)?;
        connectivity.write_binary(&mut writer)?;
        offsets.write_binary(&mut writer)?;
        types.write_binary(&mut writer)?;

        appended_binary_header_end(&mut writer)?;
    }

    writer.write_event(Event::End(BytesEnd::new("VTKFile")))?;

    Ok(())
}

/// Write a single unstructured grid piece to a file at `path`
pub fn write_vtu_file<P: AsRef<Path>>(
    path: P,
    grid: &UnstructuredGrid,
    encoding: Encoding,
) -> Result<(), Error> {
    let path = path.as_ref();
    info!("Write {}", path.display());

    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_vtu(&mut writer, grid, encoding)?;
    writer.flush()?;

    Ok(())
}

/// write the xml declaration and open the `VTKFile` element
pub(crate) fn start_vtk_file<W: Write>(
    writer: &mut Writer<W>,
    file_type: &str,
) -> Result<(), Error> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;

    writer.write_event(Event::Start(BytesStart::new("VTKFile").with_attributes([
        ("type", file_type),
        ("version", VTK_FILE_VERSION),
        ("byte_order", "LittleEndian"),
        ("header_type", "UInt64"),
    ])))?;

    Ok(())
}

/// write one array either inline, or as a header pointing into the appended section.
/// `offset` is advanced past the array's appended bytes
fn write_dataarray<W, A>(
    writer: &mut Writer<W>,
    data: &A,
    name: &str,
    encoding: Encoding,
    offset: &mut usize,
) -> Result<(), Error>
where
    W: Write,
    A: Array + ?Sized,
{
    match encoding {
        Encoding::Ascii | Encoding::Base64 => write_inline_dataarray(writer, data, name, encoding),
        Encoding::Binary => {
            write_appended_dataarray_header(
                writer,
                name,
                *offset as i64,
                data.components(),
                data.precision(),
            )?;
            *offset += 8 + data.num_bytes();
            Ok(())
        }
    }
}

fn appended_binary_header_start<W: Write>(writer: &mut Writer<W>) -> Result<(), Error> {
    writer.write_event(Event::Start(
        BytesStart::new("AppendedData").with_attributes([("encoding", "raw")]),
    ))?;
    // offsets are counted from the byte following the underscore
    writer.inner().write_all(b"_")?;
    Ok(())
}

fn appended_binary_header_end<W: Write>(writer: &mut Writer<W>) -> Result<(), Error> {
    writer.write_event(Event::End(BytesEnd::new("AppendedData")))?;
    Ok(())
}

pub(crate) fn write_inline_array_header<W: Write>(
    writer: &mut Writer<W>,
    encoding: Encoding,
    name: &str,
    components: usize,
    precision: Precision,
) -> Result<(), Error> {
    let components = components.to_string();

    writer.write_event(Event::Start(BytesStart::new("DataArray").with_attributes([
        ("type", precision.to_str()),
        ("NumberOfComponents", components.as_str()),
        ("Name", name),
        ("format", encoding.to_str()),
    ])))?;

    Ok(())
}

pub(crate) fn close_inline_array_header<W: Write>(writer: &mut Writer<W>) -> Result<(), Error> {
    writer.write_event(Event::End(BytesEnd::new("DataArray")))?;

    Ok(())
}

/// write a single (inline) array of data (such as a diameter field)
/// to the vtk file.
///
/// Inline arrays can not be appended: `Encoding::Binary` is written as base64.
pub fn write_inline_dataarray<W: Write, A: Array + ?Sized>(
    writer: &mut Writer<W>,
    data: &A,
    name: &str,
    encoding: Encoding,
) -> Result<(), Error> {
    match encoding {
        Encoding::Ascii => {
            data.write_ascii(writer, name)?;
        }
        Encoding::Base64 | Encoding::Binary => {
            data.write_base64(writer, name)?;
        }
    };

    Ok(())
}

/// write the header for an appended data array that will later be written in the appended
/// section of the vtk.
///
/// if you call this function you are also responsible for calling
/// `Array::write_binary` with the data in the correct order
#[inline]
pub fn write_appended_dataarray_header<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    offset: i64,
    components: usize,
    precision: Precision,
) -> Result<(), Error> {
    let components = components.to_string();
    let offset = offset.to_string();

    writer.write_event(Event::Empty(BytesStart::new("DataArray").with_attributes([
        ("type", precision.to_str()),
        ("NumberOfComponents", components.as_str()),
        ("Name", name),
        ("format", "appended"),
        ("offset", offset.as_str()),
    ])))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_point() -> UnstructuredGrid {
        let mut grid = UnstructuredGrid::new();
        grid.set_points(DataArray::from_tuples("position", &[[0., 0., 10.]]))
            .unwrap();
        grid.add_point_array(DataArray::from_tuples("diameter", &[[10.]]))
            .unwrap();
        grid
    }

    fn to_string(grid: &UnstructuredGrid, encoding: Encoding) -> String {
        let mut out = Vec::new();
        write_vtu(&mut out, grid, encoding).unwrap();
        String::from_utf8_lossy(&out).into_owned()
    }

    #[test]
    fn ascii_piece_layout() {
        let out = to_string(&single_point(), Encoding::Ascii);

        assert!(out.starts_with(r#"<?xml version="1.0"?>"#));
        assert!(out.contains(
            r#"<VTKFile type="UnstructuredGrid" version="1.0" byte_order="LittleEndian" header_type="UInt64">"#
        ));
        assert!(out.contains(r#"<Piece NumberOfPoints="1" NumberOfCells="0">"#));
        assert!(out.contains(r#"Name="diameter" format="ascii">10.0</DataArray>"#));
        assert!(out.contains(r#"Name="position" format="ascii">0.0 0.0 10.0</DataArray>"#));
        assert!(out.contains(r#"type="UInt8" NumberOfComponents="1" Name="types""#));
        assert!(!out.contains("AppendedData"));

        // point data comes before the points
        assert!(out.find("diameter").unwrap() < out.find("position").unwrap());
    }

    #[test]
    fn appended_offsets_include_headers() {
        let out = to_string(&single_point(), Encoding::Binary);

        // diameter: 8 + 8, position: 8 + 24, connectivity: 8, offsets: 8
        assert!(out.contains(r#"Name="diameter" format="appended" offset="0"/>"#));
        assert!(out.contains(r#"Name="position" format="appended" offset="16"/>"#));
        assert!(out.contains(r#"Name="connectivity" format="appended" offset="48"/>"#));
        assert!(out.contains(r#"Name="offsets" format="appended" offset="56"/>"#));
        assert!(out.contains(r#"Name="types" format="appended" offset="64"/>"#));
        assert!(out.contains(r#"<AppendedData encoding="raw">_"#));
        assert!(out.trim_end().ends_with("</VTKFile>"));
    }

    #[test]
    fn appended_section_length() {
        let mut out = Vec::new();
        write_vtu(&mut out, &single_point(), Encoding::Binary).unwrap();

        let start = out.windows(2).position(|w| w == b">_").unwrap() + 2;
        let end = out
            .windows(b"</AppendedData>".len())
            .position(|w| w == b"</AppendedData>")
            .unwrap();

        // 72 bytes of blocks followed by the indentation of the closing tag
        let section = &out[start..end];
        assert_eq!(section.len(), 72 + "\n  ".len());
        assert_eq!(&section[8..16], &10_f64.to_le_bytes());
    }

    #[test]
    fn inline_binary_falls_back_to_base64() {
        let mut writer = Writer::new(Vec::new());
        write_inline_dataarray(&mut writer, &vec![1.0_f64], "a", Encoding::Binary).unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert!(out.contains(r#"format="binary""#));
    }
}
