//! reading written VTK files back
//!
//! Only the subset of the xml formats written by this crate is understood:
//! `UnstructuredGrid` pieces in any [`Encoding`](crate::Encoding), and the list of
//! files referenced by a `PUnstructuredGrid` or `vtkMultiBlockDataSet` index.

mod error;
mod event_summary;

pub use error::{
    CountMismatch, InvalidArray, MalformedAttribute, MalformedXml, MissingAttribute, ParseError,
    UnexpectedAttributeValue, UnexpectedElement,
};
use event_summary::EventSummary;

use crate::prelude::*;
use crate::utils;

use num_traits::ToPrimitive;
use quick_xml::events::BytesStart;
use quick_xml::reader::Reader;
use std::path::Path;

/// the section of a `<Piece>` a data array was found in
#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    PointData,
    CellData,
    Points,
    Cells,
}

/// a `<DataArray>` element whose values have not been decoded yet
#[derive(Debug, Clone)]
struct RawArray {
    name: String,
    precision: Precision,
    components: usize,
    format: String,
    offset: Option<usize>,
    section: Option<Section>,
    text: String,
}

/// read in and parse a `.vtu` file for a given path
pub fn read_vtu<P: AsRef<Path>>(path: P) -> Result<UnstructuredGrid, Error> {
    let bytes = std::fs::read(path)?;
    parse_vtu(&bytes)
}

/// parse the contents of a `.vtu` file
pub fn parse_vtu(bytes: &[u8]) -> Result<UnstructuredGrid, Error> {
    // raw appended bytes are not valid xml, so only the part before them is given
    // to the xml reader
    let (xml, appended) = split_appended(bytes);

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buffer = Vec::new();

    read_to_vtk_file(&mut reader, &mut buffer, &["UnstructuredGrid"])?;

    let mut declared_points = None;
    let mut declared_cells = None;
    let mut section = None;
    let mut current: Option<RawArray> = None;
    let mut arrays = Vec::new();

    loop {
        buffer.clear();
        let event = reader
            .read_event_into(&mut buffer)
            .map_err(ParseError::from)?;

        match event {
            Event::Start(ref s) | Event::Empty(ref s) => {
                let is_empty = matches!(event, Event::Empty(_));
                match s.name().as_ref() {
                    b"Piece" => {
                        declared_points = Some(usize_attribute(s, "Piece", "NumberOfPoints")?);
                        declared_cells = Some(usize_attribute(s, "Piece", "NumberOfCells")?);
                    }
                    b"PointData" if !is_empty => section = Some(Section::PointData),
                    b"CellData" if !is_empty => section = Some(Section::CellData),
                    b"Points" if !is_empty => section = Some(Section::Points),
                    b"Cells" if !is_empty => section = Some(Section::Cells),
                    b"DataArray" => {
                        let raw = read_dataarray_header(s, section)?;
                        if is_empty {
                            arrays.push(raw);
                        } else {
                            current = Some(raw);
                        }
                    }
                    _ => (),
                }
            }
            Event::Text(ref text) => {
                if let Some(raw) = current.as_mut() {
                    let text = text.unescape().map_err(ParseError::from)?;
                    raw.text.push_str(&text);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"DataArray" => arrays.extend(current.take()),
                b"PointData" | b"CellData" | b"Points" | b"Cells" => section = None,
                b"Piece" => break,
                _ => (),
            },
            Event::Eof => {
                let err = UnexpectedElement::new("Piece", EventSummary::eof());
                return Err(ParseError::from(err).into());
            }
            _ => (),
        }
    }

    let mut grid = UnstructuredGrid::new();

    if let Some(points) = arrays.iter().find(|a| a.section == Some(Section::Points)) {
        let values = points.decode_f64(appended)?;
        grid.set_points(DataArray::from_shape_vec(
            points.name.clone(),
            points.components,
            values,
        )?)?;
    }

    for array in arrays
        .iter()
        .filter(|a| a.section == Some(Section::PointData))
    {
        let values = array.decode_f64(appended)?;
        grid.add_point_array(DataArray::from_shape_vec(
            array.name.clone(),
            array.components,
            values,
        )?)?;
    }

    grid.set_cells(read_cells(&arrays, appended)?);

    check_count("points", declared_points, grid.number_of_points())?;
    check_count("cells", declared_cells, grid.number_of_cells())?;

    Ok(grid)
}

/// read the files referenced by a `.pvtu` or `.vtm` index at `path`
pub fn read_sources<P: AsRef<Path>>(path: P) -> Result<Vec<String>, Error> {
    let bytes = std::fs::read(path)?;
    Ok(parse_sources(&bytes)?)
}

/// list the files referenced by a `PUnstructuredGrid` (`<Piece Source>`) or a
/// `vtkMultiBlockDataSet` (`<DataSet file>`) index, in document order
pub fn parse_sources(bytes: &[u8]) -> Result<Vec<String>, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);
    let mut buffer = Vec::new();

    let file_type = read_to_vtk_file(
        &mut reader,
        &mut buffer,
        &["PUnstructuredGrid", "vtkMultiBlockDataSet"],
    )?;

    let (element, attribute): (&[u8], &str) = if file_type == "PUnstructuredGrid" {
        (b"Piece", "Source")
    } else {
        (b"DataSet", "file")
    };

    let mut sources = Vec::new();

    loop {
        buffer.clear();
        match reader.read_event_into(&mut buffer)? {
            Event::Start(ref s) | Event::Empty(ref s) if s.name().as_ref() == element => {
                if let Some(source) = attribute_value(s, attribute)? {
                    sources.push(source);
                }
            }
            Event::Eof => break,
            _ => (),
        }
    }

    Ok(sources)
}

/// split a file into the xml header and the raw bytes after the `_` marker of the
/// `<AppendedData>` section (empty if there is none)
fn split_appended(bytes: &[u8]) -> (&[u8], &[u8]) {
    let tag = b"<AppendedData";
    let start = match bytes.windows(tag.len()).position(|w| w == tag) {
        Some(start) => start,
        None => return (bytes, &[]),
    };

    let appended = bytes[start..]
        .iter()
        .position(|b| *b == b'_')
        .map(|underscore| &bytes[start + underscore + 1..])
        .unwrap_or(&[]);

    (&bytes[..start], appended)
}

/// skip the declaration and check the `VTKFile` element. Returns its `type`, which must
/// be one of `expected_types`
fn read_to_vtk_file<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    expected_types: &[&str],
) -> Result<String, ParseError> {
    loop {
        buffer.clear();
        let event = reader.read_event_into(buffer)?;

        match event {
            Event::Decl(_) | Event::Comment(_) | Event::DocType(_) | Event::PI(_) => continue,
            Event::Start(ref s) if s.name().as_ref() == b"VTKFile" => {
                let file_type = required_attribute(s, "VTKFile", "type")?;
                if !expected_types.contains(&file_type.as_str()) {
                    return Err(UnexpectedAttributeValue::new(
                        "VTKFile".into(),
                        "type".into(),
                        expected_types.join(" or "),
                        file_type,
                    )
                    .into());
                }

                check_optional_attribute(s, "byte_order", "LittleEndian")?;
                check_optional_attribute(s, "header_type", "UInt64")?;

                return Ok(file_type);
            }
            other => {
                let actual = EventSummary::new(&other);
                return Err(UnexpectedElement::new("VTKFile", actual).into());
            }
        }
    }
}

fn check_optional_attribute(
    element: &BytesStart,
    name: &str,
    expected: &str,
) -> Result<(), ParseError> {
    match attribute_value(element, name)? {
        Some(value) if value != expected => Err(UnexpectedAttributeValue::new(
            "VTKFile".into(),
            name.into(),
            expected.into(),
            value,
        )
        .into()),
        _ => Ok(()),
    }
}

fn attribute_value(element: &BytesStart, name: &str) -> Result<Option<String>, ParseError> {
    match element.try_get_attribute(name)? {
        Some(attribute) => Ok(Some(attribute.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn required_attribute(
    element: &BytesStart,
    element_name: &str,
    name: &str,
) -> Result<String, ParseError> {
    attribute_value(element, name)?
        .ok_or_else(|| MissingAttribute::new(element_name.into(), name.into()).into())
}

fn usize_attribute(
    element: &BytesStart,
    element_name: &str,
    name: &str,
) -> Result<usize, ParseError> {
    let value = required_attribute(element, element_name, name)?;
    value.parse().map_err(|_| {
        UnexpectedAttributeValue::new(
            element_name.into(),
            name.into(),
            "an unsigned integer".into(),
            value,
        )
        .into()
    })
}

fn read_dataarray_header(
    element: &BytesStart,
    section: Option<Section>,
) -> Result<RawArray, ParseError> {
    let name = required_attribute(element, "DataArray", "Name")?;
    let type_name = required_attribute(element, "DataArray", "type")?;
    let precision = Precision::from_type_name(&type_name).ok_or_else(|| {
        UnexpectedAttributeValue::new(
            "DataArray".into(),
            "type".into(),
            "Float32, Float64, Int64 or UInt8".into(),
            type_name.clone(),
        )
    })?;

    let components = match attribute_value(element, "NumberOfComponents")? {
        Some(_) => usize_attribute(element, "DataArray", "NumberOfComponents")?,
        None => 1,
    };

    let format = required_attribute(element, "DataArray", "format")?;
    let offset = match format.as_str() {
        "appended" => Some(usize_attribute(element, "DataArray", "offset")?),
        _ => None,
    };

    Ok(RawArray {
        name,
        precision,
        components,
        format,
        offset,
        section,
        text: String::new(),
    })
}

impl RawArray {
    fn invalid<T: Into<String>>(&self, reason: T) -> ParseError {
        InvalidArray::new(self.name.clone(), reason.into()).into()
    }

    /// the little endian bytes of a binary array, without the byte count header
    fn binary_bytes(&self, appended: &[u8]) -> Result<Vec<u8>, ParseError> {
        match self.format.as_str() {
            "binary" => {
                // the header is encoded on its own: 8 bytes take 12 base64 characters
                let text = self.text.trim();
                let (header, data) = match (text.get(..12), text.get(12..)) {
                    (Some(header), Some(data)) => (header, data),
                    _ => return Err(self.invalid("base64 data is shorter than its header")),
                };
                let header = base64::decode(header).map_err(|e| self.invalid(e.to_string()))?;
                let data = base64::decode(data).map_err(|e| self.invalid(e.to_string()))?;
                let num_bytes = usize::try_from(u64::from_le_bytes(utils::le_array(&header)))
                    .ok()
                    .filter(|num_bytes| *num_bytes <= data.len())
                    .ok_or_else(|| self.invalid("base64 data is shorter than its header claims"))?;
                Ok(data[..num_bytes].to_vec())
            }
            "appended" => {
                let offset = self.offset.unwrap_or(0);
                let start = offset
                    .checked_add(8)
                    .ok_or_else(|| self.invalid("offset is past the end of the appended data"))?;
                let header = appended
                    .get(offset..start)
                    .ok_or_else(|| self.invalid("offset is past the end of the appended data"))?;

                // the byte count comes from the file, so it can not be trusted
                let end = usize::try_from(u64::from_le_bytes(utils::le_array(header)))
                    .ok()
                    .and_then(|num_bytes| start.checked_add(num_bytes))
                    .ok_or_else(|| self.invalid("block is past the end of the appended data"))?;
                let data = appended
                    .get(start..end)
                    .ok_or_else(|| self.invalid("block is past the end of the appended data"))?;
                Ok(data.to_vec())
            }
            other => Err(self.invalid(format!("`{other}` is not a binary format"))),
        }
    }

    fn decode<T: Numeric>(&self, appended: &[u8]) -> Result<Vec<T>, ParseError> {
        if self.format == "ascii" {
            return self
                .text
                .split_ascii_whitespace()
                .map(|token| {
                    T::parse_ascii(token)
                        .ok_or_else(|| self.invalid(format!("`{token}` is not a {}", self.precision)))
                })
                .collect();
        }

        let bytes = self.binary_bytes(appended)?;
        if bytes.len() % T::SIZE != 0 {
            return Err(self.invalid("byte count is not a multiple of the element size"));
        }

        Ok(bytes.chunks_exact(T::SIZE).map(T::from_le_slice).collect())
    }

    fn decode_f64(&self, appended: &[u8]) -> Result<Vec<f64>, ParseError> {
        let values = match self.precision {
            Precision::Float32 => convert(self.decode::<f32>(appended)?, ToPrimitive::to_f64),
            Precision::Float64 => Some(self.decode::<f64>(appended)?),
            Precision::Int64 => convert(self.decode::<i64>(appended)?, ToPrimitive::to_f64),
            Precision::UInt8 => convert(self.decode::<u8>(appended)?, ToPrimitive::to_f64),
        };

        values.ok_or_else(|| self.invalid("values do not fit in Float64"))
    }

    fn decode_i64(&self, appended: &[u8]) -> Result<Vec<i64>, ParseError> {
        let values = match self.precision {
            Precision::Int64 => Some(self.decode::<i64>(appended)?),
            Precision::UInt8 => convert(self.decode::<u8>(appended)?, ToPrimitive::to_i64),
            _ => return Err(self.invalid("cell arrays must hold integers")),
        };

        values.ok_or_else(|| self.invalid("values do not fit in Int64"))
    }
}

/// convert every value, `None` if any of them does not fit
fn convert<T, U, F>(values: Vec<T>, f: F) -> Option<Vec<U>>
where
    F: Fn(&T) -> Option<U>,
{
    values.iter().map(f).collect()
}

fn read_cells(arrays: &[RawArray], appended: &[u8]) -> Result<Cells, Error> {
    let find = |name: &str| {
        arrays
            .iter()
            .find(|a| a.section == Some(Section::Cells) && a.name == name)
    };

    let mut cells = Cells::new();

    if let Some(connectivity) = find("connectivity") {
        cells.connectivity = connectivity.decode_i64(appended)?;
    }
    if let Some(offsets) = find("offsets") {
        cells.offsets = offsets.decode_i64(appended)?;
    }
    if let Some(types) = find("types") {
        cells.types = types
            .decode_i64(appended)?
            .into_iter()
            .map(|id| {
                u8::try_from(id)
                    .ok()
                    .and_then(CellType::from_id)
                    .ok_or_else(|| types.invalid(format!("unknown cell type {id}")))
            })
            .collect::<Result<_, _>>()?;
    }

    if cells.offsets.len() != cells.types.len() {
        return Err(ParseError::from(CountMismatch::new(
            "cell offsets",
            cells.types.len(),
            cells.offsets.len(),
        ))
        .into());
    }

    Ok(cells)
}

fn check_count(what: &'static str, declared: Option<usize>, actual: usize) -> Result<(), Error> {
    match declared {
        Some(declared) if declared != actual => {
            Err(ParseError::from(CountMismatch::new(what, declared, actual)).into())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_PIECE: &str = r#"<?xml version="1.0"?>
<VTKFile type="UnstructuredGrid" version="1.0" byte_order="LittleEndian" header_type="UInt64">
  <UnstructuredGrid>
    <Piece NumberOfPoints="2" NumberOfCells="1">
      <PointData>
        <DataArray type="Float32" Name="diameter" format="ascii">5 10</DataArray>
      </PointData>
      <Points>
        <DataArray type="Float64" NumberOfComponents="3" Name="position" format="ascii">0 0 0 0 0 10</DataArray>
      </Points>
      <Cells>
        <DataArray type="Int64" Name="connectivity" format="ascii">0 1</DataArray>
        <DataArray type="Int64" Name="offsets" format="ascii">2</DataArray>
        <DataArray type="UInt8" Name="types" format="ascii">3</DataArray>
      </Cells>
    </Piece>
  </UnstructuredGrid>
</VTKFile>"#;

    #[test]
    fn ascii_piece() {
        let grid = parse_vtu(ASCII_PIECE.as_bytes()).unwrap();

        assert_eq!(grid.number_of_points(), 2);
        assert_eq!(grid.points().name(), "position");
        assert_eq!(grid.points().tuple(1).unwrap().to_vec(), vec![0., 0., 10.]);

        let diameter = grid.point_array("diameter").unwrap();
        assert_eq!(diameter.number_of_components(), 1);
        assert_eq!(diameter.tuple(1).unwrap()[0], 10.);

        assert_eq!(grid.cells().cell(0), Some((CellType::Line, &[0_i64, 1][..])));
    }

    #[test]
    fn wrong_file_type() {
        let text = ASCII_PIECE.replace(r#"type="UnstructuredGrid""#, r#"type="ImageData""#);
        let err = parse_vtu(text.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::UnexpectedAttributeValue(_))
        ));
    }

    #[test]
    fn declared_point_count_is_checked() {
        let text = ASCII_PIECE.replace(r#"NumberOfPoints="2""#, r#"NumberOfPoints="3""#);
        let err = parse_vtu(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::CountMismatch(_))));
    }

    #[test]
    fn bad_ascii_value() {
        let text = ASCII_PIECE.replace(">5 10<", ">5 ten<");
        let err = parse_vtu(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("`ten` is not a Float32"));
    }

    #[test]
    fn truncated_file() {
        let end = ASCII_PIECE.find("</Piece>").unwrap();
        let err = parse_vtu(&ASCII_PIECE.as_bytes()[..end]).unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::UnexpectedElement(_))
        ));
    }

    fn appended_piece() -> Vec<u8> {
        let mut grid = UnstructuredGrid::new();
        grid.set_points(DataArray::from_tuples("position", &[[0., 0., 10.]]))
            .unwrap();
        grid.add_point_array(DataArray::from_tuples("diameter", &[[5.]]))
            .unwrap();

        let mut out = Vec::new();
        crate::write_vtu(&mut out, &grid, Encoding::Binary).unwrap();
        out
    }

    #[test]
    fn oversized_block_header() {
        let mut bytes = appended_piece();
        let start = bytes.windows(2).position(|w| w == b">_").unwrap() + 2;
        bytes[start..start + 8].copy_from_slice(&u64::MAX.to_le_bytes());

        let err = parse_vtu(&bytes).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::InvalidArray(_))));
        assert!(err.to_string().contains("past the end of the appended data"));
    }

    #[test]
    fn offset_past_appended_data() {
        let text = String::from_utf8_lossy(&appended_piece()).into_owned();
        // the points are decoded first, before any appended byte is looked at
        let text = text.replace(r#"offset="16""#, &format!(r#"offset="{}""#, usize::MAX));

        let err = parse_vtu(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::InvalidArray(_))));
    }

    #[test]
    fn appended_split() {
        let (xml, appended) = split_appended(b"<a><AppendedData encoding=\"raw\">_\x01\x02\n</AppendedData></a>");
        assert_eq!(xml, b"<a>");
        assert_eq!(&appended[..2], &[1, 2]);

        let (xml, appended) = split_appended(b"<a/>");
        assert_eq!(xml, b"<a/>");
        assert!(appended.is_empty());
    }

    #[test]
    fn sources_of_both_index_types() {
        let pvtu = r#"<?xml version="1.0"?>
<VTKFile type="PUnstructuredGrid" version="1.0" byte_order="LittleEndian" header_type="UInt64">
  <PUnstructuredGrid GhostLevel="0">
    <Piece Source="a_0.vtu"/>
    <Piece Source="a_1.vtu"/>
  </PUnstructuredGrid>
</VTKFile>"#;
        assert_eq!(parse_sources(pvtu.as_bytes()).unwrap(), vec!["a_0.vtu", "a_1.vtu"]);

        let vtm = r#"<VTKFile type="vtkMultiBlockDataSet" version="1.0">
  <vtkMultiBlockDataSet>
    <Piece index="0">
      <DataSet index="0" file="m/m_0_0.vtu"/>
      <DataSet index="1"/>
    </Piece>
  </vtkMultiBlockDataSet>
</VTKFile>"#;
        assert_eq!(parse_sources(vtm.as_bytes()).unwrap(), vec!["m/m_0_0.vtu"]);
    }
}
