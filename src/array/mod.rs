//! container types for data to be written to (and read from) files

mod vector;

use crate::prelude::*;
use crate::utils;

/// Access to the values of an array in the order they are written to a file:
/// tuple after tuple, components interleaved.
///
/// Any type implementing `Components` implements [`Array`] and can be written as a
/// `<DataArray>` in every [`Encoding`].
pub trait Components {
    type Num: Numeric;
    type Iter<'a>: Iterator<Item = &'a Self::Num>
    where
        Self: 'a;

    fn array_components(&self) -> usize;

    fn length(&self) -> usize;

    fn iter(&self) -> Self::Iter<'_>;
}

impl<T> Array for T
where
    T: Components + ?Sized,
{
    fn write_ascii<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
        write_vtk::write_inline_array_header(
            writer,
            Encoding::Ascii,
            name,
            self.array_components(),
            T::Num::as_precision(),
        )?;

        let mut data = String::with_capacity(Components::length(self) * 4);
        for (idx, value) in Components::iter(self).enumerate() {
            if idx > 0 {
                data.push(' ');
            }
            value.push_ascii(&mut data);
        }

        writer.write_event(Event::Text(BytesText::new(&data)))?;

        write_vtk::close_inline_array_header(writer)?;

        Ok(())
    }

    fn write_base64<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
        write_vtk::write_inline_array_header(
            writer,
            Encoding::Base64,
            name,
            self.array_components(),
            T::Num::as_precision(),
        )?;

        let mut byte_data: Vec<u8> = Vec::with_capacity(self.num_bytes());
        Components::iter(self).for_each(|value| value.extend_le_bytes(&mut byte_data));

        // the header and the data are encoded separately, the same way vtk does it
        let mut data = base64::encode(utils::block_header(byte_data.len()));
        data.push_str(&base64::encode(byte_data.as_slice()));

        writer.write_event(Event::Text(BytesText::new(&data)))?;

        write_vtk::close_inline_array_header(writer)?;

        Ok(())
    }

    fn write_binary<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        let writer = writer.inner();

        let mut bytes = Vec::with_capacity(8 + self.num_bytes());
        bytes.extend_from_slice(&utils::block_header(self.num_bytes()));
        Components::iter(self).for_each(|value| value.extend_le_bytes(&mut bytes));

        writer.write_all(&bytes)?;

        Ok(())
    }

    fn length(&self) -> usize {
        Components::length(self)
    }

    fn components(&self) -> usize {
        Components::array_components(self)
    }

    fn precision(&self) -> Precision {
        T::Num::as_precision()
    }

    fn size_of_elem(&self) -> usize {
        T::Num::SIZE
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Deref)]
/// A named Float64 array with a fixed number of components per tuple, such as point
/// positions (3 components) or a scalar field (1 component).
///
/// Values are stored as an `(tuples, components)` array. Rows are appended with
/// [`DataArray::insert_next_tuple`].
pub struct DataArray {
    name: String,
    #[deref]
    values: Array2<f64>,
}

impl DataArray {
    /// an empty array with a fixed number of components
    pub fn new<T: Into<String>>(name: T, components: usize) -> Self {
        Self {
            name: name.into(),
            values: Array2::zeros((0, components)),
        }
    }

    /// build an array from flat, interleaved values. The length of `data` must be a
    /// multiple of `components`
    pub fn from_shape_vec<T: Into<String>>(
        name: T,
        components: usize,
        data: Vec<f64>,
    ) -> Result<Self, Error> {
        let tuples = if components == 0 {
            0
        } else {
            data.len() / components
        };

        let values = Array2::from_shape_vec((tuples, components), data)?;

        Ok(Self {
            name: name.into(),
            values,
        })
    }

    /// build an array from fixed width tuples
    pub fn from_tuples<T: Into<String>, const N: usize>(name: T, tuples: &[[f64; N]]) -> Self
    where
        [f64; N]: ndarray::FixedInitializer<Elem = f64>,
    {
        Self {
            name: name.into(),
            values: ndarray::arr2(tuples),
        }
    }

    /// append a tuple to the end of the array
    pub fn insert_next_tuple(&mut self, tuple: &[f64]) -> Result<(), Error> {
        if tuple.len() != self.number_of_components() {
            return Err(Error::ComponentMismatch {
                name: self.name.clone(),
                expected: self.number_of_components(),
                actual: tuple.len(),
            });
        }

        self.values.push_row(ArrayView1::from(tuple))?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<T: Into<String>>(&mut self, name: T) {
        self.name = name.into();
    }

    pub fn number_of_tuples(&self) -> usize {
        self.values.nrows()
    }

    pub fn number_of_components(&self) -> usize {
        self.values.ncols()
    }

    /// the `i`th tuple, if it exists
    pub fn tuple(&self, i: usize) -> Option<ArrayView1<'_, f64>> {
        if i < self.number_of_tuples() {
            Some(self.values.row(i))
        } else {
            None
        }
    }

    /// get the array that this type wraps
    pub fn into_inner(self) -> Array2<f64> {
        self.values
    }
}

impl Components for DataArray {
    type Num = f64;
    type Iter<'a> = ndarray::iter::Iter<'a, f64, ndarray::Ix2>;

    fn array_components(&self) -> usize {
        self.number_of_components()
    }

    fn length(&self) -> usize {
        self.values.len()
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_tuples() {
        let mut position = DataArray::new("position", 3);
        position.insert_next_tuple(&[0., 0., 10.]).unwrap();
        position.insert_next_tuple(&[1., 2., 3.]).unwrap();

        assert_eq!(position.number_of_tuples(), 2);
        assert_eq!(position.number_of_components(), 3);
        assert_eq!(position.tuple(1).unwrap().to_vec(), vec![1., 2., 3.]);
        assert!(position.tuple(2).is_none());

        let flat: Vec<f64> = Components::iter(&position).copied().collect();
        assert_eq!(flat, vec![0., 0., 10., 1., 2., 3.]);
    }

    #[test]
    fn wrong_tuple_width_is_rejected() {
        let mut diameter = DataArray::new("diameter", 1);
        let err = diameter.insert_next_tuple(&[1., 2.]).unwrap_err();
        assert!(matches!(
            err,
            Error::ComponentMismatch {
                expected: 1,
                actual: 2,
                ..
            }
        ));
        assert_eq!(diameter.number_of_tuples(), 0);
    }

    #[test]
    fn shape_vec_must_divide() {
        assert!(DataArray::from_shape_vec("a", 3, vec![1., 2.]).is_err());
        let arr = DataArray::from_shape_vec("a", 2, vec![1., 2., 3., 4.]).unwrap();
        assert_eq!(arr.number_of_tuples(), 2);
        assert_eq!(arr, DataArray::from_tuples("a", &[[1., 2.], [3., 4.]]));
    }

    #[test]
    fn tuples_keep_their_width() {
        let arr = DataArray::from_tuples("position", &[[0., 0., 10.], [1., 2., 3.]]);
        assert_eq!(arr.number_of_tuples(), 2);
        assert_eq!(arr.number_of_components(), 3);
        assert_eq!(arr[[1, 2]], 3.);

        let empty: DataArray = DataArray::from_tuples::<_, 3>("position", &[]);
        assert_eq!(empty.number_of_tuples(), 0);
        assert_eq!(empty.number_of_components(), 3);
    }

    #[test]
    fn ascii_dataarray() {
        let arr = DataArray::from_tuples("position", &[[0., 0., 10.]]);
        let mut writer = Writer::new(Vec::new());
        arr.write_ascii(&mut writer, arr.name()).unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            out,
            r#"<DataArray type="Float64" NumberOfComponents="3" Name="position" format="ascii">0.0 0.0 10.0</DataArray>"#
        );
    }

    #[test]
    fn binary_block_has_byte_count() {
        let arr = DataArray::from_tuples("diameter", &[[5.], [10.]]);
        let mut writer = Writer::new(Vec::new());
        arr.write_binary(&mut writer).unwrap();

        let out = writer.into_inner();
        assert_eq!(out.len(), 8 + 16);
        assert_eq!(&out[0..8], &16_u64.to_le_bytes());
        assert_eq!(&out[8..16], &5_f64.to_le_bytes());
    }
}
