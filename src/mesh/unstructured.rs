use crate::prelude::*;

/// name given to the point position array when none is set
pub const DEFAULT_POINTS_NAME: &str = "Points";

/// A single piece of an unstructured dataset: points, point data, and cells
#[derive(Debug, Clone, PartialEq)]
pub struct UnstructuredGrid {
    points: DataArray,
    point_data: Vec<DataArray>,
    cells: Cells,
}

impl Default for UnstructuredGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl UnstructuredGrid {
    /// an empty grid with no points
    pub fn new() -> Self {
        Self {
            points: DataArray::new(DEFAULT_POINTS_NAME, 3),
            point_data: Vec::new(),
            cells: Cells::new(),
        }
    }

    /// set the point positions. The array must have 3 components
    pub fn set_points(&mut self, points: DataArray) -> Result<(), Error> {
        if points.number_of_components() != 3 {
            return Err(Error::ComponentMismatch {
                name: points.name().to_string(),
                expected: 3,
                actual: points.number_of_components(),
            });
        }

        // point data and cells are tied to the current point count
        let count = points.number_of_tuples();
        if let Some(array) = self
            .point_data
            .iter()
            .find(|array| array.number_of_tuples() != count)
        {
            return Err(Error::TupleCountMismatch {
                name: array.name().to_string(),
                expected: count,
                actual: array.number_of_tuples(),
            });
        }
        if let Some(&id) = self
            .cells
            .connectivity
            .iter()
            .find(|&&id| usize::try_from(id).map_or(true, |id| id >= count))
        {
            return Err(Error::PointIdOutOfRange { id, points: count });
        }

        self.points = points;
        Ok(())
    }

    /// add a point data array. An array with the same name is replaced
    pub fn add_point_array(&mut self, array: DataArray) -> Result<(), Error> {
        if array.number_of_tuples() != self.number_of_points() {
            return Err(Error::TupleCountMismatch {
                name: array.name().to_string(),
                expected: self.number_of_points(),
                actual: array.number_of_tuples(),
            });
        }

        match self.point_data.iter_mut().find(|a| a.name() == array.name()) {
            Some(existing) => *existing = array,
            None => self.point_data.push(array),
        }

        Ok(())
    }

    /// append a cell, checking that every point id exists
    pub fn push_cell(&mut self, cell_type: CellType, point_ids: &[i64]) -> Result<(), Error> {
        let points = self.number_of_points();
        if let Some(&id) = point_ids
            .iter()
            .find(|&&id| id < 0 || id as usize >= points)
        {
            return Err(Error::PointIdOutOfRange { id, points });
        }

        self.cells.push(cell_type, point_ids);
        Ok(())
    }

    /// replace all cells. Used when reading a grid back from a file
    pub(crate) fn set_cells(&mut self, cells: Cells) {
        self.cells = cells;
    }

    pub fn points(&self) -> &DataArray {
        &self.points
    }

    pub fn point_data(&self) -> &[DataArray] {
        &self.point_data
    }

    pub fn point_array(&self, name: &str) -> Option<&DataArray> {
        self.point_data.iter().find(|a| a.name() == name)
    }

    pub fn cells(&self) -> &Cells {
        &self.cells
    }

    pub fn number_of_points(&self) -> usize {
        self.points.number_of_tuples()
    }

    pub fn number_of_cells(&self) -> usize {
        self.cells.len()
    }

    /// name and component count of every point data array. Pieces of the same dataset
    /// must agree on this
    pub(crate) fn point_layout(&self) -> Vec<(&str, usize)> {
        self.point_data
            .iter()
            .map(|a| (a.name(), a.number_of_components()))
            .collect()
    }
}
