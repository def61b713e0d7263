use super::Components;
use crate::prelude::*;

impl<NUM> Components for [NUM]
where
    NUM: Numeric,
{
    type Num = NUM;
    type Iter<'a> = std::slice::Iter<'a, NUM>;

    fn array_components(&self) -> usize {
        1
    }

    fn length(&self) -> usize {
        self.len()
    }

    fn iter(&self) -> Self::Iter<'_> {
        <[NUM]>::iter(self)
    }
}

impl<NUM> Components for Vec<NUM>
where
    NUM: Numeric,
{
    type Num = NUM;
    type Iter<'a> = std::slice::Iter<'a, NUM>;

    fn array_components(&self) -> usize {
        1
    }

    fn length(&self) -> usize {
        self.len()
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.as_slice().iter()
    }
}
