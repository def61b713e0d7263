use crate::prelude::*;

use super::event_summary::EventSummary;

/// Errors produced while reading a vtk file back
#[derive(Debug, thiserror::Error, From)]
pub enum ParseError {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
    #[error("{0}")]
    UnexpectedAttributeValue(UnexpectedAttributeValue),
    #[error("{0}")]
    MissingAttribute(MissingAttribute),
    #[error("{0}")]
    InvalidArray(InvalidArray),
    #[error("{0}")]
    CountMismatch(CountMismatch),
}

impl From<quick_xml::Error> for ParseError {
    fn from(xml_err: quick_xml::Error) -> Self {
        Self::MalformedXml(MalformedXml { xml_err })
    }
}

impl From<quick_xml::events::attributes::AttrError> for ParseError {
    fn from(att_err: quick_xml::events::attributes::AttrError) -> Self {
        Self::MalformedAttribute(MalformedAttribute { att_err })
    }
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml element: {xml_err}")]
pub struct MalformedXml {
    xml_err: quick_xml::Error,
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml attribute: {att_err}")]
pub struct MalformedAttribute {
    att_err: quick_xml::events::attributes::AttrError,
}

#[derive(Display, Debug)]
#[display(fmt = "unexpected element. Expected `{expected_name}`, got {actual_element}")]
pub struct UnexpectedElement {
    expected_name: String,
    actual_element: EventSummary,
}

impl UnexpectedElement {
    pub(crate) fn new<T: Into<String>>(expected_name: T, actual_element: EventSummary) -> Self {
        Self {
            expected_name: expected_name.into(),
            actual_element,
        }
    }
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "unexpected attribute value for {attribute_name} in {element_name} element: expected {expected_value}, got {actual_value}"
)]
pub struct UnexpectedAttributeValue {
    pub(crate) element_name: String,
    pub(crate) attribute_name: String,
    pub(crate) expected_value: String,
    pub(crate) actual_value: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "element {element_name} is missing the {attribute_name} attribute")]
pub struct MissingAttribute {
    pub(crate) element_name: String,
    pub(crate) attribute_name: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "could not decode data array `{name}`: {reason}")]
pub struct InvalidArray {
    pub(crate) name: String,
    pub(crate) reason: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "piece declares {declared} {what} but contains {actual}")]
pub struct CountMismatch {
    pub(crate) what: &'static str,
    pub(crate) declared: usize,
    pub(crate) actual: usize,
}
