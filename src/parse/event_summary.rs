use quick_xml::events::Event;

use std::fmt;

/// A short, owned description of an xml event used in error messages
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EventSummary {
    name: Option<String>,
    e_type: &'static str,
}

impl fmt::Display for EventSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "element {name} with type {}", self.e_type),
            None => write!(f, "unnamed element with type {}", self.e_type),
        }
    }
}

impl EventSummary {
    pub(crate) fn new(e: &Event) -> Self {
        let name = match e {
            Event::Start(s) | Event::Empty(s) => Some(s.name()),
            Event::End(s) => Some(s.name()),
            _ => None,
        }
        .map(|name| String::from_utf8_lossy(name.as_ref()).into_owned());

        Self {
            name,
            e_type: event_type(e),
        }
    }

    pub(crate) fn eof() -> Self {
        Self {
            name: None,
            e_type: "eof",
        }
    }
}

fn event_type(e: &Event) -> &'static str {
    match e {
        Event::Start(_) => "start",
        Event::End(_) => "end",
        Event::Empty(_) => "empty",
        Event::Text(_) => "text",
        Event::Comment(_) => "comment",
        Event::CData(_) => "cdata",
        Event::Decl(_) => "declaration",
        Event::PI(_) => "processing instruction",
        Event::DocType(_) => "doctype",
        Event::Eof => "eof",
    }
}
