//! draw.io XML writer
//!
//! Serializes a [`DiagramDocument`] as an uncompressed `<mxfile>`. Output is
//! a pure function of the document: attribute order follows the model and
//! numbers are printed in their shortest form (`180`, not `180.0`).

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use super::document::{Cell, DiagramDocument, Geometry, Page};
use crate::core::DocumentError;

type XmlWriter = Writer<Vec<u8>>;

/// Serialize a document to draw.io XML
pub fn write_document(document: &DiagramDocument) -> Result<String, DocumentError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut mxfile = BytesStart::new("mxfile");
    for (key, value) in &document.attributes {
        mxfile.push_attribute((key.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(mxfile))?;
    for page in &document.pages {
        write_page(&mut writer, page)?;
    }
    writer.write_event(Event::End(BytesEnd::new("mxfile")))?;

    let bytes = writer.into_inner();
    String::from_utf8(bytes).map_err(|e| DocumentError::Utf8(e.utf8_error()))
}

fn write_page(writer: &mut XmlWriter, page: &Page) -> Result<(), DocumentError> {
    let mut diagram = BytesStart::new("diagram");
    if let Some(id) = &page.id {
        diagram.push_attribute(("id", id.as_str()));
    }
    if let Some(name) = &page.name {
        diagram.push_attribute(("name", name.as_str()));
    }
    writer.write_event(Event::Start(diagram))?;

    let mut model = BytesStart::new("mxGraphModel");
    for (key, value) in &page.model.attributes {
        model.push_attribute((key.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(model))?;
    writer.write_event(Event::Start(BytesStart::new("root")))?;
    for cell in &page.model.cells {
        write_cell(writer, cell)?;
    }
    writer.write_event(Event::End(BytesEnd::new("root")))?;
    writer.write_event(Event::End(BytesEnd::new("mxGraphModel")))?;

    writer.write_event(Event::End(BytesEnd::new("diagram")))?;
    Ok(())
}

fn write_cell(writer: &mut XmlWriter, cell: &Cell) -> Result<(), DocumentError> {
    let mut element = BytesStart::new("mxCell");
    element.push_attribute(("id", cell.id.as_str()));
    if let Some(value) = &cell.value {
        element.push_attribute(("value", value.as_str()));
    }
    if let Some(style) = &cell.style {
        element.push_attribute(("style", style.as_str()));
    }
    if cell.vertex {
        element.push_attribute(("vertex", "1"));
    }
    if cell.edge {
        element.push_attribute(("edge", "1"));
    }
    if let Some(parent) = &cell.parent {
        element.push_attribute(("parent", parent.as_str()));
    }
    if let Some(source) = &cell.source {
        element.push_attribute(("source", source.as_str()));
    }
    if let Some(target) = &cell.target {
        element.push_attribute(("target", target.as_str()));
    }
    for (key, value) in &cell.extra {
        element.push_attribute((key.as_str(), value.as_str()));
    }

    match &cell.geometry {
        Some(geometry) => {
            writer.write_event(Event::Start(element))?;
            write_geometry(writer, geometry)?;
            writer.write_event(Event::End(BytesEnd::new("mxCell")))?;
        }
        None => writer.write_event(Event::Empty(element))?,
    }
    Ok(())
}

fn write_geometry(writer: &mut XmlWriter, geometry: &Geometry) -> Result<(), DocumentError> {
    let mut element = BytesStart::new("mxGeometry");
    let fields = [
        ("x", geometry.x),
        ("y", geometry.y),
        ("width", geometry.width),
        ("height", geometry.height),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            element.push_attribute((key, format_number(value).as_str()));
        }
    }
    if geometry.relative {
        element.push_attribute(("relative", "1"));
    }
    element.push_attribute(("as", "geometry"));

    match geometry.alternate_bounds {
        Some((width, height)) => {
            writer.write_event(Event::Start(element))?;
            let mut rect = BytesStart::new("mxRectangle");
            rect.push_attribute(("width", format_number(width).as_str()));
            rect.push_attribute(("height", format_number(height).as_str()));
            rect.push_attribute(("as", "alternateBounds"));
            writer.write_event(Event::Empty(rect))?;
            writer.write_event(Event::End(BytesEnd::new("mxGeometry")))?;
        }
        None => writer.write_event(Event::Empty(element))?,
    }
    Ok(())
}

/// Shortest decimal text for a coordinate
fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoids "-0"
        return "0".to_string();
    }
    value.to_string()
}
