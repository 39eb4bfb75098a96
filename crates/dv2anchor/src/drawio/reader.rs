//! draw.io XML reader
//!
//! Event-driven parser built on quick-xml. Handles:
//! - `<mxfile>` with one or more `<diagram>` pages, or a bare `<mxGraphModel>`
//! - compressed page payloads (base64, raw deflate, URI-encoded XML)
//! - `<UserObject>`/`<object>` wrappers, whose `id` and `label` belong to the
//!   wrapped cell
//! - `<mxGeometry>` with a nested `<mxRectangle as="alternateBounds">`
//!
//! Whitespace-only text is indentation and is skipped. Edge waypoints
//! (`<Array>`/`<mxPoint>`) are not modeled.

use std::io::Read;
use std::str;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::DeflateDecoder;
use percent_encoding::percent_decode_str;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, trace};

use super::document::{Cell, DiagramDocument, Geometry, GraphModel, Page};
use crate::core::DocumentError;

type Attributes = Vec<(String, String)>;

/// Parse a draw.io document from XML text
pub fn read_document(xml: &str) -> Result<DiagramDocument, DocumentError> {
    let parsed = parse_events(xml)?;
    if let Some(document) = parsed.document {
        debug!(pages = document.pages.len(), "Read draw.io file");
        return Ok(document);
    }
    if let Some(model) = parsed.bare_model {
        debug!(cells = model.cells.len(), "Read bare graph model");
        return Ok(DiagramDocument {
            attributes: Vec::new(),
            pages: vec![Page {
                id: None,
                name: None,
                model,
            }],
        });
    }
    Err(DocumentError::Structure(
        "no <mxfile> or <mxGraphModel> root element found".into(),
    ))
}

#[derive(Default)]
struct Parsed {
    document: Option<DiagramDocument>,
    bare_model: Option<GraphModel>,
}

#[derive(Default)]
struct OpenPage {
    page: Page,
    has_model: bool,
    payload: String,
}

#[derive(Default)]
struct State {
    document: Option<DiagramDocument>,
    page: Option<OpenPage>,
    model: Option<GraphModel>,
    bare_model: Option<GraphModel>,
    cell: Option<usize>,
    in_geometry: bool,
    user_object: Option<(Option<String>, Option<String>)>,
}

fn parse_events(xml: &str) -> Result<Parsed, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut state = State::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => state.open(&e, true)?,
            Event::Empty(e) => state.open(&e, false)?,
            Event::Text(t) => {
                let text = t.decode()?;
                state.text(&text);
            }
            Event::CData(c) => {
                let text = c.decode()?;
                state.text(&text);
            }
            Event::End(e) => state.close(&e)?,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(Parsed {
        document: state.document,
        bare_model: state.bare_model,
    })
}

impl State {
    fn open(&mut self, e: &BytesStart<'_>, has_children: bool) -> Result<(), DocumentError> {
        let qname = e.name();
        let name = element_name(qname.as_ref())?;
        match name {
            "mxfile" => {
                self.document = Some(DiagramDocument {
                    attributes: attributes(e)?,
                    pages: Vec::new(),
                });
            }
            "diagram" => {
                let attrs = attributes(e)?;
                let page = Page {
                    id: lookup(&attrs, "id"),
                    name: lookup(&attrs, "name"),
                    model: GraphModel::default(),
                };
                if has_children {
                    self.page = Some(OpenPage {
                        page,
                        ..OpenPage::default()
                    });
                } else {
                    self.push_page(page)?;
                }
            }
            "mxGraphModel" => {
                let model = GraphModel {
                    attributes: attributes(e)?,
                    cells: Vec::new(),
                };
                if has_children {
                    self.model = Some(model);
                } else {
                    self.finish_model(model);
                }
            }
            "UserObject" | "object" => {
                let attrs = attributes(e)?;
                self.user_object = Some((lookup(&attrs, "id"), lookup(&attrs, "label")));
            }
            "mxCell" => {
                let cell = self.parse_cell(e)?;
                let model = self.model.as_mut().ok_or_else(|| {
                    DocumentError::Structure("mxCell outside mxGraphModel".into())
                })?;
                trace!(id = %cell.id, "Read cell");
                model.cells.push(cell);
                if has_children {
                    self.cell = Some(model.cells.len() - 1);
                }
            }
            "mxGeometry" => {
                let geometry = parse_geometry(e)?;
                let cell = self.current_cell()?;
                cell.geometry = Some(geometry);
                self.in_geometry = has_children;
            }
            "mxRectangle" if self.in_geometry => {
                let attrs = attributes(e)?;
                if lookup(&attrs, "as").as_deref() == Some("alternateBounds") {
                    let width = parse_number(&attrs, "width")?.unwrap_or(0.0);
                    let height = parse_number(&attrs, "height")?.unwrap_or(0.0);
                    if let Some(geometry) = self.current_cell()?.geometry.as_mut() {
                        geometry.alternate_bounds = Some((width, height));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, e: &BytesEnd<'_>) -> Result<(), DocumentError> {
        let qname = e.name();
        let name = element_name(qname.as_ref())?;
        match name {
            "mxGraphModel" => {
                let model = self.model.take().ok_or_else(|| {
                    DocumentError::Structure("closing mxGraphModel but none open".into())
                })?;
                self.finish_model(model);
            }
            "diagram" => {
                let open = self.page.take().ok_or_else(|| {
                    DocumentError::Structure("closing diagram but none open".into())
                })?;
                let mut page = open.page;
                if !open.has_model && !open.payload.trim().is_empty() {
                    page.model = decode_payload(&open.payload)?;
                }
                self.push_page(page)?;
            }
            "UserObject" | "object" => self.user_object = None,
            "mxCell" => self.cell = None,
            "mxGeometry" => self.in_geometry = false,
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if text.trim().is_empty() || self.model.is_some() {
            return;
        }
        if let Some(open) = self.page.as_mut() {
            if !open.has_model {
                open.payload.push_str(text);
            }
        }
    }

    fn finish_model(&mut self, model: GraphModel) {
        match self.page.as_mut() {
            Some(open) => {
                open.page.model = model;
                open.has_model = true;
            }
            None => self.bare_model = Some(model),
        }
    }

    fn push_page(&mut self, page: Page) -> Result<(), DocumentError> {
        let document = self
            .document
            .as_mut()
            .ok_or_else(|| DocumentError::Structure("diagram outside mxfile".into()))?;
        document.pages.push(page);
        Ok(())
    }

    fn current_cell(&mut self) -> Result<&mut Cell, DocumentError> {
        let idx = self.cell.ok_or_else(|| {
            DocumentError::Structure("mxGeometry found but no current mxCell".into())
        })?;
        let model = self
            .model
            .as_mut()
            .ok_or_else(|| DocumentError::Structure("mxGeometry outside mxGraphModel".into()))?;
        Ok(&mut model.cells[idx])
    }

    fn parse_cell(&self, e: &BytesStart<'_>) -> Result<Cell, DocumentError> {
        let attrs = attributes(e)?;
        let (fallback_id, fallback_label) = match &self.user_object {
            Some((id, label)) => (id.clone(), label.clone()),
            None => (None, None),
        };

        let id = lookup(&attrs, "id")
            .or(fallback_id)
            .ok_or(DocumentError::MissingAttr("mxCell@id"))?;

        let mut cell = Cell::new(id);
        for (key, value) in attrs {
            match key.as_str() {
                "id" => {}
                "parent" => cell.parent = Some(value),
                "value" => cell.value = Some(value),
                "style" => cell.style = Some(value),
                "vertex" => cell.vertex = parse_bool(&value),
                "edge" => cell.edge = parse_bool(&value),
                "source" => cell.source = Some(value),
                "target" => cell.target = Some(value),
                _ => cell.extra.push((key, value)),
            }
        }
        if cell.value.is_none() {
            cell.value = fallback_label;
        }
        Ok(cell)
    }
}

fn parse_geometry(e: &BytesStart<'_>) -> Result<Geometry, DocumentError> {
    let attrs = attributes(e)?;
    Ok(Geometry {
        x: parse_number(&attrs, "x")?,
        y: parse_number(&attrs, "y")?,
        width: parse_number(&attrs, "width")?,
        height: parse_number(&attrs, "height")?,
        relative: lookup(&attrs, "relative").is_some_and(|v| parse_bool(&v)),
        alternate_bounds: None,
    })
}

/// Inflate a compressed `<diagram>` body and parse the contained model
fn decode_payload(payload: &str) -> Result<GraphModel, DocumentError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let deflated = STANDARD.decode(compact)?;
    let mut decoder = DeflateDecoder::new(&deflated[..]);
    let mut inflated = Vec::new();
    decoder.read_to_end(&mut inflated)?;
    let encoded = str::from_utf8(&inflated)?;
    let xml = percent_decode_str(encoded).decode_utf8()?;
    debug!(bytes = xml.len(), "Inflated compressed diagram payload");

    let parsed = parse_events(&xml)?;
    parsed.bare_model.ok_or_else(|| {
        DocumentError::Structure("compressed diagram holds no <mxGraphModel>".into())
    })
}

fn element_name(raw: &[u8]) -> Result<&str, DocumentError> {
    Ok(str::from_utf8(raw)?)
}

fn attributes(e: &BytesStart<'_>) -> Result<Attributes, DocumentError> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.to_string();
        out.push((key, value));
    }
    Ok(out)
}

fn lookup(attrs: &Attributes, key: &str) -> Option<String> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "True")
}

fn parse_number(attrs: &Attributes, field: &'static str) -> Result<Option<f64>, DocumentError> {
    let Some(raw) = attrs.iter().find(|(k, _)| k == field).map(|(_, v)| v) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| DocumentError::InvalidNumber {
            field,
            value: raw.clone(),
        })
}
