//! Streaming KML walker.
//!
//! Reads the document as a flat stream of quick-xml events and keeps only the
//! state needed for the current placemark plus the stack of open containers,
//! so feeds with many thousands of placemarks are walked in constant memory.

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;
use uuid::Uuid;

use super::description::parse_attributes;
use super::geometry::coords_to_polygon;
use crate::error::{IngestError, Result};
use crate::models::Area;

/// Elements the walker reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    /// `Document` or `Folder`
    Container,
    Placemark,
    Name,
    Coordinates,
    Description,
    InnerBoundary,
    Other,
}

impl Tag {
    fn from_local_name(name: &[u8]) -> Self {
        let is = |known: &[u8]| name.eq_ignore_ascii_case(known);

        if is(b"document") || is(b"folder") {
            Tag::Container
        } else if is(b"placemark") {
            Tag::Placemark
        } else if is(b"name") {
            Tag::Name
        } else if is(b"coordinates") {
            Tag::Coordinates
        } else if is(b"description") {
            Tag::Description
        } else if is(b"innerboundaryis") {
            Tag::InnerBoundary
        } else {
            Tag::Other
        }
    }
}

/// Text fields recorded inside a placemark or container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Coordinates,
    Description,
}

/// Names of the currently open `Document`/`Folder` elements, outermost first.
///
/// Each level is pushed when its element opens and popped when it closes, so
/// the stack mirrors nesting depth even for unnamed or empty folders.
#[derive(Debug, Default)]
pub struct FolderStack {
    levels: Vec<Option<String>>,
}

impl FolderStack {
    pub fn push(&mut self) {
        self.levels.push(None);
    }

    pub fn pop(&mut self) {
        self.levels.pop();
    }

    /// Name the innermost open level; only its first `<name>` counts
    pub fn set_name(&mut self, name: String) {
        if let Some(level) = self.levels.last_mut() {
            if level.is_none() {
                *level = Some(name);
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Class inherited by placemarks without an explicit one: the second
    /// named level. Unnamed containers do not count.
    pub fn default_class(&self) -> Option<&str> {
        self.levels
            .iter()
            .flatten()
            .nth(1)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }
}

/// Raw text collected for the placemark being walked
#[derive(Debug, Default)]
struct PlacemarkAccumulator {
    name: Option<String>,
    coordinates: Option<String>,
    description: Option<String>,
}

/// Counters reported at the end of a walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub placemarks: usize,
    pub areas: usize,
    pub degenerate: usize,
}

/// Single-pass placemark extractor for one document
pub struct DocumentWalker {
    import_id: Uuid,
    folders: FolderStack,
    placemark: Option<PlacemarkAccumulator>,
    recording: Option<Field>,
    text: String,
    inner_boundary_depth: usize,
    stats: WalkStats,
}

impl DocumentWalker {
    pub fn new(import_id: Uuid) -> Self {
        Self {
            import_id,
            folders: FolderStack::default(),
            placemark: None,
            recording: None,
            text: String::new(),
            inner_boundary_depth: 0,
            stats: WalkStats::default(),
        }
    }

    /// Walk the whole document, handing every extracted area to `emit` in
    /// the order its placemark closes.
    ///
    /// Any parse error aborts the walk with `MalformedDocument`.
    pub fn walk<R, F>(mut self, source: R, mut emit: F) -> Result<WalkStats>
    where
        R: BufRead,
        F: FnMut(Area),
    {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.trim_text(true);
        config.expand_empty_elements = true;

        let mut buf = Vec::with_capacity(8192);

        loop {
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(source) => {
                    return Err(IngestError::MalformedDocument {
                        position: reader.buffer_position() as u64,
                        source,
                    })
                }
            };

            match event {
                Event::Start(ref e) => {
                    if self.recording == Some(Field::Description) {
                        let raw = String::from_utf8_lossy(&**e);
                        self.text.push('<');
                        self.text.push_str(&raw);
                        self.text.push('>');
                    } else {
                        self.open(Tag::from_local_name(e.local_name().as_ref()));
                    }
                }
                Event::End(ref e) => {
                    let tag = Tag::from_local_name(e.local_name().as_ref());
                    if self.recording == Some(Field::Description) && tag != Tag::Description {
                        let name = e.name();
                        let raw = String::from_utf8_lossy(name.as_ref());
                        self.text.push_str("</");
                        self.text.push_str(&raw);
                        self.text.push('>');
                    } else if let Some(area) = self.close(tag) {
                        emit(area);
                    }
                }
                Event::Text(ref e) => {
                    if self.recording.is_some() {
                        let text = e.unescape().map_err(|source| {
                            IngestError::MalformedDocument {
                                position: reader.buffer_position() as u64,
                                source,
                            }
                        })?;
                        self.append_text(&text);
                    }
                }
                Event::CData(ref e) => {
                    if self.recording.is_some() {
                        let text = String::from_utf8_lossy(&**e);
                        self.append_text(&text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }

            buf.clear();
        }

        debug!(
            "Walked {} placemarks: {} areas, {} degenerate",
            self.stats.placemarks, self.stats.areas, self.stats.degenerate
        );

        Ok(self.stats)
    }

    fn open(&mut self, tag: Tag) {
        match tag {
            Tag::Container => self.folders.push(),
            Tag::Placemark => {
                self.placemark = Some(PlacemarkAccumulator::default());
                self.inner_boundary_depth = 0;
                self.stats.placemarks += 1;
            }
            Tag::Name => self.start_recording(Field::Name),
            Tag::Coordinates => self.start_recording(Field::Coordinates),
            Tag::Description => self.start_recording(Field::Description),
            Tag::InnerBoundary => self.inner_boundary_depth += 1,
            Tag::Other => {}
        }
    }

    fn close(&mut self, tag: Tag) -> Option<Area> {
        match tag {
            Tag::Container => {
                self.folders.pop();
                None
            }
            Tag::Placemark => self.finish_placemark(),
            Tag::Name => {
                let text = self.stop_recording();
                match self.placemark.as_mut() {
                    Some(placemark) => placemark.name = Some(text),
                    None => self.folders.set_name(text),
                }
                None
            }
            Tag::Coordinates => {
                let text = self.stop_recording();
                if self.inner_boundary_depth == 0 {
                    if let Some(placemark) = self.placemark.as_mut() {
                        placemark.coordinates = Some(text);
                    }
                }
                None
            }
            Tag::Description => {
                let text = self.stop_recording();
                if let Some(placemark) = self.placemark.as_mut() {
                    placemark.description = Some(text);
                }
                None
            }
            Tag::InnerBoundary => {
                self.inner_boundary_depth = self.inner_boundary_depth.saturating_sub(1);
                None
            }
            Tag::Other => None,
        }
    }

    fn start_recording(&mut self, field: Field) {
        self.recording = Some(field);
        self.text.clear();
    }

    fn stop_recording(&mut self) -> String {
        self.recording = None;
        std::mem::take(&mut self.text)
    }

    /// Append a text segment with whitespace runs collapsed; segments are
    /// joined by a single space
    fn append_text(&mut self, segment: &str) {
        for word in segment.split_whitespace() {
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            self.text.push_str(word);
        }
    }

    fn finish_placemark(&mut self) -> Option<Area> {
        let placemark = self.placemark.take()?;
        self.inner_boundary_depth = 0;

        let coordinates = placemark.coordinates.as_deref().unwrap_or("");
        let boundary = match coords_to_polygon(coordinates) {
            Some(polygon) => polygon,
            None => {
                self.stats.degenerate += 1;
                debug!(
                    "Skipping placemark {:?}: no usable ring",
                    placemark.name.as_deref().unwrap_or("<unnamed>")
                );
                return None;
            }
        };

        let attributes = parse_attributes(placemark.description.as_deref());
        let class = attributes
            .class
            .filter(|class| !class.is_empty())
            .or_else(|| self.folders.default_class().map(str::to_string));

        self.stats.areas += 1;

        Some(Area {
            import_id: self.import_id,
            name: placemark.name,
            class,
            floor: attributes.floor,
            ceiling: attributes.ceiling,
            boundary,
        })
    }
}
