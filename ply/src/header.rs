use std::collections::HashMap;
use crate::error::{PlyError, Result};

/// Headers are expected to fit in this many leading bytes.
pub const HEADER_SEARCH_LIMIT: usize = 10_000;

const END_HEADER: &[u8] = b"end_header";
const BINARY_LE: &str = "binary_little_endian";

/// Ordered list of the float properties of the vertex element.
///
/// The position of a property in the list is its offset inside a record, so the
/// name to offset map is built once here and never consulted per value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlySchema {
    properties: Vec<String>,
    offsets: HashMap<String, usize>,
}

impl PlySchema {
    pub fn new<S: Into<String>>(properties: impl IntoIterator<Item = S>) -> Result<Self> {
        let mut schema = Self::default();
        for name in properties {
            schema.push(name.into())?;
        }
        Ok(schema)
    }

    fn push(&mut self, name: String) -> Result<()> {
        if self.offsets.contains_key(&name) {
            return Err(PlyError::DuplicateProperty(name));
        }
        self.offsets.insert(name.clone(), self.properties.len());
        self.properties.push(name);
        Ok(())
    }

    pub fn offset(&self, name: &str) -> Option<usize> {
        self.offsets.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Size in bytes of one record.
    pub fn record_size(&self) -> usize {
        self.properties.len() * size_of::<f32>()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlyHeader {
    pub vertex_count: usize,
    pub schema: PlySchema,
    /// Byte offset of the first payload byte.
    pub payload_offset: usize,
}

impl PlyHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let prefix = &bytes[..bytes.len().min(HEADER_SEARCH_LIMIT)];
        let end = prefix
            .windows(END_HEADER.len())
            .position(|window| window == END_HEADER)
            .ok_or(PlyError::MissingHeaderEnd(HEADER_SEARCH_LIMIT))?;

        let mut payload_offset = end + END_HEADER.len();
        if bytes.get(payload_offset) == Some(&b'\r') {
            payload_offset += 1;
        }
        if bytes.get(payload_offset) == Some(&b'\n') {
            payload_offset += 1;
        }

        let text = std::str::from_utf8(&bytes[..end]).map_err(|_| PlyError::InvalidHeaderText)?;

        let mut vertex_count = None;
        let mut in_vertex_element = false;
        let mut schema = PlySchema::default();

        for line in text.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                ["format", format, ..] if *format != BINARY_LE => {
                    return Err(PlyError::UnsupportedFormat(format.to_string()));
                }
                ["element", "vertex", count, ..] => {
                    vertex_count = Some(parse_count(count)?);
                    in_vertex_element = true;
                }
                ["element", "vertex"] => return Err(PlyError::InvalidVertexCount(String::new())),
                // Vertex data is read from the start of the payload, so nothing may come before it.
                ["element", name, count, ..] if vertex_count.is_none() && *count != "0" => {
                    return Err(PlyError::ElementBeforeVertex(name.to_string()));
                }
                ["element", ..] => in_vertex_element = false,
                ["property", "float", name, ..] if in_vertex_element => {
                    schema.push(name.to_string())?;
                }
                ["property", ty, rest @ ..] if in_vertex_element => {
                    return Err(PlyError::UnsupportedProperty {
                        ty: ty.to_string(),
                        name: rest.last().unwrap_or(&"").to_string(),
                    });
                }
                _ => {}
            }
        }

        Ok(Self {
            vertex_count: vertex_count.ok_or(PlyError::MissingVertexCount)?,
            schema,
            payload_offset,
        })
    }

    /// Number of payload bytes the header promises.
    pub fn payload_size(&self) -> Option<usize> {
        self.vertex_count.checked_mul(self.schema.record_size())
    }
}

fn parse_count(s: &str) -> Result<usize> {
    s.parse()
        .map_err(|_| PlyError::InvalidVertexCount(s.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_discovers_properties_in_order() {
        let bytes = b"ply\nformat binary_little_endian 1.0\nelement vertex 7\nproperty float z\nproperty float x\nend_header\n";
        let header = PlyHeader::parse(bytes).unwrap();

        assert_eq!(header.vertex_count, 7);
        assert_eq!(header.schema.names(), &["z", "x"]);
        assert_eq!(header.schema.offset("x"), Some(1));
        assert_eq!(header.schema.offset("y"), None);
        assert_eq!(header.payload_offset, bytes.len());
    }

    #[test]
    fn crlf_after_terminator_is_skipped() {
        let bytes = b"ply\r\nelement vertex 0\r\nproperty float x\r\nend_header\r\n";
        let header = PlyHeader::parse(bytes).unwrap();
        assert_eq!(header.payload_offset, bytes.len());
        assert_eq!(header.schema.names(), &["x"]);
    }

    #[test]
    fn missing_terminator() {
        let bytes = b"ply\nelement vertex 1\nproperty float x\n";
        assert_eq!(
            PlyHeader::parse(bytes),
            Err(PlyError::MissingHeaderEnd(HEADER_SEARCH_LIMIT))
        );
    }

    #[test]
    fn terminator_beyond_search_limit() {
        let mut bytes = b"ply\ncomment ".to_vec();
        bytes.extend(std::iter::repeat_n(b'a', HEADER_SEARCH_LIMIT));
        bytes.extend_from_slice(b"\nelement vertex 0\nend_header\n");
        assert!(matches!(PlyHeader::parse(&bytes), Err(PlyError::MissingHeaderEnd(_))));
    }

    #[test]
    fn non_numeric_vertex_count() {
        let bytes = b"ply\nelement vertex many\nproperty float x\nend_header\n";
        assert_eq!(
            PlyHeader::parse(bytes),
            Err(PlyError::InvalidVertexCount("many".into()))
        );
    }

    #[test]
    fn missing_vertex_element() {
        let bytes = b"ply\nformat binary_little_endian 1.0\nend_header\n";
        assert_eq!(PlyHeader::parse(bytes), Err(PlyError::MissingVertexCount));
    }

    #[test]
    fn ascii_payloads_are_rejected() {
        let bytes = b"ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nend_header\n1.0\n";
        assert_eq!(
            PlyHeader::parse(bytes),
            Err(PlyError::UnsupportedFormat("ascii".into()))
        );
    }

    #[test]
    fn non_float_vertex_properties_are_rejected() {
        let bytes = b"ply\nelement vertex 1\nproperty uchar red\nend_header\n";
        assert_eq!(
            PlyHeader::parse(bytes),
            Err(PlyError::UnsupportedProperty { ty: "uchar".into(), name: "red".into() })
        );
    }

    #[test]
    fn properties_of_other_elements_are_ignored() {
        let bytes = b"ply\nelement vertex 1\nproperty float x\nelement face 0\nproperty list uchar int vertex_indices\nend_header\n";
        let header = PlyHeader::parse(bytes).unwrap();
        assert_eq!(header.schema.names(), &["x"]);
    }

    #[test]
    fn elements_ahead_of_vertex_are_rejected() {
        let bytes = b"ply\nelement camera 1\nproperty float fx\nelement vertex 1\nproperty float x\nend_header\n";
        assert_eq!(
            PlyHeader::parse(bytes),
            Err(PlyError::ElementBeforeVertex("camera".into()))
        );

        let empty_first = b"ply\nelement camera 0\nproperty float fx\nelement vertex 1\nproperty float x\nend_header\n";
        assert_eq!(PlyHeader::parse(empty_first).unwrap().schema.names(), &["x"]);
    }

    #[test]
    fn duplicate_properties_are_rejected() {
        let bytes = b"ply\nelement vertex 1\nproperty float x\nproperty float x\nend_header\n";
        assert_eq!(
            PlyHeader::parse(bytes),
            Err(PlyError::DuplicateProperty("x".into()))
        );
    }
}
