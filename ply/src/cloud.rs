use std::collections::HashMap;
use tracing::debug;
use crate::error::{PlyError, Result};
use crate::header::{PlyHeader, PlySchema};

/// A decoded vertex element: the discovered schema plus all values, record-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    schema: PlySchema,
    data: Vec<f32>,
}

impl PointCloud {
    /// Fails when `data` does not hold a whole number of records.
    pub fn new(schema: PlySchema, data: Vec<f32>) -> Result<Self> {
        let whole_records = if schema.is_empty() {
            data.is_empty()
        } else {
            data.len() % schema.len() == 0
        };
        if !whole_records {
            return Err(PlyError::PartialRecord {
                values: data.len(),
                width: schema.len(),
            });
        }
        Ok(Self { schema, data })
    }

    /// Decodes a binary little-endian ply buffer.
    ///
    /// Reads exactly `vertex_count * properties` floats after the header. Trailing
    /// bytes (other elements) are ignored, missing bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = PlyHeader::parse(bytes)?;
        let actual = bytes.len().saturating_sub(header.payload_offset);
        let expected = header.payload_size().ok_or(PlyError::TruncatedPayload {
            expected: usize::MAX,
            actual,
        })?;

        if actual < expected {
            return Err(PlyError::TruncatedPayload { expected, actual });
        }

        let payload = &bytes[header.payload_offset..header.payload_offset + expected];
        let data = payload
            .chunks_exact(size_of::<f32>())
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        debug!(
            vertex_count = header.vertex_count,
            properties = ?header.schema.names(),
            "decoded ply payload"
        );

        Ok(Self {
            schema: header.schema,
            data,
        })
    }

    /// Encodes back into the binary little-endian layout `from_bytes` reads.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut header = String::from("ply\nformat binary_little_endian 1.0\n");
        header.push_str(&format!("element vertex {}\n", self.len()));
        for name in self.schema.names() {
            header.push_str(&format!("property float {name}\n"));
        }
        header.push_str("end_header\n");

        let mut bytes = header.into_bytes();
        bytes.reserve(self.data.len() * size_of::<f32>());
        for value in &self.data {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    pub fn schema(&self) -> &PlySchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        if self.schema.is_empty() {
            0
        } else {
            self.data.len() / self.schema.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn record(&self, index: usize) -> Option<PlyRecord<'_>> {
        let width = self.schema.len();
        let values = self.data.get(index * width..(index + 1) * width)?;
        Some(PlyRecord {
            schema: &self.schema,
            values,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = PlyRecord<'_>> {
        (0..self.len()).filter_map(move |i| self.record(i))
    }

    /// Keeps only the first `count` records.
    pub fn truncate(&mut self, count: usize) {
        self.data.truncate(count * self.schema.len());
    }

    /// One name to value map per record, in file order.
    pub fn to_maps(&self) -> Vec<HashMap<String, f32>> {
        self.records()
            .map(|record| {
                record
                    .iter()
                    .map(|(name, value)| (name.to_owned(), value))
                    .collect()
            })
            .collect()
    }
}

/// Borrowed view of one record.
#[derive(Debug, Clone, Copy)]
pub struct PlyRecord<'a> {
    schema: &'a PlySchema,
    values: &'a [f32],
}

impl<'a> PlyRecord<'a> {
    pub fn get(&self, name: &str) -> Option<f32> {
        self.schema.offset(name).map(|offset| self.values[offset])
    }

    pub fn values(&self) -> &'a [f32] {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f32)> + use<'a> {
        self.schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ply_bytes(properties: &[&str], count: usize, values: &[f32]) -> Vec<u8> {
        let mut bytes = format!("ply\nformat binary_little_endian 1.0\nelement vertex {count}\n");
        for name in properties {
            bytes.push_str(&format!("property float {name}\n"));
        }
        bytes.push_str("end_header\n");
        let mut bytes = bytes.into_bytes();
        for v in values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn two_records_of_three_floats() {
        let bytes = ply_bytes(&["x", "y", "z"], 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let cloud = PointCloud::from_bytes(&bytes).unwrap();
        let maps = cloud.to_maps();

        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0], HashMap::from([("x".into(), 1.0), ("y".into(), 2.0), ("z".into(), 3.0)]));
        assert_eq!(maps[1], HashMap::from([("x".into(), 4.0), ("y".into(), 5.0), ("z".into(), 6.0)]));
    }

    #[test]
    fn declared_count_beyond_payload_fails() {
        let bytes = ply_bytes(&["x", "y", "z"], 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(
            PointCloud::from_bytes(&bytes),
            Err(PlyError::TruncatedPayload { expected: 36, actual: 24 })
        );
    }

    #[test]
    fn partial_trailing_record_fails() {
        let mut bytes = ply_bytes(&["x", "y"], 2, &[1.0, 2.0, 3.0]);
        bytes.extend_from_slice(&[0, 0]);
        assert!(matches!(
            PointCloud::from_bytes(&bytes),
            Err(PlyError::TruncatedPayload { expected: 16, actual: 14 })
        ));
    }

    #[test]
    fn property_order_defines_field_mapping() {
        let payload = [1.0, 2.0, 3.0];
        let xyz = PointCloud::from_bytes(&ply_bytes(&["x", "y", "z"], 1, &payload)).unwrap();
        let zyx = PointCloud::from_bytes(&ply_bytes(&["z", "y", "x"], 1, &payload)).unwrap();

        assert_eq!(xyz.record(0).unwrap().get("x"), Some(1.0));
        assert_eq!(zyx.record(0).unwrap().get("x"), Some(3.0));
        assert_eq!(zyx.record(0).unwrap().get("z"), Some(1.0));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = ply_bytes(&["x"], 1, &[8.0]);
        bytes.extend_from_slice(&[1, 2, 3, 4, 5]);
        let cloud = PointCloud::from_bytes(&bytes).unwrap();
        assert_eq!(cloud.len(), 1);
        assert_eq!(cloud.record(0).unwrap().values(), &[8.0]);
        assert!(cloud.record(1).is_none());
    }

    #[test]
    fn encoding_reads_back() {
        let schema = PlySchema::new(["a", "b"]).unwrap();
        let cloud = PointCloud::new(schema, vec![0.5, -1.0, 2.0, 1e-3]).unwrap();
        let decoded = PointCloud::from_bytes(&cloud.to_bytes()).unwrap();
        assert_eq!(decoded, cloud);
    }

    #[test]
    fn ragged_values_are_an_error() {
        let schema = PlySchema::new(["x", "y"]).unwrap();
        assert_eq!(
            PointCloud::new(schema.clone(), vec![1.0, 2.0, 3.0]),
            Err(PlyError::PartialRecord { values: 3, width: 2 })
        );
        assert!(PointCloud::new(PlySchema::default(), vec![1.0]).is_err());
        assert!(PointCloud::new(schema, Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn vertex_fields_never_come_from_other_elements() {
        let mut bytes = b"ply\nformat binary_little_endian 1.0\nelement camera 1\nproperty float fx\nelement vertex 1\nproperty float x\nend_header\n".to_vec();
        bytes.extend_from_slice(&7.0f32.to_le_bytes());
        bytes.extend_from_slice(&3.0f32.to_le_bytes());

        assert_eq!(
            PointCloud::from_bytes(&bytes),
            Err(PlyError::ElementBeforeVertex("camera".into()))
        );
    }

    #[test]
    fn truncate_keeps_leading_records() {
        let bytes = ply_bytes(&["x"], 3, &[1.0, 2.0, 3.0]);
        let mut cloud = PointCloud::from_bytes(&bytes).unwrap();
        cloud.truncate(2);
        assert_eq!(cloud.len(), 2);
        let xs: Vec<_> = cloud.records().filter_map(|r| r.get("x")).collect();
        assert_eq!(xs, vec![1.0, 2.0]);
    }
}
