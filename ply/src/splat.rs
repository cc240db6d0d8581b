use glam::{Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use tracing::warn;
use crate::cloud::PointCloud;
use crate::error::{PlyError, Result};
use crate::header::PlySchema;

#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// What to do with splats whose parameters contain NaN or infinities.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Skip the splat and keep loading.
    #[default]
    Drop,
    /// Fail the whole load.
    Reject,
}

/// One gaussian as stored in the file.
///
/// Scales are kept log-encoded and opacity as a logit; use [`SplatRecord::scale`] and
/// [`SplatRecord::opacity`] for the activated values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplatRecord {
    pub position: Vec3,
    /// Unit quaternion.
    pub rotation: Quat,
    pub log_scale: Vec3,
    /// Zeroth order SH coefficients.
    pub color_dc: Vec3,
    pub opacity_logit: f32,
}

impl SplatRecord {
    pub fn scale(&self) -> Vec3 {
        self.log_scale.exp()
    }

    pub fn opacity(&self) -> f32 {
        sigmoid(self.opacity_logit)
    }
}

const POSITION: [&str; 3] = ["x", "y", "z"];
// Scalar first, rot_0 is w.
const ROTATION: [&str; 4] = ["rot_0", "rot_1", "rot_2", "rot_3"];
const SCALE: [&str; 3] = ["scale_0", "scale_1", "scale_2"];
const COLOR_DC: [&str; 3] = ["f_dc_0", "f_dc_1", "f_dc_2"];
const OPACITY: &str = "opacity";

/// Record offsets of the fields a [`SplatRecord`] is made of, resolved once per schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplatLayout {
    position: [usize; 3],
    rotation: [usize; 4],
    scale: [usize; 3],
    color_dc: [usize; 3],
    opacity: usize,
}

impl SplatLayout {
    pub fn resolve(schema: &PlySchema) -> Result<Self> {
        Ok(Self {
            position: resolve_all(schema, POSITION)?,
            rotation: resolve_all(schema, ROTATION)?,
            scale: resolve_all(schema, SCALE)?,
            color_dc: resolve_all(schema, COLOR_DC)?,
            opacity: resolve(schema, OPACITY)?,
        })
    }

    /// Name of the first splat field in `values` that is non-finite, or whose activated
    /// value is. Log scales past ~88.7 overflow `exp`.
    fn non_finite_field(&self, values: &[f32]) -> Option<&'static str> {
        let fields = self
            .position
            .iter()
            .zip(POSITION)
            .chain(self.rotation.iter().zip(ROTATION))
            .chain(self.scale.iter().zip(SCALE))
            .chain(self.color_dc.iter().zip(COLOR_DC))
            .chain(std::iter::once((&self.opacity, OPACITY)));

        fields
            .into_iter()
            .find(|(offset, _)| !values[**offset].is_finite())
            .or_else(|| {
                self.scale
                    .iter()
                    .zip(SCALE)
                    .find(|(offset, _)| !values[**offset].exp().is_finite())
            })
            .map(|(_, name)| name)
    }

    pub fn read(&self, values: &[f32]) -> SplatRecord {
        let get = |offsets: &[usize]| -> Vec3 {
            Vec3::new(values[offsets[0]], values[offsets[1]], values[offsets[2]])
        };
        let [w, x, y, z] = self.rotation.map(|offset| values[offset]);
        let raw = Vec4::new(x, y, z, w);
        // Divide by the largest component first so the squared length cannot overflow.
        let largest = raw.abs().max_element();
        let rotation = if largest > 0.0 {
            Quat::from_vec4(raw / largest).normalize()
        } else {
            Quat::IDENTITY
        };

        SplatRecord {
            position: get(&self.position),
            rotation,
            log_scale: get(&self.scale),
            color_dc: get(&self.color_dc),
            opacity_logit: values[self.opacity],
        }
    }
}

fn resolve(schema: &PlySchema, name: &'static str) -> Result<usize> {
    schema.offset(name).ok_or(PlyError::MissingProperty(name))
}

fn resolve_all<const N: usize>(schema: &PlySchema, names: [&'static str; N]) -> Result<[usize; N]> {
    let mut offsets = [0; N];
    for (offset, name) in offsets.iter_mut().zip(names) {
        *offset = resolve(schema, name)?;
    }
    Ok(offsets)
}

impl PointCloud {
    /// Typed splats of the first `limit` records (all when `None`).
    pub fn splats(&self, limit: Option<usize>, policy: DegeneratePolicy) -> Result<Vec<SplatRecord>> {
        let layout = SplatLayout::resolve(self.schema())?;
        let count = limit.map_or(self.len(), |limit| limit.min(self.len()));

        let mut splats = Vec::with_capacity(count);
        let mut dropped = 0;

        for (index, record) in self.records().take(count).enumerate() {
            let values = record.values();
            if let Some(field) = layout.non_finite_field(values) {
                match policy {
                    DegeneratePolicy::Drop => {
                        dropped += 1;
                        continue;
                    }
                    DegeneratePolicy::Reject => {
                        return Err(PlyError::NonFinite {
                            index,
                            field: field.to_owned(),
                        });
                    }
                }
            }
            splats.push(layout.read(values));
        }

        if dropped > 0 {
            warn!(dropped, "dropped splats with non-finite parameters");
        }

        Ok(splats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 14] = [
        "x", "y", "z", "f_dc_0", "f_dc_1", "f_dc_2", "opacity", "scale_0", "scale_1", "scale_2",
        "rot_0", "rot_1", "rot_2", "rot_3",
    ];

    fn splat_values(position: [f32; 3], opacity: f32) -> Vec<f32> {
        let mut values = position.to_vec();
        values.extend([0.1, 0.2, 0.3, opacity, 0.0, -1.0, 1.0, 2.0, 0.0, 0.0, 0.0]);
        values
    }

    fn cloud(records: &[Vec<f32>]) -> PointCloud {
        let schema = PlySchema::new(NAMES).unwrap();
        PointCloud::new(schema, records.concat()).unwrap()
    }

    #[test]
    fn opacity_is_sigmoid_of_logit() {
        let record = |logit| SplatRecord {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            log_scale: Vec3::ZERO,
            color_dc: Vec3::ZERO,
            opacity_logit: logit,
        };

        assert_eq!(record(0.0).opacity(), 0.5);
        assert!(record(20.0).opacity() > 0.999_999);
        assert!(record(-20.0).opacity() < 1e-6);
    }

    #[test]
    fn typed_fields_follow_schema() {
        let cloud = cloud(&[splat_values([1.0, 2.0, 3.0], 0.0)]);
        let splats = cloud.splats(None, DegeneratePolicy::Reject).unwrap();

        assert_eq!(splats.len(), 1);
        let splat = splats[0];
        assert_eq!(splat.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(splat.color_dc, Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(splat.log_scale, Vec3::new(0.0, -1.0, 1.0));
        assert!((splat.scale() - Vec3::new(1.0, (-1.0f32).exp(), 1.0f32.exp())).length() < 1e-6);
        // rot_0 = 2 is the scalar part, normalized to identity.
        assert!(splat.rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn zero_quaternion_becomes_identity() {
        let mut values = splat_values([0.0; 3], 0.0);
        values[10] = 0.0;
        let splats = cloud(&[values]).splats(None, DegeneratePolicy::Reject).unwrap();
        assert_eq!(splats[0].rotation, Quat::IDENTITY);
    }

    #[test]
    fn huge_quaternions_still_normalize() {
        let mut values = splat_values([0.0; 3], 0.0);
        values[10] = 1e20;
        values[11] = 1e20;
        let splats = cloud(&[values]).splats(None, DegeneratePolicy::Reject).unwrap();

        let expected = Quat::from_xyzw(std::f32::consts::FRAC_1_SQRT_2, 0.0, 0.0, std::f32::consts::FRAC_1_SQRT_2);
        assert!(splats[0].rotation.abs_diff_eq(expected, 1e-6));
        assert!((splats[0].rotation.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn tiny_quaternions_still_normalize() {
        let mut values = splat_values([0.0; 3], 0.0);
        values[10] = 1e-30;
        let splats = cloud(&[values]).splats(None, DegeneratePolicy::Reject).unwrap();
        assert!(splats[0].rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn overflowing_scale_follows_policy() {
        let mut values = splat_values([5.0, 0.0, 0.0], 0.0);
        values[9] = 95.0;
        let cloud = cloud(&[splat_values([1.0, 0.0, 0.0], 0.0), values]);

        assert_eq!(
            cloud.splats(None, DegeneratePolicy::Reject),
            Err(PlyError::NonFinite { index: 1, field: "scale_2".into() })
        );

        let kept = cloud.splats(None, DegeneratePolicy::Drop).unwrap();
        assert_eq!(kept.len(), 1);
        assert!(kept[0].scale().is_finite());
    }

    #[test]
    fn missing_property_is_reported() {
        let schema = PlySchema::new(["x", "y", "z"]).unwrap();
        let cloud = PointCloud::new(schema, vec![0.0; 3]).unwrap();
        assert_eq!(
            cloud.splats(None, DegeneratePolicy::Drop),
            Err(PlyError::MissingProperty("rot_0"))
        );
    }

    #[test]
    fn limit_caps_the_working_set() {
        let records: Vec<_> = (0..5).map(|i| splat_values([i as f32, 0.0, 0.0], 0.0)).collect();
        let splats = cloud(&records).splats(Some(3), DegeneratePolicy::Drop).unwrap();
        let xs: Vec<_> = splats.iter().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);

        assert_eq!(cloud(&records).splats(Some(50), DegeneratePolicy::Drop).unwrap().len(), 5);
    }

    #[test]
    fn non_finite_splats_follow_policy() {
        let records = [
            splat_values([0.0, 0.0, 0.0], 0.0),
            splat_values([f32::NAN, 0.0, 0.0], 0.0),
            splat_values([2.0, 0.0, 0.0], f32::INFINITY),
            splat_values([3.0, 0.0, 0.0], 0.0),
        ];
        let cloud = cloud(&records);

        let kept = cloud.splats(None, DegeneratePolicy::Drop).unwrap();
        let xs: Vec<_> = kept.iter().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![0.0, 3.0]);

        assert_eq!(
            cloud.splats(None, DegeneratePolicy::Reject),
            Err(PlyError::NonFinite { index: 1, field: "x".into() })
        );
    }
}
