use glam::Vec2;

/// Corner directions of a splat quad, counter-clockwise from bottom left.
pub const CORNERS: [Vec2; 4] = [
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, 1.0),
];

/// Two triangles over [`CORNERS`], relative to the first vertex of a quad.
pub const INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

pub const VERTICES_PER_QUAD: usize = CORNERS.len();
pub const INDICES_PER_QUAD: usize = INDICES.len();

/// Index block for the quad whose vertices start at `4 * splat`.
pub fn quad_indices(splat: u32) -> [u32; 6] {
    let base = splat * VERTICES_PER_QUAD as u32;
    INDICES.map(|i| base + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_block_is_offset_by_quad() {
        assert_eq!(quad_indices(0), [0, 1, 2, 0, 2, 3]);
        assert_eq!(quad_indices(3), [12, 13, 14, 12, 14, 15]);
    }
}
