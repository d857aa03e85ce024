//! Flat road grid; all bending happens in the vertex shader.

use bytemuck::{Pod, Zeroable};

use crate::params::RoadOptions;

/// Vertex data for the road mesh (undistorted position)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

/// Grid covering both roadways and the island, from z = 0 to z = -length
pub struct RoadMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl RoadMesh {
    pub fn new(options: &RoadOptions) -> Self {
        let columns = options.width_segments.max(1) as usize;
        let rows = options.length_segments.max(1) as usize;
        let half_width = options.total_width_m() / 2.0;

        let mut vertices = Vec::with_capacity((columns + 1) * (rows + 1));
        let mut indices = Vec::with_capacity(columns * rows * 6);

        // Row 0 sits at the near end (progress 0)
        for row in 0..=rows {
            let z = -(row as f32 / rows as f32) * options.length_m;
            for column in 0..=columns {
                let x = column as f32 / columns as f32 * half_width * 2.0 - half_width;
                vertices.push(Vertex {
                    position: [x, 0.0, z],
                });
            }
        }

        // Counter-clockwise seen from above
        for row in 0..rows {
            for column in 0..columns {
                let near_left = (row * (columns + 1) + column) as u32;
                let near_right = near_left + 1;
                let far_left = ((row + 1) * (columns + 1) + column) as u32;
                let far_right = far_left + 1;

                indices.extend_from_slice(&[
                    near_left,
                    near_right,
                    far_left,
                    far_left,
                    near_right,
                    far_right,
                ]);
            }
        }

        Self { vertices, indices }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_road_grid_creation() {
        let options = RoadOptions::default();
        let mesh = RoadMesh::new(&options);

        let columns = options.width_segments as usize;
        let rows = options.length_segments as usize;
        assert_eq!(mesh.vertices.len(), (columns + 1) * (rows + 1));
        assert_eq!(mesh.indices.len(), columns * rows * 6);
        assert!(mesh
            .indices
            .iter()
            .all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_road_spans_length_and_width() {
        let options = RoadOptions::default();
        let mesh = RoadMesh::new(&options);

        let first = mesh.vertices.first().unwrap().position;
        let last = mesh.vertices.last().unwrap().position;

        assert_eq!(first, [-10.0, 0.0, 0.0]);
        assert!((last[0] - 10.0).abs() < 1e-4);
        assert!((last[2] + options.length_m).abs() < 1e-3);

        // Progress runs 0..=1 along the road
        for v in &mesh.vertices {
            let progress = -v.position[2] / options.length_m;
            assert!((0.0..=1.0 + 1e-6).contains(&progress));
        }
    }

    #[test]
    fn test_triangles_face_up() {
        let mesh = RoadMesh::new(&RoadOptions::default());

        for triangle in mesh.indices.chunks_exact(3).take(12) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| glam::Vec3::from_array(mesh.vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            assert!(normal.y > 0.0, "triangle {:?} faces down", triangle);
        }
    }
}
