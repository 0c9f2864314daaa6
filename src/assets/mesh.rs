use glam::{Vec2, Vec3};
use std::f32::consts::PI;

/// Interleaved vertex: position, uv, normal, tangent, bitangent (14 floats).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

impl Vertex {
    pub const FLOATS: usize = 14;

    pub fn new(position: Vec3, uv: Vec2, normal: Vec3) -> Self {
        Self {
            position,
            uv,
            normal,
            ..Self::default()
        }
    }

    pub fn to_array(&self) -> [f32; Self::FLOATS] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.uv.x,
            self.uv.y,
            self.normal.x,
            self.normal.y,
            self.normal.z,
            self.tangent.x,
            self.tangent.y,
            self.tangent.z,
            self.bitangent.x,
            self.bitangent.y,
            self.bitangent.z,
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Triangles referencing missing vertices are dropped.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let count = vertices.len() as u32;
        let indices = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&index| index < count))
            .flatten()
            .copied()
            .collect();
        Self { vertices, indices }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }

    pub fn interleaved(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.to_array()).collect()
    }

    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            (min.min(v.position), max.max(v.position))
        }))
    }

    /// Area-weighted average of the face normals around each vertex.
    pub fn compute_smooth_normals(&mut self) {
        for vertex in &mut self.vertices {
            vertex.normal = Vec3::ZERO;
        }
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = self.vertices[a].position;
            let face = (self.vertices[b].position - p0).cross(self.vertices[c].position - p0);
            for index in [a, b, c] {
                self.vertices[index].normal += face;
            }
        }
        for vertex in &mut self.vertices {
            vertex.normal = vertex.normal.normalize_or_zero();
        }
    }

    pub fn compute_tangents(&mut self) {
        for vertex in &mut self.vertices {
            vertex.tangent = Vec3::ZERO;
            vertex.bitangent = Vec3::ZERO;
        }
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (v0, v1, v2) = (self.vertices[a], self.vertices[b], self.vertices[c]);
            let edge1 = v1.position - v0.position;
            let edge2 = v2.position - v0.position;
            let duv1 = v1.uv - v0.uv;
            let duv2 = v2.uv - v0.uv;
            let det = duv1.x * duv2.y - duv2.x * duv1.y;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let f = 1.0 / det;
            let tangent = (edge1 * duv2.y - edge2 * duv1.y) * f;
            let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * f;
            for index in [a, b, c] {
                self.vertices[index].tangent += tangent;
                self.vertices[index].bitangent += bitangent;
            }
        }
        for vertex in &mut self.vertices {
            vertex.tangent = vertex.tangent.normalize_or_zero();
            vertex.bitangent = vertex.bitangent.normalize_or_zero();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Cube,
    Sphere,
    Plane,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 3] = [Self::Cube, Self::Sphere, Self::Plane];

    pub fn label(self) -> &'static str {
        match self {
            Self::Cube => "Cube",
            Self::Sphere => "Sphere",
            Self::Plane => "Plane",
        }
    }

    pub fn build(self) -> Mesh {
        match self {
            Self::Cube => cube(),
            Self::Sphere => sphere(20, 20),
            Self::Plane => plane(),
        }
    }
}

/// 2x2 quad in XZ at y = 0, facing +Y.
pub fn plane() -> Mesh {
    let corners = [
        (Vec3::new(-1.0, 0.0, -1.0), Vec2::new(0.0, 0.0)),
        (Vec3::new(1.0, 0.0, -1.0), Vec2::new(10.0, 0.0)),
        (Vec3::new(-1.0, 0.0, 1.0), Vec2::new(0.0, 10.0)),
        (Vec3::new(1.0, 0.0, 1.0), Vec2::new(10.0, 10.0)),
    ];
    let vertices = corners
        .iter()
        .map(|&(position, uv)| Vertex {
            position,
            uv,
            normal: Vec3::Y,
            tangent: Vec3::X,
            bitangent: Vec3::Z,
        })
        .collect();
    Mesh::new(vertices, vec![0, 2, 1, 1, 2, 3])
}

/// Unit cube centred on the origin, four vertices per face.
pub fn cube() -> Mesh {
    // (normal, u axis, v axis) with u x v == normal so faces wind CCW from outside.
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let corners = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u_axis, v_axis) in faces {
        let base = vertices.len() as u32;
        for (u, v) in corners {
            vertices.push(Vertex {
                position: normal * 0.5 + u_axis * u + v_axis * v,
                uv: Vec2::new(u + 0.5, v + 0.5),
                normal,
                tangent: u_axis,
                bitangent: v_axis,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Mesh::new(vertices, indices)
}

/// UV sphere of radius 0.5.
pub fn sphere(rings: u32, sectors: u32) -> Mesh {
    let rings = rings.max(3);
    let sectors = sectors.max(3);
    let ring_step = 1.0 / (rings - 1) as f32;
    let sector_step = 1.0 / (sectors - 1) as f32;

    let mut vertices = Vec::with_capacity((rings * sectors) as usize);
    for r in 0..rings {
        let phi = PI * r as f32 * ring_step;
        let y = (-PI * 0.5 + phi).sin();
        for s in 0..sectors {
            let theta = 2.0 * PI * s as f32 * sector_step;
            let normal = Vec3::new(theta.cos() * phi.sin(), y, theta.sin() * phi.sin());
            let tangent = Vec3::new(-theta.sin(), 0.0, theta.cos());
            vertices.push(Vertex {
                position: normal * 0.5,
                uv: Vec2::new(s as f32 * sector_step, r as f32 * ring_step),
                normal,
                tangent,
                bitangent: normal.cross(tangent),
            });
        }
    }

    let mut indices = Vec::with_capacity(((rings - 1) * (sectors - 1) * 6) as usize);
    for r in 0..rings - 1 {
        for s in 0..sectors - 1 {
            let current = r * sectors + s;
            let above = (r + 1) * sectors + s;
            indices.extend_from_slice(&[current, above + 1, current + 1]);
            indices.extend_from_slice(&[current, above, above + 1]);
        }
    }
    Mesh::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::{cube, plane, sphere, Mesh, Vertex};
    use glam::{Vec2, Vec3};

    fn faces_point_along_normals(mesh: &Mesh) {
        for [a, b, c] in mesh.triangles() {
            let face = (b.position - a.position).cross(c.position - a.position);
            if face.length_squared() < 1e-12 {
                continue;
            }
            let average = a.normal + b.normal + c.normal;
            assert!(face.dot(average) > 0.0, "triangle winds against its normals");
        }
    }

    #[test]
    fn cube_has_four_vertices_per_face_and_outward_winding() {
        let mesh = cube();
        assert_eq!(mesh.vertices().len(), 24);
        assert_eq!(mesh.indices().len(), 36);
        faces_point_along_normals(&mesh);
        let (min, max) = mesh.bounds().expect("bounds");
        assert_eq!(min, Vec3::splat(-0.5));
        assert_eq!(max, Vec3::splat(0.5));
    }

    #[test]
    fn plane_faces_up() {
        let mesh = plane();
        assert_eq!(mesh.triangle_count(), 2);
        faces_point_along_normals(&mesh);
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = sphere(20, 20);
        assert_eq!(mesh.vertices().len(), 400);
        for vertex in mesh.vertices() {
            assert!((vertex.position.length() - 0.5).abs() < 1e-4);
        }
        faces_point_along_normals(&mesh);
    }

    #[test]
    fn smooth_normals_and_tangents_follow_geometry() {
        let vertices = vec![
            Vertex::new(Vec3::ZERO, Vec2::new(0.0, 0.0), Vec3::ZERO),
            Vertex::new(Vec3::X, Vec2::new(1.0, 0.0), Vec3::ZERO),
            Vertex::new(Vec3::Y, Vec2::new(0.0, 1.0), Vec3::ZERO),
        ];
        let mut mesh = Mesh::new(vertices, vec![0, 1, 2]);
        mesh.compute_smooth_normals();
        mesh.compute_tangents();
        for vertex in mesh.vertices() {
            assert!((vertex.normal - Vec3::Z).length() < 1e-5);
            assert!((vertex.tangent - Vec3::X).length() < 1e-5);
            assert!((vertex.bitangent - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn out_of_range_triangles_are_dropped() {
        let mesh = Mesh::new(vec![Vertex::default(); 3], vec![0, 1, 2, 0, 1, 7]);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.interleaved().len(), 3 * Vertex::FLOATS);
    }
}
