//! glTF decoding and normalization.
//!
//! Every model is flattened into a single indexed triangle mesh in scene space
//! (node transforms applied), then recentred on its bounding box and given a
//! uniform scale so its bounding sphere has the canonical radius. Models
//! authored in millimetres and in kilometres end up the same size on screen.
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use thiserror::Error;

const DEFAULT_BASE_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to decode glTF: {0}")]
    Decode(#[from] gltf::Error),
    #[error("model has no triangle geometry")]
    NoGeometry,
    #[error("mesh '{mesh}' has a primitive without POSITION data")]
    MissingPositions { mesh: String },
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
}

impl MeshData {
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.vertices.iter().map(|vertex| Vec3::from(vertex.position)))
    }
}

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), point| {
            (min.min(point), max.max(point))
        });
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Radius of the sphere centred on the box that passes through its corners.
    pub fn sphere_radius(&self) -> f32 {
        self.size().length() * 0.5
    }
}

/// A mesh centred on the origin plus the scale that brings it to the
/// canonical size.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedModel {
    pub mesh: MeshData,
    /// Bounding sphere radius of the centred mesh, in its native units.
    pub radius: f32,
    pub scale: f32,
}

impl NormalizedModel {
    pub fn normalize(mut mesh: MeshData, canonical_radius: f32) -> Result<Self, ModelError> {
        let bounds = mesh.bounds().ok_or(ModelError::NoGeometry)?;
        let center = bounds.center();
        for vertex in &mut mesh.vertices {
            vertex.position = (Vec3::from(vertex.position) - center).to_array();
        }
        let radius = bounds.sphere_radius();
        let scale = if radius > 0.0 && radius.is_finite() {
            canonical_radius / radius
        } else {
            1.0
        };
        Ok(Self {
            mesh,
            radius,
            scale,
        })
    }

    /// Bounding sphere radius once `scale` is applied.
    pub fn scaled_radius(&self) -> f32 {
        self.radius * self.scale
    }
}

/// Decodes a `.glb` or embedded `.gltf` file into one scene-space mesh.
pub fn decode_gltf(bytes: &[u8]) -> Result<MeshData, ModelError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, None, blob)?;

    let mut mesh = MeshData {
        vertices: Vec::new(),
        indices: Vec::new(),
        base_color: DEFAULT_BASE_COLOR,
    };
    let mut base_color = None;

    let roots: Vec<gltf::Node> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().collect(),
        None => document.nodes().filter(|node| is_root(&document, node)).collect(),
    };
    for node in roots {
        collect_node(&node, Mat4::IDENTITY, &buffers, &mut mesh, &mut base_color)?;
    }

    if mesh.indices.is_empty() {
        return Err(ModelError::NoGeometry);
    }
    if let Some(color) = base_color {
        mesh.base_color = color;
    }
    Ok(mesh)
}

fn is_root(document: &gltf::Document, candidate: &gltf::Node) -> bool {
    !document
        .nodes()
        .any(|node| node.children().any(|child| child.index() == candidate.index()))
}

fn collect_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut MeshData,
    base_color: &mut Option<[f32; 4]>,
) -> Result<(), ModelError> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::debug!(mode = ?primitive.mode(), "skipping non-triangle primitive");
                continue;
            }
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let positions: Vec<Vec3> = reader
                .read_positions()
                .ok_or_else(|| ModelError::MissingPositions {
                    mesh: mesh.name().unwrap_or("unnamed").to_string(),
                })?
                .map(|position| world.transform_point3(Vec3::from(position)))
                .collect();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            let normals: Option<Vec<[f32; 3]>> =
                reader.read_normals().map(|normals| normals.collect());
            match normals {
                Some(normals) if normals.len() == positions.len() => {
                    let base = out.vertices.len() as u32;
                    out.vertices.extend(positions.iter().zip(&normals).map(|(position, normal)| {
                        Vertex {
                            position: position.to_array(),
                            normal: (normal_matrix * Vec3::from(*normal))
                                .normalize_or_zero()
                                .to_array(),
                        }
                    }));
                    for triangle in indices.chunks_exact(3) {
                        if triangle.iter().all(|&index| (index as usize) < positions.len()) {
                            out.indices.extend(triangle.iter().map(|index| base + index));
                        }
                    }
                }
                Some(normals) => {
                    tracing::warn!(
                        mesh = mesh.name().unwrap_or("unnamed"),
                        positions = positions.len(),
                        normals = normals.len(),
                        "normal count does not match positions; using flat normals"
                    );
                    append_flat(&positions, &indices, out);
                }
                None => append_flat(&positions, &indices, out),
            }

            if base_color.is_none() {
                let material = primitive.material();
                *base_color = Some(if material.index().is_some() {
                    material.pbr_metallic_roughness().base_color_factor()
                } else {
                    DEFAULT_BASE_COLOR
                });
            }
        }
    }

    for child in node.children() {
        collect_node(&child, world, buffers, out, base_color)?;
    }
    Ok(())
}

/// Emits one vertex per triangle corner so every face gets its own normal.
fn append_flat(positions: &[Vec3], indices: &[u32], out: &mut MeshData) {
    for triangle in indices.chunks_exact(3) {
        let corners: Option<Vec<Vec3>> = triangle
            .iter()
            .map(|&index| positions.get(index as usize).copied())
            .collect();
        let Some(corners) = corners else {
            continue;
        };
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or_zero();
        for corner in corners {
            out.indices.push(out.vertices.len() as u32);
            out.vertices.push(Vertex {
                position: corner.to_array(),
                normal: normal.to_array(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron(scale: f32, offset: Vec3) -> MeshData {
        let corners = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 3.0),
        ];
        MeshData {
            vertices: corners
                .iter()
                .map(|corner| Vertex {
                    position: (*corner * scale + offset).to_array(),
                    normal: [0.0, 1.0, 0.0],
                })
                .collect(),
            indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
            base_color: DEFAULT_BASE_COLOR,
        }
    }

    #[test]
    fn normalization_is_scale_invariant() {
        for native_scale in [0.001_f32, 0.37, 1.0, 48.0, 1000.0] {
            let mesh = tetrahedron(native_scale, Vec3::new(5.0, -3.0, 12.0) * native_scale);
            let model = NormalizedModel::normalize(mesh, 2.25).unwrap();
            let error = (model.scaled_radius() - 2.25).abs();
            assert!(error < 1e-3, "scale {native_scale}: radius {}", model.scaled_radius());
        }
    }

    #[test]
    fn normalization_recentres_bounds() {
        let model = NormalizedModel::normalize(tetrahedron(10.0, Vec3::splat(100.0)), 2.25).unwrap();
        let bounds = model.mesh.bounds().unwrap();
        assert!(bounds.center().length() < 1e-3);
        assert!((bounds.sphere_radius() - model.radius).abs() < 1e-3);
    }

    #[test]
    fn degenerate_model_keeps_unit_scale() {
        let mut mesh = tetrahedron(1.0, Vec3::ZERO);
        for vertex in &mut mesh.vertices {
            vertex.position = [4.0, 4.0, 4.0];
        }
        let model = NormalizedModel::normalize(mesh, 2.25).unwrap();
        assert_eq!(model.radius, 0.0);
        assert_eq!(model.scale, 1.0);
    }

    #[test]
    fn empty_mesh_has_no_geometry() {
        let mesh = MeshData {
            vertices: Vec::new(),
            indices: Vec::new(),
            base_color: DEFAULT_BASE_COLOR,
        };
        assert!(matches!(
            NormalizedModel::normalize(mesh, 2.25),
            Err(ModelError::NoGeometry)
        ));
    }

    #[test]
    fn bounding_sphere_is_half_the_diagonal() {
        let bounds = Bounds::from_points([Vec3::ZERO, Vec3::new(2.0, 4.0, 4.0)]).unwrap();
        assert_eq!(bounds.center(), Vec3::new(1.0, 2.0, 2.0));
        assert!((bounds.sphere_radius() - 3.0).abs() < 1e-6);
        assert!(Bounds::from_points(std::iter::empty()).is_none());
    }

    /// Packs a single tetrahedron with no normals into a GLB container, placed
    /// under a node with the given uniform scale and translation.
    const TETRA_INDICES: [u32; 12] = [0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3];

    fn glb_tetrahedron(scale: f32, translation: [f32; 3]) -> Vec<u8> {
        glb_mesh(scale, translation, &TETRA_INDICES, None)
    }

    /// Four-corner GLB with the given indices and, optionally, a NORMAL
    /// accessor holding `normal_count` up-facing normals.
    fn glb_mesh(
        scale: f32,
        translation: [f32; 3],
        indices: &[u32],
        normal_count: Option<usize>,
    ) -> Vec<u8> {
        let positions: [[f32; 3]; 4] = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let mut bin = Vec::new();
        for position in positions {
            for component in position {
                bin.extend_from_slice(&component.to_le_bytes());
            }
        }
        let index_offset = bin.len();
        for index in indices {
            bin.extend_from_slice(&index.to_le_bytes());
        }
        let index_length = bin.len() - index_offset;

        let mut attributes = r#""POSITION":0"#.to_string();
        let mut accessors = format!(
            r#"{{"bufferView":0,"componentType":5126,"count":4,"type":"VEC3","min":[0,0,0],"max":[1,1,1]}},
 {{"bufferView":1,"componentType":5125,"count":{},"type":"SCALAR"}}"#,
            indices.len()
        );
        let mut views = format!(
            r#"{{"buffer":0,"byteOffset":0,"byteLength":48,"target":34962}},
 {{"buffer":0,"byteOffset":{index_offset},"byteLength":{index_length},"target":34963}}"#
        );
        if let Some(count) = normal_count {
            let normal_offset = bin.len();
            for _ in 0..count {
                for component in [0.0f32, 1.0, 0.0] {
                    bin.extend_from_slice(&component.to_le_bytes());
                }
            }
            attributes.push_str(r#","NORMAL":2"#);
            accessors.push_str(&format!(
                r#",
 {{"bufferView":2,"componentType":5126,"count":{count},"type":"VEC3"}}"#
            ));
            views.push_str(&format!(
                r#",
 {{"buffer":0,"byteOffset":{normal_offset},"byteLength":{},"target":34962}}"#,
                count * 12
            ));
        }

        let json = format!(
            r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],
"nodes":[{{"mesh":0,"scale":[{scale},{scale},{scale}],"translation":[{},{},{}]}}],
"meshes":[{{"name":"tetra","primitives":[{{"attributes":{{{attributes}}},"indices":1}}]}}],
"accessors":[
 {accessors}],
"bufferViews":[
 {views}],
"buffers":[{{"byteLength":{}}}]}}"#,
            translation[0],
            translation[1],
            translation[2],
            bin.len()
        );
        let mut json = json.into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin);
        glb
    }

    #[test]
    fn shared_normals_keep_shared_vertices() {
        let mesh = decode_gltf(&glb_mesh(1.0, [0.0; 3], &TETRA_INDICES, Some(4))).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, TETRA_INDICES.to_vec());
        assert_eq!(mesh.vertices[0].normal, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn short_normal_accessor_falls_back_to_flat_normals() {
        let mesh = decode_gltf(&glb_mesh(1.0, [0.0; 3], &TETRA_INDICES, Some(3))).unwrap();
        assert_eq!(mesh.vertices.len(), 12);
        assert_eq!(mesh.indices.len(), 12);
        assert!(mesh
            .indices
            .iter()
            .all(|&index| (index as usize) < mesh.vertices.len()));
    }

    #[test]
    fn triangles_with_stray_indices_are_dropped_whole() {
        let indices = [0, 2, 1, 0, 9, 3, 1, 2, 3];
        let mesh = decode_gltf(&glb_mesh(1.0, [0.0; 3], &indices, Some(4))).unwrap();
        assert_eq!(mesh.indices, vec![0, 2, 1, 1, 2, 3]);
    }

    #[test]
    fn decodes_glb_with_node_transform() {
        let mesh = decode_gltf(&glb_tetrahedron(100.0, [10.0, 0.0, -5.0])).unwrap();
        // Four faces, three unshared corners each.
        assert_eq!(mesh.vertices.len(), 12);
        assert_eq!(mesh.indices.len(), 12);
        assert_eq!(mesh.base_color, DEFAULT_BASE_COLOR);

        let bounds = mesh.bounds().unwrap();
        assert!((bounds.min - Vec3::new(10.0, 0.0, -5.0)).length() < 1e-3);
        assert!((bounds.max - Vec3::new(110.0, 100.0, 95.0)).length() < 1e-3);
        for vertex in &mesh.vertices {
            assert!((Vec3::from(vertex.normal).length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn decoded_models_normalize_to_the_same_size() {
        let tiny = decode_gltf(&glb_tetrahedron(0.01, [0.0; 3])).unwrap();
        let huge = decode_gltf(&glb_tetrahedron(500.0, [3.0, 3.0, 3.0])).unwrap();
        let tiny = NormalizedModel::normalize(tiny, 2.25).unwrap();
        let huge = NormalizedModel::normalize(huge, 2.25).unwrap();
        assert!((tiny.scaled_radius() - huge.scaled_radius()).abs() < 1e-3);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            decode_gltf(b"definitely not a model"),
            Err(ModelError::Decode(_))
        ));
    }
}
