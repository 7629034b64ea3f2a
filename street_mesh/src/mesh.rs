use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use geom::{HashablePt3D, Pt2D, Pt3D};

/// RGBA in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba_f(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba_f(r: f32, g: f32, b: f32, a: f32) -> Color {
        Color { r, g, b, a }
    }

    pub fn rgb(r: usize, g: usize, b: usize) -> Color {
        Color::rgba_f(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Understands "#rrggbb" and "#rrggbbaa", like the OSM `colour` tag.
    pub fn parse(raw: &str) -> Option<Color> {
        let hex = raw.trim().strip_prefix('#')?;
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return None;
        }
        let channel = |idx: usize| -> Option<f32> {
            u8::from_str_radix(&hex[idx..idx + 2], 16)
                .ok()
                .map(|x| f32::from(x) / 255.0)
        };
        let a = if hex.len() == 8 { channel(6)? } else { 1.0 };
        Some(Color::rgba_f(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// "#rrggbb", dropping alpha
    pub fn as_hex(&self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8
        )
    }

    pub fn mean(colors: &[Color]) -> Color {
        if colors.is_empty() {
            return Color::WHITE;
        }
        let n = colors.len() as f32;
        let mut sum = [0.0; 4];
        for c in colors {
            sum[0] += c.r;
            sum[1] += c.g;
            sum[2] += c.b;
            sum[3] += c.a;
        }
        Color::rgba_f(sum[0] / n, sum[1] / n, sum[2] / n, sum[3] / n)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub pos: Pt3D,
    pub color: Color,
    pub uv: [f64; 2],
    pub normal: [f64; 3],
}

impl Vertex {
    /// Before height binding, `z` only holds an offset from the ground: layer heights, raised
    /// sidewalks, and so on.
    pub fn new(pt: Pt2D, z: f64, color: Color, uv: [f64; 2]) -> Vertex {
        Vertex {
            pos: pt.to_3d(z),
            color,
            uv,
            normal: [0.0, 0.0, 1.0],
        }
    }

    pub fn pt2d(&self) -> Pt2D {
        self.pos.to_2d()
    }

    pub fn key(&self) -> HashablePt3D {
        self.pos.to_hashable()
    }
}

/// Triangles are wound counter-clockwise when viewed from above.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TriangleList {
    pub triangles: Vec<[Vertex; 3]>,
}

impl TriangleList {
    pub fn new() -> TriangleList {
        TriangleList::default()
    }

    pub fn push(&mut self, a: Vertex, b: Vertex, c: Vertex) {
        self.triangles.push([a, b, c]);
    }

    /// The corners go around the quad counter-clockwise.
    pub fn push_quad(&mut self, p00: Vertex, p10: Vertex, p11: Vertex, p01: Vertex) {
        self.push(p00, p10, p11);
        self.push(p00, p11, p01);
    }

    pub fn extend(&mut self, other: TriangleList) {
        self.triangles.extend(other.triangles);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.triangles.iter().flat_map(|tri| tri.iter())
    }

    pub fn vertices_mut(&mut self) -> impl Iterator<Item = &mut Vertex> {
        self.triangles.iter_mut().flat_map(|tri| tri.iter_mut())
    }

    pub fn translate_z(&mut self, dz: f64) {
        for v in self.vertices_mut() {
            v.pos = v.pos.offset_z(dz);
        }
    }

    /// Flat shading: every vertex gets its triangle's normal.
    pub fn recompute_normals(&mut self) {
        for tri in &mut self.triangles {
            let normal = triangle_normal(tri[0].pos, tri[1].pos, tri[2].pos);
            for v in tri.iter_mut() {
                v.normal = normal;
            }
        }
    }
}

fn triangle_normal(a: Pt3D, b: Pt3D, c: Pt3D) -> [f64; 3] {
    let u = [b.x - a.x, b.y - a.y, b.z - a.z];
    let v = [c.x - a.x, c.y - a.y, c.z - a.z];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len == 0.0 {
        return [0.0, 0.0, 1.0];
    }
    [n[0] / len, n[1] / len, n[2] / len]
}

/// The named triangle lists handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MeshLayer {
    Street,
    Path,
    Sidewalk,
    /// Side walls between raised sidewalks and the road
    Curb,
    /// The outer band past the sidewalk
    Curb2,
    Crossing,
    Wall,
    Building,
    Water,
    Terrain,
    /// Side walls from every other extrusion
    Extrusion,
}

impl fmt::Display for MeshLayer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MeshList {
    lists: BTreeMap<MeshLayer, TriangleList>,
}

impl MeshList {
    pub fn new() -> MeshList {
        MeshList::default()
    }

    /// Empty if nothing was ever added to this layer.
    pub fn get(&self, layer: MeshLayer) -> &TriangleList {
        static EMPTY: TriangleList = TriangleList {
            triangles: Vec::new(),
        };
        self.lists.get(&layer).unwrap_or(&EMPTY)
    }

    pub fn get_mut(&mut self, layer: MeshLayer) -> &mut TriangleList {
        self.lists.entry(layer).or_insert_with(TriangleList::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MeshLayer, &TriangleList)> {
        self.lists.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&MeshLayer, &mut TriangleList)> {
        self.lists.iter_mut()
    }

    pub fn total_triangles(&self) -> usize {
        self.lists.values().map(|l| l.len()).sum()
    }
}
