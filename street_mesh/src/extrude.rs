//! Side walls along the open boundary of a mesh.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;

use geom::{HashablePt2D, HashablePt3D, Line};

use crate::{MeshError, TriangleList, Vertex};

/// A directed edge with the mesh's interior on its left.
pub type BoundaryEdge = (Vertex, Vertex);

/// Edges used by exactly one triangle of the union of `sources`. Fails if the triangles are wound
/// inconsistently, or if the boundary pinches or crosses itself.
pub fn find_boundary(sources: &[&TriangleList]) -> Result<Vec<BoundaryEdge>> {
    // Keep the first-seen order, so results are deterministic
    let mut order: Vec<(HashablePt3D, HashablePt3D)> = Vec::new();
    let mut directed: HashMap<(HashablePt3D, HashablePt3D), (usize, BoundaryEdge)> =
        HashMap::new();
    for list in sources {
        for tri in &list.triangles {
            for i in 0..3 {
                let (a, b) = (tri[i], tri[(i + 1) % 3]);
                let key = (a.key(), b.key());
                if key.0 == key.1 {
                    continue;
                }
                let entry = directed.entry(key).or_insert_with(|| {
                    order.push(key);
                    (0, (a, b))
                });
                entry.0 += 1;
                if entry.0 > 1 {
                    return Err(MeshError::Boundary {
                        from: a.pos,
                        to: b.pos,
                    }
                    .into());
                }
            }
        }
    }

    let mut boundary = Vec::new();
    for key in order {
        if !directed.contains_key(&(key.1, key.0)) {
            boundary.push(directed[&key].1);
        }
    }

    // Every boundary vertex has to be entered as often as it's left
    let mut balance: BTreeMap<HashablePt3D, isize> = BTreeMap::new();
    for (a, b) in &boundary {
        *balance.entry(a.key()).or_insert(0) += 1;
        *balance.entry(b.key()).or_insert(0) -= 1;
    }
    if let Some((a, b)) = boundary
        .iter()
        .find(|(a, b)| balance[&a.key()] != 0 || balance[&b.key()] != 0)
    {
        return Err(MeshError::Boundary {
            from: a.pos,
            to: b.pos,
        }
        .into());
    }

    check_crossings(&boundary)?;
    Ok(boundary)
}

/// Sweep along x; only edges with overlapping x ranges get compared.
fn check_crossings(boundary: &[BoundaryEdge]) -> Result<()> {
    let mut edges: Vec<(f64, f64, &BoundaryEdge)> = boundary
        .iter()
        .map(|e| {
            let (x1, x2) = (e.0.pos.x, e.1.pos.x);
            (x1.min(x2), x1.max(x2), e)
        })
        .collect();
    edges.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut active: Vec<(f64, &BoundaryEdge)> = Vec::new();
    for (min_x, max_x, edge) in edges {
        active.retain(|(other_max_x, _)| *other_max_x >= min_x);
        let line1 = match Line::new(edge.0.pt2d(), edge.1.pt2d()) {
            Some(l) => l,
            None => {
                continue;
            }
        };
        for (_, other) in &active {
            // Crossings only count at the same height; bridges legitimately pass over things
            if edge.0.pos.z != other.0.pos.z && edge.1.pos.z != other.1.pos.z {
                continue;
            }
            if let Some(line2) = Line::new(other.0.pt2d(), other.1.pt2d()) {
                if line1.crosses(&line2) {
                    return Err(MeshError::Boundary {
                        from: edge.0.pos,
                        to: edge.1.pos,
                    }
                    .into());
                }
            }
        }
        active.push((max_x, edge));
    }
    Ok(())
}

/// Appends walls between the boundary of `sources` and a copy of it moved by `height` along z.
/// Vertices in `clamped` stay where they are instead of moving, turning their quads into
/// triangles. No wall is built along the edges in `not_to_connect`, given in either direction.
pub fn extrude(
    dest: &mut TriangleList,
    sources: &[&TriangleList],
    height: f64,
    clamped: &HashSet<HashablePt2D>,
    not_to_connect: &HashSet<(HashablePt2D, HashablePt2D)>,
) -> Result<()> {
    if height == 0.0 {
        return Ok(());
    }
    let boundary = find_boundary(sources)?;

    let moved = |v: Vertex| -> (Vertex, bool) {
        if clamped.contains(&v.pt2d().to_hashable()) {
            return (v, true);
        }
        let mut copy = v;
        copy.pos = v.pos.offset_z(height);
        copy.uv = [v.uv[0], v.uv[1] + height.abs()];
        (copy, false)
    };

    for (p, q) in boundary {
        let (p_key, q_key) = (p.pt2d().to_hashable(), q.pt2d().to_hashable());
        if not_to_connect.contains(&(p_key, q_key)) || not_to_connect.contains(&(q_key, p_key)) {
            continue;
        }
        let (p2, p_clamped) = moved(p);
        let (q2, q_clamped) = moved(q);
        let mut walls = Vec::new();
        match (p_clamped, q_clamped) {
            (true, true) => {}
            (true, false) => walls.push([p, q, q2]),
            (false, true) => walls.push([p, q, p2]),
            (false, false) => {
                walls.push([p, q, q2]);
                walls.push([p, q2, p2]);
            }
        }
        for [a, b, c] in walls {
            // Walls face away from the interior of the source mesh
            if height > 0.0 {
                dest.push(a, b, c);
            } else {
                dest.push(a, c, b);
            }
        }
    }
    Ok(())
}

/// Splits a triangle list into pieces that share no vertex positions.
pub fn connected_components(list: &TriangleList) -> Vec<TriangleList> {
    let mut parent: Vec<usize> = (0..list.triangles.len()).collect();
    fn find(parent: &mut Vec<usize>, mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    let mut first_owner: HashMap<HashablePt3D, usize> = HashMap::new();
    for (idx, tri) in list.triangles.iter().enumerate() {
        for v in tri {
            let other = *first_owner.entry(v.key()).or_insert(idx);
            let (r1, r2) = (find(&mut parent, idx), find(&mut parent, other));
            if r1 != r2 {
                parent[r1.max(r2)] = r1.min(r2);
            }
        }
    }

    let mut components: BTreeMap<usize, TriangleList> = BTreeMap::new();
    for (idx, tri) in list.triangles.iter().enumerate() {
        let root = find(&mut parent, idx);
        components
            .entry(root)
            .or_insert_with(TriangleList::new)
            .triangles
            .push(*tri);
    }
    components.into_values().collect()
}
