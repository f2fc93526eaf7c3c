use rand::Rng;

use crate::{
    datatypes::{Edge, Point, Structure, Vertex, VertexKind},
    error::FloodgateError,
    geometry,
};

/// Splits an edge at a vertex that has already been inserted into the vertex
/// list: the edge keeps its first endpoint and is rewired to end at
/// `new_vertex_id`, and a new edge of the same kind covers the remainder to
/// the original second endpoint. Both halves get their lengths frozen at the
/// current endpoint distance.
///
/// Rope edges are never split mid-span.
///
/// # Arguments
/// * `structure` - The structure to edit
/// * `new_vertex_id` - Index of the vertex to split on
/// * `edge_id` - Index of the edge to split
///
/// # Returns
/// A new Structure with the split applied
pub fn split_edge(
    structure: &Structure,
    new_vertex_id: usize,
    edge_id: usize,
) -> Result<Structure, FloodgateError> {
    if edge_id >= structure.edges.len() {
        return Err(FloodgateError::Edit(format!("No edge with id {edge_id}")));
    }
    if !structure.edges[edge_id].kind.is_load_bearing() {
        return Err(FloodgateError::Edit(
            "Rope edges cannot be split mid-span".to_string(),
        ));
    }

    let mut result = structure.clone();

    let first = result.edges[edge_id].v[0];
    let original_second = result.edges[edge_id].v[1];
    let kind = result.edges[edge_id].kind;

    result.edges[edge_id].v[1] = new_vertex_id;
    result.edges[edge_id].length =
        geometry::length(&result.vertices[first].p, &result.vertices[new_vertex_id].p);

    result.edges.push(Edge {
        v: [new_vertex_id, original_second],
        kind,
        length: geometry::length(
            &result.vertices[new_vertex_id].p,
            &result.vertices[original_second].p,
        ),
        split_size: 1,
    });

    Ok(result)
}

/// Inserts a vertex on the interior of an edge at the point closest to `q`,
/// then splits the edge on it. This backs the click-on-edge flow: the
/// inserted vertex is Fixed when it lands on the floor, Free otherwise.
///
/// # Arguments
/// * `structure` - The structure to edit
/// * `edge_id` - Index of the edge to insert on
/// * `q` - The query point to project onto the edge
///
/// # Returns
/// The new Structure and the id of the inserted vertex
pub fn insert_vertex_on_edge(
    structure: &Structure,
    edge_id: usize,
    q: &Point,
) -> Result<(Structure, usize), FloodgateError> {
    if edge_id >= structure.edges.len() {
        return Err(FloodgateError::Edit(format!("No edge with id {edge_id}")));
    }
    if !structure.edges[edge_id].kind.is_load_bearing() {
        return Err(FloodgateError::Edit(
            "Rope edges cannot take interior vertices".to_string(),
        ));
    }

    let [v0, v1] = structure.edges[edge_id].v;
    let p = geometry::closest_point_on_edge(&structure.vertices[v0].p, &structure.vertices[v1].p, q)?;

    let kind = if p.y == 0.0 {
        VertexKind::Fixed
    } else {
        VertexKind::Free
    };

    let mut with_vertex = structure.clone();
    with_vertex.vertices.push(Vertex {
        p,
        kind,
        buoyant_radius: 0.0,
    });
    let new_vertex_id = with_vertex.vertices.len() - 1;

    let result = split_edge(&with_vertex, new_vertex_id, edge_id)?;

    Ok((result, new_vertex_id))
}

fn uniform_interior_points(
    p1: &Point,
    p2: &Point,
    split_size: usize,
) -> Result<Vec<Point>, FloodgateError> {
    let step = geometry::length(p1, p2) / split_size as f64;
    let slope = geometry::normalized_slope(p1, p2)?;

    let mut points: Vec<Point> = Vec::new();
    let mut last = *p1;

    for _ in 1..split_size {
        let next = Point {
            x: last.x + step * slope.x,
            y: last.y + step * slope.y,
        };
        points.push(next);
        last = next;
    }

    Ok(points)
}

fn random_interior_points(
    p1: &Point,
    p2: &Point,
    split_size: usize,
    rng: &mut impl Rng,
) -> Result<Vec<Point>, FloodgateError> {
    let edge_length = geometry::length(p1, p2);
    let slope = geometry::normalized_slope(p1, p2)?;

    let mut points: Vec<Point> = Vec::new();
    for _ in 1..split_size {
        let offset = rng.random_range(0.0..edge_length);
        points.push(Point {
            x: p1.x + offset * slope.x,
            y: p1.y + offset * slope.y,
        });
    }

    // sort along x so the randomized chain stays monotonic
    let sort_order = if p1.x < p2.x { 1.0 } else { -1.0 };
    points.sort_by(|a, b| (sort_order * a.x).partial_cmp(&(sort_order * b.x)).unwrap());

    Ok(points)
}

/// Subdivides one load-bearing edge into `split_size` consecutive edges with
/// `split_size - 1` new interior Free vertices.
///
/// In uniform mode the interior points are spaced evenly along the edge; in
/// random mode their offsets are drawn uniformly over the edge length and
/// sorted along x. Either way the new edges' lengths are the actual distance
/// between their endpoints. The original edge is left in place, still
/// flagged with its split size; `apply_pending_splits` filters flagged edges
/// out once every subdivision has been expanded.
///
/// # Arguments
/// * `structure` - The structure to edit
/// * `edge_id` - Index of the edge to subdivide
/// * `split_size` - Number of edges to subdivide into, at least 2
/// * `random_positions` - Randomize interior points instead of spacing evenly
/// * `rng` - Random source for random mode
///
/// # Returns
/// A new Structure with the subdivision appended
pub fn discretize_edge(
    structure: &Structure,
    edge_id: usize,
    split_size: usize,
    random_positions: bool,
    rng: &mut impl Rng,
) -> Result<Structure, FloodgateError> {
    if edge_id >= structure.edges.len() {
        return Err(FloodgateError::Edit(format!("No edge with id {edge_id}")));
    }
    if !structure.edges[edge_id].kind.is_load_bearing() {
        return Err(FloodgateError::Edit(
            "Rope edges cannot be discretized".to_string(),
        ));
    }
    if split_size < 2 {
        return Err(FloodgateError::Edit(format!(
            "Split size must be at least 2, got {split_size}"
        )));
    }

    let edge = structure.edges[edge_id].clone();
    let p1 = structure.vertices[edge.v[0]].p;
    let p2 = structure.vertices[edge.v[1]].p;

    let interior = if random_positions {
        random_interior_points(&p1, &p2, split_size, rng)?
    } else {
        uniform_interior_points(&p1, &p2, split_size)?
    };

    let mut result = structure.clone();

    let last_original_vertex = result.vertices.len() - 1;
    for p in interior {
        result.vertices.push(Vertex {
            p,
            kind: VertexKind::Free,
            buoyant_radius: 0.0,
        });
    }

    for i in 0..split_size {
        let v0 = if i == 0 {
            edge.v[0]
        } else {
            last_original_vertex + i
        };
        let v1 = if i == split_size - 1 {
            edge.v[1]
        } else {
            last_original_vertex + i + 1
        };

        result.edges.push(Edge {
            v: [v0, v1],
            kind: edge.kind,
            length: geometry::length(&result.vertices[v0].p, &result.vertices[v1].p),
            split_size: 1,
        });
    }

    result.edges[edge_id].split_size = split_size;

    Ok(result)
}

/// Expands every edge flagged with a pending split, then filters the flagged
/// originals out of the edge list.
///
/// # Arguments
/// * `structure` - The structure to edit
/// * `random_positions` - Randomize interior points instead of spacing evenly
/// * `rng` - Random source for random mode
///
/// # Returns
/// A new Structure with all pending subdivisions applied
pub fn apply_pending_splits(
    structure: &Structure,
    random_positions: bool,
    rng: &mut impl Rng,
) -> Result<Structure, FloodgateError> {
    let pending: Vec<(usize, usize)> = structure
        .edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| edge.split_size > 1)
        .map(|(edge_id, edge)| (edge_id, edge.split_size))
        .collect();

    let mut result = structure.clone();
    for (edge_id, split_size) in pending {
        result = discretize_edge(&result, edge_id, split_size, random_positions, rng)?;
    }

    result.edges.retain(|edge| edge.split_size <= 1);

    Ok(result)
}

/// Removes an edge, garbage-collecting endpoint vertices that no other edge
/// references. The anchor vertex at index 0 is never removed. Deleting a
/// vertex shifts every edge endpoint index above it down by one, including
/// the removed edge's own still-pending second endpoint.
///
/// # Arguments
/// * `structure` - The structure to edit
/// * `edge_id` - Index of the edge to delete
///
/// # Returns
/// A new Structure without the edge
pub fn delete_edge(structure: &Structure, edge_id: usize) -> Result<Structure, FloodgateError> {
    if edge_id >= structure.edges.len() {
        return Err(FloodgateError::Edit(format!("No edge with id {edge_id}")));
    }

    let mut result = structure.clone();
    let removed = result.edges.remove(edge_id);
    let mut endpoints = removed.v;

    for i in 0..2 {
        let vertex = endpoints[i];

        // never delete the anchor vertex
        if vertex == 0 {
            continue;
        }

        let referenced = result
            .edges
            .iter()
            .any(|edge| edge.v[0] == vertex || edge.v[1] == vertex);
        if referenced {
            continue;
        }

        result.vertices.remove(vertex);

        for edge in result.edges.iter_mut() {
            if edge.v[0] > vertex {
                edge.v[0] -= 1;
            }
            if edge.v[1] > vertex {
                edge.v[1] -= 1;
            }
        }

        // the removed edge's second endpoint shifts too, so the next pass
        // garbage-collects the right vertex
        if i == 0 && endpoints[1] > vertex {
            endpoints[1] -= 1;
        }
    }

    Ok(result)
}

/// Refreshes every load-bearing edge's length to the current endpoint
/// distance. A Rope keeps its user-entered maximum length when it has one.
pub fn update_edge_lengths(structure: &Structure) -> Structure {
    let mut result = structure.clone();

    for edge in result.edges.iter_mut() {
        let span = geometry::length(
            &structure.vertices[edge.v[0]].p,
            &structure.vertices[edge.v[1]].p,
        );

        if edge.kind.is_load_bearing() || edge.length <= 0.0 {
            edge.length = span;
        }
    }

    result
}
