use crate::{
    datatypes::{Edge, Point, Structure},
    tracer,
};

// any real exit lands to the right of this
const EXIT_SENTINEL: f64 = -10000.0;

fn crossing_point(first: &Point, second: &Point, water_level: f64) -> Point {
    let angular_coeff = (second.y - first.y) / (second.x - first.x);

    Point {
        x: (water_level - first.y) / angular_coeff + first.x,
        y: water_level,
    }
}

/// Builds the closed wetted-region polygon from a traced edge order.
///
/// The scan walks the backbone once, toggling between an in-water and an
/// out-of-water state. Wet stretches accumulate in a pending buffer that is
/// only committed when the exit position does not fall left of the previous
/// one, so an out-of-order branch cannot corrupt a span already scanned.
/// Buoyant vertices can hold water above the nominal level; when one ends a
/// span, an extra vertex at the water line records the held meniscus.
///
/// # Arguments
/// * `positions` - Current vertex positions
/// * `buoyant_radii` - Per-vertex buoy radii, zero for no buoy
/// * `ordered_edges` - The tracer's reordered edge list
/// * `origin` - The origin vertex index
/// * `water_level` - The water level in meters
///
/// # Returns
/// The polygon as an ordered point list, closed against the right boundary
pub fn compute_polygon(
    positions: &[Point],
    buoyant_radii: &[f64],
    ordered_edges: &[Edge],
    origin: usize,
    water_level: f64,
) -> Vec<Point> {
    let mut result: Vec<Point> = vec![positions[origin]];
    let mut pending: Vec<Point> = Vec::new();

    let mut in_water = true;
    let mut exit_position = EXIT_SENTINEL;
    let mut buoy_edge: Option<Point> = None;

    for edge in ordered_edges {
        if !edge.kind.is_load_bearing() {
            continue;
        }

        let first = positions[edge.v[0]];
        let second = positions[edge.v[1]];

        if in_water {
            // if either endpoint is under water, the edge is wet
            if first.y < water_level || second.y < water_level {
                if second.y >= water_level {
                    pending.push(crossing_point(&first, &second, water_level));
                } else {
                    pending.push(second);
                }
            }

            // leaving water, unless a buoy on the far endpoint keeps holding
            if first.y < water_level && water_level <= second.y + buoyant_radii[edge.v[1]] {
                in_water = false;

                let mut new_exit_position =
                    second.x - (second.y - water_level) * (second.x - first.x) / (second.y - first.y);

                if water_level > second.y {
                    new_exit_position = second.x;

                    if new_exit_position >= exit_position {
                        // the buoy is still holding water above the structure
                        buoy_edge = Some(Point {
                            x: second.x,
                            y: water_level,
                        });
                    }
                }

                if new_exit_position >= exit_position {
                    result.append(&mut pending);
                } else {
                    pending.clear();
                }

                exit_position = new_exit_position;
            }
        } else if water_level > second.y {
            let mut enter_position =
                second.x - (second.y - water_level) * (second.x - first.x) / (second.y - first.y);

            if water_level > first.y {
                enter_position = first.x;
            }

            // re-entries left of the last exit are stale
            if enter_position >= exit_position {
                if second.y + buoyant_radii[edge.v[1]] > water_level {
                    buoy_edge = Some(Point {
                        x: second.x,
                        y: water_level,
                    });
                }

                pending.push(crossing_point(&first, &second, water_level));
                pending.push(second);

                in_water = true;
            }
        }
    }

    // nothing ever surfaced: the whole structure is under water
    if result.len() == 1 {
        return vec![
            Point { x: 100.0, y: 0.0 },
            Point { x: -100.0, y: 0.0 },
            Point {
                x: -100.0,
                y: water_level,
            },
            Point {
                x: 100.0,
                y: water_level,
            },
        ];
    }

    if let Some(buoy) = buoy_edge {
        result.push(buoy);
    }
    result.push(Point {
        x: 100.0,
        y: water_level,
    });
    result.push(Point { x: 100.0, y: 0.0 });

    result
}

/// Derives the wetted-region polygon for a structure at a given water level
///
/// # Arguments
/// * `structure` - The structure to scan
/// * `water_level` - The water level in meters
///
/// # Returns
/// The closed polygon as an ordered point list
pub fn run(structure: &Structure, water_level: f64) -> Vec<Point> {
    let positions = structure.positions();
    let buoyant_radii = structure.buoyant_radii();

    run_with_positions(&positions, &buoyant_radii, &structure.edges, water_level)
}

/// Same as `run`, but over substituted vertex positions, e.g. one frame of a
/// simulation result. Edge topology and buoy radii stay the structure's own.
pub fn run_with_positions(
    positions: &[Point],
    buoyant_radii: &[f64],
    edges: &[Edge],
    water_level: f64,
) -> Vec<Point> {
    let origin = tracer::origin_vertex(positions);
    let ordered = tracer::pre_order_edges(edges, origin);

    compute_polygon(positions, buoyant_radii, &ordered, origin, water_level)
}
