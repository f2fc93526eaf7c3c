use json::JsonValue;

use crate::{
    datatypes::{
        Edge, EdgeKind, ForceBreakdown, Point, ResultBatch, SimulationSettings, Structure, Vertex,
        VertexKind,
    },
    error::FloodgateError,
    geometry,
};
use nalgebra::Vector2;

/// Flattens a Structure into the simulation-exchange format: parallel arrays
/// for vertex and edge attributes plus the scalar water level and the solver
/// settings.
///
/// # Arguments
/// * `structure` - The structure to flatten
/// * `water_level` - The current water level in meters
/// * `settings` - Solver settings forwarded to the simulation service
///
/// # Returns
/// The exchange-format json object
pub fn to_exchange(
    structure: &Structure,
    water_level: f64,
    settings: &SimulationSettings,
) -> JsonValue {
    let mut vertices = JsonValue::new_array();
    let mut vertex_types = JsonValue::new_array();
    let mut buoyant_radii = JsonValue::new_array();

    for vertex in &structure.vertices {
        vertices.push(vec![vertex.p.x, vertex.p.y]).unwrap();
        vertex_types.push(vertex.kind.code()).unwrap();
        buoyant_radii.push(vertex.buoyant_radius).unwrap();
    }

    let mut edges = JsonValue::new_array();
    let mut edge_types = JsonValue::new_array();
    let mut edge_lengths = JsonValue::new_array();
    let mut edge_splits = JsonValue::new_array();

    for edge in &structure.edges {
        edges.push(vec![edge.v[0], edge.v[1]]).unwrap();
        edge_types.push(edge.kind.code()).unwrap();
        edge_lengths.push(edge.length).unwrap();
        edge_splits.push(edge.split_size).unwrap();
    }

    let mut data = JsonValue::new_object();
    data["vertices"] = vertices;
    data["edges"] = edges;
    data["vertexTypes"] = vertex_types;
    data["vertexBoyantRadiai"] = buoyant_radii;
    data["edgeTypes"] = edge_types;
    data["edgeLengths"] = edge_lengths;
    data["edgeSplits"] = edge_splits;
    data["waterLevel"] = water_level.into();
    data["waterLevelRaiseRate"] = settings.water_level_raise_rate.into();
    data["timeStep"] = settings.time_step.into();
    data["maxIterations"] = settings.max_iterations.into();
    data["simulationMethod"] = settings.simulation_method.clone().into();

    data
}

fn parse_point(value: &JsonValue) -> Result<Point, FloodgateError> {
    match (value[0].as_f64(), value[1].as_f64()) {
        (Some(x), Some(y)) => Ok(Point { x, y }),
        _ => Err(FloodgateError::Input(format!(
            "Non-float position pair {value}"
        ))),
    }
}

/// Rebuilds a Structure from the exchange format.
///
/// Edge lengths absent from the data are recomputed as the current endpoint
/// distance; absent split sizes default to 1. No validation beyond shape is
/// performed here; invariant violations surface later in the tracer and the
/// water polygon builder.
///
/// # Arguments
/// * `data` - The exchange-format json object
///
/// # Returns
/// The structure and the water level, in that order
pub fn from_exchange(data: &JsonValue) -> Result<(Structure, f64), FloodgateError> {
    if !data.has_key("vertices") {
        return Err(FloodgateError::Input(
            "Exchange json missing vertices field".to_string(),
        ));
    }
    if !data.has_key("edges") {
        return Err(FloodgateError::Input(
            "Exchange json missing edges field".to_string(),
        ));
    }
    if !data.has_key("vertexTypes") {
        return Err(FloodgateError::Input(
            "Exchange json missing vertexTypes field".to_string(),
        ));
    }
    if !data.has_key("edgeTypes") {
        return Err(FloodgateError::Input(
            "Exchange json missing edgeTypes field".to_string(),
        ));
    }
    if !data.has_key("waterLevel") {
        return Err(FloodgateError::Input(
            "Exchange json missing waterLevel field".to_string(),
        ));
    }

    let mut vertices: Vec<Vertex> = Vec::new();

    for (i, position) in data["vertices"].members().enumerate() {
        let code = match data["vertexTypes"][i].as_u8() {
            Some(c) => c,
            None => {
                return Err(FloodgateError::Input(format!(
                    "Missing or non-integer type for vertex {i}"
                )))
            }
        };

        vertices.push(Vertex {
            p: parse_point(position)?,
            kind: VertexKind::from_code(code)?,
            buoyant_radius: data["vertexBoyantRadiai"][i].as_f64().unwrap_or(0.0),
        });
    }

    let mut edges: Vec<Edge> = Vec::new();

    for (i, endpoints) in data["edges"].members().enumerate() {
        let (v0, v1) = match (endpoints[0].as_usize(), endpoints[1].as_usize()) {
            (Some(v0), Some(v1)) => (v0, v1),
            _ => {
                return Err(FloodgateError::Input(format!(
                    "Non-integer endpoint pair for edge {i}"
                )))
            }
        };

        let code = match data["edgeTypes"][i].as_u8() {
            Some(c) => c,
            None => {
                return Err(FloodgateError::Input(format!(
                    "Missing or non-integer type for edge {i}"
                )))
            }
        };

        let length = match data["edgeLengths"][i].as_f64() {
            Some(length) if length > 0.0 => length,
            _ => geometry::length(&vertices[v0].p, &vertices[v1].p),
        };

        let split_size = match data["edgeSplits"][i].as_usize() {
            Some(split_size) if split_size >= 1 => split_size,
            _ => 1,
        };

        edges.push(Edge {
            v: [v0, v1],
            kind: EdgeKind::from_code(code)?,
            length,
            split_size,
        });
    }

    let water_level = match data["waterLevel"].as_f64() {
        Some(level) => level,
        None => {
            return Err(FloodgateError::Input(
                "Non-float waterLevel field".to_string(),
            ))
        }
    };

    Ok((Structure { vertices, edges }, water_level))
}

// the service accepts both number and string encodings for these
fn numeric_field(value: &JsonValue, default: f64) -> f64 {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .unwrap_or(default)
}

/// Reads the optional solver settings from an exchange json, falling back to
/// the service defaults for absent fields.
pub fn parse_settings(data: &JsonValue) -> SimulationSettings {
    let defaults = SimulationSettings::default();

    SimulationSettings {
        water_level_raise_rate: numeric_field(
            &data["waterLevelRaiseRate"],
            defaults.water_level_raise_rate,
        ),
        time_step: numeric_field(&data["timeStep"], defaults.time_step),
        max_iterations: numeric_field(&data["maxIterations"], defaults.max_iterations as f64)
            as usize,
        simulation_method: data["simulationMethod"]
            .as_str()
            .unwrap_or(&defaults.simulation_method)
            .to_owned(),
    }
}

fn parse_force_row(row: &JsonValue, step: usize) -> Result<ForceBreakdown, FloodgateError> {
    let mut components = [0.0_f64; 10];

    for (j, component) in components.iter_mut().enumerate() {
        *component = match row[j].as_f64() {
            Some(c) => c,
            None => {
                return Err(FloodgateError::Input(format!(
                    "Malformed force row in step {step}: expected 10 numbers, got {row}"
                )))
            }
        };
    }

    Ok(ForceBreakdown {
        total: Vector2::new(components[0], components[1]),
        water_pressure: Vector2::new(components[2], components[3]),
        tensor: Vector2::new(components[4], components[5]),
        gravity: Vector2::new(components[6], components[7]),
        buoyancy: Vector2::new(components[8], components[9]),
    })
}

/// Decodes a batch of simulation result frames: per-step vertex positions and
/// water levels, plus the optional per-vertex force rows.
///
/// # Arguments
/// * `data` - The result json emitted by the simulation service
///
/// # Returns
/// A ResultBatch instance
pub fn parse_result_batch(data: &JsonValue) -> Result<ResultBatch, FloodgateError> {
    if !data.has_key("vertexPositions") {
        return Err(FloodgateError::Input(
            "Result json missing vertexPositions field".to_string(),
        ));
    }

    let mut vertex_positions: Vec<Vec<Point>> = Vec::new();
    for step in data["vertexPositions"].members() {
        let mut positions: Vec<Point> = Vec::new();
        for position in step.members() {
            positions.push(parse_point(position)?);
        }
        vertex_positions.push(positions);
    }

    let mut forces: Vec<Vec<ForceBreakdown>> = Vec::new();
    for (i, step) in data["forces"].members().enumerate() {
        let mut step_forces: Vec<ForceBreakdown> = Vec::new();
        for row in step.members() {
            step_forces.push(parse_force_row(row, i)?);
        }
        forces.push(step_forces);
    }

    let mut water_level: Vec<f64> = Vec::new();
    for level in data["waterLevel"].members() {
        match level.as_f64() {
            Some(level) => water_level.push(level),
            None => {
                return Err(FloodgateError::Input(
                    "Non-float entry in result waterLevel series".to_string(),
                ))
            }
        }
    }

    let total_steps = data["totalSteps"]
        .as_usize()
        .unwrap_or(vertex_positions.len());

    Ok(ResultBatch {
        vertex_positions,
        forces,
        water_level,
        total_steps,
    })
}

/// Loads and parses a scenario file in the exchange format
///
/// # Arguments
/// * `path` - The path to the scenario json file
///
/// # Returns
/// The structure, the water level, and the solver settings, in that order
pub fn load_scenario(
    path: &str,
) -> Result<(Structure, f64, SimulationSettings), FloodgateError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_err) => {
            return Err(FloodgateError::Input(format!(
                "Unable to open scenario file {}",
                path
            )))
        }
    };

    let data = match json::parse(&contents) {
        Ok(d) => d,
        Err(err) => {
            return Err(FloodgateError::Input(format!(
                "Error in scenario json: {err}"
            )))
        }
    };

    let (structure, water_level) = from_exchange(&data)?;
    let settings = parse_settings(&data);

    println!(
        "info: loaded {} vertices and {} edges",
        structure.vertices.len(),
        structure.edges.len()
    );

    Ok((structure, water_level, settings))
}

/// Loads and parses a simulation result file
///
/// # Arguments
/// * `path` - The path to the result json file
///
/// # Returns
/// A ResultBatch instance
pub fn load_result_batch(path: &str) -> Result<ResultBatch, FloodgateError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_err) => {
            return Err(FloodgateError::Input(format!(
                "Unable to open result file {}",
                path
            )))
        }
    };

    let data = match json::parse(&contents) {
        Ok(d) => d,
        Err(err) => {
            return Err(FloodgateError::Input(format!("Error in result json: {err}")))
        }
    };

    let batch = parse_result_batch(&data)?;

    println!(
        "info: loaded {} result steps of {} total",
        batch.vertex_positions.len(),
        batch.total_steps
    );

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // the original floodgate scene: three floor vertices, two raised ones,
    // four rods up the gate arm and one rope brace
    fn gate_structure() -> Structure {
        let positions = [
            (0.0, 0.0),
            (-1.0, 0.0),
            (-2.0, 0.0),
            (-1.3, 0.5),
            (-0.6, 1.0),
        ];
        let kinds = [
            VertexKind::Fixed,
            VertexKind::Fixed,
            VertexKind::Fixed,
            VertexKind::Free,
            VertexKind::Free,
        ];

        let vertices: Vec<Vertex> = positions
            .iter()
            .zip(kinds)
            .map(|(&(x, y), kind)| Vertex {
                p: Point { x, y },
                kind,
                buoyant_radius: 0.0,
            })
            .collect();

        let spans = [[0, 1], [1, 2], [2, 3], [3, 4], [1, 3]];
        let edges: Vec<Edge> = spans
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let kind = if i == 4 { EdgeKind::Rope } else { EdgeKind::Rod };
                let length = if i == 4 {
                    0.8
                } else {
                    geometry::length(&vertices[v[0]].p, &vertices[v[1]].p)
                };
                Edge {
                    v,
                    kind,
                    length,
                    split_size: 1,
                }
            })
            .collect();

        Structure { vertices, edges }
    }

    #[test]
    fn round_trip_preserves_the_structure() {
        let structure = gate_structure();
        let data = to_exchange(&structure, 0.8, &SimulationSettings::default());

        let (rebuilt, water_level) = from_exchange(&data).unwrap();

        assert_relative_eq!(water_level, 0.8);
        assert_eq!(rebuilt.vertices.len(), structure.vertices.len());
        assert_eq!(rebuilt.edges.len(), structure.edges.len());

        for (rebuilt, original) in rebuilt.vertices.iter().zip(&structure.vertices) {
            assert_relative_eq!(rebuilt.p.x, original.p.x);
            assert_relative_eq!(rebuilt.p.y, original.p.y);
            assert_eq!(rebuilt.kind, original.kind);
        }
        for (rebuilt, original) in rebuilt.edges.iter().zip(&structure.edges) {
            assert_eq!(rebuilt.v, original.v);
            assert_eq!(rebuilt.kind.code(), original.kind.code());
            assert_relative_eq!(rebuilt.length, original.length);
            assert_eq!(rebuilt.split_size, original.split_size);
        }
    }

    #[test]
    fn settings_survive_the_exchange() {
        let settings = SimulationSettings {
            water_level_raise_rate: 0.2,
            time_step: 0.005,
            max_iterations: 500,
            simulation_method: "Forward Euler".to_owned(),
        };
        let data = to_exchange(&gate_structure(), 0.8, &settings);

        let parsed = parse_settings(&data);

        assert_relative_eq!(parsed.water_level_raise_rate, 0.2);
        assert_relative_eq!(parsed.time_step, 0.005);
        assert_eq!(parsed.max_iterations, 500);
        assert_eq!(parsed.simulation_method, "Forward Euler");
    }

    #[test]
    fn absent_lengths_and_splits_fall_back() {
        let data = json::parse(
            r#"{
                "vertices": [[0.0, 0.0], [3.0, 4.0]],
                "edges": [[0, 1]],
                "vertexTypes": [1, 0],
                "edgeTypes": [0],
                "waterLevel": 1.0
            }"#,
        )
        .unwrap();

        let (structure, _) = from_exchange(&data).unwrap();

        assert_relative_eq!(structure.edges[0].length, 5.0);
        assert_eq!(structure.edges[0].split_size, 1);
    }

    #[test]
    fn unknown_edge_code_is_an_input_error() {
        let data = json::parse(
            r#"{
                "vertices": [[0.0, 0.0], [1.0, 0.0]],
                "edges": [[0, 1]],
                "vertexTypes": [1, 0],
                "edgeTypes": [7],
                "waterLevel": 1.0
            }"#,
        )
        .unwrap();

        assert!(from_exchange(&data).is_err());
    }

    #[test]
    fn missing_required_field_is_an_input_error() {
        let data = json::parse(
            r#"{
                "vertices": [[0.0, 0.0]],
                "vertexTypes": [1]
            }"#,
        )
        .unwrap();

        assert!(from_exchange(&data).is_err());
    }

    #[test]
    fn settings_accept_string_and_number_encodings() {
        let data = json::parse(
            r#"{
                "timeStep": "0.005",
                "maxIterations": 500,
                "waterLevelRaiseRate": 0.2
            }"#,
        )
        .unwrap();

        let settings = parse_settings(&data);

        assert_relative_eq!(settings.time_step, 0.005);
        assert_eq!(settings.max_iterations, 500);
        assert_relative_eq!(settings.water_level_raise_rate, 0.2);
        assert_eq!(settings.simulation_method, "Backward Euler");
    }

    #[test]
    fn settings_default_when_absent() {
        let settings = parse_settings(&json::parse("{}").unwrap());

        assert_relative_eq!(settings.time_step, 0.01);
        assert_eq!(settings.max_iterations, 1000);
        assert_relative_eq!(settings.water_level_raise_rate, 0.0);
        assert_eq!(settings.simulation_method, "Backward Euler");
    }

    #[test]
    fn force_rows_decode_by_fixed_flat_index() {
        let data = json::parse(
            r#"{
                "vertexPositions": [[[0.0, 0.0]]],
                "forces": [[[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]]],
                "waterLevel": [0.8],
                "totalSteps": 10
            }"#,
        )
        .unwrap();

        let batch = parse_result_batch(&data).unwrap();
        let force = &batch.forces[0][0];

        assert_relative_eq!(force.total.x, 0.0);
        assert_relative_eq!(force.total.y, 1.0);
        assert_relative_eq!(force.water_pressure.x, 2.0);
        assert_relative_eq!(force.water_pressure.y, 3.0);
        assert_relative_eq!(force.tensor.x, 4.0);
        assert_relative_eq!(force.tensor.y, 5.0);
        assert_relative_eq!(force.gravity.x, 6.0);
        assert_relative_eq!(force.gravity.y, 7.0);
        assert_relative_eq!(force.buoyancy.x, 8.0);
        assert_relative_eq!(force.buoyancy.y, 9.0);

        assert_eq!(batch.total_steps, 10);
        assert_relative_eq!(batch.water_level[0], 0.8);
    }

    #[test]
    fn short_force_row_is_an_input_error() {
        let data = json::parse(
            r#"{
                "vertexPositions": [[[0.0, 0.0]]],
                "forces": [[[0.0, 1.0, 2.0]]]
            }"#,
        )
        .unwrap();

        assert!(parse_result_batch(&data).is_err());
    }

    #[test]
    fn batch_without_forces_decodes_positions_only() {
        let data = json::parse(
            r#"{
                "vertexPositions": [
                    [[0.0, 0.0], [1.0, 2.0]],
                    [[0.1, 0.0], [1.1, 1.9]]
                ],
                "waterLevel": [0.8, 0.85]
            }"#,
        )
        .unwrap();

        let batch = parse_result_batch(&data).unwrap();

        assert_eq!(batch.vertex_positions.len(), 2);
        assert_eq!(batch.total_steps, 2);
        assert!(batch.forces.is_empty());
        assert_relative_eq!(batch.vertex_positions[1][1].y, 1.9);
    }
}
