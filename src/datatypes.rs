use nalgebra::Vector2;

use crate::error::FloodgateError;

/// A 2D position in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    Free,
    Fixed,
}

impl VertexKind {
    pub fn code(&self) -> u8 {
        match self {
            VertexKind::Free => 0,
            VertexKind::Fixed => 1,
        }
    }

    pub fn from_code(code: u8) -> Result<VertexKind, FloodgateError> {
        match code {
            0 => Ok(VertexKind::Free),
            1 => Ok(VertexKind::Fixed),
            other => Err(FloodgateError::Input(format!(
                "Unknown vertex type code {other}"
            ))),
        }
    }
}

/// Edge category. Rod and Spring share exchange code 0 and behave identically
/// in the geometry core; Rope is code 2 and never bounds water.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Rod,
    Spring,
    Rope,
}

impl EdgeKind {
    pub fn code(&self) -> u8 {
        match self {
            EdgeKind::Rod | EdgeKind::Spring => 0,
            EdgeKind::Rope => 2,
        }
    }

    /// Decodes an exchange type code. Code 0 always decodes to Rod; the
    /// Spring label cannot survive a round trip through the exchange format.
    pub fn from_code(code: u8) -> Result<EdgeKind, FloodgateError> {
        match code {
            0 => Ok(EdgeKind::Rod),
            2 => Ok(EdgeKind::Rope),
            other => Err(FloodgateError::Input(format!(
                "Unknown edge type code {other}"
            ))),
        }
    }

    pub fn is_load_bearing(&self) -> bool {
        !matches!(self, EdgeKind::Rope)
    }
}

#[derive(Debug, Clone)]
pub struct Vertex {
    pub p: Point,
    pub kind: VertexKind,
    /// Radius of the attached buoy, in meters. Zero means no buoy.
    pub buoyant_radius: f64,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub v: [usize; 2],
    pub kind: EdgeKind,
    /// For a Rope, the maximum extended length entered by the user. For a
    /// Rod or Spring, the endpoint distance frozen at creation time.
    pub length: f64,
    /// Pending subdivision count. 1 means no pending split.
    pub split_size: usize,
}

/// The full editable structure. Vertex index 0 is the protected anchor and
/// is never garbage-collected.
#[derive(Debug, Clone)]
pub struct Structure {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
}

impl Structure {
    pub fn positions(&self) -> Vec<Point> {
        self.vertices.iter().map(|vertex| vertex.p).collect()
    }

    pub fn buoyant_radii(&self) -> Vec<f64> {
        self.vertices
            .iter()
            .map(|vertex| vertex.buoyant_radius)
            .collect()
    }
}

/// Optional solver settings forwarded to the simulation service.
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub water_level_raise_rate: f64,
    pub time_step: f64,
    pub max_iterations: usize,
    pub simulation_method: String,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            water_level_raise_rate: 0.0,
            time_step: 0.01,
            max_iterations: 1000,
            simulation_method: "Backward Euler".to_owned(),
        }
    }
}

/// Per-vertex force decomposition for one simulation step, decoded from the
/// service's flattened 10-number rows.
#[derive(Debug, Clone)]
pub struct ForceBreakdown {
    pub total: Vector2<f64>,
    pub water_pressure: Vector2<f64>,
    pub tensor: Vector2<f64>,
    pub gravity: Vector2<f64>,
    pub buoyancy: Vector2<f64>,
}

/// A batch of simulation result frames. Frame positions substitute for the
/// Structure's own vertex positions during playback; edge topology is shared.
#[derive(Debug, Clone)]
pub struct ResultBatch {
    pub vertex_positions: Vec<Vec<Point>>,
    pub forces: Vec<Vec<ForceBreakdown>>,
    pub water_level: Vec<f64>,
    pub total_steps: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spring_and_rod_share_the_load_bearing_code() {
        assert_eq!(EdgeKind::Spring.code(), EdgeKind::Rod.code());
        assert!(EdgeKind::Spring.is_load_bearing());
        assert!(EdgeKind::Rod.is_load_bearing());
        assert!(!EdgeKind::Rope.is_load_bearing());

        // the shared code always decodes to Rod
        assert_eq!(EdgeKind::from_code(0).unwrap(), EdgeKind::Rod);
        assert_eq!(EdgeKind::from_code(2).unwrap(), EdgeKind::Rope);
        assert!(EdgeKind::from_code(1).is_err());
    }

    #[test]
    fn vertex_codes_round_trip() {
        for kind in [VertexKind::Free, VertexKind::Fixed] {
            assert_eq!(VertexKind::from_code(kind.code()).unwrap(), kind);
        }
        assert!(VertexKind::from_code(3).is_err());
    }
}
