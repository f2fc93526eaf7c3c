use std::io::Write;

use crate::{datatypes::Point, error::FloodgateError};

/// Writes computed water polygons to a CSV file, one row per polygon point
/// with the owning step in the first column
///
/// # Arguments
/// * `polygons` - One polygon per simulation step
/// * `output` - The filename of the output csv
pub fn csv_output(polygons: &Vec<Vec<Point>>, output: &str) -> Result<(), FloodgateError> {
    let mut polygon_file = match std::fs::File::create(output) {
        Ok(f) => f,
        Err(err) => {
            return Err(FloodgateError::Output(format!(
                "Failed to create {output}: {err}"
            )));
        }
    };

    polygon_file.write("step,x,y\n".as_bytes()).unwrap();

    for (step, polygon) in polygons.iter().enumerate() {
        for point in polygon {
            polygon_file
                .write(format!("{step},{x},{y}\n", x = point.x, y = point.y).as_bytes())
                .unwrap();
        }
    }

    println!(
        "info: wrote {} polygons to {}",
        polygons.len(),
        output
    );

    Ok(())
}
