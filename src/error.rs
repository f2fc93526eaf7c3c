use std::fmt::Display;

#[derive(Debug)]
pub enum FloodgateError {
    Input(String),
    Geometry(String),
    Edit(String),
    Output(String),
}

impl Display for FloodgateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (err_name, value) = match self {
            FloodgateError::Input(v) => ("Input", v),
            FloodgateError::Geometry(v) => ("Geometry", v),
            FloodgateError::Edit(v) => ("Edit", v),
            FloodgateError::Output(v) => ("Output", v),
        };

        write!(f, "{} error: {}", err_name, value)
    }
}
