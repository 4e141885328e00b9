use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading data, training or writing a potential
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the dataset or writing the potential failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed csv dataset
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed or unsupported MATLAB file
    #[error("failed to read mat file: {0}")]
    MatFile(String),

    /// The data source lacks one of the required arrays
    #[error("dataset has no array named '{0}'")]
    MissingArray(String),

    /// A value could not be parsed as a float
    #[error("cannot parse '{value}' in {context}")]
    Parse {
        /// Where the value was found
        context: String,
        /// The offending text
        value: String,
    },

    /// Array dimensions do not fit together
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// X or y holds NaN or infinite values
    #[error("{array} holds a non finite value in row {row}")]
    NonFinite {
        /// Name of the offending array
        array: &'static str,
        /// First row with a non finite value
        row: usize,
    },

    /// Not enough structures to build the folds
    #[error("dataset has {rows} rows, at least {min} are needed")]
    TooFewRows {
        /// Rows in the dataset
        rows: usize,
        /// Required minimum
        min: usize,
    },

    /// Cross validation was asked to sweep no alpha at all
    #[error("the alpha sweep is empty")]
    EmptySweep,

    /// Unknown feature norm name
    #[error("unknown norm '{0}', expected one of l1, l2, max")]
    UnknownNorm(String),

    /// Unknown plot mode name
    #[error("unknown plot mode '{0}', expected atom or sample")]
    UnknownPlotMode(String),

    /// Rendering a figure failed
    #[error("plotting failed: {0}")]
    Plot(String),

    /// The linear solver failed or an unknown model kind was requested
    #[error(transparent)]
    LinReg(#[from] lin_reg::LinRegError),
}
