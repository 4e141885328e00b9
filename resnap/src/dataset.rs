use std::{fs::File, io::BufReader, path::Path};

use matfile::{MatFile, NumericData};
use nalgebra::{DMatrix, DVector};

use crate::{Error, Result, NUM_FOLDS};

/// The training structures.
/// `x` has one row per structure, column 0 is its number of atoms and the remaining
/// columns are its descriptors. `y` holds the energy of each structure.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub(crate) x: DMatrix<f64>,
    pub(crate) y: DVector<f64>,
}

impl Dataset {
    /// Validate the shapes and wrap the arrays
    pub fn new(x: DMatrix<f64>, y: DVector<f64>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(Error::Shape(format!(
                "X has {} rows but y has {}",
                x.nrows(),
                y.len()
            )));
        }
        if x.ncols() == 0 {
            return Err(Error::Shape("X needs at least the atom count column".to_string()));
        }
        if x.nrows() < NUM_FOLDS {
            return Err(Error::TooFewRows {
                rows: x.nrows(),
                min: NUM_FOLDS,
            });
        }
        if let Some(row) = x.row_iter().position(|r| r.iter().any(|v| !v.is_finite())) {
            return Err(Error::NonFinite { array: "X", row });
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFinite { array: "y", row });
        }

        Ok(Self { x, y })
    }

    /// Feature matrix, atom counts in column 0
    #[inline(always)]
    pub fn x(&self) -> &DMatrix<f64> {
        &self.x
    }

    /// Energy per structure
    #[inline(always)]
    pub fn y(&self) -> &DVector<f64> {
        &self.y
    }

    /// Number of structures
    #[inline(always)]
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    /// Number of descriptor columns, excluding the atom count
    #[inline(always)]
    pub fn n_descriptors(&self) -> usize {
        self.x.ncols() - 1
    }

    /// Number of atoms of each structure
    pub fn atom_counts(&self) -> DVector<f64> {
        self.x.column(0).into_owned()
    }
}

/// Reads a dataset from some persisted source
pub trait DatasetLoader {
    /// Load the `X` and `y` arrays stored at `path`
    fn load(&self, path: &Path) -> Result<Dataset>;
}

/// Choose the loader by file extension, `.mat` files are read as MATLAB files and anything
/// else as csv
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let is_mat = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("mat"))
        .unwrap_or(false);

    let dataset = if is_mat {
        MatLoader.load(path)?
    } else {
        CsvLoader.load(path)?
    };
    info!(
        "loaded {} structures with {} descriptors from {}",
        dataset.n_samples(),
        dataset.n_descriptors(),
        path.display()
    );

    Ok(dataset)
}

/// MATLAB level 5 files holding two numeric arrays named `X` and `y`
#[derive(Debug, Clone, Copy, Default)]
pub struct MatLoader;

impl DatasetLoader for MatLoader {
    fn load(&self, path: &Path) -> Result<Dataset> {
        let file = File::open(path)?;
        let mat = MatFile::parse(BufReader::new(file))
            .map_err(|e| Error::MatFile(format!("{}: {:?}", path.display(), e)))?;

        let x = read_mat_array(&mat, "X")?;
        let y = read_mat_array(&mat, "y")?;
        let y: DVector<f64> = if y.ncols() == 1 {
            y.column(0).into_owned()
        } else if y.nrows() == 1 {
            y.row(0).transpose()
        } else {
            return Err(Error::Shape(format!(
                "y must be a vector, got {}x{}",
                y.nrows(),
                y.ncols()
            )));
        };

        Dataset::new(x, y)
    }
}

fn read_mat_array(mat: &MatFile, name: &str) -> Result<DMatrix<f64>> {
    let array = mat
        .find_by_name(name)
        .ok_or_else(|| Error::MissingArray(name.to_string()))?;
    let size = array.size();
    if size.len() != 2 {
        return Err(Error::Shape(format!(
            "{} must be two dimensional, got {} dimensions",
            name,
            size.len()
        )));
    }
    info!("loaded {} data! ({}, {})", name, size[0], size[1]);

    // MATLAB stores column major, same as nalgebra
    let data: Vec<f64> = match array.data() {
        NumericData::Double { real, .. } => real.clone(),
        NumericData::Single { real, .. } => real.iter().map(|v| *v as f64).collect(),
        _ => {
            return Err(Error::MatFile(format!(
                "array {} does not hold floating point data",
                name
            )))
        }
    };
    if data.len() != size[0] * size[1] {
        return Err(Error::Shape(format!(
            "{} declares {}x{} but holds {} values",
            name,
            size[0],
            size[1],
            data.len()
        )));
    }

    Ok(DMatrix::from_column_slice(size[0], size[1], &data))
}

/// Csv files with a header row. The column named `y` holds the energies, all other columns
/// form `X` in the order they appear, the first of them being the atom count.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvLoader;

impl DatasetLoader for CsvLoader {
    fn load(&self, path: &Path) -> Result<Dataset> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let headers = rdr.headers()?.clone();
        let y_col = headers
            .iter()
            .position(|h| h == "y")
            .ok_or_else(|| Error::MissingArray("y".to_string()))?;
        let n_cols = headers.len() - 1;

        let mut x_data: Vec<f64> = Vec::new();
        let mut y_data: Vec<f64> = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            for (j, field) in record.iter().enumerate() {
                let value: f64 = field.parse().map_err(|_| Error::Parse {
                    context: format!("row {}, column '{}'", row + 1, &headers[j]),
                    value: field.to_string(),
                })?;
                if j == y_col {
                    y_data.push(value);
                } else {
                    x_data.push(value);
                }
            }
        }
        info!("loaded X data! ({}, {})", y_data.len(), n_cols);
        info!("loaded y data! ({}, 1)", y_data.len());

        let x = DMatrix::from_row_slice(y_data.len(), n_cols, &x_data);
        Dataset::new(x, DVector::from_vec(y_data))
    }
}
