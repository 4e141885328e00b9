//! Train linear interatomic potentials mapping per structure descriptors to energies.
//!
//! A [`Dataset`] holds the feature matrix `X`, whose first column is the number of atoms of
//! each structure, and the energies `y`. [`CrossValidator`] sweeps the regularization strength
//! with 5-fold cross validation and reports the mean per-atom error, [`PotentialFitter`] fits
//! the final model on the whole dataset and writes its coefficients as a potential file.

#![warn(missing_docs)]

#[macro_use]
extern crate log;

mod cross_validation;
mod dataset;
mod error;
mod normalization;
mod potential;
mod sink;
mod trainer;

pub use cross_validation::{
    per_atom_error, AlphaReport, CrossValidator, CvParams, CvReport, FoldParity, Folds,
    ParitySet, PlotMode, Split, NUM_FOLDS,
};
pub use dataset::{load_dataset, CsvLoader, Dataset, DatasetLoader, MatLoader};
pub use error::{Error, Result};
pub use lin_reg::ModelKind;
pub use normalization::{normalize, NormKind, NormalizationState};
pub use potential::{read_potential, write_potential, PotentialFitter, POTENTIAL_FILE_NAME};
#[cfg(feature = "plot")]
pub use sink::PngSink;
pub use sink::{NullSink, PlottingSink};
pub use trainer::PotentialTrainer;
