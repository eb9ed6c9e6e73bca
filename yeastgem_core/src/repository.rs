//! Locating, loading and saving the yeast-GEM model stored in the repository
//!
//! The repository root is the closest directory (starting from the working directory) which
//! contains the root marker file, and the model lives at a fixed path below it (see
//! [`Configuration`](crate::configuration::Configuration)).
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::bigg::BiggError;
use crate::configuration::read_configuration;
use crate::io::sbml::SbmlError;
use crate::metabolic_model::model::Model;

#[derive(Error, Debug)]
pub enum YeastModelError {
    #[error("No directory containing {marker} found above {}", .start.display())]
    MarkerNotFound { marker: String, start: PathBuf },
    #[error("Unable to determine the working directory")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sbml(#[from] SbmlError),
    #[error(transparent)]
    Bigg(#[from] BiggError),
}

/// Find the repository root, searching `start` and then each of its ancestors for the root
/// marker file
pub fn find_repo_root_from<P: AsRef<Path>>(start: P) -> Result<PathBuf, YeastModelError> {
    let marker = read_configuration().root_marker.clone();
    let start = start.as_ref();
    for directory in start.ancestors() {
        if directory.join(&marker).is_file() {
            debug!("Found repository root at {}", directory.display());
            return Ok(directory.to_path_buf());
        }
    }
    Err(YeastModelError::MarkerNotFound {
        marker,
        start: start.to_path_buf(),
    })
}

/// Root of the repository containing the working directory
pub fn repo_path() -> Result<PathBuf, YeastModelError> {
    find_repo_root_from(std::env::current_dir()?)
}

/// Location of the SBML model file in the repository
pub fn model_path() -> Result<PathBuf, YeastModelError> {
    let relative = read_configuration().model_relative_path.clone();
    Ok(repo_path()?.join(relative))
}

/// Load the repository's model
///
/// # Parameters
/// - make_bigg_compliant: convert identifiers to the BiGG convention after loading (see
///   [`Model::make_bigg_compliant`]), nothing is done if the model already uses them
pub fn read_yeast_model(make_bigg_compliant: bool) -> Result<Model, YeastModelError> {
    read_yeast_model_from(model_path()?, make_bigg_compliant)
}

/// Load a yeast model from the SBML file at `path`
pub fn read_yeast_model_from<P: AsRef<Path>>(
    path: P,
    make_bigg_compliant: bool,
) -> Result<Model, YeastModelError> {
    let mut model = Model::read_sbml(path.as_ref())?;
    if make_bigg_compliant && model.make_bigg_compliant()? {
        info!("Loaded {} with BiGG identifiers", path.as_ref().display());
    }
    Ok(model)
}

/// Save a model to the repository's model file, replacing it
pub fn write_yeast_model(model: &Model) -> Result<(), YeastModelError> {
    write_yeast_model_to(model, model_path()?)
}

/// Save a model as SBML to `path`, replacing any existing file
pub fn write_yeast_model_to<P: AsRef<Path>>(model: &Model, path: P) -> Result<(), YeastModelError> {
    model.write_sbml(path.as_ref())?;
    Ok(())
}
