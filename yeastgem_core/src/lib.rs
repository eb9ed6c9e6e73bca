//! Loading and saving the yeast-GEM genome scale metabolic model.
//!
//! The model is read from (and written to) the SBML file kept in the model repository, and can
//! optionally have its identifiers converted to the BiGG naming convention while loading.
//!
//! ```no_run
//! use yeastgem_core::{read_yeast_model, write_yeast_model};
//! let model = read_yeast_model(true).unwrap();
//! println!("{} reactions", model.reactions.len());
//! write_yeast_model(&model).unwrap();
//! ```

pub mod bigg;
pub mod configuration;
pub mod io;
pub mod metabolic_model;
pub mod repository;

pub use repository::{read_yeast_model, write_yeast_model};
