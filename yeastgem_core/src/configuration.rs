use std::sync::{LazyLock, PoisonError, RwLock, RwLockReadGuard};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Process wide defaults used while building and locating models
#[derive(Clone, Debug)]
pub struct Configuration {
    /// Lower flux bound given to reversible reactions which don't specify one
    pub lower_bound: f64,
    /// Upper flux bound given to reactions which don't specify one
    pub upper_bound: f64,
    /// Name of the file which marks the root of the model repository
    pub root_marker: String,
    /// Location of the SBML model file, relative to the repository root
    pub model_relative_path: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            root_marker: ".env".to_string(),
            model_relative_path: "ModelFiles/xml/yeastGEM.xml".to_string(),
        }
    }
}

/// Read the current configuration, recovering the guard if the lock was poisoned
pub fn read_configuration() -> RwLockReadGuard<'static, Configuration> {
    CONFIGURATION
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}
