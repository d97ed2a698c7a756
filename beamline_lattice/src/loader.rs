//! Machine directory loading.
//!
//! ```text
//! <dir>/
//! ├── lattice.toml          sections, layouts, default path
//! └── elements/
//!     ├── 01-injector.toml  [[elements]] ...
//!     └── 02-linac.toml
//! ```
//!
//! Catalogue files are read in file-name order, which fixes the registry
//! order. A missing `elements/` directory yields an empty registry.

use std::fs;
use std::path::{Path, PathBuf};

use beamline_common::config::{ConfigError, ConfigLoader};
use beamline_common::consts::{DEFINITIONS_FILE, ELEMENTS_DIR};
use beamline_common::definitions::LatticeDefinitions;
use tracing::{debug, info, warn};

use crate::element::{Element, ElementCatalog};
use crate::error::LatticeResult;
use crate::machine::MachineModel;

/// Load definitions and all element catalogues from `dir`.
///
/// # Errors
/// - `Config(FileNotFound)` if `lattice.toml` is missing
/// - `Config(ParseError)` / `Config(Io)` for unreadable files
/// - `DuplicateElement` if two catalogues define the same name
/// - `InvalidElement` / `Config(ValidationError)` from validation
pub fn load_machine_dir(dir: &Path) -> LatticeResult<MachineModel> {
    info!("Loading machine from {:?}", dir);

    let definitions = LatticeDefinitions::load(&dir.join(DEFINITIONS_FILE))?;
    let mut elements = Vec::new();
    for path in catalog_files(&dir.join(ELEMENTS_DIR))? {
        let catalog = ElementCatalog::load(&path)?;
        debug!(file = ?path, elements = catalog.elements.len(), "Loaded element catalogue");
        elements.extend(catalog.elements);
    }

    let model = MachineModel::with_elements(definitions, elements)?;
    let machine = &model.definitions().machine;
    info!(
        machine = %machine.name,
        log_level = %machine.log_level.as_tracing_level(),
        elements = model.len(),
        layouts = model.definitions().layouts.len(),
        "Machine loaded"
    );
    if !model.diagnostics().is_empty() {
        warn!(
            count = model.diagnostics().len(),
            "Machine definitions produced build diagnostics"
        );
    }
    Ok(model)
}

/// Build a model from in-memory TOML (for testing).
pub fn load_machine_from_strings(
    definitions_toml: &str,
    catalog_tomls: &[&str],
) -> LatticeResult<MachineModel> {
    let definitions = LatticeDefinitions::from_toml_str(definitions_toml)?;
    let mut elements: Vec<Element> = Vec::new();
    for toml in catalog_tomls {
        elements.extend(ElementCatalog::from_toml_str(toml)?.elements);
    }
    MachineModel::with_elements(definitions, elements)
}

/// `*.toml` files in `dir`, sorted by name.
fn catalog_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    if !dir.is_dir() {
        debug!("No element directory at {:?}", dir);
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir)
        .map_err(|e| ConfigError::Io(format!("failed to read {}: {e}", dir.display())))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| ConfigError::Io(format!("failed to read {}: {e}", dir.display())))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LatticeError;

    const DEFS: &str = r#"
[sections]
FODO = ["QUAD1"]

[layouts]
line1 = ["FODO"]
"#;

    #[test]
    fn from_strings() {
        let cat = r#"
[[elements]]
name = "QUAD1"
machine_area = "FODO"
[elements.physical]
middle = 0.1
length = 0.1
"#;
        let model = load_machine_from_strings(DEFS, &[cat]).unwrap();
        assert_eq!(model.layout("line1").unwrap().names(), ["QUAD1"]);
    }

    #[test]
    fn duplicate_across_catalogues() {
        let cat = r#"
[[elements]]
name = "QUAD1"
machine_area = "FODO"
"#;
        assert!(matches!(
            load_machine_from_strings(DEFS, &[cat, cat]),
            Err(LatticeError::DuplicateElement { .. })
        ));
    }

    #[test]
    fn missing_directory() {
        let err = load_machine_dir(Path::new("/nonexistent/machine")).unwrap_err();
        assert!(matches!(err, LatticeError::Config(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn missing_elements_dir_is_empty() {
        assert!(catalog_files(Path::new("/nonexistent/elements")).unwrap().is_empty());
    }
}
