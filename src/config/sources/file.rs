//! File sources: the optional global config file and an explicit `--config` file.

use config::builder::DefaultState;
use config::{ConfigBuilder, File};
use std::path::Path;

/// Global file; silently skipped when absent.
pub fn add_global(
    builder: ConfigBuilder<DefaultState>,
    path: Option<&Path>,
) -> ConfigBuilder<DefaultState> {
    match path {
        Some(path) => builder.add_source(File::from(path).required(false)),
        None => builder,
    }
}

/// Explicit file; must exist.
pub fn add_explicit(builder: ConfigBuilder<DefaultState>, path: &Path) -> ConfigBuilder<DefaultState> {
    builder.add_source(File::from(path).required(true))
}
