//! Environment variable source: POLARIS_ prefix with __ separator for nested keys,
//! e.g. `POLARIS_WORKFLOW__INTERNAL_KEY` or `POLARIS_PROVIDER__MODEL`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "POLARIS";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
