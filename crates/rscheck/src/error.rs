/// Startup-fatal problems specific to the binary crate's own ambient
/// concerns (YAML loading, CLI) — probe- and check-level configuration
/// problems are `rscheck_core::ConfigError`, wrapped here.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Check(#[from] rscheck_core::ConfigError),
}
