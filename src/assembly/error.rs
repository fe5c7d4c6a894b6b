use thiserror::Error;

/// Contract violations reported by the assembly and alignment entry points
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("Coverage threshold must be a positive number, got {0}")]
    InvalidCoverageThreshold(f64),

    #[error("Invalid k-mer length {k}: must be between 1 and {max}")]
    InvalidKmerLength { k: usize, max: usize },

    #[error("K-mer length must be positive")]
    ZeroKmerLength,

    #[error("Malformed graph at node {node}: {reason}")]
    MalformedGraph { node: usize, reason: String },

    #[error("No input {0} supplied")]
    EmptyInput(&'static str),

    #[error("K-mer length mismatch: graph uses {graph}, caller requested {requested}")]
    InconsistentKmerLength { graph: usize, requested: usize },

    #[error("Cannot estimate k-mer length: shortest read ({shortest}) is below the required {required}")]
    ReadsTooShort { shortest: usize, required: usize },
}
