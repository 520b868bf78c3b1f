use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Duplicate unit name: {0}")]
    DuplicateUnit(String),

    #[error("Duplicate task {name} in {scope}")]
    DuplicateTask { scope: String, name: String },

    #[error("Unknown dependency {dependency} declared by {dependent}")]
    UnknownDependency {
        dependent: String,
        dependency: String,
    },

    #[error("Dependency from {from} to {to} would create a cycle")]
    DependencyCycle { from: String, to: String },

    #[error("Unit {unit} has no artifact registered for role {role}")]
    MissingArtifact { unit: String, role: String },

    #[error("Stage {0} cannot mix work units and bare tasks")]
    MixedStage(String),

    #[error("Task {0} is sealed and can no longer be modified")]
    TaskSealed(String),

    #[error("Cohort has no sample units to combine")]
    EmptyCohort,

    #[error("Unsupported descriptor format: {0}")]
    DescriptorFormat(String),

    #[error("Unsupported descriptor version {found} (expected {expected})")]
    DescriptorVersion { found: u32, expected: u32 },

    #[error("Program not found: {0}")]
    ProgramNotFound(String),

    #[error("Task {task} exited with status {status}")]
    ExecutionFailed { task: String, status: i32 },

    #[error("Unit {unit} not started: dependency {dependency} failed")]
    DependencyFailed { unit: String, dependency: String },

    #[error("Unknown job handle: {0}")]
    UnknownHandle(String),

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

pub type Result<T> = std::result::Result<T, Error>;
