pub mod settings;

pub use settings::{
    generate_default_config, DockerConnection, DockerSettings, ScriptSettings, ServerSettings,
    Settings,
};
