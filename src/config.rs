//! Declarative container setup loaded from JSON or YAML.
//!
//! A section lists containers by name; each container lists the types to
//! register together with their scope and the constructor arguments the
//! caller will supply at resolve time.
//!
//! ```yaml
//! containers:
//!   - name: structure
//!     types:
//!       - name: Foo
//!         scope: singleton
//!         ctor:
//!           - name: value
//!             type: userprovided
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::argument::Argument;
use crate::assembly::Assembly;
use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::lifetime::Scope;

/// Root of a configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutowireSection {
    #[serde(default)]
    pub containers: Vec<ContainerConfig>,
}

impl AutowireSection {
    pub fn from_json(text: &str) -> DiResult<Self> {
        serde_json::from_str(text).map_err(|e| DiError::configuration("AutowireSection", e.to_string()))
    }

    pub fn from_yaml(text: &str) -> DiResult<Self> {
        serde_yaml::from_str(text).map_err(|e| DiError::configuration("AutowireSection", e.to_string()))
    }

    /// The container section called `name`.
    pub fn container(&self, name: &str) -> Option<&ContainerConfig> {
        self.containers.iter().find(|c| c.name == name)
    }
}

/// One container and the types registered in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeConfig>,
}

impl ContainerConfig {
    /// Builds a container, looking type names up in `assembly`.
    ///
    /// A type name `assembly` does not know is a configuration error.
    pub fn create(&self, assembly: &Assembly, strict: bool) -> DiResult<Container> {
        let container = Container::with_strict(strict);
        for type_config in &self.types {
            let info = assembly.find(&type_config.name).ok_or_else(|| {
                DiError::configuration(
                    "ContainerConfig",
                    format!("The type '{}' can not be found in '{}'.", type_config.name, assembly.name()),
                )
            })?;

            let configuration = container.configure_tag("", info.tag())?;
            for argument in &type_config.ctor {
                match argument.kind {
                    ArgumentType::UserProvided => {
                        configuration.argument(Argument::user_provided(argument.name.clone()));
                    }
                }
            }
            container
                .register()
                .type_info("", info.clone())?
                .with_scope(type_config.scope);
        }
        debug!(container = %self.name, types = self.types.len(), "Created container from configuration");
        Ok(container)
    }
}

/// A type to register.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeConfig {
    pub name: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub ctor: Vec<ArgumentConfig>,
}

/// A constructor argument of a configured type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ArgumentType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    #[default]
    #[serde(alias = "user_provided")]
    UserProvided,
}
