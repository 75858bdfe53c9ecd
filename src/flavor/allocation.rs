use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;

use crate::core::errors::ValidationError;
use crate::core::instance::{AllocationMethod, LogicalId, Role};

/// Group properties handed to the flavor by the group controller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupSpec {
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    #[serde(rename = "Size", default)]
    pub size: Option<u32>,
    #[serde(rename = "IPs", default)]
    pub ips: Option<Vec<LogicalId>>,
}

impl GroupSpec {
    pub fn parse(properties: &Value) -> Result<Self, ValidationError> {
        // A JSON array would otherwise fill the fields by position.
        if !properties.is_object() {
            return Err(serde_json::Error::custom("group spec must be a JSON object").into());
        }
        Ok(GroupSpec::deserialize(properties)?)
    }

    pub fn role(&self) -> Result<Role, ValidationError> {
        self.type_name.as_deref().unwrap_or_default().parse()
    }

    pub fn allocation(&self) -> Result<AllocationMethod, ValidationError> {
        match (self.size, &self.ips) {
            (Some(size), None) => Ok(AllocationMethod::Size(size)),
            (None, Some(ips)) => Ok(AllocationMethod::LogicalIds(ips.clone())),
            (Some(_), Some(_)) => Err(ValidationError::AmbiguousAllocation),
            (None, None) => Err(ValidationError::MissingAllocation),
        }
    }

    /// Pinned addresses other than `own`, in spec order.
    pub fn peers(&self, own: Option<&str>) -> Vec<String> {
        self.ips
            .iter()
            .flatten()
            .filter(|ip| Some(ip.as_str()) != own)
            .cloned()
            .collect()
    }
}

/// Role and allocation implied by a group's properties. No side effects.
pub fn validate(properties: &Value) -> Result<(Role, AllocationMethod), ValidationError> {
    let spec = GroupSpec::parse(properties)?;
    let role = spec.role()?;
    let allocation = spec.allocation()?;
    Ok((role, allocation))
}
