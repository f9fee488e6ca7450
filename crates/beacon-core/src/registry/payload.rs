use serde::{Deserialize, Serialize};

use super::instance::ServiceInstance;

const DEFAULT_DATA_CENTER_CLASS: &str = "com.netflix.appinfo.InstanceInfo$DefaultDataCenterInfo";

/// Body of a registry registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationPayload {
    pub instance: InstanceInfo,
}

/// Instance record as the registry expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    pub host_name: String,
    pub app: String,
    pub ip_addr: String,
    pub status: String,
    pub port: InstancePort,
    pub data_center_info: DataCenterInfo,
}

/// Port with its enabled flag, both as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstancePort {
    #[serde(rename = "$")]
    pub value: String,
    #[serde(rename = "@enabled")]
    pub enabled: String,
}

/// Data center descriptor; always a self-hosted ("MyOwn") deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCenterInfo {
    #[serde(rename = "@class")]
    pub class: String,
    pub name: String,
}

impl Default for DataCenterInfo {
    fn default() -> Self {
        Self {
            class: DEFAULT_DATA_CENTER_CLASS.to_string(),
            name: "MyOwn".to_string(),
        }
    }
}

impl From<&ServiceInstance> for RegistrationPayload {
    fn from(instance: &ServiceInstance) -> Self {
        Self {
            instance: InstanceInfo {
                host_name: instance.host_name(),
                app: instance.name.clone(),
                ip_addr: instance.ip.clone(),
                status: "UP".to_string(),
                port: InstancePort {
                    value: instance.port.to_string(),
                    enabled: "true".to_string(),
                },
                data_center_info: DataCenterInfo::default(),
            },
        }
    }
}
