/// One network-reachable endpoint advertised to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    /// Application name.
    pub name: String,
    /// Index of the owning application instance.
    pub instance_index: u32,
    /// Advertised IP address.
    pub ip: String,
    /// Advertised port.
    pub port: u16,
}

impl ServiceInstance {
    /// Create a new service instance.
    pub fn new(name: impl Into<String>, instance_index: u32, ip: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            instance_index,
            ip: ip.into(),
            port,
        }
    }

    /// Registry host name, unique per port of the same process.
    pub fn host_name(&self) -> String {
        format!("{}-{}-{}", self.name, self.instance_index, self.port)
    }
}

impl std::fmt::Display for ServiceInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}:{})", self.host_name(), self.ip, self.port)
    }
}
