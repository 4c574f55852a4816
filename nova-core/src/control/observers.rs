use std::collections::HashSet;
use std::net::SocketAddr;

/// Peers subscribed to asynchronous server notifications via `/notify 1`.
///
/// Endpoints are unique by address and port. Only mutated from the control
/// loop, so no interior locking.
#[derive(Debug, Default, Clone)]
pub struct ObserverRegistry {
    endpoints: HashSet<SocketAddr>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the endpoint was not registered before.
    pub fn add(&mut self, endpoint: SocketAddr) -> bool {
        self.endpoints.insert(endpoint)
    }

    /// Returns `true` if the endpoint was registered. Removing an absent
    /// endpoint is not an error.
    pub fn remove(&mut self, endpoint: &SocketAddr) -> bool {
        self.endpoints.remove(endpoint)
    }

    pub fn contains(&self, endpoint: &SocketAddr) -> bool {
        self.endpoints.contains(endpoint)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SocketAddr> {
        self.endpoints.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn add_is_idempotent() {
        let mut observers = ObserverRegistry::new();
        assert!(observers.add(addr(57120)));
        assert!(!observers.add(addr(57120)));
        assert_eq!(observers.len(), 1);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut observers = ObserverRegistry::new();
        assert!(!observers.remove(&addr(57120)));
        assert!(observers.is_empty());
    }

    #[test]
    fn port_distinguishes_endpoints() {
        let mut observers = ObserverRegistry::new();
        observers.add(addr(57120));
        observers.add(addr(57121));
        observers.remove(&addr(57120));
        assert!(!observers.contains(&addr(57120)));
        assert!(observers.contains(&addr(57121)));
    }

    #[test]
    fn iter_yields_each_endpoint_once() {
        let mut observers = ObserverRegistry::new();
        observers.add(addr(57121));
        observers.add(addr(57120));
        observers.add(addr(57121));

        let mut ports: Vec<u16> = observers.iter().map(|e| e.port()).collect();
        ports.sort_unstable();
        assert_eq!(ports, vec![57120, 57121]);
    }
}
