//! Simulated docker daemon state.

use std::collections::BTreeMap;

/// Container lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Running,
    Exited,
}

/// One simulated container.
#[derive(Debug, Clone)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub image: String,
    pub command: String,
    pub ports: String,
    pub status: ContainerStatus,
}

impl Container {
    pub fn is_running(&self) -> bool {
        self.status == ContainerStatus::Running
    }
}

/// Daemon state the `docker` handler reads and mutates. The container map is
/// populated lazily on first use, mirroring a compose project that exists on
/// disk but has not been brought up yet.
#[derive(Debug, Clone, Default)]
pub struct DockerSimState {
    containers: BTreeMap<String, Container>,
    initialized: bool,
}

impl DockerSimState {
    /// The three stock containers of the fleetcore compose project.
    fn defaults() -> [Container; 3] {
        [
            Container {
                id: "f3a91c2e4b10".to_string(),
                name: "fleetcore-api".to_string(),
                image: "node:18-alpine".to_string(),
                command: "\"node src/server.js\"".to_string(),
                ports: "0.0.0.0:3000->3000/tcp".to_string(),
                status: ContainerStatus::Exited,
            },
            Container {
                id: "8d204f7a91ce".to_string(),
                name: "fleetcore-db".to_string(),
                image: "postgres:15".to_string(),
                command: "\"docker-entrypoint.s…\"".to_string(),
                ports: "5432/tcp".to_string(),
                status: ContainerStatus::Exited,
            },
            Container {
                id: "c57be0d1a3f2".to_string(),
                name: "fleetcore-cache".to_string(),
                image: "redis:7".to_string(),
                command: "\"redis-server\"".to_string(),
                ports: "6379/tcp".to_string(),
                status: ContainerStatus::Exited,
            },
        ]
    }

    fn ensure_init(&mut self) {
        if !self.initialized {
            for container in Self::defaults() {
                self.containers.insert(container.name.clone(), container);
            }
            self.initialized = true;
        }
    }

    /// All containers, name-sorted.
    pub fn containers(&mut self) -> impl Iterator<Item = &Container> {
        self.ensure_init();
        self.containers.values()
    }

    pub fn get(&mut self, name: &str) -> Option<&Container> {
        self.ensure_init();
        self.containers.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Container> {
        self.ensure_init();
        self.containers.get_mut(name)
    }

    /// Set every container's status; returns the affected names in order.
    pub fn set_all(&mut self, status: ContainerStatus) -> Vec<String> {
        self.ensure_init();
        self.containers
            .values_mut()
            .map(|c| {
                c.status = status;
                c.name.clone()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazily_seeds_three_stopped_containers() {
        let mut state = DockerSimState::default();
        let names: Vec<String> = state.containers().map(|c| c.name.clone()).collect();
        assert_eq!(
            names,
            vec!["fleetcore-api", "fleetcore-cache", "fleetcore-db"]
        );
        assert!(state.containers().all(|c| !c.is_running()));
    }

    #[test]
    fn start_stop_individual() {
        let mut state = DockerSimState::default();
        state.get_mut("fleetcore-db").unwrap().status = ContainerStatus::Running;
        assert!(state.get("fleetcore-db").unwrap().is_running());
        assert!(!state.get("fleetcore-api").unwrap().is_running());
    }

    #[test]
    fn set_all_flips_every_container() {
        let mut state = DockerSimState::default();
        let names = state.set_all(ContainerStatus::Running);
        assert_eq!(names.len(), 3);
        assert!(state.containers().all(Container::is_running));
    }
}
