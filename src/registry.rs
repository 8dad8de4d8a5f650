/*
Skygrid, new-island placement for skyblock-style voxel servers.
Copyright (c) 2021  Galaxtone, Exopteron

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
use super::location::{Location, WorldId};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

/// A claimed square of the island grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Island {
    pub center: Location,
    /// Half the side of the claimed square.
    pub range: i32,
    /// Created for an obstructed cell, not for a player.
    pub reserved: bool,
}
impl Island {
    pub fn contains(&self, location: &Location) -> bool {
        location.world == self.center.world
            && location.x >= self.center.x - self.range
            && location.x < self.center.x + self.range
            && location.z >= self.center.z - self.range
            && location.z < self.center.z + self.range
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("island registry task has stopped")]
    Closed,
}

pub enum RegistryCommand {
    GetLast {
        world: WorldId,
        res_send: oneshot::Sender<Option<Location>>,
    },
    SetLast {
        location: Location,
        res_send: oneshot::Sender<()>,
    },
    IslandAt {
        location: Location,
        res_send: oneshot::Sender<Option<Island>>,
    },
    InDeletion {
        location: Location,
        res_send: oneshot::Sender<bool>,
    },
    CreateIsland {
        location: Location,
        range: i32,
        reserved: bool,
        res_send: oneshot::Sender<Option<Island>>,
    },
    DeleteIsland {
        location: Location,
        res_send: oneshot::Sender<Option<Island>>,
    },
    FinishDeletion {
        location: Location,
        res_send: oneshot::Sender<bool>,
    },
    ListIslands {
        world: WorldId,
        res_send: oneshot::Sender<Vec<Island>>,
    },
}

#[derive(Default)]
struct RegistryState {
    last: HashMap<WorldId, Location>,
    islands: HashMap<WorldId, Vec<Island>>,
    deleting: HashMap<WorldId, Vec<Island>>,
}
impl RegistryState {
    fn island_at(&self, location: &Location) -> Option<&Island> {
        self.islands
            .get(&location.world)?
            .iter()
            .find(|island| island.contains(location))
    }
    fn in_deletion(&self, location: &Location) -> bool {
        self.deleting
            .get(&location.world)
            .map_or(false, |d| d.iter().any(|island| island.contains(location)))
    }
    fn handle(&mut self, command: RegistryCommand) {
        // A dropped receiver only means the caller lost interest.
        match command {
            RegistryCommand::GetLast { world, res_send } => {
                res_send.send(self.last.get(&world).cloned()).ok();
            }
            RegistryCommand::SetLast { location, res_send } => {
                self.last.insert(location.world.clone(), location);
                res_send.send(()).ok();
            }
            RegistryCommand::IslandAt { location, res_send } => {
                res_send.send(self.island_at(&location).cloned()).ok();
            }
            RegistryCommand::InDeletion { location, res_send } => {
                res_send.send(self.in_deletion(&location)).ok();
            }
            RegistryCommand::CreateIsland {
                location,
                range,
                reserved,
                res_send,
            } => {
                if self.island_at(&location).is_some() {
                    res_send.send(None).ok();
                    return;
                }
                let island = Island {
                    center: location,
                    range,
                    reserved,
                };
                log::debug!(
                    "Registered {}island at {}",
                    if reserved { "reserved " } else { "" },
                    island.center
                );
                self.islands
                    .entry(island.center.world.clone())
                    .or_insert_with(Vec::new)
                    .push(island.clone());
                res_send.send(Some(island)).ok();
            }
            RegistryCommand::DeleteIsland { location, res_send } => {
                let removed = self.islands.get_mut(&location.world).and_then(|islands| {
                    let idx = islands.iter().position(|i| i.contains(&location))?;
                    Some(islands.remove(idx))
                });
                if let Some(island) = &removed {
                    log::info!("Island at {} queued for deletion", island.center);
                    self.deleting
                        .entry(island.center.world.clone())
                        .or_insert_with(Vec::new)
                        .push(island.clone());
                }
                res_send.send(removed).ok();
            }
            RegistryCommand::FinishDeletion { location, res_send } => {
                let mut found = false;
                if let Some(deleting) = self.deleting.get_mut(&location.world) {
                    let before = deleting.len();
                    deleting.retain(|island| !island.contains(&location));
                    found = deleting.len() != before;
                }
                res_send.send(found).ok();
            }
            RegistryCommand::ListIslands { world, res_send } => {
                let islands = self.islands.get(&world).cloned().unwrap_or_default();
                res_send.send(islands).ok();
            }
        }
    }
}

/// Handle to the island managing task. Cheap to clone.
#[derive(Clone)]
pub struct Islands {
    registry_send: mpsc::UnboundedSender<RegistryCommand>,
}
impl Islands {
    /// Spawns the managing task on the current tokio runtime.
    pub fn setup() -> Self {
        let (registry_send, mut recv) = mpsc::unbounded_channel::<RegistryCommand>();
        tokio::task::spawn(async move {
            let mut state = RegistryState::default();
            while let Some(command) = recv.recv().await {
                state.handle(command);
            }
            log::debug!("Island registry task stopped");
        });
        Islands { registry_send }
    }
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RegistryCommand,
    ) -> Result<T, RegistryError> {
        let (res_send, res_recv) = oneshot::channel();
        self.registry_send
            .send(command(res_send))
            .map_err(|_| RegistryError::Closed)?;
        res_recv.await.map_err(|_| RegistryError::Closed)
    }
    pub async fn get_last(&self, world: &WorldId) -> Result<Option<Location>, RegistryError> {
        let world = world.clone();
        self.request(|res_send| RegistryCommand::GetLast { world, res_send })
            .await
    }
    pub async fn set_last(&self, location: Location) -> Result<(), RegistryError> {
        self.request(|res_send| RegistryCommand::SetLast { location, res_send })
            .await
    }
    pub async fn island_at(&self, location: &Location) -> Result<Option<Island>, RegistryError> {
        let location = location.clone();
        self.request(|res_send| RegistryCommand::IslandAt { location, res_send })
            .await
    }
    pub async fn in_deletion(&self, location: &Location) -> Result<bool, RegistryError> {
        let location = location.clone();
        self.request(|res_send| RegistryCommand::InDeletion { location, res_send })
            .await
    }
    /// Returns `None` when the location already belongs to an island.
    pub async fn create_island(
        &self,
        location: Location,
        range: i32,
        reserved: bool,
    ) -> Result<Option<Island>, RegistryError> {
        self.request(|res_send| RegistryCommand::CreateIsland {
            location,
            range,
            reserved,
            res_send,
        })
        .await
    }
    pub async fn delete_island(&self, location: &Location) -> Result<Option<Island>, RegistryError> {
        let location = location.clone();
        self.request(|res_send| RegistryCommand::DeleteIsland { location, res_send })
            .await
    }
    pub async fn finish_deletion(&self, location: &Location) -> Result<bool, RegistryError> {
        let location = location.clone();
        self.request(|res_send| RegistryCommand::FinishDeletion { location, res_send })
            .await
    }
    pub async fn islands(&self, world: &WorldId) -> Result<Vec<Island>, RegistryError> {
        let world = world.clone();
        self.request(|res_send| RegistryCommand::ListIslands { world, res_send })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(world: &str, x: i32, z: i32) -> Location {
        Location::new(WorldId::new(world), x, 120, z)
    }

    #[tokio::test]
    async fn last_location_is_per_world() {
        let islands = Islands::setup();
        let a = WorldId::new("skyblock");
        let b = WorldId::new("acidisland");
        assert_eq!(islands.get_last(&a).await.unwrap(), None);
        islands.set_last(loc("skyblock", 200, 0)).await.unwrap();
        assert_eq!(islands.get_last(&a).await.unwrap(), Some(loc("skyblock", 200, 0)));
        assert_eq!(islands.get_last(&b).await.unwrap(), None);
        islands.set_last(loc("acidisland", -200, 0)).await.unwrap();
        assert_eq!(islands.get_last(&a).await.unwrap(), Some(loc("skyblock", 200, 0)));
    }

    #[tokio::test]
    async fn island_at_uses_claimed_area() {
        let islands = Islands::setup();
        islands
            .create_island(loc("skyblock", 0, 0), 100, false)
            .await
            .unwrap()
            .unwrap();
        assert!(islands.island_at(&loc("skyblock", -100, -100)).await.unwrap().is_some());
        assert!(islands.island_at(&loc("skyblock", 99, 99)).await.unwrap().is_some());
        assert!(islands.island_at(&loc("skyblock", 100, 0)).await.unwrap().is_none());
        assert!(islands.island_at(&loc("acidisland", 0, 0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_refuses_claimed_location() {
        let islands = Islands::setup();
        assert!(islands
            .create_island(loc("skyblock", 0, 0), 50, false)
            .await
            .unwrap()
            .is_some());
        assert!(islands
            .create_island(loc("skyblock", 10, 10), 50, true)
            .await
            .unwrap()
            .is_none());
        assert_eq!(islands.islands(&WorldId::new("skyblock")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deletion_moves_island_to_pending() {
        let islands = Islands::setup();
        let center = loc("skyblock", 200, 200);
        islands.create_island(center.clone(), 100, false).await.unwrap();
        let deleted = islands.delete_island(&center.with_xz(5, 5)).await.unwrap();
        assert_eq!(deleted.map(|i| i.center), Some(center.clone()));
        assert!(islands.island_at(&center).await.unwrap().is_none());
        assert!(islands.in_deletion(&center.with_xz(-100, 99)).await.unwrap());
        assert!(islands.finish_deletion(&center).await.unwrap());
        assert!(!islands.in_deletion(&center).await.unwrap());
        assert!(!islands.finish_deletion(&center).await.unwrap());
    }
}
