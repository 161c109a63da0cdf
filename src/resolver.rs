use crate::acquire::Handles;
use crate::backend::{DesktopManager, DesktopStore, PublicManager};
use crate::desktop::{synthesize_name, DesktopId, DesktopInfo};
use crate::polling::PollingBackend;

use anyhow::{anyhow, bail, Result};
use std::cell::Cell;

/// Turns desktop identities into index and name pairs.
///
/// Borrows whatever acquisition produced; the internal manager wins when
/// present, else the documented manager plus the registry store are used.
/// Every identity resolved successfully is remembered in `last_seen` and
/// stands in when a later query fails.
pub struct Resolver<'a> {
    internal: Option<&'a dyn DesktopManager>,
    public: Option<&'a dyn PublicManager>,
    store: Option<&'a dyn DesktopStore>,
    polling: &'a PollingBackend,
    last_seen: &'a Cell<Option<DesktopId>>,
    registry_names: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(
        handles: &'a Handles,
        polling: &'a PollingBackend,
        last_seen: &'a Cell<Option<DesktopId>>,
        registry_names: bool,
    ) -> Self {
        Self {
            internal: handles.internal.as_deref(),
            public: handles.public.as_deref(),
            store: handles.store.as_deref(),
            polling,
            last_seen,
            registry_names,
        }
    }

    fn unavailable(&self) -> bool {
        self.internal.is_none() && self.public.is_none()
    }

    pub fn current_id(&self) -> Result<DesktopId> {
        let id = if let Some(internal) = self.internal {
            internal
                .current()
                .map_err(|err| anyhow!("Failed to get current desktop, {err}"))?
        } else if let Some(public) = self.public {
            self.polling
                .current(public, self.store)
                .ok_or_else(|| anyhow!("Failed to find a window on the current desktop"))?
        } else {
            bail!("No virtual desktop api available")
        };
        self.last_seen.set(Some(id));
        Ok(id)
    }

    /// One ordered enumeration snapshot.
    pub fn desktops(&self) -> Result<Vec<DesktopId>> {
        if let Some(internal) = self.internal {
            return internal
                .desktops()
                .map_err(|err| anyhow!("Failed to enumerate desktops, {err}"));
        }
        match self.store {
            Some(store) if self.public.is_some() => store
                .desktops()
                .map_err(|err| anyhow!("Failed to read desktop order, {err}")),
            _ => bail!("No virtual desktop api available"),
        }
    }

    /// 1 + position of `id` in a fresh enumeration, 1 when it cannot be placed.
    pub fn index_of(&self, id: DesktopId) -> u32 {
        match self.desktops() {
            Ok(ids) => ids
                .iter()
                .position(|v| *v == id)
                .map(|i| i as u32 + 1)
                .unwrap_or(1),
            Err(err) => {
                debug!("{err}");
                1
            }
        }
    }

    pub fn name(&self, id: DesktopId, index: u32) -> String {
        if let Some(internal) = self.internal {
            match internal.name(id) {
                Ok(Some(name)) if !name.is_empty() => return name,
                Ok(_) => {}
                Err(err) => debug!("Failed to get name of {id}, {err}"),
            }
        }
        if self.registry_names {
            if let Some(store) = self.store {
                match store.name(id) {
                    Ok(Some(name)) if !name.is_empty() => return name,
                    Ok(_) => {}
                    Err(err) => debug!("{err}"),
                }
            }
        }
        synthesize_name(index)
    }

    pub fn info(&self, id: DesktopId) -> DesktopInfo {
        let index = self.index_of(id);
        DesktopInfo {
            id,
            index,
            name: self.name(id, index),
        }
    }

    pub fn try_current(&self) -> Result<DesktopInfo> {
        self.current_id().map(|id| self.info(id))
    }

    /// Never fails; degrades to the last observed identity, then to desktop 1.
    pub fn current(&self) -> DesktopInfo {
        if self.unavailable() {
            return DesktopInfo::fallback();
        }
        match self.current_id() {
            Ok(id) => self.info(id),
            Err(err) => {
                error!("{err}");
                match self.last_seen.get().or(self.polling.last_known()) {
                    Some(id) => self.info(id),
                    None => DesktopInfo::fallback(),
                }
            }
        }
    }

    pub fn count(&self) -> u32 {
        if let Some(internal) = self.internal {
            match internal.count() {
                Ok(count) => return count.max(1),
                Err(err) => error!("Failed to get desktop count, {err}"),
            }
        } else if !self.unavailable() {
            match self.desktops() {
                Ok(ids) => return (ids.len() as u32).max(1),
                Err(err) => debug!("{err}"),
            }
        }
        1
    }

    pub fn by_index(&self, index: u32) -> Result<DesktopInfo> {
        if self.unavailable() {
            if index == 1 {
                return Ok(DesktopInfo::fallback());
            }
            bail!("Desktop index {index} out of range");
        }
        let ids = match self.desktops() {
            Ok(ids) => ids,
            // polling only: `count` reports 1 here, so index 1 is the current desktop
            Err(err) if index == 1 && self.internal.is_none() => {
                debug!("{err}");
                return Ok(self.current());
            }
            Err(err) => return Err(err),
        };
        let id = match (index as usize).checked_sub(1).and_then(|i| ids.get(i)) {
            Some(id) => *id,
            None => bail!("Desktop index {index} out of range, {} desktops", ids.len()),
        };
        Ok(DesktopInfo {
            id,
            index,
            name: self.name(id, index),
        })
    }
}
