use crate::backend::DesktopStore;
use crate::desktop::DesktopId;
use crate::utils::RegKey;

use anyhow::{anyhow, bail, Result};

const VIRTUAL_DESKTOPS: &str = r"Software\Microsoft\Windows\CurrentVersion\Explorer\VirtualDesktops";

/// Desktop data Explorer persists under `HKCU`.
#[derive(Debug, Default)]
pub struct RegistryStore;

impl RegistryStore {
    fn binary(name: &str) -> Result<Option<Vec<u8>>> {
        match RegKey::open_hkcu(VIRTUAL_DESKTOPS)? {
            Some(key) => key.get_binary(name),
            None => Ok(None),
        }
    }
}

impl DesktopStore for RegistryStore {
    fn name(&self, id: DesktopId) -> Result<Option<String>> {
        let subkey = format!(r"{VIRTUAL_DESKTOPS}\Desktops\{id}");
        match RegKey::open_hkcu(&subkey)? {
            Some(key) => key.get_string("Name"),
            None => Ok(None),
        }
    }

    fn desktops(&self) -> Result<Vec<DesktopId>> {
        let data = Self::binary("VirtualDesktopIDs")?
            .ok_or_else(|| anyhow!("Failed to read VirtualDesktopIDs, no value"))?;
        DesktopId::list_from_le_bytes(&data)
    }

    fn current(&self) -> Result<Option<DesktopId>> {
        let Some(data) = Self::binary("CurrentVirtualDesktop")? else {
            return Ok(None);
        };
        let record: [u8; 16] = match data.try_into() {
            Ok(v) => v,
            Err(data) => bail!("Invalid CurrentVirtualDesktop of {} bytes", data.len()),
        };
        Ok(Some(DesktopId::from_le_bytes(record)))
    }
}
