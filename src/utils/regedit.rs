use anyhow::{anyhow, bail, Result};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_MORE_DATA, WIN32_ERROR};
use windows::Win32::System::Registry::{
    RegCloseKey, RegGetValueW, RegOpenKeyExW, HKEY, HKEY_CURRENT_USER, KEY_READ,
    REG_ROUTINE_FLAGS, REG_VALUE_TYPE, RRF_RT_REG_BINARY, RRF_RT_REG_SZ,
};

use super::to_wstring;

/// Read-only handle to a key under `HKEY_CURRENT_USER`.
#[derive(Debug)]
pub struct RegKey {
    hkey: HKEY,
}

impl RegKey {
    /// Returns `Ok(None)` when the key does not exist.
    pub fn open_hkcu(subkey: &str) -> Result<Option<RegKey>> {
        let subkey = to_wstring(subkey);
        let mut hkey = HKEY::default();
        let ret = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR(subkey.as_ptr()),
                None,
                KEY_READ,
                &mut hkey as *mut _,
            )
        };
        if ret == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        ret.ok()
            .map_err(|err| anyhow!("Failed to open reg key, {err}"))?;
        Ok(Some(RegKey { hkey }))
    }

    pub fn get_string(&self, name: &str) -> Result<Option<String>> {
        let Some(data) = self.get_raw(name, RRF_RT_REG_SZ)? else {
            return Ok(None);
        };
        let wide: Vec<u16> = data
            .chunks_exact(2)
            .map(|v| u16::from_le_bytes([v[0], v[1]]))
            .take_while(|v| *v != 0)
            .collect();
        Ok(Some(String::from_utf16_lossy(&wide)))
    }

    pub fn get_binary(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.get_raw(name, RRF_RT_REG_BINARY)
    }

    fn get_raw(&self, name: &str, flags: REG_ROUTINE_FLAGS) -> Result<Option<Vec<u8>>> {
        let name = to_wstring(name);
        let mut size: u32 = 0;
        let ret = self.get_value(&name, flags, None, &mut size);
        if ret == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        if ret.is_err() && ret != ERROR_MORE_DATA {
            bail!("Failed to get reg value, {}", windows::core::Error::from(ret));
        }
        let mut buffer = vec![0u8; size as usize];
        let ret = self.get_value(&name, flags, Some(&mut buffer), &mut size);
        if ret.is_err() {
            bail!("Failed to get reg value, {}", windows::core::Error::from(ret));
        }
        buffer.truncate(size as usize);
        Ok(Some(buffer))
    }

    fn get_value(
        &self,
        name: &[u16],
        flags: REG_ROUTINE_FLAGS,
        buffer: Option<&mut [u8]>,
        size: &mut u32,
    ) -> WIN32_ERROR {
        let mut kind: REG_VALUE_TYPE = Default::default();
        let data = buffer.map(|v| v.as_mut_ptr() as *mut _);
        unsafe {
            RegGetValueW(
                self.hkey,
                PCWSTR::null(),
                PCWSTR(name.as_ptr()),
                flags,
                Some(&mut kind as *mut _),
                data,
                Some(size as *mut _),
            )
        }
    }
}

impl Drop for RegKey {
    fn drop(&mut self) {
        let _ = unsafe { RegCloseKey(self.hkey) };
    }
}
