use anyhow::{bail, Result};
use std::fmt;

/// Opaque identity of one virtual desktop.
///
/// The value carries the 128 bits of the desktop GUID in the same order as
/// `GUID::from_u128`, so `{AA509086-5CA9-...}` is `0xaa509086_5ca9_...`.
/// Identities have no ordering of their own; positions only make sense inside
/// one enumeration snapshot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DesktopId(u128);

impl DesktopId {
    pub const NIL: DesktopId = DesktopId(0);

    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub const fn to_u128(self) -> u128 {
        self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }

    /// Decodes one GUID record as laid out in memory: `data1` u32, `data2` and
    /// `data3` u16, all little endian, followed by the 8 bytes of `data4`.
    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        let data1 = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let data2 = u16::from_le_bytes([bytes[4], bytes[5]]);
        let data3 = u16::from_le_bytes([bytes[6], bytes[7]]);
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&bytes[8..]);
        Self(
            (data1 as u128) << 96
                | (data2 as u128) << 80
                | (data3 as u128) << 64
                | u64::from_be_bytes(data4) as u128,
        )
    }

    /// Splits a binary array of GUID records, as stored by the shell.
    pub fn list_from_le_bytes(data: &[u8]) -> Result<Vec<Self>> {
        if data.len() % 16 != 0 {
            bail!("Invalid desktop id list of {} bytes", data.len());
        }
        Ok(data
            .chunks_exact(16)
            .map(|chunk| {
                let mut record = [0u8; 16];
                record.copy_from_slice(chunk);
                Self::from_le_bytes(record)
            })
            .collect())
    }
}

impl fmt::Display for DesktopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:04X}-{:012X}}}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xffff_ffff_ffff
        )
    }
}

impl fmt::Debug for DesktopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DesktopId({self})")
    }
}

/// One resolved desktop: identity, 1-based position and display name.
///
/// The index is recomputed from a fresh enumeration on every resolution since
/// the OS does not persist it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopInfo {
    pub id: DesktopId,
    pub index: u32,
    pub name: String,
}

impl DesktopInfo {
    /// Result handed out when nothing at all can be queried.
    pub fn fallback() -> Self {
        Self {
            id: DesktopId::NIL,
            index: 1,
            name: String::new(),
        }
    }
}

pub fn synthesize_name(index: u32) -> String {
    format!("Desktop {index}")
}
