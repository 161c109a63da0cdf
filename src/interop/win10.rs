//! Interface shapes shared by every Windows 10 release.

use super::guid_to_id;
use crate::backend::{DesktopManager, SwitchNotifier};
use crate::desktop::DesktopId;

use anyhow::{anyhow, Result};
use std::ffi::c_void;
use windows::core::{implement, interface, IUnknown, IUnknown_Vtbl, Interface, BOOL, GUID, HRESULT};
use windows::Win32::Foundation::S_OK;
use windows::Win32::UI::Shell::Common::IObjectArray;

#[interface("FF72FFDD-BE7E-43FC-9C03-AD81681E88E4")]
pub unsafe trait IVirtualDesktop: IUnknown {
    pub unsafe fn is_view_visible(&self, view: *mut c_void, visible: *mut BOOL) -> HRESULT;
    pub unsafe fn get_id(&self, id: *mut GUID) -> HRESULT;
}

#[interface("F31574D6-B682-4CDC-BD56-1827860ABEC6")]
pub unsafe trait IVirtualDesktopManagerInternal: IUnknown {
    pub unsafe fn get_count(&self, count: *mut u32) -> HRESULT;
    pub unsafe fn move_view_to_desktop(&self, view: *mut c_void, desktop: *mut c_void) -> HRESULT;
    pub unsafe fn can_view_move_desktops(&self, view: *mut c_void, can_move: *mut BOOL)
        -> HRESULT;
    pub unsafe fn get_current_desktop(&self, desktop: *mut Option<IVirtualDesktop>) -> HRESULT;
    pub unsafe fn get_desktops(&self, desktops: *mut Option<IObjectArray>) -> HRESULT;
}

#[interface("C179334C-4295-40D3-BEA1-C654D965605A")]
pub unsafe trait IVirtualDesktopNotification: IUnknown {
    pub unsafe fn virtual_desktop_created(&self, desktop: *mut c_void) -> HRESULT;
    pub unsafe fn virtual_desktop_destroy_begin(
        &self,
        destroyed: *mut c_void,
        fallback: *mut c_void,
    ) -> HRESULT;
    pub unsafe fn virtual_desktop_destroy_failed(
        &self,
        destroyed: *mut c_void,
        fallback: *mut c_void,
    ) -> HRESULT;
    pub unsafe fn virtual_desktop_destroyed(
        &self,
        destroyed: *mut c_void,
        fallback: *mut c_void,
    ) -> HRESULT;
    pub unsafe fn view_virtual_desktop_changed(&self, view: *mut c_void) -> HRESULT;
    pub unsafe fn current_virtual_desktop_changed(
        &self,
        old: *mut c_void,
        new: *mut c_void,
    ) -> HRESULT;
}

pub fn ids() -> [u128; 3] {
    [
        IVirtualDesktop::IID.to_u128(),
        IVirtualDesktopManagerInternal::IID.to_u128(),
        IVirtualDesktopNotification::IID.to_u128(),
    ]
}

pub struct Manager {
    internal: IVirtualDesktopManagerInternal,
}

impl Manager {
    pub fn new(internal: IVirtualDesktopManagerInternal) -> Self {
        Self { internal }
    }

    fn desktop_objects(&self) -> Result<Vec<IVirtualDesktop>> {
        let mut array = None;
        unsafe { self.internal.get_desktops(&mut array) }
            .ok()
            .map_err(|err| anyhow!("Failed to get desktops, {err}"))?;
        let array = array.ok_or_else(|| anyhow!("Failed to get desktops, no array"))?;
        let count = unsafe { array.GetCount() }
            .map_err(|err| anyhow!("Failed to get desktop array size, {err}"))?;
        (0..count)
            .map(|i| {
                unsafe { array.GetAt::<IVirtualDesktop>(i) }
                    .map_err(|err| anyhow!("Failed to get desktop {i}, {err}"))
            })
            .collect()
    }
}

impl DesktopManager for Manager {
    fn current(&self) -> Result<DesktopId> {
        let mut desktop = None;
        unsafe { self.internal.get_current_desktop(&mut desktop) }.ok()?;
        let desktop = desktop.ok_or_else(|| anyhow!("no current desktop"))?;
        desktop_id(&desktop)
    }

    fn count(&self) -> Result<u32> {
        let mut count = 0;
        unsafe { self.internal.get_count(&mut count) }.ok()?;
        Ok(count)
    }

    fn desktops(&self) -> Result<Vec<DesktopId>> {
        self.desktop_objects()?.iter().map(desktop_id).collect()
    }

    fn name(&self, _id: DesktopId) -> Result<Option<String>> {
        Ok(None)
    }
}

fn desktop_id(desktop: &IVirtualDesktop) -> Result<DesktopId> {
    let mut id = GUID::zeroed();
    unsafe { desktop.get_id(&mut id) }
        .ok()
        .map_err(|err| anyhow!("Failed to get desktop id, {err}"))?;
    Ok(guid_to_id(&id))
}

#[implement(IVirtualDesktopNotification)]
pub struct NotificationSink {
    notifier: SwitchNotifier,
}

impl IVirtualDesktopNotification_Impl for NotificationSink_Impl {
    unsafe fn virtual_desktop_created(&self, _desktop: *mut c_void) -> HRESULT {
        S_OK
    }

    unsafe fn virtual_desktop_destroy_begin(
        &self,
        _destroyed: *mut c_void,
        _fallback: *mut c_void,
    ) -> HRESULT {
        S_OK
    }

    unsafe fn virtual_desktop_destroy_failed(
        &self,
        _destroyed: *mut c_void,
        _fallback: *mut c_void,
    ) -> HRESULT {
        S_OK
    }

    unsafe fn virtual_desktop_destroyed(
        &self,
        _destroyed: *mut c_void,
        _fallback: *mut c_void,
    ) -> HRESULT {
        S_OK
    }

    unsafe fn view_virtual_desktop_changed(&self, _view: *mut c_void) -> HRESULT {
        S_OK
    }

    unsafe fn current_virtual_desktop_changed(
        &self,
        _old: *mut c_void,
        _new: *mut c_void,
    ) -> HRESULT {
        (self.notifier)();
        S_OK
    }
}

pub fn sink(notifier: SwitchNotifier) -> IUnknown {
    let sink: IVirtualDesktopNotification = NotificationSink { notifier }.into();
    sink.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::InterfaceFamily;

    #[test]
    fn test_ids_match_table() {
        assert_eq!(ids(), InterfaceFamily::Win10.table().ids());
    }
}
