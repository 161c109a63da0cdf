//! Windows 11 interface families.
//!
//! All of them take a monitor handle on the manager and expose desktop
//! names; 23H2 and later append two notification methods.

macro_rules! win11_family {
    (
        $(#[$meta:meta])*
        mod $family:ident {
            desktop: $desktop:tt,
            manager: $manager:tt,
            notification: $notification:tt,
            extra_notifications: [$($extra:ident),*],
        }
    ) => {
        $(#[$meta])*
        pub mod $family {
            use crate::backend::{DesktopManager, SwitchNotifier};
            use crate::desktop::DesktopId;
            use crate::interop::guid_to_id;

            use anyhow::{anyhow, Result};
            use std::ffi::c_void;
            use windows::core::{
                implement, interface, IUnknown, IUnknown_Vtbl, Interface, BOOL, GUID, HRESULT,
                HSTRING,
            };
            use windows::Win32::Foundation::S_OK;
            use windows::Win32::Graphics::Gdi::HMONITOR;
            use windows::Win32::UI::Shell::Common::IObjectArray;

            #[interface($desktop)]
            pub unsafe trait IVirtualDesktop: IUnknown {
                pub unsafe fn is_view_visible(&self, view: *mut c_void, visible: *mut BOOL)
                    -> HRESULT;
                pub unsafe fn get_id(&self, id: *mut GUID) -> HRESULT;
                pub unsafe fn get_monitor(&self, monitor: *mut HMONITOR) -> HRESULT;
                pub unsafe fn get_name(&self, name: *mut HSTRING) -> HRESULT;
                pub unsafe fn get_wallpaper_path(&self, path: *mut HSTRING) -> HRESULT;
            }

            #[interface($manager)]
            pub unsafe trait IVirtualDesktopManagerInternal: IUnknown {
                pub unsafe fn get_count(&self, monitor: HMONITOR, count: *mut u32) -> HRESULT;
                pub unsafe fn move_view_to_desktop(
                    &self,
                    view: *mut c_void,
                    desktop: *mut c_void,
                ) -> HRESULT;
                pub unsafe fn can_view_move_desktops(
                    &self,
                    view: *mut c_void,
                    can_move: *mut BOOL,
                ) -> HRESULT;
                pub unsafe fn get_current_desktop(
                    &self,
                    monitor: HMONITOR,
                    desktop: *mut Option<IVirtualDesktop>,
                ) -> HRESULT;
                pub unsafe fn get_all_current_desktops(
                    &self,
                    desktops: *mut Option<IObjectArray>,
                ) -> HRESULT;
                pub unsafe fn get_desktops(
                    &self,
                    monitor: HMONITOR,
                    desktops: *mut Option<IObjectArray>,
                ) -> HRESULT;
            }

            #[interface($notification)]
            pub unsafe trait IVirtualDesktopNotification: IUnknown {
                pub unsafe fn virtual_desktop_created(
                    &self,
                    monitors: *mut c_void,
                    desktop: *mut c_void,
                ) -> HRESULT;
                pub unsafe fn virtual_desktop_destroy_begin(
                    &self,
                    monitors: *mut c_void,
                    destroyed: *mut c_void,
                    fallback: *mut c_void,
                ) -> HRESULT;
                pub unsafe fn virtual_desktop_destroy_failed(
                    &self,
                    monitors: *mut c_void,
                    destroyed: *mut c_void,
                    fallback: *mut c_void,
                ) -> HRESULT;
                pub unsafe fn virtual_desktop_destroyed(
                    &self,
                    monitors: *mut c_void,
                    destroyed: *mut c_void,
                    fallback: *mut c_void,
                ) -> HRESULT;
                pub unsafe fn virtual_desktop_is_per_monitor_changed(&self, per_monitor: BOOL)
                    -> HRESULT;
                pub unsafe fn virtual_desktop_moved(
                    &self,
                    monitors: *mut c_void,
                    desktop: *mut c_void,
                    old_index: i32,
                    new_index: i32,
                ) -> HRESULT;
                pub unsafe fn virtual_desktop_name_changed(
                    &self,
                    desktop: *mut c_void,
                    name: *mut c_void,
                ) -> HRESULT;
                pub unsafe fn view_virtual_desktop_changed(&self, view: *mut c_void) -> HRESULT;
                pub unsafe fn current_virtual_desktop_changed(
                    &self,
                    monitors: *mut c_void,
                    old: *mut c_void,
                    new: *mut c_void,
                ) -> HRESULT;
                pub unsafe fn virtual_desktop_wallpaper_changed(
                    &self,
                    desktop: *mut c_void,
                    path: *mut c_void,
                ) -> HRESULT;
                $(pub unsafe fn $extra(&self, desktop: *mut c_void) -> HRESULT;)*
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
                    unsafe { self.internal.get_desktops(HMONITOR::default(), &mut array) }
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
                    unsafe {
                        self.internal
                            .get_current_desktop(HMONITOR::default(), &mut desktop)
                    }
                    .ok()?;
                    let desktop = desktop.ok_or_else(|| anyhow!("no current desktop"))?;
                    desktop_id(&desktop)
                }

                fn count(&self) -> Result<u32> {
                    let mut count = 0;
                    unsafe { self.internal.get_count(HMONITOR::default(), &mut count) }.ok()?;
                    Ok(count)
                }

                fn desktops(&self) -> Result<Vec<DesktopId>> {
                    self.desktop_objects()?.iter().map(desktop_id).collect()
                }

                fn name(&self, id: DesktopId) -> Result<Option<String>> {
                    for desktop in self.desktop_objects()? {
                        if desktop_id(&desktop)? != id {
                            continue;
                        }
                        let mut name = HSTRING::new();
                        unsafe { desktop.get_name(&mut name) }
                            .ok()
                            .map_err(|err| anyhow!("Failed to get desktop name, {err}"))?;
                        return Ok(Some(name.to_string_lossy()));
                    }
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
                unsafe fn virtual_desktop_created(
                    &self,
                    _monitors: *mut c_void,
                    _desktop: *mut c_void,
                ) -> HRESULT {
                    S_OK
                }

                unsafe fn virtual_desktop_destroy_begin(
                    &self,
                    _monitors: *mut c_void,
                    _destroyed: *mut c_void,
                    _fallback: *mut c_void,
                ) -> HRESULT {
                    S_OK
                }

                unsafe fn virtual_desktop_destroy_failed(
                    &self,
                    _monitors: *mut c_void,
                    _destroyed: *mut c_void,
                    _fallback: *mut c_void,
                ) -> HRESULT {
                    S_OK
                }

                unsafe fn virtual_desktop_destroyed(
                    &self,
                    _monitors: *mut c_void,
                    _destroyed: *mut c_void,
                    _fallback: *mut c_void,
                ) -> HRESULT {
                    S_OK
                }

                unsafe fn virtual_desktop_is_per_monitor_changed(&self, _per_monitor: BOOL)
                    -> HRESULT {
                    S_OK
                }

                unsafe fn virtual_desktop_moved(
                    &self,
                    _monitors: *mut c_void,
                    _desktop: *mut c_void,
                    _old_index: i32,
                    _new_index: i32,
                ) -> HRESULT {
                    S_OK
                }

                unsafe fn virtual_desktop_name_changed(
                    &self,
                    _desktop: *mut c_void,
                    _name: *mut c_void,
                ) -> HRESULT {
                    S_OK
                }

                unsafe fn view_virtual_desktop_changed(&self, _view: *mut c_void) -> HRESULT {
                    S_OK
                }

                unsafe fn current_virtual_desktop_changed(
                    &self,
                    _monitors: *mut c_void,
                    _old: *mut c_void,
                    _new: *mut c_void,
                ) -> HRESULT {
                    (self.notifier)();
                    S_OK
                }

                unsafe fn virtual_desktop_wallpaper_changed(
                    &self,
                    _desktop: *mut c_void,
                    _path: *mut c_void,
                ) -> HRESULT {
                    S_OK
                }

                $(unsafe fn $extra(&self, _desktop: *mut c_void) -> HRESULT {
                    S_OK
                })*
            }

            pub fn sink(notifier: SwitchNotifier) -> IUnknown {
                let sink: IVirtualDesktopNotification = NotificationSink { notifier }.into();
                sink.into()
            }
        }
    };
}

win11_family! {
    /// Windows 11 21H2 and 22H2.
    mod win11_21h2 {
        desktop: "536D3495-B208-4CC9-AE26-DE8111275BF8",
        manager: "B2F925B9-5A0F-4D2E-9F4D-2B1507593C10",
        notification: "CD403E52-DEED-4C13-B437-B98380F2B1E8",
        extra_notifications: [],
    }
}

win11_family! {
    /// Windows 11 23H2 and 24H2.
    mod win11_23h2 {
        desktop: "3F07F4BE-B107-441A-AF0F-39D82529072C",
        manager: "A3175F2D-239C-4BD2-8AA0-EEBA8B0B138E",
        notification: "B9E5E94D-233E-49AB-AF5C-2B4541C3AADE",
        extra_notifications: [virtual_desktop_switched, remote_virtual_desktop_connected],
    }
}

win11_family! {
    /// Insider builds from 26200 on.
    mod win11_24h2_preview {
        desktop: "9F4C7C69-6ED1-408C-A3A9-1C0F89E3B7B2",
        manager: "53F5CA0B-158F-4124-900C-057158060B27",
        notification: "1BA7CF30-3591-43FA-ABFA-4AAF7ABEEDB7",
        extra_notifications: [virtual_desktop_switched, remote_virtual_desktop_connected],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::InterfaceFamily;

    #[test]
    fn test_ids_match_table() {
        assert_eq!(win11_21h2::ids(), InterfaceFamily::Win11_21H2.table().ids());
        assert_eq!(win11_23h2::ids(), InterfaceFamily::Win11_23H2.table().ids());
        assert_eq!(
            win11_24h2_preview::ids(),
            InterfaceFamily::Win11_24H2_Preview.table().ids()
        );
    }
}
