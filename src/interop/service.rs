use super::{win10, win11};
use crate::backend::{NotificationService, SwitchNotifier};
use crate::tables::InterfaceFamily;

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::ffi::c_void;
use windows::core::{interface, IUnknown, IUnknown_Vtbl, Interface, HRESULT};

#[interface("0CD45E71-D927-4F15-8B0A-8FEF525337BF")]
pub unsafe trait IVirtualDesktopNotificationService: IUnknown {
    pub unsafe fn register(&self, notification: *mut c_void, cookie: *mut u32) -> HRESULT;
    pub unsafe fn unregister(&self, cookie: u32) -> HRESULT;
}

/// Registers event sinks of one interface family.
pub struct ComNotificationService {
    service: IVirtualDesktopNotificationService,
    family: InterfaceFamily,
    sinks: HashMap<u32, IUnknown>,
}

impl ComNotificationService {
    pub fn new(service: IVirtualDesktopNotificationService, family: InterfaceFamily) -> Self {
        Self {
            service,
            family,
            sinks: HashMap::new(),
        }
    }
}

impl NotificationService for ComNotificationService {
    fn register(&mut self, notifier: SwitchNotifier) -> Result<u32> {
        let sink = match self.family {
            InterfaceFamily::Win10 => win10::sink(notifier),
            InterfaceFamily::Win11_21H2 => win11::win11_21h2::sink(notifier),
            InterfaceFamily::Win11_23H2 => win11::win11_23h2::sink(notifier),
            InterfaceFamily::Win11_24H2_Preview => win11::win11_24h2_preview::sink(notifier),
        };
        let mut cookie = 0;
        unsafe { self.service.register(sink.as_raw(), &mut cookie) }
            .ok()
            .map_err(|err| anyhow!("Failed to register notification sink, {err}"))?;
        debug!("registered notification sink {cookie}");
        self.sinks.insert(cookie, sink);
        Ok(cookie)
    }

    fn unregister(&mut self, cookie: u32) -> Result<()> {
        let ret = unsafe { self.service.unregister(cookie) }.ok();
        self.sinks.remove(&cookie);
        ret.map_err(|err| anyhow!("Failed to unregister notification sink {cookie}, {err}"))
    }
}

impl Drop for ComNotificationService {
    fn drop(&mut self) {
        let cookies: Vec<u32> = self.sinks.keys().copied().collect();
        for cookie in cookies {
            if let Err(err) = self.unregister(cookie) {
                warn!("{err}");
            }
        }
        debug!("notification service destroyed");
    }
}
