//! COM implementation of the backend seams.

mod public;
mod pump;
mod service;
mod store;
mod win10;
mod win11;

use crate::backend::{
    DesktopManager, DesktopStore, Interop, NotificationService, PublicManager, Pump, PumpHandler,
};
use crate::desktop::DesktopId;
use crate::tables::{
    InterfaceFamily, InterfaceTable, CLSID_IMMERSIVE_SHELL, CLSID_VIRTUAL_DESKTOP_MANAGER,
    SID_VIRTUAL_DESKTOP_MANAGER_INTERNAL, SID_VIRTUAL_DESKTOP_NOTIFICATION_SERVICE,
};
use crate::utils::os_build_number;
use crate::version::PlatformVariant;
use public::ComPublicManager;
use pump::MessagePump;
use service::{ComNotificationService, IVirtualDesktopNotificationService};
use store::RegistryStore;

use anyhow::{anyhow, bail, Result};
use windows::core::{Interface, GUID};
use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, IServiceProvider, CLSCTX_ALL,
    CLSCTX_LOCAL_SERVER, COINIT_APARTMENTTHREADED,
};
use windows::Win32::UI::Shell::IVirtualDesktopManager;

pub(crate) fn guid_to_id(guid: &GUID) -> DesktopId {
    DesktopId::from_u128(guid.to_u128())
}

/// Talks to Explorer through the documented and the undocumented
/// virtual desktop interfaces.
#[derive(Default)]
pub struct ComInterop {
    provider: Option<IServiceProvider>,
}

impl ComInterop {
    pub fn new() -> Self {
        Self::default()
    }

    fn provider(&self) -> Result<&IServiceProvider> {
        self.provider
            .as_ref()
            .ok_or_else(|| anyhow!("No immersive shell service provider"))
    }
}

/// Queries `sid`, retrying with the interface id as service id.
fn query_service<T: Interface>(provider: &IServiceProvider, sid: u128) -> Result<T> {
    match unsafe { provider.QueryService::<T>(&GUID::from_u128(sid)) } {
        Ok(v) => Ok(v),
        Err(err) => {
            debug!(
                "Failed to query service {}, {err}, retrying with interface id",
                DesktopId::from_u128(sid)
            );
            unsafe { provider.QueryService::<T>(&T::IID) }
                .map_err(|err| anyhow!("Failed to query service {:?}, {err}", T::IID))
        }
    }
}

fn check_table(family: InterfaceFamily, ids: [u128; 3], table: &InterfaceTable) -> Result<()> {
    if ids != table.ids() {
        bail!("Interface ids of {family:?} do not match the selected table");
    }
    Ok(())
}

impl Interop for ComInterop {
    fn build_number(&self) -> Option<u32> {
        os_build_number()
    }

    fn initialize(&mut self) -> Result<bool> {
        let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            debug!("com already initialized with another threading model");
            return Ok(false);
        }
        hr.ok()
            .map_err(|err| anyhow!("Failed to initialize com, {err}"))?;
        Ok(true)
    }

    fn uninitialize(&mut self) {
        unsafe { CoUninitialize() };
    }

    fn public_manager(&mut self) -> Result<Box<dyn PublicManager>> {
        let manager: IVirtualDesktopManager = unsafe {
            CoCreateInstance(
                &GUID::from_u128(CLSID_VIRTUAL_DESKTOP_MANAGER),
                None,
                CLSCTX_ALL,
            )
        }
        .map_err(|err| anyhow!("Failed to create virtual desktop manager, {err}"))?;
        Ok(Box::new(ComPublicManager::new(manager)))
    }

    fn service_locator(&mut self) -> Result<()> {
        let provider: IServiceProvider = unsafe {
            CoCreateInstance(
                &GUID::from_u128(CLSID_IMMERSIVE_SHELL),
                None,
                CLSCTX_LOCAL_SERVER,
            )
        }
        .map_err(|err| anyhow!("Failed to create immersive shell, {err}"))?;
        self.provider = Some(provider);
        Ok(())
    }

    fn internal_manager(
        &mut self,
        variant: PlatformVariant,
        table: &InterfaceTable,
    ) -> Result<Box<dyn DesktopManager>> {
        let provider = self.provider()?;
        let family = InterfaceFamily::for_variant(variant);
        let sid = SID_VIRTUAL_DESKTOP_MANAGER_INTERNAL;
        let manager: Box<dyn DesktopManager> = match family {
            InterfaceFamily::Win10 => {
                check_table(family, win10::ids(), table)?;
                Box::new(win10::Manager::new(query_service(provider, sid)?))
            }
            InterfaceFamily::Win11_21H2 => {
                check_table(family, win11::win11_21h2::ids(), table)?;
                Box::new(win11::win11_21h2::Manager::new(query_service(provider, sid)?))
            }
            InterfaceFamily::Win11_23H2 => {
                check_table(family, win11::win11_23h2::ids(), table)?;
                Box::new(win11::win11_23h2::Manager::new(query_service(provider, sid)?))
            }
            InterfaceFamily::Win11_24H2_Preview => {
                check_table(family, win11::win11_24h2_preview::ids(), table)?;
                Box::new(win11::win11_24h2_preview::Manager::new(query_service(
                    provider, sid,
                )?))
            }
        };
        Ok(manager)
    }

    fn notification_service(
        &mut self,
        variant: PlatformVariant,
    ) -> Result<Box<dyn NotificationService>> {
        let service: IVirtualDesktopNotificationService =
            query_service(self.provider()?, SID_VIRTUAL_DESKTOP_NOTIFICATION_SERVICE)?;
        Ok(Box::new(ComNotificationService::new(
            service,
            InterfaceFamily::for_variant(variant),
        )))
    }

    fn desktop_store(&mut self) -> Box<dyn DesktopStore> {
        Box::new(RegistryStore)
    }

    fn pump(&mut self, handler: PumpHandler) -> Result<Box<dyn Pump>> {
        Ok(Box::new(MessagePump::new(handler)?))
    }

    fn release(&mut self) {
        if self.provider.take().is_some() {
            debug!("immersive shell released");
        }
    }
}
