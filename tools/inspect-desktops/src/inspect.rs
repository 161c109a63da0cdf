use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use virtual_desktop_watcher::utils::{get_window_title, list_visible_windows};
use virtual_desktop_watcher::{Availability, Config, DesktopId, VirtualDesktops};

use windows::Win32::Foundation::{GetLastError, HWND};
use windows::Win32::System::Com::{CoCreateInstance, CLSCTX_ALL};
use windows::Win32::UI::Shell::{IVirtualDesktopManager, VirtualDesktopManager};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, TranslateMessage, MSG,
};

pub fn run() -> Result<()> {
    let watch = std::env::args().skip(1).any(|v| v == "--watch");
    simple_logging::log_to_stderr(log::LevelFilter::Debug);

    let desktops = VirtualDesktops::with_system(Config::default());
    let availability = desktops.init();
    println!(
        "variant:{} build:{} state:{:?}",
        desktops.variant(),
        desktops
            .build_number()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".into()),
        desktops.state()
    );

    let current = desktops.current_desktop();
    for index in 1..=desktops.desktop_count() {
        match desktops.desktop_by_index(index) {
            Ok(info) => println!(
                "{}{:>3} {:<20} {}",
                if info.id == current.id { "*" } else { " " },
                info.index,
                info.name,
                info.id
            ),
            Err(err) => println!("  {index:>3} {err}"),
        }
    }

    if availability != Availability::Unavailable {
        for (id, windows) in group_windows()? {
            println!("{id}");
            for (hwnd, title) in windows {
                println!("    {:>10} {}", hwnd.0 as isize, title);
            }
        }
    }

    if watch {
        desktops.set_switch_listener(|index, name| println!("switched to {index} {name}"));
        eventloop()?;
    }
    desktops.shutdown();
    Ok(())
}

fn group_windows() -> Result<IndexMap<DesktopId, Vec<(HWND, String)>>> {
    let manager: IVirtualDesktopManager =
        unsafe { CoCreateInstance(&VirtualDesktopManager, None, CLSCTX_ALL) }
            .map_err(|err| anyhow!("Failed to create virtual desktop manager, {err}"))?;
    let mut result: IndexMap<DesktopId, Vec<(HWND, String)>> = IndexMap::new();
    for hwnd in list_visible_windows()? {
        let title = get_window_title(hwnd);
        if title.is_empty() {
            continue;
        }
        let Ok(guid) = (unsafe { manager.GetWindowDesktopId(hwnd) }) else {
            continue;
        };
        let id = DesktopId::from_u128(guid.to_u128());
        result.entry(id).or_default().push((hwnd, title));
    }
    Ok(result)
}

fn eventloop() -> Result<()> {
    let mut message = MSG::default();
    loop {
        let ret = unsafe { GetMessageW(&mut message, None, 0, 0) };
        match ret.0 {
            -1 => {
                unsafe { GetLastError() }.ok()?;
            }
            0 => break,
            _ => unsafe {
                let _ = TranslateMessage(&message);
                DispatchMessageW(&message);
            },
        }
    }
    Ok(())
}
