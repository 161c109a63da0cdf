#[cfg(windows)]
mod inspect;

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    inspect::run()
}

#[cfg(not(windows))]
fn main() {
    eprintln!("inspect-desktops only runs on windows");
}
