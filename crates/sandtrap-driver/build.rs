//! Build script for the Sandtrap Windows driver
//!
//! Configures the WDK build environment and links the kernel libraries.
//! On any other host there is nothing to configure: the crate compiles
//! to an empty library.

#[cfg(windows)]
fn main() -> Result<(), wdk_build::ConfigError> {
    wdk_build::Config::from_env_auto()?.configure_binary_build()
}

#[cfg(not(windows))]
fn main() {}
