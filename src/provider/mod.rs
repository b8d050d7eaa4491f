//! Built-in providers

pub mod directory;

use reconcile::Registry;

/// Registry of every built-in provider
pub fn registry() -> reconcile::Result<Registry> {
    Registry::builder()
        .register(directory::NAME, directory::construct)
        .build()
}
