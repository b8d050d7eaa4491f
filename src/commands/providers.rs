use anyhow::Result;
use colored::Colorize;
use reconcile::Registry;

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, registry: &Registry) -> Result<()> {
    if ctx.quiet {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    ui::header("Providers");
    for name in registry.names() {
        println!("  {} {}", "•".cyan(), name);
    }
    println!();
    ui::dim(&format!("{} registered", ui::plural(registry.len(), "provider")));
    Ok(())
}
