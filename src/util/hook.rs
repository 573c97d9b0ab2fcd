use crate::ui::tui;

/// Leaves the alternate screen before the default hook prints the panic.
pub fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = tui::Tui::restore() {
            tracing::error!(error = %e, "panic_hook_restore_failed");
        }
        tracing::error!(panic = %panic_info, "panic");
        hook(panic_info);
    }));
}
