pub mod desktop_bar;
pub mod full_screen;
pub mod gauge;
pub mod mini_bar;
pub mod sidebar;
pub mod spinner;
pub mod track_list;
pub mod transport;

pub use desktop_bar::DesktopBar;
pub use full_screen::FullScreenTransport;
pub use mini_bar::MiniBar;
