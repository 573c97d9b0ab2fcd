use ratatui::style::Color;

pub const PRIMARY: Color = Color::from_u32(0x00ff8a3d);
pub const SECONDARY: Color = Color::from_u32(0x00803a10);
pub const NEUTRAL: Color = Color::from_u32(0x00404040);
pub const BACKGROUND: Color = Color::from_u32(0x000d0d0d);
pub const ACCENT: Color = Color::from_u32(0x00ffd28a);
pub const ERROR: Color = Color::from_u32(0x00e5484d);
