pub mod context;
pub mod graphics;
pub mod surface;
pub mod view;

/// Rendering backends for the drawing core. One native backend is selected
/// per build; the recording backend is always available.
pub mod backends {
    /// Cairo rendering backend
    #[cfg(feature = "backend_cairo")]
    pub mod cairo;
    pub mod null;
    /// Vello rendering backend
    #[cfg(feature = "backend_vello")]
    pub mod vello;
}
