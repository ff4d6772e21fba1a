#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A frame-scoped operation was attempted outside a
    /// `begin_frame`/`end_frame` bracket.
    #[error("No active frame")]
    NotInFrame,

    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    #[error("Renderer error: {0}")]
    Backend(String),

    #[error("Text shaping failed: {0}")]
    TextShaping(String),
}
