/// Pointer button, independent of the windowing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Raw pointer input in surface pixel coordinates.
///
/// Hosts translate their native events into these; the controls never see
/// backend types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed { button: PointerButton, x: f32, y: f32 },
    Released { button: PointerButton },
    Moved { x: f32, y: f32 },
    /// Vertical scroll; negative is away from the user (scroll up).
    Wheel { delta_y: f32 },
    /// The pointer left the surface or input focus was lost.
    Cancelled,
}
