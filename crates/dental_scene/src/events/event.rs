//! Input event value type

use bitflags::bitflags;

use crate::foundation::math::Vec2;

/// Mask selecting every single and multi pointer code
pub const POINTER_MASK: u32 = 0xFF;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EventType {
    /// Nothing but a request to draw
    Render = 0,
    /// A button went down
    PointerPress = 1,
    /// The pointer moved
    PointerMove = 2,
    /// A button went up
    PointerRelease = 3,
    /// Wheel away from the user
    PointerScrollUp = 4,
    /// Wheel towards the user
    PointerScrollDown = 5,
    /// Horizontal wheel left
    PointerScrollLeft = 6,
    /// Horizontal wheel right
    PointerScrollRight = 7,
    /// Two presses in quick succession
    PointerDoubleClick = 8,
    /// A second finger touched down
    MultiPointerPress = 0x10,
    /// Two fingers moved
    MultiPointerMove = 0x20,
    /// One of two fingers lifted
    MultiPointerRelease = 0x40,
}

impl EventType {
    /// Numeric code
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Event type for a numeric code
    pub const fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Render,
            1 => Self::PointerPress,
            2 => Self::PointerMove,
            3 => Self::PointerRelease,
            4 => Self::PointerScrollUp,
            5 => Self::PointerScrollDown,
            6 => Self::PointerScrollLeft,
            7 => Self::PointerScrollRight,
            8 => Self::PointerDoubleClick,
            0x10 => Self::MultiPointerPress,
            0x20 => Self::MultiPointerMove,
            0x40 => Self::MultiPointerRelease,
            _ => return None,
        })
    }

    /// True for every kind of pointer input
    pub const fn is_pointer(self) -> bool {
        self.code() & POINTER_MASK != 0
    }

    /// True for the two-finger kinds
    pub const fn is_multi_pointer(self) -> bool {
        matches!(
            self,
            Self::MultiPointerPress | Self::MultiPointerMove | Self::MultiPointerRelease
        )
    }
}

bitflags! {
    /// Mouse buttons held during a pointer event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u32 {
        /// Primary button
        const LEFT = 1;
        /// Secondary button
        const RIGHT = 2;
        /// Wheel button
        const MIDDLE = 4;
    }
}

/// One input event
///
/// Window points are pixels with the origin at the top left. The project
/// points are filled in by whoever owns the viewport before the event reaches
/// the manipulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Kind of event
    pub event_type: EventType,
    /// Buttons held
    pub buttons: Buttons,
    /// Primary pointer in window pixels
    pub first_point: Vec2,
    /// Secondary pointer in window pixels
    pub second_point: Vec2,
    /// Primary pointer in normalized device coordinates
    pub first_project_point: Vec2,
    /// Secondary pointer in normalized device coordinates
    pub second_project_point: Vec2,
    /// Set once a consumer acted on the event
    pub handled: bool,
    /// Time stamp in seconds
    pub reference_time: f64,
}

impl Event {
    /// Event of `event_type` with everything else zeroed
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            buttons: Buttons::empty(),
            first_point: Vec2::zeros(),
            second_point: Vec2::zeros(),
            first_project_point: Vec2::zeros(),
            second_project_point: Vec2::zeros(),
            handled: false,
            reference_time: 0.0,
        }
    }

    /// Redraw request
    pub fn render() -> Self {
        Self::new(EventType::Render)
    }

    /// Single pointer event at a window position
    pub fn pointer(event_type: EventType, buttons: Buttons, point: Vec2) -> Self {
        Self {
            buttons,
            first_point: point,
            ..Self::new(event_type)
        }
    }

    /// Two-finger event at two window positions
    pub fn multi_pointer(event_type: EventType, first: Vec2, second: Vec2) -> Self {
        Self {
            first_point: first,
            second_point: second,
            ..Self::new(event_type)
        }
    }

    /// Set the time stamp
    pub fn with_time(mut self, reference_time: f64) -> Self {
        self.reference_time = reference_time;
        self
    }

    /// Set the normalized pointer positions directly
    pub fn with_project_points(mut self, first: Vec2, second: Vec2) -> Self {
        self.first_project_point = first;
        self.second_project_point = second;
        self
    }

    /// True for pointer input of any kind
    pub const fn is_pointer(&self) -> bool {
        self.event_type.is_pointer()
    }
}
