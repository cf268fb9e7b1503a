use engine::{InputAction, InputSnapshot, Vec2};

pub(crate) const DIAGONAL_SCALE: f32 = 0.707;

/// Four held directions collapsed from keys and on-screen buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DirectionInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionInput {
    pub(crate) fn from_keys(input: &InputSnapshot) -> Self {
        Self {
            up: input.is_down(InputAction::MoveUp),
            down: input.is_down(InputAction::MoveDown),
            left: input.is_down(InputAction::MoveLeft),
            right: input.is_down(InputAction::MoveRight),
        }
    }

    pub(crate) fn union(self, other: DirectionInput) -> Self {
        Self {
            up: self.up || other.up,
            down: self.down || other.down,
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }
}

/// Player velocity in tiles per second, y up. Left wins over right and up
/// over down; diagonals are scaled so their speed matches the axial speed.
pub(crate) fn compute_velocity(input: DirectionInput, speed: f32, menu_open: bool) -> Vec2 {
    if menu_open {
        return Vec2::ZERO;
    }

    let mut x = if input.left {
        -1.0
    } else if input.right {
        1.0
    } else {
        0.0
    };
    let mut y = if input.up {
        1.0
    } else if input.down {
        -1.0
    } else {
        0.0
    };
    if x != 0.0 && y != 0.0 {
        x *= DIAGONAL_SCALE;
        y *= DIAGONAL_SCALE;
    }
    Vec2::new(x * speed, y * speed)
}
