/// Terminal-facing layer: input tracking, gamepad, sound, rendering.

pub mod gamepad;
pub mod input;
pub mod renderer;
pub mod sound;
