//! # Controls Module
//!
//! Keyboard interaction for the 3-D demos. Held keys drive a [`Motion`] every frame; the
//! motion is folded into the object's [`ModelTransform`].
//!
//! | Key                          | Effect                         |
//! |------------------------------|--------------------------------|
//! | arrows                       | pan along the object's x / y   |
//! | keypad `+`, `=`              | grow                           |
//! | keypad `-`, `-`              | shrink                         |
//! | keypad `*`                   | spin about all three axes      |
//! | `X`, `Y`, `Z`                | spin about one axis            |
//! | `R`                          | reset the transform            |
//! | `1` .. `6`                   | switch demo                    |
//! | `Esc`                        | quit                           |
//!
//! Rates are expressed per frame at [`REFERENCE_FPS`] and scaled by the real frame time, so
//! the object moves at the same speed regardless of the display's refresh rate.

use std::collections::HashSet;

use winit::event::ElementState;
use winit::keyboard::KeyCode;

use crate::demo::Demo;

/// Frame rate the per-frame rates below are tuned for.
pub const REFERENCE_FPS: f32 = 60.0;

/// Pan distance per reference frame.
pub const TRANSLATE_STEP: f32 = 0.01;

/// Scale factor per reference frame while growing; shrinking uses [`SHRINK_STEP`].
pub const GROW_STEP: f32 = 1.01;

pub const SHRINK_STEP: f32 = 0.99;

/// Rotation in radians per reference frame.
pub const ROTATE_STEP: f32 = 0.01;

/// Longest frame time, in seconds, that motion is scaled by.
pub const MAX_FRAME_TIME: f32 = 0.1;

/// Discrete commands triggered on key press.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Exit,
    Reset,
    SelectDemo(Demo),
}

/// The change to apply to the model during one frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Motion {
    pub translate: nalgebra_glm::Vec3,

    /// Uniform scale factor, `1.0` for none.
    pub scale: f32,

    /// Angles in radians about x, y and z.
    pub rotate: nalgebra_glm::Vec3,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            translate: nalgebra_glm::Vec3::zeros(),
            scale: 1.0,
            rotate: nalgebra_glm::Vec3::zeros(),
        }
    }
}

impl Motion {
    pub fn is_still(&self) -> bool {
        *self == Self::default()
    }
}

/// Tracks which keys are held.
#[derive(Debug, Default)]
pub struct Controls {
    held: HashSet<KeyCode>,
}

impl Controls {
    /// Records a key transition and returns the command it triggers, if any.
    ///
    /// Commands fire on the initial press only; auto-repeat presses of a held key are ignored.
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) -> Option<Action> {
        match state {
            ElementState::Pressed => {
                if !self.held.insert(key) {
                    return None;
                }
            }
            ElementState::Released => {
                self.held.remove(&key);
                return None;
            }
        }

        match key {
            KeyCode::Escape => Some(Action::Exit),
            KeyCode::KeyR => Some(Action::Reset),
            KeyCode::Digit1 => Some(Action::SelectDemo(Demo::ALL[0])),
            KeyCode::Digit2 => Some(Action::SelectDemo(Demo::ALL[1])),
            KeyCode::Digit3 => Some(Action::SelectDemo(Demo::ALL[2])),
            KeyCode::Digit4 => Some(Action::SelectDemo(Demo::ALL[3])),
            KeyCode::Digit5 => Some(Action::SelectDemo(Demo::ALL[4])),
            KeyCode::Digit6 => Some(Action::SelectDemo(Demo::ALL[5])),
            _ => None,
        }
    }

    /// Like [`Controls::handle_key`] for a key event the overlay already consumed.
    ///
    /// A consumed press is ignored, but a consumed release still ends the hold; otherwise a key
    /// released while an overlay widget has focus would keep moving the object.
    pub fn handle_captured_key(&mut self, key: KeyCode, state: ElementState) {
        if state == ElementState::Released {
            self.held.remove(&key);
        }
    }

    /// Forgets all held keys, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// The motion accumulated by the held keys over `delta_time` seconds.
    ///
    /// Frame times above [`MAX_FRAME_TIME`] count as that long, so a stalled frame does not
    /// make the object jump.
    pub fn motion(&self, delta_time: f32) -> Motion {
        let frames = delta_time.clamp(0.0, MAX_FRAME_TIME) * REFERENCE_FPS;
        let held = |keys: &[KeyCode]| keys.iter().any(|key| self.held.contains(key));
        let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;

        let translate = nalgebra_glm::vec3(
            axis(held(&[KeyCode::ArrowLeft]), held(&[KeyCode::ArrowRight])),
            axis(held(&[KeyCode::ArrowDown]), held(&[KeyCode::ArrowUp])),
            0.0,
        ) * TRANSLATE_STEP
            * frames;

        let grow = held(&[KeyCode::NumpadAdd, KeyCode::Equal]);
        let shrink = held(&[KeyCode::NumpadSubtract, KeyCode::Minus]);
        let scale = match (grow, shrink) {
            (true, false) => GROW_STEP.powf(frames),
            (false, true) => SHRINK_STEP.powf(frames),
            _ => 1.0,
        };

        let all = held(&[KeyCode::NumpadMultiply]);
        let rotate = nalgebra_glm::vec3(
            (all || held(&[KeyCode::KeyX])) as i32 as f32,
            (all || held(&[KeyCode::KeyY])) as i32 as f32,
            (all || held(&[KeyCode::KeyZ])) as i32 as f32,
        ) * ROTATE_STEP
            * frames;

        Motion {
            translate,
            scale,
            rotate,
        }
    }
}

/// The object-to-world matrix of the displayed object.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ModelTransform {
    pub model: nalgebra_glm::Mat4,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            model: nalgebra_glm::Mat4::identity(),
        }
    }
}

impl ModelTransform {
    /// Folds one frame of motion into the model, in object space:
    /// `model * T * S * Rx * Ry * Rz`.
    pub fn apply(&mut self, motion: &Motion) {
        if motion.is_still() {
            return;
        }
        let mut step = nalgebra_glm::translation(&motion.translate);
        step = nalgebra_glm::scale(&step, &nalgebra_glm::Vec3::repeat(motion.scale));
        step = nalgebra_glm::rotate_x(&step, motion.rotate.x);
        step = nalgebra_glm::rotate_y(&step, motion.rotate.y);
        step = nalgebra_glm::rotate_z(&step, motion.rotate.z);
        self.model *= step;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// World-space position of the object's origin.
    pub fn origin(&self) -> nalgebra_glm::Vec3 {
        nalgebra_glm::vec3(self.model[(0, 3)], self.model[(1, 3)], self.model[(2, 3)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / REFERENCE_FPS;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn commands_fire_once_per_press() {
        let mut controls = Controls::default();
        assert_eq!(
            controls.handle_key(KeyCode::Digit6, ElementState::Pressed),
            Some(Action::SelectDemo(Demo::Raycast))
        );
        assert_eq!(controls.handle_key(KeyCode::Digit6, ElementState::Pressed), None);
        assert_eq!(controls.handle_key(KeyCode::Digit6, ElementState::Released), None);
        assert_eq!(
            controls.handle_key(KeyCode::Escape, ElementState::Pressed),
            Some(Action::Exit)
        );
    }

    #[test]
    fn no_keys_no_motion() {
        assert!(Controls::default().motion(FRAME).is_still());
    }

    #[test]
    fn held_arrow_pans_until_released() {
        let mut controls = Controls::default();
        controls.handle_key(KeyCode::ArrowUp, ElementState::Pressed);
        controls.handle_key(KeyCode::ArrowLeft, ElementState::Pressed);

        let motion = controls.motion(FRAME);
        assert!(approx(motion.translate.x, -TRANSLATE_STEP));
        assert!(approx(motion.translate.y, TRANSLATE_STEP));

        controls.handle_key(KeyCode::ArrowUp, ElementState::Released);
        let motion = controls.motion(FRAME);
        assert!(approx(motion.translate.y, 0.0));
        assert!(controls.is_held(KeyCode::ArrowLeft));

        controls.release_all();
        assert!(controls.motion(FRAME).is_still());
    }

    #[test]
    fn release_seen_only_by_the_overlay_still_stops_motion() {
        let mut controls = Controls::default();
        controls.handle_key(KeyCode::ArrowUp, ElementState::Pressed);

        controls.handle_captured_key(KeyCode::ArrowDown, ElementState::Pressed);
        assert!(!controls.is_held(KeyCode::ArrowDown));

        controls.handle_captured_key(KeyCode::ArrowUp, ElementState::Released);
        assert!(!controls.is_held(KeyCode::ArrowUp));
        assert!(controls.motion(FRAME).is_still());
    }

    #[test]
    fn stalled_frame_moves_no_further_than_the_cap() {
        let mut controls = Controls::default();
        controls.handle_key(KeyCode::NumpadAdd, ElementState::Pressed);
        controls.handle_key(KeyCode::ArrowRight, ElementState::Pressed);

        let capped = controls.motion(MAX_FRAME_TIME);
        let stalled = controls.motion(5.0);
        assert!(approx(stalled.scale, capped.scale));
        assert!(approx(stalled.translate.x, capped.translate.x));
        assert!(approx(capped.scale, GROW_STEP.powf(MAX_FRAME_TIME * REFERENCE_FPS)));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut controls = Controls::default();
        controls.handle_key(KeyCode::NumpadAdd, ElementState::Pressed);
        controls.handle_key(KeyCode::Minus, ElementState::Pressed);
        assert_eq!(controls.motion(FRAME).scale, 1.0);
    }

    #[test]
    fn rates_scale_with_frame_time() {
        let mut controls = Controls::default();
        controls.handle_key(KeyCode::NumpadAdd, ElementState::Pressed);
        controls.handle_key(KeyCode::NumpadMultiply, ElementState::Pressed);

        let one = controls.motion(FRAME);
        assert!(approx(one.scale, GROW_STEP));
        assert!(approx(one.rotate.z, ROTATE_STEP));

        let two = controls.motion(2.0 * FRAME);
        assert!(approx(two.scale, GROW_STEP * GROW_STEP));
        assert!(approx(two.rotate.x, 2.0 * ROTATE_STEP));
    }

    #[test]
    fn transform_accumulates_in_object_space() {
        let mut transform = ModelTransform::default();
        transform.apply(&Motion {
            translate: nalgebra_glm::vec3(0.5, 0.0, 0.0),
            ..Default::default()
        });
        assert!(approx(transform.origin().x, 0.5));

        // A quarter turn about z makes the next local +x pan move along world +y.
        transform.apply(&Motion {
            rotate: nalgebra_glm::vec3(0.0, 0.0, std::f32::consts::FRAC_PI_2),
            ..Default::default()
        });
        transform.apply(&Motion {
            translate: nalgebra_glm::vec3(0.25, 0.0, 0.0),
            ..Default::default()
        });
        let origin = transform.origin();
        assert!(approx(origin.x, 0.5));
        assert!(approx(origin.y, 0.25));

        transform.reset();
        assert_eq!(transform, ModelTransform::default());
    }

    #[test]
    fn scaling_compounds() {
        let mut transform = ModelTransform::default();
        let motion = Motion {
            scale: 2.0,
            ..Default::default()
        };
        transform.apply(&motion);
        transform.apply(&motion);
        assert!(approx(transform.model[(0, 0)], 4.0));
        assert!(approx(transform.model[(3, 3)], 1.0));
    }
}
