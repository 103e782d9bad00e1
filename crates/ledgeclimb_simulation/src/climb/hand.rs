//! Hand target — куда должна прийти рука относительно climb point'а

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::action::BodyPart;

/// Смещение руки от climb point'а (в осях точки)
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct HandOffset {
    /// Вдоль right оси, наружу от центра точки
    pub lateral: f32,
    pub up: f32,
    /// Вдоль forward точки (наружу от стены)
    pub forward: f32,
}

impl HandOffset {
    pub const fn new(lateral: f32, up: f32, forward: f32) -> Self {
        Self { lateral, up, forward }
    }
}

impl Default for HandOffset {
    fn default() -> Self {
        Self::new(0.25, 0.1, 0.1)
    }
}

/// World позиция руки для climb point'а
///
/// `position + forward * offset.forward + up * offset.up - hand_dir * offset.lateral`,
/// hand_dir = right точки для правой руки, -right для левой.
pub fn hand_target(ledge: &GlobalTransform, hand: BodyPart, offset: HandOffset) -> Vec3 {
    let right = ledge.right().as_vec3();
    let hand_dir = if hand == BodyPart::LeftHand { -right } else { right };

    ledge.translation() + ledge.forward().as_vec3() * offset.forward + Vec3::Y * offset.up
        - hand_dir * offset.lateral
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Точка на лицевой грани стены, forward наружу (+Z)
    fn wall_point(position: Vec3) -> GlobalTransform {
        GlobalTransform::from(Transform::from_translation(position).looking_to(Vec3::Z, Vec3::Y))
    }

    #[test]
    fn test_default_offset() {
        assert_eq!(HandOffset::default(), HandOffset::new(0.25, 0.1, 0.1));
    }

    #[test]
    fn test_right_hand_target() {
        let point = wall_point(Vec3::new(1.0, 2.0, -2.0));
        let target = hand_target(&point, BodyPart::RightHand, HandOffset::default());

        // right точки = -X → рука уходит в +X (правая рука персонажа, смотрящего в -Z)
        assert!((target - Vec3::new(1.25, 2.1, -1.9)).length() < 1e-5);
    }

    #[test]
    fn test_left_hand_mirrors_lateral_offset() {
        let point = wall_point(Vec3::new(1.0, 2.0, -2.0));
        let offset = HandOffset::new(0.25, 0.05, 0.1);

        let right = hand_target(&point, BodyPart::RightHand, offset);
        let left = hand_target(&point, BodyPart::LeftHand, offset);

        assert!((right.x - 1.25).abs() < 1e-5);
        assert!((left.x - 0.75).abs() < 1e-5);
        assert_eq!(right.y, left.y);
        assert_eq!(right.z, left.z);
    }

    #[test]
    fn test_negative_forward_offset_goes_into_wall() {
        let point = wall_point(Vec3::ZERO);
        let target = hand_target(&point, BodyPart::RightHand, HandOffset::new(0.25, 0.2, -0.2));
        assert!((target.z + 0.2).abs() < 1e-5);
        assert!((target.y - 0.2).abs() < 1e-5);
    }
}
