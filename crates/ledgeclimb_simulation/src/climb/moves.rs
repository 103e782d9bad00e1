//! Таблица climb переходов: клип, окно target matching, рука, hand offset

use bevy::prelude::*;

use super::hand::HandOffset;
use crate::action::BodyPart;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ClimbMove {
    /// Grab ledge from stand
    IdleToHang,
    /// С края платформы вниз на уступ
    DropToHang,
    HangHopUp,
    HangHopDown,
    HangHopRight,
    HangHopLeft,
    ShimmyRight,
    ShimmyLeft,
    /// Спрыгнуть с уступа (без matching)
    JumpFromHang,
    /// Залезть наверх (без matching)
    MountFromHang,
}

/// Окно target matching в normalized time клипа
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWindow {
    pub start: f32,
    pub target: f32,
}

impl ClimbMove {
    pub fn clip(self) -> &'static str {
        match self {
            ClimbMove::IdleToHang => "IdleToHang",
            ClimbMove::DropToHang => "DropToHang",
            ClimbMove::HangHopUp => "HangHopUp",
            ClimbMove::HangHopDown => "HangHopDown",
            ClimbMove::HangHopRight => "HangHopRight",
            ClimbMove::HangHopLeft => "HangHopLeft",
            ClimbMove::ShimmyRight => "ShimmyRight",
            ClimbMove::ShimmyLeft => "ShimmyLeft",
            ClimbMove::JumpFromHang => "JumpFromHang",
            ClimbMove::MountFromHang => "MountFromHang",
        }
    }

    /// None — переход без target matching
    pub fn match_window(self) -> Option<MatchWindow> {
        let (start, target) = match self {
            ClimbMove::IdleToHang => (0.41, 0.54),
            ClimbMove::DropToHang => (0.30, 0.45),
            ClimbMove::HangHopUp => (0.35, 0.65),
            ClimbMove::HangHopDown => (0.31, 0.65),
            ClimbMove::HangHopRight | ClimbMove::HangHopLeft => (0.20, 0.50),
            ClimbMove::ShimmyRight | ClimbMove::ShimmyLeft => (0.0, 0.38),
            ClimbMove::JumpFromHang | ClimbMove::MountFromHang => return None,
        };
        Some(MatchWindow { start, target })
    }

    /// Какая рука матчится к точке (левый shimmy ведёт левой рукой)
    pub fn hand(self) -> BodyPart {
        match self {
            ClimbMove::ShimmyLeft => BodyPart::LeftHand,
            _ => BodyPart::RightHand,
        }
    }

    pub fn hand_offset(self) -> HandOffset {
        match self {
            ClimbMove::DropToHang => HandOffset::new(0.25, 0.2, -0.2),
            ClimbMove::HangHopUp => HandOffset::new(0.25, 0.08, 0.15),
            ClimbMove::HangHopDown => HandOffset::new(0.25, 0.1, 0.13),
            ClimbMove::ShimmyRight | ClimbMove::ShimmyLeft => HandOffset::new(0.25, 0.05, 0.1),
            _ => HandOffset::default(),
        }
    }

    /// Hop по направлению Jump-ребра (вертикаль первой)
    pub fn hop(direction: IVec2) -> Option<Self> {
        match (direction.x, direction.y) {
            (_, 1) => Some(ClimbMove::HangHopUp),
            (_, -1) => Some(ClimbMove::HangHopDown),
            (1, _) => Some(ClimbMove::HangHopRight),
            (-1, _) => Some(ClimbMove::HangHopLeft),
            _ => None,
        }
    }

    /// Shimmy по направлению Move-ребра (только горизонталь)
    pub fn shimmy(direction: IVec2) -> Option<Self> {
        match direction.x {
            1 => Some(ClimbMove::ShimmyRight),
            -1 => Some(ClimbMove::ShimmyLeft),
            _ => None,
        }
    }

    /// Переход заканчивается висением на точке
    pub fn ends_hanging(self) -> bool {
        !matches!(self, ClimbMove::JumpFromHang | ClimbMove::MountFromHang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_direction_mapping() {
        assert_eq!(ClimbMove::hop(IVec2::new(0, 1)), Some(ClimbMove::HangHopUp));
        assert_eq!(ClimbMove::hop(IVec2::new(0, -1)), Some(ClimbMove::HangHopDown));
        assert_eq!(ClimbMove::hop(IVec2::new(1, 0)), Some(ClimbMove::HangHopRight));
        assert_eq!(ClimbMove::hop(IVec2::new(-1, 0)), Some(ClimbMove::HangHopLeft));
        assert_eq!(ClimbMove::hop(IVec2::ZERO), None);
    }

    #[test]
    fn test_shimmy_ignores_vertical_edges() {
        assert_eq!(ClimbMove::shimmy(IVec2::X), Some(ClimbMove::ShimmyRight));
        assert_eq!(ClimbMove::shimmy(IVec2::NEG_X), Some(ClimbMove::ShimmyLeft));
        assert_eq!(ClimbMove::shimmy(IVec2::Y), None);
    }

    #[test]
    fn test_shimmy_hands() {
        assert_eq!(ClimbMove::ShimmyLeft.hand(), BodyPart::LeftHand);
        assert_eq!(ClimbMove::ShimmyRight.hand(), BodyPart::RightHand);
        assert_eq!(ClimbMove::HangHopLeft.hand(), BodyPart::RightHand);
    }

    #[test]
    fn test_exit_moves_have_no_match() {
        assert!(ClimbMove::JumpFromHang.match_window().is_none());
        assert!(ClimbMove::MountFromHang.match_window().is_none());
        assert!(!ClimbMove::MountFromHang.ends_hanging());

        let window = ClimbMove::IdleToHang.match_window().expect("grab matches hand");
        assert_eq!((window.start, window.target), (0.41, 0.54));
        assert!(ClimbMove::IdleToHang.ends_hanging());
    }

    #[test]
    fn test_drop_to_hang_offset_reaches_under_edge() {
        assert_eq!(ClimbMove::DropToHang.hand_offset(), HandOffset::new(0.25, 0.2, -0.2));
        assert_eq!(ClimbMove::HangHopRight.hand_offset(), HandOffset::default());
    }
}
