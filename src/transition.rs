//! Presentation transitions (`/Trans`).

use lopdf::{Dictionary, Document as LopdfDocument, Object};
use serde::{Deserialize, Serialize};

use crate::parser::{dict_get, number};

/// Transition style (`/S`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransitionType {
    #[default]
    Replace,
    Split,
    Blinds,
    Box,
    Wipe,
    Dissolve,
    Glitter,
    Fly,
    Push,
    Cover,
    Uncover,
    Fade,
}

/// Dimension of a Split or Blinds effect (`/Dm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransitionAlignment {
    #[default]
    Horizontal,
    Vertical,
}

/// Motion of a Split, Box or Fly effect (`/M`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransitionDirection {
    #[default]
    Inward,
    Outward,
}

/// How the viewer moves from the previous page to this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTransition {
    pub kind: TransitionType,
    /// Duration of the effect in seconds
    pub duration: f64,
    pub alignment: TransitionAlignment,
    pub direction: TransitionDirection,
    /// Direction of motion in degrees, counter-clockwise from left to right
    pub angle: i32,
    /// Starting or ending scale of a Fly effect
    pub scale: f64,
    /// Whether the flown area is rectangular and opaque
    pub rectangular: bool,
}

impl Default for PageTransition {
    fn default() -> Self {
        Self {
            kind: TransitionType::Replace,
            duration: 1.0,
            alignment: TransitionAlignment::Horizontal,
            direction: TransitionDirection::Inward,
            angle: 0,
            scale: 1.0,
            rectangular: false,
        }
    }
}

impl PageTransition {
    /// Read a transition dictionary. Unknown or malformed entries keep
    /// their defaults.
    pub(crate) fn from_dict(doc: &LopdfDocument, dict: &Dictionary) -> Self {
        let name = |key: &[u8]| match dict_get(doc, dict, key) {
            Some(Object::Name(n)) => Some(n.as_slice()),
            _ => None,
        };
        let num = |key: &[u8]| dict_get(doc, dict, key).and_then(number);

        let mut transition = PageTransition::default();

        if let Some(kind) = name(b"S") {
            transition.kind = match kind {
                b"Split" => TransitionType::Split,
                b"Blinds" => TransitionType::Blinds,
                b"Box" => TransitionType::Box,
                b"Wipe" => TransitionType::Wipe,
                b"Dissolve" => TransitionType::Dissolve,
                b"Glitter" => TransitionType::Glitter,
                b"Fly" => TransitionType::Fly,
                b"Push" => TransitionType::Push,
                b"Cover" => TransitionType::Cover,
                b"Uncover" => TransitionType::Uncover,
                b"Fade" => TransitionType::Fade,
                _ => TransitionType::Replace,
            };
        }
        if let Some(d) = num(b"D") {
            transition.duration = d;
        }
        if name(b"Dm") == Some(b"V".as_slice()) {
            transition.alignment = TransitionAlignment::Vertical;
        }
        if name(b"M") == Some(b"O".as_slice()) {
            transition.direction = TransitionDirection::Outward;
        }
        // `/Di /None` is only meaningful for Fly and counts as 0.
        if let Some(angle) = num(b"Di") {
            transition.angle = angle as i32;
        }
        if let Some(scale) = num(b"SS") {
            transition.scale = scale;
        }
        if let Some(Object::Boolean(b)) = dict_get(doc, dict, b"B") {
            transition.rectangular = *b;
        }

        transition
    }
}
