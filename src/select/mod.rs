//! Face selection: reduce a candidate list to exactly one face.
//!
//! A photo with several faces (a friend in the background, a poster on the wall) needs an
//! operator-authored [`SelectionRule`] bound to its file name. The rule maps each candidate to a
//! score and the lowest score wins; ties go to the candidate the detector listed first.

pub(crate) mod diagnostic;

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    detect::FaceCandidate,
    foundation::error::{FacelapseError, FacelapseResult},
};

/// Ranking function over candidates. Lower score wins.
pub trait FaceRanking: Send + Sync {
    fn score(&self, face: &FaceCandidate) -> f64;

    /// Stable identity of the ranking; folded into the transform-stage cache fingerprint.
    fn name(&self) -> String;
}

/// Bounding-box coordinate a rule looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Left,
    Top,
    Right,
    Bottom,
    CenterX,
    CenterY,
}

impl Anchor {
    pub fn value(self, face: &FaceCandidate) -> f64 {
        let b = &face.bbox;
        match self {
            Self::Left => b.left(),
            Self::Top => b.top(),
            Self::Right => b.right(),
            Self::Bottom => b.bottom(),
            Self::CenterX => b.center().x,
            Self::CenterY => b.center().y,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// Smallest coordinate wins (e.g. top-most face for `top`).
    #[default]
    Ascending,
    /// Largest coordinate wins.
    Descending,
}

/// Built-in, configuration-friendly ranking rules.
///
/// In JSON: `{"rule": "coordinate", "anchor": "top"}`,
/// `{"rule": "nearest", "anchor": "top", "value": 500}`, `{"rule": "nearest_point", "x": 0,
/// "y": 0}`, `{"rule": "largest"}`, `{"rule": "smallest"}`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case", deny_unknown_fields)]
pub enum SelectionRule {
    Coordinate {
        anchor: Anchor,
        #[serde(default)]
        order: Order,
    },
    /// Face whose anchor coordinate is closest to `value`.
    Nearest { anchor: Anchor, value: f64 },
    /// Face whose box center is closest to `(x, y)`.
    NearestPoint { x: f64, y: f64 },
    Largest,
    Smallest,
}

impl FaceRanking for SelectionRule {
    fn score(&self, face: &FaceCandidate) -> f64 {
        match *self {
            Self::Coordinate { anchor, order } => {
                let v = anchor.value(face);
                match order {
                    Order::Ascending => v,
                    Order::Descending => -v,
                }
            }
            Self::Nearest { anchor, value } => (anchor.value(face) - value).abs(),
            Self::NearestPoint { x, y } => {
                let c = face.bbox.center();
                (c.x - x).hypot(c.y - y)
            }
            Self::Largest => -face.bbox.area(),
            Self::Smallest => face.bbox.area(),
        }
    }

    fn name(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

/// Per-file rule bindings.
#[derive(Clone, Default)]
pub struct SelectionRules {
    rules: BTreeMap<String, Arc<dyn FaceRanking>>,
}

impl SelectionRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(rules: &BTreeMap<String, SelectionRule>) -> Self {
        let mut out = Self::new();
        for (file, rule) in rules {
            out.insert(file.clone(), Arc::new(rule.clone()));
        }
        out
    }

    pub fn insert(&mut self, file_name: impl Into<String>, rule: Arc<dyn FaceRanking>) {
        self.rules.insert(file_name.into(), rule);
    }

    pub fn get(&self, file_name: &str) -> Option<&dyn FaceRanking> {
        self.rules.get(file_name).map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for SelectionRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.rules.iter().map(|(k, v)| (k, v.name())))
            .finish()
    }
}

/// Index of the chosen candidate.
///
/// Errors: empty list is [`FacelapseError::NoFaceDetected`]; several candidates without a rule
/// is [`FacelapseError::AmbiguousFaceSelection`] with no diagnostic attached (the caller owns
/// the diagnostic write). NaN scores rank last.
pub fn select_face(
    candidates: &[FaceCandidate],
    rule: Option<&dyn FaceRanking>,
) -> FacelapseResult<usize> {
    match (candidates.len(), rule) {
        (0, _) => Err(FacelapseError::NoFaceDetected),
        (1, _) => Ok(0),
        (n, None) => Err(FacelapseError::AmbiguousFaceSelection {
            candidates: n,
            diagnostic: None,
        }),
        (_, Some(rule)) => {
            let mut best = 0usize;
            let mut best_score = f64::INFINITY;
            for (i, face) in candidates.iter().enumerate() {
                let s = rule.score(face);
                let s = if s.is_nan() { f64::INFINITY } else { s };
                if i == 0 || s < best_score {
                    best = i;
                    best_score = s;
                }
            }
            Ok(best)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/select/mod.rs"]
mod tests;
