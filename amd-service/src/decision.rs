//! Probabilities to a labelled decision

use crate::engine::ClassProbabilities;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Voicemail,
    Human,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Voicemail => write!(f, "voicemail"),
            Label::Human => write!(f, "human"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub label: Label,
    /// Probability of `label`
    pub confidence: f64,
}

/// Human only when strictly more likely; exact ties go to voicemail.
pub fn decide(probs: ClassProbabilities) -> Decision {
    if probs.human > probs.voicemail {
        Decision {
            label: Label::Human,
            confidence: probs.human,
        }
    } else {
        Decision {
            label: Label::Voicemail,
            confidence: probs.voicemail,
        }
    }
}
