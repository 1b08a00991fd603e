//! Simulated decisions for when no model is loaded
//!
//! Keeps the HTTP contract alive while the engine is unavailable. Confidence
//! is drawn from [0.75, 0.95) and the label is human 70% of the time.

use crate::decision::{Decision, Label};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::Mutex;
use tracing::debug;

const CONFIDENCE_MIN: f64 = 0.75;
const CONFIDENCE_MAX: f64 = 0.95;
const HUMAN_PROBABILITY: f64 = 0.7;

pub struct FallbackSimulator {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl FallbackSimulator {
    /// Seeded for reproducible draws, OS entropy otherwise
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => {
                debug!("Fallback simulator seeded with {}", seed);
                Self::with_rng(StdRng::seed_from_u64(seed))
            }
            None => Self::with_rng(StdRng::from_entropy()),
        }
    }

    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    pub fn simulate(&self) -> Decision {
        // A poisoned lock only means another draw panicked; the rng is still usable
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let confidence = rng.gen_range(CONFIDENCE_MIN..CONFIDENCE_MAX);
        let label = if rng.gen_bool(HUMAN_PROBABILITY) {
            Label::Human
        } else {
            Label::Voicemail
        };

        Decision { label, confidence }
    }
}
