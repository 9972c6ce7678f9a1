//! Genome representation and its text codec.
//!
//! A genome is a complete controller configuration: three PID gains plus an
//! ordered sequence of timed thrust/drift actions. Genetic operators work on
//! this structured form; the compact text encoding exists only for
//! checkpoints and external tooling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What the vehicle does while an action is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Main thruster armed; it fires whenever the PID output exceeds the
    /// controller threshold.
    Thrust,
    /// Unpowered drift.
    Drift,
}

impl ActionKind {
    /// Single-letter code used by the text encoding.
    pub fn code(self) -> char {
        match self {
            ActionKind::Thrust => 'T',
            ActionKind::Drift => 'D',
        }
    }
}

/// A timed instruction in the genome's action sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    /// Nominal duration in seconds, in [1.0, 2.5]. The simulation divides
    /// this by sqrt(gravity) so sequences compress under heavy gravity.
    pub duration: f64,
}

/// An encoded controller configuration: PID gains plus an action sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub actions: Vec<Action>,
}

/// Parameter bounds for genome creation and mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeBounds {
    /// Proportional gain bounds.
    pub kp: (f64, f64),
    /// Integral gain bounds.
    pub ki: (f64, f64),
    /// Derivative gain bounds.
    pub kd: (f64, f64),
    /// Action duration bounds in seconds.
    pub duration: (f64, f64),
    /// Inclusive bounds on the action count at creation.
    pub action_count: (usize, usize),
}

impl Default for GenomeBounds {
    fn default() -> Self {
        Self {
            kp: (0.01, 1.0),
            ki: (0.001, 0.1),
            kd: (0.01, 0.5),
            duration: (1.0, 2.5),
            action_count: (3, 9),
        }
    }
}

/// Errors from decoding genome text.
///
/// Malformed text is a defect in whatever produced it, so decoding fails
/// loudly instead of defaulting fields.
#[derive(Debug, thiserror::Error)]
pub enum ParseGenomeError {
    #[error("Genome text is empty")]
    Empty,
    #[error("Expected 3 comma-separated gains, found {0} fields")]
    GainCount(usize),
    #[error("Invalid number {value:?} in field {field}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("Expected action as <kind>,<duration>, found {0:?}")]
    ActionShape(String),
    #[error("Unknown action kind {0:?} (expected T or D)")]
    UnknownKind(String),
}

impl fmt::Display for Genome {
    /// Renders `"<kp>,<ki>,<kd>;<T|D>,<duration>;...;"` with gains at three
    /// decimal places and durations at two.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3},{:.3},{:.3};", self.kp, self.ki, self.kd)?;
        for action in &self.actions {
            write!(f, "{},{:.2};", action.kind.code(), action.duration)?;
        }
        Ok(())
    }
}

fn parse_float(field: &'static str, value: &str) -> Result<f64, ParseGenomeError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ParseGenomeError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

impl FromStr for Genome {
    type Err = ParseGenomeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        // A trailing delimiter is tolerated; anything else empty is not.
        let text = text.strip_suffix(';').unwrap_or(text);
        let mut records = text.split(';');

        let gains = records.next().ok_or(ParseGenomeError::Empty)?;
        if gains.trim().is_empty() {
            return Err(ParseGenomeError::Empty);
        }
        let fields: Vec<&str> = gains.split(',').collect();
        if fields.len() != 3 {
            return Err(ParseGenomeError::GainCount(fields.len()));
        }
        let kp = parse_float("kp", fields[0])?;
        let ki = parse_float("ki", fields[1])?;
        let kd = parse_float("kd", fields[2])?;

        let mut actions = Vec::new();
        for record in records {
            let fields: Vec<&str> = record.split(',').collect();
            if fields.len() != 2 {
                return Err(ParseGenomeError::ActionShape(record.to_string()));
            }
            let kind = match fields[0].trim() {
                "T" => ActionKind::Thrust,
                "D" => ActionKind::Drift,
                other => return Err(ParseGenomeError::UnknownKind(other.to_string())),
            };
            let duration = parse_float("duration", fields[1])?;
            actions.push(Action { kind, duration });
        }

        Ok(Genome { kp, ki, kd, actions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let genome = Genome {
            kp: 0.5,
            ki: 0.01,
            kd: 0.1,
            actions: vec![
                Action {
                    kind: ActionKind::Thrust,
                    duration: 2.0,
                },
                Action {
                    kind: ActionKind::Drift,
                    duration: 1.5,
                },
            ],
        };
        assert_eq!(genome.to_string(), "0.500,0.010,0.100;T,2.00;D,1.50;");
    }

    #[test]
    fn test_decode() {
        let genome: Genome = "0.500,0.010,0.100;T,2.00;D,1.50;".parse().unwrap();
        assert_eq!(genome.kp, 0.5);
        assert_eq!(genome.ki, 0.01);
        assert_eq!(genome.kd, 0.1);
        assert_eq!(genome.actions.len(), 2);
        assert_eq!(genome.actions[0].kind, ActionKind::Thrust);
        assert_eq!(genome.actions[1].duration, 1.5);
    }

    #[test]
    fn test_decode_without_trailing_delimiter() {
        let genome: Genome = "0.200,0.005,0.050;D,1.25".parse().unwrap();
        assert_eq!(genome.actions.len(), 1);
        assert_eq!(genome.actions[0].kind, ActionKind::Drift);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!("".parse::<Genome>().is_err());
        assert!("0.5,0.01;T,2.00;".parse::<Genome>().is_err());
        assert!("0.5,0.01,abc;T,2.00;".parse::<Genome>().is_err());
        assert!("0.5,0.01,0.1;X,2.00;".parse::<Genome>().is_err());
        assert!("0.5,0.01,0.1;T;".parse::<Genome>().is_err());
    }

    mod round_trip {
        use super::*;
        use proptest::prelude::*;

        fn action_strategy() -> impl Strategy<Value = Action> {
            (any::<bool>(), 1.0..2.5f64).prop_map(|(thrust, duration)| Action {
                kind: if thrust {
                    ActionKind::Thrust
                } else {
                    ActionKind::Drift
                },
                duration,
            })
        }

        fn genome_strategy() -> impl Strategy<Value = Genome> {
            (
                0.01..1.0f64,
                0.001..0.1f64,
                0.01..0.5f64,
                proptest::collection::vec(action_strategy(), 3..10),
            )
                .prop_map(|(kp, ki, kd, actions)| Genome { kp, ki, kd, actions })
        }

        proptest! {
            #[test]
            fn prop_round_trip_within_encoding_precision(genome in genome_strategy()) {
                let decoded: Genome = genome.to_string().parse().unwrap();
                prop_assert!((decoded.kp - genome.kp).abs() <= 6e-4);
                prop_assert!((decoded.ki - genome.ki).abs() <= 6e-4);
                prop_assert!((decoded.kd - genome.kd).abs() <= 6e-4);
                prop_assert_eq!(decoded.actions.len(), genome.actions.len());
                for (decoded, original) in decoded.actions.iter().zip(&genome.actions) {
                    prop_assert_eq!(decoded.kind, original.kind);
                    prop_assert!((decoded.duration - original.duration).abs() <= 6e-3);
                }
            }
        }
    }

    #[test]
    fn test_round_trip_precision() {
        let genome = Genome {
            kp: 0.123456,
            ki: 0.054321,
            kd: 0.333333,
            actions: vec![Action {
                kind: ActionKind::Thrust,
                duration: 1.987654,
            }],
        };
        let decoded: Genome = genome.to_string().parse().unwrap();
        assert!((decoded.kp - genome.kp).abs() <= 5e-4);
        assert!((decoded.ki - genome.ki).abs() <= 5e-4);
        assert!((decoded.kd - genome.kd).abs() <= 5e-4);
        assert_eq!(decoded.actions.len(), 1);
        assert!((decoded.actions[0].duration - genome.actions[0].duration).abs() <= 5e-3);
    }
}
