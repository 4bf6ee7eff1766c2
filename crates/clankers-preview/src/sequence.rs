//! Preview-sequence description files.
//!
//! A sequence file holds an initial reduced state and a phase plan:
//!
//! ```toml
//! [preview_sequence.state]
//! com_pos = [0.0, 0.0, 0.5]
//! com_vel = [0.0, 0.0, 0.0]
//! cop     = [0.0, 0.0, 0.0]
//!
//! [preview_sequence.preview_control]
//! number_phase = 1
//!
//! [preview_sequence.preview_control.phase_0]
//! duration  = 0.5
//! cop_shift = [0.0, 0.0]
//! head_acc  = 0.0
//! FL        = [0.1, 0.0]
//! ```
//!
//! A phase with `cop_shift` is a stance phase and must also give `head_acc`.
//! A phase without it is a flight phase. Any other key must be a foot name
//! and gives the planar foothold shift of that swinging foot.
//!
//! `time`, `angular_pos` and `angular_vel` may also appear in the state
//! table and default to zero.

use std::path::Path;

use clankers_core::error::SequenceError;
use nalgebra::{Vector2, Vector3};
use toml::{Table, Value};

use crate::foot::FootSet;
use crate::types::{Phase, PreviewControl, PreviewParams, ReducedBodyState};

/// Initial state and phase plan read from a sequence file.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewSequence {
    pub state: ReducedBodyState,
    pub control: PreviewControl,
}

/// Read a sequence file from disk.
///
/// # Errors
///
/// I/O and TOML failures, plus every error of [`parse_preview_sequence`].
pub fn read_preview_sequence(
    path: impl AsRef<Path>,
    feet: &FootSet,
) -> Result<PreviewSequence, SequenceError> {
    let text = std::fs::read_to_string(path)?;
    parse_preview_sequence(&text, feet)
}

/// Parse a sequence description. Foot keys are resolved through `feet`.
///
/// # Errors
///
/// [`SequenceError::MissingField`] and [`SequenceError::InvalidField`] name
/// the offending field and phase; [`SequenceError::UnknownFoot`] reports
/// phase keys that are not foot names.
pub fn parse_preview_sequence(text: &str, feet: &FootSet) -> Result<PreviewSequence, SequenceError> {
    let root: Table = toml::from_str(text)?;
    let sequence = table(&root, "preview_sequence", None)?;

    let state = parse_state(table(sequence, "state", None)?)?;

    let control_table = table(sequence, "preview_control", None)?;
    let number_phase = parse_phase_count(required(control_table, "number_phase", None)?)?;

    let mut params = Vec::with_capacity(number_phase);
    for k in 0..number_phase {
        let phase_table = table(control_table, &format!("phase_{k}"), None)?;
        params.push(parse_phase(phase_table, k, feet)?);
    }

    Ok(PreviewSequence {
        state,
        control: PreviewControl::new(params),
    })
}

fn parse_state(state: &Table) -> Result<ReducedBodyState, SequenceError> {
    let com_pos = vector3(required(state, "com_pos", None)?, "com_pos", None)?;
    let com_vel = vector3(required(state, "com_vel", None)?, "com_vel", None)?;
    let cop = vector3(required(state, "cop", None)?, "cop", None)?;

    let time = state
        .get("time")
        .map(|v| number(v, "time", None))
        .transpose()?
        .unwrap_or(0.0);
    let angular_pos = optional_vector3(state, "angular_pos")?;
    let angular_vel = optional_vector3(state, "angular_vel")?;

    Ok(ReducedBodyState {
        time,
        com_pos,
        com_vel,
        angular_pos,
        angular_vel,
        cop,
        ..ReducedBodyState::default()
    })
}

fn parse_phase_count(value: &Value) -> Result<usize, SequenceError> {
    let invalid = |message: &str| SequenceError::InvalidField {
        field: "number_phase".into(),
        phase: None,
        message: message.into(),
    };
    let count = value
        .as_integer()
        .ok_or_else(|| invalid("expected an integer"))?;
    match usize::try_from(count) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid("must be >= 1")),
    }
}

fn parse_phase(phase_table: &Table, k: usize, feet: &FootSet) -> Result<PreviewParams, SequenceError> {
    let phase = Some(k);

    let duration = number(required(phase_table, "duration", phase)?, "duration", phase)?;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(SequenceError::InvalidField {
            field: "duration".into(),
            phase,
            message: format!("{duration} is not a positive duration"),
        });
    }

    // A CoP shift decides the phase type once, here.
    let mut parsed = match phase_table.get("cop_shift") {
        Some(shift) => {
            let cop_shift = vector2(shift, "cop_shift", phase)?;
            let head_acc = number(required(phase_table, "head_acc", phase)?, "head_acc", phase)?;
            Phase::stance(cop_shift, head_acc)
        }
        None => Phase::flight(),
    };

    for (key, value) in phase_table {
        if matches!(key.as_str(), "duration" | "cop_shift" | "head_acc") {
            continue;
        }
        let foot = feet.id(key).ok_or_else(|| SequenceError::UnknownFoot {
            phase: k,
            name: key.clone(),
        })?;
        parsed.set_swing_foot(foot, vector2(value, key, phase)?);
    }

    Ok(PreviewParams::new(duration, parsed))
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn table<'a>(parent: &'a Table, key: &str, phase: Option<usize>) -> Result<&'a Table, SequenceError> {
    match parent.get(key) {
        Some(Value::Table(t)) => Ok(t),
        Some(_) => Err(SequenceError::InvalidField {
            field: key.into(),
            phase,
            message: "expected a table".into(),
        }),
        None => Err(SequenceError::MissingField {
            field: key.into(),
            phase,
        }),
    }
}

fn required<'a>(parent: &'a Table, key: &str, phase: Option<usize>) -> Result<&'a Value, SequenceError> {
    parent.get(key).ok_or_else(|| SequenceError::MissingField {
        field: key.into(),
        phase,
    })
}

#[allow(clippy::cast_precision_loss)]
fn number(value: &Value, field: &str, phase: Option<usize>) -> Result<f64, SequenceError> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        other => Err(SequenceError::InvalidField {
            field: field.into(),
            phase,
            message: format!("expected a number, found {}", other.type_str()),
        }),
    }
}

fn components<const N: usize>(
    value: &Value,
    field: &str,
    phase: Option<usize>,
) -> Result<[f64; N], SequenceError> {
    let items = value.as_array().ok_or_else(|| SequenceError::InvalidField {
        field: field.into(),
        phase,
        message: format!("expected an array of {N} numbers"),
    })?;
    if items.len() != N {
        return Err(SequenceError::InvalidField {
            field: field.into(),
            phase,
            message: format!("expected {N} components, found {}", items.len()),
        });
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = number(item, field, phase)?;
    }
    Ok(out)
}

fn vector2(value: &Value, field: &str, phase: Option<usize>) -> Result<Vector2<f64>, SequenceError> {
    components::<2>(value, field, phase).map(Vector2::from)
}

fn vector3(value: &Value, field: &str, phase: Option<usize>) -> Result<Vector3<f64>, SequenceError> {
    components::<3>(value, field, phase).map(Vector3::from)
}

fn optional_vector3(parent: &Table, key: &str) -> Result<Vector3<f64>, SequenceError> {
    parent
        .get(key)
        .map_or(Ok(Vector3::zeros()), |v| vector3(v, key, None))
}
