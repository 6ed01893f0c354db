//! Evaluation of a compiled selection AST against a frame, one tuple of
//! atom indices at a time.

use super::ast::{Cmp, Expr, NumericField, Predicate, StringField};
use crate::error::{Error, Result};
use crate::model::Frame;

pub(crate) fn evaluate(expr: &Expr, frame: &mut Frame, tuple: &[usize]) -> Result<bool> {
    match expr {
        Expr::And(a, b) => Ok(evaluate(a, frame, tuple)? && evaluate(b, frame, tuple)?),
        Expr::Or(a, b) => Ok(evaluate(a, frame, tuple)? || evaluate(b, frame, tuple)?),
        Expr::Not(a) => Ok(!evaluate(a, frame, tuple)?),
        Expr::Predicate(p) => evaluate_predicate(p, frame, tuple),
    }
}

fn compare(op: Cmp, lhs: f64, rhs: f64) -> bool {
    match op {
        Cmp::Eq => lhs == rhs,
        Cmp::Ne => lhs != rhs,
        Cmp::Lt => lhs < rhs,
        Cmp::Le => lhs <= rhs,
        Cmp::Gt => lhs > rhs,
        Cmp::Ge => lhs >= rhs,
    }
}

fn compare_str(op: Cmp, lhs: &str, rhs: &str) -> bool {
    match op {
        Cmp::Eq => lhs == rhs,
        Cmp::Ne => lhs != rhs,
        _ => false,
    }
}

fn evaluate_predicate(predicate: &Predicate, frame: &mut Frame, tuple: &[usize]) -> Result<bool> {
    match predicate {
        Predicate::All => Ok(true),
        Predicate::None => Ok(false),
        Predicate::StringField { field, op, value } => {
            let i = tuple[0];
            let actual = match field {
                StringField::Name => frame
                    .topology()
                    .atom(i)
                    .map(|a| a.name.clone())
                    .ok_or_else(|| Error::selection(0, format!("no such atom: {i}")))?,
                StringField::Type => frame
                    .topology()
                    .atom(i)
                    .map(|a| a.r#type.clone())
                    .ok_or_else(|| Error::selection(0, format!("no such atom: {i}")))?,
                StringField::ResName => frame
                    .topology()
                    .residue_for_atom(i)
                    .map(|r| r.name.clone())
                    .unwrap_or_default(),
            };
            Ok(compare_str(*op, &actual, value))
        }
        Predicate::NumericField { field, op, value } => {
            let i = tuple[0];
            let actual = match field {
                NumericField::Index => i as f64,
                NumericField::Mass => frame
                    .topology()
                    .atom(i)
                    .map(|a| a.mass)
                    .ok_or_else(|| Error::selection(0, format!("no such atom: {i}")))?,
                NumericField::X => frame.positions()[i].x(),
                NumericField::Y => frame.positions()[i].y(),
                NumericField::Z => frame.positions()[i].z(),
                NumericField::Vx => velocity_component(frame, i, 0)?,
                NumericField::Vy => velocity_component(frame, i, 1)?,
                NumericField::Vz => velocity_component(frame, i, 2)?,
                NumericField::Resid => frame
                    .topology()
                    .residue_for_atom(i)
                    .and_then(|r| r.id)
                    .map(|id| id as f64)
                    .unwrap_or(-1.0),
            };
            Ok(compare(*op, actual, *value))
        }
        Predicate::IsBonded => Ok(frame.topology().is_bonded(tuple[0], tuple[1])),
        Predicate::IsAngle => Ok(frame.topology_mut().is_angle(tuple[0], tuple[1], tuple[2])),
        Predicate::IsDihedral => Ok(frame
            .topology_mut()
            .is_dihedral(tuple[0], tuple[1], tuple[2], tuple[3])),
        Predicate::IsImproper => Ok(frame
            .topology_mut()
            .is_improper(tuple[0], [tuple[1], tuple[2], tuple[3]])),
    }
}

fn velocity_component(frame: &Frame, atom: usize, axis: usize) -> Result<f64> {
    let velocities = frame
        .velocities()
        .ok_or_else(|| Error::selection(0, "frame has no velocities"))?;
    let v = &velocities[atom];
    Ok(match axis {
        0 => v.x(),
        1 => v.y(),
        _ => v.z(),
    })
}
