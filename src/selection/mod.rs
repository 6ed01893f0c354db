//! A small textual selection language for picking atoms, bonded pairs,
//! angles, dihedrals, and impropers out of a frame.
//!
//! The grammar is infix: `<expr> and <expr>`, `<expr> or <expr>`, with `not`
//! as the one prefix operator. Precedence, low to high, is `or`, `and`,
//! `not`, then a comparison or parenthesized atom:
//!
//! ```text
//! resname == "ALA" and (mass > 12.0 or is_bonded(i, j))
//! ```
//!
//! A selection declares an arity (1 for single atoms, up to 4 for
//! dihedrals/impropers). Evaluating it walks the Cartesian product of atom
//! indices of that arity and keeps the tuples the predicate accepts,
//! returning them sorted and deduplicated.

mod ast;
mod eval;
mod lexer;
mod parser;

use crate::error::{Error, Result};
use crate::model::Frame;
use ast::Expr;

/// A compiled selection, ready to evaluate against any frame with a
/// matching atom count.
#[derive(Debug, Clone)]
pub struct Selection {
    expr: Expr,
    arity: usize,
}

impl Selection {
    /// Compile `text` for tuples of `arity` atom indices. Fails if the text
    /// cannot be parsed, or if it names a topology predicate (`is_bonded`,
    /// `is_angle`, ...) that needs more slots than `arity` provides.
    pub fn compile(text: &str, arity: usize) -> Result<Self> {
        if arity == 0 || arity > 4 {
            return Err(Error::configuration(format!("selection arity must be 1..=4, got {arity}")));
        }
        let expr = parser::parse(text)?;
        let needed = expr.min_arity();
        if needed > arity {
            return Err(Error::selection(
                0,
                format!("selection needs at least {needed} tuple slots, but arity is {arity}"),
            ));
        }
        Ok(Selection { expr, arity })
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Evaluate every tuple of `arity` atom indices against `frame`,
    /// returning the accepted tuples sorted and deduplicated. Worst case is
    /// O(n^arity) in the atom count.
    pub fn evaluate(&self, frame: &mut Frame) -> Result<Vec<Vec<usize>>> {
        let n = frame.size();
        let mut tuple = vec![0usize; self.arity];
        let mut matches = Vec::new();
        evaluate_slot(&self.expr, frame, &mut tuple, 0, n, &mut matches)?;
        matches.sort();
        matches.dedup();
        Ok(matches)
    }

    /// Convenience for arity-1 selections: the accepted atom indices.
    pub fn select_atoms(&self, frame: &mut Frame) -> Result<Vec<usize>> {
        if self.arity != 1 {
            return Err(Error::configuration("select_atoms requires an arity-1 selection"));
        }
        Ok(self.evaluate(frame)?.into_iter().map(|t| t[0]).collect())
    }
}

fn evaluate_slot(
    expr: &Expr,
    frame: &mut Frame,
    tuple: &mut [usize],
    slot: usize,
    n: usize,
    matches: &mut Vec<Vec<usize>>,
) -> Result<()> {
    if slot == tuple.len() {
        if eval::evaluate(expr, frame, tuple)? {
            matches.push(tuple.to_vec());
        }
        return Ok(());
    }
    for i in 0..n {
        tuple[slot] = i;
        evaluate_slot(expr, frame, tuple, slot + 1, n, matches)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Atom, Topology};
    use crate::primitives::Vector3D;

    fn water() -> Frame {
        let mut frame = Frame::new();
        frame.add_atom(Atom::from_element("O"), Vector3D::new(0.0, 0.0, 0.0), None);
        frame.add_atom(Atom::from_element("H"), Vector3D::new(0.96, 0.0, 0.0), None);
        frame.add_atom(Atom::from_element("H"), Vector3D::new(-0.24, 0.93, 0.0), None);
        let mut topology = Topology::new();
        topology.add_atom(Atom::from_element("O"));
        topology.add_atom(Atom::from_element("H"));
        topology.add_atom(Atom::from_element("H"));
        topology.add_bond(0, 1).unwrap();
        topology.add_bond(0, 2).unwrap();
        frame.set_topology(topology).unwrap();
        frame
    }

    #[test]
    fn selects_atoms_by_name() {
        let mut frame = water();
        let selection = Selection::compile("name == O", 1).unwrap();
        assert_eq!(selection.select_atoms(&mut frame).unwrap(), vec![0]);
    }

    #[test]
    fn selects_atoms_by_numeric_and_boolean_combinators() {
        let mut frame = water();
        let selection = Selection::compile("mass > 10.0 or index == 1", 1).unwrap();
        assert_eq!(selection.select_atoms(&mut frame).unwrap(), vec![0, 1]);
    }

    #[test]
    fn not_excludes_a_single_atom() {
        let mut frame = water();
        let selection = Selection::compile("not index == 0", 1).unwrap();
        assert_eq!(selection.select_atoms(&mut frame).unwrap(), vec![1, 2]);
    }

    #[test]
    fn is_bonded_pairs_are_symmetric_and_deduplicated() {
        let mut frame = water();
        let selection = Selection::compile("is_bonded(i, j)", 2).unwrap();
        let pairs = selection.evaluate(&mut frame).unwrap();
        assert!(pairs.contains(&vec![0, 1]));
        assert!(pairs.contains(&vec![1, 0]));
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn is_angle_requires_arity_three() {
        assert!(Selection::compile("is_angle(i, j, k)", 2).is_err());
        let selection = Selection::compile("is_angle(i, j, k)", 3).unwrap();
        let mut frame = water();
        let angles = selection.evaluate(&mut frame).unwrap();
        assert!(angles.contains(&vec![1, 0, 2]) || angles.contains(&vec![2, 0, 1]));
    }

    #[test]
    fn all_and_none_constants() {
        let mut frame = water();
        assert_eq!(Selection::compile("all", 1).unwrap().select_atoms(&mut frame).unwrap().len(), 3);
        assert_eq!(Selection::compile("none", 1).unwrap().select_atoms(&mut frame).unwrap().len(), 0);
    }
}
