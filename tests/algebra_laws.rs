//! Algebraic laws of the polynomial kernel over randomized inputs.

use num_bigint::BigInt;
use num_traits::Zero;
use pacheck::poly::{Monomial, PolyBuilder, Polynomial};
use pacheck::term::{TermTable, VarList};
use pacheck::types::{Ring, VarId, VarOrder};
use pacheck::vars::Vars;
use pacheck::{Checker, Config};
use proptest::prelude::*;
use std::io::Cursor;

struct Ctx {
  vars: Vars,
  terms: TermTable,
  ring: Ring,
  ids: Vec<VarId>,
}

fn ctx(modulus: Option<u32>) -> Ctx {
  let mut vars = Vars::default();
  let ids = ["x", "y", "z"].iter().map(|n| vars.intern(n, true).unwrap()).collect();
  let mut ring = Ring::new(VarOrder::NameAsc);
  ring.modulus = modulus.map(BigInt::from);
  Ctx { vars, terms: TermTable::default(), ring, ids }
}

/// A monomial description: coefficient and which of the three variables
/// occur (multiplicity 1; the boolean default).
type Desc = Vec<(i64, [bool; 3])>;

fn build(cx: &mut Ctx, desc: &Desc) -> Polynomial {
  let mut b = PolyBuilder::default();
  for (coeff, occurs) in desc {
    let mut list = VarList::default();
    for (i, &on) in occurs.iter().enumerate() {
      if on {
        list.push(cx.ids[i], &cx.vars, &cx.ring);
      }
    }
    let term = list.build(&mut cx.terms);
    b.push(Monomial::make(BigInt::from(*coeff), term, &mut cx.terms, &cx.ring));
  }
  b.build(true, &mut cx.terms, &cx.vars, &cx.ring)
}

fn desc() -> impl Strategy<Value = Desc> {
  prop::collection::vec((-9i64..10, prop::array::uniform3(any::<bool>())), 0..6)
}

proptest! {
  #[test]
  fn addition_commutes(a in desc(), b in desc()) {
    let mut cx = ctx(None);
    let (p1, q1) = (build(&mut cx, &a), build(&mut cx, &b));
    let left = p1.add(q1, &mut cx.terms, &cx.vars, &cx.ring);
    let (p2, q2) = (build(&mut cx, &a), build(&mut cx, &b));
    let right = q2.add(p2, &mut cx.terms, &cx.vars, &cx.ring);
    prop_assert!(left.equal(&right));
    left.free(&mut cx.terms);
    right.free(&mut cx.terms);
    prop_assert_eq!(cx.terms.live, 0);
  }

  #[test]
  fn addition_associates(a in desc(), b in desc(), c in desc()) {
    let mut cx = ctx(None);
    let (pa, pb, pc) = (build(&mut cx, &a), build(&mut cx, &b), build(&mut cx, &c));
    let ab_c = pa.add(pb, &mut cx.terms, &cx.vars, &cx.ring).add(pc, &mut cx.terms, &cx.vars, &cx.ring);
    let (pa, pb, pc) = (build(&mut cx, &a), build(&mut cx, &b), build(&mut cx, &c));
    let bc = pb.add(pc, &mut cx.terms, &cx.vars, &cx.ring);
    let a_bc = pa.add(bc, &mut cx.terms, &cx.vars, &cx.ring);
    prop_assert!(ab_c.equal(&a_bc));
    ab_c.free(&mut cx.terms);
    a_bc.free(&mut cx.terms);
  }

  #[test]
  fn zero_is_additive_identity(a in desc()) {
    let mut cx = ctx(None);
    let p = build(&mut cx, &a);
    let q = build(&mut cx, &a);
    let sum = q.add(Polynomial::default(), &mut cx.terms, &cx.vars, &cx.ring);
    prop_assert!(sum.equal(&p));
    sum.free(&mut cx.terms);
    p.free(&mut cx.terms);
  }

  #[test]
  fn negation_cancels(a in desc()) {
    let mut cx = ctx(None);
    let p = build(&mut cx, &a);
    let mut n = p.copy(&mut cx.terms);
    n.negate(&cx.ring);
    let sum = p.add(n, &mut cx.terms, &cx.vars, &cx.ring);
    prop_assert!(sum.is_zero());
  }

  #[test]
  fn one_is_multiplicative_identity(a in desc()) {
    let mut cx = ctx(None);
    let p = build(&mut cx, &a);
    let one = build(&mut cx, &vec![(1, [false; 3])]);
    let prod = p.mul(&one, &mut cx.terms, &cx.vars, &cx.ring);
    prop_assert!(prod.equal(&p));
    let zero = Polynomial::default();
    let ann = p.mul(&zero, &mut cx.terms, &cx.vars, &cx.ring);
    prop_assert!(ann.is_zero());
  }

  #[test]
  fn multiplication_commutes(a in desc(), b in desc()) {
    let mut cx = ctx(None);
    let (p, q) = (build(&mut cx, &a), build(&mut cx, &b));
    let pq = p.mul(&q, &mut cx.terms, &cx.vars, &cx.ring);
    let qp = q.mul(&p, &mut cx.terms, &cx.vars, &cx.ring);
    prop_assert!(pq.equal(&qp));
  }

  #[test]
  fn modular_coefficients_are_always_canonical(a in desc(), b in desc()) {
    let mut cx = ctx(Some(7));
    let (p, q) = (build(&mut cx, &a), build(&mut cx, &b));
    let prod = p.mul(&q, &mut cx.terms, &cx.vars, &cx.ring);
    let m = BigInt::from(7);
    for poly in [&p, &q, &prod] {
      for mon in poly.mons() {
        prop_assert!(!mon.coeff.is_zero());
        prop_assert!(mon.coeff >= BigInt::zero() && mon.coeff < m);
      }
    }
  }

  #[test]
  fn print_then_parse_is_identity(a in desc()) {
    let mut ck = Checker::new(Config::default());
    let mut cx_vars = vec![];
    for name in ["x", "y", "z"] {
      cx_vars.push(ck.vars.intern(name, true).unwrap());
    }
    let mut b = PolyBuilder::default();
    for (coeff, occurs) in &a {
      let mut list = VarList::default();
      for (i, &on) in occurs.iter().enumerate() {
        if on {
          list.push(cx_vars[i], &ck.vars, &ck.ring);
        }
      }
      let term = list.build(&mut ck.terms);
      b.push(Monomial::make(BigInt::from(*coeff), term, &mut ck.terms, &ck.ring));
    }
    let p = b.build(true, &mut ck.terms, &ck.vars, &ck.ring);
    let printed = format!("1 {} ;\n", p.display(&ck.terms, &ck.vars));
    ck.check_axioms(Cursor::new(printed), "axioms").unwrap();
    let reparsed = &ck.store.lookup(1).unwrap().conclusion;
    prop_assert!(reparsed.equal(&p));
  }
}
