use crate::term::{TermTable, VarList};
use crate::types::{Ring, TermId, VarId};
use crate::vars::Vars;
use itertools::{EitherOrBoth, Itertools};
use num_bigint::{BigInt, Sign};
use num_traits::{One, Zero};

/// A coefficient paired with a power-product; the constant monomial has
/// no term. A zero coefficient is never stored: [`Monomial::make`]
/// returns `None` for it and the builder drops it.
#[derive(Debug)]
pub struct Monomial {
  pub coeff: BigInt,
  pub term: Option<TermId>,
}

impl Monomial {
  /// Normalizing constructor; takes over the caller's term reference and
  /// releases it when the reduced coefficient vanishes.
  pub fn make(
    coeff: BigInt, term: Option<TermId>, terms: &mut TermTable, ring: &Ring,
  ) -> Option<Monomial> {
    let coeff = ring.reduce(coeff);
    if coeff.is_zero() {
      terms.release(term);
      None
    } else {
      Some(Monomial { coeff, term })
    }
  }

  fn is_neg_one(&self) -> bool { self.coeff.sign() == Sign::Minus && self.coeff.magnitude().is_one() }
}

/// A polynomial is a sequence of monomials in strictly descending term
/// order (the constant last), with no duplicate terms and no zero
/// coefficients; the zero polynomial is the empty sequence. `level` tags
/// partial sums on the summation stack.
#[derive(Debug)]
pub struct Polynomial {
  mons: Vec<Monomial>,
  pub level: u32,
}

impl Default for Polynomial {
  fn default() -> Self { Polynomial { mons: vec![], level: 1 } }
}

impl Polynomial {
  pub fn is_zero(&self) -> bool { self.mons.is_empty() }

  pub fn len(&self) -> usize { self.mons.len() }

  pub fn is_empty(&self) -> bool { self.mons.is_empty() }

  pub fn leading(&self) -> Option<&Monomial> { self.mons.first() }

  pub fn mons(&self) -> &[Monomial] { &self.mons }

  pub fn is_constant_one(&self) -> bool {
    matches!(*self.mons, [ref m] if m.term.is_none() && m.coeff.is_one())
  }

  pub fn degree(&self, terms: &TermTable) -> u32 {
    self.mons.iter().map(|m| terms.size(m.term)).max().unwrap_or(0)
  }

  /// Release every term reference held by this polynomial.
  pub fn free(self, terms: &mut TermTable) {
    for m in self.mons {
      terms.release(m.term);
    }
  }

  pub fn copy(&self, terms: &mut TermTable) -> Polynomial {
    let mons = self
      .mons
      .iter()
      .map(|m| Monomial { coeff: m.coeff.clone(), term: terms.retain(m.term) })
      .collect();
    Polynomial { mons, level: 1 }
  }

  /// Structural equality over (term identity, coefficient), checked
  /// pairwise in stored order with the length compared up front.
  pub fn equal(&self, other: &Polynomial) -> bool {
    self.mons.len() == other.mons.len()
      && self
        .mons
        .iter()
        .zip(&other.mons)
        .all(|(a, b)| a.term == b.term && a.coeff == b.coeff)
  }

  pub fn negate(&mut self, ring: &Ring) {
    for m in &mut self.mons {
      m.coeff = ring.reduce(-std::mem::take(&mut m.coeff));
    }
  }

  /// Sum of two polynomials, consuming both. A parallel walk in
  /// descending term order; the output needs no re-sorting.
  pub fn add(self, other: Polynomial, terms: &mut TermTable, vars: &Vars, ring: &Ring) -> Polynomial {
    let mut out = Vec::with_capacity(self.mons.len() + other.mons.len());
    let mut dead = vec![];
    let merged = self
      .mons
      .into_iter()
      .merge_join_by(other.mons, |a, b| terms.cmp(b.term, a.term, vars, ring));
    for item in merged {
      match item {
        EitherOrBoth::Left(m) | EitherOrBoth::Right(m) => out.push(m),
        EitherOrBoth::Both(m1, m2) => {
          let coeff = ring.reduce(m1.coeff + m2.coeff);
          dead.extend(m2.term);
          if coeff.is_zero() {
            dead.extend(m1.term);
          } else {
            out.push(Monomial { coeff, term: m1.term });
          }
        }
      }
    }
    for t in dead {
      terms.release(Some(t));
    }
    Polynomial { mons: out, level: 1 }
  }

  /// Product by the naive double loop; term products reuse interned
  /// allocations, and the builder sorts and merges the result.
  pub fn mul(&self, other: &Polynomial, terms: &mut TermTable, vars: &Vars, ring: &Ring) -> Polynomial {
    let mut b = PolyBuilder::default();
    for m1 in &self.mons {
      for m2 in &other.mons {
        let coeff = &m1.coeff * &m2.coeff;
        let term = terms.multiply(m1.term, m2.term, vars, ring);
        b.push(Monomial::make(coeff, term, terms, ring));
      }
    }
    b.build(true, terms, vars, ring)
  }

  /// Apply the live branch assumptions, later assumptions shadowing
  /// earlier ones; assigned variables fold into the coefficient once per
  /// occurrence.
  pub fn substitute(
    &self, assign: &[(VarId, BigInt)], terms: &mut TermTable, vars: &Vars, ring: &Ring,
  ) -> Polynomial {
    let mut b = PolyBuilder::default();
    for m in &self.mons {
      let mut coeff = m.coeff.clone();
      let mut list = VarList::default();
      for v in terms.vars(m.term).collect::<Vec<_>>() {
        match assign.iter().rev().find(|(a, _)| *a == v) {
          Some((_, val)) => coeff = ring.reduce(coeff * val),
          None => list.push(v, vars, ring),
        }
      }
      let term = list.build(terms);
      b.push(Monomial::make(coeff, term, terms, ring));
    }
    b.build(true, terms, vars, ring)
  }

  pub fn is_univariate_in(&self, v: VarId, terms: &TermTable) -> bool {
    self.mons.iter().all(|m| terms.vars(m.term).all(|w| w == v))
  }

  /// Horner evaluation of a univariate polynomial at `x`. The monomials
  /// are already in descending degree order.
  pub fn eval_at(&self, x: &BigInt, terms: &TermTable, ring: &Ring) -> BigInt {
    let mut it = self.mons.iter();
    let Some(first) = it.next() else { return BigInt::zero() };
    let mut deg = terms.size(first.term);
    let mut acc = first.coeff.clone();
    for m in it {
      let d = terms.size(m.term);
      while deg > d {
        acc = ring.reduce(acc * x);
        deg -= 1;
      }
      acc = ring.reduce(acc + &m.coeff);
    }
    while deg > 0 {
      acc = ring.reduce(acc * x);
      deg -= 1;
    }
    acc
  }

  pub fn display<'a>(&'a self, terms: &'a TermTable, vars: &'a Vars) -> PolyDisplay<'a> {
    PolyDisplay { poly: self, terms, vars }
  }
}

/// Equality up to the live branch assumptions: structurally equal, or
/// equal after applying the substitution closure to both sides (only
/// meaningful under a modulus).
pub fn equal_mod_subst(
  a: &Polynomial, b: &Polynomial, assign: &[(VarId, BigInt)], terms: &mut TermTable, vars: &Vars,
  ring: &Ring,
) -> bool {
  if a.equal(b) {
    return true
  }
  if ring.boolean() || assign.is_empty() {
    return false
  }
  let sa = a.substitute(assign, terms, vars, ring);
  let sb = b.substitute(assign, terms, vars, ring);
  let eq = sa.equal(&sb);
  sa.free(terms);
  sb.free(terms);
  eq
}

/// Is `p` the constant 1, as-is or under the substitution closure?
pub fn is_one_mod_subst(
  p: &Polynomial, assign: &[(VarId, BigInt)], terms: &mut TermTable, vars: &Vars, ring: &Ring,
) -> bool {
  if p.is_constant_one() {
    return true
  }
  if ring.boolean() || assign.is_empty() {
    return false
  }
  let s = p.substitute(assign, terms, vars, ring);
  let one = s.is_constant_one();
  s.free(terms);
  one
}

/// Canonical print form: the leading monomial unsigned when positive,
/// every further monomial prefixed by its sign, coefficient 1 elided on
/// non-constant monomials and -1 printed as a bare minus.
pub struct PolyDisplay<'a> {
  poly: &'a Polynomial,
  terms: &'a TermTable,
  vars: &'a Vars,
}

impl std::fmt::Display for PolyDisplay<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.poly.mons.is_empty() {
      return write!(f, "0")
    }
    for (i, m) in self.poly.mons.iter().enumerate() {
      if i > 0 && m.coeff.sign() != Sign::Minus {
        write!(f, "+")?;
      }
      match m.term {
        Some(t) => {
          if m.is_neg_one() {
            write!(f, "-")?;
          } else if !m.coeff.is_one() {
            write!(f, "{}*", m.coeff)?;
          }
          let names = self.terms.vars(Some(t)).map(|v| self.vars.name(v));
          write!(f, "{}", names.format("*"))?;
        }
        None => write!(f, "{}", m.coeff)?,
      }
    }
    Ok(())
  }
}

/// Scratch stack assembling a polynomial: producers push monomials in
/// any order, `build` sorts (when asked), merges equal terms and drops
/// vanished coefficients.
#[derive(Default)]
pub struct PolyBuilder {
  mons: Vec<Monomial>,
}

impl PolyBuilder {
  pub fn push(&mut self, m: Option<Monomial>) {
    if let Some(m) = m {
      self.mons.push(m)
    }
  }

  pub fn build(self, need_sort: bool, terms: &mut TermTable, vars: &Vars, ring: &Ring) -> Polynomial {
    let mut mons = self.mons;
    if need_sort {
      mons.sort_by(|a, b| terms.cmp(b.term, a.term, vars, ring));
    }
    let mut out: Vec<Monomial> = Vec::with_capacity(mons.len());
    let mut dead = vec![];
    for m in mons {
      match out.last_mut() {
        Some(last) if last.term == m.term => {
          last.coeff = ring.reduce(std::mem::take(&mut last.coeff) + m.coeff);
          dead.extend(m.term);
          if last.coeff.is_zero() {
            dead.extend(out.pop().and_then(|gone| gone.term));
          }
        }
        _ => out.push(m),
      }
    }
    for t in dead {
      terms.release(Some(t));
    }
    Polynomial { mons: out, level: 1 }
  }
}

/// Stack of level-tagged partial sums. Each summand enters at level 1;
/// whenever the two topmost entries share a level they merge one level
/// up, which keeps the addition tree balanced when summand sizes differ
/// sharply.
#[derive(Default)]
pub struct SumStack {
  stack: Vec<Polynomial>,
}

impl SumStack {
  pub fn push(&mut self, mut p: Polynomial, terms: &mut TermTable, vars: &Vars, ring: &Ring) {
    p.level = 1;
    self.stack.push(p);
    while self.stack.len() > 1 {
      let n = self.stack.len();
      if self.stack[n - 1].level != self.stack[n - 2].level {
        break
      }
      let p = self.stack.pop().expect("stack has two entries");
      let q = self.stack.pop().expect("stack has two entries");
      let level = p.level;
      let mut sum = p.add(q, terms, vars, ring);
      sum.level = level + 1;
      self.stack.push(sum);
    }
  }

  pub fn fold(mut self, terms: &mut TermTable, vars: &Vars, ring: &Ring) -> Polynomial {
    let mut res = self.stack.pop().unwrap_or_default();
    while let Some(q) = self.stack.pop() {
      res = res.add(q, terms, vars, ring);
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::VarOrder;

  struct Ctx {
    vars: Vars,
    terms: TermTable,
    ring: Ring,
  }

  fn setup() -> Ctx {
    let mut vars = Vars::default();
    for name in ["x", "y", "z"] {
      vars.intern(name, true).unwrap();
    }
    Ctx { vars, terms: TermTable::default(), ring: Ring::new(VarOrder::NameAsc) }
  }

  impl Ctx {
    fn var(&self, name: &str) -> VarId {
      (0..self.vars.len() as u32).map(VarId).find(|&v| self.vars.name(v) == name).unwrap()
    }

    fn term(&mut self, names: &[&str]) -> Option<TermId> {
      let mut list = VarList::default();
      for name in names {
        let v = self.var(name);
        list.push(v, &self.vars, &self.ring);
      }
      list.build(&mut self.terms)
    }

    fn poly(&mut self, mons: &[(i64, &[&str])]) -> Polynomial {
      let mut b = PolyBuilder::default();
      for &(c, names) in mons {
        let term = self.term(names);
        b.push(Monomial::make(BigInt::from(c), term, &mut self.terms, &self.ring));
      }
      b.build(true, &mut self.terms, &self.vars, &self.ring)
    }

    fn show(&self, p: &Polynomial) -> String {
      p.display(&self.terms, &self.vars).to_string()
    }
  }

  #[test]
  fn builder_sorts_merges_and_drops_zeros() {
    let mut cx = setup();
    let p = cx.poly(&[(1, &["x"]), (3, &["x", "y"]), (2, &["x"]), (-3, &["x", "y"]), (7, &[])]);
    assert_eq!(cx.show(&p), "3*x+7");
    p.free(&mut cx.terms);
    assert_eq!(cx.terms.live, 0);
  }

  #[test]
  fn zero_polynomial_prints_zero() {
    let mut cx = setup();
    let p = cx.poly(&[]);
    assert!(p.is_zero());
    assert_eq!(cx.show(&p), "0");
  }

  #[test]
  fn constant_and_signs_print_canonically() {
    let mut cx = setup();
    let p = cx.poly(&[(17, &[])]);
    assert_eq!(cx.show(&p), "17");
    p.free(&mut cx.terms);
    let q = cx.poly(&[(-1, &["x", "y"]), (1, &["y"]), (-4, &[])]);
    assert_eq!(cx.show(&q), "-y*x+y-4");
    q.free(&mut cx.terms);
  }

  #[test]
  fn add_zero_is_identity_and_negation_cancels() {
    let mut cx = setup();
    let p = cx.poly(&[(2, &["x", "y"]), (-1, &["y"]), (5, &[])]);
    let zero = cx.poly(&[]);
    let p2 = cx.poly(&[(2, &["x", "y"]), (-1, &["y"]), (5, &[])]);
    let sum = p2.add(zero, &mut cx.terms, &cx.vars, &cx.ring);
    assert!(sum.equal(&p));
    let mut neg = p.copy(&mut cx.terms);
    neg.negate(&cx.ring);
    let cancel = sum.add(neg, &mut cx.terms, &cx.vars, &cx.ring);
    assert!(cancel.is_zero());
    cancel.free(&mut cx.terms);
    p.free(&mut cx.terms);
    assert_eq!(cx.terms.live, 0);
  }

  #[test]
  fn mul_by_one_and_zero() {
    let mut cx = setup();
    let p = cx.poly(&[(3, &["x"]), (1, &[])]);
    let one = cx.poly(&[(1, &[])]);
    let zero = cx.poly(&[]);
    let q = p.mul(&one, &mut cx.terms, &cx.vars, &cx.ring);
    assert!(q.equal(&p));
    let r = p.mul(&zero, &mut cx.terms, &cx.vars, &cx.ring);
    assert!(r.is_zero());
    for p in [p, one, zero, q, r] {
      p.free(&mut cx.terms);
    }
    assert_eq!(cx.terms.live, 0);
  }

  #[test]
  fn boolean_product_is_idempotent_on_squarefree_terms() {
    let mut cx = setup();
    let p = cx.poly(&[(1, &["x", "y"])]);
    let sq = p.mul(&p, &mut cx.terms, &cx.vars, &cx.ring);
    assert!(sq.equal(&p));
    sq.free(&mut cx.terms);
    p.free(&mut cx.terms);
  }

  #[test]
  fn modular_coefficients_stay_reduced() {
    let mut cx = setup();
    cx.ring.modulus = Some(BigInt::from(7));
    let p = cx.poly(&[(9, &["x"]), (-1, &[])]);
    assert_eq!(cx.show(&p), "2*x+6");
    let q = p.mul(&p, &mut cx.terms, &cx.vars, &cx.ring);
    // (2x+6)^2 = 4x^2 + 24x + 36 = 4x^2 + 3x + 1 mod 7
    assert_eq!(cx.show(&q), "4*x*x+3*x+1");
    q.free(&mut cx.terms);
    p.free(&mut cx.terms);
    assert_eq!(cx.terms.live, 0);
  }

  #[test]
  fn horner_evaluation_mod_m() {
    let mut cx = setup();
    cx.ring.modulus = Some(BigInt::from(7));
    // x^2 - 1 = x^2 + 6 mod 7; roots are 1 and 6
    let p = cx.poly(&[(1, &["x", "x"]), (6, &[])]);
    assert!(p.eval_at(&BigInt::from(1), &cx.terms, &cx.ring).is_zero());
    assert!(p.eval_at(&BigInt::from(6), &cx.terms, &cx.ring).is_zero());
    assert_eq!(p.eval_at(&BigInt::from(2), &cx.terms, &cx.ring), BigInt::from(3));
    p.free(&mut cx.terms);
  }

  #[test]
  fn substitution_folds_assigned_variables() {
    let mut cx = setup();
    cx.ring.modulus = Some(BigInt::from(7));
    let x = cx.var("x");
    // x^2*y + 3x + 5 at x = 2: 4y + 6 + 5 = 4y + 4 mod 7
    let p = cx.poly(&[(1, &["x", "x", "y"]), (3, &["x"]), (5, &[])]);
    let s = p.substitute(&[(x, BigInt::from(2))], &mut cx.terms, &cx.vars, &cx.ring);
    assert_eq!(cx.show(&s), "4*y+4");
    s.free(&mut cx.terms);
    p.free(&mut cx.terms);
    assert_eq!(cx.terms.live, 0);
  }

  #[test]
  fn summation_stack_balances_and_folds() {
    let mut cx = setup();
    let mut sum = SumStack::default();
    for i in 1..=5i64 {
      let p = cx.poly(&[(i, &["x"])]);
      sum.push(p, &mut cx.terms, &cx.vars, &cx.ring);
    }
    let total = sum.fold(&mut cx.terms, &cx.vars, &cx.ring);
    assert_eq!(cx.show(&total), "15*x");
    total.free(&mut cx.terms);
    assert_eq!(cx.terms.live, 0);
  }
}
