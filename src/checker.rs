use crate::error::{PacError, Result};
use crate::lexer::Tok;
use crate::msg;
use crate::parser::Parser;
use crate::poly::{equal_mod_subst, is_one_mod_subst, Polynomial, SumStack};
use crate::stats::Rule;
use crate::Checker;
use num_bigint::BigInt;
use std::io::BufRead;

impl Checker {
  pub(crate) fn render(&self, p: &Polynomial) -> String {
    p.display(&self.terms, &self.vars).to_string()
  }

  /// Store a checked conclusion and record its shape.
  pub(crate) fn store_conclusion(&mut self, id: u64, p: Polynomial) {
    self.stats.record_conclusion(p.degree(&self.terms), p.len());
    self.store.insert(id, p);
  }

  fn conclusion_matches_target(&mut self, p: &Polynomial) -> bool {
    if !self.cfg.check_target {
      return false
    }
    let Some(target) = self.target.take() else { return false };
    let hit =
      equal_mod_subst(p, &target, &self.assumptions, &mut self.terms, &self.vars, &self.ring);
    self.target = Some(target);
    hit
  }

  /// A linear combination concluded in the constant 1. In the boolean
  /// ring that is a refutation outright; under a modulus it discharges
  /// the current branch assumptions instead, and the proof is refuted
  /// only once every declared root has been closed.
  fn derived_one(&mut self) {
    if self.ring.boolean() {
      self.refutation = true;
      return
    }
    while let Some((v, val)) = self.assumptions.pop() {
      if let Some(set) = self.roots.get_mut(&v) {
        if let Some(i) = set.iter().position(|r| *r == val) {
          set.remove(i);
        }
        if !set.is_empty() {
          return
        }
      }
    }
    if self.roots.values().all(|set| set.is_empty()) {
      self.refutation = true
    }
  }
}

impl<R: BufRead> Parser<'_, R> {
  fn duplicate(&self, line: u32, id: u64) -> PacError {
    PacError::DuplicateIndex { file: self.lx.file().to_owned(), line, id }
  }

  fn not_found(&self, line: u32, id: u64, missing: u64) -> PacError {
    PacError::PolynomialNotFound {
      file: self.lx.file().to_owned(),
      line,
      id,
      missing,
      hint: if self.ck.cfg.delete_mode { "\ndelete mode is ON - try '--no-delete'" } else { "" },
    }
  }

  fn mismatch(
    &self, line: u32, poly_line: u32, id: u64, actual: &Polynomial, expected: &Polynomial,
  ) -> PacError {
    PacError::Mismatch {
      file: self.lx.file().to_owned(),
      line,
      id,
      at: if poly_line != line { format!(" line {poly_line}") } else { String::new() },
      actual: self.ck.render(actual),
      expected: self.ck.render(expected),
    }
  }

  /// Target file: one polynomial, `;`, end of file.
  pub(crate) fn run_target(&mut self) -> Result<u64> {
    let p = self.parse_polynomial(true)?;
    self.expect(Tok::Semicolon)?;
    if self.next()? != Tok::Eof {
      return Err(self.lx.error(format!("unexpected {} token", self.lx.tok().describe())))
    }
    self.ck.target = Some(p);
    Ok(self.lx.charno)
  }

  /// Axioms file: `<id> <polynomial> ;` entries, plus an optional
  /// leading `m <number> ;`.
  pub(crate) fn run_axioms(&mut self) -> Result<(u64, u64)> {
    let mut original = 0u64;
    loop {
      self.next()?;
      match self.lx.tok() {
        Tok::Eof => break,
        Tok::Variable if self.lx.lexeme() == "m" => {
          self.rule_modulus()?;
          continue
        }
        _ => {}
      }
      let line = self.lx.token_line;
      let id = self.parse_index()?;
      if self.ck.store.contains(id) {
        return Err(self.duplicate(line, id))
      }
      let p = self.parse_polynomial(true)?;
      self.expect(Tok::Semicolon)?;
      self.finish_axiom(id, p);
      original += 1;
    }
    Ok((original, self.lx.charno))
  }

  /// Proof file: the full rule stream.
  pub(crate) fn run_proof(&mut self) -> Result<(u64, u64)> {
    let mut checked = 0u64;
    loop {
      self.next()?;
      match self.lx.tok() {
        Tok::Eof => break,
        Tok::Number => {
          let line = self.lx.token_line;
          let id = self.parse_index()?;
          self.next()?;
          match self.lx.tok() {
            Tok::Equals => {
              self.rule_extension(id, line)?;
              checked += 1;
            }
            Tok::Percent => {
              self.rule_lincomb(id, line)?;
              checked += 1;
              if self.ck.cfg.verbose && checked % 1000 == 0 {
                msg!("found and checked {checked:6} inferences so far");
              }
            }
            Tok::Variable if self.lx.lexeme() == "d" => self.rule_delete(id)?,
            Tok::Variable if self.lx.lexeme() == "a" => {
              self.rule_axiom(id, line)?;
              checked += 1;
            }
            Tok::Variable if self.lx.lexeme() == "r" => {
              self.rule_roots(id, line)?;
              checked += 1;
            }
            _ => return Err(self.lx.error("expected operator 'd', 'a', 'r', '=' or '%'")),
          }
        }
        Tok::Variable if self.lx.lexeme() == "m" => self.rule_modulus()?,
        Tok::Variable if self.lx.lexeme() == "b" => self.rule_branch()?,
        Tok::Variable
          if matches!(self.lx.lexeme(), "pattern_new" | "pattern_apply" | "pattern_delete") =>
        {
          self.rule_pattern()?
        }
        _ => return Err(self.lx.error("expected an inference rule")),
      }
    }
    Ok((checked, self.lx.charno))
  }

  /// Shared tail of file axioms and in-band `a` axioms: store the
  /// polynomial and warn when it already equals the target.
  fn finish_axiom(&mut self, id: u64, p: Polynomial) {
    if self.ck.conclusion_matches_target(&p) {
      println!();
      msg!("WARNING: target polynomial is given as original polynomial.");
      msg!("Proof rules are obsolete, but will be checked anyway!");
      println!();
      self.ck.target_reached = true;
    }
    self.ck.axioms_seen = true;
    self.ck.store_conclusion(id, p);
    self.ck.stats.count(Rule::Axiom);
  }

  /// `<id> a <polynomial> ;` — an axiom streamed inside the proof.
  fn rule_axiom(&mut self, id: u64, line: u32) -> Result<()> {
    if self.ck.store.contains(id) {
      return Err(self.duplicate(line, id))
    }
    let p = self.parse_polynomial(true)?;
    self.expect(Tok::Semicolon)?;
    self.finish_axiom(id, p);
    Ok(())
  }

  /// `<id> d ;` — deletion; a dead id warns and the rule is skipped
  /// entirely under `--no-delete`.
  fn rule_delete(&mut self, id: u64) -> Result<()> {
    self.ck.stats.count(Rule::Deletion);
    if self.ck.cfg.delete_mode {
      match self.ck.store.remove(id) {
        Some(p) => p.free(&mut self.ck.terms),
        None => {
          println!();
          msg!("WARNING: cannot delete inference with index {id}");
          msg!("         inference {id} does not exist");
          println!();
        }
      }
    }
    self.next()?;
    self.expect(Tok::Semicolon)
  }

  /// `<id> = <v-poly> , <def-poly> ;` — extension. The fresh variable
  /// must be a single coefficient-1 variable never seen before, the
  /// definition may not mention it, and `def·def = def` must hold; the
  /// stored conclusion is `def - v`.
  fn rule_extension(&mut self, id: u64, line: u32) -> Result<()> {
    let file = self.lx.file().to_owned();
    if self.ck.store.contains(id) {
      return Err(self.duplicate(line, id))
    }
    if !self.ck.ring.boolean() {
      return Err(PacError::ExtensionNeedsBooleanRing { file, line, id })
    }
    let p1 = self.parse_polynomial(true)?;
    let ext = match (p1.mons(), p1.leading().and_then(|m| m.term)) {
      ([m], Some(t))
        if m.coeff == BigInt::from(1)
          && self.ck.terms.rest(t).is_none()
          && self.ck.vars.get(self.ck.terms.var(t)).count <= 1 =>
      {
        self.ck.terms.var(t)
      }
      _ => return Err(PacError::InvalidExtensionVar { file, line, id }),
    };
    self.expect(Tok::Comma)?;
    let p2 = self.parse_polynomial(false)?;
    self.expect(Tok::Semicolon)?;
    if self.ck.vars.get(ext).count > 1 {
      return Err(PacError::InvalidExtensionPoly { file, line, id })
    }
    let square = p2.mul(&p2, &mut self.ck.terms, &self.ck.vars, &self.ck.ring);
    let idempotent = square.equal(&p2);
    square.free(&mut self.ck.terms);
    if !idempotent {
      return Err(PacError::InvalidExtensionPoly { file, line, id })
    }
    let mut neg = p1;
    neg.negate(&self.ck.ring);
    let q = p2.add(neg, &mut self.ck.terms, &self.ck.vars, &self.ck.ring);
    self.ck.store_conclusion(id, q);
    self.ck.stats.count(Rule::Extension);
    Ok(())
  }

  /// `<id> % <lin-combo> , <conclusion> ;` — the summation tree is fed
  /// one product per combination term and folded at the comma; the fold
  /// must equal the stated conclusion.
  fn rule_lincomb(&mut self, id: u64, line: u32) -> Result<()> {
    if self.ck.store.contains(id) {
      return Err(self.duplicate(line, id))
    }
    let mut sum = SumStack::default();
    self.next()?;
    while self.lx.tok() != Tok::Comma {
      let p_index = self.parse_index()?;
      if !self.ck.store.contains(p_index) {
        return Err(self.not_found(line, id, p_index))
      }
      self.next()?;
      let part = if self.lx.tok() == Tok::Star {
        self.ck.stats.multiplications += 1;
        self.next()?;
        if self.lx.tok() != Tok::LParen {
          return Err(self.lx.error("expected '('"))
        }
        let multiplier = self.parse_polynomial(false)?;
        self.expect(Tok::RParen)?;
        let inf = self.ck.store.lookup(p_index).expect("looked up above");
        let prod =
          inf.conclusion.mul(&multiplier, &mut self.ck.terms, &self.ck.vars, &self.ck.ring);
        multiplier.free(&mut self.ck.terms);
        self.next()?;
        prod
      } else {
        let inf = self.ck.store.lookup(p_index).expect("looked up above");
        inf.conclusion.copy(&mut self.ck.terms)
      };
      sum.push(part, &mut self.ck.terms, &self.ck.vars, &self.ck.ring);
      match self.lx.tok() {
        Tok::Plus => {
          self.ck.stats.additions += 1;
          self.next()?;
        }
        Tok::Comma => {}
        t => return Err(self.lx.error(format!("unexpected {}", t.describe()))),
      }
    }
    let conclusion = sum.fold(&mut self.ck.terms, &self.ck.vars, &self.ck.ring);
    let poly_line = self.lx.token_line;
    let stated = self.parse_polynomial(false)?;
    self.expect(Tok::Semicolon)?;
    let equal = equal_mod_subst(
      &stated,
      &conclusion,
      &self.ck.assumptions,
      &mut self.ck.terms,
      &self.ck.vars,
      &self.ck.ring,
    );
    if !equal {
      return Err(self.mismatch(line, poly_line, id, &stated, &conclusion))
    }
    stated.free(&mut self.ck.terms);
    if self.ck.conclusion_matches_target(&conclusion) {
      self.ck.target_reached = true;
    }
    let one = is_one_mod_subst(
      &conclusion,
      &self.ck.assumptions,
      &mut self.ck.terms,
      &self.ck.vars,
      &self.ck.ring,
    );
    if one {
      self.ck.derived_one();
    }
    self.ck.store_conclusion(id, conclusion);
    self.ck.stats.count(Rule::LinComb);
    Ok(())
  }

  /// `m <number> ;` — fix the modulus; only once, only before axioms.
  pub(crate) fn rule_modulus(&mut self) -> Result<()> {
    let file = self.lx.file().to_owned();
    let line = self.lx.token_line;
    if !self.ck.ring.boolean() {
      return Err(PacError::ModulusAlreadySet { file, line })
    }
    if self.ck.axioms_seen {
      return Err(PacError::ModulusAfterAxiom { file, line })
    }
    self.next()?;
    if self.lx.tok() != Tok::Number {
      return Err(self.lx.error("expected modulus"))
    }
    let m: BigInt = self.lx.lexeme().parse().map_err(|_| self.lx.error("invalid modulus"))?;
    if m < BigInt::from(2) {
      return Err(PacError::InvalidModulus { file, line })
    }
    self.next()?;
    self.expect(Tok::Semicolon)?;
    self.ck.ring.modulus = Some(m);
    self.ck.stats.count(Rule::Modulus);
    Ok(())
  }

  /// `<id> r <variable> <int>+ ;` — declare roots of the univariate
  /// inference `id`; each value must evaluate to 0 mod m.
  fn rule_roots(&mut self, id: u64, line: u32) -> Result<()> {
    let file = self.lx.file().to_owned();
    if self.ck.ring.boolean() {
      return Err(PacError::NeedsModulus { file, line })
    }
    self.next()?;
    if self.lx.tok() != Tok::Variable {
      return Err(self.lx.error("expected variable"))
    }
    let v = self.parse_variable(false)?;
    let p = match self.ck.store.lookup(id) {
      Some(inf) => inf.conclusion.copy(&mut self.ck.terms),
      None => return Err(self.not_found(line, id, id)),
    };
    if !p.is_univariate_in(v, &self.ck.terms) {
      p.free(&mut self.ck.terms);
      return Err(PacError::NotUnivariate { file, line, id, var: self.ck.vars.name(v).to_owned() })
    }
    let mut declared = 0u32;
    loop {
      match self.lx.tok() {
        Tok::Semicolon if declared > 0 => break,
        Tok::Minus | Tok::Number => {
          let raw = self.parse_signed_int()?;
          let val = self.ck.ring.reduce(raw);
          let residue = p.eval_at(&val, &self.ck.terms, &self.ck.ring);
          if !num_traits::Zero::is_zero(&residue) {
            p.free(&mut self.ck.terms);
            return Err(PacError::RootDoesNotVanish {
              file,
              line,
              id,
              value: val.to_string(),
              residue: residue.to_string(),
            })
          }
          let set = self.ck.roots.entry(v).or_default();
          if !set.contains(&val) {
            set.push(val)
          }
          declared += 1;
          self.next()?;
        }
        _ => return Err(self.lx.error("expected integer root")),
      }
    }
    p.free(&mut self.ck.terms);
    self.ck.stats.count(Rule::Roots);
    Ok(())
  }

  /// `b <variable> <int> ;` — assume a declared root and push it onto
  /// the substitution stack.
  fn rule_branch(&mut self) -> Result<()> {
    let file = self.lx.file().to_owned();
    let line = self.lx.token_line;
    if self.ck.ring.boolean() {
      return Err(PacError::NeedsModulus { file, line })
    }
    self.next()?;
    if self.lx.tok() != Tok::Variable {
      return Err(self.lx.error("expected variable"))
    }
    let v = self.parse_variable(false)?;
    let raw = self.parse_signed_int()?;
    let val = self.ck.ring.reduce(raw);
    self.next()?;
    self.expect(Tok::Semicolon)?;
    if !self.ck.roots.get(&v).is_some_and(|set| set.contains(&val)) {
      return Err(PacError::NotADeclaredRoot {
        file,
        line,
        var: self.ck.vars.name(v).to_owned(),
        value: val.to_string(),
      })
    }
    self.ck.assumptions.push((v, val));
    self.ck.stats.count(Rule::Branch);
    Ok(())
  }
}
