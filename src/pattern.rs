use crate::error::{PacError, Result};
use crate::lexer::Tok;
use crate::parser::Parser;
use crate::poly::{Monomial, PolyBuilder, Polynomial, SumStack};
use crate::stats::Rule;
use crate::term::{TermTable, VarList};
use crate::types::{Ring, VarId};
use crate::vars::Vars;
use hashbrown::HashMap;
use std::io::BufRead;

/// A reusable sub-proof: input polynomial templates over template
/// variables, and the output polynomials its internal steps derive from
/// them. The internal steps themselves are checked once, at definition
/// time, and not retained.
pub struct Pattern {
  pub inputs: Vec<Polynomial>,
  pub outputs: Vec<Polynomial>,
}

impl Pattern {
  pub fn free(self, terms: &mut TermTable) {
    for p in self.inputs {
      p.free(terms);
    }
    for p in self.outputs {
      p.free(terms);
    }
  }
}

fn is_input_word(w: &str) -> bool {
  w.len() > 2 && w.starts_with("in") && w[2..].bytes().all(|b| b.is_ascii_digit())
}

fn is_output_word(w: &str) -> bool {
  w.len() > 3 && w.starts_with("out") && w[3..].bytes().all(|b| b.is_ascii_digit())
}

fn is_matching_word(w: &str) -> bool {
  w.len() > 1 && w.starts_with('v') && w[1..].bytes().all(|b| b.is_ascii_digit())
}

/// Rebuild `p` with every variable sent through `matching`; a template
/// variable without an image is an error.
fn rematch(
  p: &Polynomial, matching: &HashMap<VarId, VarId>, terms: &mut TermTable, vars: &Vars, ring: &Ring,
  file: &str, line: u32,
) -> Result<Polynomial> {
  let mut b = PolyBuilder::default();
  for m in p.mons() {
    let mut list = VarList::default();
    for v in terms.vars(m.term).collect::<Vec<_>>() {
      let Some(&w) = matching.get(&v) else {
        return Err(PacError::UnmatchedTemplateVar {
          file: file.to_owned(),
          line,
          var: vars.name(v).to_owned(),
        })
      };
      list.push(w, vars, ring);
    }
    let term = list.build(terms);
    b.push(Monomial::make(m.coeff.clone(), term, terms, ring));
  }
  Ok(b.build(true, terms, vars, ring))
}

impl<R: BufRead> Parser<'_, R> {
  /// Dispatch for `pattern_new`, `pattern_apply` and `pattern_delete`;
  /// the cursor sits on the keyword.
  pub(crate) fn rule_pattern(&mut self) -> Result<()> {
    let word = self.lx.lexeme().to_owned();
    let line = self.lx.token_line;
    self.next()?;
    let id = self.parse_index()?;
    self.next()?;
    match word.as_str() {
      "pattern_delete" => {
        if let Some(p) = self.ck.patterns.remove(&id) {
          p.free(&mut self.ck.terms)
        }
        self.ck.stats.count(Rule::PatternDelete);
      }
      _ => {
        if self.lx.tok() != Tok::OpenBrace {
          return Err(self.lx.error("expected an open curly brace"))
        }
        if word == "pattern_new" {
          self.pattern_new(id, line)?
        } else {
          self.pattern_apply(id, line)?
        }
      }
    }
    self.expect(Tok::Semicolon)
  }

  /// `pattern_new <id> { inN <tmp-id> <poly> ; <tmp-id> % ... ; outN <tmp-id> ; }`
  /// Template inputs may introduce fresh (template) variables; internal
  /// steps are linear combinations over the temporary namespace only.
  fn pattern_new(&mut self, id: u64, line: u32) -> Result<()> {
    let file = self.lx.file().to_owned();
    if self.ck.patterns.contains_key(&id) {
      return Err(PacError::PatternExists { file, line, id })
    }
    let mut temp: HashMap<u64, Polynomial> = HashMap::new();
    let mut input_ids = vec![];
    let mut output_ids = vec![];
    self.next()?;
    loop {
      match self.lx.tok() {
        Tok::CloseBrace => break,
        Tok::Variable if is_input_word(self.lx.lexeme()) => {
          self.next()?;
          let line2 = self.lx.token_line;
          let tid = self.parse_index()?;
          if temp.contains_key(&tid) {
            return Err(PacError::TemporaryExists { file, line: line2, id: tid })
          }
          let p = self.parse_polynomial(true)?;
          self.expect(Tok::Semicolon)?;
          temp.insert(tid, p);
          input_ids.push(tid);
          self.next()?;
        }
        Tok::Number => {
          let line2 = self.lx.token_line;
          let sid = self.parse_index()?;
          if temp.contains_key(&sid) {
            return Err(PacError::TemporaryExists { file, line: line2, id: sid })
          }
          self.next()?;
          if self.lx.tok() != Tok::Percent {
            return Err(self.lx.error("expected a linear combination rule"))
          }
          self.pattern_lincomb(sid, line2, &mut temp)?;
          self.next()?;
        }
        Tok::Variable if is_output_word(self.lx.lexeme()) => {
          self.next()?;
          let line2 = self.lx.token_line;
          let tid = self.parse_index()?;
          if !temp.contains_key(&tid) {
            return Err(PacError::TemporaryNotFound { file, line: line2, id: tid })
          }
          self.next()?;
          self.expect(Tok::Semicolon)?;
          output_ids.push(tid);
          self.next()?;
        }
        _ => return Err(self.lx.error("expected a closing curly brace")),
      }
    }
    self.next()?;
    let inputs = input_ids.iter().map(|tid| temp[tid].copy(&mut self.ck.terms)).collect();
    let outputs = output_ids.iter().map(|tid| temp[tid].copy(&mut self.ck.terms)).collect();
    for (_, p) in temp {
      p.free(&mut self.ck.terms);
    }
    self.ck.patterns.insert(id, Pattern { inputs, outputs });
    self.ck.stats.count(Rule::PatternNew);
    Ok(())
  }

  /// A linear combination inside a pattern block, resolving and storing
  /// within the temporary namespace.
  fn pattern_lincomb(
    &mut self, sid: u64, line: u32, temp: &mut HashMap<u64, Polynomial>,
  ) -> Result<()> {
    let file = self.lx.file().to_owned();
    let mut sum = SumStack::default();
    self.next()?;
    while self.lx.tok() != Tok::Comma {
      let pid = self.parse_index()?;
      if !temp.contains_key(&pid) {
        return Err(PacError::TemporaryNotFound { file, line, id: pid })
      }
      self.next()?;
      let part = if self.lx.tok() == Tok::Star {
        self.next()?;
        if self.lx.tok() != Tok::LParen {
          return Err(self.lx.error("expected '('"))
        }
        let multiplier = self.parse_polynomial(false)?;
        self.expect(Tok::RParen)?;
        let src = &temp[&pid];
        let prod = src.mul(&multiplier, &mut self.ck.terms, &self.ck.vars, &self.ck.ring);
        multiplier.free(&mut self.ck.terms);
        self.next()?;
        prod
      } else {
        temp[&pid].copy(&mut self.ck.terms)
      };
      sum.push(part, &mut self.ck.terms, &self.ck.vars, &self.ck.ring);
      match self.lx.tok() {
        Tok::Plus => {
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
    if !stated.equal(&conclusion) {
      return Err(PacError::Mismatch {
        file,
        line,
        id: sid,
        at: if poly_line != line { format!(" line {poly_line}") } else { String::new() },
        actual: self.ck.render(&stated),
        expected: self.ck.render(&conclusion),
      })
    }
    conclusion.free(&mut self.ck.terms);
    temp.insert(sid, stated);
    Ok(())
  }

  /// `pattern_apply <id> { vK <var> ; inN <inference-id> ; outN <new-id> <poly> ; }`
  /// Inputs are matched positionally against the remapped templates;
  /// each output polynomial must equal its remapped template and is
  /// stored as a live inference.
  fn pattern_apply(&mut self, id: u64, line: u32) -> Result<()> {
    let file = self.lx.file().to_owned();
    let Some(pattern) = self.ck.patterns.remove(&id) else {
      return Err(PacError::PatternNotFound { file, line, id })
    };
    let mut matching: HashMap<VarId, VarId> = HashMap::new();
    self.next()?;
    while self.lx.tok() == Tok::Variable && is_matching_word(self.lx.lexeme()) {
      let template_var = self.parse_variable(false)?;
      if self.lx.tok() != Tok::Variable {
        return Err(self.lx.error("expected variable"))
      }
      let applied_var = self.parse_variable(true)?;
      self.expect(Tok::Semicolon)?;
      matching.insert(template_var, applied_var);
      self.next()?;
    }
    let mut input_at = 0;
    while self.lx.tok() == Tok::Variable && is_input_word(self.lx.lexeme()) {
      self.next()?;
      let line2 = self.lx.token_line;
      let index = self.parse_index()?;
      let Some(template) = pattern.inputs.get(input_at) else {
        return Err(self.lx.error("more inputs than the pattern declares"))
      };
      if !self.ck.store.contains(index) {
        return Err(PacError::PolynomialNotFound {
          file,
          line: line2,
          id,
          missing: index,
          hint: "",
        })
      }
      let expected =
        rematch(template, &matching, &mut self.ck.terms, &self.ck.vars, &self.ck.ring, &file, line2)?;
      let inf = self.ck.store.lookup(index).expect("checked above");
      if !inf.conclusion.equal(&expected) {
        let actual = inf.conclusion.display(&self.ck.terms, &self.ck.vars).to_string();
        let expected = expected.display(&self.ck.terms, &self.ck.vars).to_string();
        return Err(PacError::Mismatch { file, line: line2, id: index, at: String::new(), actual, expected })
      }
      expected.free(&mut self.ck.terms);
      self.next()?;
      self.expect(Tok::Semicolon)?;
      self.next()?;
      input_at += 1;
    }
    let mut output_at = 0;
    while self.lx.tok() == Tok::Variable && is_output_word(self.lx.lexeme()) {
      self.next()?;
      let line2 = self.lx.token_line;
      let new_id = self.parse_index()?;
      if self.ck.store.contains(new_id) {
        return Err(PacError::DuplicateIndex { file, line: line2, id: new_id })
      }
      let Some(template) = pattern.outputs.get(output_at) else {
        return Err(self.lx.error("more outputs than the pattern declares"))
      };
      let p = self.parse_polynomial(true)?;
      self.expect(Tok::Semicolon)?;
      let expected =
        rematch(template, &matching, &mut self.ck.terms, &self.ck.vars, &self.ck.ring, &file, line2)?;
      if !p.equal(&expected) {
        return Err(PacError::Mismatch {
          file,
          line: line2,
          id: new_id,
          at: String::new(),
          actual: self.ck.render(&p),
          expected: self.ck.render(&expected),
        })
      }
      expected.free(&mut self.ck.terms);
      self.ck.store_conclusion(new_id, p);
      self.next()?;
      output_at += 1;
    }
    if self.lx.tok() != Tok::CloseBrace {
      return Err(self.lx.error("expected a closing curly brace"))
    }
    self.next()?;
    self.ck.patterns.insert(id, pattern);
    self.ck.stats.count(Rule::PatternApply);
    Ok(())
  }
}
