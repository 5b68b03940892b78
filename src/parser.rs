use crate::error::{PacError, Result};
use crate::lexer::{Lexer, Tok};
use crate::poly::{Monomial, PolyBuilder, Polynomial};
use crate::term::VarList;
use crate::types::{TermId, VarId};
use crate::Checker;
use num_bigint::BigInt;
use std::io::BufRead;

/// Drives one input file: owns the token stream and mutates the checker
/// state as rules are recognized. The rule and pattern validators are
/// implemented on this type in their own modules.
pub struct Parser<'a, R> {
  pub(crate) lx: Lexer<R>,
  pub(crate) ck: &'a mut Checker,
}

impl<'a, R: BufRead> Parser<'a, R> {
  pub fn new(lx: Lexer<R>, ck: &'a mut Checker) -> Self { Parser { lx, ck } }

  pub(crate) fn next(&mut self) -> Result<Tok> { self.lx.next() }

  pub(crate) fn expect(&mut self, t: Tok) -> Result<()> {
    if self.lx.tok() == t {
      Ok(())
    } else {
      Err(self.lx.error(format!("unexpected {} token", self.lx.tok().describe())))
    }
  }

  /// The current token as a rule index; does not advance.
  pub(crate) fn parse_index(&mut self) -> Result<u64> {
    if self.lx.tok() != Tok::Number {
      return Err(self.lx.error("no index detected (try '-h')"))
    }
    self.lx.lexeme().parse().map_err(|_| self.lx.error("index out of range"))
  }

  /// A signed integer literal (`-` allowed); leaves the cursor on the
  /// final number token.
  pub(crate) fn parse_signed_int(&mut self) -> Result<BigInt> {
    let negative = self.lx.tok() == Tok::Minus;
    if negative {
      self.next()?;
    }
    if self.lx.tok() != Tok::Number {
      return Err(self.lx.error("expected integer"))
    }
    let val: BigInt =
      self.lx.lexeme().parse().map_err(|_| self.lx.error("invalid integer literal"))?;
    Ok(if negative { -val } else { val })
  }

  /// Intern the current variable token, then advance.
  pub(crate) fn parse_variable(&mut self, allow_new: bool) -> Result<VarId> {
    debug_assert_eq!(self.lx.tok(), Tok::Variable);
    let v = self.ck.vars.intern(self.lx.lexeme(), allow_new).ok_or_else(|| {
      PacError::UnknownVariable {
        file: self.lx.file().to_owned(),
        line: self.lx.token_line,
        name: self.lx.lexeme().to_owned(),
      }
    })?;
    self.next()?;
    Ok(v)
  }

  /// A `*`-joined run of variables; the empty run is the constant term.
  fn parse_term(&mut self, allow_new: bool) -> Result<Option<TermId>> {
    let mut list = VarList::default();
    while self.lx.tok() == Tok::Variable {
      let v = self.parse_variable(allow_new)?;
      list.push(v, &self.ck.vars, &self.ck.ring);
      if self.lx.tok() == Tok::Star {
        self.next()?;
      }
    }
    Ok(list.build(&mut self.ck.terms))
  }

  /// `[integer [*]] var (* var)*` or a bare integer.
  fn parse_monomial(&mut self, sign: bool, allow_new: bool) -> Result<Option<Monomial>> {
    let coeff: BigInt = match self.lx.tok() {
      Tok::Number => {
        let c = self.lx.lexeme().parse().map_err(|_| self.lx.error("invalid number"))?;
        self.next()?;
        c
      }
      Tok::Variable => BigInt::from(1),
      _ => return Err(self.lx.error("expected monomial")),
    };
    let coeff = if sign { -coeff } else { coeff };
    if self.lx.tok() == Tok::Star {
      self.next()?;
    }
    let term = self.parse_term(allow_new)?;
    Ok(Monomial::make(coeff, term, &mut self.ck.terms, &self.ck.ring))
  }

  /// Parse a polynomial up to (and not past) the next `,`, `;` or `)`.
  /// The cursor is expected on the token before the polynomial.
  pub(crate) fn parse_polynomial(&mut self, allow_new: bool) -> Result<Polynomial> {
    self.next()?;
    let mut sign = false;
    if self.lx.tok() == Tok::Minus {
      self.next()?;
      if self.lx.tok() == Tok::Number && self.lx.lexeme().starts_with('0') {
        return Err(self.lx.error("unexpected '0' after '-'"))
      }
      sign = true;
    }
    let mut b = PolyBuilder::default();
    loop {
      let m = self.parse_monomial(sign, allow_new)?;
      b.push(m);
      match self.lx.tok() {
        Tok::Comma | Tok::Semicolon | Tok::RParen => break,
        Tok::Minus => {
          sign = true;
          self.next()?;
        }
        Tok::Plus => {
          sign = false;
          self.next()?;
        }
        t => return Err(self.lx.error(format!("unexpected {}", t.describe()))),
      }
    }
    Ok(b.build(true, &mut self.ck.terms, &self.ck.vars, &self.ck.ring))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Config;
  use std::io::Cursor;

  fn parse(ck: &mut Checker, input: &str, allow_new: bool) -> Result<Polynomial> {
    let mut p = Parser::new(Lexer::new(Cursor::new(input), "test"), ck);
    p.parse_polynomial(allow_new)
  }

  fn show(ck: &Checker, p: &Polynomial) -> String { p.display(&ck.terms, &ck.vars).to_string() }

  #[test]
  fn parses_and_normalizes() {
    let mut ck = Checker::new(Config::default());
    let p = parse(&mut ck, "x*x + -1*x + 3 ;", true).unwrap();
    // boolean ring: x*x collapses onto x and cancels -x
    assert_eq!(show(&ck, &p), "3");
    p.free(&mut ck.terms);
  }

  #[test]
  fn parses_signs_and_implicit_coefficients() {
    let mut ck = Checker::new(Config::default());
    let p = parse(&mut ck, "-x*y + 2*y - 1 ;", true).unwrap();
    assert_eq!(show(&ck, &p), "-y*x+2*y-1");
    p.free(&mut ck.terms);
  }

  #[test]
  fn bare_integer_polynomial() {
    let mut ck = Checker::new(Config::default());
    let p = parse(&mut ck, "17 ;", true).unwrap();
    assert_eq!(show(&ck, &p), "17");
    p.free(&mut ck.terms);
  }

  #[test]
  fn print_parse_round_trip() {
    let mut ck = Checker::new(Config::default());
    let p = parse(&mut ck, "2*x*y + -1*z + 5 ;", true).unwrap();
    let printed = format!("{} ;", show(&ck, &p));
    let q = parse(&mut ck, &printed, false).unwrap();
    assert!(p.equal(&q));
    p.free(&mut ck.terms);
    q.free(&mut ck.terms);
    assert_eq!(ck.terms.live, 0);
  }

  #[test]
  fn rejects_unknown_variable_when_closed() {
    let mut ck = Checker::new(Config::default());
    let p = parse(&mut ck, "x + 1 ;", true).unwrap();
    p.free(&mut ck.terms);
    let err = parse(&mut ck, "x + q ;", false).unwrap_err();
    assert!(matches!(err, PacError::UnknownVariable { ref name, .. } if name == "q"));
  }

  #[test]
  fn rejects_minus_zero() {
    let mut ck = Checker::new(Config::default());
    let err = parse(&mut ck, "-0 ;", true).unwrap_err();
    assert!(err.to_string().contains("unexpected '0' after '-'"));
  }

  #[test]
  fn zero_literal_builds_zero_polynomial() {
    let mut ck = Checker::new(Config::default());
    let p = parse(&mut ck, "0 ;", true).unwrap();
    assert!(p.is_zero());
    assert_eq!(ck.terms.live, 0);
  }
}
