//! Checker for proofs in the practical algebraic calculus: multivariate
//! polynomials over exact integers (or a fixed modulus) with
//! hash-consed power-products, an id-addressed inference store, and
//! per-rule validation of axiom, extension, linear-combination, delete,
//! root, branch and pattern rules.

use hashbrown::HashMap;
use num_bigint::BigInt;
use std::io::BufRead;

pub mod error;
mod checker;
pub mod lexer;
mod parser;
mod pattern;
pub mod poly;
pub mod stats;
pub mod store;
pub mod term;
pub mod types;
pub mod vars;

pub use crate::error::{PacError, Result};
pub use crate::poly::Polynomial;
pub use crate::stats::{print_statistics, Rule, Stats};
pub use crate::types::{Ring, VarOrder};

use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::pattern::Pattern;
use crate::store::Store;
use crate::term::TermTable;
use crate::types::VarId;
use crate::vars::Vars;

/// Product output line, prefixed like every other checker report.
#[macro_export]
macro_rules! msg {
  ($($t:tt)*) => { println!("[pacheck] {}", format_args!($($t)*)) };
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
  /// verify that the target polynomial is concluded somewhere
  pub check_target: bool,
  /// execute deletion rules (off under `--no-delete`)
  pub delete_mode: bool,
  pub verbose: bool,
  pub order: VarOrder,
}

impl Default for Config {
  fn default() -> Self {
    Config { check_target: true, delete_mode: true, verbose: false, order: VarOrder::default() }
  }
}

/// All checker state: registries, the inference store, ring mode, branch
/// bookkeeping, patterns, the target, and the statistics counters. One
/// value per run; every routine receives it explicitly.
pub struct Checker {
  pub cfg: Config,
  pub vars: Vars,
  pub terms: TermTable,
  pub store: Store,
  pub ring: Ring,
  pub stats: Stats,
  pub(crate) roots: HashMap<VarId, Vec<BigInt>>,
  pub(crate) assumptions: Vec<(VarId, BigInt)>,
  pub(crate) patterns: HashMap<u64, Pattern>,
  pub(crate) target: Option<Polynomial>,
  pub(crate) axioms_seen: bool,
  pub target_reached: bool,
  pub refutation: bool,
}

impl Checker {
  pub fn new(cfg: Config) -> Self {
    Checker {
      cfg,
      vars: Vars::default(),
      terms: TermTable::default(),
      store: Store::default(),
      ring: Ring::new(cfg.order),
      stats: Stats::default(),
      roots: HashMap::new(),
      assumptions: Vec::new(),
      patterns: HashMap::new(),
      target: None,
      axioms_seen: false,
      target_reached: false,
      refutation: false,
    }
  }

  /// Read the target file: a single polynomial, `;`, end of file.
  pub fn parse_target<R: BufRead>(&mut self, reader: R, file: &str) -> Result<()> {
    msg!("reading target polynomial from '{file}'");
    let mut parser = Parser::new(Lexer::new(reader, file), self);
    let bytes = parser.run_target()?;
    msg!("read {bytes} bytes from '{file}'");
    Ok(())
  }

  /// Read and store the original polynomials.
  pub fn check_axioms<R: BufRead>(&mut self, reader: R, file: &str) -> Result<()> {
    msg!("reading original polynomials from '{file}'");
    let mut parser = Parser::new(Lexer::new(reader, file), self);
    let (count, bytes) = parser.run_axioms()?;
    msg!("found {count} original polynomials in '{file}'");
    msg!("read {bytes} bytes from '{file}'");
    msg!("");
    Ok(())
  }

  /// Stream the proof file, validating every rule in order.
  pub fn check_proof<R: BufRead>(&mut self, reader: R, file: &str) -> Result<()> {
    msg!("reading polynomial algebraic calculus proof from '{file}'");
    let mut parser = Parser::new(Lexer::new(reader, file), self);
    let (checked, bytes) = parser.run_proof()?;
    msg!("found and checked {checked} inferences in '{file}'");
    msg!("read {bytes} bytes from '{file}'");
    msg!("");
    Ok(())
  }

  /// Ordered teardown: target, inferences, patterns, branch state, the
  /// term table (asserted drained), the variable registry. Statistics
  /// survive for the final report.
  pub fn reset(&mut self) {
    if let Some(t) = self.target.take() {
      t.free(&mut self.terms)
    }
    self.store.clear(&mut self.terms);
    for (_, p) in self.patterns.drain() {
      p.free(&mut self.terms)
    }
    self.assumptions.clear();
    self.roots.clear();
    debug_assert_eq!(self.terms.live, 0, "term leaked past teardown");
    self.terms.clear();
    self.vars.clear();
  }
}
