use crate::store::Store;
use crate::term::TermTable;
use enum_map::{Enum, EnumMap};

/// Rule kinds, counted once per statement checked.
#[derive(Copy, Clone, Debug, Enum)]
pub enum Rule {
  Axiom,
  Extension,
  LinComb,
  Deletion,
  Modulus,
  Roots,
  Branch,
  PatternNew,
  PatternApply,
  PatternDelete,
}

/// Counters only; nothing here influences checking.
#[derive(Default)]
pub struct Stats {
  pub rules: EnumMap<Rule, u64>,
  /// `+` operations inside linear combinations
  pub additions: u64,
  /// `* ( ... )` multiplications inside linear combinations
  pub multiplications: u64,
  /// polynomials stored as conclusions
  pub proof_length: u64,
  /// monomials among stored conclusions
  pub proof_size: u64,
  /// maximal degree among stored conclusions
  pub proof_degree: u32,
}

impl Stats {
  pub fn count(&mut self, rule: Rule) { self.rules[rule] += 1 }

  pub fn record_conclusion(&mut self, degree: u32, size: usize) {
    self.proof_length += 1;
    self.proof_size += size as u64;
    if degree > self.proof_degree {
      self.proof_degree = degree
    }
  }

  /// Number of inference rules proper (axioms and deletions excluded).
  pub fn inference_rules(&self) -> u64 {
    self.rules[Rule::Extension] + self.rules[Rule::LinComb]
  }
}

fn percent(a: u64, b: u64) -> f64 {
  if b == 0 {
    0.0
  } else {
    100.0 * a as f64 / b as f64
  }
}

fn average(a: u64, b: u64) -> f64 {
  if b == 0 {
    0.0
  } else {
    a as f64 / b as f64
  }
}

/// Print the closing statistics block in the layout of the reference
/// reports.
pub fn print_statistics(stats: &Stats, terms: &TermTable, store: &Store) {
  use crate::msg;
  let rules = stats.inference_rules();
  let total = store.total;
  msg!("");
  msg!("proof length: {:22} (total number of polynomials)", stats.proof_length);
  msg!("proof size:   {:22} (total number of monomials)", stats.proof_size);
  msg!("proof degree: {:22}", stats.proof_degree);
  msg!("");
  if stats.rules[Rule::PatternNew] > 0 || stats.rules[Rule::PatternApply] > 0 {
    msg!("patterns: {:26}", stats.rules[Rule::PatternNew]);
    msg!(
      "apply patterns: {:20} (average: {:.1} apply per pattern)",
      stats.rules[Rule::PatternApply],
      average(stats.rules[Rule::PatternApply], stats.rules[Rule::PatternNew])
    );
    msg!("");
  }
  msg!("total inferences: {:18}", total);
  msg!(
    "original inferences: {:15} ({:.0}% of total rules)",
    stats.rules[Rule::Axiom],
    percent(stats.rules[Rule::Axiom], total)
  );
  msg!("proof rules:   {:21} ({:.0}% of total rules)", rules, percent(rules, total));
  msg!(
    "  extensions:  {:21} ({:.0}% of inference rules)",
    stats.rules[Rule::Extension],
    percent(stats.rules[Rule::Extension], rules)
  );
  msg!(
    "  linear combination: {:14} ({:.0}% of inference rules",
    stats.rules[Rule::LinComb],
    percent(stats.rules[Rule::LinComb], rules)
  );
  msg!("                                       containing {} additions", stats.additions);
  msg!("                                       and {} multiplications)", stats.multiplications);
  msg!(
    "rules deleted: {:21} ({:.0}% of total rules)",
    stats.rules[Rule::Deletion],
    percent(stats.rules[Rule::Deletion], rules + stats.rules[Rule::Axiom])
  );
  msg!("");
  msg!("total allocated terms: {:13}", terms.total);
  msg!(
    "max allocated terms: {:15} ({:.0}% of total terms)",
    terms.max_live,
    percent(terms.max_live, terms.total)
  );
  msg!("searched terms: {:20} ({:.0}% hits)", terms.searched, percent(terms.hits, terms.searched));
  msg!(
    "searched inferences: {:15} ({:.1} average searches)",
    store.searched,
    average(store.searched, total)
  );
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn conclusion_stats_track_shape() {
    let mut stats = Stats::default();
    stats.record_conclusion(2, 3);
    stats.record_conclusion(5, 1);
    stats.record_conclusion(1, 4);
    assert_eq!(stats.proof_length, 3);
    assert_eq!(stats.proof_size, 8);
    assert_eq!(stats.proof_degree, 5);
  }

  #[test]
  fn rule_counters_sum_into_inference_rules() {
    let mut stats = Stats::default();
    stats.count(Rule::Axiom);
    stats.count(Rule::Extension);
    stats.count(Rule::LinComb);
    stats.count(Rule::LinComb);
    stats.count(Rule::Deletion);
    assert_eq!(stats.inference_rules(), 3);
  }
}
