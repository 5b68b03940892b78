use crate::types::{IdxVec, Ring, TermId, VarId};
use crate::vars::Vars;
use hashbrown::HashMap;
use std::cmp::Ordering;

struct TermNode {
  var: VarId,
  rest: Option<TermId>,
  refs: u32,
}

/// Hash-consed power-product terms. A term is a non-empty list of
/// variables in strictly descending variable order (duplicates adjacent
/// when the ring carries multiplicity); the empty product is `None` at
/// every use site. Structurally equal terms share one slot, so equality
/// is id equality.
///
/// Slots are reference counted: a term's count is the number of monomials
/// holding it plus transient builder holds, and the last release unlinks
/// the slot and releases the tail.
#[derive(Default)]
pub struct TermTable {
  nodes: IdxVec<TermId, TermNode>,
  dedup: HashMap<(VarId, Option<TermId>), TermId>,
  free: Vec<TermId>,
  /// terms allocated over the whole run
  pub total: u64,
  /// currently live terms
  pub live: u64,
  /// high-water mark of `live`
  pub max_live: u64,
  /// `make` calls
  pub searched: u64,
  /// `make` calls answered from the table
  pub hits: u64,
}

impl TermTable {
  /// Find or insert the term `var · rest`. Consumes the caller's
  /// reference to `rest` and returns an owned reference to the result.
  /// `rest` must already be a correctly ordered suffix for `var`.
  pub fn make(&mut self, var: VarId, rest: Option<TermId>) -> TermId {
    self.searched += 1;
    if let Some(&t) = self.dedup.get(&(var, rest)) {
      self.hits += 1;
      self.nodes[t].refs += 1;
      // the found node owns its own reference to the tail
      self.release(rest);
      return t
    }
    self.total += 1;
    self.live += 1;
    if self.live > self.max_live {
      self.max_live = self.live
    }
    let node = TermNode { var, rest, refs: 1 };
    let t = match self.free.pop() {
      Some(t) => {
        self.nodes[t] = node;
        t
      }
      None => self.nodes.push(node),
    };
    self.dedup.insert((var, rest), t);
    t
  }

  /// Build a term from a variable list already in descending order,
  /// innermost suffix first.
  pub fn build_sorted(&mut self, list: &[VarId]) -> Option<TermId> {
    let mut t = None;
    for &v in list.iter().rev() {
      t = Some(self.make(v, t))
    }
    t
  }

  /// Take an additional reference.
  pub fn retain(&mut self, t: Option<TermId>) -> Option<TermId> {
    if let Some(id) = t {
      self.nodes[id].refs += 1
    }
    t
  }

  /// Drop a reference; the last release unlinks the slot from the table
  /// and continues into the tail.
  pub fn release(&mut self, mut t: Option<TermId>) {
    while let Some(id) = t {
      let node = &mut self.nodes[id];
      debug_assert!(node.refs > 0);
      node.refs -= 1;
      if node.refs > 0 {
        break
      }
      let rest = node.rest;
      self.dedup.remove(&(node.var, rest));
      self.free.push(id);
      self.live -= 1;
      t = rest;
    }
  }

  pub fn var(&self, t: TermId) -> VarId { self.nodes[t].var }

  pub fn rest(&self, t: TermId) -> Option<TermId> { self.nodes[t].rest }

  #[cfg(test)]
  pub fn refs(&self, t: TermId) -> u32 { self.nodes[t].refs }

  /// Number of variable occurrences (the degree of the power-product).
  pub fn size(&self, mut t: Option<TermId>) -> u32 {
    let mut n = 0;
    while let Some(id) = t {
      n += 1;
      t = self.nodes[id].rest;
    }
    n
  }

  pub fn vars(&self, t: Option<TermId>) -> impl Iterator<Item = VarId> + '_ {
    std::iter::successors(t, move |&id| self.nodes[id].rest).map(move |id| self.nodes[id].var)
  }

  /// Compare two terms in the variable order. The empty product sorts
  /// below every non-empty term; otherwise the first differing variable
  /// decides, and a term extending the other is the larger one.
  pub fn cmp(&self, a: Option<TermId>, b: Option<TermId>, vars: &Vars, ring: &Ring) -> Ordering {
    let (mut a, mut b) = (a, b);
    loop {
      match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(x), Some(y)) => {
          if x == y {
            return Ordering::Equal
          }
          match vars.cmp(self.nodes[x].var, self.nodes[y].var, ring.order) {
            Ordering::Equal => {
              a = self.nodes[x].rest;
              b = self.nodes[y].rest;
            }
            non_eq => return non_eq,
          }
        }
      }
    }
  }

  /// Product of two terms; neither input reference is consumed. In the
  /// boolean ring shared variables merge (`x*x = x`), otherwise both
  /// occurrences are kept.
  pub fn multiply(
    &mut self, a: Option<TermId>, b: Option<TermId>, vars: &Vars, ring: &Ring,
  ) -> Option<TermId> {
    let (Some(t1), Some(t2)) = (a, b) else { return self.retain(a.or(b)) };
    let boolean = ring.boolean();
    if t1 == t2 && boolean {
      return self.retain(Some(t1))
    }
    let mut list = vec![];
    let (mut p1, mut p2) = (Some(t1), Some(t2));
    while let (Some(x), Some(y)) = (p1, p2) {
      if x == y && boolean {
        p2 = None;
        break
      }
      let (vx, vy) = (self.nodes[x].var, self.nodes[y].var);
      match vars.cmp(vx, vy, ring.order) {
        Ordering::Equal => {
          list.push(vx);
          if !boolean {
            list.push(vx)
          }
          p1 = self.nodes[x].rest;
          p2 = self.nodes[y].rest;
        }
        Ordering::Greater => {
          list.push(vx);
          p1 = self.nodes[x].rest;
        }
        Ordering::Less => {
          list.push(vy);
          p2 = self.nodes[y].rest;
        }
      }
    }
    while let Some(x) = p1 {
      list.push(self.nodes[x].var);
      p1 = self.nodes[x].rest;
    }
    while let Some(y) = p2 {
      list.push(self.nodes[y].var);
      p2 = self.nodes[y].rest;
    }
    self.build_sorted(&list)
  }

  pub fn clear(&mut self) {
    self.nodes.0.clear();
    self.dedup.clear();
    self.free.clear();
    self.live = 0;
  }
}

/// Scratch list collecting parsed variables in descending order; terms
/// are always built from a fully sorted list, never incrementally.
#[derive(Default)]
pub struct VarList {
  list: Vec<VarId>,
}

impl VarList {
  pub fn push(&mut self, v: VarId, vars: &Vars, ring: &Ring) {
    let mut i = self.list.len();
    while i > 0 {
      match vars.cmp(self.list[i - 1], v, ring.order) {
        Ordering::Less => i -= 1,
        Ordering::Equal => {
          if ring.boolean() {
            return
          }
          break
        }
        Ordering::Greater => break,
      }
    }
    self.list.insert(i, v);
  }

  pub fn build(self, terms: &mut TermTable) -> Option<TermId> { terms.build_sorted(&self.list) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::VarOrder;
  use num_bigint::BigInt;

  fn setup() -> (Vars, TermTable, Ring) {
    let mut vars = Vars::default();
    for name in ["x", "y", "z"] {
      vars.intern(name, true).unwrap();
    }
    (vars, TermTable::default(), Ring::new(VarOrder::NameAsc))
  }

  fn term(terms: &mut TermTable, vars: &Vars, ring: &Ring, names: &[&str]) -> Option<TermId> {
    let mut list = VarList::default();
    for name in names {
      let v = (0..vars.len() as u32).map(crate::types::VarId).find(|&v| vars.name(v) == *name);
      list.push(v.unwrap(), vars, ring);
    }
    list.build(terms)
  }

  #[test]
  fn consing_shares_slots() {
    let (vars, mut terms, ring) = setup();
    let a = term(&mut terms, &vars, &ring, &["x", "y"]).unwrap();
    let b = term(&mut terms, &vars, &ring, &["y", "x"]).unwrap();
    assert_eq!(a, b);
    assert_eq!(terms.refs(a), 2);
    assert_eq!(terms.live, 2); // y*x and the shared suffix x
  }

  #[test]
  fn release_unlinks_recursively() {
    let (vars, mut terms, ring) = setup();
    let a = term(&mut terms, &vars, &ring, &["x", "y", "z"]);
    assert_eq!(terms.live, 3);
    terms.release(a);
    assert_eq!(terms.live, 0);
  }

  #[test]
  fn release_keeps_shared_suffix() {
    let (vars, mut terms, ring) = setup();
    let a = term(&mut terms, &vars, &ring, &["x", "y"]);
    let b = term(&mut terms, &vars, &ring, &["x", "y", "z"]);
    terms.release(b);
    assert_eq!(terms.live, 2);
    terms.release(a);
    assert_eq!(terms.live, 0);
  }

  #[test]
  fn multiply_is_commutative_and_interned() {
    let (vars, mut terms, ring) = setup();
    let xy = term(&mut terms, &vars, &ring, &["x", "y"]);
    let yz = term(&mut terms, &vars, &ring, &["y", "z"]);
    let ab = terms.multiply(xy, yz, &vars, &ring);
    let ba = terms.multiply(yz, xy, &vars, &ring);
    assert_eq!(ab, ba);
    assert_eq!(terms.size(ab), 3); // x*y*z, y merged
    terms.release(ab);
    terms.release(ba);
    terms.release(xy);
    terms.release(yz);
    assert_eq!(terms.live, 0);
  }

  #[test]
  fn multiply_keeps_multiplicity_mod_m() {
    let (vars, mut terms, mut ring) = setup();
    let x = term(&mut terms, &vars, &ring, &["x"]);
    ring.modulus = Some(BigInt::from(7));
    let xx = terms.multiply(x, x, &vars, &ring);
    assert_eq!(terms.size(xx), 2);
    let xxx = terms.multiply(xx, x, &vars, &ring);
    assert_eq!(terms.size(xxx), 3);
    terms.release(xxx);
    terms.release(xx);
    terms.release(x);
    assert_eq!(terms.live, 0);
  }

  #[test]
  fn boolean_ring_merges_duplicates() {
    let (vars, mut terms, ring) = setup();
    let x = term(&mut terms, &vars, &ring, &["x"]);
    let xx = terms.multiply(x, x, &vars, &ring);
    assert_eq!(xx, x);
    terms.release(xx);
    terms.release(x);
    assert_eq!(terms.live, 0);
  }
}
