use num_bigint::{BigInt, Sign};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A trait for newtyped integers, that can be used as index types in vectors and sets.
pub trait Idx: Copy + Eq + std::hash::Hash + Ord {
  /// Convert from `T` to `usize`
  fn into_usize(self) -> usize;
  /// Convert from `usize` to `T`
  fn from_usize(_: usize) -> Self;
}

/// A vector indexed by a custom indexing type `I`, usually a newtyped integer.
pub struct IdxVec<I, T>(pub Vec<T>, PhantomData<I>);

impl<I, T: std::fmt::Debug> std::fmt::Debug for IdxVec<I, T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.0.fmt(f) }
}

impl<I, T> IdxVec<I, T> {
  /// Construct a new empty [`IdxVec`].
  #[must_use]
  pub const fn new() -> Self { Self(vec![], PhantomData) }

  /// The number of elements in the [`IdxVec`].
  #[must_use]
  pub fn len(&self) -> usize { self.0.len() }

  /// Returns `true` if the vector contains no elements.
  #[must_use]
  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// Returns the value that would be returned by the next call to `push`.
  pub fn peek(&self) -> I
  where I: Idx {
    I::from_usize(self.0.len())
  }

  /// Insert a new value at the end of the vector.
  pub fn push(&mut self, val: T) -> I
  where I: Idx {
    let id = self.peek();
    self.0.push(val);
    id
  }
}

impl<I, T> Default for IdxVec<I, T> {
  fn default() -> Self { Self::new() }
}

impl<I: Idx, T> Index<I> for IdxVec<I, T> {
  type Output = T;
  fn index(&self, index: I) -> &Self::Output { &self.0[I::into_usize(index)] }
}

impl<I: Idx, T> IndexMut<I> for IdxVec<I, T> {
  fn index_mut(&mut self, index: I) -> &mut Self::Output { &mut self.0[I::into_usize(index)] }
}

macro_rules! mk_id {
  ($($id:ident,)*) => {
    $(
      #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
      pub struct $id(pub u32);
      impl Idx for $id {
        fn from_usize(n: usize) -> Self { Self(n as u32) }
        fn into_usize(self) -> usize { self.0 as usize }
      }
      impl std::fmt::Debug for $id {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.0.fmt(f) }
      }
    )*
  };
}

mk_id! {
  VarId,
  TermId,
}

/// The process-wide variable order, fixed before any polynomial is built.
/// All term comparisons receive it by value; it is never global state.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub enum VarOrder {
  /// lexicographically greatest name first (`-s0`, the default)
  #[default]
  NameAsc,
  /// lexicographically least name first (`-s1`)
  NameDesc,
  /// earliest input order first (`-s2`)
  LevelAsc,
  /// latest input order first (`-s3`)
  LevelDesc,
}

impl VarOrder {
  pub fn describe(self) -> &'static str {
    match self {
      VarOrder::NameAsc => "sorting according to strcmp",
      VarOrder::NameDesc => "sorting according to reverse strcmp",
      VarOrder::LevelAsc => "sorting according to input order",
      VarOrder::LevelDesc => "sorting according to reverse input order",
    }
  }
}

/// The coefficient ring. The checker starts in the boolean ring (exact
/// integer coefficients, squarefree power-products, `x*x = x`); the `m`
/// rule switches once to `Z mod m`, where coefficients live in `[0, m)`
/// and power-products carry multiplicity.
#[derive(Debug)]
pub struct Ring {
  pub order: VarOrder,
  pub modulus: Option<BigInt>,
}

impl Ring {
  pub fn new(order: VarOrder) -> Self { Ring { order, modulus: None } }

  pub fn boolean(&self) -> bool { self.modulus.is_none() }

  /// Canonical residue of `c` in the current ring.
  pub fn reduce(&self, c: BigInt) -> BigInt {
    match &self.modulus {
      None => c,
      Some(m) => {
        let r = c % m;
        if r.sign() == Sign::Minus {
          r + m
        } else {
          r
        }
      }
    }
  }
}
