use thiserror::Error;

pub type Result<T> = std::result::Result<T, PacError>;

/// Every failure of the checker is fatal and local; no variant is ever
/// recovered from. Variants carry the input file and the line of the
/// offending token, and algebraic mismatches carry both polynomials in
/// canonical print form.
#[derive(Debug, Error)]
pub enum PacError {
  #[error("can not open '{path}' for reading ({source})")]
  Open { path: String, source: std::io::Error },

  #[error("read error in '{path}' ({source})")]
  Read { path: String, source: std::io::Error },

  /// Lexical and syntactic errors. `near` is either empty or of the form
  /// ` at 'lexeme'`, matching the report format of the proof producers.
  #[error("parse error in '{file}' line {line}{near}: {msg}")]
  Parse { file: String, line: u32, near: String, msg: String },

  #[error("error in '{file}' line {line}: variable '{name}' is not contained in the ideal")]
  UnknownVariable { file: String, line: u32, name: String },

  #[error("error in '{file}' line {line}: index {id} already exists")]
  DuplicateIndex { file: String, line: u32, id: u64 },

  #[error(
    "error in rule with index {id} in '{file}' line {line}: \
     polynomial with index {missing} not found{hint}"
  )]
  PolynomialNotFound { file: String, line: u32, id: u64, missing: u64, hint: &'static str },

  /// `at` is either empty or ` line N` when the stated conclusion starts
  /// on a later line than the rule itself.
  #[error(
    "error in rule with index {id} in '{file}' line {line}: conclusion polynomial{at}:\n\
     {actual};\ndoes not match expected result:\n{expected};"
  )]
  Mismatch { file: String, line: u32, id: u64, at: String, actual: String, expected: String },

  #[error(
    "error in EXTENSION rule with index {id} in '{file}' line {line}: \
     extension variable is not valid"
  )]
  InvalidExtensionVar { file: String, line: u32, id: u64 },

  #[error(
    "error in EXTENSION rule with index {id} in '{file}' line {line}: \
     not a valid extension polynomial"
  )]
  InvalidExtensionPoly { file: String, line: u32, id: u64 },

  #[error(
    "error in EXTENSION rule with index {id} in '{file}' line {line}: \
     extensions require the boolean ring but a modulus is set"
  )]
  ExtensionNeedsBooleanRing { file: String, line: u32, id: u64 },

  #[error("error in '{file}' line {line}: modulus already set")]
  ModulusAlreadySet { file: String, line: u32 },

  #[error("error in '{file}' line {line}: modulus must be set before any axiom")]
  ModulusAfterAxiom { file: String, line: u32 },

  #[error("error in '{file}' line {line}: modulus must be at least 2")]
  InvalidModulus { file: String, line: u32 },

  #[error("error in '{file}' line {line}: root and branch rules require a modulus")]
  NeedsModulus { file: String, line: u32 },

  #[error(
    "error in rule with index {id} in '{file}' line {line}: \
     inference {id} is not univariate in '{var}'"
  )]
  NotUnivariate { file: String, line: u32, id: u64, var: String },

  #[error(
    "error in rule with index {id} in '{file}' line {line}: \
     {value} is not a root of inference {id} (evaluates to {residue})"
  )]
  RootDoesNotVanish { file: String, line: u32, id: u64, value: String, residue: String },

  #[error("error in '{file}' line {line}: {value} is not a declared root of '{var}'")]
  NotADeclaredRoot { file: String, line: u32, var: String, value: String },

  #[error("error in '{file}' line {line}: pattern with index {id} already exists")]
  PatternExists { file: String, line: u32, id: u64 },

  #[error("error in '{file}' line {line}: pattern with index {id} not found")]
  PatternNotFound { file: String, line: u32, id: u64 },

  #[error("error in '{file}' line {line}: temporary inference {id} already exists")]
  TemporaryExists { file: String, line: u32, id: u64 },

  #[error("error in '{file}' line {line}: temporary inference {id} does not exist")]
  TemporaryNotFound { file: String, line: u32, id: u64 },

  #[error("error in '{file}' line {line}: template variable '{var}' is not matched")]
  UnmatchedTemplateVar { file: String, line: u32, var: String },
}
