use pacheck::{msg, print_statistics, Checker, Config, PacError, Result, VarOrder};
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

const USAGE: &str = "\
pacheck [ <option> ... ] [ <polynomials> <proof> ] [ <target> ]

where <option> is one of the following

  -h | --help           print this command line option summary and exit

  -s | --no-target      only check inferences but not that target is inferred

  -d | --no-delete      ignore delete rules

  -v | --verbose        print verbose progress messages

  -s0                   sort variables according to strcmp (default)
  -s1                   sort variables according to -1*strcmp
  -s2                   sort variables according to input order
  -s3                   sort variables according to reverse input order

The <polynomials> argument should point to a file with the
original set of polynomials and <proof> is a path to a proof file
interpreted as a sequence of inferences in the polynomial calculus.
The tool checks that all inferences in the sequence are correct.

<target> is optional. Omitting this file is the same as choosing option '-s'.
It should point to a file with a single polynomial which
should be generated by the proof.
The exit code is zero if and only if all checks succeed.
";

struct Args {
  cfg: Config,
  axioms: String,
  proof: String,
  target: Option<String>,
}

fn die(msg: &str) -> ExitCode {
  eprintln!("*** [pacheck] {msg}");
  ExitCode::FAILURE
}

fn parse_args(args: impl Iterator<Item = String>) -> std::result::Result<Option<Args>, String> {
  let mut cfg = Config::default();
  let mut files: Vec<String> = vec![];
  let mut orders = 0u32;
  for arg in args {
    match arg.as_str() {
      "-h" | "--help" => return Ok(None),
      "-s" | "--no-target" => cfg.check_target = false,
      "-d" | "--no-delete" => cfg.delete_mode = false,
      "-v" | "--verbose" => cfg.verbose = true,
      "-s0" | "-s1" | "-s2" | "-s3" => {
        cfg.order = match arg.as_str() {
          "-s0" => VarOrder::NameAsc,
          "-s1" => VarOrder::NameDesc,
          "-s2" => VarOrder::LevelAsc,
          _ => VarOrder::LevelDesc,
        };
        orders += 1;
      }
      _ if arg.starts_with('-') => {
        return Err(format!("invalid command line option '{arg}' (try '-h')"))
      }
      _ => {
        if files.len() == 3 {
          return Err("too many command line arguments (try '-h')".to_owned())
        }
        files.push(arg)
      }
    }
  }
  if orders > 1 {
    return Err("too many variable orderings selected".to_owned())
  }
  if files.len() < 2 {
    return Err("too few command line arguments (try '-h')".to_owned())
  }
  let mut files = files.into_iter();
  let axioms = files.next().expect("checked above");
  let proof = files.next().expect("checked above");
  let target = files.next();
  if target.is_none() {
    cfg.check_target = false
  }
  Ok(Some(Args { cfg, axioms, proof, target }))
}

fn open(path: &str) -> Result<BufReader<File>> {
  match File::open(path) {
    Ok(f) => Ok(BufReader::new(f)),
    Err(source) => Err(PacError::Open { path: path.to_owned(), source }),
  }
}

fn banner() {
  msg!("Pacheck Version {}", env!("CARGO_PKG_VERSION"));
  msg!("Practical Algebraic Calculus Proof Checker");
}

fn run(ck: &mut Checker, args: &Args) -> Result<()> {
  if let Some(target) = &args.target {
    if ck.cfg.check_target {
      msg!("checking target enabled");
      ck.parse_target(open(target)?, target)?;
    }
  }
  msg!("");
  ck.check_axioms(open(&args.axioms)?, &args.axioms)?;
  ck.check_proof(open(&args.proof)?, &args.proof)?;
  Ok(())
}

fn main() -> ExitCode {
  let args = match parse_args(std::env::args().skip(1)) {
    Ok(Some(args)) => args,
    Ok(None) => {
      print!("{USAGE}");
      return ExitCode::SUCCESS
    }
    Err(msg) => return die(&msg),
  };

  banner();
  msg!("{}", args.cfg.order.describe());

  let mut ck = Checker::new(args.cfg);
  if let Err(e) = run(&mut ck, &args) {
    eprintln!("*** [pacheck] {e}");
    return ExitCode::FAILURE
  }
  ck.reset();

  msg!("");
  msg!("----------------------------------------------------------------------");
  if ck.cfg.check_target && ck.target_reached {
    msg!("c TARGET CHECKED");
  } else if ck.cfg.check_target {
    msg!("c INFERENCES CHECKED - TARGET IS NOT INFERRED");
  } else {
    msg!("c INFERENCES CHECKED");
  }
  msg!("----------------------------------------------------------------------");
  if ck.refutation {
    msg!("% CORRECT REFUTATION");
  }
  print_statistics(&ck.stats, &ck.terms, &ck.store);
  ExitCode::SUCCESS
}
