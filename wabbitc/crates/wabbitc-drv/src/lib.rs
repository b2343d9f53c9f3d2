//! wabbitc-drv - Compiler driver.
//!
//! The driver is the entry point and orchestrator for the pipeline:
//!
//! ```text
//! Source file (.wb)
//!        |
//!   [Lexer]        -> token stream        (--dump-tokens stops here)
//!        |
//!   [Parser]       -> AST                 (--dump-ast stops here)
//!        |
//!   [Type checker] -> annotated AST       (--check stops here)
//!        |
//!   [Interpreter]  -> program output      (--run)
//!   [IR lowerer]   -> IR module text      (--emit-ir, the default)
//! ```
//!
//! The first error from any phase aborts the pipeline; `main` reports it on
//! stderr and exits non-zero. No partial artifacts cross a phase boundary.

pub mod format;

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use wabbitc_interp::RuntimeError;
use wabbitc_ir::LowerError;
use wabbitc_lex::LexError;
use wabbitc_par::ParseError;
use wabbitc_sem::TypeError;

/// Any way a compilation can fail, including I/O at the edges.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Lower(#[from] LowerError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Command line interface of the `wabbitc` binary.
#[derive(Debug, Parser)]
#[command(
    name = "wabbitc",
    version,
    about = "Compiler and interpreter for the Wabbit language"
)]
pub struct Cli {
    /// Source file to process
    pub input: PathBuf,

    /// Print the token stream and stop
    #[arg(long)]
    pub dump_tokens: bool,

    /// Print the parsed statements and stop
    #[arg(long)]
    pub dump_ast: bool,

    /// Stop after type checking
    #[arg(long)]
    pub check: bool,

    /// Execute the program with the interpreter instead of compiling
    #[arg(long)]
    pub run: bool,

    /// Lower to IR and emit the module for the code generator (the default)
    #[arg(long)]
    pub emit_ir: bool,

    /// Where to write the emitted IR module (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// How far the session runs and what it produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitType {
    /// Token stream dump
    Tokens,
    /// Formatted statement dump
    Ast,
    /// Type checking only, no artifact
    Check,
    /// The IR module for the external code generator
    Ir,
    /// Interpreter execution
    Run,
}

/// Resolved driver configuration.
#[derive(Debug)]
pub struct Config {
    pub input: PathBuf,
    pub emit: EmitType,
    pub output: Option<PathBuf>,
}

impl Cli {
    pub fn into_config(self) -> Config {
        let emit = if self.dump_tokens {
            EmitType::Tokens
        } else if self.dump_ast {
            EmitType::Ast
        } else if self.check {
            EmitType::Check
        } else if self.run {
            EmitType::Run
        } else {
            // --emit-ir or no flag at all: compile
            EmitType::Ir
        };

        Config {
            input: self.input,
            emit,
            output: self.output,
        }
    }
}

/// One compilation session over one source file.
pub struct Session {
    config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the configured phases in order.
    pub fn run(&self) -> Result<(), CompileError> {
        let source = fs::read_to_string(&self.config.input).map_err(|e| CompileError::Io {
            path: self.config.input.clone(),
            source: e,
        })?;

        let tokens = wabbitc_lex::scan_tokens(&source)?;
        if self.config.emit == EmitType::Tokens {
            for token in &tokens {
                println!("{:>4}  {}", token.line, token);
            }
            return Ok(());
        }

        let mut program = wabbitc_par::parse(tokens)?;
        if self.config.emit == EmitType::Ast {
            print!("{}", format::format_program(&program));
            return Ok(());
        }

        wabbitc_sem::check(&mut program)?;
        if self.config.emit == EmitType::Check {
            return Ok(());
        }

        if self.config.emit == EmitType::Run {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            wabbitc_interp::interpret(&program, &mut lock)?;
            lock.flush().map_err(|e| CompileError::Io {
                path: self.config.input.clone(),
                source: e,
            })?;
            return Ok(());
        }

        let module = wabbitc_ir::lower(&program)?;
        match &self.config.output {
            Some(path) => fs::write(path, module.to_string()).map_err(|e| CompileError::Io {
                path: path.clone(),
                source: e,
            })?,
            None => print!("{}", module),
        }
        Ok(())
    }
}

/// Binary entry point: parse arguments, run the session, let `main.rs`
/// report the error and set the exit code.
pub fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let session = Session::new(cli.into_config());
    session.run()?;
    Ok(())
}
