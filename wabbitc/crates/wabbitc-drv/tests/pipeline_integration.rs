//! End-to-end pipeline tests: lex -> parse -> check -> (interpret | lower).
//!
//! These drive the phase crates directly, the same composition the driver
//! session performs, against the concrete programs the language is expected
//! to handle.

use wabbitc_interp::interpret;
use wabbitc_ir::{lower, Callee, Constant, Instr, LowerError, Module, Operand, Terminator};
use wabbitc_lex::scan_tokens;
use wabbitc_par::{parse, Block, Ty};
use wabbitc_sem::{check, TypeError};
use wabbitc_util::index_vec::Idx;

fn checked(source: &str) -> Block {
    let mut program = parse(scan_tokens(source).unwrap()).unwrap();
    check(&mut program).unwrap();
    program
}

fn run_interp(source: &str) -> String {
    let mut out = Vec::new();
    interpret(&checked(source), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn lower_checked(source: &str) -> Module {
    lower(&checked(source)).unwrap()
}

#[test]
fn scenario_print_newline() {
    // type-checks, the interpreter prints a newline, and the compiler
    // emits a single call to print_char(10)
    let source = r"print '\n';";

    assert_eq!(run_interp(source), "\n");

    let module = lower_checked(source);
    let main = module.get_function("main").unwrap();
    let calls: Vec<_> = main
        .instructions()
        .filter_map(|(_, instr)| match instr {
            Instr::Call {
                callee: Callee::Extern(id),
                args,
            } if module.externs[id.index()].name == "print_char" => Some(args),
            _ => None,
        })
        .collect();
    assert_eq!(calls.len(), 1);

    let arg = match calls[0][0] {
        Operand::Value(v) => v,
        other => panic!("expected value operand, got {:?}", other),
    };
    let constant = main.instructions().find_map(|(id, instr)| match instr {
        Instr::Const(c) if *id == arg => Some(*c),
        _ => None,
    });
    assert_eq!(constant, Some(Constant::I8(10)));
}

#[test]
fn scenario_factorial_sequence() {
    let source = "var x int = 1; var fact int = 1;\n\
                  while x < 11 { fact = fact * x; x = x + 1; print fact; }";
    assert_eq!(
        run_interp(source),
        "1\n2\n6\n24\n120\n720\n5040\n40320\n362880\n3628800\n"
    );
}

#[test]
fn scenario_const_perimeter() {
    let source =
        "const pi float = 3.14; var r float = 2.0; var p float; p = 2.0 * r * pi; print p;";

    // type-checks; p keeps type float through the assignment
    let program = checked(source);
    match &program.statements[2] {
        wabbitc_par::Stmt::Var(decl) => assert_eq!(decl.ty, Some(Ty::Float)),
        other => panic!("expected var declaration, got {:?}", other),
    }

    // reassigning pi is rejected
    let mut reassigned = parse(scan_tokens(&format!("{} pi = 3.0;", source)).unwrap()).unwrap();
    assert!(matches!(
        check(&mut reassigned),
        Err(TypeError::AssignToConst { .. })
    ));
}

#[test]
fn scenario_isprime() {
    let source = "func isprime(n int) bool {\n\
                      var f int = 2;\n\
                      while f <= n / 2 {\n\
                          if f * (n / f) == n { return false; }\n\
                          f = f + 1;\n\
                      }\n\
                      return true;\n\
                  }\n\
                  print isprime(15); print isprime(37);";

    // the program type-checks and runs under the interpreter
    assert_eq!(run_interp(source), "false\ntrue\n");

    // but integer division has no encoding, so lowering rejects it
    assert_eq!(
        lower(&checked(source)).unwrap_err(),
        LowerError::UnsupportedOp {
            op: "/".to_string(),
            ty: Ty::Int
        }
    );
}

#[test]
fn scenario_if_else_compare() {
    let source = "var a int = 2; var b int = 3; if a < b { print 'L'; } else { print 'G'; }";

    assert_eq!(run_interp(source), "L");

    // the compiled form is a conditional branch with two single-call arms
    let module = lower_checked(source);
    let main = module.get_function("main").unwrap();
    let (then_block, else_block) = match main.blocks[wabbitc_ir::BlockId(0)].terminator {
        Some(Terminator::CondBr {
            then_block,
            else_block,
            ..
        }) => (then_block, else_block),
        other => panic!("expected conditional branch, got {:?}", other),
    };
    for arm in [then_block, else_block] {
        let call_count = main.blocks[arm]
            .instrs
            .iter()
            .filter(|(_, instr)| matches!(instr, Instr::Call { .. }))
            .count();
        assert_eq!(call_count, 1);
    }
}

#[test]
fn scenario_int_float_mixing_diagnostic() {
    let mut program = parse(scan_tokens("print 1 + 2.0;").unwrap()).unwrap();
    let message = check(&mut program).unwrap_err().to_string();
    assert!(message.contains("int"), "diagnostic was: {}", message);
    assert!(message.contains("float"), "diagnostic was: {}", message);
}

#[test]
fn pipeline_terminates_on_legal_programs() {
    for source in [
        "",
        "print 'a';",
        "var x int = 1; x = x + 1;",
        "const c char = 'c'; print c;",
        "func f(a int, b int) int { return a + b; } var r int = 0; r = f(1, 2);",
        "var i int = 0; while i < 5 { if i == 2 { print 'm'; } i = i + 1; }",
    ] {
        let _ = checked(source);
    }
}

#[test]
fn pipeline_is_deterministic() {
    let source = "var x int = 1; func f(n int) int { return n * x; } print 'd';";
    assert_eq!(checked(source), checked(source));
    assert_eq!(lower_checked(source), lower_checked(source));
}

#[test]
fn errors_do_not_cross_stage_boundaries() {
    // a lexical error aborts before parsing
    assert!(scan_tokens("var x = 1 & 2;").is_err());

    // a parse error aborts before checking
    assert!(parse(scan_tokens("var;").unwrap()).is_err());

    // a type error aborts before lowering or interpretation
    let mut program = parse(scan_tokens("print missing;").unwrap()).unwrap();
    assert!(check(&mut program).is_err());
}
