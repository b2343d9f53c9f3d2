//! Lowering tests against concrete programs.

#![cfg(test)]

use crate::ir::*;
use crate::lower::lower;
use crate::LowerError;
use wabbitc_lex::scan_tokens;
use wabbitc_par::parse;
use wabbitc_par::Ty;
use wabbitc_util::Idx;
use wabbitc_sem::check;

fn lower_source(source: &str) -> Result<Module, LowerError> {
    let mut program = parse(scan_tokens(source).unwrap()).unwrap();
    check(&mut program).unwrap();
    lower(&program)
}

fn main_of(module: &Module) -> &Function {
    module.get_function("main").expect("module has a main")
}

/// All calls to the named external in the function, with their arguments.
fn extern_calls<'m>(
    module: &'m Module,
    func: &'m Function,
    name: &str,
) -> Vec<&'m Vec<Operand>> {
    func.instructions()
        .filter_map(|(_, instr)| match instr {
            Instr::Call {
                callee: Callee::Extern(id),
                args,
            } if module.externs[id.index()].name == name => Some(args),
            _ => None,
        })
        .collect()
}

/// Resolves an operand that names a materialized constant.
fn as_constant(func: &Function, operand: Operand) -> Option<Constant> {
    let value = match operand {
        Operand::Value(v) => v,
        _ => return None,
    };
    func.instructions().find_map(|(id, instr)| match instr {
        Instr::Const(c) if *id == value => Some(*c),
        _ => None,
    })
}

#[test]
fn test_print_char_is_declared_before_user_code() {
    let module = lower_source("").unwrap();
    assert_eq!(module.externs.len(), 1);
    assert_eq!(module.externs[0].name, "print_char");
    assert_eq!(module.externs[0].params, vec![IrType::I8]);
    assert_eq!(module.externs[0].ret, IrType::Void);
}

#[test]
fn test_print_newline_emits_single_call() {
    let module = lower_source("print '\\n';").unwrap();
    let main = main_of(&module);

    let calls = extern_calls(&module, main, "print_char");
    assert_eq!(calls.len(), 1);
    assert_eq!(as_constant(main, calls[0][0]), Some(Constant::I8(10)));
}

#[test]
fn test_print_non_char_is_rejected() {
    assert_eq!(
        lower_source("print 42;").unwrap_err(),
        LowerError::UnsupportedPrint { ty: Ty::Int }
    );
}

#[test]
fn test_main_returns_zero() {
    let module = lower_source("print 'x';").unwrap();
    let main = main_of(&module);
    let entry = &main.blocks[BlockId(0)];
    match entry.terminator {
        Some(Terminator::Ret(value)) => {
            assert_eq!(as_constant(main, value), Some(Constant::I32(0)));
        },
        other => panic!("expected ret terminator, got {:?}", other),
    }
}

#[test]
fn test_while_loop_shape() {
    let module = lower_source("var x int = 0; func go() int { var i int = 0; while i < 3 { i = i + 1; } return i; }")
        .unwrap();
    let go = module.get_function("go").unwrap();

    let labels: Vec<&str> = go.blocks.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["entry", "while_entry_1", "while_body_1", "while_end_1"]
    );

    // entry falls into the loop entry
    assert_eq!(
        go.blocks[BlockId(0)].terminator,
        Some(Terminator::Br(BlockId(1)))
    );

    // the loop entry evaluates the condition and branches both ways
    match go.blocks[BlockId(1)].terminator {
        Some(Terminator::CondBr {
            then_block,
            else_block,
            ..
        }) => {
            assert_eq!(then_block, BlockId(2));
            assert_eq!(else_block, BlockId(3));
        },
        other => panic!("expected conditional branch, got {:?}", other),
    }

    // the body jumps back to the entry, not to itself
    assert_eq!(
        go.blocks[BlockId(2)].terminator,
        Some(Terminator::Br(BlockId(1)))
    );
}

#[test]
fn test_fresh_labels_are_unique() {
    let module = lower_source(
        "func f(n int) int { while n < 3 { n = n + 1; } while n < 9 { n = n + 1; } return n; }",
    )
    .unwrap();
    let func = module.get_function("f").unwrap();
    let labels: Vec<&str> = func.blocks.iter().map(|b| b.label.as_str()).collect();
    assert!(labels.contains(&"while_entry_1"));
    assert!(labels.contains(&"while_entry_2"));
    assert_eq!(
        labels.len(),
        labels
            .iter()
            .collect::<std::collections::HashSet<_>>()
            .len()
    );
}

#[test]
fn test_if_else_two_single_call_arms() {
    let module =
        lower_source("var a int = 2; var b int = 3; if a < b { print 'L'; } else { print 'G'; }")
            .unwrap();
    let main = main_of(&module);

    // the entry ends in a conditional branch to two distinct arms
    let (then_block, else_block) = match main.blocks[BlockId(0)].terminator {
        Some(Terminator::CondBr {
            then_block,
            else_block,
            ..
        }) => (then_block, else_block),
        other => panic!("expected conditional branch, got {:?}", other),
    };
    assert_ne!(then_block, else_block);

    for arm in [then_block, else_block] {
        let calls: Vec<_> = main.blocks[arm]
            .instrs
            .iter()
            .filter(|(_, instr)| matches!(instr, Instr::Call { .. }))
            .collect();
        assert_eq!(calls.len(), 1);
    }

    // in total, one call per arm
    assert_eq!(extern_calls(&module, main, "print_char").len(), 2);
}

#[test]
fn test_integer_division_rejected_at_lowering() {
    let source = "func isprime(n int) bool {\n\
                      var f int = 2;\n\
                      while f <= n / 2 {\n\
                          if f * (n / f) == n { return false; }\n\
                          f = f + 1;\n\
                      }\n\
                      return true;\n\
                  }";
    assert_eq!(
        lower_source(source).unwrap_err(),
        LowerError::UnsupportedOp {
            op: "/".to_string(),
            ty: Ty::Int
        }
    );
}

#[test]
fn test_float_division_is_supported() {
    let module = lower_source("var half float = 1.0; half = half / 2.0;").unwrap();
    let main = main_of(&module);
    assert!(main.instructions().any(|(_, instr)| matches!(
        instr,
        Instr::FloatBin {
            op: FloatOp::FDiv,
            ..
        }
    )));
}

#[test]
fn test_int_arithmetic_selects_int_instructions() {
    let module = lower_source("func f(x int) int { return x * x - 1 + 2; }").unwrap();
    let func = module.get_function("f").unwrap();
    let ops: Vec<IntOp> = func
        .instructions()
        .filter_map(|(_, instr)| match instr {
            Instr::IntBin { op, .. } => Some(*op),
            _ => None,
        })
        .collect();
    assert_eq!(ops, vec![IntOp::Mul, IntOp::Sub, IntOp::Add]);
}

#[test]
fn test_comparison_instruction_selection() {
    let module = lower_source(
        "func f(x int, y float) bool { if x < 1 { return y < 2.0; } return x == 0; }",
    )
    .unwrap();
    let func = module.get_function("f").unwrap();

    let icmps: Vec<IntPredicate> = func
        .instructions()
        .filter_map(|(_, instr)| match instr {
            Instr::ICmp { pred, .. } => Some(*pred),
            _ => None,
        })
        .collect();
    let fcmps: Vec<FloatPredicate> = func
        .instructions()
        .filter_map(|(_, instr)| match instr {
            Instr::FCmp { pred, .. } => Some(*pred),
            _ => None,
        })
        .collect();

    assert_eq!(icmps, vec![IntPredicate::Slt, IntPredicate::Eq]);
    assert_eq!(fcmps, vec![FloatPredicate::Olt]);
}

#[test]
fn test_globals_and_constants() {
    let module = lower_source("var x int = 1; const pi float = 3.14; const neg int = -5;").unwrap();

    let x = &module.globals["x"];
    assert_eq!(x.ty, IrType::I32);
    assert_eq!(x.init, Constant::I32(1));
    assert!(!x.constant);

    let pi = &module.globals["pi"];
    assert_eq!(pi.ty, IrType::F32);
    assert!(pi.constant);

    // negated literal initializers fold to constants
    assert_eq!(module.globals["neg"].init, Constant::I32(-5));
}

#[test]
fn test_non_constant_global_initializer_rejected() {
    assert_eq!(
        lower_source("var a int = 1; var b int = a + 1;").unwrap_err(),
        LowerError::NonConstantGlobalInit {
            name: "b".to_string()
        }
    );
}

#[test]
fn test_global_reads_load_through_the_handle() {
    let module = lower_source("var x char = 'a'; print x;").unwrap();
    let main = main_of(&module);
    assert!(main.instructions().any(|(_, instr)| matches!(
        instr,
        Instr::Load {
            ptr: Operand::Global(_),
            ..
        }
    )));
}

#[test]
fn test_global_assignment_stores_through_the_handle() {
    let module = lower_source("var x int = 0; x = 7;").unwrap();
    let main = main_of(&module);
    assert!(main.instructions().any(|(_, instr)| matches!(
        instr,
        Instr::Store {
            ptr: Operand::Global(_),
            ..
        }
    )));
}

#[test]
fn test_local_const_has_no_memory_cell() {
    let module = lower_source("func f() char { const c = 'q'; return c; }").unwrap();
    let func = module.get_function("f").unwrap();
    // one constant, no alloca, no load
    assert!(!func
        .instructions()
        .any(|(_, instr)| matches!(instr, Instr::Alloca(_) | Instr::Load { .. })));
}

#[test]
fn test_uninitialized_local_reads_zero() {
    let module = lower_source("func f() int { var x int; return x; }").unwrap();
    let func = module.get_function("f").unwrap();
    // the slot is initialized with the zero constant before any read
    let entry = &func.blocks[BlockId(0)];
    assert!(matches!(entry.instrs[0].1, Instr::Const(Constant::I32(0))));
    assert!(matches!(entry.instrs[1].1, Instr::Alloca(IrType::I32)));
    assert!(matches!(entry.instrs[2].1, Instr::Store { .. }));
}

#[test]
fn test_function_parameters_get_slots() {
    let module = lower_source("func add(x int, y int) int { return x + y; }").unwrap();
    let func = module.get_function("add").unwrap();
    assert_eq!(func.params, vec![IrType::I32, IrType::I32]);

    let entry = &func.blocks[BlockId(0)];
    assert!(matches!(entry.instrs[0].1, Instr::Alloca(IrType::I32)));
    assert!(matches!(
        entry.instrs[1].1,
        Instr::Store {
            value: Operand::Arg(0),
            ..
        }
    ));
    assert!(matches!(
        entry.instrs[3].1,
        Instr::Store {
            value: Operand::Arg(1),
            ..
        }
    ));
}

#[test]
fn test_call_lowering() {
    let module =
        lower_source("func id(c char) char { return c; } print id('w');").unwrap();
    let main = main_of(&module);

    let call = main
        .instructions()
        .find_map(|(_, instr)| match instr {
            Instr::Call {
                callee: Callee::Func(id),
                args,
            } => Some((*id, args.clone())),
            _ => None,
        })
        .expect("main calls id");

    assert_eq!(module.functions[call.0].name, "id");
    assert_eq!(call.1.len(), 1);
}

#[test]
fn test_recursive_call_resolves_to_self() {
    let module = lower_source(
        "func fact(n int) int { if n < 2 { return 1; } return n * fact(n - 1); }",
    )
    .unwrap();
    let fact = module.get_function("fact").unwrap();
    assert!(fact.instructions().any(|(_, instr)| matches!(
        instr,
        Instr::Call {
            callee: Callee::Func(FuncId(0)),
            ..
        }
    )));
}

#[test]
fn test_unary_minus_on_non_literal_rejected() {
    assert!(matches!(
        lower_source("var x int = 1; var y int = 0; y = -x;").unwrap_err(),
        LowerError::UnsupportedOp { .. }
    ));
}

#[test]
fn test_every_block_is_terminated() {
    let module = lower_source(
        "func f(n int) int {\n\
             while n < 10 { if n == 5 { break; } n = n + 1; }\n\
             if n == 5 { return 0; } else { return n; }\n\
         }",
    )
    .unwrap();
    for func in module.functions.iter() {
        for block in func.blocks.iter() {
            assert!(
                block.terminator.is_some(),
                "open block {} in {}",
                block.label,
                func.name
            );
        }
    }
}

#[test]
fn test_break_branches_to_loop_end() {
    let module =
        lower_source("func f(n int) int { while true { break; } return n; }").unwrap();
    let func = module.get_function("f").unwrap();

    let body = func
        .blocks
        .iter_enumerated()
        .find(|(_, b)| b.label == "while_body_1")
        .map(|(id, _)| id)
        .unwrap();
    let end = func
        .blocks
        .iter_enumerated()
        .find(|(_, b)| b.label == "while_end_1")
        .map(|(id, _)| id)
        .unwrap();

    assert_eq!(func.blocks[body].terminator, Some(Terminator::Br(end)));
}

#[test]
fn test_continue_branches_to_loop_entry() {
    let module = lower_source(
        "func f(n int) int { while n < 3 { n = n + 1; continue; } return n; }",
    )
    .unwrap();
    let func = module.get_function("f").unwrap();

    let body = func
        .blocks
        .iter_enumerated()
        .find(|(_, b)| b.label == "while_body_1")
        .map(|(id, _)| id)
        .unwrap();
    let entry = func
        .blocks
        .iter_enumerated()
        .find(|(_, b)| b.label == "while_entry_1")
        .map(|(id, _)| id)
        .unwrap();

    assert_eq!(func.blocks[body].terminator, Some(Terminator::Br(entry)));
}

#[test]
fn test_display_rendering() {
    let module = lower_source("var x char = 'a'; print x;").unwrap();
    let text = module.to_string();

    assert!(text.contains("declare void @print_char(i8)"));
    assert!(text.contains("@x = internal global i8 97"));
    assert!(text.contains("define i32 @main()"));
    assert!(text.contains("call @print_char("));
    assert!(text.contains("ret "));
}
