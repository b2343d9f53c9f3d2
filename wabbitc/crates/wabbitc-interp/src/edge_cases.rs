//! Edge case tests for wabbitc-interp.

#[cfg(test)]
mod tests {
    use crate::interpret;
    use wabbitc_lex::scan_tokens;
    use wabbitc_par::parse;
    use wabbitc_sem::check;

    fn run(source: &str) -> String {
        let mut program = parse(scan_tokens(source).unwrap()).unwrap();
        check(&mut program).unwrap();
        let mut out = Vec::new();
        interpret(&program, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_edge_empty_program_produces_no_output() {
        assert_eq!(run(""), "");
    }

    #[test]
    fn test_edge_while_false_never_runs() {
        assert_eq!(run("while false { print 'x'; }"), "");
    }

    #[test]
    fn test_edge_else_if_chain() {
        let source = "var n int = 2;\n\
                      if n == 1 { print 'a'; } else if n == 2 { print 'b'; } else { print 'c'; }";
        assert_eq!(run(source), "b");
    }

    #[test]
    fn test_edge_nan_compares_unequal() {
        let source = "var nan float = 0.0; nan = nan / 0.0;\n\
                      print nan == nan; print nan != nan;";
        assert_eq!(run(source), "false\ntrue\n");
    }

    #[test]
    fn test_edge_float_division_by_zero_is_infinite() {
        assert_eq!(run("print 1.0 / 0.0;"), "inf\n");
    }

    #[test]
    fn test_edge_mutual_recursion_via_self() {
        let source = "func fib(n int) int {\n\
                          if n < 2 { return n; }\n\
                          return fib(n - 1) + fib(n - 2);\n\
                      }\n\
                      print fib(15);";
        assert_eq!(run(source), "610\n");
    }

    #[test]
    fn test_edge_call_arguments_evaluate_left_to_right() {
        let source = "func pair(a char, b char) char { print a; return b; }\n\
                      print pair('x', 'y');";
        assert_eq!(run(source), "xy");
    }

    #[test]
    fn test_edge_break_in_nested_loop_exits_inner_only() {
        let source = "var i int = 0; var count int = 0;\n\
                      while i < 3 {\n\
                          i = i + 1;\n\
                          var j int = 0;\n\
                          while j < 10 {\n\
                              j = j + 1;\n\
                              if j == 2 { break; }\n\
                          }\n\
                          count = count + j;\n\
                      }\n\
                      print count;";
        assert_eq!(run(source), "6\n");
    }

    #[test]
    fn test_edge_return_unwinds_out_of_loop() {
        let source = "func first_above(limit int) int {\n\
                          var n int = 0;\n\
                          while true {\n\
                              if n > limit { return n; }\n\
                              n = n + 1;\n\
                          }\n\
                          return n;\n\
                      }\n\
                      print first_above(41);";
        assert_eq!(run(source), "42\n");
    }

    #[test]
    fn test_edge_wrapping_arithmetic_does_not_panic() {
        assert_eq!(
            run("var big int = 2147483647; print big + 1;"),
            "-2147483648\n"
        );
    }
}
