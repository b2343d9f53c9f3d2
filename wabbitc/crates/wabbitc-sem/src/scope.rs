//! Symbol scopes.
//!
//! Two kinds of scope exist: the single global scope (variables, constants,
//! and all functions) and a stack of block scopes that is live only inside
//! nested blocks. Each nested block pushes a pair of maps, one for vars and
//! one for consts, popped on exit. While a function body is being checked
//! its parameters sit in a flat map overlaid between the block stack and
//! the globals.
//!
//! Lookup order: innermost block outward, then parameters, then globals.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use wabbitc_par::Ty;

use crate::TypeError;

/// A function's checked signature.
#[derive(Clone, Debug, PartialEq)]
pub struct FuncSig {
    pub params: Vec<Ty>,
    pub ret: Ty,
}

/// What a name resolves to: its type and whether it is assignable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolved {
    pub ty: Ty,
    pub is_const: bool,
}

/// The symbol environment of the checker.
#[derive(Default)]
pub struct Scopes {
    global_vars: FxHashMap<String, Ty>,
    global_consts: FxHashMap<String, Ty>,

    /// All functions, in declaration order.
    functions: IndexMap<String, FuncSig>,

    /// Parallel stacks: one vars map and one consts map per open block.
    scope_vars: Vec<FxHashMap<String, Ty>>,
    scope_consts: Vec<FxHashMap<String, Ty>>,

    /// Parameters of the function currently being checked.
    params: FxHashMap<String, Ty>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// True outside of every block, where declarations are globals.
    pub fn at_global_scope(&self) -> bool {
        self.scope_vars.is_empty()
    }

    pub fn enter_block(&mut self) {
        self.scope_vars.push(FxHashMap::default());
        self.scope_consts.push(FxHashMap::default());
    }

    pub fn exit_block(&mut self) {
        self.scope_vars.pop();
        self.scope_consts.pop();
    }

    /// Declares a variable in the innermost scope. Fails if the name is
    /// already taken in that same scope.
    pub fn declare_var(&mut self, name: &str, ty: Ty, line: u32) -> Result<(), TypeError> {
        self.check_free_in_current_scope(name, line)?;
        if self.at_global_scope() {
            self.global_vars.insert(name.to_string(), ty);
        } else if let Some(scope) = self.scope_vars.last_mut() {
            scope.insert(name.to_string(), ty);
        }
        Ok(())
    }

    /// Declares a constant in the innermost scope.
    pub fn declare_const(&mut self, name: &str, ty: Ty, line: u32) -> Result<(), TypeError> {
        self.check_free_in_current_scope(name, line)?;
        if self.at_global_scope() {
            self.global_consts.insert(name.to_string(), ty);
        } else if let Some(scope) = self.scope_consts.last_mut() {
            scope.insert(name.to_string(), ty);
        }
        Ok(())
    }

    /// Declares a function. Functions live in the global scope only.
    pub fn declare_function(
        &mut self,
        name: &str,
        sig: FuncSig,
        line: u32,
    ) -> Result<(), TypeError> {
        if self.functions.contains_key(name)
            || self.global_vars.contains_key(name)
            || self.global_consts.contains_key(name)
        {
            return Err(TypeError::Redeclaration {
                name: name.to_string(),
                line,
            });
        }
        self.functions.insert(name.to_string(), sig);
        Ok(())
    }

    /// Installs a parameter for the function body about to be checked.
    pub fn declare_param(&mut self, name: &str, ty: Ty, line: u32) -> Result<(), TypeError> {
        if self.params.contains_key(name) {
            return Err(TypeError::Redeclaration {
                name: name.to_string(),
                line,
            });
        }
        self.params.insert(name.to_string(), ty);
        Ok(())
    }

    /// Drops the parameter overlay after a function body is checked.
    pub fn clear_params(&mut self) {
        self.params.clear();
    }

    /// Resolves a variable or constant. Constness survives the lookup so
    /// that assignment through a constant binding can be rejected.
    pub fn lookup(&self, name: &str) -> Option<Resolved> {
        for (vars, consts) in self
            .scope_vars
            .iter()
            .zip(self.scope_consts.iter())
            .rev()
        {
            if let Some(&ty) = vars.get(name) {
                return Some(Resolved {
                    ty,
                    is_const: false,
                });
            }
            if let Some(&ty) = consts.get(name) {
                return Some(Resolved { ty, is_const: true });
            }
        }

        if let Some(&ty) = self.params.get(name) {
            return Some(Resolved {
                ty,
                is_const: false,
            });
        }

        if let Some(&ty) = self.global_vars.get(name) {
            return Some(Resolved {
                ty,
                is_const: false,
            });
        }
        if let Some(&ty) = self.global_consts.get(name) {
            return Some(Resolved { ty, is_const: true });
        }

        None
    }

    pub fn lookup_function(&self, name: &str) -> Option<&FuncSig> {
        self.functions.get(name)
    }

    fn check_free_in_current_scope(&self, name: &str, line: u32) -> Result<(), TypeError> {
        let taken = if self.at_global_scope() {
            self.global_vars.contains_key(name)
                || self.global_consts.contains_key(name)
                || self.functions.contains_key(name)
        } else {
            self.scope_vars
                .last()
                .map_or(false, |scope| scope.contains_key(name))
                || self
                    .scope_consts
                    .last()
                    .map_or(false, |scope| scope.contains_key(name))
        };

        if taken {
            Err(TypeError::Redeclaration {
                name: name.to_string(),
                line,
            })
        } else {
            Ok(())
        }
    }
}
