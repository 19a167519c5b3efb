//! Walks a bound body and drives every pointer check.
//!
//! Children are visited before the construct that uses them, so problems
//! inside an operand come out before problems with the operand.

use cinder_ir::{BodyArena, Callable, ExprId, ExprKind, StmtId, StmtKind};
use cinder_types::DefId;

use crate::PointerBinder;

impl PointerBinder<'_> {
    /// Check `callable` in the current scope.
    pub fn walk_callable(&mut self, arena: &BodyArena, callable: &Callable) {
        self.enter_callable(callable.kind, callable.is_unsafe, callable.span);
        for &param in &callable.params {
            self.check_parameter(callable.kind, param);
        }
        if let Some(body) = callable.body {
            self.walk_stmt(arena, body);
        }
        self.exit_scope();
    }

    /// Check a type declaration: pointer-typed fields first, then members.
    pub fn walk_type(&mut self, def: DefId, members: &[(&BodyArena, &Callable)]) {
        let ctx = self.ctx;
        let snapshot = ctx.snapshot();
        let Some(type_def) = snapshot.def(def) else {
            tracing::debug!(def = def.raw(), "unknown type definition");
            return;
        };
        self.enter_type(type_def.is_unsafe, type_def.span);
        for &field in &type_def.fields {
            if let Some(symbol) = snapshot.symbol(field) {
                self.check_pointer_type(symbol.ty(), symbol.span);
            }
        }
        for (arena, callable) in members {
            self.walk_callable(arena, callable);
        }
        self.exit_scope();
    }

    pub fn walk_stmt(&mut self, arena: &BodyArena, id: StmtId) {
        cinder_stack::ensure_sufficient_stack(|| self.walk_stmt_inner(arena, id));
    }

    fn walk_stmt_inner(&mut self, arena: &BodyArena, id: StmtId) {
        let stmt = arena.stmt(id);
        match &stmt.kind {
            StmtKind::Expr(expr) => self.walk_expr(arena, *expr),
            StmtKind::Local { local, init } => {
                let Some(ty) = self.ctx.snapshot().symbol(*local).map(|s| s.ty()) else {
                    return;
                };
                self.check_pointer_type(ty, stmt.span);
                if let Some(init) = *init {
                    self.walk_expr(arena, init);
                    self.convert(arena, init, ty, false);
                }
            }
            StmtKind::Block(stmts) => {
                for &stmt in stmts {
                    self.walk_stmt(arena, stmt);
                }
            }
            StmtKind::Unsafe(body) => {
                self.enter_block(true, stmt.span);
                self.walk_stmt(arena, *body);
                self.exit_scope();
            }
            StmtKind::Pin { declarators, body } => {
                self.begin_pin_block(stmt.span);
                for decl in declarators {
                    if let Some(init) = decl.init {
                        // The pin checks `&x` itself; only its operand is
                        // walked here.
                        match arena.expr(init).kind {
                            ExprKind::AddressOf(operand) => self.walk_expr(arena, operand),
                            _ => self.walk_expr(arena, init),
                        }
                    }
                    self.bind_pin_declarator(arena, decl);
                }
                self.walk_stmt(arena, *body);
                self.end_pin_block();
            }
            StmtKind::Try {
                body,
                catch,
                finally,
            } => {
                self.walk_stmt(arena, *body);
                if let Some(catch) = *catch {
                    self.enter_catch();
                    self.walk_stmt(arena, catch);
                    self.exit_scope();
                }
                if let Some(finally) = *finally {
                    self.enter_finally();
                    self.walk_stmt(arena, finally);
                    self.exit_scope();
                }
            }
            StmtKind::Return(value) => {
                if let Some(value) = *value {
                    self.walk_expr(arena, value);
                }
            }
        }
    }

    pub fn walk_expr(&mut self, arena: &BodyArena, id: ExprId) {
        cinder_stack::ensure_sufficient_stack(|| self.walk_expr_inner(arena, id));
    }

    fn walk_expr_inner(&mut self, arena: &BodyArena, id: ExprId) {
        let expr = arena.expr(id);
        let span = expr.span;
        match &expr.kind {
            ExprKind::Literal(_)
            | ExprKind::Local(_)
            | ExprKind::Parameter(_)
            | ExprKind::This
            | ExprKind::Error => {}
            ExprKind::Field { receiver, .. } => {
                if let Some(receiver) = *receiver {
                    self.walk_expr(arena, receiver);
                }
            }
            ExprKind::AddressOf(operand) => {
                self.walk_expr(arena, *operand);
                self.bind_address_of(arena, *operand, span);
            }
            ExprKind::Deref(operand) => {
                self.walk_expr(arena, *operand);
                self.bind_deref(arena, *operand, span);
            }
            ExprKind::PointerMember { pointer, .. } => {
                self.walk_expr(arena, *pointer);
                self.bind_pointer_member(arena, *pointer, span);
            }
            ExprKind::PointerElement { pointer, indices } => {
                self.walk_expr(arena, *pointer);
                self.walk_exprs(arena, indices);
                self.bind_pointer_element(arena, *pointer, indices, span);
            }
            ExprKind::ArrayElement { array, indices } => {
                self.walk_expr(arena, *array);
                self.walk_exprs(arena, indices);
            }
            ExprKind::Unary { op, operand } => {
                self.walk_expr(arena, *operand);
                self.bind_unary(arena, *op, *operand, span);
            }
            ExprKind::Binary { op, left, right } => {
                self.walk_expr(arena, *left);
                self.walk_expr(arena, *right);
                self.bind_binary(arena, *op, *left, *right, span);
            }
            ExprKind::Assign { op, target, value } => {
                self.walk_expr(arena, *target);
                self.walk_expr(arena, *value);
                self.bind_assign(arena, *op, *target, *value, span);
            }
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.walk_expr(arena, *cond);
                self.walk_expr(arena, *then_expr);
                self.walk_expr(arena, *else_expr);
                if self.ctx.snapshot().pool().is_pointer(expr.ty) {
                    self.convert(arena, *then_expr, expr.ty, false);
                    self.convert(arena, *else_expr, expr.ty, false);
                }
            }
            ExprKind::Cast { operand, target } => {
                self.walk_expr(arena, *operand);
                self.check_pointer_type(*target, span);
                self.convert_types(arena.expr(*operand).ty, *target, true, span);
            }
            ExprKind::Call { args } | ExprKind::New { args } => self.walk_exprs(arena, args),
            ExprKind::NewArray { element, count } => {
                self.check_pointer_type(*element, span);
                self.walk_expr(arena, *count);
            }
            ExprKind::StackAlloc { count, .. } => {
                self.walk_expr(arena, *count);
                self.bind_stackalloc(arena, id);
            }
            ExprKind::SizeOf(ty) => self.bind_sizeof(*ty, span),
            ExprKind::Closure {
                kind,
                captures,
                body,
            } => {
                self.enter_closure(*kind, captures, span);
                self.walk_stmt(arena, *body);
                self.exit_closure();
            }
        }
    }

    fn walk_exprs(&mut self, arena: &BodyArena, ids: &[ExprId]) {
        for &id in ids {
            self.walk_expr(arena, id);
        }
    }
}
