//! Recursive descent parser.
//!
//! Grammar, from lowest to highest precedence:
//!
//! ```text
//! program     → declaration* EOF
//! declaration → "fun" function | "var" varDecl | statement
//! statement   → exprStmt | printStmt | block | ifStmt | whileStmt | forStmt
//!             | breakStmt | returnStmt
//! expression  → assignment
//! assignment  → IDENTIFIER "=" assignment | conditional
//! conditional → or ( "?" expression ":" conditional )?
//! or          → and ( "or" and )*
//! and         → equality ( "and" equality )*
//! equality    → comparison ( ( "!=" | "==" ) comparison )*
//! comparison  → term ( ( ">" | ">=" | "<" | "<=" ) term )*
//! term        → factor ( ( "-" | "+" ) factor )*
//! factor      → unary ( ( "/" | "*" ) unary )*
//! unary       → ( "!" | "-" ) unary | call
//! call        → primary ( "(" arguments? ")" )*
//! primary     → "true" | "false" | "nil" | NUMBER | STRING | IDENTIFIER
//!             | "(" expression ")"
//! ```

use std::borrow::Cow;
use std::rc::Rc;

use tracing::debug;

use crate::ast::{BinaryOp, Expr, FunDecl, Literal, LogicalOp, Stmt, UnaryOp};
use crate::diag::{Diagnostic, ParseError};
use crate::interner::Symbol;
use crate::token::{Token, TokenKind};

/// Maximum number of arguments in a call and of parameters in a function declaration.
pub const MAX_ARGS: usize = 255;

type ParseResult<T> = Result<T, Diagnostic>;

/// Parses a whole program.
///
/// Statements that fail to parse are reported and left out of the returned program; the
/// parser then skips to the next statement boundary and carries on, so one call reports
/// every independent error.
pub fn parse(tokens: &[Token]) -> (Vec<Stmt>, Vec<Diagnostic>) {
    let mut parser = Parser::new(tokens);
    let prg = parser.parse_program();
    debug!(
        statements = prg.len(),
        diagnostics = parser.diagnostics.len(),
        "parsed program"
    );
    (prg, parser.diagnostics)
}

struct Parser<'a> {
    tokens: Cow<'a, [Token]>,
    current: usize,

    // Number of loops and functions enclosing the statement being parsed.
    loop_depth: usize,
    fun_depth: usize,

    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Parser<'a> {
        let tokens = match tokens.last() {
            Some(Token {
                kind: TokenKind::Eof,
                ..
            }) => Cow::Borrowed(tokens),
            last => {
                let line = last.map_or(1, |t| t.line);
                let mut owned = tokens.to_vec();
                owned.push(Token::new(TokenKind::Eof, "", line));
                Cow::Owned(owned)
            }
        };
        Parser {
            tokens,
            current: 0,
            loop_depth: 0,
            fun_depth: 0,
            diagnostics: vec![],
        }
    }

    fn parse_program(&mut self) -> Vec<Stmt> {
        let mut prg = vec![];
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                prg.push(stmt);
            }
        }
        prg
    }

    /// Parses a declaration, or reports why it could not and resynchronizes.
    fn declaration(&mut self) -> Option<Stmt> {
        let stmt = match self.peek().kind {
            TokenKind::Fun => {
                self.advance();
                self.fun_decl()
            }
            TokenKind::Var => {
                self.advance();
                self.var_decl()
            }
            _ => self.statement(),
        };
        match stmt {
            Ok(stmt) => Some(stmt),
            Err(diagnostic) => {
                self.diagnostics.push(diagnostic);
                self.synchronize();
                None
            }
        }
    }

    /// Current token follows `fun`.
    fn fun_decl(&mut self) -> ParseResult<Stmt> {
        let name = self.identifier("function name")?;
        self.consume(TokenKind::LeftParen, "'(' after function name")?;
        let mut params = vec![];
        if !self.check(&TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    self.report(ParseError::TooManyParameters(MAX_ARGS));
                }
                params.push(self.identifier("parameter name")?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "')' after parameters")?;
        self.consume(TokenKind::LeftCurly, "'{' before function body")?;
        let body = self.function_body()?;
        Ok(Stmt::Function(Rc::new(FunDecl { name, params, body })))
    }

    /// Current token follows `var`.
    fn var_decl(&mut self) -> ParseResult<Stmt> {
        let name = self.identifier("variable name")?;
        let init = if self.eat(&TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "';' after variable declaration")?;
        Ok(Stmt::Var(name, init))
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::Print => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::Semicolon, "';' after value")?;
                Ok(Stmt::Print(expr))
            }
            TokenKind::LeftCurly => {
                self.advance();
                Ok(Stmt::Block(self.block_body()?))
            }
            TokenKind::If => {
                self.advance();
                self.if_stmt()
            }
            TokenKind::While => {
                self.advance();
                self.while_stmt()
            }
            TokenKind::For => {
                self.advance();
                self.for_stmt()
            }
            TokenKind::Break => {
                self.advance();
                if self.loop_depth == 0 {
                    self.report_previous(ParseError::BreakOutsideLoop);
                }
                self.consume(TokenKind::Semicolon, "';' after 'break'")?;
                Ok(Stmt::Break)
            }
            TokenKind::Return => {
                self.advance();
                if self.fun_depth == 0 {
                    self.report_previous(ParseError::ReturnOutsideFunction);
                }
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.consume(TokenKind::Semicolon, "';' after return value")?;
                Ok(Stmt::Return(value))
            }
            _ => {
                let expr = self.expression()?;
                self.consume(TokenKind::Semicolon, "';' after expression")?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn if_stmt(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "'(' after 'if'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "')' after if condition")?;
        let then_branch = Box::new(self.statement()?);
        // The innermost `if` claims the `else`.
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If(cond, then_branch, else_branch))
    }

    fn while_stmt(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "'(' after 'while'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "')' after condition")?;
        let body = self.loop_body()?;
        Ok(Stmt::While(cond, Box::new(body)))
    }

    /// Desugars `for (init; cond; incr) body` into
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_stmt(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "'(' after 'for'")?;
        let init = match self.peek().kind {
            TokenKind::Semicolon => {
                self.advance();
                None
            }
            TokenKind::Var => {
                self.advance();
                Some(self.var_decl()?)
            }
            _ => {
                let expr = self.expression()?;
                self.consume(TokenKind::Semicolon, "';' after loop initializer")?;
                Some(Stmt::Expr(expr))
            }
        };
        let cond = if self.check(&TokenKind::Semicolon) {
            Expr::Literal(Literal::Bool(true))
        } else {
            self.expression()?
        };
        self.consume(TokenKind::Semicolon, "';' after loop condition")?;
        let incr = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "')' after for clauses")?;

        let mut body = self.loop_body()?;
        if let Some(incr) = incr {
            body = Stmt::Block(vec![body, Stmt::Expr(incr)]);
        }
        let looped = Stmt::While(cond, Box::new(body));
        Ok(match init {
            Some(init) => Stmt::Block(vec![init, looped]),
            None => looped,
        })
    }

    fn loop_body(&mut self) -> ParseResult<Stmt> {
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        body
    }

    /// A `break` cannot leave a function, so loops enclosing the declaration do not count.
    fn function_body(&mut self) -> ParseResult<Vec<Stmt>> {
        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.fun_depth += 1;
        let body = self.block_body();
        self.fun_depth -= 1;
        self.loop_depth = enclosing_loops;
        body
    }

    /// Current token follows `{`.
    fn block_body(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = vec![];
        while !self.check(&TokenKind::RightCurly) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                stmts.push(stmt);
            }
        }
        self.consume(TokenKind::RightCurly, "'}' after block")?;
        Ok(stmts)
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let lhs = self.conditional()?;
        if !self.eat(&TokenKind::Equal) {
            return Ok(lhs);
        }
        let equals = self.current - 1;
        let rhs = self.assignment()?;
        match lhs {
            Expr::Var(name, pos) => Ok(Expr::Assign(name, Box::new(rhs), pos)),
            lhs => {
                // Reported, but the parser is not confused: no need to resynchronize.
                let diagnostic =
                    Diagnostic::at_token(&self.tokens[equals], ParseError::ExpectedLvalue);
                self.diagnostics.push(diagnostic);
                Ok(lhs)
            }
        }
    }

    fn conditional(&mut self) -> ParseResult<Expr> {
        let cond = self.or()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(cond);
        }
        let then_branch = self.expression()?;
        self.consume(
            TokenKind::Colon,
            "':' after then branch of conditional expression",
        )?;
        let else_branch = self.conditional()?;
        Ok(Expr::Conditional(
            Box::new(cond),
            Box::new(then_branch),
            Box::new(else_branch),
        ))
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;
        while self.eat(&TokenKind::Or) {
            expr = Expr::Logical(Box::new(expr), LogicalOp::Or, Box::new(self.and()?));
        }
        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;
        while self.eat(&TokenKind::And) {
            expr = Expr::Logical(Box::new(expr), LogicalOp::And, Box::new(self.equality()?));
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual => BinaryOp::Equal,
                TokenKind::BangEqual => BinaryOp::NotEqual,
                _ => break,
            };
            let pos = self.advance().line;
            expr = Expr::Binary(Box::new(expr), op, Box::new(self.comparison()?), pos);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEqual,
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                _ => break,
            };
            let pos = self.advance().line;
            expr = Expr::Binary(Box::new(expr), op, Box::new(self.term()?), pos);
        }
        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let pos = self.advance().line;
            expr = Expr::Binary(Box::new(expr), op, Box::new(self.factor()?), pos);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            let pos = self.advance().line;
            expr = Expr::Binary(Box::new(expr), op, Box::new(self.unary()?), pos);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.call(),
        };
        let pos = self.advance().line;
        Ok(Expr::Unary(op, Box::new(self.unary()?), pos))
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        while self.eat(&TokenKind::LeftParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    /// Current token follows the `(` of a call.
    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut args = vec![];
        if !self.check(&TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARGS {
                    self.report(ParseError::TooManyArguments(MAX_ARGS));
                }
                args.push(self.expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let pos = self.consume(TokenKind::RightParen, "')' after arguments")?.line;
        Ok(Expr::Call(Box::new(callee), args, pos))
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let literal = match &self.peek().kind {
            TokenKind::False => Literal::Bool(false),
            TokenKind::True => Literal::Bool(true),
            TokenKind::Nil => Literal::Nil,
            TokenKind::Number(n) => Literal::Number(*n),
            TokenKind::String(s) => Literal::Str(s.clone()),
            TokenKind::Identifier(sym) => {
                let sym = sym.clone();
                let pos = self.advance().line;
                return Ok(Expr::Var(sym, pos));
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "')' after expression")?;
                return Ok(Expr::Group(Box::new(expr)));
            }
            TokenKind::EqualEqual | TokenKind::BangEqual => {
                return self.missing_left_operand(Self::equality)
            }
            TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
                return self.missing_left_operand(Self::comparison)
            }
            TokenKind::Plus => return self.missing_left_operand(Self::term),
            TokenKind::Star | TokenKind::Slash => return self.missing_left_operand(Self::factor),
            _ => {
                return Err(Diagnostic::at_token(
                    self.peek(),
                    ParseError::ExpectedPrimary,
                ))
            }
        };
        self.advance();
        Ok(Expr::Literal(literal))
    }

    /// Error production for a binary operator with no left operand: the right operand is
    /// parsed with `operand` so that it does not trigger further errors, then dropped.
    fn missing_left_operand(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let op = self.current;
        self.advance();
        operand(self)?;
        Err(Diagnostic::at_token(
            &self.tokens[op],
            ParseError::MissingLeftOperand,
        ))
    }

    fn identifier(&mut self, what: &'static str) -> ParseResult<Symbol> {
        if let TokenKind::Identifier(sym) = &self.peek().kind {
            let sym = sym.clone();
            self.advance();
            Ok(sym)
        } else {
            Err(Diagnostic::at_token(self.peek(), ParseError::Expected(what)))
        }
    }

    /// Discards tokens until the start of the next statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon || self.peek().kind.starts_statement() {
                return;
            }
            self.advance();
        }
    }

    /// Records an error that does not need resynchronization.
    fn report(&mut self, error: ParseError) {
        let diagnostic = Diagnostic::at_token(self.peek(), error);
        self.diagnostics.push(diagnostic);
    }

    fn report_previous(&mut self, error: ParseError) {
        let diagnostic = Diagnostic::at_token(self.previous(), error);
        self.diagnostics.push(diagnostic);
    }

    fn consume(&mut self, expected: TokenKind, what: &'static str) -> ParseResult<&Token> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(Diagnostic::at_token(self.peek(), ParseError::Expected(what)))
        }
    }

    /// Consumes the current token if it is `kind`.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().kind == *kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::Context;
    use crate::diag::Diagnostics;
    use crate::scanner::scan;
    use pretty_assertions::assert_eq;

    fn parse_expr_with_ctx(ctx: &Context, input: &str) -> Result<Expr, Diagnostic> {
        let (tokens, scan_diagnostics) = scan(input, ctx);
        assert!(scan_diagnostics.is_empty());
        let mut parser = Parser::new(&tokens);
        let expr = parser.expression()?;
        match parser.diagnostics.pop() {
            Some(d) => Err(d),
            None => Ok(expr),
        }
    }

    fn parse_expr(input: &str) -> Result<Expr, Diagnostic> {
        parse_expr_with_ctx(&Context::new(), input)
    }

    fn parse_prg_with_ctx(ctx: &Context, input: &str) -> Result<Vec<Stmt>, Diagnostics> {
        let (tokens, scan_diagnostics) = scan(input, ctx);
        assert!(scan_diagnostics.is_empty());
        let (prg, diagnostics) = parse(&tokens);
        if diagnostics.is_empty() {
            Ok(prg)
        } else {
            Err(Diagnostics(diagnostics))
        }
    }

    fn parse_prg(input: &str) -> Result<Vec<Stmt>, Diagnostics> {
        parse_prg_with_ctx(&Context::new(), input)
    }

    fn errors(input: &str) -> Vec<ParseError> {
        let (tokens, _) = scan(input, &Context::new());
        parse(&tokens).1.into_iter().map(|d| d.error).collect()
    }

    fn num(n: f64) -> Expr {
        Expr::Literal(Literal::Number(n))
    }

    fn boolean(b: bool) -> Expr {
        Expr::Literal(Literal::Bool(b))
    }

    fn binary(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
        Expr::Binary(Box::new(lhs), op, Box::new(rhs), 1)
    }

    #[test]
    fn number() -> Result<(), Diagnostic> {
        assert_eq!(parse_expr("42")?, num(42.0));
        Ok(())
    }

    #[test]
    fn literals() -> Result<(), Diagnostic> {
        assert_eq!(parse_expr("true")?, boolean(true));
        assert_eq!(parse_expr("false")?, boolean(false));
        assert_eq!(parse_expr("nil")?, Expr::Literal(Literal::Nil));
        assert_eq!(
            parse_expr("\"hi\"")?,
            Expr::Literal(Literal::Str(Rc::from("hi")))
        );
        Ok(())
    }

    #[test]
    fn unary_operators_nest() -> Result<(), Diagnostic> {
        assert_eq!(
            parse_expr("!-42")?,
            Expr::Unary(
                UnaryOp::Not,
                Box::new(Expr::Unary(UnaryOp::Neg, Box::new(num(42.0)), 1)),
                1
            )
        );
        Ok(())
    }

    #[test]
    fn addition_is_left_associative() -> Result<(), Diagnostic> {
        assert_eq!(
            parse_expr("1 + 2 - 3")?,
            binary(
                binary(num(1.0), BinaryOp::Add, num(2.0)),
                BinaryOp::Sub,
                num(3.0)
            )
        );
        Ok(())
    }

    #[test]
    fn factors_have_precedence_over_terms() -> Result<(), Diagnostic> {
        assert_eq!(
            parse_expr("1 + 2 * 3")?,
            binary(
                num(1.0),
                BinaryOp::Add,
                binary(num(2.0), BinaryOp::Mul, num(3.0))
            )
        );
        Ok(())
    }

    #[test]
    fn grouping_takes_precedence() -> Result<(), Diagnostic> {
        assert_eq!(
            parse_expr("1 / (2 - 3)")?,
            binary(
                num(1.0),
                BinaryOp::Div,
                Expr::Group(Box::new(binary(num(2.0), BinaryOp::Sub, num(3.0))))
            )
        );
        Ok(())
    }

    #[test]
    fn comparison_binds_tighter_than_equality() -> Result<(), Diagnostic> {
        assert_eq!(
            parse_expr("1 <= 2 == 3 >= 4")?,
            binary(
                binary(num(1.0), BinaryOp::LessEqual, num(2.0)),
                BinaryOp::Equal,
                binary(num(3.0), BinaryOp::GreaterEqual, num(4.0))
            )
        );
        Ok(())
    }

    #[test]
    fn and_binds_tighter_than_or() -> Result<(), Diagnostic> {
        assert_eq!(
            parse_expr("true or false and nil")?,
            Expr::Logical(
                Box::new(boolean(true)),
                LogicalOp::Or,
                Box::new(Expr::Logical(
                    Box::new(boolean(false)),
                    LogicalOp::And,
                    Box::new(Expr::Literal(Literal::Nil))
                ))
            )
        );
        Ok(())
    }

    #[test]
    fn conditional_is_right_associative() -> Result<(), Diagnostic> {
        assert_eq!(
            parse_expr("true ? 1 : false ? 2 : 3")?,
            Expr::Conditional(
                Box::new(boolean(true)),
                Box::new(num(1.0)),
                Box::new(Expr::Conditional(
                    Box::new(boolean(false)),
                    Box::new(num(2.0)),
                    Box::new(num(3.0))
                ))
            )
        );
        Ok(())
    }

    #[test]
    fn missing_right_paren() {
        match parse_expr("(1") {
            Err(Diagnostic { pos, location, error })
                if pos == 1
                    && location == crate::diag::Location::End
                    && error == ParseError::Expected("')' after expression") => {}
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn assignment_is_right_associative() -> Result<(), Diagnostic> {
        let ctx = Context::new();
        assert_eq!(
            parse_expr_with_ctx(&ctx, "a = b = 1")?,
            Expr::Assign(
                ctx.symbol("a"),
                Box::new(Expr::Assign(ctx.symbol("b"), Box::new(num(1.0)), 1)),
                1
            )
        );
        Ok(())
    }

    #[test]
    fn bad_assignment_target() {
        match parse_expr("(a) = 1") {
            Err(Diagnostic { error, .. }) if error == ParseError::ExpectedLvalue => {}
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn chained_calls() -> Result<(), Diagnostic> {
        let ctx = Context::new();
        assert_eq!(
            parse_expr_with_ctx(&ctx, "f(1)(2, true)")?,
            Expr::Call(
                Box::new(Expr::Call(
                    Box::new(Expr::Var(ctx.symbol("f"), 1)),
                    vec![num(1.0)],
                    1
                )),
                vec![num(2.0), boolean(true)],
                1
            )
        );
        Ok(())
    }

    #[test]
    fn call_arguments_may_be_any_expression() -> Result<(), Diagnostic> {
        let ctx = Context::new();
        assert_eq!(
            parse_expr_with_ctx(&ctx, "f(a or b)")?,
            Expr::Call(
                Box::new(Expr::Var(ctx.symbol("f"), 1)),
                vec![Expr::Logical(
                    Box::new(Expr::Var(ctx.symbol("a"), 1)),
                    LogicalOp::Or,
                    Box::new(Expr::Var(ctx.symbol("b"), 1))
                )],
                1
            )
        );
        Ok(())
    }

    #[test]
    fn expr_and_print_stmts() -> Result<(), Diagnostics> {
        assert_eq!(
            parse_prg("1; print 1+2;")?,
            vec![
                Stmt::Expr(num(1.0)),
                Stmt::Print(binary(num(1.0), BinaryOp::Add, num(2.0))),
            ]
        );
        Ok(())
    }

    #[test]
    fn var_decl() -> Result<(), Diagnostics> {
        let ctx = Context::new();
        assert_eq!(
            parse_prg_with_ctx(&ctx, "var foo; var bar = 2;")?,
            vec![
                Stmt::Var(ctx.symbol("foo"), None),
                Stmt::Var(ctx.symbol("bar"), Some(num(2.0))),
            ]
        );
        Ok(())
    }

    #[test]
    fn blocks() -> Result<(), Diagnostics> {
        assert_eq!(
            parse_prg("{ } { 1; 2; }")?,
            vec![
                Stmt::Block(vec![]),
                Stmt::Block(vec![Stmt::Expr(num(1.0)), Stmt::Expr(num(2.0))]),
            ]
        );
        Ok(())
    }

    #[test]
    fn if_without_else() -> Result<(), Diagnostics> {
        assert_eq!(
            parse_prg("if (true) 1; 2;")?,
            vec![
                Stmt::If(boolean(true), Box::new(Stmt::Expr(num(1.0))), None),
                Stmt::Expr(num(2.0)),
            ]
        );
        Ok(())
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() -> Result<(), Diagnostics> {
        assert_eq!(
            parse_prg("if (true) if (false) 1; else 2;")?,
            vec![Stmt::If(
                boolean(true),
                Box::new(Stmt::If(
                    boolean(false),
                    Box::new(Stmt::Expr(num(1.0))),
                    Some(Box::new(Stmt::Expr(num(2.0))))
                )),
                None
            )]
        );
        Ok(())
    }

    #[test]
    fn while_stmt() -> Result<(), Diagnostics> {
        assert_eq!(
            parse_prg("while (true) break;")?,
            vec![Stmt::While(boolean(true), Box::new(Stmt::Break))]
        );
        Ok(())
    }

    #[test]
    fn for_is_desugared_into_while() -> Result<(), Diagnostics> {
        let ctx = Context::new();
        let i = ctx.symbol("i");
        assert_eq!(
            parse_prg_with_ctx(&ctx, "for (var i = 0; i < 3; i = i + 1) print i;")?,
            vec![Stmt::Block(vec![
                Stmt::Var(i.clone(), Some(num(0.0))),
                Stmt::While(
                    binary(Expr::Var(i.clone(), 1), BinaryOp::Less, num(3.0)),
                    Box::new(Stmt::Block(vec![
                        Stmt::Print(Expr::Var(i.clone(), 1)),
                        Stmt::Expr(Expr::Assign(
                            i.clone(),
                            Box::new(binary(Expr::Var(i, 1), BinaryOp::Add, num(1.0))),
                            1
                        )),
                    ]))
                ),
            ])]
        );
        Ok(())
    }

    #[test]
    fn empty_for_loops_forever() -> Result<(), Diagnostics> {
        assert_eq!(
            parse_prg("for (;;) break;")?,
            vec![Stmt::While(boolean(true), Box::new(Stmt::Break))]
        );
        Ok(())
    }

    #[test]
    fn fun_decl() -> Result<(), Diagnostics> {
        let ctx = Context::new();
        assert_eq!(
            parse_prg_with_ctx(&ctx, "fun add(a, b) { return a + b; }")?,
            vec![Stmt::Function(Rc::new(FunDecl {
                name: ctx.symbol("add"),
                params: vec![ctx.symbol("a"), ctx.symbol("b")],
                body: vec![Stmt::Return(Some(binary(
                    Expr::Var(ctx.symbol("a"), 1),
                    BinaryOp::Add,
                    Expr::Var(ctx.symbol("b"), 1)
                )))],
            }))]
        );
        Ok(())
    }

    #[test]
    fn bare_return() -> Result<(), Diagnostics> {
        let ctx = Context::new();
        assert_eq!(
            parse_prg_with_ctx(&ctx, "fun f() { return; }")?,
            vec![Stmt::Function(Rc::new(FunDecl {
                name: ctx.symbol("f"),
                params: vec![],
                body: vec![Stmt::Return(None)],
            }))]
        );
        Ok(())
    }

    #[test]
    fn break_outside_loop() {
        assert_eq!(errors("break;"), vec![ParseError::BreakOutsideLoop]);
    }

    #[test]
    fn break_cannot_leave_function() {
        assert_eq!(
            errors("while (true) { fun f() { break; } }"),
            vec![ParseError::BreakOutsideLoop]
        );
    }

    #[test]
    fn break_after_inner_loop_is_still_in_outer_loop() {
        assert!(errors("while (true) { while (false) {} break; }").is_empty());
    }

    #[test]
    fn return_outside_function() {
        assert_eq!(errors("return 1;"), vec![ParseError::ReturnOutsideFunction]);
    }

    #[test]
    fn two_independent_errors_are_reported() {
        assert_eq!(
            errors("print ; var = 1;"),
            vec![
                ParseError::ExpectedPrimary,
                ParseError::Expected("variable name"),
            ]
        );
    }

    #[test]
    fn failed_statement_is_dropped_and_parsing_resumes() {
        let ctx = Context::new();
        let (tokens, _) = scan("var 1; print 2;", &ctx);
        let (prg, diagnostics) = parse(&tokens);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(prg, vec![Stmt::Print(num(2.0))]);
    }

    #[test]
    fn synchronize_stops_before_statement_keyword() {
        let (tokens, _) = scan("1 + ) print 2;", &Context::new());
        let (prg, diagnostics) = parse(&tokens);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(prg, vec![Stmt::Print(num(2.0))]);
    }

    #[test]
    fn missing_left_operand_is_reported_once() {
        assert_eq!(errors("* 2 + 3;"), vec![ParseError::MissingLeftOperand]);
        assert_eq!(errors("== 1;"), vec![ParseError::MissingLeftOperand]);
    }

    #[test]
    fn error_at_end_of_input() {
        let (tokens, _) = scan("print 1", &Context::new());
        let (_, diagnostics) = parse(&tokens);
        assert_eq!(
            diagnostics.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
            vec!["[line 1] Error at end: expected ';' after value"]
        );
    }

    #[test]
    fn too_many_arguments() {
        let args = vec!["1"; MAX_ARGS + 1].join(", ");
        assert_eq!(
            errors(&format!("f({});", args)),
            vec![ParseError::TooManyArguments(MAX_ARGS)]
        );
    }

    #[test]
    fn max_args_and_params_are_accepted() {
        let args = vec!["1"; MAX_ARGS].join(", ");
        assert!(errors(&format!("f({});", args)).is_empty());

        let params = (0..MAX_ARGS)
            .map(|i| format!("p{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        assert!(errors(&format!("fun f({}) {{}}", params)).is_empty());
    }

    #[test]
    fn too_many_parameters() {
        let params = (0..=MAX_ARGS)
            .map(|i| format!("p{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        assert_eq!(
            errors(&format!("fun f({}) {{}}", params)),
            vec![ParseError::TooManyParameters(MAX_ARGS)]
        );
    }

    #[test]
    fn reserved_words_are_not_expressions() {
        assert_eq!(errors("this;"), vec![ParseError::ExpectedPrimary]);
    }

    #[test]
    fn tokens_without_eof_are_accepted() -> Result<(), Diagnostics> {
        let ctx = Context::new();
        let (mut tokens, _) = scan("print 1;", &ctx);
        tokens.pop();
        let (prg, diagnostics) = parse(&tokens);
        assert!(diagnostics.is_empty());
        assert_eq!(prg, vec![Stmt::Print(num(1.0))]);
        Ok(())
    }
}
