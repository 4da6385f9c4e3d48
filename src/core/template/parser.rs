//! Recursive-descent parser for fragment code.
//!
//! Control fragments of a template are tokenized into one stream, with literal
//! text and bare expressions interleaved as `Emit` tokens. Parsing that stream
//! as a whole lets a block opened in one fragment close in a later one.

use super::lexer::{near, Punct, Token, TokenKind};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Negate,
    Plus,
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    LooseEq,
    LooseNe,
    StrictEq,
    StrictNe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Literal),
    Ident(String),
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    Call {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        optional: bool,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
    Emit(usize),
    Expr(Expr),
    Declare {
        name: String,
        init: Option<Expr>,
    },
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    ForOf {
        binding: String,
        iterable: Expr,
        body: Box<Stmt>,
    },
    ForIn {
        binding: String,
        object: Expr,
        body: Box<Stmt>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    Break,
    Block(Vec<Stmt>),
    Empty,
}

const RESERVED: &[&str] = &[
    "if", "else", "for", "switch", "case", "default", "break", "let", "var", "const", "of", "in",
    "typeof",
];

/// Recursive descents the parser may stack up.
const MAX_NESTING: usize = 32;
/// Height of a syntax tree, including operator and member chains built in loops.
const MAX_HEIGHT: usize = 128;

pub(crate) struct Parser<'s> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'s str,
    breakable_depth: usize,
    nesting: usize,
    height: usize,
}

impl<'s> Parser<'s> {
    pub(crate) fn new(mut tokens: Vec<Token>, source: &'s str) -> Self {
        let end = source.len();
        tokens.push(Token {
            kind: TokenKind::Eof,
            offset: end,
        });
        Self {
            tokens,
            pos: 0,
            source,
            breakable_depth: 0,
            nesting: 0,
            height: 0,
        }
    }

    /// Parse a whole template program.
    pub(crate) fn parse_program(mut self) -> Result<Vec<Stmt>> {
        let mut body = Vec::new();
        while !self.at_eof() {
            if self.check_punct(Punct::RBrace) {
                return Err(self.error_here("unmatched '}'"));
            }
            body.push(self.statement()?);
        }
        Ok(body)
    }

    /// Parse a single bare expression; the whole token stream must be consumed.
    pub(crate) fn parse_standalone_expression(mut self) -> Result<Expr> {
        if self.at_eof() {
            return Err(self.error_here("empty expression"));
        }
        let expr = self.expression()?;
        if !self.at_eof() {
            return Err(self.error_here("unexpected token after expression"));
        }
        Ok(expr)
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn check_punct(&self, punct: Punct) -> bool {
        matches!(&self.peek().kind, TokenKind::Punct(p) if *p == punct)
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(name) if name == keyword)
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.check_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: Punct) -> Result<()> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.error_here(&format!("expected '{}'", punct.as_str())))
        }
    }

    fn expect_binding(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) if !RESERVED.contains(&name.as_str()) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_here("expected identifier")),
        }
    }

    fn descend(&mut self) -> Result<()> {
        if self.nesting >= MAX_NESTING || self.height >= MAX_HEIGHT {
            return Err(self.error_here("nesting too deep"));
        }
        self.nesting += 1;
        self.height += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.nesting -= 1;
        self.height -= 1;
    }

    /// One more level on the left spine of a chain; the caller releases `levels` when done.
    fn extend(&mut self, levels: &mut usize) -> Result<()> {
        if self.height >= MAX_HEIGHT {
            return Err(self.error_here("nesting too deep"));
        }
        self.height += 1;
        *levels += 1;
        Ok(())
    }

    fn error_here(&self, problem: &str) -> Error {
        let token = self.peek();
        let found = match &token.kind {
            TokenKind::Eof => "end of template".to_string(),
            TokenKind::Emit(_) => "template text".to_string(),
            TokenKind::Ident(name) => format!("'{}'", name),
            TokenKind::Number(n) => format!("'{}'", n),
            TokenKind::Str(s) => format!("'{}'", s),
            TokenKind::Punct(p) => format!("'{}'", p.as_str()),
        };
        Error::template_syntax(
            token.offset,
            format!("{}, found {}", problem, found),
            near(self.source, token.offset),
        )
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn statement(&mut self) -> Result<Stmt> {
        self.descend()?;
        let stmt = self.statement_kind();
        self.ascend();
        stmt
    }

    fn statement_kind(&mut self) -> Result<Stmt> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Emit(idx) => {
                self.advance();
                Ok(Stmt::Emit(*idx))
            }
            TokenKind::Punct(Punct::LBrace) => self.block(),
            TokenKind::Punct(Punct::Semi) => {
                self.advance();
                Ok(Stmt::Empty)
            }
            TokenKind::Ident(word) => match word.as_str() {
                "if" => self.if_statement(),
                "for" => self.for_statement(),
                "switch" => self.switch_statement(),
                "break" => {
                    if self.breakable_depth == 0 {
                        return Err(self.error_here("'break' outside of a loop or switch"));
                    }
                    self.advance();
                    self.eat_punct(Punct::Semi);
                    Ok(Stmt::Break)
                }
                "let" | "var" | "const" => self.declaration(),
                "else" => Err(self.error_here("'else' without a matching 'if'")),
                "case" | "default" => Err(self.error_here("'case' outside of a switch")),
                _ => self.expression_statement(),
            },
            _ => self.expression_statement(),
        }
    }

    fn block(&mut self) -> Result<Stmt> {
        self.expect_punct(Punct::LBrace)?;
        let mut body = Vec::new();
        loop {
            if self.eat_punct(Punct::RBrace) {
                return Ok(Stmt::Block(body));
            }
            if self.at_eof() {
                return Err(self.error_here("unclosed '{'"));
            }
            body.push(self.statement()?);
        }
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.advance();
        self.expect_punct(Punct::LParen)?;
        let test = self.expression()?;
        self.expect_punct(Punct::RParen)?;
        let consequent = Box::new(self.statement()?);
        let alternate = if self.eat_keyword("else") {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            test,
            consequent,
            alternate,
        })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.advance();
        self.expect_punct(Punct::LParen)?;
        if self.check_keyword("let") || self.check_keyword("var") || self.check_keyword("const") {
            self.advance();
        }
        let binding = self.expect_binding()?;
        let is_of = if self.eat_keyword("of") {
            true
        } else if self.eat_keyword("in") {
            false
        } else {
            return Err(self.error_here("expected 'of' or 'in'"));
        };
        let subject = self.expression()?;
        self.expect_punct(Punct::RParen)?;

        self.breakable_depth += 1;
        let body = self.statement();
        self.breakable_depth -= 1;
        let body = Box::new(body?);

        Ok(if is_of {
            Stmt::ForOf {
                binding,
                iterable: subject,
                body,
            }
        } else {
            Stmt::ForIn {
                binding,
                object: subject,
                body,
            }
        })
    }

    fn switch_statement(&mut self) -> Result<Stmt> {
        self.advance();
        self.expect_punct(Punct::LParen)?;
        let discriminant = self.expression()?;
        self.expect_punct(Punct::RParen)?;
        self.expect_punct(Punct::LBrace)?;

        self.breakable_depth += 1;
        let cases = self.switch_cases();
        self.breakable_depth -= 1;

        Ok(Stmt::Switch {
            discriminant,
            cases: cases?,
        })
    }

    fn switch_cases(&mut self) -> Result<Vec<SwitchCase>> {
        let mut cases: Vec<SwitchCase> = Vec::new();
        let mut seen_default = false;
        loop {
            if self.eat_punct(Punct::RBrace) {
                return Ok(cases);
            }
            if self.at_eof() {
                return Err(self.error_here("unclosed switch body"));
            }
            if self.eat_keyword("case") {
                let test = self.expression()?;
                self.expect_punct(Punct::Colon)?;
                cases.push(SwitchCase {
                    test: Some(test),
                    body: Vec::new(),
                });
                continue;
            }
            if self.check_keyword("default") {
                if seen_default {
                    return Err(self.error_here("more than one 'default' clause"));
                }
                self.advance();
                self.expect_punct(Punct::Colon)?;
                seen_default = true;
                cases.push(SwitchCase {
                    test: None,
                    body: Vec::new(),
                });
                continue;
            }
            let stmt = self.statement()?;
            // Text between `switch (x) {` and the first `case` is never rendered.
            if let Some(case) = cases.last_mut() {
                case.body.push(stmt);
            }
        }
    }

    fn declaration(&mut self) -> Result<Stmt> {
        self.advance();
        let name = self.expect_binding()?;
        let init = if self.eat_punct(Punct::Assign) {
            Some(self.expression()?)
        } else {
            None
        };
        self.eat_punct(Punct::Semi);
        Ok(Stmt::Declare { name, init })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr = self.expression()?;
        if self.check_punct(Punct::Assign) {
            return Err(self.error_here("assignment is not supported, use 'let'"));
        }
        self.eat_punct(Punct::Semi);
        Ok(Stmt::Expr(expr))
    }

    // ------------------------------------------------------------------
    // Expressions, lowest precedence first
    // ------------------------------------------------------------------

    fn expression(&mut self) -> Result<Expr> {
        self.descend()?;
        let expr = self.conditional();
        self.ascend();
        expr
    }

    fn conditional(&mut self) -> Result<Expr> {
        let test = self.logical_or()?;
        if !self.eat_punct(Punct::Question) {
            return Ok(test);
        }
        let consequent = self.expression()?;
        self.expect_punct(Punct::Colon)?;
        let alternate = self.expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut left = self.logical_and()?;
        let mut levels = 0;
        loop {
            let op = if self.eat_punct(Punct::Or) {
                LogicalOp::Or
            } else if self.eat_punct(Punct::Nullish) {
                LogicalOp::Nullish
            } else {
                self.height -= levels;
                return Ok(left);
            };
            self.extend(&mut levels)?;
            let right = self.logical_and()?;
            left = Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut left = self.equality()?;
        let mut levels = 0;
        while self.eat_punct(Punct::And) {
            self.extend(&mut levels)?;
            let right = self.equality()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.height -= levels;
        Ok(left)
    }

    fn binary_level(
        &mut self,
        ops: &[(Punct, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut left = next(self)?;
        let mut levels = 0;
        'outer: loop {
            for (punct, op) in ops {
                if self.eat_punct(*punct) {
                    self.extend(&mut levels)?;
                    let right = next(self)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            self.height -= levels;
            return Ok(left);
        }
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                (Punct::StrictEq, BinaryOp::StrictEq),
                (Punct::StrictNe, BinaryOp::StrictNe),
                (Punct::LooseEq, BinaryOp::LooseEq),
                (Punct::LooseNe, BinaryOp::LooseNe),
            ],
            Self::relational,
        )
    }

    fn relational(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                (Punct::Le, BinaryOp::Le),
                (Punct::Ge, BinaryOp::Ge),
                (Punct::Lt, BinaryOp::Lt),
                (Punct::Gt, BinaryOp::Gt),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr> {
        self.binary_level(
            &[(Punct::Plus, BinaryOp::Add), (Punct::Minus, BinaryOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                (Punct::Star, BinaryOp::Mul),
                (Punct::Slash, BinaryOp::Div),
                (Punct::Percent, BinaryOp::Rem),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = if self.eat_punct(Punct::Bang) {
            UnaryOp::Not
        } else if self.eat_punct(Punct::Minus) {
            UnaryOp::Negate
        } else if self.eat_punct(Punct::Plus) {
            UnaryOp::Plus
        } else if self.eat_keyword("typeof") {
            UnaryOp::TypeOf
        } else {
            return self.postfix();
        };
        self.descend()?;
        let operand = self.unary();
        self.ascend();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        let mut levels = 0;
        loop {
            let chained = self.check_punct(Punct::Dot)
                || self.check_punct(Punct::OptionalDot)
                || self.check_punct(Punct::LBracket);
            if chained {
                self.extend(&mut levels)?;
            }
            if self.check_punct(Punct::Dot) || self.check_punct(Punct::OptionalDot) {
                let optional = self.check_punct(Punct::OptionalDot);
                self.advance();
                if optional && self.check_punct(Punct::LBracket) {
                    expr = self.index(expr, true)?;
                    continue;
                }
                let property = match &self.peek().kind {
                    TokenKind::Ident(name) => name.clone(),
                    _ => return Err(self.error_here("expected property name")),
                };
                self.advance();
                if self.eat_punct(Punct::LParen) {
                    let args = self.arguments()?;
                    expr = Expr::Call {
                        object: Box::new(expr),
                        method: property,
                        args,
                        optional,
                    };
                } else {
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        optional,
                    };
                }
            } else if self.check_punct(Punct::LBracket) {
                expr = self.index(expr, false)?;
            } else if self.check_punct(Punct::LParen) {
                return Err(self.error_here("only method calls are supported"));
            } else {
                self.height -= levels;
                return Ok(expr);
            }
        }
    }

    fn index(&mut self, object: Expr, optional: bool) -> Result<Expr> {
        self.expect_punct(Punct::LBracket)?;
        let index = self.expression()?;
        self.expect_punct(Punct::RBracket)?;
        Ok(Expr::Index {
            object: Box::new(object),
            index: Box::new(index),
            optional,
        })
    }

    fn arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat_punct(Punct::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat_punct(Punct::RParen) {
                return Ok(args);
            }
            self.expect_punct(Punct::Comma)?;
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Number(n)))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::Str(s)))
            }
            TokenKind::Punct(Punct::LParen) => {
                self.advance();
                let expr = self.expression()?;
                self.expect_punct(Punct::RParen)?;
                Ok(expr)
            }
            TokenKind::Ident(name) => {
                let literal = match name.as_str() {
                    "true" => Some(Literal::Bool(true)),
                    "false" => Some(Literal::Bool(false)),
                    "null" => Some(Literal::Null),
                    "undefined" => Some(Literal::Undefined),
                    _ => None,
                };
                if let Some(literal) = literal {
                    self.advance();
                    return Ok(Expr::Literal(literal));
                }
                if RESERVED.contains(&name.as_str()) {
                    return Err(self.error_here("unexpected keyword"));
                }
                self.advance();
                Ok(Expr::Ident(name))
            }
            _ => Err(self.error_here("expected expression")),
        }
    }
}
