use crate::error::Span;

/// A parsed CODE program. The envelope flags record whether the source
/// opened with `BEGIN CODE` and closed with `END CODE`; the interpreter
/// refuses to run a program that does not.
#[derive(Debug, Clone)]
pub struct Program {
    pub has_begin: bool,
    pub has_end: bool,
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `INT x, y = 5`. The type keyword is kept verbatim and resolved when
    /// the declaration executes.
    Declaration {
        data_type: String,
        type_span: Span,
        declarators: Vec<Declarator>,
        span: Span,
    },
    /// `x = y = expr`
    Assignment {
        targets: Vec<Name>,
        value: Expr,
        span: Span,
    },
    Display {
        expr: Expr,
        span: Span,
    },
    Scan {
        targets: Vec<Name>,
        span: Span,
    },
    If {
        branches: Vec<ConditionalBlock>,
        else_branch: Option<Vec<Stmt>>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    Switch {
        scrutinee: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Stmt>>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Declaration { span, .. } => span,
            Stmt::Assignment { span, .. } => span,
            Stmt::Display { span, .. } => span,
            Stmt::Scan { span, .. } => span,
            Stmt::If { span, .. } => span,
            Stmt::While { span, .. } => span,
            Stmt::Switch { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Name {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Declarator {
    pub name: Name,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct ConditionalBlock {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub value: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Int,
    Float,
    Char,
    Bool,
    String,
}

#[derive(Debug, Clone)]
pub enum Expr {
    /// Literal source text, quotes included for characters and strings.
    Literal {
        kind: LiteralKind,
        lexeme: String,
        span: Span,
    },
    /// `[c]`
    Escape {
        lexeme: String,
        span: Span,
    },
    /// `$`
    Newline {
        span: Span,
    },
    Variable {
        name: String,
        span: Span,
    },
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Not {
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
    Grouping {
        expr: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Literal { span, .. } => span,
            Expr::Escape { span, .. } => span,
            Expr::Newline { span } => span,
            Expr::Variable { span, .. } => span,
            Expr::Unary { span, .. } => span,
            Expr::Not { span, .. } => span,
            Expr::Binary { span, .. } => span,
            Expr::Grouping { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Multiply,
    Divide,
    Modulo,
    Add,
    Subtract,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
    NotEqual,
    And,
    Or,
    Concat,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Greater => ">",
            BinaryOp::Less => "<",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "<>",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Concat => "&",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Negate,
}
