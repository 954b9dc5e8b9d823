/// AST node types for ECMAScript 5.1.
/// Each node represents a syntactic element of the ES5 grammar.
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct Program {
    pub body: Vec<Statement>,
    pub strict: bool,
    pub hoisting: HoistingScope,
}

/// Declarations of one program or function body that instantiation binds
/// before any statement runs. Nested function bodies are not included.
#[derive(Clone, Debug, Default)]
pub struct HoistingScope {
    pub function_declarations: Vec<Rc<FunctionNode>>,
    /// `var` names in source order, without duplicates.
    pub variable_declarations: Vec<String>,
}

/// How a function body refers to its own `arguments` object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ArgumentsUsage {
    /// Never mentioned; no arguments object is created.
    #[default]
    None,
    /// Only read through member access or `typeof`; no reference survives the call.
    Local,
    /// May be stored, passed, returned or reached through a direct `eval`.
    Escaping,
}

#[derive(Clone, Debug)]
pub struct FunctionNode {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
    pub strict: bool,
    pub hoisting: HoistingScope,
    pub arguments_usage: ArgumentsUsage,
}

#[derive(Clone, Debug)]
pub enum Statement {
    Empty,
    Expression(Expression),
    Block(Vec<Statement>),
    Variable(Vec<VariableDeclarator>),
    If(IfStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    Return(Option<Expression>),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Expression),
    Try(TryStatement),
    Switch(SwitchStatement),
    Labeled(String, Box<Statement>),
    With(Expression, Box<Statement>),
    Debugger,
    FunctionDeclaration(Rc<FunctionNode>),
}

#[derive(Clone, Debug)]
pub struct VariableDeclarator {
    pub name: String,
    pub init: Option<Expression>,
}

#[derive(Clone, Debug)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
}

#[derive(Clone, Debug)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub test: Expression,
}

#[derive(Clone, Debug)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub enum ForInit {
    Variable(Vec<VariableDeclarator>),
    Expression(Expression),
}

#[derive(Clone, Debug)]
pub struct ForInStatement {
    pub left: ForInTarget,
    pub right: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub enum ForInTarget {
    Variable(VariableDeclarator),
    Expression(Expression),
}

#[derive(Clone, Debug)]
pub struct TryStatement {
    pub block: Vec<Statement>,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Vec<Statement>>,
}

#[derive(Clone, Debug)]
pub struct CatchClause {
    pub param: String,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
}

#[derive(Clone, Debug)]
pub struct SwitchCase {
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    This,
    Array(Vec<Option<Expression>>),
    Object(Vec<Property>),
    Function(Rc<FunctionNode>),
    Unary(UnaryOp, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Logical(LogicalOp, Box<Expression>, Box<Expression>),
    Update(UpdateOp, bool, Box<Expression>), // op, prefix, argument
    Assign(AssignOp, Box<Expression>, Box<Expression>),
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
    Call(Box<Expression>, Vec<Expression>),
    New(Box<Expression>, Vec<Expression>),
    Member(Box<Expression>, MemberProperty),
    Typeof(Box<Expression>),
    Void(Box<Expression>),
    Delete(Box<Expression>),
    Sequence(Vec<Expression>),
}

impl Expression {
    pub fn is_identifier(&self, name: &str) -> bool {
        matches!(self, Expression::Identifier(n) if n == name)
    }
}

#[derive(Clone, Debug)]
pub enum MemberProperty {
    Dot(String),
    Computed(Box<Expression>),
}

#[derive(Clone, Debug)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    LShift,
    RShift,
    URShift,
    BitAnd,
    BitOr,
    BitXor,
    In,
    Instanceof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    LShiftAssign,
    RShiftAssign,
    URShiftAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
}

impl AssignOp {
    /// The binary operator a compound assignment applies, `None` for `=`.
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            AssignOp::Assign => return None,
            AssignOp::AddAssign => BinaryOp::Add,
            AssignOp::SubAssign => BinaryOp::Sub,
            AssignOp::MulAssign => BinaryOp::Mul,
            AssignOp::DivAssign => BinaryOp::Div,
            AssignOp::ModAssign => BinaryOp::Mod,
            AssignOp::LShiftAssign => BinaryOp::LShift,
            AssignOp::RShiftAssign => BinaryOp::RShift,
            AssignOp::URShiftAssign => BinaryOp::URShift,
            AssignOp::BitAndAssign => BinaryOp::BitAnd,
            AssignOp::BitOrAssign => BinaryOp::BitOr,
            AssignOp::BitXorAssign => BinaryOp::BitXor,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expression,
}

#[derive(Clone, Debug)]
pub enum PropertyKey {
    Identifier(String),
    String(String),
    Number(f64),
}

impl PropertyKey {
    pub fn to_property_name(&self) -> String {
        match self {
            PropertyKey::Identifier(s) | PropertyKey::String(s) => s.clone(),
            PropertyKey::Number(n) => crate::types::number_ops::to_string(*n),
        }
    }
}
