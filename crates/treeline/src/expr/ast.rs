use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// One field of a record literal. Field ids survive value edits so live-value
/// display can track a field across keystrokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    pub id: NodeId,
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
}

/// A lambda parameter: the binding's own id plus its name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambdaParam {
    pub id: NodeId,
    pub name: String,
}

/// The expression tree the editor edits. Every variant carries its own id;
/// trees are rebuilt per edit by pure transformation, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    /// Placeholder meaning "no value yet".
    Blank { id: NodeId },
    IntLiteral {
        id: NodeId,
        digits: String,
    },
    /// Whole and fraction kept as digit strings so a trailing point ("12.")
    /// survives tokenization without a zero-length fraction token.
    FloatLiteral {
        id: NodeId,
        whole: String,
        fraction: String,
    },
    StringLiteral {
        id: NodeId,
        text: String,
    },
    BoolLiteral {
        id: NodeId,
        value: bool,
    },
    NullLiteral {
        id: NodeId,
    },
    Variable {
        id: NodeId,
        name: String,
    },
    Let {
        id: NodeId,
        lhs_id: NodeId,
        lhs: String,
        rhs: Box<Expr>,
        body: Box<Expr>,
    },
    If {
        id: NodeId,
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    BinOp {
        id: NodeId,
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        on_rail: bool,
    },
    FnCall {
        id: NodeId,
        name: String,
        args: Vec<Expr>,
        on_rail: bool,
    },
    Lambda {
        id: NodeId,
        params: Vec<LambdaParam>,
        body: Box<Expr>,
    },
    FieldAccess {
        id: NodeId,
        target: Box<Expr>,
        field_id: NodeId,
        field: String,
    },
    List {
        id: NodeId,
        items: Vec<Expr>,
    },
    Record {
        id: NodeId,
        fields: Vec<RecordField>,
    },
    /// Segment 0 is the seed; each later segment receives the previous result
    /// through the one `PipeTarget` sentinel in its first argument slot.
    Pipeline {
        id: NodeId,
        segments: Vec<Expr>,
    },
    PipeTarget {
        id: NodeId,
    },
    Constructor {
        id: NodeId,
        name: String,
        args: Vec<Expr>,
    },
    Match {
        id: NodeId,
        subject: Box<Expr>,
        arms: Vec<MatchArm>,
    },
    Flag {
        id: NodeId,
        name: String,
        cond: Box<Expr>,
        case_off: Box<Expr>,
        case_on: Box<Expr>,
    },
    /// An in-progress edit. Remembers the expression it is replacing so the
    /// edit can be aborted back to the original.
    Partial {
        id: NodeId,
        text: String,
        wrapped: Box<Expr>,
    },
    /// In-progress infix entry appended after a complete expression.
    RightPartial {
        id: NodeId,
        text: String,
        wrapped: Box<Expr>,
    },
}

/// Match-arm patterns. Each pattern is tagged with the enclosing match's id
/// as well as its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Pattern {
    Blank {
        match_id: NodeId,
        id: NodeId,
    },
    Variable {
        match_id: NodeId,
        id: NodeId,
        name: String,
    },
    Integer {
        match_id: NodeId,
        id: NodeId,
        digits: String,
    },
    Float {
        match_id: NodeId,
        id: NodeId,
        whole: String,
        fraction: String,
    },
    Bool {
        match_id: NodeId,
        id: NodeId,
        value: bool,
    },
    PString {
        match_id: NodeId,
        id: NodeId,
        text: String,
    },
    Null {
        match_id: NodeId,
        id: NodeId,
    },
    Constructor {
        match_id: NodeId,
        id: NodeId,
        name: String,
        args: Vec<Pattern>,
    },
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Blank { id }
            | Expr::IntLiteral { id, .. }
            | Expr::FloatLiteral { id, .. }
            | Expr::StringLiteral { id, .. }
            | Expr::BoolLiteral { id, .. }
            | Expr::NullLiteral { id }
            | Expr::Variable { id, .. }
            | Expr::Let { id, .. }
            | Expr::If { id, .. }
            | Expr::BinOp { id, .. }
            | Expr::FnCall { id, .. }
            | Expr::Lambda { id, .. }
            | Expr::FieldAccess { id, .. }
            | Expr::List { id, .. }
            | Expr::Record { id, .. }
            | Expr::Pipeline { id, .. }
            | Expr::PipeTarget { id }
            | Expr::Constructor { id, .. }
            | Expr::Match { id, .. }
            | Expr::Flag { id, .. }
            | Expr::Partial { id, .. }
            | Expr::RightPartial { id, .. } => *id,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Expr::Blank { .. })
    }

    /// Blank, or a pipe target (which renders nothing and holds no value).
    pub fn is_blank_like(&self) -> bool {
        matches!(self, Expr::Blank { .. } | Expr::PipeTarget { .. })
    }

    /// Direct expression children, in deterministic render order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Blank { .. }
            | Expr::IntLiteral { .. }
            | Expr::FloatLiteral { .. }
            | Expr::StringLiteral { .. }
            | Expr::BoolLiteral { .. }
            | Expr::NullLiteral { .. }
            | Expr::Variable { .. }
            | Expr::PipeTarget { .. } => Vec::new(),
            Expr::Let { rhs, body, .. } => vec![rhs, body],
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => vec![cond, then_branch, else_branch],
            Expr::BinOp { lhs, rhs, .. } => vec![lhs, rhs],
            Expr::FnCall { args, .. } | Expr::Constructor { args, .. } => args.iter().collect(),
            Expr::Lambda { body, .. } => vec![body],
            Expr::FieldAccess { target, .. } => vec![target],
            Expr::List { items, .. } | Expr::Pipeline { segments: items, .. } => {
                items.iter().collect()
            }
            Expr::Record { fields, .. } => fields.iter().map(|f| &f.value).collect(),
            Expr::Match { subject, arms, .. } => {
                let mut out: Vec<&Expr> = vec![subject];
                out.extend(arms.iter().map(|a| &a.body));
                out
            }
            Expr::Flag {
                cond,
                case_off,
                case_on,
                ..
            } => vec![cond, case_off, case_on],
            Expr::Partial { wrapped, .. } | Expr::RightPartial { wrapped, .. } => vec![wrapped],
        }
    }
}

impl Pattern {
    pub fn id(&self) -> NodeId {
        match self {
            Pattern::Blank { id, .. }
            | Pattern::Variable { id, .. }
            | Pattern::Integer { id, .. }
            | Pattern::Float { id, .. }
            | Pattern::Bool { id, .. }
            | Pattern::PString { id, .. }
            | Pattern::Null { id, .. }
            | Pattern::Constructor { id, .. } => *id,
        }
    }

    pub fn match_id(&self) -> NodeId {
        match self {
            Pattern::Blank { match_id, .. }
            | Pattern::Variable { match_id, .. }
            | Pattern::Integer { match_id, .. }
            | Pattern::Float { match_id, .. }
            | Pattern::Bool { match_id, .. }
            | Pattern::PString { match_id, .. }
            | Pattern::Null { match_id, .. }
            | Pattern::Constructor { match_id, .. } => *match_id,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Pattern::Blank { .. })
    }

    /// The name a variable pattern binds, if any.
    pub fn bound_name(&self) -> Option<&str> {
        match self {
            Pattern::Variable { name, .. } => Some(name),
            _ => None,
        }
    }
}
