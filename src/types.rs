use std::fmt;
use std::str::FromStr;

/// Globally unique task identifier.
pub type TaskId = u64;

/// Expression identifier, allocated by the engine on submission.
pub type ExpressionId = u64;

/// Opaque owner identifier supplied by the auth layer.
pub type OwnerId = u64;

/// Binary arithmetic operator carried by a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Sub),
            "*" => Ok(Operator::Mul),
            "/" => Ok(Operator::Div),
            other => Err(format!(
                "invalid operator: {other} (expected one of \"+\", \"-\", \"*\", \"/\")"
            )),
        }
    }
}

/// Lifecycle status of a submitted expression.
///
/// - `Pending`: accepted, no task result has arrived yet.
/// - `Processing`: at least one task result arrived, the root is unresolved.
/// - `Completed` / `Failed`: terminal; never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ExpressionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExpressionStatus::Completed | ExpressionStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExpressionStatus::Pending => "pending",
            ExpressionStatus::Processing => "processing",
            ExpressionStatus::Completed => "completed",
            ExpressionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ExpressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of an expression and its lifecycle record.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub id: ExpressionId,
    pub owner: OwnerId,
    pub text: String,
    pub status: ExpressionStatus,
    pub result: Option<f64>,
    /// Task whose output is the expression's value. `None` for expressions
    /// that never produced a task graph (pure literals).
    pub root_task_id: Option<TaskId>,
    /// Reason recorded when the expression moved to `Failed`.
    pub failure: Option<String>,
}

impl Expression {
    pub fn new(id: ExpressionId, owner: OwnerId, text: impl Into<String>) -> Self {
        Self {
            id,
            owner,
            text: text.into(),
            status: ExpressionStatus::Pending,
            result: None,
            root_task_id: None,
            failure: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
