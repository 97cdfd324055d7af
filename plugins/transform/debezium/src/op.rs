/// Debezium operation code carried in `payload.op`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
    /// Snapshot read.
    Read,
}

impl Operation {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "c" => Some(Operation::Create),
            "u" => Some(Operation::Update),
            "d" => Some(Operation::Delete),
            "r" => Some(Operation::Read),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Operation::Create => "c",
            Operation::Update => "u",
            Operation::Delete => "d",
            Operation::Read => "r",
        }
    }

    /// Envelope field holding the row image for this operation.
    pub fn row_field(self) -> &'static str {
        match self {
            Operation::Delete => "before",
            Operation::Create | Operation::Update | Operation::Read => "after",
        }
    }

    pub fn is_delete(self) -> bool {
        self == Operation::Delete
    }
}
