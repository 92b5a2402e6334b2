use super::question::Question;
use super::resource::Resource;
use crate::errors::WireError;
use crate::wire;

/// Header OPCODE. Four bits on the wire; compared by that code, so
/// `Other(0)` equals `Query`.
#[derive(Debug, Clone, Copy, Default)]
pub enum OpCode {
    #[default]
    Query,
    IQuery,
    Status,
    Notify,
    Update,
    Other(u8),
}

impl OpCode {
    pub fn to_u8(&self) -> u8 {
        match self {
            OpCode::Query => 0,
            OpCode::IQuery => 1,
            OpCode::Status => 2,
            OpCode::Notify => 4,
            OpCode::Update => 5,
            OpCode::Other(code) => *code & 0x0F,
        }
    }

    pub fn from_u8(code: u8) -> Self {
        match code & 0x0F {
            0 => OpCode::Query,
            1 => OpCode::IQuery,
            2 => OpCode::Status,
            4 => OpCode::Notify,
            5 => OpCode::Update,
            other => OpCode::Other(other),
        }
    }
}

impl PartialEq for OpCode {
    fn eq(&self, other: &Self) -> bool {
        self.to_u8() == other.to_u8()
    }
}

impl Eq for OpCode {}

impl std::hash::Hash for OpCode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_u8().hash(state);
    }
}

/// Header RCODE, compared by its four-bit wire code.
#[derive(Debug, Clone, Copy, Default)]
pub enum ResponseCode {
    #[default]
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    Other(u8),
}

impl ResponseCode {
    pub fn to_u8(&self) -> u8 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NxDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Other(code) => *code & 0x0F,
        }
    }

    pub fn from_u8(code: u8) -> Self {
        match code & 0x0F {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NxDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            other => ResponseCode::Other(other),
        }
    }
}

impl PartialEq for ResponseCode {
    fn eq(&self, other: &Self) -> bool {
        self.to_u8() == other.to_u8()
    }
}

impl Eq for ResponseCode {}

impl std::hash::Hash for ResponseCode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_u8().hash(state);
    }
}

/// A complete DNS message (RFC 1035 §4.1).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub id: u16,
    /// QR bit: set only on replies.
    pub response: bool,
    pub opcode: OpCode,
    pub authoritative: bool,
    /// TC bit: the sender dropped records to fit the transport.
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub response_code: ResponseCode,
    pub questions: Vec<Question>,
    pub answers: Vec<Resource>,
    pub authorities: Vec<Resource>,
    pub additionals: Vec<Resource>,
}

impl Message {
    /// A standard query with a single question and RD set.
    pub fn query(id: u16, question: Question) -> Self {
        Self {
            id,
            recursion_desired: true,
            questions: vec![question],
            ..Default::default()
        }
    }

    /// An empty reply mirroring this message's id, opcode, RD bit and questions.
    pub fn reply(&self) -> Self {
        Self {
            id: self.id,
            response: true,
            opcode: self.opcode,
            recursion_desired: self.recursion_desired,
            questions: self.questions.clone(),
            ..Default::default()
        }
    }

    /// Encodes the message, dropping trailing records that do not fit `limit`
    /// (`None` for no limit).
    pub fn to_wire(&self, limit: Option<usize>) -> Result<Vec<u8>, WireError> {
        wire::encode(self, limit)
    }

    pub fn from_wire(bytes: &[u8]) -> Result<Self, WireError> {
        wire::decode(bytes)
    }

    pub fn resource_count(&self) -> usize {
        self.answers.len() + self.authorities.len() + self.additionals.len()
    }
}
