use crate::store::ApplicationId;

pub const CMD_LIST_CREDENTIALS: u8 = 0x00;
pub const CMD_MAKE_CREDENTIAL:  u8 = 0x01;
pub const CMD_GET_ASSERTION:    u8 = 0x02;
pub const CMD_RESET:            u8 = 0x03;

pub const CLIENT_DATA_SIZE: usize = 20;

pub type ClientData = [u8; CLIENT_DATA_SIZE];

/// First byte of every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok             = 0,
    CommandUnknown = 1,
    CryptoFailed   = 2,
    BadParameter   = 3,
    NotFound       = 4,
    StorageFull    = 5,
    Approval       = 6,
}

impl TryFrom<u8> for Status {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0 => Self::Ok,
            1 => Self::CommandUnknown,
            2 => Self::CryptoFailed,
            3 => Self::BadParameter,
            4 => Self::NotFound,
            5 => Self::StorageFull,
            6 => Self::Approval,
            other => return Err(other),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ListCredentials,
    MakeCredential,
    GetAssertion,
    Reset,
}

impl Command {
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            CMD_LIST_CREDENTIALS => Some(Self::ListCredentials),
            CMD_MAKE_CREDENTIAL  => Some(Self::MakeCredential),
            CMD_GET_ASSERTION    => Some(Self::GetAssertion),
            CMD_RESET            => Some(Self::Reset),
            _ => None,
        }
    }

    pub fn opcode(self) -> u8 {
        match self {
            Self::ListCredentials => CMD_LIST_CREDENTIALS,
            Self::MakeCredential  => CMD_MAKE_CREDENTIAL,
            Self::GetAssertion    => CMD_GET_ASSERTION,
            Self::Reset           => CMD_RESET,
        }
    }
}

/// A command with its arguments fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListCredentials,
    MakeCredential {
        application_id: ApplicationId,
    },
    GetAssertion {
        application_id: ApplicationId,
        client_data:    ClientData,
    },
    Reset,
}
