use crate::channel::{ByteChannel, ChannelError};

use super::types::{Command, Request, Status};

async fn read_array<C: ByteChannel, const N: usize>(
    channel: &mut C,
) -> Result<[u8; N], ChannelError> {
    let mut out = [0u8; N];
    for byte in out.iter_mut() {
        *byte = channel.recv_arg_byte().await?;
    }
    Ok(out)
}

/// Consume the fixed-length arguments of `command`.
pub async fn read_request<C: ByteChannel>(
    channel: &mut C,
    command: Command,
) -> Result<Request, ChannelError> {
    Ok(match command {
        Command::ListCredentials => Request::ListCredentials,
        Command::Reset => Request::Reset,
        Command::MakeCredential => Request::MakeCredential {
            application_id: read_array(channel).await?,
        },
        Command::GetAssertion => {
            let application_id = read_array(channel).await?;
            let client_data = read_array(channel).await?;
            Request::GetAssertion {
                application_id,
                client_data,
            }
        }
    })
}

/// Status OK followed by `payload`.
pub fn encode_response(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(Status::Ok as u8);
    out.extend_from_slice(payload);
    out
}

/// Error responses carry the status byte only.
pub fn encode_error(status: Status) -> Vec<u8> {
    vec![status as u8]
}
