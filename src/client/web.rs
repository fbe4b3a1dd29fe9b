//! Relying-party flow: register and log in a user with credentials held on
//! the device.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};

use super::{Client, ClientError, application_id, client_data_hash};

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("invalid relying party address: {0}")]
    InvalidUrl(String),
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{status}: {body}")]
    Status { status: u16, body: String },
    #[error("app_id must be equal to hostname: {app_id} != {hostname}")]
    AppIdMismatch { app_id: String, hostname: String },
    #[error("challenge is not hex: {0}")]
    Challenge(#[from] hex::FromHexError),
    #[error("device: {0}")]
    Device(#[from] ClientError),
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    app_id: String,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    credential_id: String,
    public_key: String,
}

#[derive(Debug, Serialize)]
struct ChallengeRequest<'a> {
    username: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChallengeResponse {
    challenge: String,
    app_id: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    name: &'a str,
    credential_id: String,
    signature: String,
}

/// HTTP session with one relying party. Cookies persist until [`logout`].
///
/// [`logout`]: RelyingParty::logout
pub struct RelyingParty {
    http: reqwest::Client,
    base: String,
    hostname: String,
}

fn session() -> Result<reqwest::Client, WebError> {
    Ok(reqwest::Client::builder().cookie_store(true).build()?)
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, WebError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::error!(status = status.as_u16(), "{body}");
    Err(WebError::Status {
        status: status.as_u16(),
        body,
    })
}

impl RelyingParty {
    pub fn new(address: &str) -> Result<Self, WebError> {
        let url = reqwest::Url::parse(address)
            .map_err(|e| WebError::InvalidUrl(format!("{address}: {e}")))?;
        let hostname = url
            .host_str()
            .ok_or_else(|| WebError::InvalidUrl(address.to_string()))?
            .to_string();
        tracing::debug!(%hostname, "Relying party");
        Ok(Self {
            http: session()?,
            base: address.trim_end_matches('/').to_string(),
            hostname,
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// The relying party's greeting for the current session.
    pub async fn index(&self) -> Result<String, WebError> {
        let resp = check(self.http.get(self.url("/")).send().await?).await?;
        Ok(resp.json::<IndexResponse>().await?.message)
    }

    /// Enroll a fresh device credential for the relying party's app id and
    /// register it under `username`.
    pub async fn register<T>(&self, device: &mut Client<T>, username: &str) -> Result<(), WebError>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let info: InfoResponse = check(self.http.get(self.url("/info")).send().await?)
            .await?
            .json()
            .await?;
        if info.app_id != self.hostname {
            return Err(WebError::AppIdMismatch {
                app_id: info.app_id,
                hostname: self.hostname.clone(),
            });
        }

        let made = device.make_credential(&application_id(&info.app_id)).await?;
        tracing::info!(cred_id = hex::encode(made.credential_id), "Credential created");

        let body = RegisterRequest {
            name: username,
            credential_id: hex::encode(made.credential_id),
            public_key: hex::encode(made.public_key.0),
        };
        check(self.http.post(self.url("/register")).json(&body).send().await?).await?;
        Ok(())
    }

    /// Fetch a challenge for `username`, sign it on the device and log in.
    pub async fn login<T>(&self, device: &mut Client<T>, username: &str) -> Result<(), WebError>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let challenge: ChallengeResponse = check(
            self.http
                .post(self.url("/challenge"))
                .json(&ChallengeRequest { username })
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;
        tracing::debug!(challenge = %challenge.challenge, "Challenge received");
        hex::decode(&challenge.challenge)?;

        let client_data = client_data_hash(&challenge.challenge, &challenge.app_id);
        let assertion = device
            .get_assertion(&application_id(&challenge.app_id), &client_data)
            .await?;

        let body = LoginRequest {
            name: username,
            credential_id: hex::encode(assertion.credential_id),
            signature: hex::encode(assertion.signature.0),
        };
        check(self.http.post(self.url("/login")).json(&body).send().await?).await?;
        Ok(())
    }

    /// Drop the session cookies.
    pub fn logout(&mut self) -> Result<(), WebError> {
        self.http = session()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_from_address() {
        let rp = RelyingParty::new("http://localhost:8000/").unwrap();
        assert_eq!(rp.hostname(), "localhost");
        assert_eq!(rp.url("/info"), "http://localhost:8000/info");
    }

    #[test]
    fn test_address_without_host_is_rejected() {
        assert!(matches!(
            RelyingParty::new("unix:/tmp/socket"),
            Err(WebError::InvalidUrl(_))
        ));
        assert!(matches!(
            RelyingParty::new("not a url"),
            Err(WebError::InvalidUrl(_))
        ));
    }
}
