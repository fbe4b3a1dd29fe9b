pub mod channel;
pub mod client;
pub mod config;
pub mod crypto;
pub mod diagnostics;
pub mod error;
pub mod presence;
pub mod protocol;
pub mod store;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::{Config, PresenceMode, RxMode};
use crate::crypto::{KeyGen, Signer};
use crate::presence::{
    AlwaysDeny, AutoApprove, HostPresence, LogIndicator, PresenceConfirmation, PresenceTiming,
    SharedButton, UserPresence,
};
use crate::protocol::Authenticator;
use crate::store::{CredentialStore, FileStorage, Storage};

pub fn open_store(path: &Path, size: usize) -> error::Result<CredentialStore<FileStorage>> {
    let storage = FileStorage::open(path, size)?;
    Ok(CredentialStore::open(storage)?)
}

/// Advisory lock on `<eeprom>.lock`, held by whoever writes the image.
pub struct EepromLock {
    lock: fd_lock::RwLock<File>,
    path: PathBuf,
}

impl EepromLock {
    pub fn open(eeprom: &Path) -> std::io::Result<Self> {
        let mut path = eeprom.as_os_str().to_owned();
        path.push(".lock");
        let path = PathBuf::from(path);
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        Ok(Self {
            lock: fd_lock::RwLock::new(file),
            path,
        })
    }

    pub fn try_acquire(&mut self) -> anyhow::Result<fd_lock::RwLockWriteGuard<'_, File>> {
        let path = &self.path;
        self.lock.try_write().map_err(|_| {
            anyhow::anyhow!(
                "EEPROM image is in use by another yubino (lock: {})",
                path.display()
            )
        })
    }
}

pub async fn wipe(cfg: Config) -> anyhow::Result<()> {
    let path = cfg.eeprom_path()?;
    if !path.exists() {
        println!("No EEPROM image at {}", path.display());
        return Ok(());
    }
    let mut lock = EepromLock::open(&path)?;
    let _guard = lock.try_acquire()?;
    let mut store = open_store(&path, cfg.eeprom_size)?;
    let count = store.reset()?;
    println!("Deleted {count} credential(s) from {}", path.display());
    Ok(())
}

fn build_presence(cfg: &Config) -> HostPresence {
    match cfg.presence {
        PresenceMode::Auto => HostPresence::Auto(AutoApprove),
        PresenceMode::Deny => HostPresence::Deny(AlwaysDeny),
        PresenceMode::Button => {
            let button = SharedButton::new();
            presence::spawn_stdin_button(
                button.clone(),
                Duration::from_millis(config::BUTTON_HOLD_MS),
            );
            println!("Press Enter to touch the button");
            HostPresence::Button(PresenceConfirmation::new(
                button,
                LogIndicator::default(),
                PresenceTiming::default(),
            ))
        }
    }
}

/// Serve one host connection until it closes.
pub async fn serve_session<S, P, K, T>(
    auth: &mut Authenticator<S, P, K>,
    link: T,
    cfg: &Config,
) -> error::Result<()>
where
    S: Storage,
    P: UserPresence,
    K: KeyGen + Signer,
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(link);
    match cfg.rx_mode {
        RxMode::Polled => {
            let mut link = channel::PolledChannel::new(reader, writer);
            auth.run(&mut link).await?;
        }
        RxMode::Buffered => {
            let (producer, mut link) = channel::buffered(
                cfg.rx_buffer,
                writer,
                Duration::from_millis(cfg.frame_gap_ms),
            );
            let pump = channel::spawn_rx_pump(reader, producer);
            let res = auth.run(&mut link).await;
            pump.abort();
            if link.dropped() > 0 {
                tracing::warn!(dropped = link.dropped(), "Receive buffer overflowed");
            }
            res?;
        }
    }
    Ok(())
}

pub async fn run(cfg: Config) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;
    let level = match cfg.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .init();

    tracing::info!("Starting yubino");

    let eeprom_path = cfg.eeprom_path()?;

    // Preflight checks
    diagnostics::check(&cfg, &eeprom_path)?;

    // Single-instance lock on the image
    let mut lock = EepromLock::open(&eeprom_path)?;
    let _guard = lock.try_acquire()?;

    let store = open_store(&eeprom_path, cfg.eeprom_size)
        .map_err(|e| anyhow::anyhow!("Failed to load credential store: {e}"))?;
    tracing::info!(
        path = %eeprom_path.display(),
        count = store.credential_count(),
        capacity = store.capacity(),
        "Credential store loaded"
    );

    let presence = build_presence(&cfg);
    let mut auth = Authenticator::new(store, presence, crypto::Secp160r1::new());

    let listener = tokio::net::TcpListener::bind(&cfg.listen).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    tokio::select! {
        res = accept_loop(&listener, &mut auth, &cfg) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            Ok(())
        }
    }
}

/// One host at a time, like a single serial line.
async fn accept_loop<S, P, K>(
    listener: &tokio::net::TcpListener,
    auth: &mut Authenticator<S, P, K>,
    cfg: &Config,
) -> anyhow::Result<()>
where
    S: Storage,
    P: UserPresence,
    K: KeyGen + Signer,
{
    loop {
        let (stream, peer) = listener.accept().await?;
        stream.set_nodelay(true)?;
        tracing::info!(%peer, "Host connected");
        match serve_session(auth, stream, cfg).await {
            Ok(()) => tracing::info!(%peer, "Host disconnected"),
            Err(e) => tracing::warn!(%peer, "Session ended: {e}"),
        }
    }
}
