// ABOUTME: Local Unix socket that relays every accepted connection to a remote socket over SSH.
// ABOUTME: One forwarder per tunnel session; stopping it removes the socket file.

use super::client::TunnelHandler;
use super::error::{Error, Result};
use russh::ChannelMsg;
use russh::client::Handle;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const RELAY_BUFFER: usize = 64 * 1024;
const STOP_GRACE: Duration = Duration::from_secs(2);

static SOCKET_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Running forwarder bound to a local socket path.
pub(crate) struct Forwarder {
    local_path: PathBuf,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Forwarder {
    /// Binds a fresh socket under the temp directory and starts relaying to `remote_socket`.
    pub(crate) fn start(handle: Arc<Handle<TunnelHandler>>, remote_socket: &str) -> Result<Self> {
        let local_path = next_socket_path();
        let _ = std::fs::remove_file(&local_path);

        let listener = UnixListener::bind(&local_path).map_err(|e| Error::Forward {
            remote_socket: remote_socket.to_string(),
            reason: format!("cannot bind {}: {e}", local_path.display()),
        })?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(
            listener,
            handle,
            remote_socket.to_string(),
            stop_rx,
        ));

        Ok(Self {
            local_path,
            stop_tx,
            task,
        })
    }

    pub(crate) fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Stops accepting, waits briefly for the accept loop, and removes the socket.
    pub(crate) async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if tokio::time::timeout(STOP_GRACE, &mut self.task).await.is_err() {
            self.task.abort();
        }
        let _ = std::fs::remove_file(&self.local_path);
    }
}

impl Drop for Forwarder {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
        self.task.abort();
        let _ = std::fs::remove_file(&self.local_path);
    }
}

/// `<tmp>/cohort-<pid>-<n>.sock`, unique within this process.
fn next_socket_path() -> PathBuf {
    let n = SOCKET_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("cohort-{}-{n}.sock", std::process::id()))
}

async fn accept_loop(
    listener: UnixListener,
    handle: Arc<Handle<TunnelHandler>>,
    remote_socket: String,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let handle = Arc::clone(&handle);
                    let remote_socket = remote_socket.clone();
                    tokio::spawn(async move {
                        if let Err(e) = relay(stream, &handle, &remote_socket).await {
                            tracing::debug!("tunnel relay ended: {e}");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!("tunnel socket stopped accepting: {e}");
                    break;
                }
            },
        }
    }
}

/// Copies bytes both ways between one local connection and a streamlocal channel.
async fn relay(
    mut local: UnixStream,
    handle: &Handle<TunnelHandler>,
    remote_socket: &str,
) -> Result<()> {
    let mut channel = handle
        .channel_open_direct_streamlocal(remote_socket)
        .await
        .map_err(|e| Error::Forward {
            remote_socket: remote_socket.to_string(),
            reason: e.to_string(),
        })?;

    let mut buf = vec![0u8; RELAY_BUFFER];
    let mut local_done = false;
    let mut remote_done = false;

    while !(local_done && remote_done) {
        tokio::select! {
            read = local.read(&mut buf), if !local_done => match read {
                Ok(0) => {
                    local_done = true;
                    let _ = channel.eof().await;
                }
                Ok(n) => channel.data(&buf[..n]).await?,
                Err(e) => {
                    tracing::debug!("local tunnel read failed: {e}");
                    break;
                }
            },
            msg = channel.wait(), if !remote_done => match msg {
                Some(ChannelMsg::Data { ref data }) => {
                    if let Err(e) = local.write_all(data).await {
                        tracing::debug!("local tunnel write failed: {e}");
                        break;
                    }
                }
                Some(ChannelMsg::Eof) => remote_done = true,
                Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            },
        }
    }

    Ok(())
}
