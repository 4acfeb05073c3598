use anyhow::Context;
use csl_tunnel_core::prelude::ShutdownHandle;
use tokio::signal;

/// Turn Ctrl-C into a shutdown request. The sweep stops before its next point, or cancels the
/// engine call in progress, and no report is produced.
pub(crate) fn start_shutdown_listener(
    runtime: &tokio::runtime::Runtime,
) -> anyhow::Result<ShutdownHandle> {
    let handle = ShutdownHandle::default();

    let listener_handle = handle.clone();
    runtime.spawn(async move {
        match signal::ctrl_c()
            .await
            .context("Failed to listen for the Ctrl-C signal")
        {
            Ok(()) => {
                println!("Received shutdown signal, shutting down...");
                listener_handle.shutdown();
            }
            Err(e) => log::error!("{e:?}"),
        }
    });

    Ok(handle)
}
