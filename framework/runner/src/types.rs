/// Recommended error type for sweep binaries and simulation engine bindings. Per-point failures
/// carry the offending sweep parameter as context, and the typed error kinds of this crate can be
/// recovered with [anyhow::Error::downcast_ref].
pub type TunnelResult<T> = anyhow::Result<T>;
